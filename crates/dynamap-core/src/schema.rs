//! Ordered field declarations for one model.

use std::sync::Arc;

use dynamap_model::Item;
use indexmap::IndexMap;
use tracing::debug;

use crate::context::{Action, ModelContext};
use crate::error::{FieldError, SchemaError, ValidationError};
use crate::expression::TableUpdate;
use crate::fields::{Field, ModelItem, ModelUpdate, UpdateValue};

/// Logical property name -> field, in declaration order.
///
/// Immutable once built. Traversals, validation and condition accumulation
/// all follow declaration order.
#[derive(Debug)]
pub struct Schema {
    model: String,
    fields: IndexMap<String, Arc<dyn Field>>,
}

impl Schema {
    /// Start declaring the fields of `model`.
    #[must_use]
    pub fn builder(model: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            model: model.into(),
            fields: IndexMap::new(),
            duplicate: None,
        }
    }

    /// Model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &dyn Field)> {
        self.fields
            .iter()
            .map(|(name, field)| (name.as_str(), field.as_ref()))
    }

    /// Look up a field by property name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&dyn Field> {
        self.fields.get(name).map(AsRef::as_ref)
    }

    /// Map a table item to a model item. Properties without attributes are
    /// left out.
    #[must_use]
    pub fn to_model(&self, table: &Item, ctx: &ModelContext<'_>) -> ModelItem {
        let mut model = ModelItem::new();
        for (name, field) in &self.fields {
            field.to_model(name, table, &mut model, ctx);
        }
        model
    }

    /// Map a model item to a flat table item.
    ///
    /// # Errors
    ///
    /// Stops at the first field that rejects its value.
    pub fn to_table(&self, model: &ModelItem, ctx: &mut ModelContext<'_>) -> Result<Item, FieldError> {
        let mut table = Item::new();
        for (name, field) in &self.fields {
            field.to_table(name, model, &mut table, ctx)?;
        }
        Ok(table)
    }

    /// Map a model update to a table update.
    ///
    /// # Errors
    ///
    /// Stops at the first field that rejects its value or operation.
    pub fn to_table_update(
        &self,
        model: &ModelUpdate,
        ctx: &mut ModelContext<'_>,
    ) -> Result<TableUpdate, FieldError> {
        let mut table = TableUpdate::new();
        for (name, field) in &self.fields {
            field.to_table_update(name, model, &mut table, ctx)?;
        }
        Ok(table)
    }

    /// Run validators on the present properties of `item`, one at a time in
    /// declaration order.
    pub async fn validate_item(&self, item: &ModelItem, action: Action) -> Result<(), ValidationError> {
        for (name, field) in &self.fields {
            if let (Some(validator), Some(value)) = (field.validator(), item.get(name)) {
                validator.validate(name, value, action).await?;
            }
        }
        Ok(())
    }

    /// Run validators on the literal values of `update`, one at a time in
    /// declaration order. Operations are not validated.
    pub async fn validate_update(&self, update: &ModelUpdate) -> Result<(), ValidationError> {
        for (name, field) in &self.fields {
            if let (Some(validator), Some(UpdateValue::Value(value))) =
                (field.validator(), update.get(name))
            {
                validator.validate(name, value, Action::Update).await?;
            }
        }
        Ok(())
    }
}

/// Collects field declarations for [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    model: String,
    fields: IndexMap<String, Arc<dyn Field>>,
    duplicate: Option<String>,
}

impl SchemaBuilder {
    /// Declare `name` backed by `field`.
    #[must_use]
    pub fn field(self, name: impl Into<String>, field: impl Field + 'static) -> Self {
        self.shared(name, Arc::new(field))
    }

    /// Declare `name` backed by a field the caller keeps a handle to, so
    /// its condition builders can be used after the schema is built.
    #[must_use]
    pub fn shared(mut self, name: impl Into<String>, field: Arc<dyn Field>) -> Self {
        let name = name.into();
        if self.fields.contains_key(&name) {
            self.duplicate.get_or_insert(name);
        } else {
            self.fields.insert(name, field);
        }
        self
    }

    /// Bind every field to its name and freeze the schema.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate property name or a field instance that was
    /// already bound elsewhere.
    pub fn build(self) -> Result<Schema, SchemaError> {
        if let Some(name) = self.duplicate {
            return Err(SchemaError::DuplicateField { name });
        }
        for (name, field) in &self.fields {
            field.init(name, &self.model)?;
        }
        debug!(model = %self.model, fields = self.fields.len(), "built schema");
        Ok(Schema {
            model: self.model,
            fields: self.fields,
        })
    }
}

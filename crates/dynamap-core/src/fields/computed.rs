//! Fields whose written value is computed rather than supplied.

use std::sync::OnceLock;

use dynamap_model::{AttributeValue, Item};
use serde_json::Value;

use super::value::{DateKind, NumberKind, ValueKind, epoch_seconds};
use super::{Binding, Field, ModelItem, ModelUpdate, UpdateValue};
use crate::context::ModelContext;
use crate::error::{FieldError, SchemaError};
use crate::expression::{Condition, TableUpdate, UpdateInput, UpdateOp};

fn attribute<'a>(alias: Option<&'a str>, name: &'a str) -> &'a str {
    alias.unwrap_or(name)
}

/// Stores the model name, so items of several models can share a table.
#[derive(Debug, Default)]
pub struct FieldType {
    alias: Option<String>,
    binding: Binding,
    model: OnceLock<String>,
}

impl FieldType {
    /// Store under a different table attribute name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    fn model_name<'a>(&'a self, ctx: &ModelContext<'a>) -> &'a str {
        self.model.get().map_or(ctx.model, String::as_str)
    }
}

impl Field for FieldType {
    fn init(&self, name: &str, model: &str) -> Result<(), SchemaError> {
        self.binding.bind(name)?;
        // Only reached on the first bind, so the cell is still empty.
        let stored = self.model.set(model.to_owned());
        debug_assert!(stored.is_ok(), "model name set before the field was bound");
        Ok(())
    }

    fn to_model(&self, name: &str, table: &Item, model: &mut ModelItem, _ctx: &ModelContext<'_>) {
        let attr = attribute(self.alias.as_deref(), name);
        if let Some(stored) = table.get(attr).and_then(AttributeValue::as_s) {
            model.insert(name.to_owned(), Value::String(stored.to_owned()));
        }
    }

    fn to_table(
        &self,
        name: &str,
        _model: &ModelItem,
        table: &mut Item,
        ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        if ctx.action.is_put() {
            let attr = attribute(self.alias.as_deref(), name);
            table.insert(attr.to_owned(), AttributeValue::from(self.model_name(ctx)));
        }
        Ok(())
    }

    fn update_attribute(&self, _name: &str) -> Option<String> {
        None
    }

    fn to_table_update(
        &self,
        name: &str,
        _model: &ModelUpdate,
        table: &mut TableUpdate,
        ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        let attr = attribute(self.alias.as_deref(), name);
        table.insert(attr.to_owned(), UpdateInput::value(self.model_name(ctx)));
        Ok(())
    }
}

/// Time the item was first written.
#[derive(Debug, Default)]
pub struct FieldCreatedDate {
    alias: Option<String>,
    binding: Binding,
}

impl FieldCreatedDate {
    /// Store under a different table attribute name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl Field for FieldCreatedDate {
    fn init(&self, name: &str, _model: &str) -> Result<(), SchemaError> {
        self.binding.bind(name)
    }

    fn to_model(&self, name: &str, table: &Item, model: &mut ModelItem, _ctx: &ModelContext<'_>) {
        let attr = attribute(self.alias.as_deref(), name);
        if let Some(value) = table.get(attr).and_then(DateKind::to_model) {
            model.insert(name.to_owned(), value);
        }
    }

    fn to_table(
        &self,
        name: &str,
        _model: &ModelItem,
        table: &mut Item,
        ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        if ctx.action.is_put() {
            let attr = attribute(self.alias.as_deref(), name);
            table.insert(attr.to_owned(), epoch_seconds(ctx.clock.now()));
        }
        Ok(())
    }

    fn update_attribute(&self, _name: &str) -> Option<String> {
        None
    }

    fn to_table_update(
        &self,
        name: &str,
        _model: &ModelUpdate,
        table: &mut TableUpdate,
        ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        let attr = attribute(self.alias.as_deref(), name);
        let now = epoch_seconds(ctx.clock.now());
        table.insert(attr.to_owned(), UpdateOp::default_value(now).into());
        Ok(())
    }
}

/// Time of the last write.
#[derive(Debug, Default)]
pub struct FieldUpdatedDate {
    alias: Option<String>,
    binding: Binding,
}

impl FieldUpdatedDate {
    /// Store under a different table attribute name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl Field for FieldUpdatedDate {
    fn init(&self, name: &str, _model: &str) -> Result<(), SchemaError> {
        self.binding.bind(name)
    }

    fn to_model(&self, name: &str, table: &Item, model: &mut ModelItem, _ctx: &ModelContext<'_>) {
        let attr = attribute(self.alias.as_deref(), name);
        if let Some(value) = table.get(attr).and_then(DateKind::to_model) {
            model.insert(name.to_owned(), value);
        }
    }

    fn to_table(
        &self,
        name: &str,
        _model: &ModelItem,
        table: &mut Item,
        ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        if ctx.action.is_put() {
            let attr = attribute(self.alias.as_deref(), name);
            table.insert(attr.to_owned(), epoch_seconds(ctx.clock.now()));
        }
        Ok(())
    }

    fn update_attribute(&self, _name: &str) -> Option<String> {
        None
    }

    fn to_table_update(
        &self,
        name: &str,
        _model: &ModelUpdate,
        table: &mut TableUpdate,
        ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        let attr = attribute(self.alias.as_deref(), name);
        table.insert(attr.to_owned(), UpdateInput::Value(epoch_seconds(ctx.clock.now())));
        Ok(())
    }
}

/// Write counter for optimistic locking.
///
/// Put-family writes reset it to `start` and updates increment it by one.
/// With `match_on_write`, every write is conditioned on the stored revision
/// equalling the one the caller read (absent counts as `0`).
#[derive(Debug, Default)]
pub struct FieldRevision {
    alias: Option<String>,
    start: i64,
    match_on_write: bool,
    binding: Binding,
}

impl FieldRevision {
    /// Store under a different table attribute name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Value written by put-family actions.
    #[must_use]
    pub fn start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    /// Condition writes on the revision the caller supplies.
    #[must_use]
    pub fn match_on_write(mut self) -> Self {
        self.match_on_write = true;
        self
    }
}

fn prior_revision(value: Option<&Value>) -> AttributeValue {
    value
        .and_then(NumberKind::to_table)
        .unwrap_or_else(|| AttributeValue::from(0))
}

impl Field for FieldRevision {
    fn init(&self, name: &str, _model: &str) -> Result<(), SchemaError> {
        self.binding.bind(name)
    }

    fn to_model(&self, name: &str, table: &Item, model: &mut ModelItem, _ctx: &ModelContext<'_>) {
        let attr = attribute(self.alias.as_deref(), name);
        if let Some(value) = table.get(attr).and_then(NumberKind::to_model) {
            model.insert(name.to_owned(), value);
        }
    }

    fn to_table(
        &self,
        name: &str,
        model: &ModelItem,
        table: &mut Item,
        ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        if !ctx.action.is_put() {
            return Ok(());
        }
        let attr = attribute(self.alias.as_deref(), name);
        table.insert(attr.to_owned(), AttributeValue::from(self.start));
        if self.match_on_write {
            let prior = prior_revision(model.get(name));
            ctx.conditions.push(Condition::either(
                Condition::not_exists(attr),
                Condition::eq(attr, prior),
            ));
        }
        Ok(())
    }

    fn update_attribute(&self, _name: &str) -> Option<String> {
        None
    }

    fn to_table_update(
        &self,
        name: &str,
        model: &ModelUpdate,
        table: &mut TableUpdate,
        ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        let attr = attribute(self.alias.as_deref(), name);
        table.insert(attr.to_owned(), UpdateOp::inc(1).into());
        if self.match_on_write {
            let prior = match model.get(name) {
                Some(UpdateValue::Value(value)) => prior_revision(Some(value)),
                _ => prior_revision(None),
            };
            ctx.conditions.push(Condition::eq(attr, prior));
        }
        Ok(())
    }
}

/// A model property that is never stored or read back.
#[derive(Debug, Default)]
pub struct FieldHidden {
    binding: Binding,
}

impl Field for FieldHidden {
    fn init(&self, name: &str, _model: &str) -> Result<(), SchemaError> {
        self.binding.bind(name)
    }

    fn to_model(&self, _name: &str, _table: &Item, _model: &mut ModelItem, _ctx: &ModelContext<'_>) {}

    fn to_table(
        &self,
        _name: &str,
        _model: &ModelItem,
        _table: &mut Item,
        _ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        Ok(())
    }

    fn update_attribute(&self, _name: &str) -> Option<String> {
        None
    }

    fn to_table_update(
        &self,
        _name: &str,
        _model: &ModelUpdate,
        _table: &mut TableUpdate,
        _ctx: &mut ModelContext<'_>,
    ) -> Result<(), FieldError> {
        Ok(())
    }
}

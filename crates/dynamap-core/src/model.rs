//! Model operations: one schema traversal per call, compiled into item
//! request parameters and optionally executed through a [`Transport`].

use std::fmt;
use std::sync::Arc;

use dynamap_model::Item;
use dynamap_model::input::{
    DeleteItemInput, GetItemInput, PutItemInput, QueryInput, UpdateItemInput,
};
use dynamap_model::types::ReturnValue;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::ModelConfig;
use crate::context::{Action, ModelContext, ModelOptions};
use crate::error::{ModelError, ModelResult};
use crate::expression::{self, Condition, ExpressionAttributes, KeyConditions, TableUpdate};
use crate::fields::{ModelItem, ModelUpdate};
use crate::schema::Schema;
use crate::table::{QueryOptions, Table};
use crate::transport::Transport;

/// Key, remaining attributes and conditions produced by one item traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledItem {
    /// Primary key attributes.
    pub key: Item,
    /// Every other attribute.
    pub item: Item,
    /// Field conditions, then action conditions, then caller conditions.
    pub conditions: Vec<Condition>,
}

/// Key, non-key update and conditions produced by one update traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledUpdate {
    /// Primary key attributes.
    pub key: Item,
    /// Updates to non-key attributes.
    pub update: TableUpdate,
    /// Field conditions, then caller conditions.
    pub conditions: Vec<Condition>,
}

/// One page of query results mapped to model items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Items in the order the table returned them.
    pub items: Vec<ModelItem>,
    /// Continuation key, if more items remain.
    pub last_evaluated_key: Option<Item>,
}

/// A schema bound to the table it is stored in.
pub struct Model {
    schema: Schema,
    table: Arc<Table>,
    clock: Arc<dyn Clock>,
    config: ModelConfig,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.schema.model())
            .field("table", &self.table.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Bind `schema` to `table` with the system clock and default config.
    #[must_use]
    pub fn new(schema: Schema, table: Arc<Table>) -> Self {
        Self {
            schema,
            table,
            clock: Arc::new(SystemClock),
            config: ModelConfig::default(),
        }
    }

    /// Use `clock` for computed dates.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `config` for option defaults.
    #[must_use]
    pub fn with_config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.schema.model()
    }

    /// The model's schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The table the model is stored in.
    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Map a table item back to a model item.
    #[must_use]
    pub fn to_model(&self, item: &Item) -> ModelItem {
        let options = ModelOptions::default();
        let ctx = ModelContext::new(Action::Get, self.name(), &options, self.clock.as_ref());
        self.schema.to_model(item, &ctx)
    }

    /// Traverse `item` for `action` and split the result into key and
    /// non-key attributes. Validators are not run.
    ///
    /// # Errors
    ///
    /// Fails when a field rejects its value or a key attribute is missing.
    pub fn compile_item(
        &self,
        action: Action,
        item: &ModelItem,
        options: &ModelOptions,
    ) -> ModelResult<CompiledItem> {
        let mut ctx = ModelContext::new(action, self.name(), options, self.clock.as_ref());
        let flat = self.schema.to_table(item, &mut ctx)?;
        let (key, item) = self.table.split_item(flat);
        self.ensure_key(&key)?;

        let mut conditions = ctx.conditions;
        let pk = &self.table.key_schema().partition_key.name;
        match action {
            Action::Create => conditions.push(Condition::not_exists(pk)),
            Action::Replace => conditions.push(Condition::exists(pk)),
            _ => {}
        }
        conditions.extend(options.conditions.iter().cloned());

        debug!(
            model = %self.name(),
            action = %action,
            attributes = item.len(),
            conditions = conditions.len(),
            "compiled item"
        );
        Ok(CompiledItem {
            key,
            item,
            conditions,
        })
    }

    /// Traverse `update` and split the result into the key and the non-key
    /// update. Validators are not run.
    ///
    /// # Errors
    ///
    /// Fails when a field rejects its value, an operation targets a key
    /// attribute, or a key attribute is missing.
    pub fn compile_update(
        &self,
        update: &ModelUpdate,
        options: &ModelOptions,
    ) -> ModelResult<CompiledUpdate> {
        let mut ctx = ModelContext::new(Action::Update, self.name(), options, self.clock.as_ref());
        let flat = self.schema.to_table_update(update, &mut ctx)?;
        let (key, update) = self.table.split_update(flat)?;
        self.ensure_key(&key)?;

        let mut conditions = ctx.conditions;
        conditions.extend(options.conditions.iter().cloned());

        debug!(
            model = %self.name(),
            action = %Action::Update,
            attributes = update.len(),
            conditions = conditions.len(),
            "compiled update"
        );
        Ok(CompiledUpdate {
            key,
            update,
            conditions,
        })
    }

    /// `GetItem` parameters for the item identified by `key`.
    pub fn get_params(&self, key: &ModelItem, options: &ModelOptions) -> ModelResult<GetItemInput> {
        let CompiledItem { key, .. } = self.compile_item(Action::Get, key, options)?;
        Ok(GetItemInput {
            table_name: self.table.name().to_owned(),
            key,
            consistent_read: self.consistent_read(options),
        })
    }

    /// `DeleteItem` parameters for the item identified by `key`.
    pub fn delete_params(
        &self,
        key: &ModelItem,
        options: &ModelOptions,
    ) -> ModelResult<DeleteItemInput> {
        let CompiledItem {
            key, conditions, ..
        } = self.compile_item(Action::Delete, key, options)?;
        let mut attrs = ExpressionAttributes::new();
        let condition_expression = Condition::all(conditions).map(|c| c.compile(&mut attrs));
        let (expression_attribute_names, expression_attribute_values) = attrs.into_parts();
        Ok(DeleteItemInput {
            table_name: self.table.name().to_owned(),
            key,
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            return_values: self.return_values(options),
        })
    }

    /// `PutItem` parameters that write `item` unconditionally.
    pub async fn put_params(
        &self,
        item: &ModelItem,
        options: &ModelOptions,
    ) -> ModelResult<PutItemInput> {
        self.write_params(Action::Put, item, options).await
    }

    /// `PutItem` parameters that fail if the item already exists.
    pub async fn create_params(
        &self,
        item: &ModelItem,
        options: &ModelOptions,
    ) -> ModelResult<PutItemInput> {
        self.write_params(Action::Create, item, options).await
    }

    /// `PutItem` parameters that fail unless the item already exists.
    pub async fn replace_params(
        &self,
        item: &ModelItem,
        options: &ModelOptions,
    ) -> ModelResult<PutItemInput> {
        self.write_params(Action::Replace, item, options).await
    }

    /// `UpdateItem` parameters for `update`, which must carry the key.
    pub async fn update_params(
        &self,
        update: &ModelUpdate,
        options: &ModelOptions,
    ) -> ModelResult<UpdateItemInput> {
        self.schema.validate_update(update).await?;
        let CompiledUpdate {
            key,
            update,
            conditions,
        } = self.compile_update(update, options)?;

        let mut attrs = ExpressionAttributes::new();
        let update_expression = expression::compile_update(&update, &mut attrs);
        let condition_expression = Condition::all(conditions).map(|c| c.compile(&mut attrs));
        let (expression_attribute_names, expression_attribute_values) = attrs.into_parts();
        Ok(UpdateItemInput {
            table_name: self.table.name().to_owned(),
            key,
            update_expression,
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            return_values: self.return_values(options),
        })
    }

    /// `Query` parameters for key conditions on the table or an index.
    pub fn query_params(
        &self,
        conditions: &KeyConditions,
        mut options: QueryOptions,
    ) -> ModelResult<QueryInput> {
        if options.consistent_read.is_none() && self.config.consistent_read {
            options.consistent_read = Some(true);
        }
        self.table.query_params(conditions, options)
    }

    /// Fetch the item identified by `key`.
    pub async fn get(
        &self,
        transport: &dyn Transport,
        key: &ModelItem,
        options: &ModelOptions,
    ) -> ModelResult<Option<ModelItem>> {
        let output = transport.get(self.get_params(key, options)?).await?;
        Ok(output.item.map(|item| self.to_model(&item)))
    }

    /// Delete the item identified by `key`, returning old attributes if
    /// requested.
    pub async fn delete(
        &self,
        transport: &dyn Transport,
        key: &ModelItem,
        options: &ModelOptions,
    ) -> ModelResult<Option<ModelItem>> {
        let output = transport.delete(self.delete_params(key, options)?).await?;
        Ok(output.attributes.map(|item| self.to_model(&item)))
    }

    /// Write `item` unconditionally.
    pub async fn put(
        &self,
        transport: &dyn Transport,
        item: &ModelItem,
        options: &ModelOptions,
    ) -> ModelResult<Option<ModelItem>> {
        let output = transport.put(self.put_params(item, options).await?).await?;
        Ok(output.attributes.map(|item| self.to_model(&item)))
    }

    /// Write `item` if it does not exist yet.
    pub async fn create(
        &self,
        transport: &dyn Transport,
        item: &ModelItem,
        options: &ModelOptions,
    ) -> ModelResult<Option<ModelItem>> {
        let output = transport.put(self.create_params(item, options).await?).await?;
        Ok(output.attributes.map(|item| self.to_model(&item)))
    }

    /// Overwrite `item` if it exists.
    pub async fn replace(
        &self,
        transport: &dyn Transport,
        item: &ModelItem,
        options: &ModelOptions,
    ) -> ModelResult<Option<ModelItem>> {
        let output = transport.put(self.replace_params(item, options).await?).await?;
        Ok(output.attributes.map(|item| self.to_model(&item)))
    }

    /// Apply `update`, returning attributes if requested.
    pub async fn update(
        &self,
        transport: &dyn Transport,
        update: &ModelUpdate,
        options: &ModelOptions,
    ) -> ModelResult<Option<ModelItem>> {
        let output = transport.update(self.update_params(update, options).await?).await?;
        Ok(output.attributes.map(|item| self.to_model(&item)))
    }

    /// Run a query and map every returned item.
    pub async fn query(
        &self,
        transport: &dyn Transport,
        conditions: &KeyConditions,
        options: QueryOptions,
    ) -> ModelResult<QueryResult> {
        let output = transport.query(self.query_params(conditions, options)?).await?;
        Ok(QueryResult {
            items: output.items.iter().map(|item| self.to_model(item)).collect(),
            last_evaluated_key: output.last_evaluated_key,
        })
    }

    async fn write_params(
        &self,
        action: Action,
        item: &ModelItem,
        options: &ModelOptions,
    ) -> ModelResult<PutItemInput> {
        self.schema.validate_item(item, action).await?;
        let CompiledItem {
            key,
            mut item,
            conditions,
        } = self.compile_item(action, item, options)?;
        item.extend(key);

        let mut attrs = ExpressionAttributes::new();
        let condition_expression = Condition::all(conditions).map(|c| c.compile(&mut attrs));
        let (expression_attribute_names, expression_attribute_values) = attrs.into_parts();
        Ok(PutItemInput {
            table_name: self.table.name().to_owned(),
            item,
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            return_values: self.return_values(options),
        })
    }

    fn ensure_key(&self, key: &Item) -> ModelResult<()> {
        match self
            .table
            .key_schema()
            .attribute_names()
            .find(|name| !key.contains_key(*name))
        {
            Some(missing) => Err(ModelError::MissingKey {
                attribute: missing.to_owned(),
            }),
            None => Ok(()),
        }
    }

    fn return_values(&self, options: &ModelOptions) -> Option<ReturnValue> {
        options.return_values.or(self.config.return_values)
    }

    fn consistent_read(&self, options: &ModelOptions) -> Option<bool> {
        options
            .consistent_read
            .or_else(|| self.config.consistent_read.then_some(true))
    }
}

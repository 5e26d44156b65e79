//! Integration tests for dynamap.
//!
//! Models are compiled and executed against [`MemoryTransport`], which keeps
//! items in memory keyed by the table's primary key and records every request
//! it receives. It stores and returns items but does not evaluate condition
//! or update expressions.

use std::sync::{Arc, Once};

use dynamap_core::fields::{Fields, WithOptions};
use dynamap_core::{
    FixedClock, Index, KeySchema, Model, ModelItem, Schema, Table, Transport,
};
use dynamap_model::input::{
    DeleteItemInput, GetItemInput, PutItemInput, QueryInput, UpdateItemInput,
};
use dynamap_model::output::{
    DeleteItemOutput, GetItemOutput, PutItemOutput, QueryOutput, UpdateItemOutput,
};
use dynamap_model::types::{ReturnValue, ScalarAttributeType};
use dynamap_model::{DynamoDBError, Item};
use parking_lot::Mutex;
use serde_json::Value;

static INIT: Once = Once::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A request seen by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// `GetItem`
    Get(GetItemInput),
    /// `PutItem`
    Put(PutItemInput),
    /// `DeleteItem`
    Delete(DeleteItemInput),
    /// `UpdateItem`
    Update(UpdateItemInput),
    /// `Query`
    Query(QueryInput),
}

/// In-memory item store implementing [`Transport`].
#[derive(Debug)]
pub struct MemoryTransport {
    key_names: Vec<String>,
    items: Mutex<Vec<Item>>,
    requests: Mutex<Vec<Request>>,
    failure: Mutex<Option<DynamoDBError>>,
}

impl MemoryTransport {
    /// Empty store for items of `table`.
    #[must_use]
    pub fn new(table: &Table) -> Self {
        Self {
            key_names: table
                .key_schema()
                .attribute_names()
                .map(str::to_owned)
                .collect(),
            items: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    /// Fail the next request with `error`.
    pub fn fail_next(&self, error: DynamoDBError) {
        *self.failure.lock() = Some(error);
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// Stored items in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.items.lock().clone()
    }

    /// Stored item with the same primary key as `key`.
    #[must_use]
    pub fn item(&self, key: &Item) -> Option<Item> {
        self.items
            .lock()
            .iter()
            .find(|item| self.same_key(item, key))
            .cloned()
    }

    fn record(&self, request: Request) -> Result<(), DynamoDBError> {
        self.requests.lock().push(request);
        self.failure.lock().take().map_or(Ok(()), Err)
    }

    fn same_key(&self, a: &Item, b: &Item) -> bool {
        self.key_names.iter().all(|name| a.get(name) == b.get(name))
    }

    fn remove(&self, key: &Item) -> Option<Item> {
        let mut items = self.items.lock();
        let position = items.iter().position(|item| self.same_key(item, key))?;
        Some(items.remove(position))
    }
}

fn returned(requested: Option<ReturnValue>, old: Option<Item>) -> Option<Item> {
    match requested {
        Some(ReturnValue::AllOld) => old,
        _ => None,
    }
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    async fn get(&self, input: GetItemInput) -> Result<GetItemOutput, DynamoDBError> {
        self.record(Request::Get(input.clone()))?;
        Ok(GetItemOutput {
            item: self.item(&input.key),
        })
    }

    async fn put(&self, input: PutItemInput) -> Result<PutItemOutput, DynamoDBError> {
        self.record(Request::Put(input.clone()))?;
        let old = self.remove(&input.item);
        self.items.lock().push(input.item);
        Ok(PutItemOutput {
            attributes: returned(input.return_values, old),
        })
    }

    async fn delete(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, DynamoDBError> {
        self.record(Request::Delete(input.clone()))?;
        let old = self.remove(&input.key);
        Ok(DeleteItemOutput {
            attributes: returned(input.return_values, old),
        })
    }

    async fn update(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, DynamoDBError> {
        self.record(Request::Update(input))?;
        Ok(UpdateItemOutput::default())
    }

    async fn query(&self, input: QueryInput) -> Result<QueryOutput, DynamoDBError> {
        self.record(Request::Query(input.clone()))?;
        // The partition key term always compiles first, as `#n0 = :v0`.
        let (Some(name), Some(value)) = (
            input.expression_attribute_names.get("#n0"),
            input.expression_attribute_values.get(":v0"),
        ) else {
            return Ok(QueryOutput::default());
        };
        let items = self
            .items
            .lock()
            .iter()
            .filter(|item| item.get(name) == Some(value))
            .cloned()
            .collect();
        Ok(QueryOutput {
            items,
            last_evaluated_key: None,
        })
    }
}

/// Single table with a `P`/`S` primary key and one `G0P`/`G0S` index.
#[must_use]
pub fn main_table() -> Arc<Table> {
    Arc::new(
        Table::new(
            "main",
            KeySchema::new("P", ScalarAttributeType::S).with_sort_key("S", ScalarAttributeType::S),
        )
        .with_index(Index::new(
            "gsi0",
            KeySchema::new("G0P", ScalarAttributeType::S)
                .with_sort_key("G0S", ScalarAttributeType::S),
        )),
    )
}

/// Clock frozen at 2023-11-14T22:13:20Z.
#[must_use]
pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::from_timestamp(1_700_000_000))
}

/// `User` model: id split across the primary key, team as the index
/// partition key.
#[must_use]
pub fn user_model() -> Model {
    init_tracing();
    let schema = Schema::builder("User")
        .field("id", Fields::split(["P", "S"]))
        .field("name", Fields::string())
        .field("age", Fields::number())
        .field("tags", Fields::string_set())
        .field("team", Fields::string().alias("G0P"))
        .build()
        .unwrap_or_else(|e| panic!("invalid user schema: {e}"));
    Model::new(schema, main_table()).with_clock(fixed_clock())
}

/// JSON object literal as a model item.
#[must_use]
pub fn model_item(value: Value) -> ModelItem {
    match value {
        Value::Object(object) => object,
        other => panic!("expected a JSON object, got {other}"),
    }
}

#[cfg(test)]
mod test_composite;
#[cfg(test)]
mod test_computed;
#[cfg(test)]
mod test_put;
#[cfg(test)]
mod test_query;
#[cfg(test)]
mod test_update;
#[cfg(test)]
mod test_validation;

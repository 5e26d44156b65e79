//! Table and index key declarations.
//!
//! A [`Table`] knows its name, its primary key schema and its secondary
//! indexes. It does not validate or create anything remotely; it only answers
//! which attributes are key attributes and builds query parameters.

use dynamap_model::input::QueryInput;
use dynamap_model::types::{KeySchemaElement, ScalarAttributeType};
use dynamap_model::{AttributeValue, Item};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::expression::{
    Condition, ExpressionAttributes, KeyConditions, TableUpdate, UpdateInput,
    compile_key_condition,
};

/// A single key attribute definition with its name and scalar type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    /// The attribute name.
    pub name: String,
    /// The scalar type (S, N, or B).
    pub attr_type: ScalarAttributeType,
}

/// Partition key plus optional sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    /// Partition (HASH) key.
    pub partition_key: KeyAttribute,
    /// Optional sort (RANGE) key.
    pub sort_key: Option<KeyAttribute>,
}

impl KeySchema {
    /// Key schema with only a partition key.
    #[must_use]
    pub fn new(partition_key: impl Into<String>, attr_type: ScalarAttributeType) -> Self {
        Self {
            partition_key: KeyAttribute {
                name: partition_key.into(),
                attr_type,
            },
            sort_key: None,
        }
    }

    /// Add a sort key.
    #[must_use]
    pub fn with_sort_key(mut self, sort_key: impl Into<String>, attr_type: ScalarAttributeType) -> Self {
        self.sort_key = Some(KeyAttribute {
            name: sort_key.into(),
            attr_type,
        });
        self
    }

    /// Key attribute names in declaration order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.partition_key.name.as_str())
            .chain(self.sort_key.as_ref().map(|sk| sk.name.as_str()))
    }

    /// Returns `true` if `name` is one of the key attributes.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attribute_names().any(|key| key == name)
    }

    /// Wire-format key schema elements.
    #[must_use]
    pub fn elements(&self) -> Vec<KeySchemaElement> {
        let mut elements = vec![KeySchemaElement::hash(
            self.partition_key.name.clone(),
            self.partition_key.attr_type,
        )];
        if let Some(sk) = &self.sort_key {
            elements.push(KeySchemaElement::range(sk.name.clone(), sk.attr_type));
        }
        elements
    }
}

/// A global or local secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Index key schema.
    pub key_schema: KeySchema,
}

impl Index {
    /// Declare an index.
    #[must_use]
    pub fn new(name: impl Into<String>, key_schema: KeySchema) -> Self {
        Self {
            name: name.into(),
            key_schema,
        }
    }
}

/// Options for [`Table::query_params`].
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Query this secondary index instead of the table.
    pub index: Option<String>,
    /// Filter applied after the key condition.
    pub filter: Option<Condition>,
    /// Maximum number of items to evaluate.
    pub limit: Option<i32>,
    /// `false` for descending sort key order.
    pub scan_index_forward: Option<bool>,
    /// Strongly consistent read.
    pub consistent_read: Option<bool>,
    /// Continuation key from a previous page.
    pub exclusive_start_key: Item,
}

/// A table name with its key declarations.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    key_schema: KeySchema,
    indexes: Vec<Index>,
}

impl Table {
    /// Declare a table.
    #[must_use]
    pub fn new(name: impl Into<String>, key_schema: KeySchema) -> Self {
        Self {
            name: name.into(),
            key_schema,
            indexes: Vec::new(),
        }
    }

    /// Add a secondary index.
    #[must_use]
    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primary key schema.
    #[must_use]
    pub fn key_schema(&self) -> &KeySchema {
        &self.key_schema
    }

    /// Look up a secondary index by name.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|index| index.name == name)
    }

    /// Partition a flat attribute map into key attributes and the rest.
    #[must_use]
    pub fn split_item(&self, item: Item) -> (Item, Item) {
        item.into_iter()
            .partition(|(name, _)| self.key_schema.contains(name))
    }

    /// Partition a table update into the key map and the non-key update.
    ///
    /// # Errors
    ///
    /// Key attributes can only be addressed by literal values; an update
    /// operation on one is rejected.
    pub fn split_update(&self, update: TableUpdate) -> ModelResult<(Item, TableUpdate)> {
        let mut key = Item::new();
        let mut rest = TableUpdate::new();
        for (name, input) in update {
            if !self.key_schema.contains(&name) {
                rest.insert(name, input);
                continue;
            }
            match input {
                UpdateInput::Value(value) => {
                    key.insert(name, value);
                }
                UpdateInput::Op(_) => {
                    return Err(ModelError::KeyUpdate { attribute: name });
                }
            }
        }
        Ok((key, rest))
    }

    /// Build `Query` parameters from key conditions.
    ///
    /// # Errors
    ///
    /// Fails when the requested index is unknown or the key conditions do not
    /// constrain the partition key by equality.
    pub fn query_params(
        &self,
        conditions: &KeyConditions,
        options: QueryOptions,
    ) -> ModelResult<QueryInput> {
        let key_schema = match &options.index {
            Some(name) => {
                &self
                    .index(name)
                    .ok_or_else(|| ModelError::UnknownIndex {
                        table: self.name.clone(),
                        index: name.clone(),
                    })?
                    .key_schema
            }
            None => &self.key_schema,
        };

        let mut attrs = ExpressionAttributes::new();
        let key_condition_expression = compile_key_condition(key_schema, conditions, &mut attrs)?;
        let filter_expression = options.filter.as_ref().map(|f| f.compile(&mut attrs));
        let (expression_attribute_names, expression_attribute_values) = attrs.into_parts();

        debug!(
            table = %self.name,
            index = ?options.index,
            filtered = filter_expression.is_some(),
            "compiled query params"
        );

        Ok(QueryInput {
            table_name: self.name.clone(),
            index_name: options.index,
            key_condition_expression,
            filter_expression,
            expression_attribute_names,
            expression_attribute_values,
            scan_index_forward: options.scan_index_forward,
            limit: options.limit,
            exclusive_start_key: options.exclusive_start_key,
            consistent_read: options.consistent_read,
        })
    }

    /// Key map for a partition key value and optional sort key value.
    #[must_use]
    pub fn key(&self, partition: AttributeValue, sort: Option<AttributeValue>) -> Item {
        let mut key = Item::from([(self.key_schema.partition_key.name.clone(), partition)]);
        if let (Some(sk), Some(value)) = (&self.key_schema.sort_key, sort) {
            key.insert(sk.name.clone(), value);
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use crate::expression::{KeyCondition, UpdateOp};

    use super::*;

    fn table() -> Table {
        Table::new(
            "main",
            KeySchema::new("P", ScalarAttributeType::S).with_sort_key("S", ScalarAttributeType::S),
        )
        .with_index(Index::new(
            "gsi0",
            KeySchema::new("G0P", ScalarAttributeType::S).with_sort_key("G0S", ScalarAttributeType::S),
        ))
    }

    #[test]
    fn test_should_build_key_map_from_key_values() {
        let key = table().key("a".into(), Some("b".into()));
        assert_eq!(
            key,
            Item::from([
                ("P".to_owned(), AttributeValue::from("a")),
                ("S".to_owned(), AttributeValue::from("b")),
            ])
        );

        let partition_only = Table::new("t", KeySchema::new("id", ScalarAttributeType::S));
        let key = partition_only.key("a".into(), Some("ignored".into()));
        assert_eq!(key.len(), 1);
        assert_eq!(key["id"], AttributeValue::from("a"));
    }

    #[test]
    fn test_should_split_key_attributes_from_item() {
        let item = Item::from([
            ("P".to_owned(), AttributeValue::from("a")),
            ("S".to_owned(), AttributeValue::from("b")),
            ("G0P".to_owned(), AttributeValue::from("c")),
        ]);
        let (key, rest) = table().split_item(item);
        assert_eq!(key.len(), 2);
        assert!(rest.contains_key("G0P"));
    }

    #[test]
    fn test_should_reject_update_operation_on_key() {
        let update = TableUpdate::from([("P".to_owned(), UpdateInput::Op(UpdateOp::del()))]);
        assert!(matches!(
            table().split_update(update),
            Err(ModelError::KeyUpdate { .. })
        ));
    }

    #[test]
    fn test_should_build_query_params_for_index() {
        let conditions = KeyConditions::from([
            ("G0P".to_owned(), KeyCondition::eq("team")),
            ("G0S".to_owned(), KeyCondition::ge("2024")),
        ]);
        let options = QueryOptions {
            index: Some("gsi0".to_owned()),
            filter: Some(Condition::exists("name")),
            limit: Some(10),
            ..Default::default()
        };
        let params = table().query_params(&conditions, options).unwrap();
        assert_eq!(params.index_name.as_deref(), Some("gsi0"));
        assert_eq!(params.key_condition_expression, "#n0 = :v0 AND #n1 >= :v1");
        assert_eq!(params.filter_expression.as_deref(), Some("attribute_exists(#n2)"));
        assert_eq!(params.expression_attribute_names["#n2"], "name");
        assert_eq!(params.limit, Some(10));
    }

    #[test]
    fn test_should_reject_unknown_index() {
        let options = QueryOptions {
            index: Some("nope".to_owned()),
            ..Default::default()
        };
        assert!(matches!(
            table().query_params(&KeyConditions::new(), options),
            Err(ModelError::UnknownIndex { .. })
        ));
    }

    #[test]
    fn test_should_list_key_schema_elements_in_order() {
        let elements = table().key_schema().elements();
        assert_eq!(elements[0].attribute_name, "P");
        assert_eq!(elements[1].attribute_name, "S");
    }
}

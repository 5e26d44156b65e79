//! Key-condition compilation for queries.
//!
//! Only the declared key attributes of a table or index take part. Entries for
//! any other attribute in the input map are ignored rather than rejected.

use std::collections::HashMap;

use dynamap_model::AttributeValue;

use super::ExpressionError;
use super::attributes::ExpressionAttributes;
use super::condition::Condition;
use crate::table::KeySchema;

/// Key attribute name -> condition.
pub type KeyConditions = HashMap<String, KeyCondition>;

/// Condition on one key attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyCondition {
    /// `key = :v`, the only form allowed on a partition key.
    Eq(AttributeValue),
    /// `key < :v`
    Lt(AttributeValue),
    /// `key <= :v`
    Le(AttributeValue),
    /// `key > :v`
    Gt(AttributeValue),
    /// `key >= :v`
    Ge(AttributeValue),
    /// `key BETWEEN :lo AND :hi`
    Between(AttributeValue, AttributeValue),
    /// `begins_with(key, :prefix)`
    BeginsWith(AttributeValue),
}

impl KeyCondition {
    /// `= value`
    pub fn eq(value: impl Into<AttributeValue>) -> Self {
        Self::Eq(value.into())
    }

    /// `< value`
    pub fn lt(value: impl Into<AttributeValue>) -> Self {
        Self::Lt(value.into())
    }

    /// `<= value`
    pub fn le(value: impl Into<AttributeValue>) -> Self {
        Self::Le(value.into())
    }

    /// `> value`
    pub fn gt(value: impl Into<AttributeValue>) -> Self {
        Self::Gt(value.into())
    }

    /// `>= value`
    pub fn ge(value: impl Into<AttributeValue>) -> Self {
        Self::Ge(value.into())
    }

    /// `BETWEEN low AND high`
    pub fn between(low: impl Into<AttributeValue>, high: impl Into<AttributeValue>) -> Self {
        Self::Between(low.into(), high.into())
    }

    /// `begins_with(key, prefix)`
    pub fn begins_with(prefix: impl Into<AttributeValue>) -> Self {
        Self::BeginsWith(prefix.into())
    }

    fn operator(&self) -> &'static str {
        match self {
            Self::Eq(_) => "=",
            Self::Lt(_) => "<",
            Self::Le(_) => "<=",
            Self::Gt(_) => ">",
            Self::Ge(_) => ">=",
            Self::Between(..) => "BETWEEN",
            Self::BeginsWith(_) => "begins_with",
        }
    }

    fn to_condition(&self, name: &str) -> Condition {
        match self {
            Self::Eq(v) => Condition::eq(name, v.clone()),
            Self::Lt(v) => Condition::lt(name, v.clone()),
            Self::Le(v) => Condition::le(name, v.clone()),
            Self::Gt(v) => Condition::gt(name, v.clone()),
            Self::Ge(v) => Condition::ge(name, v.clone()),
            Self::Between(low, high) => Condition::between(name, low.clone(), high.clone()),
            Self::BeginsWith(prefix) => Condition::begins_with(name, prefix.clone()),
        }
    }
}

/// Compile the key conditions for `schema` into a key-condition expression.
///
/// Terms appear in key-schema order (partition key, then sort key), joined by
/// `AND`.
///
/// # Errors
///
/// Returns [`ExpressionError::MissingPartitionKey`] when no condition targets
/// the partition key and [`ExpressionError::InvalidKeyCondition`] when the
/// partition key condition is not an equality.
pub fn compile_key_condition(
    schema: &KeySchema,
    conditions: &KeyConditions,
    attrs: &mut ExpressionAttributes,
) -> Result<String, ExpressionError> {
    let pk = &schema.partition_key.name;
    let Some(pk_condition) = conditions.get(pk) else {
        return Err(ExpressionError::MissingPartitionKey {
            attribute: pk.clone(),
        });
    };
    if !matches!(pk_condition, KeyCondition::Eq(_)) {
        return Err(ExpressionError::InvalidKeyCondition {
            attribute: pk.clone(),
            operator: pk_condition.operator(),
        });
    }

    let mut terms = vec![pk_condition.to_condition(pk).compile(attrs)];
    if let Some(sk) = &schema.sort_key {
        if let Some(sk_condition) = conditions.get(&sk.name) {
            terms.push(sk_condition.to_condition(&sk.name).compile(attrs));
        }
    }
    Ok(terms.join(" AND "))
}

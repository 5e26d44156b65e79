//! Condition and update builders bound to a field's table attribute.
//!
//! Each trait is implemented only for the field kinds whose stored type
//! supports the operation, so `Fields::boolean().begins_with(..)` does not
//! compile.

use std::collections::BTreeMap;

use dynamap_model::AttributeValue;
use serde_json::Value;

use super::value::{
    FieldBinary, FieldBinarySet, FieldBoolean, FieldDate, FieldList, FieldMap, FieldNumber,
    FieldNumberSet, FieldString, FieldStringSet,
};
use crate::error::SchemaError;
use crate::expression::condition::IntoValueOperand;
use crate::expression::{Condition, Operand, UpdateOp};

/// Table attribute a field is stored under.
///
/// Builders that name the attribute fail with [`SchemaError::Unbound`] for a
/// field with no alias that has not been added to a schema yet.
pub trait FieldPath {
    /// The alias if one was set, otherwise the bound property name.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Unbound`] when there is neither.
    fn path(&self) -> Result<String, SchemaError>;
}

/// Comparisons and existence checks.
pub trait Comparable: FieldPath {
    /// `path = value`
    fn eq(&self, value: impl IntoValueOperand) -> Result<Condition, SchemaError> {
        Ok(Condition::eq(self.path()?, value))
    }

    /// `path <> value`
    fn ne(&self, value: impl IntoValueOperand) -> Result<Condition, SchemaError> {
        Ok(Condition::ne(self.path()?, value))
    }

    /// `path < value`
    fn lt(&self, value: impl IntoValueOperand) -> Result<Condition, SchemaError> {
        Ok(Condition::lt(self.path()?, value))
    }

    /// `path <= value`
    fn le(&self, value: impl IntoValueOperand) -> Result<Condition, SchemaError> {
        Ok(Condition::le(self.path()?, value))
    }

    /// `path > value`
    fn gt(&self, value: impl IntoValueOperand) -> Result<Condition, SchemaError> {
        Ok(Condition::gt(self.path()?, value))
    }

    /// `path >= value`
    fn ge(&self, value: impl IntoValueOperand) -> Result<Condition, SchemaError> {
        Ok(Condition::ge(self.path()?, value))
    }

    /// `path BETWEEN low AND high`
    fn between(
        &self,
        low: impl IntoValueOperand,
        high: impl IntoValueOperand,
    ) -> Result<Condition, SchemaError> {
        Ok(Condition::between(self.path()?, low, high))
    }

    /// `path IN (values...)`
    fn in_list<I, V>(&self, values: I) -> Result<Condition, SchemaError>
    where
        I: IntoIterator<Item = V>,
        V: IntoValueOperand,
    {
        Ok(Condition::in_list(self.path()?, values))
    }

    /// `attribute_exists(path)`
    fn exists(&self) -> Result<Condition, SchemaError> {
        Ok(Condition::exists(self.path()?))
    }

    /// `attribute_not_exists(path)`
    fn not_exists(&self) -> Result<Condition, SchemaError> {
        Ok(Condition::not_exists(self.path()?))
    }

    /// `attribute_type(path, :t)`
    fn type_is(&self, type_descriptor: &str) -> Result<Condition, SchemaError> {
        Ok(Condition::attribute_type(self.path()?, type_descriptor))
    }
}

/// `size(path)` for strings, binaries, sets, lists and maps.
pub trait Sizeable: FieldPath {
    /// `size(path)` operand, for use in any comparison.
    fn size(&self) -> Result<Operand, SchemaError> {
        Ok(Operand::size(self.path()?))
    }
}

/// Prefix and substring checks.
pub trait StringOps: FieldPath {
    /// `begins_with(path, prefix)`
    fn begins_with(&self, prefix: impl IntoValueOperand) -> Result<Condition, SchemaError> {
        Ok(Condition::begins_with(self.path()?, prefix))
    }

    /// `contains(path, substring)`
    fn contains(&self, substring: impl IntoValueOperand) -> Result<Condition, SchemaError> {
        Ok(Condition::contains(self.path()?, substring))
    }
}

/// Arithmetic updates.
pub trait Incrementable: FieldPath {
    /// `SET path = path + n`
    fn inc(&self, n: impl Into<AttributeValue>) -> UpdateOp {
        UpdateOp::inc(n)
    }

    /// `SET path = path - n`
    fn dec(&self, n: impl Into<AttributeValue>) -> UpdateOp {
        UpdateOp::dec(n)
    }

    /// `SET path = source + n`
    fn add_from(
        &self,
        source: &dyn FieldPath,
        n: impl Into<AttributeValue>,
    ) -> Result<UpdateOp, SchemaError> {
        Ok(UpdateOp::add(source.path()?, n))
    }

    /// `SET path = source - n`
    fn sub_from(
        &self,
        source: &dyn FieldPath,
        n: impl Into<AttributeValue>,
    ) -> Result<UpdateOp, SchemaError> {
        Ok(UpdateOp::sub(source.path()?, n))
    }

    /// `ADD path n`, creating the attribute at `n` if missing.
    fn add_number(&self, n: impl Into<AttributeValue>) -> UpdateOp {
        UpdateOp::add_number(n)
    }
}

/// Set membership checks and updates.
pub trait SetOps: FieldPath {
    /// Member type of the set.
    type Member: IntoValueOperand;

    /// Build the set attribute value from `members`.
    fn to_set(members: Vec<Self::Member>) -> AttributeValue;

    /// `contains(path, member)`
    fn has(&self, member: Self::Member) -> Result<Condition, SchemaError> {
        Ok(Condition::contains(self.path()?, member))
    }

    /// `ADD path members`
    fn add(&self, members: Vec<Self::Member>) -> UpdateOp {
        UpdateOp::add_to_set(Self::to_set(members))
    }

    /// `DELETE path members`
    fn remove(&self, members: Vec<Self::Member>) -> UpdateOp {
        UpdateOp::remove_from_set(Self::to_set(members))
    }
}

/// List updates.
pub trait ListOps: FieldPath {
    /// `SET path = list_append(path, items)`
    fn append(&self, items: &[Value]) -> UpdateOp {
        UpdateOp::append(AttributeValue::L(items.iter().map(AttributeValue::from_json).collect()))
    }

    /// `SET path = list_append(items, path)`
    fn prepend(&self, items: &[Value]) -> UpdateOp {
        UpdateOp::prepend(AttributeValue::L(items.iter().map(AttributeValue::from_json).collect()))
    }

    /// `SET path[i] = v` for each entry.
    fn set_at(&self, values: BTreeMap<usize, Value>) -> UpdateOp {
        UpdateOp::set_indexes(
            values
                .into_iter()
                .map(|(index, value)| (index, AttributeValue::from_json(&value)))
                .collect(),
        )
    }

    /// `REMOVE path[i]` for each index.
    fn remove_at(&self, indexes: Vec<usize>) -> UpdateOp {
        UpdateOp::del_indexes(indexes)
    }

    /// `path[index]` as a condition operand.
    fn at(&self, index: usize) -> Result<Operand, SchemaError> {
        Ok(Operand::path(format!("{}[{index}]", self.path()?)))
    }
}

impl Comparable for FieldString {}
impl Sizeable for FieldString {}
impl StringOps for FieldString {}

impl Comparable for FieldNumber {}
impl Incrementable for FieldNumber {}

impl Comparable for FieldBinary {}
impl Sizeable for FieldBinary {}
impl StringOps for FieldBinary {}

impl Comparable for FieldBoolean {}

impl Comparable for FieldDate {}

impl Sizeable for FieldStringSet {}
impl SetOps for FieldStringSet {
    type Member = String;

    fn to_set(members: Vec<String>) -> AttributeValue {
        AttributeValue::Ss(members)
    }
}

impl Sizeable for FieldNumberSet {}
impl SetOps for FieldNumberSet {
    type Member = f64;

    fn to_set(members: Vec<f64>) -> AttributeValue {
        AttributeValue::number_set(members)
    }
}

impl Sizeable for FieldBinarySet {}
impl SetOps for FieldBinarySet {
    type Member = bytes::Bytes;

    fn to_set(members: Vec<bytes::Bytes>) -> AttributeValue {
        AttributeValue::Bs(members)
    }
}

impl Sizeable for FieldList {}
impl ListOps for FieldList {}

impl Sizeable for FieldMap {}

//! Update operations and their compilation to one update-expression string.
//!
//! A table update is an ordered map of attribute path to [`UpdateInput`]. Each
//! entry is resolved into exactly one of the four clause accumulators, and the
//! clauses are joined in the fixed order `SET`, `REMOVE`, `ADD`, `DELETE`.

use std::collections::BTreeMap;

use dynamap_model::AttributeValue;
use indexmap::IndexMap;

use super::attributes::ExpressionAttributes;

/// Ordered attribute path -> update input, the table side of an update.
pub type TableUpdate = IndexMap<String, UpdateInput>;

/// What to do with one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateInput {
    /// Assign a literal: `SET path = :v`.
    Value(AttributeValue),
    /// Apply an update operation.
    Op(UpdateOp),
}

impl UpdateInput {
    /// Literal assignment.
    #[must_use]
    pub fn value(value: impl Into<AttributeValue>) -> Self {
        Self::Value(value.into())
    }
}

impl From<UpdateOp> for UpdateInput {
    fn from(op: UpdateOp) -> Self {
        Self::Op(op)
    }
}

/// An update operation on one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// `REMOVE path`
    Del,
    /// `SET path = #source`
    Path(String),
    /// `SET path = if_not_exists(path, :v)`
    Default(AttributeValue),
    /// `SET path = path + :v`
    Inc(AttributeValue),
    /// `SET path = path - :v`
    Dec(AttributeValue),
    /// `SET path = #source + :v`
    Add {
        /// Attribute read as the left operand.
        source: String,
        /// Number added.
        value: AttributeValue,
    },
    /// `SET path = #source - :v`
    Sub {
        /// Attribute read as the left operand.
        source: String,
        /// Number subtracted.
        value: AttributeValue,
    },
    /// `ADD path :v` with a number.
    AddNumber(AttributeValue),
    /// `ADD path :v` with a set.
    AddToSet(AttributeValue),
    /// `DELETE path :v` with a set.
    RemoveFromSet(AttributeValue),
    /// `SET path = list_append(path, :v)`
    Append(AttributeValue),
    /// `SET path = list_append(:v, path)`
    Prepend(AttributeValue),
    /// `SET path = list_append(#source, :v)`
    Join {
        /// List attribute placed first.
        source: String,
        /// List appended after it.
        value: AttributeValue,
    },
    /// `SET path[i] = :v` for each entry, ascending index order.
    SetIndexes(BTreeMap<usize, AttributeValue>),
    /// `REMOVE path[i]` for each index.
    DelIndexes(Vec<usize>),
    /// Update nested map members at `path.key`.
    Map(IndexMap<String, UpdateInput>),
}

impl UpdateOp {
    /// Remove the attribute.
    #[must_use]
    pub fn del() -> Self {
        Self::Del
    }

    /// Copy another attribute's value.
    #[must_use]
    pub fn path(source: impl Into<String>) -> Self {
        Self::Path(source.into())
    }

    /// Assign only when the attribute does not exist yet.
    #[must_use]
    pub fn default_value(value: impl Into<AttributeValue>) -> Self {
        Self::Default(value.into())
    }

    /// Increment by `n`.
    #[must_use]
    pub fn inc(n: impl Into<AttributeValue>) -> Self {
        Self::Inc(n.into())
    }

    /// Decrement by `n`.
    #[must_use]
    pub fn dec(n: impl Into<AttributeValue>) -> Self {
        Self::Dec(n.into())
    }

    /// Assign `source + n`.
    #[must_use]
    pub fn add(source: impl Into<String>, n: impl Into<AttributeValue>) -> Self {
        Self::Add {
            source: source.into(),
            value: n.into(),
        }
    }

    /// Assign `source - n`.
    #[must_use]
    pub fn sub(source: impl Into<String>, n: impl Into<AttributeValue>) -> Self {
        Self::Sub {
            source: source.into(),
            value: n.into(),
        }
    }

    /// Atomic `ADD` of a number.
    #[must_use]
    pub fn add_number(n: impl Into<AttributeValue>) -> Self {
        Self::AddNumber(n.into())
    }

    /// Add the members of `set` (an `SS`, `NS` or `BS` value).
    #[must_use]
    pub fn add_to_set(set: AttributeValue) -> Self {
        Self::AddToSet(set)
    }

    /// Delete the members of `set` (an `SS`, `NS` or `BS` value).
    #[must_use]
    pub fn remove_from_set(set: AttributeValue) -> Self {
        Self::RemoveFromSet(set)
    }

    /// Append the items of `list`.
    #[must_use]
    pub fn append(list: AttributeValue) -> Self {
        Self::Append(list)
    }

    /// Prepend the items of `list`.
    #[must_use]
    pub fn prepend(list: AttributeValue) -> Self {
        Self::Prepend(list)
    }

    /// Assign `source` followed by the items of `list`.
    #[must_use]
    pub fn join(source: impl Into<String>, list: AttributeValue) -> Self {
        Self::Join {
            source: source.into(),
            value: list,
        }
    }

    /// Replace list elements by index.
    #[must_use]
    pub fn set_indexes(values: BTreeMap<usize, AttributeValue>) -> Self {
        Self::SetIndexes(values)
    }

    /// Remove list elements by index.
    #[must_use]
    pub fn del_indexes(indexes: Vec<usize>) -> Self {
        Self::DelIndexes(indexes)
    }

    /// Update members of a map attribute.
    #[must_use]
    pub fn map(members: IndexMap<String, UpdateInput>) -> Self {
        Self::Map(members)
    }

    fn resolve(&self, path: &str, attrs: &mut ExpressionAttributes, clauses: &mut Clauses) {
        match self {
            Self::Del => clauses.remove.push(attrs.add_path(path)),
            Self::Path(source) => {
                let path = attrs.add_path(path);
                let source = attrs.add_path(source);
                clauses.set.push(format!("{path} = {source}"));
            }
            Self::Default(value) => {
                let path = attrs.add_path(path);
                let value = attrs.add_value(value.clone());
                clauses
                    .set
                    .push(format!("{path} = if_not_exists({path}, {value})"));
            }
            Self::Inc(value) | Self::Dec(value) => {
                let sign = if matches!(self, Self::Inc(_)) { '+' } else { '-' };
                let path = attrs.add_path(path);
                let value = attrs.add_value(value.clone());
                clauses.set.push(format!("{path} = {path} {sign} {value}"));
            }
            Self::Add { source, value } | Self::Sub { source, value } => {
                let sign = if matches!(self, Self::Add { .. }) { '+' } else { '-' };
                let path = attrs.add_path(path);
                let source = attrs.add_path(source);
                let value = attrs.add_value(value.clone());
                clauses.set.push(format!("{path} = {source} {sign} {value}"));
            }
            Self::AddNumber(value) | Self::AddToSet(value) => {
                let path = attrs.add_path(path);
                let value = attrs.add_value(value.clone());
                clauses.add.push(format!("{path} {value}"));
            }
            Self::RemoveFromSet(value) => {
                let path = attrs.add_path(path);
                let value = attrs.add_value(value.clone());
                clauses.delete.push(format!("{path} {value}"));
            }
            Self::Append(value) => {
                let path = attrs.add_path(path);
                let value = attrs.add_value(value.clone());
                clauses
                    .set
                    .push(format!("{path} = list_append({path}, {value})"));
            }
            Self::Prepend(value) => {
                let path = attrs.add_path(path);
                let value = attrs.add_value(value.clone());
                clauses
                    .set
                    .push(format!("{path} = list_append({value}, {path})"));
            }
            Self::Join { source, value } => {
                let path = attrs.add_path(path);
                let source = attrs.add_path(source);
                let value = attrs.add_value(value.clone());
                clauses
                    .set
                    .push(format!("{path} = list_append({source}, {value})"));
            }
            Self::SetIndexes(values) => {
                for (index, value) in values {
                    let path = attrs.add_path(&format!("{path}[{index}]"));
                    let value = attrs.add_value(value.clone());
                    clauses.set.push(format!("{path} = {value}"));
                }
            }
            Self::DelIndexes(indexes) => {
                for index in indexes {
                    clauses.remove.push(attrs.add_path(&format!("{path}[{index}]")));
                }
            }
            Self::Map(members) => {
                for (member, input) in members {
                    resolve(&format!("{path}.{member}"), input, attrs, clauses);
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct Clauses {
    set: Vec<String>,
    remove: Vec<String>,
    add: Vec<String>,
    delete: Vec<String>,
}

impl Clauses {
    fn finish(self) -> Option<String> {
        let parts: Vec<String> = [
            ("SET", self.set),
            ("REMOVE", self.remove),
            ("ADD", self.add),
            ("DELETE", self.delete),
        ]
        .into_iter()
        .filter(|(_, entries)| !entries.is_empty())
        .map(|(keyword, entries)| format!("{keyword} {}", entries.join(", ")))
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

fn resolve(path: &str, input: &UpdateInput, attrs: &mut ExpressionAttributes, clauses: &mut Clauses) {
    match input {
        UpdateInput::Value(value) => {
            let path = attrs.add_path(path);
            let value = attrs.add_value(value.clone());
            clauses.set.push(format!("{path} = {value}"));
        }
        UpdateInput::Op(op) => op.resolve(path, attrs, clauses),
    }
}

/// Compile a table update into an update expression.
///
/// Returns `None` when the update produced no clause at all.
pub fn compile_update(update: &TableUpdate, attrs: &mut ExpressionAttributes) -> Option<String> {
    let mut clauses = Clauses::default();
    for (path, input) in update {
        resolve(path, input, attrs, &mut clauses);
    }
    clauses.finish()
}

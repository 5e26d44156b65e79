//! Shared DynamoDB enums and small structs used by the request shapes.
//!
//! Enum variants use idiomatic Rust `PascalCase` naming with `#[serde(rename)]`
//! attributes to map to the `SCREAMING_SNAKE_CASE` wire format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Key type within a key schema element.
///
/// `Hash` denotes the partition key; `Range` denotes the sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Partition key.
    #[serde(rename = "HASH")]
    Hash,
    /// Sort key.
    #[serde(rename = "RANGE")]
    Range,
}

impl KeyType {
    /// Returns the DynamoDB wire-format string representation of this key type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hash => "HASH",
            Self::Range => "RANGE",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar type of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScalarAttributeType {
    /// String type.
    #[default]
    S,
    /// Number type.
    N,
    /// Binary type.
    B,
}

impl ScalarAttributeType {
    /// Returns the DynamoDB wire-format string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S => "S",
            Self::N => "N",
            Self::B => "B",
        }
    }
}

impl fmt::Display for ScalarAttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a key schema: an attribute and its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    /// The name of the key attribute.
    pub attribute_name: String,
    /// The role of the attribute in the key schema (`HASH` or `RANGE`).
    pub key_type: KeyType,
    /// The scalar type of the attribute. Not part of the wire element.
    #[serde(skip)]
    pub attribute_type: ScalarAttributeType,
}

impl KeySchemaElement {
    /// Partition key element.
    #[must_use]
    pub fn hash(name: impl Into<String>, attribute_type: ScalarAttributeType) -> Self {
        Self {
            attribute_name: name.into(),
            key_type: KeyType::Hash,
            attribute_type,
        }
    }

    /// Sort key element.
    #[must_use]
    pub fn range(name: impl Into<String>, attribute_type: ScalarAttributeType) -> Self {
        Self {
            attribute_name: name.into(),
            key_type: KeyType::Range,
            attribute_type,
        }
    }
}

/// Determines what values are returned by write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReturnValue {
    /// Nothing is returned.
    #[default]
    #[serde(rename = "NONE")]
    None,
    /// Returns all attributes of the item as they appeared before the operation.
    #[serde(rename = "ALL_OLD")]
    AllOld,
    /// Returns only the updated attributes as they appeared before the operation.
    #[serde(rename = "UPDATED_OLD")]
    UpdatedOld,
    /// Returns all attributes of the item as they appear after the operation.
    #[serde(rename = "ALL_NEW")]
    AllNew,
    /// Returns only the updated attributes as they appear after the operation.
    #[serde(rename = "UPDATED_NEW")]
    UpdatedNew,
}

impl ReturnValue {
    /// Returns the DynamoDB wire-format string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::AllOld => "ALL_OLD",
            Self::UpdatedOld => "UPDATED_OLD",
            Self::AllNew => "ALL_NEW",
            Self::UpdatedNew => "UPDATED_NEW",
        }
    }
}

impl fmt::Display for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "ALL_OLD" => Ok(Self::AllOld),
            "UPDATED_OLD" => Ok(Self::UpdatedOld),
            "ALL_NEW" => Ok(Self::AllNew),
            "UPDATED_NEW" => Ok(Self::UpdatedNew),
            other => Err(format!("unknown ReturnValues: {other}")),
        }
    }
}

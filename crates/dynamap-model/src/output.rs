//! Response shapes returned by a transport.
//!
//! Only the parts the model layer reads back are represented: the returned
//! item(s) and, for paginated queries, the continuation key.

use serde::{Deserialize, Serialize};

use crate::attribute_value::Item;

/// Output for the `GetItem` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemOutput {
    /// The item, if one exists for the requested key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
}

/// Output for the `PutItem` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemOutput {
    /// The attribute values as they appeared before the put (only returned
    /// when `ReturnValues` is specified).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Item>,
}

/// Output for the `DeleteItem` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemOutput {
    /// The attribute values as they appeared before the delete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Item>,
}

/// Output for the `UpdateItem` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemOutput {
    /// The attribute values selected by `ReturnValues`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Item>,
}

/// Output for the `Query` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryOutput {
    /// The items that match the query criteria.
    #[serde(default)]
    pub items: Vec<Item>,

    /// The primary key of the item where the operation stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Item>,
}

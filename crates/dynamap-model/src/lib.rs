//! DynamoDB wire types for dynamap.
//!
//! This crate holds the request and response shapes that the dynamap compiler
//! produces and that a transport consumes. Field names follow the DynamoDB JSON
//! protocol (`awsJson1_0`) so the compiled parameters can be sent as-is.
// "DynamoDB" appears in virtually every doc comment in this crate.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod attribute_value;
pub mod error;
pub mod input;
pub mod output;
pub mod types;

pub use attribute_value::{AttributeValue, Item};
pub use error::{DynamoDBError, DynamoDBErrorCode};

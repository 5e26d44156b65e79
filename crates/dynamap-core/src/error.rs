//! Error types for schema construction, expression building and model
//! operations.

use dynamap_model::DynamoDBError;
use thiserror::Error;

use crate::expression::LogicalOp;

/// Errors raised while building or compiling expressions.
#[derive(Debug, Error)]
pub enum ExpressionError {
    /// A logical node was built with the wrong number of children.
    #[error("{op} requires {expected} condition(s), got {actual}")]
    InvalidChildCount {
        /// The logical operator.
        op: LogicalOp,
        /// Required arity.
        expected: &'static str,
        /// Supplied arity.
        actual: usize,
    },
    /// A key condition used an operator the key does not support.
    #[error("key attribute '{attribute}' does not support '{operator}', only '=' is allowed")]
    InvalidKeyCondition {
        /// The partition key attribute.
        attribute: String,
        /// The rejected operator.
        operator: &'static str,
    },
    /// A query did not constrain the partition key.
    #[error("missing key condition for partition key '{attribute}'")]
    MissingPartitionKey {
        /// The partition key attribute.
        attribute: String,
    },
}

/// Errors raised by a field while mapping one value.
#[derive(Debug, Error)]
pub enum FieldError {
    /// A required field had no value and no default.
    #[error("field '{name}' is required")]
    Required {
        /// Logical field name.
        name: String,
    },
    /// The model value does not have the shape the field stores.
    #[error("field '{name}' expects {expected}")]
    InvalidValue {
        /// Logical field name.
        name: String,
        /// Description of the accepted shape.
        expected: &'static str,
    },
    /// The field cannot apply an update operation.
    #[error("field '{name}' does not support update operations")]
    UnsupportedUpdate {
        /// Logical field name.
        name: String,
    },
}

/// Errors raised while assembling a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A field instance was bound to a second name or model.
    #[error("field already initialized as '{existing}', cannot bind it to '{name}'")]
    AlreadyInitialized {
        /// The name it is bound to.
        existing: String,
        /// The rejected name.
        name: String,
    },
    /// The same logical name was declared twice.
    #[error("duplicate field '{name}'")]
    DuplicateField {
        /// Logical field name.
        name: String,
    },
    /// A named composite slot was requested that was never declared.
    #[error("composite '{composite}' has no slot named '{slot}'")]
    UnknownSlot {
        /// Composite attribute name.
        composite: String,
        /// Requested slot.
        slot: String,
    },
    /// A field was used in an expression before it had an attribute name.
    #[error("field has no alias and has not been added to a schema")]
    Unbound,
}

/// A validator rejected a value.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Logical field name.
    pub field: String,
    /// Validator message, reported as-is.
    pub message: String,
}

impl ValidationError {
    /// Create a rejection for `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Expression construction or compilation failed.
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// A field rejected its value.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// A validator rejected a value.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An update tried to apply an operation to a key attribute.
    #[error("key attribute '{attribute}' can only be set to a literal value")]
    KeyUpdate {
        /// The key attribute.
        attribute: String,
    },

    /// The mapped item does not carry every primary key attribute.
    #[error("missing value for key attribute '{attribute}'")]
    MissingKey {
        /// The key attribute.
        attribute: String,
    },

    /// A query named an index the table does not declare.
    #[error("table '{table}' has no index '{index}'")]
    UnknownIndex {
        /// Table name.
        table: String,
        /// Requested index.
        index: String,
    },

    /// The transport failed to execute the compiled request.
    #[error(transparent)]
    Transport(#[from] DynamoDBError),
}

/// Convenience result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

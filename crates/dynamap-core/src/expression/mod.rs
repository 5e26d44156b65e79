//! Expression compilation.
//!
//! Condition trees, update operations and key conditions all compile against
//! one [`ExpressionAttributes`] table per request, so a request's
//! `ExpressionAttributeNames` / `ExpressionAttributeValues` cover every
//! expression it carries.

pub mod attributes;
pub mod condition;
pub mod key_condition;
pub mod update;

pub use attributes::ExpressionAttributes;
pub use condition::{CompareOp, Condition, FunctionName, LogicalNode, LogicalOp, Operand};
pub use key_condition::{KeyCondition, KeyConditions, compile_key_condition};
pub use update::{TableUpdate, UpdateInput, UpdateOp, compile_update};

pub use crate::error::ExpressionError;

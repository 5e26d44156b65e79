//! Schema-driven DynamoDB item mapping.
//!
//! A [`Schema`] declares how each property of an application-side model maps
//! onto table attributes. A [`Model`] binds a schema to a [`Table`] and turns
//! model-level calls into `GetItem`, `PutItem`, `DeleteItem`, `UpdateItem` and
//! `Query` parameters, compiling conditions, updates and key conditions
//! against one shared set of expression placeholders per request.
#![allow(clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod expression;
pub mod fields;
pub mod model;
pub mod schema;
pub mod table;
pub mod transport;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ModelConfig;
pub use context::{Action, ModelContext, ModelOptions};
pub use error::{ExpressionError, FieldError, ModelError, ModelResult, SchemaError, ValidationError};
pub use expression::{Condition, KeyCondition, KeyConditions, UpdateOp};
pub use fields::{Field, Fields, ModelItem, ModelUpdate, UpdateValue, WithOptions};
pub use model::{CompiledItem, CompiledUpdate, Model, QueryResult};
pub use schema::{Schema, SchemaBuilder};
pub use table::{Index, KeySchema, QueryOptions, Table};
pub use transport::Transport;

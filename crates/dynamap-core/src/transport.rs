//! The seam between compiled requests and whatever executes them.

use dynamap_model::DynamoDBError;
use dynamap_model::input::{
    DeleteItemInput, GetItemInput, PutItemInput, QueryInput, UpdateItemInput,
};
use dynamap_model::output::{
    DeleteItemOutput, GetItemOutput, PutItemOutput, QueryOutput, UpdateItemOutput,
};

/// Executes compiled item requests, typically by calling DynamoDB.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Execute `GetItem`.
    async fn get(&self, input: GetItemInput) -> Result<GetItemOutput, DynamoDBError>;

    /// Execute `PutItem`.
    async fn put(&self, input: PutItemInput) -> Result<PutItemOutput, DynamoDBError>;

    /// Execute `DeleteItem`.
    async fn delete(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, DynamoDBError>;

    /// Execute `UpdateItem`.
    async fn update(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, DynamoDBError>;

    /// Execute `Query`.
    async fn query(&self, input: QueryInput) -> Result<QueryOutput, DynamoDBError>;
}

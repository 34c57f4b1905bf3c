pub mod dynamodb_client;
mod auth_token;
mod single_table_client;

#[cfg(test)]
pub mod in_memory_table;


pub use auth_token::{AuthToken, AUTH_TOKEN_ENTITY_TYPE};
pub use dynamodb_client::{DynamoDbTable, Item, TableBackend};
pub use single_table_client::{build_container_pointer, SingleTableClient};

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::{Client, types::AttributeValue};
use tracing::debug;

use crate::errors::AppError;

pub type Item = HashMap<String, AttributeValue>;

pub const UUID_ATTRIBUTE: &str = "uuid";
pub const TYPE_ATTRIBUTE: &str = "typ";
pub const CONTAINER_ATTRIBUTE: &str = "container";
pub const SLACK_WORKSPACE_ID_ATTRIBUTE: &str = "slackWorkspaceId";
pub const BY_SLACK_WORKSPACE_ID_INDEX: &str = "by-slack-workspace-id";

pub fn get_attribute(item: &Item, name: &str) -> Result<String, AppError> {
    get_optional_attribute(item, name)
        .ok_or_else(|| AppError::InvalidRecord(name.to_string()))
}

pub fn get_optional_attribute(item: &Item, name: &str) -> Option<String> {
    item
        .get(name)
        .and_then(|attr|
            if attr.is_n() {
                attr.as_n().ok()
            } else {
                attr.as_s().ok()
            }
        )
        .cloned()
}

pub fn get_number_attribute(item: &Item, name: &str) -> Result<i64, AppError> {
    get_attribute(item, name)?
        .parse::<i64>()
        .map_err(|_| AppError::InvalidRecord(name.to_string()))
}

/// Storage primitives the single table client is built on.
#[async_trait]
pub trait TableBackend: Send + Sync {
    async fn put_item(&self, item: Item) -> Result<(), AppError>;

    async fn get_item(&self, uuid: &str, typ: &str) -> Result<Option<Item>, AppError>;

    async fn query_by_workspace_id(&self, typ: &str, slack_workspace_id: &str) -> Result<Vec<Item>, AppError>;

    async fn delete_item(&self, uuid: &str, typ: &str) -> Result<(), AppError>;
}

pub struct DynamoDbTable {
    client: Client,
    table_name: String,
}

impl DynamoDbTable {
    pub fn new(config: &SdkConfig, table_name: String) -> DynamoDbTable {
        DynamoDbTable{ client: Client::new(config), table_name }
    }
}

#[async_trait]
impl TableBackend for DynamoDbTable {
    async fn put_item(&self, item: Item) -> Result<(), AppError> {
        let request = self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item));

        debug!(table = %self.table_name, "Putting item to DynamoDB");
        request.send().await?;

        Ok(())
    }

    async fn get_item(&self, uuid: &str, typ: &str) -> Result<Option<Item>, AppError> {
        let output = self.client
            .get_item()
            .table_name(&self.table_name)
            .consistent_read(true)
            .key(UUID_ATTRIBUTE, AttributeValue::S(uuid.to_string()))
            .key(TYPE_ATTRIBUTE, AttributeValue::S(typ.to_string()))
            .send()
            .await?;

        Ok(output.item)
    }

    async fn query_by_workspace_id(&self, typ: &str, slack_workspace_id: &str) -> Result<Vec<Item>, AppError> {
        let mut items = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let output = self.client
                .query()
                .table_name(&self.table_name)
                .index_name(BY_SLACK_WORKSPACE_ID_INDEX)
                .key_condition_expression("#typ = :typ AND #workspace = :workspace")
                .expression_attribute_names("#typ", TYPE_ATTRIBUTE)
                .expression_attribute_names("#workspace", SLACK_WORKSPACE_ID_ATTRIBUTE)
                .expression_attribute_values(":typ", AttributeValue::S(typ.to_string()))
                .expression_attribute_values(":workspace", AttributeValue::S(slack_workspace_id.to_string()))
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await?;

            items.extend(output.items.unwrap_or_default());

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn delete_item(&self, uuid: &str, typ: &str) -> Result<(), AppError> {
        let request = self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(UUID_ATTRIBUTE, AttributeValue::S(uuid.to_string()))
            .key(TYPE_ATTRIBUTE, AttributeValue::S(typ.to_string()));

        debug!(table = %self.table_name, uuid, typ, "Deleting item from DynamoDB");
        request.send().await?;

        Ok(())
    }
}

use std::sync::Arc;

use aws_config::SdkConfig;
use aws_sdk_dynamodb::types::AttributeValue;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

use crate::errors::AppError;
use super::dynamodb_client::{DynamoDbTable, Item, TableBackend, CONTAINER_ATTRIBUTE, TYPE_ATTRIBUTE, UUID_ATTRIBUTE};

/// Records of every entity type live in one table, addressed by `(uuid, typ)`.
#[derive(Clone)]
pub struct SingleTableClient {
    backend: Arc<dyn TableBackend>,
}

pub fn build_container_pointer(segments: &[&str]) -> Result<String, AppError> {
    lazy_static! {
        static ref POINTER_SEGMENT: Regex = Regex::new(r"^[a-zA-Z0-9_-]{1,64}$").unwrap();
    }

    if let Some(invalid) = segments.iter().find(|segment| !POINTER_SEGMENT.is_match(segment)) {
        return Err(AppError::InvalidPointerSegment(invalid.to_string()));
    }

    Ok(segments.join("/"))
}

impl SingleTableClient {
    pub fn new(backend: Arc<dyn TableBackend>) -> SingleTableClient {
        SingleTableClient { backend }
    }

    pub fn dynamodb(config: &SdkConfig, table_name: String) -> SingleTableClient {
        SingleTableClient::new(Arc::new(DynamoDbTable::new(config, table_name)))
    }

    pub async fn put(&self, entity_type: &str, unique_id: &str, container_path_segments: &[&str], mut item: Item) -> Result<Item, AppError> {
        let container = build_container_pointer(container_path_segments)?;

        item.insert(TYPE_ATTRIBUTE.to_string(), AttributeValue::S(entity_type.to_string()));
        item.insert(UUID_ATTRIBUTE.to_string(), AttributeValue::S(unique_id.to_string()));
        item.insert(CONTAINER_ATTRIBUTE.to_string(), AttributeValue::S(container));

        info!(entity_type, unique_id, "Saving record");
        self.backend.put_item(item.clone()).await?;

        Ok(item)
    }

    pub async fn get(&self, entity_type: &str, unique_id: &str) -> Result<Option<Item>, AppError> {
        self.backend.get_item(unique_id, entity_type).await
    }

    pub async fn query_by_workspace_id(&self, entity_type: &str, workspace_id: &str) -> Result<Vec<Item>, AppError> {
        self.backend.query_by_workspace_id(entity_type, workspace_id).await
    }

    pub async fn delete(&self, entity_type: &str, unique_id: &str) -> Result<(), AppError> {
        info!(entity_type, unique_id, "Deleting record");
        self.backend.delete_item(unique_id, entity_type).await
    }
}

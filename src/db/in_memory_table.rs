use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;

use crate::errors::AppError;
use super::dynamodb_client::{get_optional_attribute, Item, TableBackend, SLACK_WORKSPACE_ID_ATTRIBUTE, TYPE_ATTRIBUTE, UUID_ATTRIBUTE};

/// Table backend kept in memory, counting writes so tests can assert on them.
#[derive(Default)]
pub struct InMemoryTable {
    items: Mutex<HashMap<(String, String), Item>>,
    puts: Mutex<usize>,
    deletes: Mutex<usize>,
    /// Index queries return nothing, like a GSI that has not caught up yet.
    lagging_index: Mutex<bool>,
    failing_deletes: Mutex<bool>,
}

impl InMemoryTable {
    pub fn new() -> InMemoryTable {
        InMemoryTable::default()
    }

    pub fn lag_index(&self) {
        *self.lagging_index.lock().unwrap() = true;
    }

    pub fn fail_deletes(&self) {
        *self.failing_deletes.lock().unwrap() = true;
    }

    pub fn put_count(&self) -> usize {
        *self.puts.lock().unwrap()
    }

    pub fn delete_count(&self) -> usize {
        *self.deletes.lock().unwrap()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn all_items(&self) -> Vec<Item> {
        self.items.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl TableBackend for InMemoryTable {
    async fn put_item(&self, item: Item) -> Result<(), AppError> {
        let uuid = get_optional_attribute(&item, UUID_ATTRIBUTE).unwrap_or_default();
        let typ = get_optional_attribute(&item, TYPE_ATTRIBUTE).unwrap_or_default();

        *self.puts.lock().unwrap() += 1;
        self.items.lock().unwrap().insert((uuid, typ), item);
        Ok(())
    }

    async fn get_item(&self, uuid: &str, typ: &str) -> Result<Option<Item>, AppError> {
        Ok(self.items.lock().unwrap().get(&(uuid.to_string(), typ.to_string())).cloned())
    }

    async fn query_by_workspace_id(&self, typ: &str, slack_workspace_id: &str) -> Result<Vec<Item>, AppError> {
        if *self.lagging_index.lock().unwrap() {
            return Ok(Vec::new());
        }

        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .filter(|((_, item_typ), item)| {
                item_typ == typ
                    && get_optional_attribute(item, SLACK_WORKSPACE_ID_ATTRIBUTE).as_deref() == Some(slack_workspace_id)
            })
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn delete_item(&self, uuid: &str, typ: &str) -> Result<(), AppError> {
        if *self.failing_deletes.lock().unwrap() {
            return Err(AppError::UnexpectedError("delete failed".to_string()));
        }

        *self.deletes.lock().unwrap() += 1;
        self.items.lock().unwrap().remove(&(uuid.to_string(), typ.to_string()));
        Ok(())
    }
}

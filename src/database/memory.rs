use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::models::{TodoItem, UpdateTodoRequest};
use super::repository::{StoreError, TodoRepository};

/// In-process todo table, partitioned by user id.
///
/// Backs the test suite and `TODO_STORE=memory` local runs.
#[derive(Debug, Default)]
pub struct MemoryTodoRepository {
    partitions: RwLock<HashMap<String, BTreeMap<String, TodoItem>>>,
}

impl MemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total items across all users
    pub async fn len(&self) -> usize {
        self.partitions.read().await.values().map(BTreeMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TodoRepository for MemoryTodoRepository {
    async fn get(&self, user_id: &str, todo_id: &str) -> Result<Option<TodoItem>, StoreError> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(user_id)
            .and_then(|items| items.get(todo_id))
            .cloned())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<TodoItem>, StoreError> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(user_id)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, item: &TodoItem) -> Result<(), StoreError> {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(item.user_id.clone())
            .or_default()
            .insert(item.todo_id.clone(), item.clone());
        Ok(())
    }

    async fn update_fields(
        &self,
        user_id: &str,
        todo_id: &str,
        update: &UpdateTodoRequest,
    ) -> Result<(), StoreError> {
        let mut partitions = self.partitions.write().await;
        // Missing key is a silent no-op
        if let Some(item) = partitions.get_mut(user_id).and_then(|items| items.get_mut(todo_id)) {
            update.apply_to(item);
        }
        Ok(())
    }

    async fn delete(&self, user_id: &str, todo_id: &str) -> Result<(), StoreError> {
        let mut partitions = self.partitions.write().await;
        if let Some(items) = partitions.get_mut(user_id) {
            items.remove(todo_id);
            if items.is_empty() {
                partitions.remove(user_id);
            }
        }
        Ok(())
    }
}

use async_trait::async_trait;
use thiserror::Error;

use super::models::{TodoItem, UpdateTodoRequest};

/// Errors from the item store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or service failure talking to the store
    #[error("Item store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be mapped back to a `TodoItem`
    #[error("Corrupt item: {0}")]
    Corrupt(String),
}

/// Per-user partitioned todo table.
///
/// Every call is scoped by `user_id`; nothing here can reach another user's items.
/// Implementations do not re-check existence before writes.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn get(&self, user_id: &str, todo_id: &str) -> Result<Option<TodoItem>, StoreError>;

    /// All items for `user_id`, in store order.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<TodoItem>, StoreError>;

    /// Create or overwrite by `(user_id, todo_id)`.
    async fn insert(&self, item: &TodoItem) -> Result<(), StoreError>;

    /// Set `name`, `dueDate` and `done`; no other attribute is touched.
    async fn update_fields(
        &self,
        user_id: &str,
        todo_id: &str,
        update: &UpdateTodoRequest,
    ) -> Result<(), StoreError>;

    /// Unconditional; deleting a missing key succeeds.
    async fn delete(&self, user_id: &str, todo_id: &str) -> Result<(), StoreError>;

    /// Cheap reachability probe for `/health`.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

use std::sync::Arc;

use chrono::Utc;

use crate::database::models::{CreateTodoRequest, TodoItem, UpdateTodoRequest};
use crate::database::{StoreError, TodoRepository};
use crate::storage::{AttachmentError, AttachmentStore};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Todo {todo_id} not found")]
    NotFound { todo_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

/// Todo operations for one caller identity at a time.
///
/// Constructed once per process and shared by the handlers.
#[derive(Clone)]
pub struct TodoService {
    repository: Arc<dyn TodoRepository>,
    attachments: Arc<dyn AttachmentStore>,
    url_expiration_secs: u64,
}

impl TodoService {
    pub fn new(
        repository: Arc<dyn TodoRepository>,
        attachments: Arc<dyn AttachmentStore>,
        url_expiration_secs: u64,
    ) -> Self {
        Self {
            repository,
            attachments,
            url_expiration_secs,
        }
    }

    pub fn repository(&self) -> &Arc<dyn TodoRepository> {
        &self.repository
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<TodoItem>, ServiceError> {
        Ok(self.repository.list_by_user(user_id).await?)
    }

    pub async fn get(&self, user_id: &str, todo_id: &str) -> Result<TodoItem, ServiceError> {
        self.repository
            .get(user_id, todo_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound { todo_id: todo_id.to_string() })
    }

    /// Stamp id, timestamp, `done = false` and the attachment URL, then store.
    pub async fn create(&self, user_id: &str, request: CreateTodoRequest) -> Result<TodoItem, ServiceError> {
        let item = TodoItem::new(user_id, request, Utc::now(), |todo_id| {
            self.attachments.public_url(todo_id)
        });

        self.repository.insert(&item).await?;
        tracing::info!("Created todo {}", item.todo_id);

        Ok(item)
    }

    /// Check-then-act: a delete landing between the two calls makes the write a no-op.
    pub async fn update(
        &self,
        user_id: &str,
        todo_id: &str,
        update: &UpdateTodoRequest,
    ) -> Result<(), ServiceError> {
        self.ensure_exists(user_id, todo_id).await?;
        self.repository.update_fields(user_id, todo_id, update).await?;
        Ok(())
    }

    /// 404 for a missing item; the repository delete itself is idempotent.
    pub async fn delete(&self, user_id: &str, todo_id: &str) -> Result<(), ServiceError> {
        self.ensure_exists(user_id, todo_id).await?;
        self.repository.delete(user_id, todo_id).await?;
        tracing::info!("Deleted todo {}", todo_id);
        Ok(())
    }

    /// Presigned PUT URL for the attachment keyed by `todo_id`.
    pub async fn generate_upload_url(&self, todo_id: &str) -> Result<String, ServiceError> {
        Ok(self
            .attachments
            .presigned_upload_url(todo_id, self.url_expiration_secs)
            .await?)
    }

    async fn ensure_exists(&self, user_id: &str, todo_id: &str) -> Result<(), ServiceError> {
        match self.repository.get(user_id, todo_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound { todo_id: todo_id.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryTodoRepository;
    use crate::storage::StaticAttachmentStore;
    use chrono::{DateTime, Duration};

    fn service() -> (TodoService, Arc<MemoryTodoRepository>) {
        let repo = Arc::new(MemoryTodoRepository::new());
        let service = TodoService::new(repo.clone(), Arc::new(StaticAttachmentStore::new("bucket")), 300);
        (service, repo)
    }

    fn buy_milk() -> CreateTodoRequest {
        CreateTodoRequest { name: "Buy milk".into(), due_date: Some("2024-01-01".into()) }
    }

    #[tokio::test]
    async fn create_stamps_server_fields() {
        let (service, _) = service();
        let before = Utc::now();
        let item = service.create("alice", buy_milk()).await.unwrap();

        assert_eq!(item.name, "Buy milk");
        assert_eq!(item.due_date.as_deref(), Some("2024-01-01"));
        assert!(!item.done);
        assert!(uuid::Uuid::parse_str(&item.todo_id).is_ok());
        assert!(item.attachment_url.contains(&item.todo_id));

        let created: DateTime<Utc> = item.created_at.parse().unwrap();
        assert!(created >= before - Duration::milliseconds(1));
        assert!(created <= Utc::now());
    }

    #[tokio::test]
    async fn created_item_round_trips() {
        let (service, _) = service();
        let created = service.create("alice", buy_milk()).await.unwrap();
        assert_eq!(service.get("alice", &created.todo_id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn ids_are_not_reused() {
        let (service, _) = service();
        let a = service.create("alice", buy_milk()).await.unwrap();
        let b = service.create("alice", buy_milk()).await.unwrap();
        assert_ne!(a.todo_id, b.todo_id);
    }

    #[tokio::test]
    async fn update_missing_is_not_found_and_writes_nothing() {
        let (service, repo) = service();
        let update = UpdateTodoRequest { name: "x".into(), due_date: None, done: true };

        let err = service.update("alice", "missing", &update).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn update_of_another_users_item_is_not_found() {
        let (service, _) = service();
        let item = service.create("alice", buy_milk()).await.unwrap();
        let update = UpdateTodoRequest { name: "hijack".into(), due_date: None, done: true };

        let err = service.update("mallory", &item.todo_id, &update).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
        assert_eq!(service.get("alice", &item.todo_id).await.unwrap().name, "Buy milk");
    }

    #[tokio::test]
    async fn update_changes_only_mutable_fields() {
        let (service, _) = service();
        let item = service.create("alice", buy_milk()).await.unwrap();
        let update = UpdateTodoRequest { name: "Buy oat milk".into(), due_date: Some("2024-02-01".into()), done: true };

        service.update("alice", &item.todo_id, &update).await.unwrap();
        let stored = service.get("alice", &item.todo_id).await.unwrap();

        assert_eq!(stored.name, "Buy oat milk");
        assert_eq!(stored.due_date.as_deref(), Some("2024-02-01"));
        assert!(stored.done);
        assert_eq!(stored.created_at, item.created_at);
        assert_eq!(stored.attachment_url, item.attachment_url);
    }

    #[tokio::test]
    async fn delete_checks_existence() {
        let (service, repo) = service();
        let item = service.create("alice", buy_milk()).await.unwrap();

        assert!(matches!(
            service.delete("bob", &item.todo_id).await,
            Err(ServiceError::NotFound { .. })
        ));
        service.delete("alice", &item.todo_id).await.unwrap();
        assert!(repo.is_empty().await);
        assert!(matches!(
            service.delete("alice", &item.todo_id).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn upload_url_uses_configured_expiry() {
        let (service, _) = service();
        let url = service.generate_upload_url("t-9").await.unwrap();
        assert!(url.contains("t-9"));
        assert!(url.contains("X-Amz-Expires=300"));
    }
}

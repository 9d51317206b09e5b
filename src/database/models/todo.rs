use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored todo. `(user_id, todo_id)` is the table key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub user_id: String,
    pub todo_id: String,
    pub created_at: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub done: bool,
    pub attachment_url: String,
}

impl TodoItem {
    /// New item for `user_id` with a fresh id, `done = false` and the creation timestamp.
    /// `attachment_url` is derived from the generated id by the caller.
    pub fn new(
        user_id: impl Into<String>,
        request: CreateTodoRequest,
        created_at: DateTime<Utc>,
        attachment_url: impl FnOnce(&str) -> String,
    ) -> Self {
        let todo_id = Uuid::new_v4().to_string();
        let attachment_url = attachment_url(&todo_id);

        Self {
            user_id: user_id.into(),
            todo_id,
            created_at: format_timestamp(created_at),
            name: request.name,
            due_date: request.due_date,
            done: false,
            attachment_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub name: String,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// The mutable fields of an item. All three are written on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub name: String,
    #[serde(default)]
    pub due_date: Option<String>,
    pub done: bool,
}

impl UpdateTodoRequest {
    pub fn apply_to(&self, item: &mut TodoItem) {
        item.name = self.name.clone();
        item.due_date = self.due_date.clone();
        item.done = self.done;
    }
}

/// RFC 3339, UTC, millisecond precision: `2024-01-01T12:00:00.000Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

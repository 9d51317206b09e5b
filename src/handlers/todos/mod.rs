mod create;
mod delete;
mod get;
mod list;
mod update;
mod upload_url;

use serde::Serialize;

use crate::database::models::TodoItem;

// Re-export handler functions for use in routing
pub use create::create;
pub use delete::delete;
pub use get::get;
pub use list::list;
pub use update::update;
pub use upload_url::generate_upload_url;

#[derive(Debug, Serialize)]
pub struct ItemsBody {
    pub items: Vec<TodoItem>,
}

#[derive(Debug, Serialize)]
pub struct ItemBody {
    pub item: TodoItem,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlBody {
    pub upload_url: String,
}

use axum::extract::{Extension, Path, State};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::UploadUrlBody;

/// POST /todos/:todo_id/attachment - presigned PUT URL for the item's attachment
pub async fn generate_upload_url(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(todo_id): Path<String>,
) -> ApiResult<UploadUrlBody> {
    tracing::debug!("Issuing upload URL for todo {} (user {})", todo_id, user.user_id);
    let upload_url = state.todos.generate_upload_url(&todo_id).await?;
    Ok(ApiResponse::ok(UploadUrlBody { upload_url }))
}

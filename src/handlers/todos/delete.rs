use axum::extract::{Extension, Path, State};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// DELETE /todos/:todo_id - 404 when the caller has no such item
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(todo_id): Path<String>,
) -> ApiResult<()> {
    state.todos.delete(&user.user_id, &todo_id).await?;
    Ok(ApiResponse::no_content())
}

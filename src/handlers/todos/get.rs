use axum::extract::{Extension, Path, State};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::ItemBody;

/// GET /todos/:todo_id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(todo_id): Path<String>,
) -> ApiResult<ItemBody> {
    let item = state.todos.get(&user.user_id, &todo_id).await?;
    Ok(ApiResponse::ok(ItemBody { item }))
}

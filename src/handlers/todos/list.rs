use axum::extract::{Extension, State};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::ItemsBody;

/// GET /todos - every item owned by the caller
pub async fn list(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<ItemsBody> {
    let items = state.todos.list(&user.user_id).await?;
    Ok(ApiResponse::ok(ItemsBody { items }))
}

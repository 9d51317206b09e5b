use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    Json,
};

use crate::app::AppState;
use crate::database::models::UpdateTodoRequest;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// PATCH /todos/:todo_id - body `{ name, dueDate, done }`; 404 when the caller has no such item
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(todo_id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(update) = payload?;
    state.todos.update(&user.user_id, &todo_id, &update).await?;
    Ok(ApiResponse::no_content())
}

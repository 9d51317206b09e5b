use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};

use crate::app::AppState;
use crate::database::models::CreateTodoRequest;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::ItemBody;

/// POST /todos - body `{ name, dueDate }`, responds 201 with the stored item
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> ApiResult<ItemBody> {
    let Json(request) = payload?;

    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }

    let item = state.todos.create(&user.user_id, request).await?;
    Ok(ApiResponse::created(ItemBody { item }))
}

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::AuthError;
use crate::error::ApiError;

pub use crate::auth::AuthUser;

/// JWT authentication middleware that verifies the bearer token and injects `AuthUser`
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let verified = {
        let header = request
            .headers()
            .get(AUTHORIZATION)
            .map(|value| value.to_str().map_err(|_| AuthError::MalformedAuthHeader))
            .transpose();

        header.and_then(|header| state.verifier.authenticate(header))
    };

    let auth_user = verified.map_err(|e| {
        tracing::warn!("User not authorized: {}", e);
        ApiError::from(e)
    })?;

    tracing::debug!("User was authorized: {}", auth_user.user_id);
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::app::testing::{mint_token, test_state, UNTRUSTED_PRIVATE};
    use crate::app::router;

    async fn list_status(authorization: Option<String>) -> StatusCode {
        let app = router(test_state(), &["*".to_string()]);
        let mut builder = Request::builder().uri("/todos");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        response.status()
    }

    #[tokio::test]
    async fn valid_token_reaches_handler() {
        let token = mint_token("alice");
        assert_eq!(list_status(Some(format!("Bearer {}", token))).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn auth_failures_are_denied() {
        assert_eq!(list_status(None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(list_status(Some("Basic abc".into())).await, StatusCode::UNAUTHORIZED);

        let forged = crate::app::testing::mint_token_with(UNTRUSTED_PRIVATE, "alice");
        assert_eq!(list_status(Some(format!("Bearer {}", forged))).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn public_routes_skip_auth() {
        let app = router(test_state(), &["*".to_string()]);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::TokenVerifier;
use crate::config::{AppConfig, StoreBackend};
use crate::database::{DynamoTodoConfig, DynamoTodoRepository, MemoryTodoRepository, TodoRepository};
use crate::handlers;
use crate::middleware::jwt_auth_middleware;
use crate::services::TodoService;
use crate::storage::{AttachmentStore, S3AttachmentConfig, S3AttachmentStore, StaticAttachmentStore};

/// Process-wide dependencies, built once at startup and cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub todos: TodoService,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(todos: TodoService, verifier: TokenVerifier) -> Self {
        Self {
            todos,
            verifier: Arc::new(verifier),
        }
    }

    /// Build the verifier and storage clients described by `config`.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let verifier = TokenVerifier::from_config(&config.auth)?;

        let (repository, attachments): (Arc<dyn TodoRepository>, Arc<dyn AttachmentStore>) =
            match config.store.backend {
                StoreBackend::Memory => {
                    tracing::warn!("Using in-memory item store; data is lost on restart");
                    (
                        Arc::new(MemoryTodoRepository::new()),
                        Arc::new(StaticAttachmentStore::new(config.attachments.bucket.clone())),
                    )
                }
                StoreBackend::DynamoDb => {
                    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                        .load()
                        .await;

                    let repository = DynamoTodoRepository::new(
                        &sdk_config,
                        DynamoTodoConfig {
                            table_name: config.store.table_name.clone(),
                            index_name: config.store.index_name.clone(),
                            region: config.region(),
                            endpoint: config.dynamodb_endpoint(),
                        },
                    );
                    let attachments = S3AttachmentStore::new(
                        &sdk_config,
                        S3AttachmentConfig {
                            bucket: config.attachments.bucket.clone(),
                            region: config.store.region.clone(),
                            endpoint: config.attachments.endpoint.clone(),
                        },
                    )?;

                    (Arc::new(repository), Arc::new(attachments))
                }
            };

        let todos = TodoService::new(repository, attachments, config.attachments.url_expiration_secs);
        Ok(Self::new(todos, verifier))
    }
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Protected
        .merge(todo_routes(state.clone()))
        // Global middleware
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn todo_routes(state: AppState) -> Router<AppState> {
    use handlers::todos;

    Router::new()
        .route("/todos", get(todos::list).post(todos::create))
        .route(
            "/todos/:todo_id",
            get(todos::get).patch(todos::update).delete(todos::delete),
        )
        .route("/todos/:todo_id/attachment", post(todos::generate_upload_url))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

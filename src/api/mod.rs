pub mod handlers;

pub use handlers::*;

use crate::service::{QueryService, SessionStore};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;

/// 共享状态：会话存储 + 查询服务
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub query: Arc<QueryService>,
}

impl AppState {
    pub fn new(query: QueryService) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            query: Arc::new(query),
        }
    }
}

/// 构建路由
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/models", get(list_models))
        .route("/api/examples", get(example_questions))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id/settings", put(update_settings))
        .route("/api/sessions/:id/upload", post(upload_files))
        .route("/api/sessions/:id/sample", post(load_sample))
        .route("/api/sessions/:id/summary", get(summary))
        .route("/api/sessions/:id/query", post(query))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(max_upload_bytes)))
}

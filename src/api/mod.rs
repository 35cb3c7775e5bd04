pub mod handlers;

pub use handlers::{health_check, reconcile_documents};

use crate::service::ReconcileService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

/// 构建路由
pub fn router(service: Arc<ReconcileService>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/reconcile", post(reconcile_documents))
        .with_state(service)
        .layer(ServiceBuilder::new())
}

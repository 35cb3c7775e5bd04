use crate::config::MatchingConfig;
use crate::models::{ExtractedDocument, MatchingResult, UnmatchedDocument};
use crate::service::ReconcileService;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 请求体: 工作区文档快照，可选覆盖匹配参数
#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub documents: Vec<ExtractedDocument>,
    #[serde(default)]
    pub config: Option<MatchingConfig>,
}

/// 响应体
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<MatchingResult>,
    pub unmatched: Vec<UnmatchedDocument>,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 对账接口
pub async fn reconcile_documents(
    State(service): State<Arc<ReconcileService>>,
    Json(req): Json<ReconcileRequest>,
) -> Response {
    // 请求自带配置时以其覆盖服务默认配置
    let service = match req.config {
        Some(config) => Arc::new(ReconcileService::new(config)),
        None => service,
    };
    if let Err(e) = service.config().validate() {
        let response = ReconcileResponse {
            success: false,
            message: format!("Error: {}", e),
            results: Vec::new(),
            unmatched: Vec::new(),
        };
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(response)).into_response();
    }

    // 纯CPU计算，放到阻塞线程池避免占用异步工作线程
    let documents = req.documents;
    let outcome = match tokio::task::spawn_blocking(move || service.reconcile(&documents)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Reconcile task failed: {}", e);
            let response = ReconcileResponse {
                success: false,
                message: format!("Error: {}", e),
                results: Vec::new(),
                unmatched: Vec::new(),
            };
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response();
        }
    };

    let discrepancies: usize = outcome.results.iter().map(|r| r.discrepancies.len()).sum();
    let response = ReconcileResponse {
        success: true,
        message: format!(
            "Reconciled {} groups, {} discrepancies, {} unmatched documents",
            outcome.results.len(),
            discrepancies,
            outcome.unmatched.len()
        ),
        results: outcome.results,
        unmatched: outcome.unmatched,
    };
    (StatusCode::OK, Json(response)).into_response()
}

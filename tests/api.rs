use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use doc_reconcile_rust::{api, MatchingConfig, ReconcileService};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    api::router(Arc::new(ReconcileService::new(MatchingConfig::default())))
}

async fn post_reconcile(body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/reconcile")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn workspace() -> Value {
    json!([
        { "document_id": "po-1", "type": "PO", "po_number": "PO-1", "vendor_name": "Acme" },
        { "document_id": "inv-1", "type": "Invoice", "po_number": "PO-1", "vendor_name": "Acme",
          "document_date": "2024-03-15T10:00:00" },
        { "document_id": "dn-9", "type": "DeliveryNote", "po_number": "PO-9" }
    ])
}

#[tokio::test]
async fn health_returns_ok() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn reconcile_reports_groups_and_unmatched() {
    let (status, body) = post_reconcile(json!({ "documents": workspace() })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["results"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["results"][0]["po_document_id"], json!("po-1"));
    assert_eq!(body["results"][0]["matched_by"], json!("po_number"));
    assert_eq!(body["unmatched"][0]["document_id"], json!("dn-9"));
    assert_eq!(body["unmatched"][0]["reason"], json!("no_counterpart"));
}

#[tokio::test]
async fn invalid_config_override_is_rejected() {
    let (status, body) = post_reconcile(json!({
        "documents": workspace(),
        "config": { "vendor_match_threshold": 101 }
    }))
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().is_some_and(|m| m.contains("vendor_match_threshold")));
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["unmatched"], json!([]));
}

#[tokio::test]
async fn config_override_changes_grouping() {
    let documents = json!([
        { "document_id": "po-1", "type": "po", "vendor_name": "Northwind Traders" },
        { "document_id": "inv-1", "type": "invoice", "vendor_name": "Northwnd Traders" }
    ]);

    let (_, default_run) = post_reconcile(json!({ "documents": documents.clone() })).await;
    assert_eq!(default_run["results"].as_array().map(Vec::len), Some(1));

    let (status, strict_run) = post_reconcile(json!({
        "documents": documents,
        "config": { "vendor_match_threshold": 99 }
    }))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(strict_run["results"], json!([]));
    assert_eq!(strict_run["unmatched"].as_array().map(Vec::len), Some(2));
}

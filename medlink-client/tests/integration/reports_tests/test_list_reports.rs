use super::{TEST_TOKEN, spawn_service};
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use medlink_client::{ReportsClient, ReportsError, TOKEN_HEADER, Uploader};
use serde_json::{Value, json};

async fn get_reports(Path(id): Path<String>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) != Some(TEST_TOKEN) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Not Authorized"})),
        );
    }
    if id == "apt-missing" {
        return (
            StatusCode::OK,
            Json(json!({"success": false, "message": "Appointment not found"})),
        );
    }
    let body = json!({
        "success": true,
        "reports": [
            {"url": "/uploads/r1.pdf", "uploadedBy": "patient", "uploadedAt": "2024-03-01T10:00:00Z"},
            {"url": "/uploads/r2.pdf", "uploadedBy": "doctor", "uploadedAt": "2024-03-01T10:05:00.123Z"}
        ]
    });
    (StatusCode::OK, Json(body))
}

fn service() -> Router {
    Router::new().route("/api/user/get-reports/{id}", get(get_reports))
}

#[tokio::test]
async fn test_list_returns_reports_in_order() -> anyhow::Result<()> {
    let addr = spawn_service(service()).await?;
    let client = ReportsClient::new(format!("http://{addr}"), TEST_TOKEN)?;

    let reports = client.list("apt-42").await?;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].url, "/uploads/r1.pdf");
    assert_eq!(reports[0].uploaded_by, Uploader::Patient);
    assert_eq!(reports[1].uploaded_by, Uploader::Doctor);
    assert!(reports[0].uploaded_at < reports[1].uploaded_at);
    Ok(())
}

#[tokio::test]
async fn test_list_with_bad_token_is_unauthorized() -> anyhow::Result<()> {
    let addr = spawn_service(service()).await?;
    let client = ReportsClient::new(format!("http://{addr}"), "stale")?;

    let err = client.list("apt-42").await.unwrap_err();
    assert!(matches!(err, ReportsError::Unauthorized));
    Ok(())
}

#[tokio::test]
async fn test_list_refusal_carries_message() -> anyhow::Result<()> {
    let addr = spawn_service(service()).await?;
    let client = ReportsClient::new(format!("http://{addr}/"), TEST_TOKEN)?;

    let err = client.list("apt-missing").await.unwrap_err();
    assert!(matches!(err, ReportsError::Rejected(ref m) if m == "Appointment not found"));
    Ok(())
}

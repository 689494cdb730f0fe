use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use postbox_core::models::{ContactSubmission, ListResponse, SubmitResponse};
use postbox_core::store::{JsonFileStore, SubmissionStore};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    store: Arc<dyn SubmissionStore>,
}

impl AppState {
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let store = Arc::new(JsonFileStore::new(config.store_path.clone()));
        Self::new(config, store)
    }

    pub fn new(config: Arc<AppConfig>, store: Arc<dyn SubmissionStore>) -> Self {
        Self { config, store }
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/contact", get(list_contacts).post(submit_contact))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

async fn submit_contact(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SubmitResponse>, AppError> {
    let payload = parse_payload(&body)?;
    let record = payload.received(Utc::now());
    let id = record.id.clone();

    tracing::info!(
        id = %record.id_label(),
        received_at = record.received_at().unwrap_or_default(),
        "New contact message received"
    );
    state.store.append(record).await.map_err(AppError::Save)?;

    Ok(Json(SubmitResponse::saved(id)))
}

async fn list_contacts(State(state): State<AppState>) -> Result<Json<ListResponse>, AppError> {
    let messages = state.store.list().await.map_err(AppError::Read)?;
    Ok(Json(ListResponse::new(messages)))
}

/// An empty body is an empty submission. Anything else must be a JSON object,
/// which is kept as sent whatever its keys and value types.
fn parse_payload(body: &[u8]) -> Result<ContactSubmission, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ContactSubmission::default());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|error| AppError::invalid_payload(error.to_string()))?;
    if !value.is_object() {
        return Err(AppError::invalid_payload("expected a JSON object"));
    }
    serde_json::from_value(value).map_err(|error| AppError::invalid_payload(error.to_string()))
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::path::Path;
    use std::time::Duration;

    use chrono::DateTime;
    use postbox_core::client::{sync_pending, Delivery, FormController, LocalCache};
    use postbox_core::collector::CollectorClient;
    use postbox_core::ContactForm;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    async fn serve_on(listener: tokio::net::TcpListener, store_path: &Path) {
        let config = Arc::new(AppConfig {
            bind_addr: listener.local_addr().unwrap().to_string(),
            store_path: store_path.to_path_buf(),
        });
        let router = app_router(AppState::from_config(config));
        tokio::spawn(async move { axum::serve(listener, router).await.expect("serve app") });
    }

    async fn spawn_app(store_path: &Path) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        serve_on(listener, store_path).await;
        addr
    }

    async fn post_json(addr: SocketAddr, body: &Value) -> (u16, Value) {
        let response = reqwest::Client::new()
            .post(format!("http://{addr}/api/contact"))
            .json(body)
            .send()
            .await
            .expect("post contact");
        let status = response.status().as_u16();
        (status, response.json().await.expect("json body"))
    }

    async fn get_list(addr: SocketAddr) -> (u16, Value) {
        let response = reqwest::get(format!("http://{addr}/api/contact"))
            .await
            .expect("get contacts");
        let status = response.status().as_u16();
        (status, response.json().await.expect("json body"))
    }

    fn reference_payload() -> Value {
        json!({
            "name": "A",
            "email": "a@x.com",
            "subject": "S",
            "message": "M",
            "id": "1700000000000",
            "timestamp": "2023-11-14T22:13:20.000Z"
        })
    }

    #[tokio::test]
    async fn submit_then_list_returns_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let addr = spawn_app(&dir.path().join("contact-messages.json")).await;
        let before = Utc::now().timestamp_millis();

        let (status, body) = post_json(addr, &reference_payload()).await;
        assert_eq!(status, 200);
        assert_eq!(
            body,
            json!({
                "success": true,
                "message": "Message saved successfully",
                "id": "1700000000000"
            })
        );

        let (status, body) = get_list(addr).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["id"], "1700000000000");
        assert_eq!(messages[0]["timestamp"], "2023-11-14T22:13:20.000Z");

        let received_at =
            DateTime::parse_from_rfc3339(messages[0]["receivedAt"].as_str().unwrap()).unwrap();
        assert!(received_at.timestamp_millis() >= before);
    }

    #[tokio::test]
    async fn duplicate_submissions_are_both_kept() {
        let dir = tempfile::tempdir().unwrap();
        let addr = spawn_app(&dir.path().join("contact-messages.json")).await;

        post_json(addr, &reference_payload()).await;
        post_json(addr, &reference_payload()).await;

        let (_, body) = get_list(addr).await;
        let ids = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|message| message["id"].clone())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![json!("1700000000000"), json!("1700000000000")]);
    }

    #[tokio::test]
    async fn missing_store_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("contact-messages.json");
        let addr = spawn_app(&store_path).await;

        let (status, body) = get_list(addr).await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({ "success": true, "messages": [] }));
        assert!(!store_path.exists());
    }

    #[tokio::test]
    async fn corrupt_store_fails_both_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("contact-messages.json");
        std::fs::write(&store_path, "this is not json").unwrap();
        let addr = spawn_app(&store_path).await;

        let (status, body) = get_list(addr).await;
        assert_eq!(status, 500);
        assert_eq!(
            body,
            json!({ "success": false, "message": "Failed to read messages" })
        );

        let (status, body) = post_json(addr, &reference_payload()).await;
        assert_eq!(status, 500);
        assert_eq!(
            body,
            json!({ "success": false, "message": "Failed to save message" })
        );
        assert_eq!(
            std::fs::read_to_string(&store_path).unwrap(),
            "this is not json"
        );
    }

    #[tokio::test]
    async fn partial_payload_is_persisted_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let addr = spawn_app(&dir.path().join("contact-messages.json")).await;

        let (status, body) = post_json(addr, &json!({ "name": "No id" })).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
        assert!(body.get("id").is_none());

        let (_, body) = get_list(addr).await;
        let message = body["messages"][0].as_object().unwrap();
        let mut keys = message.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        assert_eq!(keys, vec!["name".to_string(), "receivedAt".to_string()]);
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("contact-messages.json");
        let addr = spawn_app(&store_path).await;

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/api/contact"))
            .header("Content-Type", "application/json")
            .body("{\"name\": ")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(!store_path.exists());
    }

    #[tokio::test]
    async fn non_string_fields_are_stored_as_sent() {
        let dir = tempfile::tempdir().unwrap();
        let addr = spawn_app(&dir.path().join("contact-messages.json")).await;
        let payload = json!({
            "id": 1_700_000_000_000_u64,
            "name": "A",
            "subject": null,
            "tags": ["hire", "rust"]
        });

        let (status, body) = post_json(addr, &payload).await;
        assert_eq!(status, 200);
        assert_eq!(body["id"], json!(1_700_000_000_000_u64));

        let (status, body) = get_list(addr).await;
        assert_eq!(status, 200);
        let mut stored = body["messages"][0].clone();
        assert!(stored["receivedAt"].is_string());
        stored.as_object_mut().unwrap().remove("receivedAt");
        assert_eq!(stored, payload);
    }

    #[tokio::test]
    async fn hand_edited_store_is_listed_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("contact-messages.json");
        let stored = json!([
            {"id": "1", "name": "A", "phone": "555"},
            {"id": 2}
        ]);
        std::fs::write(&store_path, serde_json::to_string_pretty(&stored).unwrap()).unwrap();
        let addr = spawn_app(&store_path).await;

        let (status, body) = get_list(addr).await;
        assert_eq!(status, 200);
        assert_eq!(body["messages"], stored);

        let (status, _) = post_json(addr, &reference_payload()).await;
        assert_eq!(status, 200);
        let (_, body) = get_list(addr).await;
        assert_eq!(body["messages"][0], stored[0]);
        assert_eq!(body["messages"][1], stored[1]);
        assert_eq!(body["messages"][2]["id"], "1700000000000");
    }

    #[tokio::test]
    async fn empty_body_is_stored_as_an_empty_submission() {
        let dir = tempfile::tempdir().unwrap();
        let addr = spawn_app(&dir.path().join("contact-messages.json")).await;

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/api/contact"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(
            body,
            json!({ "success": true, "message": "Message saved successfully" })
        );

        let (_, body) = get_list(addr).await;
        let message = body["messages"][0].as_object().unwrap();
        assert_eq!(message.keys().collect::<Vec<_>>(), vec!["receivedAt"]);
    }

    #[tokio::test]
    async fn non_object_body_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("contact-messages.json");
        let addr = spawn_app(&store_path).await;

        let (status, body) = post_json(addr, &json!(["not", "an", "object"])).await;
        assert_eq!(status, 400);
        assert_eq!(
            body,
            json!({ "success": false, "message": "Invalid contact payload" })
        );
        assert!(!store_path.exists());
    }

    #[tokio::test]
    async fn concurrent_submissions_are_all_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let addr = spawn_app(&dir.path().join("contact-messages.json")).await;

        let tasks = (0..12)
            .map(|index| {
                tokio::spawn(async move {
                    post_json(addr, &json!({ "id": format!("id-{index}"), "name": "racer" })).await
                })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            let (status, _) = task.await.unwrap();
            assert_eq!(status, 200);
        }

        let (_, body) = get_list(addr).await;
        let mut ids = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|message| message["id"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        ids.sort();
        let mut expected = (0..12).map(|index| format!("id-{index}")).collect::<Vec<_>>();
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let dir = tempfile::tempdir().unwrap();
        let addr = spawn_app(&dir.path().join("contact-messages.json")).await;

        let body: Value = reqwest::get(format!("http://{addr}/healthz"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn form_controller_delivers_to_running_collector() {
        let server_dir = tempfile::tempdir().unwrap();
        let client_dir = tempfile::tempdir().unwrap();
        let addr = spawn_app(&server_dir.path().join("contact-messages.json")).await;

        let collector = CollectorClient::new(format!("http://{addr}"), Duration::from_secs(5)).unwrap();
        let cache = Arc::new(LocalCache::new(client_dir.path()));
        let mut controller = FormController::new(
            Arc::clone(&cache),
            Arc::new(collector.clone()),
            Duration::from_secs(5),
            Duration::from_secs(3),
        );
        controller.set_form(ContactForm::new("A", "a@x.com", "S", "M"));

        let receipt = controller.submit().await.unwrap();
        assert_eq!(receipt.delivery, Delivery::Acknowledged);
        assert!(cache.pending().await.unwrap().is_empty());

        let remote = collector.list().await.unwrap();
        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0].id, receipt.submission.id);
        assert!(remote[0].received_at.is_some());
        assert!(cache.history().await.unwrap()[0].received_at.is_none());
    }

    #[tokio::test]
    async fn queued_submission_is_delivered_once_collector_starts() {
        let server_dir = tempfile::tempdir().unwrap();
        let client_dir = tempfile::tempdir().unwrap();

        let spare = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = spare.local_addr().unwrap();
        drop(spare);

        let collector = CollectorClient::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();
        let cache = Arc::new(LocalCache::new(client_dir.path()));
        let mut controller = FormController::new(
            Arc::clone(&cache),
            Arc::new(collector.clone()),
            Duration::from_secs(2),
            Duration::from_secs(3),
        );
        controller.set_form(ContactForm::new("A", "a@x.com", "S", "M"));

        let receipt = controller.submit().await.unwrap();
        assert!(matches!(receipt.delivery, Delivery::Queued { .. }));
        assert_eq!(cache.pending().await.unwrap().len(), 1);

        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        serve_on(listener, &server_dir.path().join("contact-messages.json")).await;

        let report = sync_pending(&cache, &collector, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.remaining, 0);

        let remote = collector.list().await.unwrap();
        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0].id, receipt.submission.id);
    }
}

//! Client behaviour against a mock API server

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use campus_http::{ApiClient, ApiConfig, ApiError, TokenSource, UnauthorizedHandler};
use campus_storage::{MemoryStore, PersistedStore, TOKEN_EXPIRES_KEY, TOKEN_KEY, USER_KEY};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct CountingHandler {
    calls: AtomicUsize,
}

impl UnauthorizedHandler for CountingHandler {
    fn on_unauthorized(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

struct FixedToken(Option<&'static str>);

impl TokenSource for FixedToken {
    fn token(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

fn client_for(server: &MockServer, store: &MemoryStore) -> ApiClient {
    let config = ApiConfig::new(&format!("{}/api", server.uri())).unwrap();
    ApiClient::new(config, Arc::new(store.clone())).unwrap()
}

fn seed_session(store: &MemoryStore) {
    store.set(TOKEN_KEY, "abc").unwrap();
    store.set(USER_KEY, r#"{"id":1,"role":"teacher"}"#).unwrap();
    store.set(TOKEN_EXPIRES_KEY, "2030-01-01T00:00:00Z").unwrap();
}

#[tokio::test]
async fn test_attaches_bearer_and_default_headers() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    seed_session(&store);

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .and(header("Authorization", "Bearer abc"))
        .and(header("Accept", "application/json"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &store);
    let body: Value = client.get("/user").await.unwrap();
    assert_eq!(body["id"], 1);
}

#[tokio::test]
async fn test_missing_token_sends_unauthenticated_request() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();

    // Mounted first so it wins if the header is present
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"email": "a@b.c", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &store);
    let body: Value = client
        .post("/login", &json!({"email": "a@b.c", "password": "pw"}))
        .await
        .unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_unauthorized_clears_store_and_notifies_handler() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    seed_session(&store);
    store.set("theme", "dark").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/schools"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthenticated."})))
        .mount(&server)
        .await;

    let client = client_for(&server, &store);
    let handler = Arc::new(CountingHandler::default());
    client.set_unauthorized_handler(handler.clone());

    let result: Result<Value, ApiError> = client.get("/schools").await;
    match result {
        Err(ApiError::Unauthorized { message }) => {
            assert_eq!(message.as_deref(), Some("Unauthenticated."))
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);

    assert!(store.get(TOKEN_KEY).unwrap().is_none());
    assert!(store.get(USER_KEY).unwrap().is_none());
    assert!(store.get(TOKEN_EXPIRES_KEY).unwrap().is_none());
    // Unrelated entries are left alone
    assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
}

#[tokio::test]
async fn test_error_status_carries_server_message() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, &store);
    let handler = Arc::new(CountingHandler::default());
    client.set_unauthorized_handler(handler.clone());

    let err = client
        .post::<_, Value>("/login", &json!({"email": "x", "password": "y"}))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert_eq!(err.server_message(), Some("Invalid credentials"));
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_body_decodes_as_unit() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    seed_session(&store);

    Mock::given(method("DELETE"))
        .and(path("/api/schools/4"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &store);
    client.delete::<()>("/schools/4").await.unwrap();
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();

    Mock::given(method("GET"))
        .and(path("/api/dashboard"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(json!({"success": true})),
        )
        .mount(&server)
        .await;

    let config = ApiConfig::new(&format!("{}/api", server.uri()))
        .unwrap()
        .with_timeout(Duration::from_millis(200));
    let client = ApiClient::new(config, Arc::new(store)).unwrap();

    let result: Result<Value, ApiError> = client.get("/dashboard").await;
    assert!(matches!(result, Err(ApiError::Timeout)));
}

#[tokio::test]
async fn test_token_source_takes_precedence_over_store() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    seed_session(&store);

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .and(header("Authorization", "Bearer live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &store);
    client.set_token_source(Arc::new(FixedToken(Some("live"))));

    let _: Value = client.get("/user").await.unwrap();
}

#[tokio::test]
async fn test_token_source_without_token_falls_back_to_store() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    seed_session(&store);

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &store);
    client.set_token_source(Arc::new(FixedToken(None)));

    let _: Value = client.get("/user").await.unwrap();
}

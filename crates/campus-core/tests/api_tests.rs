//! Dashboard and school endpoints through a full console

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use campus_core::{
    filter_schools, Access, ApiError, AuthState, Config, Console, CoreError, DashboardSection,
    Navigator, SchoolDraft,
};

#[derive(Default)]
struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.visits.lock().push(path.to_string());
    }
}

struct Harness {
    server: MockServer,
    navigator: Arc<RecordingNavigator>,
    console: Console,
    _data_dir: TempDir,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();

    let mut config = Config::new(data_dir.path().to_path_buf());
    config.api_url = format!("{}/api", server.uri());

    let navigator = Arc::new(RecordingNavigator::default());
    let console = Console::new(config, navigator.clone()).unwrap();

    Harness {
        server,
        navigator,
        console,
        _data_dir: data_dir,
    }
}

async fn sign_in(h: &Harness, role: &str) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": 1, "name": "Root", "email": "root@campus.test", "role": role},
            "token": "tok-admin",
            "expires_at": "2999-01-01T00:00:00Z"
        })))
        .mount(&h.server)
        .await;

    h.console.login("root@campus.test", "secret").await.unwrap();
}

#[tokio::test]
async fn test_session_survives_reopen() {
    let h = harness().await;
    sign_in(&h, "super_admin").await;
    assert_eq!(h.console.resolve("/dashboard"), Access::Redirect("/Super_Admin".to_string()));

    // Second console over the same database file
    let reopened = Console::new(h.console.config().clone(), Arc::new(RecordingNavigator::default()))
        .unwrap();
    assert_eq!(reopened.initialize().await.unwrap(), AuthState::Authenticated);
    assert_eq!(reopened.landing_path(), "/Super_Admin");

    reopened.logout().await;
    let third = Console::new(h.console.config().clone(), Arc::new(RecordingNavigator::default()))
        .unwrap();
    assert_eq!(third.initialize().await.unwrap(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_dashboard_envelope() {
    let h = harness().await;
    sign_in(&h, "super_admin").await;

    Mock::given(method("GET"))
        .and(path("/api/dashboard"))
        .and(header("Authorization", "Bearer tok-admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "overview": {"total_schools": 5, "total_users": "120"},
                "activities": [{"type": "login"}]
            }
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let data = h.console.dashboard().dashboard().await.unwrap();

    let overview = data.overview.clone().unwrap();
    assert_eq!(overview.total_schools, 5);
    assert_eq!(overview.total_users, 120);
    assert!(data.section("activities").unwrap().is_array());
}

#[tokio::test]
async fn test_dashboard_sections_and_failures() {
    let h = harness().await;
    sign_in(&h, "super_admin").await;

    Mock::given(method("GET"))
        .and(path("/api/dashboard/system-health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"database": "ok"}
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/overview"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Statistics unavailable"
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/table/students"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&h.server)
        .await;

    let health = h
        .console
        .dashboard()
        .section(DashboardSection::SystemHealth)
        .await
        .unwrap();
    assert_eq!(health["database"], "ok");

    let err = h.console.dashboard().overview().await.unwrap_err();
    assert!(matches!(err, CoreError::Dashboard(ref m) if m == "Statistics unavailable"));

    let err = h.console.dashboard().table_status("students").await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to load dashboard data");

    let err = h.console.dashboard().table_status("../users").await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_expired_token_on_dashboard_ends_session() {
    let h = harness().await;
    sign_in(&h, "school_admin").await;

    Mock::given(method("GET"))
        .and(path("/api/dashboard"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthenticated."})))
        .mount(&h.server)
        .await;

    let err = h.console.dashboard().dashboard().await.unwrap_err();

    assert!(matches!(err, CoreError::Api(ApiError::Unauthorized { .. })));
    assert_eq!(h.console.session().state(), AuthState::Unauthenticated);
    assert!(matches!(h.console.resolve("/dashboard"), Access::Login { .. }));
    assert_eq!(*h.navigator.visits.lock(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn test_school_crud() {
    let h = harness().await;
    sign_in(&h, "super_admin").await;

    Mock::given(method("GET"))
        .and(path("/api/schools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 1, "name": "Greenwood High School", "address": "12 Oak Street", "phone": "555-0101", "is_active": 1},
                {"id": 2, "name": "Riverside Academy", "address": "4 Quai Est", "phone": "555-0202", "is_active": 0}
            ]
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/schools"))
        .and(body_json(json!({"name": "Sunshine Elementary", "phone": "555-0303"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 3, "name": "Sunshine Elementary", "phone": "555-0303", "is_active": true
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/schools/2"))
        .and(body_json(json!({"is_active": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": 2, "name": "Riverside Academy", "is_active": true}
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/schools/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;

    let schools = h.console.schools().list().await.unwrap();
    assert_eq!(schools.len(), 2);
    assert!(schools[0].is_active);
    assert!(!schools[1].is_active);
    assert_eq!(filter_schools(&schools, "QUAI").len(), 1);

    let created = h
        .console
        .schools()
        .create(&SchoolDraft {
            name: Some("Sunshine Elementary".to_string()),
            phone: Some("555-0303".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.id, 3);

    let updated = h
        .console
        .schools()
        .update(
            2,
            &SchoolDraft {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.is_active);

    h.console.schools().delete(1).await.unwrap();

    let err = h
        .console
        .schools()
        .create(&SchoolDraft::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_school_validation_error_carries_message() {
    let h = harness().await;
    sign_in(&h, "super_admin").await;

    Mock::given(method("POST"))
        .and(path("/api/schools"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "The name has already been taken."})),
        )
        .mount(&h.server)
        .await;

    let err = h
        .console
        .schools()
        .create(&SchoolDraft {
            name: Some("Greenwood High School".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();

    match err {
        CoreError::Api(api) => {
            assert_eq!(api.status(), Some(422));
            assert_eq!(api.server_message(), Some("The name has already been taken."));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(h.console.session().is_authenticated());
}

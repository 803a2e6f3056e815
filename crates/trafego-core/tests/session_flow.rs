//! Login, dashboard and session expiry wired together against a mock backend.

use std::time::Duration;

use serde_json::json;
use tempfile::tempdir;
use trafego_core::api::{ApiClient, ApiError, UserProfile};
use trafego_core::dashboard::{DashboardController, DashboardEffect, DashboardStats, Phase};
use trafego_core::gate::{Route, SessionGate};
use trafego_core::session::{
    FileStorage, MemoryStorage, SessionStorage, SessionStore, TOKEN_KEY, USER_KEY,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn profile() -> UserProfile {
    UserProfile {
        name: "Ana Souza".to_string(),
        role: "admin".to_string(),
        email: None,
    }
}

fn logged_in_gate(token: &str) -> SessionGate<MemoryStorage> {
    let mut store = SessionStore::new(MemoryStorage::new());
    store.save(token, &profile()).unwrap();
    SessionGate::new(store)
}

#[tokio::test]
async fn test_failed_profile_fetch_leaves_no_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "T"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "db down"})))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let mut gate = SessionGate::new(SessionStore::new(FileStorage::new(&session_path)));
    let base = ApiClient::new(server.uri(), None).unwrap();

    let err = gate.login(&base, "ana", "pw").await.unwrap_err();
    let api_error = err.downcast_ref::<ApiError>().unwrap();
    assert_eq!(api_error.status, Some(500));

    assert_eq!(gate.route(), Route::Login);
    assert!(gate.session().token().is_none());
    assert!(gate.session().user().is_none());

    let storage = FileStorage::new(&session_path);
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get(USER_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_login_persists_session_for_next_start() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "T"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer T"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"full_name": "Ana Souza", "role": "admin"})),
        )
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let base = ApiClient::new(server.uri(), None).unwrap();

    let mut gate = SessionGate::new(SessionStore::new(FileStorage::new(&session_path)));
    gate.login(&base, "ana", "pw").await.unwrap();
    assert_eq!(gate.route(), Route::Dashboard);

    let restarted = SessionGate::new(SessionStore::new(FileStorage::new(&session_path)));
    assert_eq!(restarted.route(), Route::Dashboard);
    assert_eq!(restarted.session().token(), Some("T"));
    assert_eq!(restarted.session().user(), Some(&profile()));
}

#[tokio::test]
async fn test_authentication_error_on_dashboard_routes_to_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/campaigns/"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut gate = logged_in_gate("stale");
    assert_eq!(gate.route(), Route::Dashboard);

    let base = ApiClient::new(server.uri(), None).unwrap();
    let controller = DashboardController::new(gate.client(&base));

    let effects = controller.activate().await;
    for effect in effects {
        if let DashboardEffect::SessionExpired(error) = effect {
            assert!(gate.observe(&error).unwrap());
            controller.deactivate();
        }
    }

    assert_eq!(gate.route(), Route::Login);
    assert!(gate.session().token().is_none());
    assert_eq!(controller.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_null_body_yields_empty_ready_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/campaigns/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let gate = logged_in_gate("tok");
    let base = ApiClient::new(server.uri(), None).unwrap();
    let controller = DashboardController::new(gate.client(&base));

    assert!(controller.activate().await.is_empty());
    let view = controller.view();
    assert_eq!(view.phase, Phase::Ready);
    assert!(view.campaigns.is_empty());
    assert_eq!(view.stats, DashboardStats::default());
}

#[tokio::test]
async fn test_refresh_during_fetch_makes_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/campaigns/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 1, "status": "active", "budget_amount": 10.0}]))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gate = logged_in_gate("tok");
    let base = ApiClient::new(server.uri(), None).unwrap();
    let controller = DashboardController::new(gate.client(&base));

    let refresh_later = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.refresh().await
    };
    let (first, second) = tokio::join!(controller.activate(), refresh_later);

    assert!(first.is_empty());
    assert!(second.is_empty());
    assert_eq!(controller.view().stats.active, 1);
    server.verify().await;
}

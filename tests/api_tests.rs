use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use parking_tracker::config::EnvironmentConfig;
use parking_tracker::models::UserRole;
use parking_tracker::repositories::MemoryStore;
use parking_tracker::utils::ManualClock;
use parking_tracker::{create_app, AppState};

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
}

fn test_config() -> EnvironmentConfig {
    EnvironmentConfig {
        environment: "test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        database: None,
        jwt_secret: "api-test-secret".to_string(),
        jwt_expiration: 3600,
        cors_origins: vec![],
        parking_spot_count: 5,
        admin_username: "admin".to_string(),
        admin_password: "admin123".to_string(),
        bcrypt_cost: 4,
    }
}

async fn create_test_app() -> TestApp {
    create_test_app_with(test_config()).await
}

async fn create_test_app_with(config: EnvironmentConfig) -> TestApp {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
    ));
    let state = AppState::new(Arc::new(MemoryStore::new()), config, clock.clone());

    state.parking_service().provision_spots(5).await.unwrap();
    let auth = state.auth_service();
    auth.ensure_default_admin("admin", "admin123").await.unwrap();
    auth.create_user("gate1", "gate-pass", UserRole::Attendant)
        .await
        .unwrap();

    TestApp {
        router: create_app(state),
        clock,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn enter(&self, token: &str, plate: &str, spot: i32) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/vehicles",
            Some(token),
            Some(json!({ "license_plate": plate, "spot_number": spot })),
        )
        .await
    }

    async fn exit(&self, token: &str, plate: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/vehicles/exit",
            Some(token),
            Some(json!({ "license_plate": plate })),
        )
        .await
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;
    let (status, body) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_login_returns_bearer_token_and_user() {
    let app = create_test_app().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "admin", "password": "admin123" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = create_test_app().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "gate1", "password": "nope" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = create_test_app().await;

    let (status, _) = app.send(Method::GET, "/api/sessions/active", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::GET, "/api/sessions/active", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_entry_then_exit_bills_started_hours() {
    let app = create_test_app().await;
    let token = app.login("gate1", "gate-pass").await;

    let (status, entry) = app.enter(&token, " ab-123 ", 2).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["message"], "Vehicle entry recorded");
    assert_eq!(entry["entry_time"], "2024-06-01T10:00:00Z");

    let (_, active) = app.send(Method::GET, "/api/sessions/active", Some(&token), None).await;
    assert_eq!(active.as_array().unwrap().len(), 1);
    assert_eq!(active[0]["license_plate"], "AB-123");
    assert_eq!(active[0]["vehicle_type"], "car");
    assert!(active[0]["total_fee"].is_null());

    app.clock.advance(Duration::minutes(90));
    let (status, exit) = app.exit(&token, "AB-123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(exit["total_fee"], json!(40.0));
    assert_eq!(exit["spot_number"], 2);
    assert_eq!(exit["session_id"], entry["session_id"]);
    assert_eq!(exit["exit_time"], "2024-06-01T11:30:00Z");

    let (_, spots) = app.send(Method::GET, "/api/spots", Some(&token), None).await;
    assert_eq!(spots[1]["spot_number"], 2);
    assert_eq!(spots[1]["is_occupied"], false);

    let (status, _) = app.exit(&token, "AB-123").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_entry_validation_errors() {
    let app = create_test_app().await;
    let token = app.login("gate1", "gate-pass").await;

    let (status, _) = app.enter(&token, "AAA", 1).await;
    assert_eq!(status, StatusCode::OK);

    // plaza ocupada
    let (status, body) = app.enter(&token, "BBB", 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CONFLICT");

    // plaza inexistente
    let (status, _) = app.enter(&token, "BBB", 99).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // sin matrícula
    let (status, _) = app
        .send(
            Method::POST,
            "/api/vehicles",
            Some(&token),
            Some(json!({ "license_plate": "  ", "spot_number": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // sin plaza
    let (status, _) = app
        .send(
            Method::POST,
            "/api/vehicles",
            Some(&token),
            Some(json!({ "license_plate": "CCC" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, active) = app.send(Method::GET, "/api/sessions/active", Some(&token), None).await;
    assert_eq!(active.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = create_test_app().await;
    let token = app.login("gate1", "gate-pass").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/vehicles")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reports_are_admin_only() {
    let app = create_test_app().await;
    let attendant = app.login("gate1", "gate-pass").await;
    let admin = app.login("admin", "admin123").await;

    app.enter(&attendant, "AAA", 1).await;
    app.clock.advance(Duration::minutes(30));
    app.exit(&attendant, "AAA").await;
    app.enter(&attendant, "BBB", 2).await;

    let (status, _) = app.send(Method::GET, "/api/reports", Some(&attendant), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, report) = app
        .send(
            Method::GET,
            "/api/reports?start_date=2024-06-01&end_date=2024-06-01",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_earnings"], json!(20.0));
    assert_eq!(report["sessions"].as_array().unwrap().len(), 2);

    let (status, _) = app
        .send(Method::GET, "/api/reports?start_date=01-06-2024", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_creates_users() {
    let app = create_test_app().await;
    let attendant = app.login("gate1", "gate-pass").await;
    let admin = app.login("admin", "admin123").await;
    let new_user = json!({ "username": "gate2", "password": "another-pass" });

    let (status, _) = app
        .send(Method::POST, "/api/users", Some(&attendant), Some(new_user.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::POST, "/api/users", Some(&admin), Some(new_user.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "attendant");

    let (status, _) = app
        .send(Method::POST, "/api/users", Some(&admin), Some(new_user))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.login("gate2", "another-pass").await;
}

#[tokio::test]
async fn test_logout_revokes_only_that_token() {
    let app = create_test_app().await;
    let first = app.login("gate1", "gate-pass").await;
    let second = app.login("gate1", "gate-pass").await;

    let (status, me) = app.send(Method::GET, "/api/auth/me", Some(&first), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "gate1");

    let (status, _) = app.send(Method::POST, "/api/auth/logout", Some(&first), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::GET, "/api/auth/me", Some(&first), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::GET, "/api/auth/me", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logged_out_token_stays_rejected_after_expiry() {
    let app = create_test_app_with(EnvironmentConfig {
        jwt_expiration: 2,
        ..test_config()
    })
    .await;
    let logged_out = app.login("gate1", "gate-pass").await;
    let untouched = app.login("gate1", "gate-pass").await;

    let (status, _) = app.send(Method::POST, "/api/auth/logout", Some(&logged_out), None).await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(std::time::Duration::from_millis(3500)).await;

    // expirado sin logout: ya no autentica
    let (status, _) = app.send(Method::GET, "/api/auth/me", Some(&untouched), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // un logout posterior purga la lista de revocados
    let fresh = app.login("gate1", "gate-pass").await;
    let (status, _) = app.send(Method::POST, "/api/auth/logout", Some(&fresh), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::GET, "/api/auth/me", Some(&logged_out), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_entry_accepts_spot_number_sent_as_text() {
    let app = create_test_app().await;
    let token = app.login("gate1", "gate-pass").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/vehicles",
            Some(&token),
            Some(json!({ "license_plate": "AB-1", "vehicle_type": "bike", "spot_number": "2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, spots) = app.send(Method::GET, "/api/spots", Some(&token), None).await;
    assert_eq!(spots[1]["is_occupied"], true);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/vehicles",
            Some(&token),
            Some(json!({ "license_plate": "AB-2", "spot_number": "two" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // campo vacío del formulario: falta la plaza
    let (status, _) = app
        .send(
            Method::POST,
            "/api/vehicles",
            Some(&token),
            Some(json!({ "license_plate": "AB-2", "spot_number": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_tracks_occupancy() {
    let app = create_test_app().await;
    let token = app.login("gate1", "gate-pass").await;

    app.enter(&token, "AAA", 1).await;
    app.enter(&token, "BBB", 2).await;
    app.exit(&token, "AAA").await;

    let (status, body) = app.send(Method::GET, "/api/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "gate1");
    assert_eq!(body["role"], "attendant");
    assert_eq!(body["total_spots"], 5);
    assert_eq!(body["occupied_spots"], 1);
    assert_eq!(body["free_spots"], 4);
    assert_eq!(body["active_sessions"], 1);
}

#[tokio::test]
async fn test_search_sessions() {
    let app = create_test_app().await;
    let token = app.login("gate1", "gate-pass").await;

    let (_, first) = app.enter(&token, "AAA", 1).await;
    app.clock.advance(Duration::minutes(5));
    app.enter(&token, "BBB", 2).await;

    let (status, found) = app
        .send(Method::GET, "/api/sessions/search?license_plate=aaa", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["id"], first["session_id"]);

    let (_, all) = app.send(Method::GET, "/api/sessions/search", Some(&token), None).await;
    assert_eq!(all[0]["license_plate"], "BBB");
    assert_eq!(all[1]["license_plate"], "AAA");

    let (status, none) = app
        .send(Method::GET, "/api/sessions/search?parking_id=abc", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = create_test_app().await;
    let (status, _) = app.send(Method::GET, "/api/nothing-here", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//! Router tests that need no database.
//!
//! Authentication and role gating reject before any repository call, and
//! scalar validation rejects before any durable side effect, so these paths
//! are exercised end-to-end through the real router with a disconnected
//! database handle.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tower::ServiceExt;
use tresorerie_api::{create_router, AppState};
use tresorerie_core::events::EventHub;
use tresorerie_core::fiscal::FiscalYearResolver;
use tresorerie_core::storage::FileStore;
use tresorerie_shared::auth::Role;
use tresorerie_shared::config::JwtConfig;
use tresorerie_shared::JwtService;
use uuid::Uuid;

fn test_app() -> (Router, Arc<JwtService>) {
    let jwt = Arc::new(JwtService::new(JwtConfig {
        secret: "router-test-secret".to_string(),
        token_expiry_minutes: 60,
    }));
    let dir = std::env::temp_dir().join(format!("tresorerie-api-test-{}", Uuid::new_v4()));
    let state = AppState {
        db: DatabaseConnection::default(),
        jwt: jwt.clone(),
        files: FileStore::new_fs(dir.to_str().unwrap()).unwrap(),
        events: Arc::new(EventHub::default()),
        fiscal: FiscalYearResolver::from_name("America/Toronto").unwrap(),
    };
    (create_router(state), jwt)
}

fn token_with(jwt: &JwtService, roles: &[Role]) -> String {
    jwt.generate_token(Uuid::new_v4(), roles).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_status_and_listener_count() {
    let (app, _) = test_app();
    let response = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["realtime_clients"], 0);
}

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() {
    let (app, _) = test_app();
    let response = app
        .oneshot(Request::get("/api/invoices").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["details"], "missing bearer token");
}

#[tokio::test]
async fn expired_token_is_distinguished_from_garbage() {
    let (app, _) = test_app();
    let expired_jwt = JwtService::new(JwtConfig {
        secret: "router-test-secret".to_string(),
        token_expiry_minutes: -120,
    });
    let expired = expired_jwt
        .generate_token(Uuid::new_v4(), &[Role::Manager])
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/invoices")
                .header(header::AUTHORIZATION, format!("Bearer {expired}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["details"], "token has expired");

    let response = app
        .oneshot(
            Request::get("/api/invoices")
                .header(header::AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["details"], "invalid token");
}

#[tokio::test]
async fn token_signed_elsewhere_is_rejected() {
    let (app, _) = test_app();
    let foreign = JwtService::new(JwtConfig {
        secret: "some-other-secret".to_string(),
        token_expiry_minutes: 60,
    });
    let token = foreign
        .generate_token(Uuid::new_v4(), &[Role::Manager])
        .unwrap();

    let response = app
        .oneshot(
            Request::get("/api/invoices")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn submitter_cannot_delete_an_invoice() {
    let (app, jwt) = test_app();
    let token = token_with(&jwt, &[Role::Submitter]);

    // The gate rejects before the handler body, so the disconnected
    // database is never touched.
    let response = app
        .oneshot(
            Request::delete(format!("/api/invoices/{}", Uuid::new_v4()))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn submitter_cannot_create_an_expense_account() {
    let (app, jwt) = test_app();
    let token = token_with(&jwt, &[Role::Submitter, Role::Approver]);

    let response = app
        .oneshot(
            Request::post("/api/expense-accounts")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "mode": "distinct_code",
                        "requester_name": "Marie",
                        "submitted_date": "2025-09-03"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn negative_amount_is_rejected_before_any_side_effect() {
    let (app, jwt) = test_app();
    let token = token_with(&jwt, &[Role::Submitter]);

    let response = app
        .oneshot(
            Request::post("/api/invoices")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "supplier": "Café Dépôt",
                        "issue_date": "2025-09-03",
                        "amount": "-5.00"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"], "amount must not be negative");
}

#[tokio::test]
async fn malformed_date_is_rejected() {
    let (app, jwt) = test_app();
    let token = token_with(&jwt, &[Role::Submitter]);

    let response = app
        .oneshot(
            Request::post("/api/invoices")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "supplier": "Café Dépôt",
                        "issue_date": "03/09/2025",
                        "amount": "10.00"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn registration_rejects_weak_input_before_touching_storage() {
    let (app, _) = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "email": "not-an-email",
                        "password": "long-enough-password",
                        "full_name": "A"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(
            Request::post("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "email": "a@b.c",
                        "password": "short",
                        "full_name": "A"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn realtime_handshake_without_token_is_unauthorized() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::get("/api/events")
                .header(header::CONNECTION, "upgrade")
                .header(header::UPGRADE, "websocket")
                .header(header::SEC_WEBSOCKET_VERSION, "13")
                .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["details"], "missing token query parameter");
}

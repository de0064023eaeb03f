//! Authentication routes: register, login, current identity.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;
use tresorerie_core::auth::{hash_password, verify_password};
use tresorerie_core::events::{ChangeAction, ChangeEvent, ResourceKind};
use tresorerie_db::UserRepository;
use tresorerie_shared::auth::{LoginRequest, LoginResponse, RegisterRequest, Role, UserInfo};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::projections::{event_payload, user_info, UserProjection};
use crate::AppState;

/// Public auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Auth routes behind the bearer-token middleware.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// POST /auth/register - Create an account with the default submitter role.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserInfo>), ApiError> {
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return Err(ApiError::validation("a valid email is required"));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::validation(
            "password must be at least 8 characters",
        ));
    }

    let password_hash = hash_password(&payload.password)?;
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .create(
            payload.email.trim(),
            &password_hash,
            payload.full_name.trim(),
            &[Role::Submitter],
        )
        .await?;

    info!(user_id = %user.id, "user registered");
    state.events.publish(ChangeEvent::new(
        ResourceKind::User,
        ChangeAction::Created,
        event_payload(&UserProjection::from(user.clone())),
    ));

    Ok((StatusCode::CREATED, Json(user_info(&user))))
}

/// POST /auth/login - Verify credentials and mint an access token carrying
/// the role snapshot.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let repo = UserRepository::new(state.db.clone());

    // One answer for a wrong email, a wrong password, or a disabled
    // account, so login responses never confirm which emails exist.
    let rejected = || ApiError::unauthorized("invalid email or password");

    let user = repo
        .find_by_email(payload.email.trim())
        .await?
        .ok_or_else(rejected)?;

    if !user.is_active {
        info!(user_id = %user.id, "login attempt on disabled account");
        return Err(rejected());
    }
    if !verify_password(&payload.password, &user.password_hash)? {
        info!(user_id = %user.id, "login attempt with wrong password");
        return Err(rejected());
    }

    let roles = tresorerie_shared::auth::parse_role_list(&user.roles);
    let access_token = state.jwt.generate_token(user.id, &roles)?;

    info!(user_id = %user.id, "login succeeded");
    Ok(Json(LoginResponse {
        user: user_info(&user),
        access_token,
        expires_in: state.jwt.token_expires_in(),
    }))
}

/// GET /auth/me - Identity behind the presented token.
async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<UserInfo>, ApiError> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("user no longer exists"))?;
    Ok(Json(user_info(&user)))
}

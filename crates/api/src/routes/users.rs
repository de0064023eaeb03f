//! User administration routes.

use axum::extract::{Path, State};
use axum::routing::{delete, get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;
use tresorerie_core::auth::hash_password;
use tresorerie_core::events::{ChangeAction, ChangeEvent, ResourceKind};
use tresorerie_db::repositories::UpdateUserInput;
use tresorerie_db::UserRepository;
use tresorerie_shared::auth::Role;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{AuthUser, Gated, ManagerOnly};
use crate::projections::{event_payload, UserProjection};
use crate::AppState;

/// Creates the user routes (bearer-token middleware applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", patch(update_user))
        .route("/users/{id}", delete(delete_user))
        .route("/users/{id}/password", patch(change_password))
}

/// PATCH body for a user. Unknown fields are ignored, not rejected.
#[derive(Debug, Deserialize)]
struct UpdateUserRequest {
    full_name: Option<String>,
    roles: Option<Vec<Role>>,
    is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ChangePasswordRequest {
    password: String,
}

/// GET /users - All users, managers only.
async fn list_users(
    State(state): State<AppState>,
    _gate: Gated<ManagerOnly>,
) -> Result<Json<Vec<UserProjection>>, ApiError> {
    let repo = UserRepository::new(state.db.clone());
    let users = repo.list().await?;
    Ok(Json(users.into_iter().map(UserProjection::from).collect()))
}

/// PATCH /users/{id} - Profile, role set, and active flag. Role changes do
/// not touch tokens already minted; the old snapshot rides until expiry.
async fn update_user(
    State(state): State<AppState>,
    _gate: Gated<ManagerOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserProjection>, ApiError> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .update(
            id,
            UpdateUserInput {
                full_name: payload.full_name,
                roles: payload.roles,
                is_active: payload.is_active,
            },
        )
        .await?;

    let projection = UserProjection::from(user);
    state.events.publish(ChangeEvent::new(
        ResourceKind::User,
        ChangeAction::Updated,
        event_payload(&projection),
    ));
    Ok(Json(projection))
}

/// PATCH /users/{id}/password - Own password, or any password for a
/// manager.
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<UserProjection>, ApiError> {
    if auth.user_id() != id && !auth.has_any(&[Role::Manager]) {
        return Err(ApiError::forbidden(
            "only managers may change another user's password",
        ));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::validation(
            "password must be at least 8 characters",
        ));
    }

    let password_hash = hash_password(&payload.password)?;
    let repo = UserRepository::new(state.db.clone());
    let user = repo.set_password_hash(id, &password_hash).await?;

    info!(user_id = %id, changed_by = %auth.user_id(), "password changed");
    Ok(Json(UserProjection::from(user)))
}

/// DELETE /users/{id} - Remove a user. Self-deletion is refused; a user
/// still referenced by records comes back as 409.
async fn delete_user(
    State(state): State<AppState>,
    gate: Gated<ManagerOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if gate.user_id() == id {
        return Err(ApiError::validation("cannot delete your own account"));
    }

    let repo = UserRepository::new(state.db.clone());
    let user = repo.delete(id).await?;

    state.events.publish(ChangeEvent::new(
        ResourceKind::User,
        ChangeAction::Deleted,
        serde_json::json!({ "id": user.id }),
    ));
    Ok(Json(serde_json::json!({ "id": user.id })))
}

//! Bearer-token authentication and the declarative role gate.
//!
//! Layer (a): [`auth_middleware`] runs on every protected route. It
//! requires a syntactically valid, correctly signed, unexpired token and
//! stores the decoded [`Claims`] in the request extensions. Expired and
//! invalid tokens are rejected with distinct details so clients know
//! whether to re-authenticate.
//!
//! Layer (b): [`Gated`] is an extractor parameterized by a [`RolePolicy`].
//! Listing it in a handler's signature is the whole authorization check:
//! axum runs extractors before the handler body, so an insufficient role
//! set turns into 403 with zero mutation performed. No handler branches on
//! role strings.

use std::marker::PhantomData;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tresorerie_shared::auth::Role;
use tresorerie_shared::Claims;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Validates the bearer token and resolves the caller's identity and role
/// snapshot into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = header.and_then(bearer_token) else {
        return ApiError::unauthorized("missing bearer token").into_response();
    };

    match state.jwt.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// The role set allowed to perform a gated operation.
pub trait RolePolicy: Send + Sync + 'static {
    /// Roles whose holders pass the gate.
    const ALLOWED: &'static [Role];
}

/// Any staff member: submitter, manager, or approver.
#[derive(Debug, Clone, Copy)]
pub struct AnyStaff;

impl RolePolicy for AnyStaff {
    const ALLOWED: &'static [Role] = &[Role::Submitter, Role::Manager, Role::Approver];
}

/// Managers only.
#[derive(Debug, Clone, Copy)]
pub struct ManagerOnly;

impl RolePolicy for ManagerOnly {
    const ALLOWED: &'static [Role] = &[Role::Manager];
}

/// Managers and approvers: the identities that may change invoice state.
#[derive(Debug, Clone, Copy)]
pub struct Reviewers;

impl RolePolicy for Reviewers {
    const ALLOWED: &'static [Role] = &[Role::Manager, Role::Approver];
}

/// Extractor that admits the caller only when their role snapshot
/// intersects `P::ALLOWED`.
#[derive(Debug, Clone)]
pub struct Gated<P: RolePolicy> {
    pub claims: Claims,
    _policy: PhantomData<P>,
}

impl<P: RolePolicy> Gated<P> {
    /// The authenticated caller's id.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.claims.user_id()
    }
}

impl<S, P> FromRequestParts<S> for Gated<P>
where
    S: Send + Sync,
    P: RolePolicy,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("authentication required"))?;

        if !claims.has_any(P::ALLOWED) {
            let allowed = P::ALLOWED
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ApiError::forbidden(format!(
                "operation requires one of: {allowed}"
            )));
        }

        Ok(Self {
            claims,
            _policy: PhantomData,
        })
    }
}

/// Extractor for any authenticated caller, role set unchecked. Used by the
/// few endpoints where the resource itself decides (own profile, own
/// password).
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// The authenticated caller's id.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.0.user_id()
    }

    /// True if the caller holds at least one of the given roles.
    #[must_use]
    pub fn has_any(&self, allowed: &[Role]) -> bool {
        self.0.has_any(allowed)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};

    use super::*;

    fn claims_with(roles: &[Role]) -> Claims {
        Claims::new(Uuid::new_v4(), roles, Utc::now() + Duration::hours(1))
    }

    async fn gate_status<P: RolePolicy>(claims: Option<Claims>) -> Result<(), StatusCode> {
        let mut request = Request::builder().uri("/").body(()).unwrap();
        if let Some(claims) = claims {
            request.extensions_mut().insert(claims);
        }
        let (mut parts, ()) = request.into_parts();
        Gated::<P>::from_request_parts(&mut parts, &())
            .await
            .map(|_| ())
            .map_err(|e| e.into_response().status())
    }

    #[test]
    fn bearer_prefix_is_case_tolerant() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
    }

    #[tokio::test]
    async fn matching_role_passes_the_gate() {
        let ok = gate_status::<ManagerOnly>(Some(claims_with(&[Role::Manager]))).await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn intersection_is_enough() {
        let ok =
            gate_status::<Reviewers>(Some(claims_with(&[Role::Submitter, Role::Approver]))).await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn insufficient_role_is_forbidden() {
        let err = gate_status::<ManagerOnly>(Some(claims_with(&[Role::Submitter])))
            .await
            .unwrap_err();
        assert_eq!(err, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_claims_are_unauthorized() {
        let err = gate_status::<AnyStaff>(None).await.unwrap_err();
        assert_eq!(err, StatusCode::UNAUTHORIZED);
    }
}

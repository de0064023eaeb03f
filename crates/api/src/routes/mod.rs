//! API route definitions.

use axum::{middleware, Router};

use crate::middleware::auth::auth_middleware;
use crate::AppState;

pub mod auth;
pub mod budgets;
pub mod events;
pub mod expense_accounts;
pub mod health;
pub mod invoices;
pub mod users;

/// Distinguishes "field absent" from "field explicitly null" in PATCH
/// bodies: the outer `Option` is presence, the inner one is the value.
pub(crate) mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Assembles the API router: public routes plus the bearer-token-protected
/// block. Role gates live inside the handlers' signatures; the middleware
/// here only establishes identity.
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(auth::protected_routes())
        .merge(users::routes())
        .merge(invoices::routes())
        .merge(expense_accounts::routes())
        .merge(budgets::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(events::routes())
        .merge(protected)
}

//! Budget line routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use tresorerie_core::events::{ChangeAction, ChangeEvent, ResourceKind};
use tresorerie_core::validate::parse_amount;
use tresorerie_db::repositories::{BudgetFilter, CreateBudgetLineInput, UpdateBudgetLineInput};
use tresorerie_db::BudgetRepository;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{AuthUser, Gated, ManagerOnly};
use crate::projections::{event_payload, BudgetLineProjection};
use crate::AppState;

/// Creates the budget routes (bearer-token middleware applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgets", get(list_lines))
        .route("/budgets", post(create_line))
        .route("/budgets/{id}", patch(update_line))
        .route("/budgets/{id}", delete(delete_line))
}

#[derive(Debug, Deserialize)]
struct CreateBudgetLineRequest {
    fiscal_year: Option<i32>,
    fund_type: String,
    revenue_type: String,
    label: Option<String>,
    amount: String,
}

/// PATCH body. Unknown fields are ignored, not rejected.
#[derive(Debug, Deserialize)]
struct UpdateBudgetLineRequest {
    fund_type: Option<String>,
    revenue_type: Option<String>,
    #[serde(default, deserialize_with = "super::double_option::deserialize")]
    label: Option<Option<String>>,
    amount: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    fiscal_year: Option<i32>,
    fund_type: Option<String>,
    revenue_type: Option<String>,
    contains: Option<String>,
}

/// GET /budgets - Any authenticated caller may read the budget.
async fn list_lines(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BudgetLineProjection>>, ApiError> {
    let repo = BudgetRepository::new(state.db.clone());
    let lines = repo
        .list(BudgetFilter {
            fiscal_year: Some(query.fiscal_year.unwrap_or_else(|| state.fiscal.current())),
            fund_type: query.fund_type,
            revenue_type: query.revenue_type,
            contains: query.contains,
        })
        .await?;
    Ok(Json(
        lines.into_iter().map(BudgetLineProjection::from).collect(),
    ))
}

/// POST /budgets - Create a line; its natural key must be free.
async fn create_line(
    State(state): State<AppState>,
    gate: Gated<ManagerOnly>,
    Json(payload): Json<CreateBudgetLineRequest>,
) -> Result<(StatusCode, Json<BudgetLineProjection>), ApiError> {
    if payload.fund_type.trim().is_empty() || payload.revenue_type.trim().is_empty() {
        return Err(ApiError::validation(
            "fund_type and revenue_type are required",
        ));
    }
    let amount = parse_amount(&payload.amount)?;

    let repo = BudgetRepository::new(state.db.clone());
    let line = repo
        .create(CreateBudgetLineInput {
            fiscal_year: payload.fiscal_year.unwrap_or_else(|| state.fiscal.current()),
            fund_type: payload.fund_type.trim().to_owned(),
            revenue_type: payload.revenue_type.trim().to_owned(),
            label: payload.label,
            amount,
            created_by: gate.user_id(),
        })
        .await?;

    info!(line_id = %line.id, fiscal_year = line.fiscal_year, "budget line created");
    let projection = BudgetLineProjection::from(line);
    state.events.publish(ChangeEvent::new(
        ResourceKind::Budget,
        ChangeAction::Created,
        event_payload(&projection),
    ));
    Ok((StatusCode::CREATED, Json(projection)))
}

/// PATCH /budgets/{id} - Allow-listed fields; key collisions come back 409.
async fn update_line(
    State(state): State<AppState>,
    gate: Gated<ManagerOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBudgetLineRequest>,
) -> Result<Json<BudgetLineProjection>, ApiError> {
    let amount = payload.amount.as_deref().map(parse_amount).transpose()?;

    let repo = BudgetRepository::new(state.db.clone());
    let line = repo
        .update(
            id,
            gate.user_id(),
            UpdateBudgetLineInput {
                fund_type: payload.fund_type,
                revenue_type: payload.revenue_type,
                label: payload.label,
                amount,
            },
        )
        .await?;

    let projection = BudgetLineProjection::from(line);
    state.events.publish(ChangeEvent::new(
        ResourceKind::Budget,
        ChangeAction::Updated,
        event_payload(&projection),
    ));
    Ok(Json(projection))
}

/// DELETE /budgets/{id}
async fn delete_line(
    State(state): State<AppState>,
    _gate: Gated<ManagerOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let repo = BudgetRepository::new(state.db.clone());
    let line = repo.delete(id).await?;

    info!(line_id = %id, "budget line deleted");
    let identifiers = json!({ "id": line.id });
    state.events.publish(ChangeEvent::new(
        ResourceKind::Budget,
        ChangeAction::Deleted,
        identifiers.clone(),
    ));
    Ok(Json(identifiers))
}

//! Expense account routes: lifecycle, invoice linkage, code propagation,
//! and document custody including system-generated PDFs.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use tresorerie_core::attachment::{IncomingFile, OwnerRef};
use tresorerie_core::events::{ChangeAction, ChangeEvent, ResourceKind};
use tresorerie_core::validate::parse_date;
use tresorerie_db::entities::sea_orm_active_enums::ExpenseAccountMode;
use tresorerie_db::repositories::{
    CreateExpenseAccountInput, ExpenseAccountFilter, UpdateExpenseAccountInput,
};
use tresorerie_db::{AttachmentRepository, ExpenseAccountRepository};
use uuid::Uuid;

use super::invoices::{attachment_response, required_file_part};
use crate::error::ApiError;
use crate::middleware::{AnyStaff, Gated, ManagerOnly, Reviewers};
use crate::projections::{
    event_payload, AttachmentProjection, ExpenseAccountProjection, InvoiceProjection,
};
use crate::AppState;

/// Creates the expense account routes (bearer-token middleware applied
/// externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expense-accounts", get(list_accounts))
        .route("/expense-accounts", post(create_account))
        .route("/expense-accounts/{id}", get(get_account))
        .route("/expense-accounts/{id}", patch(update_account))
        .route("/expense-accounts/{id}", delete(delete_account))
        .route("/expense-accounts/{id}/attachments", get(list_attachments))
        .route("/expense-accounts/{id}/attachments", post(add_attachment))
        .route(
            "/expense-accounts/{id}/attachments/{index}",
            get(fetch_attachment),
        )
        .route("/expense-accounts/{id}/generated-pdf", post(store_generated_pdf))
        .route("/expense-accounts/{id}/invoices", get(linked_invoices))
        .route("/expense-accounts/{id}/invoices", post(link_invoices))
        .route("/expense-accounts/{id}/apply-code", post(apply_code))
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CreateAccountRequest {
    mode: ExpenseAccountMode,
    global_code: Option<String>,
    requester_name: String,
    submitted_date: String,
}

/// PATCH body. Unknown fields are ignored, not rejected.
#[derive(Debug, Deserialize)]
struct UpdateAccountRequest {
    mode: Option<ExpenseAccountMode>,
    #[serde(default, deserialize_with = "super::double_option::deserialize")]
    global_code: Option<Option<String>>,
    requester_name: Option<String>,
    submitted_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    fiscal_year: Option<i32>,
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LinkInvoicesRequest {
    invoice_ids: Vec<Uuid>,
}

/// JSON intake for a generated PDF. The multipart path uses a `pdf` part
/// instead.
#[derive(Debug, Deserialize)]
struct GeneratedPdfRequest {
    pdf_base64: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /expense-accounts - Fiscal-year-scoped listing, defaulting to the
/// current year.
async fn list_accounts(
    State(state): State<AppState>,
    _gate: Gated<AnyStaff>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ExpenseAccountProjection>>, ApiError> {
    let repo = ExpenseAccountRepository::new(state.db.clone());
    let accounts = repo
        .list(ExpenseAccountFilter {
            fiscal_year: Some(query.fiscal_year.unwrap_or_else(|| state.fiscal.current())),
            q: query.q,
        })
        .await?;
    Ok(Json(
        accounts
            .into_iter()
            .map(ExpenseAccountProjection::from)
            .collect(),
    ))
}

/// POST /expense-accounts - Create an account; its cid is derived from the
/// issued sequence number.
async fn create_account(
    State(state): State<AppState>,
    gate: Gated<ManagerOnly>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ExpenseAccountProjection>), ApiError> {
    if payload.requester_name.trim().is_empty() {
        return Err(ApiError::validation("requester_name is required"));
    }
    let submitted_date = parse_date(&payload.submitted_date)?;

    let repo = ExpenseAccountRepository::new(state.db.clone());
    let account = repo
        .create(CreateExpenseAccountInput {
            fiscal_year: state.fiscal.current(),
            mode: payload.mode,
            global_code: payload.global_code,
            requester_name: payload.requester_name.trim().to_owned(),
            submitted_date,
            created_by: gate.user_id(),
        })
        .await?;

    info!(account_id = %account.id, cid = %account.cid, "expense account created");
    let projection = ExpenseAccountProjection::from(account);
    state.events.publish(ChangeEvent::new(
        ResourceKind::ExpenseAccount,
        ChangeAction::Created,
        event_payload(&projection),
    ));
    Ok((StatusCode::CREATED, Json(projection)))
}

/// GET /expense-accounts/{id}
async fn get_account(
    State(state): State<AppState>,
    _gate: Gated<AnyStaff>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExpenseAccountProjection>, ApiError> {
    let repo = ExpenseAccountRepository::new(state.db.clone());
    let account = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("expense account not found: {id}")))?;
    Ok(Json(ExpenseAccountProjection::from(account)))
}

/// PATCH /expense-accounts/{id} - Allow-listed fields; the mode/code
/// invariant is enforced on the merged row.
async fn update_account(
    State(state): State<AppState>,
    gate: Gated<ManagerOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<ExpenseAccountProjection>, ApiError> {
    let submitted_date = payload
        .submitted_date
        .as_deref()
        .map(parse_date)
        .transpose()?;

    let repo = ExpenseAccountRepository::new(state.db.clone());
    let account = repo
        .update(
            id,
            gate.user_id(),
            UpdateExpenseAccountInput {
                mode: payload.mode,
                global_code: payload.global_code,
                requester_name: payload.requester_name,
                submitted_date,
            },
        )
        .await?;

    let projection = ExpenseAccountProjection::from(account);
    state.events.publish(ChangeEvent::new(
        ResourceKind::ExpenseAccount,
        ChangeAction::Updated,
        event_payload(&projection),
    ));
    Ok(Json(projection))
}

/// DELETE /expense-accounts/{id} - Two-phase; linked invoices survive with
/// their account reference cleared.
async fn delete_account(
    State(state): State<AppState>,
    _gate: Gated<ManagerOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let repo = ExpenseAccountRepository::new(state.db.clone());
    let account = repo.delete(&state.files, id).await?;

    info!(account_id = %id, cid = %account.cid, "expense account deleted");
    let identifiers = json!({ "id": account.id, "cid": account.cid });
    state.events.publish(ChangeEvent::new(
        ResourceKind::ExpenseAccount,
        ChangeAction::Deleted,
        identifiers.clone(),
    ));
    Ok(Json(identifiers))
}

/// GET /expense-accounts/{id}/attachments
async fn list_attachments(
    State(state): State<AppState>,
    _gate: Gated<AnyStaff>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AttachmentProjection>>, ApiError> {
    let repo = AttachmentRepository::new(state.db.clone());
    let rows = repo.list_for_owner(OwnerRef::expense_account(id)).await?;
    Ok(Json(rows.into_iter().map(AttachmentProjection::from).collect()))
}

/// POST /expense-accounts/{id}/attachments - Multipart `file` part.
async fn add_attachment(
    State(state): State<AppState>,
    gate: Gated<AnyStaff>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AttachmentProjection>), ApiError> {
    let file = required_file_part(multipart, "file").await?;

    let repo = AttachmentRepository::new(state.db.clone());
    let meta = repo
        .add_to_expense_account(
            &state.files,
            id,
            file,
            gate.user_id(),
            false,
            state.fiscal.today(),
        )
        .await?;

    info!(account_id = %id, file_index = meta.file_index, "attachment stored");
    let projection = AttachmentProjection::from(meta);
    state.events.publish(ChangeEvent::new(
        ResourceKind::ExpenseAccount,
        ChangeAction::AttachmentAdded,
        event_payload(&projection),
    ));
    Ok((StatusCode::CREATED, Json(projection)))
}

/// GET /expense-accounts/{id}/attachments/{index}
async fn fetch_attachment(
    State(state): State<AppState>,
    _gate: Gated<AnyStaff>,
    Path((id, index)): Path<(Uuid, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = AttachmentRepository::new(state.db.clone());
    let (meta, bytes) = repo
        .open(&state.files, OwnerRef::expense_account(id), index)
        .await?;
    Ok(attachment_response(&meta, bytes))
}

/// POST /expense-accounts/{id}/generated-pdf - Custody for a PDF the system
/// rendered elsewhere; multipart `pdf` part or JSON `pdf_base64`.
async fn store_generated_pdf(
    State(state): State<AppState>,
    gate: Gated<Reviewers>,
    Path(id): Path<Uuid>,
    request: axum::extract::Request,
) -> Result<(StatusCode, Json<AttachmentProjection>), ApiError> {
    use axum::extract::FromRequest;

    let file = if super::invoices::is_multipart(&request) {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::validation(e.to_string()))?;
        required_file_part(multipart, "pdf").await?
    } else {
        let Json(body) = Json::<GeneratedPdfRequest>::from_request(request, &())
            .await
            .map_err(|e| ApiError::validation(e.to_string()))?;
        let bytes = BASE64
            .decode(body.pdf_base64.as_bytes())
            .map_err(|_| ApiError::validation("pdf_base64 is not valid base64"))?;
        if bytes.is_empty() {
            return Err(ApiError::validation("pdf_base64 decodes to zero bytes"));
        }
        IncomingFile::new("generated.pdf", bytes)
    };

    let repo = AttachmentRepository::new(state.db.clone());
    let meta = repo
        .add_to_expense_account(
            &state.files,
            id,
            file,
            gate.user_id(),
            true,
            state.fiscal.today(),
        )
        .await?;

    info!(account_id = %id, file_index = meta.file_index, "generated pdf stored");
    let projection = AttachmentProjection::from(meta);
    state.events.publish(ChangeEvent::new(
        ResourceKind::ExpenseAccount,
        ChangeAction::AttachmentAdded,
        event_payload(&projection),
    ));
    Ok((StatusCode::CREATED, Json(projection)))
}

/// GET /expense-accounts/{id}/invoices - Invoices linked to this account.
async fn linked_invoices(
    State(state): State<AppState>,
    _gate: Gated<AnyStaff>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<InvoiceProjection>>, ApiError> {
    let repo = ExpenseAccountRepository::new(state.db.clone());
    let invoices = repo.linked_invoices(id).await?;
    Ok(Json(
        invoices.into_iter().map(InvoiceProjection::from).collect(),
    ))
}

/// POST /expense-accounts/{id}/invoices - Batch link; ids that match no
/// invoice are reported, never fatal.
async fn link_invoices(
    State(state): State<AppState>,
    gate: Gated<ManagerOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LinkInvoicesRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let repo = ExpenseAccountRepository::new(state.db.clone());
    let outcome = repo
        .link_invoices(id, gate.user_id(), payload.invoice_ids)
        .await?;

    info!(
        account_id = %id,
        linked = outcome.linked.len(),
        skipped = outcome.skipped.len(),
        "invoices linked"
    );
    state.events.publish(ChangeEvent::new(
        ResourceKind::ExpenseAccount,
        ChangeAction::Updated,
        json!({ "id": id, "linked": outcome.linked }),
    ));
    Ok(Json(
        json!({ "linked": outcome.linked, "skipped": outcome.skipped }),
    ))
}

/// POST /expense-accounts/{id}/apply-code - Copy the account's global code
/// onto every linked invoice.
async fn apply_code(
    State(state): State<AppState>,
    gate: Gated<ManagerOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let repo = ExpenseAccountRepository::new(state.db.clone());
    let updated = repo.apply_code(id, gate.user_id()).await?;

    info!(account_id = %id, updated, "global code applied to linked invoices");
    state.events.publish(ChangeEvent::new(
        ResourceKind::ExpenseAccount,
        ChangeAction::Updated,
        json!({ "id": id, "code_applied_to": updated }),
    ));
    Ok(Json(json!({ "updated": updated })))
}

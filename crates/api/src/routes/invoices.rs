//! Invoice routes: lifecycle, listing, and document custody.
//!
//! Creation accepts either a JSON body or a multipart form with an optional
//! `file` part. Every scalar field is validated before the repository is
//! called, so a bad date or a negative amount returns 400 with no row
//! created and no byte persisted, even when a file rode along.

use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use tresorerie_core::attachment::{IncomingFile, OwnerRef};
use tresorerie_core::events::{ChangeAction, ChangeEvent, ResourceKind};
use tresorerie_core::validate::{normalize_currency, parse_amount, parse_date, DEFAULT_CURRENCY};
use tresorerie_db::entities::sea_orm_active_enums::InvoiceStatus;
use tresorerie_db::repositories::{CreateInvoiceInput, InvoiceFilter, UpdateInvoiceInput};
use tresorerie_db::{AttachmentRepository, InvoiceRepository};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{AnyStaff, Gated, ManagerOnly, Reviewers};
use crate::projections::{event_payload, AttachmentProjection, InvoiceProjection};
use crate::AppState;

/// Creates the invoice routes (bearer-token middleware applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices))
        .route("/invoices", post(create_invoice))
        .route("/invoices/{id}", get(get_invoice))
        .route("/invoices/{id}", patch(update_invoice))
        .route("/invoices/{id}", delete(delete_invoice))
        .route("/invoices/{id}/attachments", get(list_attachments))
        .route("/invoices/{id}/attachments", post(add_attachment))
        .route("/invoices/{id}/attachments/{index}", get(fetch_attachment))
}

// ============================================================================
// Request types
// ============================================================================

/// JSON body for creating an invoice. Amounts travel as strings so the
/// parser, not the JSON decoder, decides what a valid amount is.
#[derive(Debug, Deserialize)]
struct CreateInvoiceRequest {
    supplier: String,
    issue_date: String,
    amount: String,
    currency: Option<String>,
    description: Option<String>,
    code: Option<String>,
    expense_account_id: Option<Uuid>,
}

/// PATCH body. Unknown fields are ignored, not rejected. A field present
/// with `null` clears it where the column is nullable.
#[derive(Debug, Deserialize)]
struct UpdateInvoiceRequest {
    issue_date: Option<String>,
    supplier: Option<String>,
    #[serde(default, deserialize_with = "super::double_option::deserialize")]
    description: Option<Option<String>>,
    amount: Option<String>,
    currency: Option<String>,
    status: Option<InvoiceStatus>,
    #[serde(default, deserialize_with = "super::double_option::deserialize")]
    code: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option::deserialize")]
    expense_account_id: Option<Option<Uuid>>,
    approved_by: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    fiscal_year: Option<i32>,
    status: Option<InvoiceStatus>,
    q: Option<String>,
}

/// The create fields after intake but before validation, common to the
/// JSON and multipart paths.
#[derive(Debug, Default)]
struct InvoiceDraft {
    supplier: Option<String>,
    issue_date: Option<String>,
    amount: Option<String>,
    currency: Option<String>,
    description: Option<String>,
    code: Option<String>,
    expense_account_id: Option<Uuid>,
    file: Option<IncomingFile>,
}

impl From<CreateInvoiceRequest> for InvoiceDraft {
    fn from(body: CreateInvoiceRequest) -> Self {
        Self {
            supplier: Some(body.supplier),
            issue_date: Some(body.issue_date),
            amount: Some(body.amount),
            currency: body.currency,
            description: body.description,
            code: body.code,
            expense_account_id: body.expense_account_id,
            file: None,
        }
    }
}

async fn draft_from_multipart(mut multipart: Multipart) -> Result<InvoiceDraft, ApiError> {
    let mut draft = InvoiceDraft::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };
        if name == "file" {
            let original_name = field.file_name().unwrap_or("document").to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("failed to read file part: {e}")))?;
            draft.file = Some(IncomingFile::new(original_name, bytes));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::validation(format!("failed to read field '{name}': {e}")))?;
        match name.as_str() {
            "supplier" => draft.supplier = Some(value),
            "issue_date" => draft.issue_date = Some(value),
            "amount" => draft.amount = Some(value),
            "currency" => draft.currency = Some(value),
            "description" => draft.description = Some(value),
            "code" => draft.code = Some(value),
            "expense_account_id" => {
                let id = value.parse::<Uuid>().map_err(|_| {
                    ApiError::validation(format!("invalid expense_account_id '{value}'"))
                })?;
                draft.expense_account_id = Some(id);
            }
            // Unknown parts are ignored, matching the PATCH allow-lists.
            _ => {}
        }
    }

    Ok(draft)
}

pub(super) fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /invoices - Fiscal-year-scoped listing, defaulting to the current
/// year, with optional status and free-text filters.
async fn list_invoices(
    State(state): State<AppState>,
    _gate: Gated<AnyStaff>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<InvoiceProjection>>, ApiError> {
    let repo = InvoiceRepository::new(state.db.clone());
    let invoices = repo
        .list(InvoiceFilter {
            fiscal_year: Some(query.fiscal_year.unwrap_or_else(|| state.fiscal.current())),
            status: query.status,
            q: query.q,
        })
        .await?;
    Ok(Json(
        invoices.into_iter().map(InvoiceProjection::from).collect(),
    ))
}

/// POST /invoices - Create an invoice, optionally with its first document.
async fn create_invoice(
    State(state): State<AppState>,
    gate: Gated<AnyStaff>,
    request: Request,
) -> Result<(StatusCode, Json<InvoiceProjection>), ApiError> {
    let draft = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::validation(e.to_string()))?;
        draft_from_multipart(multipart).await?
    } else {
        let Json(body) = Json::<CreateInvoiceRequest>::from_request(request, &())
            .await
            .map_err(|e| ApiError::validation(e.to_string()))?;
        InvoiceDraft::from(body)
    };

    let supplier = draft
        .supplier
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::validation("supplier is required"))?;
    let issue_date = parse_date(
        draft
            .issue_date
            .as_deref()
            .ok_or_else(|| ApiError::validation("issue_date is required"))?,
    )?;
    let amount = parse_amount(
        draft
            .amount
            .as_deref()
            .ok_or_else(|| ApiError::validation("amount is required"))?,
    )?;
    let currency = match draft.currency {
        Some(raw) => normalize_currency(&raw)?,
        None => DEFAULT_CURRENCY.to_string(),
    };
    if let Some(file) = &draft.file {
        if file.is_empty() {
            return Err(ApiError::validation("uploaded file is empty"));
        }
    }

    let repo = InvoiceRepository::new(state.db.clone());
    let (invoice, attachment) = repo
        .create(
            &state.files,
            CreateInvoiceInput {
                fiscal_year: state.fiscal.current(),
                received_on: state.fiscal.today(),
                issue_date,
                supplier: supplier.trim().to_owned(),
                description: draft.description,
                amount,
                currency,
                code: draft.code,
                expense_account_id: draft.expense_account_id,
                submitted_by: gate.user_id(),
                file: draft.file,
            },
        )
        .await?;

    info!(
        invoice_id = %invoice.id,
        fiscal_year = invoice.fiscal_year,
        sequence = invoice.sequence_number,
        with_file = attachment.is_some(),
        "invoice created"
    );

    let projection = InvoiceProjection::from(invoice);
    state.events.publish(ChangeEvent::new(
        ResourceKind::Invoice,
        ChangeAction::Created,
        event_payload(&projection),
    ));
    Ok((StatusCode::CREATED, Json(projection)))
}

/// GET /invoices/{id}
async fn get_invoice(
    State(state): State<AppState>,
    _gate: Gated<AnyStaff>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceProjection>, ApiError> {
    let repo = InvoiceRepository::new(state.db.clone());
    let invoice = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("invoice not found: {id}")))?;
    Ok(Json(InvoiceProjection::from(invoice)))
}

/// PATCH /invoices/{id} - Allow-listed fields only; status and linkage are
/// reviewer territory, which the gate enforces.
async fn update_invoice(
    State(state): State<AppState>,
    gate: Gated<Reviewers>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> Result<Json<InvoiceProjection>, ApiError> {
    let issue_date = payload.issue_date.as_deref().map(parse_date).transpose()?;
    let amount = payload.amount.as_deref().map(parse_amount).transpose()?;
    let currency = payload
        .currency
        .as_deref()
        .map(normalize_currency)
        .transpose()?;

    let repo = InvoiceRepository::new(state.db.clone());
    let invoice = repo
        .update(
            id,
            gate.user_id(),
            UpdateInvoiceInput {
                issue_date,
                supplier: payload.supplier,
                description: payload.description,
                amount,
                currency,
                status: payload.status,
                code: payload.code,
                expense_account_id: payload.expense_account_id,
                approved_by: payload.approved_by,
            },
        )
        .await?;

    let projection = InvoiceProjection::from(invoice);
    state.events.publish(ChangeEvent::new(
        ResourceKind::Invoice,
        ChangeAction::Updated,
        event_payload(&projection),
    ));
    Ok(Json(projection))
}

/// DELETE /invoices/{id} - Two-phase: rows first, bytes after commit.
async fn delete_invoice(
    State(state): State<AppState>,
    _gate: Gated<ManagerOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let repo = InvoiceRepository::new(state.db.clone());
    let invoice = repo.delete(&state.files, id).await?;

    info!(invoice_id = %id, sequence = invoice.sequence_number, "invoice deleted");
    let identifiers = json!({
        "id": invoice.id,
        "sequence_number": invoice.sequence_number,
        "fiscal_year": invoice.fiscal_year,
    });
    state.events.publish(ChangeEvent::new(
        ResourceKind::Invoice,
        ChangeAction::Deleted,
        identifiers.clone(),
    ));
    Ok(Json(identifiers))
}

/// GET /invoices/{id}/attachments
async fn list_attachments(
    State(state): State<AppState>,
    _gate: Gated<AnyStaff>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AttachmentProjection>>, ApiError> {
    let repo = AttachmentRepository::new(state.db.clone());
    let rows = repo.list_for_owner(OwnerRef::invoice(id)).await?;
    Ok(Json(rows.into_iter().map(AttachmentProjection::from).collect()))
}

/// POST /invoices/{id}/attachments - Multipart `file` part, stored under
/// the next free index for this invoice.
async fn add_attachment(
    State(state): State<AppState>,
    gate: Gated<AnyStaff>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AttachmentProjection>), ApiError> {
    let file = required_file_part(multipart, "file").await?;

    let repo = AttachmentRepository::new(state.db.clone());
    let meta = repo
        .add_to_invoice(&state.files, id, file, gate.user_id(), state.fiscal.today())
        .await?;

    info!(invoice_id = %id, file_index = meta.file_index, "attachment stored");
    let projection = AttachmentProjection::from(meta);
    state.events.publish(ChangeEvent::new(
        ResourceKind::Invoice,
        ChangeAction::AttachmentAdded,
        event_payload(&projection),
    ));
    Ok((StatusCode::CREATED, Json(projection)))
}

/// GET /invoices/{id}/attachments/{index} - The stored bytes, with the
/// deterministic filename suggested for download.
async fn fetch_attachment(
    State(state): State<AppState>,
    _gate: Gated<AnyStaff>,
    Path((id, index)): Path<(Uuid, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = AttachmentRepository::new(state.db.clone());
    let (meta, bytes) = repo.open(&state.files, OwnerRef::invoice(id), index).await?;
    Ok(attachment_response(&meta, bytes))
}

// ============================================================================
// Shared helpers (also used by the expense-account routes)
// ============================================================================

/// Pulls one named file part out of a multipart body.
pub(super) async fn required_file_part(
    mut multipart: Multipart,
    part_name: &str,
) -> Result<IncomingFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some(part_name) {
            continue;
        }
        let original_name = field.file_name().unwrap_or("document").to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("failed to read file part: {e}")))?;
        if bytes.is_empty() {
            return Err(ApiError::validation("uploaded file is empty"));
        }
        return Ok(IncomingFile::new(original_name, bytes));
    }
    Err(ApiError::validation(format!(
        "multipart part '{part_name}' is required"
    )))
}

/// Streams attachment bytes with a `Content-Disposition` suggesting the
/// stored (deterministic) filename.
pub(super) fn attachment_response(
    meta: &tresorerie_db::entities::attachments::Model,
    bytes: bytes::Bytes,
) -> impl IntoResponse + use<> {
    let suggested = meta
        .stored_path
        .as_deref()
        .and_then(|p| p.rsplit('/').next())
        .unwrap_or("document")
        .to_owned();
    (
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_owned(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{suggested}\""),
            ),
        ],
        bytes,
    )
}

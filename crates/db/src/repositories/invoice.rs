//! Invoice repository.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tresorerie_core::attachment::{self as naming, IncomingFile};
use tresorerie_core::storage::{FileStore, StorageError};
use uuid::Uuid;

use crate::entities::{
    attachments, expense_accounts, invoices,
    sea_orm_active_enums::{AttachmentOwner, InvoiceStatus},
};
use crate::repositories::attachment::AttachmentRepository;
use crate::repositories::sequence::{SequenceIssuer, SequenceKind};

/// Error types for invoice operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    /// Invoice not found.
    #[error("invoice not found: {0}")]
    NotFound(Uuid),

    /// The expense account named in the input does not exist.
    #[error("expense account not found: {0}")]
    ExpenseAccountNotFound(Uuid),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// Fiscal year resolved from the creation instant, not the issue date.
    pub fiscal_year: i32,
    /// Local date of receipt; embedded in the stored filename.
    pub received_on: NaiveDate,
    pub issue_date: NaiveDate,
    pub supplier: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub code: Option<String>,
    pub expense_account_id: Option<Uuid>,
    pub submitted_by: Uuid,
    /// Document received together with the invoice, stored as index 1.
    pub file: Option<IncomingFile>,
}

/// Input for updating an invoice. `None` leaves the field untouched;
/// `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceInput {
    pub issue_date: Option<NaiveDate>,
    pub supplier: Option<String>,
    pub description: Option<Option<String>>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub code: Option<Option<String>>,
    pub expense_account_id: Option<Option<Uuid>>,
    pub approved_by: Option<Uuid>,
}

/// List filters, all conjunctive.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub fiscal_year: Option<i32>,
    pub status: Option<InvoiceStatus>,
    /// Case-insensitive substring over supplier, description, and code.
    pub q: Option<String>,
}

/// Invoice repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an invoice, issuing its sequence number and, when a document
    /// came with it, storing that document as attachment index 1.
    ///
    /// Everything durable happens in one transaction; the document bytes
    /// are written just before the commit and removed again if the commit
    /// fails, so storage never holds bytes no row points at.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced expense account is missing or any
    /// step of the transaction fails.
    pub async fn create(
        &self,
        files: &FileStore,
        input: CreateInvoiceInput,
    ) -> Result<(invoices::Model, Option<attachments::Model>), InvoiceError> {
        if let Some(account_id) = input.expense_account_id {
            self.ensure_account_exists(account_id).await?;
        }

        let txn = self.db.begin().await?;

        let sequence =
            SequenceIssuer::next(&txn, SequenceKind::Invoice, input.fiscal_year).await?;
        let now = Utc::now().into();
        let id = Uuid::new_v4();

        let invoice = invoices::ActiveModel {
            id: Set(id),
            fiscal_year: Set(input.fiscal_year),
            sequence_number: Set(sequence),
            issue_date: Set(input.issue_date),
            supplier: Set(input.supplier),
            description: Set(input.description),
            amount: Set(input.amount),
            currency: Set(input.currency),
            status: Set(InvoiceStatus::Submitted),
            code: Set(input.code),
            expense_account_id: Set(input.expense_account_id),
            submitted_by: Set(input.submitted_by),
            approved_by: Set(None),
            modified_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut stored: Option<(attachments::Model, String)> = None;
        if let Some(file) = input.file {
            let name = naming::invoice_file_name(
                input.fiscal_year,
                sequence,
                &file.original_name,
                input.received_on,
                1,
            );
            let key = format!("{}/{name}", naming::invoice_dir(input.fiscal_year));

            let meta = attachments::ActiveModel {
                id: Set(Uuid::new_v4()),
                owner_kind: Set(AttachmentOwner::Invoice),
                owner_id: Set(id),
                file_index: Set(1),
                stored_path: Set(Some(key.clone())),
                original_name: Set(file.original_name.clone()),
                generated: Set(false),
                uploaded_by: Set(input.submitted_by),
                uploaded_at: Set(now),
            }
            .insert(&txn)
            .await?;

            files.write(&key, file.bytes).await?;
            stored = Some((meta, key));
        }

        if let Err(err) = txn.commit().await {
            if let Some((_, key)) = &stored {
                if let Err(cleanup) = files.delete(key).await {
                    tracing::warn!(key = %key, error = %cleanup, "failed to remove file after commit failure");
                }
            }
            return Err(err.into());
        }

        Ok((invoice, stored.map(|(meta, _)| meta)))
    }

    /// Gets an invoice by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<invoices::Model>, InvoiceError> {
        invoices::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(InvoiceError::from)
    }

    /// Lists invoices matching the filter, newest sequence first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: InvoiceFilter) -> Result<Vec<invoices::Model>, InvoiceError> {
        let mut query = invoices::Entity::find();

        if let Some(fiscal_year) = filter.fiscal_year {
            query = query.filter(invoices::Column::FiscalYear.eq(fiscal_year));
        }
        if let Some(status) = filter.status {
            query = query.filter(invoices::Column::Status.eq(status));
        }
        if let Some(needle) = filter.q {
            let pattern = format!("%{needle}%");
            query = query.filter(
                Condition::any()
                    .add(Expr::col(invoices::Column::Supplier).ilike(pattern.clone()))
                    .add(Expr::col(invoices::Column::Description).ilike(pattern.clone()))
                    .add(Expr::col(invoices::Column::Code).ilike(pattern)),
            );
        }

        query
            .order_by_desc(invoices::Column::SequenceNumber)
            .all(&self.db)
            .await
            .map_err(InvoiceError::from)
    }

    /// Applies the allowed fields to an invoice. When the patch sets a
    /// status without naming an approver, the caller becomes the approver.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice or a referenced expense account does
    /// not exist, or the update fails.
    pub async fn update(
        &self,
        id: Uuid,
        caller: Uuid,
        input: UpdateInvoiceInput,
    ) -> Result<invoices::Model, InvoiceError> {
        let invoice = self
            .find_by_id(id)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        if let Some(Some(account_id)) = input.expense_account_id {
            self.ensure_account_exists(account_id).await?;
        }

        let mut active: invoices::ActiveModel = invoice.into();
        if let Some(v) = input.issue_date {
            active.issue_date = Set(v);
        }
        if let Some(v) = input.supplier {
            active.supplier = Set(v);
        }
        if let Some(v) = input.description {
            active.description = Set(v);
        }
        if let Some(v) = input.amount {
            active.amount = Set(v);
        }
        if let Some(v) = input.currency {
            active.currency = Set(v);
        }
        if let Some(v) = input.code {
            active.code = Set(v);
        }
        if let Some(v) = input.expense_account_id {
            active.expense_account_id = Set(v);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
            active.approved_by = Set(Some(input.approved_by.unwrap_or(caller)));
        } else if let Some(approver) = input.approved_by {
            active.approved_by = Set(Some(approver));
        }
        active.modified_by = Set(Some(caller));
        active.updated_at = Set(Utc::now().into());

        active.update(&self.db).await.map_err(InvoiceError::from)
    }

    /// Deletes an invoice and its attachments. Rows go first and commit;
    /// stored files are unlinked afterwards, best-effort.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice does not exist or the transaction
    /// fails. File unlink failures are logged, never returned.
    pub async fn delete(&self, files: &FileStore, id: Uuid) -> Result<invoices::Model, InvoiceError> {
        let txn = self.db.begin().await?;

        let invoice = invoices::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let paths =
            AttachmentRepository::delete_rows_for_owner(&txn, AttachmentOwner::Invoice, id).await?;
        invoices::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        AttachmentRepository::unlink_files(files, &paths).await;
        Ok(invoice)
    }

    async fn ensure_account_exists(&self, account_id: Uuid) -> Result<(), InvoiceError> {
        expense_accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await?
            .map(|_| ())
            .ok_or(InvoiceError::ExpenseAccountNotFound(account_id))
    }
}

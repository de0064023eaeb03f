//! Expense account repository.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tresorerie_core::attachment::expense_account_cid;
use tresorerie_core::storage::FileStore;
use uuid::Uuid;

use crate::entities::{
    expense_accounts, invoices,
    sea_orm_active_enums::{AttachmentOwner, ExpenseAccountMode},
};
use crate::repositories::attachment::AttachmentRepository;
use crate::repositories::sequence::{SequenceIssuer, SequenceKind};

/// Error types for expense account operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseAccountError {
    /// Expense account not found.
    #[error("expense account not found: {0}")]
    NotFound(Uuid),

    /// The account is (or would become) global-code without a code.
    #[error("mode 'global_code' requires a global code")]
    MissingGlobalCode,

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an expense account.
#[derive(Debug, Clone)]
pub struct CreateExpenseAccountInput {
    pub fiscal_year: i32,
    pub mode: ExpenseAccountMode,
    pub global_code: Option<String>,
    pub requester_name: String,
    pub submitted_date: NaiveDate,
    pub created_by: Uuid,
}

/// Input for updating an expense account. `None` leaves the field
/// untouched; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseAccountInput {
    pub mode: Option<ExpenseAccountMode>,
    pub global_code: Option<Option<String>>,
    pub requester_name: Option<String>,
    pub submitted_date: Option<NaiveDate>,
}

/// List filters, all conjunctive.
#[derive(Debug, Clone, Default)]
pub struct ExpenseAccountFilter {
    pub fiscal_year: Option<i32>,
    /// Case-insensitive substring over cid, requester name, and global code.
    pub q: Option<String>,
}

/// Result of a batch link: ids that were linked and ids that were skipped
/// because no such invoice exists. One bad id never fails the batch.
#[derive(Debug, Clone, Default)]
pub struct LinkOutcome {
    pub linked: Vec<Uuid>,
    pub skipped: Vec<Uuid>,
}

/// Expense account repository for CRUD and linking operations.
#[derive(Debug, Clone)]
pub struct ExpenseAccountRepository {
    db: DatabaseConnection,
}

impl ExpenseAccountRepository {
    /// Creates a new expense account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an expense account, issuing its sequence number and deriving
    /// the public cid from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the mode/code invariant is violated or the
    /// transaction fails.
    pub async fn create(
        &self,
        input: CreateExpenseAccountInput,
    ) -> Result<expense_accounts::Model, ExpenseAccountError> {
        if input.mode == ExpenseAccountMode::GlobalCode && input.global_code.is_none() {
            return Err(ExpenseAccountError::MissingGlobalCode);
        }

        let txn = self.db.begin().await?;

        let sequence =
            SequenceIssuer::next(&txn, SequenceKind::ExpenseAccount, input.fiscal_year).await?;
        let now = Utc::now().into();

        let account = expense_accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            cid: Set(expense_account_cid(input.fiscal_year, sequence)),
            fiscal_year: Set(input.fiscal_year),
            sequence_number: Set(sequence),
            mode: Set(input.mode),
            global_code: Set(input.global_code),
            requester_name: Set(input.requester_name),
            submitted_date: Set(input.submitted_date),
            created_by: Set(input.created_by),
            modified_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(account)
    }

    /// Gets an expense account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<expense_accounts::Model>, ExpenseAccountError> {
        expense_accounts::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(ExpenseAccountError::from)
    }

    /// Lists expense accounts matching the filter, newest sequence first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: ExpenseAccountFilter,
    ) -> Result<Vec<expense_accounts::Model>, ExpenseAccountError> {
        let mut query = expense_accounts::Entity::find();

        if let Some(fiscal_year) = filter.fiscal_year {
            query = query.filter(expense_accounts::Column::FiscalYear.eq(fiscal_year));
        }
        if let Some(needle) = filter.q {
            let pattern = format!("%{needle}%");
            query = query.filter(
                Condition::any()
                    .add(Expr::col(expense_accounts::Column::Cid).ilike(pattern.clone()))
                    .add(Expr::col(expense_accounts::Column::RequesterName).ilike(pattern.clone()))
                    .add(Expr::col(expense_accounts::Column::GlobalCode).ilike(pattern)),
            );
        }

        query
            .order_by_desc(expense_accounts::Column::SequenceNumber)
            .all(&self.db)
            .await
            .map_err(ExpenseAccountError::from)
    }

    /// Lists the invoices linked to an account, newest sequence first.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or the query fails.
    pub async fn linked_invoices(
        &self,
        id: Uuid,
    ) -> Result<Vec<invoices::Model>, ExpenseAccountError> {
        self.find_by_id(id)
            .await?
            .ok_or(ExpenseAccountError::NotFound(id))?;

        invoices::Entity::find()
            .filter(invoices::Column::ExpenseAccountId.eq(id))
            .order_by_desc(invoices::Column::SequenceNumber)
            .all(&self.db)
            .await
            .map_err(ExpenseAccountError::from)
    }

    /// Applies the allowed fields to an expense account. The mode/code
    /// invariant is checked against the merged row, so a patch cannot leave
    /// a global-code account without a code.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist, the merged row would
    /// violate the invariant, or the update fails.
    pub async fn update(
        &self,
        id: Uuid,
        caller: Uuid,
        input: UpdateExpenseAccountInput,
    ) -> Result<expense_accounts::Model, ExpenseAccountError> {
        let account = self
            .find_by_id(id)
            .await?
            .ok_or(ExpenseAccountError::NotFound(id))?;

        let merged_mode = input.mode.unwrap_or(account.mode);
        let merged_code = match &input.global_code {
            Some(v) => v.clone(),
            None => account.global_code.clone(),
        };
        if merged_mode == ExpenseAccountMode::GlobalCode && merged_code.is_none() {
            return Err(ExpenseAccountError::MissingGlobalCode);
        }

        let mut active: expense_accounts::ActiveModel = account.into();
        if let Some(v) = input.mode {
            active.mode = Set(v);
        }
        if let Some(v) = input.global_code {
            active.global_code = Set(v);
        }
        if let Some(v) = input.requester_name {
            active.requester_name = Set(v);
        }
        if let Some(v) = input.submitted_date {
            active.submitted_date = Set(v);
        }
        active.modified_by = Set(Some(caller));
        active.updated_at = Set(Utc::now().into());

        active
            .update(&self.db)
            .await
            .map_err(ExpenseAccountError::from)
    }

    /// Links a batch of invoices to an account. Ids that match no invoice
    /// are reported in `skipped`; the rest are linked.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or a statement fails.
    pub async fn link_invoices(
        &self,
        id: Uuid,
        caller: Uuid,
        invoice_ids: Vec<Uuid>,
    ) -> Result<LinkOutcome, ExpenseAccountError> {
        self.find_by_id(id)
            .await?
            .ok_or(ExpenseAccountError::NotFound(id))?;

        let mut outcome = LinkOutcome::default();
        for invoice_id in invoice_ids {
            let result = invoices::Entity::update_many()
                .col_expr(invoices::Column::ExpenseAccountId, Expr::value(Some(id)))
                .col_expr(invoices::Column::ModifiedBy, Expr::value(Some(caller)))
                .filter(invoices::Column::Id.eq(invoice_id))
                .exec(&self.db)
                .await?;

            if result.rows_affected == 1 {
                outcome.linked.push(invoice_id);
            } else {
                outcome.skipped.push(invoice_id);
            }
        }

        Ok(outcome)
    }

    /// Copies the account's global code onto every linked invoice and
    /// returns how many rows changed. Requires mode `global_code`.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist, has no global code,
    /// or the update fails.
    pub async fn apply_code(&self, id: Uuid, caller: Uuid) -> Result<u64, ExpenseAccountError> {
        let account = self
            .find_by_id(id)
            .await?
            .ok_or(ExpenseAccountError::NotFound(id))?;

        let code = match (account.mode, account.global_code) {
            (ExpenseAccountMode::GlobalCode, Some(code)) => code,
            _ => return Err(ExpenseAccountError::MissingGlobalCode),
        };

        let result = invoices::Entity::update_many()
            .col_expr(invoices::Column::Code, Expr::value(Some(code)))
            .col_expr(invoices::Column::ModifiedBy, Expr::value(Some(caller)))
            .filter(invoices::Column::ExpenseAccountId.eq(id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Deletes an expense account and its attachments. Linked invoices are
    /// detached by the schema (`ON DELETE SET NULL`), not deleted. Rows go
    /// first and commit; files are unlinked afterwards, best-effort.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or the transaction
    /// fails.
    pub async fn delete(
        &self,
        files: &FileStore,
        id: Uuid,
    ) -> Result<expense_accounts::Model, ExpenseAccountError> {
        let txn = self.db.begin().await?;

        let account = expense_accounts::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(ExpenseAccountError::NotFound(id))?;

        let paths = AttachmentRepository::delete_rows_for_owner(
            &txn,
            AttachmentOwner::ExpenseAccount,
            id,
        )
        .await?;
        expense_accounts::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        AttachmentRepository::unlink_files(files, &paths).await;
        Ok(account)
    }
}

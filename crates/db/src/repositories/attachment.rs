//! Attachment repository: per-owner ordinal indexing and byte custody.
//!
//! Rules, in order of importance:
//! - the metadata row is authoritative; bytes never exist without a row
//!   pointing at them past the owning transaction,
//! - `file_index` is issued while the owner row is exclusively locked, in
//!   the same transaction as the metadata insert,
//! - bytes are written only after the row insert succeeded; if the commit
//!   then fails, the bytes are removed again,
//! - a row whose bytes turn out to be missing is healed by clearing its
//!   stored path, and the document reads as absent from then on.

use bytes::Bytes;
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tresorerie_core::attachment::{self as naming, IncomingFile, OwnerKind, OwnerRef};
use tresorerie_core::storage::{FileStore, StorageError};
use uuid::Uuid;

use crate::entities::{attachments, expense_accounts, invoices, sea_orm_active_enums::AttachmentOwner};

/// Error types for attachment operations.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    /// The owning resource does not exist.
    #[error("owner not found: {0}")]
    OwnerNotFound(Uuid),

    /// No attachment row with this index exists for the owner.
    #[error("attachment {file_index} not found for owner {owner_id}")]
    NotFound { owner_id: Uuid, file_index: i32 },

    /// The row exists but its bytes are gone; the document reads as absent.
    #[error("attachment {file_index} for owner {owner_id} is recorded but unavailable")]
    Unavailable { owner_id: Uuid, file_index: i32 },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Attachment repository for both owner families.
#[derive(Debug, Clone)]
pub struct AttachmentRepository {
    db: DatabaseConnection,
}

impl AttachmentRepository {
    /// Creates a new attachment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists an owner's attachments ordered by file index.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner does not exist or the query fails.
    pub async fn list_for_owner(
        &self,
        owner: OwnerRef,
    ) -> Result<Vec<attachments::Model>, AttachmentError> {
        if !self.owner_exists(owner).await? {
            return Err(AttachmentError::OwnerNotFound(owner.id));
        }

        attachments::Entity::find()
            .filter(attachments::Column::OwnerKind.eq(AttachmentOwner::from(owner.kind)))
            .filter(attachments::Column::OwnerId.eq(owner.id))
            .order_by_asc(attachments::Column::FileIndex)
            .all(&self.db)
            .await
            .map_err(AttachmentError::from)
    }

    /// Stores a document for an invoice and returns its metadata row.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice does not exist or persisting fails.
    pub async fn add_to_invoice(
        &self,
        files: &FileStore,
        invoice_id: Uuid,
        file: IncomingFile,
        uploaded_by: Uuid,
        received_on: NaiveDate,
    ) -> Result<attachments::Model, AttachmentError> {
        let txn = self.db.begin().await?;

        // The exclusive lock serializes concurrent uploads to one invoice,
        // so max+1 below cannot be observed twice.
        let invoice = invoices::Entity::find_by_id(invoice_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AttachmentError::OwnerNotFound(invoice_id))?;

        let index = Self::next_index(&txn, AttachmentOwner::Invoice, invoice_id).await?;
        let name = naming::invoice_file_name(
            invoice.fiscal_year,
            invoice.sequence_number,
            &file.original_name,
            received_on,
            index,
        );
        let key = format!("{}/{name}", naming::invoice_dir(invoice.fiscal_year));

        let meta = Self::insert_row(
            &txn,
            AttachmentOwner::Invoice,
            invoice_id,
            index,
            &key,
            &file.original_name,
            false,
            uploaded_by,
        )
        .await?;

        files.write(&key, file.bytes).await?;
        Self::commit_or_clean(txn, files, &key).await?;
        Ok(meta)
    }

    /// Stores a document for an expense account. Generated documents land
    /// under the `generated/` subfolder with their deterministic name.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or persisting fails.
    pub async fn add_to_expense_account(
        &self,
        files: &FileStore,
        account_id: Uuid,
        file: IncomingFile,
        uploaded_by: Uuid,
        generated: bool,
        received_on: NaiveDate,
    ) -> Result<attachments::Model, AttachmentError> {
        let txn = self.db.begin().await?;

        let account = expense_accounts::Entity::find_by_id(account_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AttachmentError::OwnerNotFound(account_id))?;

        let index = Self::next_index(&txn, AttachmentOwner::ExpenseAccount, account_id).await?;
        let key = if generated {
            format!(
                "{}/{}",
                naming::generated_dir(account.fiscal_year),
                naming::generated_pdf_name(&account.cid, received_on),
            )
        } else {
            format!(
                "{}/{}",
                naming::expense_account_dir(account.fiscal_year),
                naming::expense_account_file_name(
                    &account.cid,
                    &account.requester_name,
                    &file.original_name,
                    index,
                ),
            )
        };

        let meta = Self::insert_row(
            &txn,
            AttachmentOwner::ExpenseAccount,
            account_id,
            index,
            &key,
            &file.original_name,
            generated,
            uploaded_by,
        )
        .await?;

        files.write(&key, file.bytes).await?;
        Self::commit_or_clean(txn, files, &key).await?;
        Ok(meta)
    }

    /// Fetches an attachment's metadata and bytes.
    ///
    /// A row whose bytes are missing is healed on the spot: its stored path
    /// is cleared and the attachment reported unavailable. The row itself
    /// survives as the audit trail.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner or attachment is absent, the bytes are
    /// unavailable, or an access fails.
    pub async fn open(
        &self,
        files: &FileStore,
        owner: OwnerRef,
        file_index: i32,
    ) -> Result<(attachments::Model, Bytes), AttachmentError> {
        if !self.owner_exists(owner).await? {
            return Err(AttachmentError::OwnerNotFound(owner.id));
        }

        let meta = attachments::Entity::find()
            .filter(attachments::Column::OwnerKind.eq(AttachmentOwner::from(owner.kind)))
            .filter(attachments::Column::OwnerId.eq(owner.id))
            .filter(attachments::Column::FileIndex.eq(file_index))
            .one(&self.db)
            .await?
            .ok_or(AttachmentError::NotFound {
                owner_id: owner.id,
                file_index,
            })?;

        let Some(key) = meta.stored_path.clone() else {
            return Err(AttachmentError::Unavailable {
                owner_id: owner.id,
                file_index,
            });
        };

        match files.read(&key).await {
            Ok(bytes) => Ok((meta, bytes)),
            Err(err) if err.is_not_found() => {
                tracing::warn!(
                    key = %key,
                    owner_id = %owner.id,
                    file_index,
                    "stored file missing, clearing its path"
                );
                let mut row: attachments::ActiveModel = meta.into();
                row.stored_path = Set(None);
                row.update(&self.db).await?;
                Err(AttachmentError::Unavailable {
                    owner_id: owner.id,
                    file_index,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Collects an owner's stored paths and deletes its rows, on the
    /// caller's transaction. The caller unlinks the returned paths after
    /// its commit succeeds.
    pub(crate) async fn delete_rows_for_owner(
        txn: &DatabaseTransaction,
        owner_kind: AttachmentOwner,
        owner_id: Uuid,
    ) -> Result<Vec<String>, DbErr> {
        let paths = attachments::Entity::find()
            .filter(attachments::Column::OwnerKind.eq(owner_kind))
            .filter(attachments::Column::OwnerId.eq(owner_id))
            .all(txn)
            .await?
            .into_iter()
            .filter_map(|a| a.stored_path)
            .collect();

        attachments::Entity::delete_many()
            .filter(attachments::Column::OwnerKind.eq(owner_kind))
            .filter(attachments::Column::OwnerId.eq(owner_id))
            .exec(txn)
            .await?;

        Ok(paths)
    }

    /// Unlinks stored files after their rows are gone. Failures are logged
    /// and never propagate: the rows have already been deleted, and a
    /// leftover file is preferable to a failed deletion.
    pub(crate) async fn unlink_files(files: &FileStore, paths: &[String]) {
        for key in paths {
            if let Err(err) = files.delete(key).await {
                tracing::warn!(key = %key, error = %err, "failed to remove stored file after row deletion");
            }
        }
    }

    async fn owner_exists(&self, owner: OwnerRef) -> Result<bool, DbErr> {
        let found = match owner.kind {
            OwnerKind::Invoice => invoices::Entity::find_by_id(owner.id)
                .one(&self.db)
                .await?
                .is_some(),
            OwnerKind::ExpenseAccount => expense_accounts::Entity::find_by_id(owner.id)
                .one(&self.db)
                .await?
                .is_some(),
        };
        Ok(found)
    }

    async fn next_index<C: ConnectionTrait>(
        conn: &C,
        owner_kind: AttachmentOwner,
        owner_id: Uuid,
    ) -> Result<i32, DbErr> {
        let last = attachments::Entity::find()
            .filter(attachments::Column::OwnerKind.eq(owner_kind))
            .filter(attachments::Column::OwnerId.eq(owner_id))
            .order_by_desc(attachments::Column::FileIndex)
            .one(conn)
            .await?;
        Ok(last.map_or(0, |a| a.file_index) + 1)
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_row(
        txn: &DatabaseTransaction,
        owner_kind: AttachmentOwner,
        owner_id: Uuid,
        file_index: i32,
        stored_path: &str,
        original_name: &str,
        generated: bool,
        uploaded_by: Uuid,
    ) -> Result<attachments::Model, DbErr> {
        attachments::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_kind: Set(owner_kind),
            owner_id: Set(owner_id),
            file_index: Set(file_index),
            stored_path: Set(Some(stored_path.to_string())),
            original_name: Set(original_name.to_string()),
            generated: Set(generated),
            uploaded_by: Set(uploaded_by),
            uploaded_at: Set(chrono::Utc::now().into()),
        }
        .insert(txn)
        .await
    }

    async fn commit_or_clean(
        txn: DatabaseTransaction,
        files: &FileStore,
        key: &str,
    ) -> Result<(), AttachmentError> {
        if let Err(err) = txn.commit().await {
            // The bytes were already written; without their row they must go.
            if let Err(cleanup) = files.delete(key).await {
                tracing::warn!(key = %key, error = %cleanup, "failed to remove file after commit failure");
            }
            return Err(err.into());
        }
        Ok(())
    }
}

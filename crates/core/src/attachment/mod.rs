//! Attachment domain: owner identity and deterministic name derivation.
//!
//! Attachments hang off invoices and expense accounts through one shared
//! vocabulary. Stored filenames and directories are pure functions of the
//! owning resource, so the same inputs always land on the same storage key.

mod naming;
mod types;

pub use naming::{
    expense_account_cid, expense_account_dir, expense_account_file_name, file_extension,
    generated_dir, generated_pdf_name, invoice_dir, invoice_file_name, slug, FALLBACK_SLUG,
    SLUG_MAX_LEN,
};
pub use types::{IncomingFile, OwnerKind, OwnerRef, UnknownOwnerKind};

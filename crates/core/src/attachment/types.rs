//! Owner identity for stored documents.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Raised when a stored owner discriminant is not one we know.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown attachment owner kind: {0}")]
pub struct UnknownOwnerKind(pub String);

/// Which resource a stored document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    Invoice,
    ExpenseAccount,
}

impl OwnerKind {
    /// Stable string form, used as the database discriminant.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::ExpenseAccount => "expense_account",
        }
    }

    /// Top-level directory this owner's documents live under.
    #[must_use]
    pub const fn dir_segment(&self) -> &'static str {
        match self {
            Self::Invoice => "invoices",
            Self::ExpenseAccount => "expense_accounts",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OwnerKind {
    type Err = UnknownOwnerKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invoice" => Ok(Self::Invoice),
            "expense_account" => Ok(Self::ExpenseAccount),
            other => Err(UnknownOwnerKind(other.to_string())),
        }
    }
}

/// A concrete owner: kind plus row identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerRef {
    pub kind: OwnerKind,
    pub id: Uuid,
}

impl OwnerRef {
    #[must_use]
    pub const fn invoice(id: Uuid) -> Self {
        Self {
            kind: OwnerKind::Invoice,
            id,
        }
    }

    #[must_use]
    pub const fn expense_account(id: Uuid) -> Self {
        Self {
            kind: OwnerKind::ExpenseAccount,
            id,
        }
    }
}

/// An uploaded file as received from the client, before any stored name
/// exists for it.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Filename as the client sent it. Only its slug and extension survive
    /// into the stored name.
    pub original_name: String,
    pub bytes: Bytes,
}

impl IncomingFile {
    pub fn new(original_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            original_name: original_name.into(),
            bytes: bytes.into(),
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_kind_string_round_trip() {
        for kind in [OwnerKind::Invoice, OwnerKind::ExpenseAccount] {
            assert_eq!(kind.as_str().parse::<OwnerKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_owner_kind_is_rejected() {
        let err = "budget".parse::<OwnerKind>().unwrap_err();
        assert_eq!(err, UnknownOwnerKind("budget".to_string()));
    }

    #[test]
    fn owner_kind_serializes_snake_case() {
        let json = serde_json::to_string(&OwnerKind::ExpenseAccount).unwrap();
        assert_eq!(json, r#""expense_account""#);
    }

    #[test]
    fn incoming_file_reports_size() {
        let file = IncomingFile::new("scan.pdf", &b"%PDF-1.7"[..]);
        assert_eq!(file.size(), 8);
        assert!(!file.is_empty());
    }
}

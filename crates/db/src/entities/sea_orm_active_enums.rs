//! Database enum types shared by the entities.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invoice_status")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "paid")]
    Paid,
}

/// How an expense account assigns fund codes to its invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "expense_account_mode")]
#[serde(rename_all = "snake_case")]
pub enum ExpenseAccountMode {
    /// One shared code, copied onto every linked invoice by apply-code.
    #[sea_orm(string_value = "global_code")]
    GlobalCode,
    /// Each linked invoice carries its own code.
    #[sea_orm(string_value = "distinct_code")]
    DistinctCode,
}

/// Which resource family an attachment row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attachment_owner")]
#[serde(rename_all = "snake_case")]
pub enum AttachmentOwner {
    #[sea_orm(string_value = "invoice")]
    Invoice,
    #[sea_orm(string_value = "expense_account")]
    ExpenseAccount,
}

impl From<tresorerie_core::attachment::OwnerKind> for AttachmentOwner {
    fn from(kind: tresorerie_core::attachment::OwnerKind) -> Self {
        match kind {
            tresorerie_core::attachment::OwnerKind::Invoice => Self::Invoice,
            tresorerie_core::attachment::OwnerKind::ExpenseAccount => Self::ExpenseAccount,
        }
    }
}

//! `SeaORM` Entity for the expense_accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ExpenseAccountMode;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Public identifier, e.g. `C2025-HABITEK007`. Derived once at creation
    /// from the fiscal year and sequence number, then immutable.
    #[sea_orm(unique)]
    pub cid: String,
    pub fiscal_year: i32,
    pub sequence_number: i64,
    pub mode: ExpenseAccountMode,
    /// Present whenever `mode` is `global_code`; the migration enforces it.
    pub global_code: Option<String>,
    pub requester_name: String,
    pub submitted_date: Date,
    pub created_by: Uuid,
    pub modified_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoices::Entity")]
    Invoices,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

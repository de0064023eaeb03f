//! `SeaORM` Entity for the invoices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::InvoiceStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub fiscal_year: i32,
    /// Public identifier within the fiscal year, issued by the sequence
    /// counter in the same transaction as this row.
    pub sequence_number: i64,
    pub issue_date: Date,
    pub supplier: String,
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    pub currency: String,
    pub status: InvoiceStatus,
    pub code: Option<String>,
    pub expense_account_id: Option<Uuid>,
    pub submitted_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub modified_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expense_accounts::Entity",
        from = "Column::ExpenseAccountId",
        to = "super::expense_accounts::Column::Id"
    )]
    ExpenseAccounts,
}

impl Related<super::expense_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

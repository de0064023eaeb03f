//! `SeaORM` entity definitions.

pub mod attachments;
pub mod budget_lines;
pub mod expense_accounts;
pub mod invoices;
pub mod sea_orm_active_enums;
pub mod sequence_counters;
pub mod users;

//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions that own all transactional logic
//! - Database migrations
//!
//! Rows are the source of truth; stored files follow them. Repositories that
//! touch both always commit metadata first and reconcile bytes afterwards.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    AttachmentRepository, BudgetRepository, ExpenseAccountRepository, InvoiceRepository,
    SequenceIssuer, UserRepository,
};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(max_connections)
        .min_connections(min_connections);
    Database::connect(options).await
}

//! Budget line repository.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use crate::entities::budget_lines;

/// Error types for budget line operations.
#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    /// Budget line not found.
    #[error("budget line not found: {0}")]
    NotFound(Uuid),

    /// A line with the same (fiscal year, fund type, revenue type) exists.
    #[error("budget line already exists for {fund_type}/{revenue_type} in fiscal year {fiscal_year}")]
    DuplicateLine {
        fiscal_year: i32,
        fund_type: String,
        revenue_type: String,
    },

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a budget line.
#[derive(Debug, Clone)]
pub struct CreateBudgetLineInput {
    pub fiscal_year: i32,
    pub fund_type: String,
    pub revenue_type: String,
    pub label: Option<String>,
    pub amount: Decimal,
    pub created_by: Uuid,
}

/// Input for updating a budget line. `None` leaves the field untouched;
/// `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct UpdateBudgetLineInput {
    pub fund_type: Option<String>,
    pub revenue_type: Option<String>,
    pub label: Option<Option<String>>,
    pub amount: Option<Decimal>,
}

/// List filters. All are conjunctive; `contains` matches a case-insensitive
/// substring of fund type, revenue type, or label.
#[derive(Debug, Clone, Default)]
pub struct BudgetFilter {
    pub fiscal_year: Option<i32>,
    pub fund_type: Option<String>,
    pub revenue_type: Option<String>,
    pub contains: Option<String>,
}

/// Budget line repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a budget line. The natural key (fiscal year, fund type,
    /// revenue type) must be free.
    ///
    /// # Errors
    ///
    /// Returns an error if the natural key is taken or the insert fails.
    pub async fn create(
        &self,
        input: CreateBudgetLineInput,
    ) -> Result<budget_lines::Model, BudgetError> {
        let duplicate = || BudgetError::DuplicateLine {
            fiscal_year: input.fiscal_year,
            fund_type: input.fund_type.clone(),
            revenue_type: input.revenue_type.clone(),
        };

        let existing = budget_lines::Entity::find()
            .filter(budget_lines::Column::FiscalYear.eq(input.fiscal_year))
            .filter(budget_lines::Column::FundType.eq(&input.fund_type))
            .filter(budget_lines::Column::RevenueType.eq(&input.revenue_type))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(duplicate());
        }

        let now = Utc::now().into();
        let line = budget_lines::ActiveModel {
            id: Set(Uuid::new_v4()),
            fiscal_year: Set(input.fiscal_year),
            fund_type: Set(input.fund_type.clone()),
            revenue_type: Set(input.revenue_type.clone()),
            label: Set(input.label),
            amount: Set(input.amount),
            created_by: Set(input.created_by),
            modified_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // The unique constraint backstops a concurrent create of the same key.
        line.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => duplicate(),
            _ => BudgetError::Database(e),
        })
    }

    /// Gets a budget line by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<budget_lines::Model>, BudgetError> {
        budget_lines::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(BudgetError::from)
    }

    /// Lists budget lines matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: BudgetFilter) -> Result<Vec<budget_lines::Model>, BudgetError> {
        let mut query = budget_lines::Entity::find();

        if let Some(fiscal_year) = filter.fiscal_year {
            query = query.filter(budget_lines::Column::FiscalYear.eq(fiscal_year));
        }
        if let Some(fund_type) = filter.fund_type {
            query = query.filter(budget_lines::Column::FundType.eq(fund_type));
        }
        if let Some(revenue_type) = filter.revenue_type {
            query = query.filter(budget_lines::Column::RevenueType.eq(revenue_type));
        }
        if let Some(needle) = filter.contains {
            let pattern = format!("%{needle}%");
            query = query.filter(
                Condition::any()
                    .add(Expr::col(budget_lines::Column::FundType).ilike(pattern.clone()))
                    .add(Expr::col(budget_lines::Column::RevenueType).ilike(pattern.clone()))
                    .add(Expr::col(budget_lines::Column::Label).ilike(pattern)),
            );
        }

        query
            .order_by_desc(budget_lines::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(BudgetError::from)
    }

    /// Applies the allowed fields to a budget line. A natural-key change
    /// that collides with another line is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not exist, the new key collides,
    /// or the update fails.
    pub async fn update(
        &self,
        id: Uuid,
        caller: Uuid,
        input: UpdateBudgetLineInput,
    ) -> Result<budget_lines::Model, BudgetError> {
        let line = self
            .find_by_id(id)
            .await?
            .ok_or(BudgetError::NotFound(id))?;

        let fiscal_year = line.fiscal_year;
        let fund_type = input.fund_type.clone().unwrap_or_else(|| line.fund_type.clone());
        let revenue_type = input
            .revenue_type
            .clone()
            .unwrap_or_else(|| line.revenue_type.clone());

        let mut active: budget_lines::ActiveModel = line.into();
        if let Some(v) = input.fund_type {
            active.fund_type = Set(v);
        }
        if let Some(v) = input.revenue_type {
            active.revenue_type = Set(v);
        }
        if let Some(v) = input.label {
            active.label = Set(v);
        }
        if let Some(v) = input.amount {
            active.amount = Set(v);
        }
        active.modified_by = Set(Some(caller));
        active.updated_at = Set(Utc::now().into());

        active.update(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => BudgetError::DuplicateLine {
                fiscal_year,
                fund_type,
                revenue_type,
            },
            _ => BudgetError::Database(e),
        })
    }

    /// Deletes a budget line and returns the removed row.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not exist or the delete fails.
    pub async fn delete(&self, id: Uuid) -> Result<budget_lines::Model, BudgetError> {
        let line = self
            .find_by_id(id)
            .await?
            .ok_or(BudgetError::NotFound(id))?;

        budget_lines::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(line)
    }
}

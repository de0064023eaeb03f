//! User repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use tresorerie_shared::auth::{format_role_list, Role};
use uuid::Uuid;

use crate::entities::users;

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// User not found.
    #[error("user not found: {0}")]
    NotFound(Uuid),

    /// Email is already registered.
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    /// User still owns financial records and cannot be removed.
    #[error("user {0} is referenced by existing records")]
    InUse(Uuid),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for updating a user. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub full_name: Option<String>,
    pub roles: Option<Vec<Role>>,
    pub is_active: Option<bool>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, UserError> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(UserError::from)
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, UserError> {
        users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(UserError::from)
    }

    /// Lists all users, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<users::Model>, UserError> {
        users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(UserError::from)
    }

    /// Creates a new user. The email is a natural key; a duplicate is
    /// reported as [`UserError::DuplicateEmail`].
    ///
    /// # Errors
    ///
    /// Returns an error if the email is taken or the insert fails.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        full_name: &str,
        roles: &[Role],
    ) -> Result<users::Model, UserError> {
        if self.email_exists(email).await? {
            return Err(UserError::DuplicateEmail(email.to_string()));
        }

        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            full_name: Set(full_name.to_string()),
            roles: Set(format_role_list(roles)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // The unique constraint is the backstop for a concurrent register
        // with the same email.
        user.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                UserError::DuplicateEmail(email.to_string())
            }
            _ => UserError::Database(e),
        })
    }

    /// Applies the allowed profile fields to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the update fails.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateUserInput,
    ) -> Result<users::Model, UserError> {
        let user = self.find_by_id(id).await?.ok_or(UserError::NotFound(id))?;

        let mut user: users::ActiveModel = user.into();
        if let Some(full_name) = input.full_name {
            user.full_name = Set(full_name);
        }
        if let Some(roles) = input.roles {
            user.roles = Set(format_role_list(&roles));
        }
        if let Some(is_active) = input.is_active {
            user.is_active = Set(is_active);
        }
        user.updated_at = Set(Utc::now().into());

        user.update(&self.db).await.map_err(UserError::from)
    }

    /// Replaces a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the update fails.
    pub async fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<users::Model, UserError> {
        let user = self.find_by_id(id).await?.ok_or(UserError::NotFound(id))?;

        let mut user: users::ActiveModel = user.into();
        user.password_hash = Set(password_hash.to_string());
        user.updated_at = Set(Utc::now().into());

        user.update(&self.db).await.map_err(UserError::from)
    }

    /// Deletes a user. A user referenced by invoices, expense accounts,
    /// budget lines, or attachments is reported as [`UserError::InUse`].
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or is still referenced.
    pub async fn delete(&self, id: Uuid) -> Result<users::Model, UserError> {
        let user = self.find_by_id(id).await?.ok_or(UserError::NotFound(id))?;

        users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => UserError::InUse(id),
                _ => UserError::Database(e),
            })?;

        Ok(user)
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, UserError> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}

//! Request middleware and extractors.

pub mod auth;

pub use auth::{auth_middleware, AnyStaff, AuthUser, Gated, ManagerOnly, Reviewers, RolePolicy};

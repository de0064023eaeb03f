//! Shared types, errors, and configuration for Tresorerie.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy
//! - Roles, JWT claims, and auth request/response types
//! - JWT token service
//! - Configuration management

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;

pub use auth::{Claims, Role};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtError, JwtService};

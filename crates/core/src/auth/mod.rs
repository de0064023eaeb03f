//! Credential handling.
//!
//! Only the password hashing boundary lives here. Token minting and
//! validation sit in `tresorerie-shared` so every crate agrees on the claim
//! layout without pulling domain logic into the middleware.

mod password;

pub use password::{hash_password, verify_password, PasswordError};

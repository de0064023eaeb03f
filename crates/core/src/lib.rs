//! Domain logic for Tresorerie.
//!
//! This crate is persistence-agnostic: it knows about the fiscal calendar,
//! attachment naming and custody, password hashing, change events, and input
//! validation, but never about HTTP or SQL. The `db` and `api` crates compose
//! these pieces.

pub mod attachment;
pub mod auth;
pub mod events;
pub mod fiscal;
pub mod storage;
pub mod validate;

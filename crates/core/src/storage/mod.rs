//! File custody on the local filesystem, behind Apache OpenDAL.
//!
//! Database rows are authoritative; bytes on disk follow them. The store
//! never invents keys, it only honors the ones derived in
//! [`crate::attachment`].

mod error;
mod service;

pub use error::StorageError;
pub use service::FileStore;

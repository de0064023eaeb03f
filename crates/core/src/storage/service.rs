//! File store implementation over Apache OpenDAL.

use bytes::Bytes;
use opendal::{services, ErrorKind, Operator};

use super::error::StorageError;

/// Byte custody rooted at a single directory on the local filesystem.
///
/// Keys are relative, forward-slash paths such as
/// `invoices/2025/Habitek_2025-7_scan_20250903_01.pdf`; the root never
/// appears in a key. Cloning is cheap, the operator is shared.
#[derive(Debug, Clone)]
pub struct FileStore {
    operator: Operator,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory lazily on
    /// first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the filesystem backend cannot be initialized.
    pub fn new_fs(root: &str) -> Result<Self, StorageError> {
        let builder = services::Fs::default().root(root);
        let operator = Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();
        Ok(Self { operator })
    }

    /// Writes `bytes` under `key`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write(&self, key: &str, bytes: Bytes) -> Result<(), StorageError> {
        self.operator
            .write(key, bytes)
            .await
            .map(|_| ())
            .map_err(StorageError::from)
    }

    /// Reads the full content stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] carrying `key` when nothing is
    /// stored there, so callers can reconcile stale metadata.
    pub async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        let buffer = self
            .operator
            .read(key)
            .await
            .map_err(|e| Self::keyed(key, e))?;
        Ok(buffer.to_bytes())
    }

    /// Removes the content under `key`. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Whether any bytes live under `key`.
    pub async fn exists(&self, key: &str) -> bool {
        self.operator.stat(key).await.is_ok()
    }

    fn keyed(key: &str, err: opendal::Error) -> StorageError {
        if err.kind() == ErrorKind::NotFound {
            StorageError::not_found(key)
        } else {
            StorageError::operation(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (FileStore, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("tresorerie-store-{}", uuid::Uuid::new_v4()));
        let store = FileStore::new_fs(dir.to_str().unwrap()).unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn write_read_delete_cycle() {
        let (store, dir) = temp_store();

        let key = "invoices/2025/Habitek_2025-1_scan_20250903_01.pdf";
        store.write(key, Bytes::from_static(b"%PDF-1.7")).await.unwrap();
        assert!(store.exists(key).await);
        assert_eq!(store.read(key).await.unwrap(), Bytes::from_static(b"%PDF-1.7"));

        store.delete(key).await.unwrap();
        assert!(!store.exists(key).await);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn reading_an_absent_key_reports_not_found_with_the_key() {
        let (store, dir) = temp_store();

        let err = store.read("invoices/2025/missing.pdf").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("invoices/2025/missing.pdf"));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn deleting_an_absent_key_is_not_an_error() {
        let (store, dir) = temp_store();
        store.delete("nothing/here.pdf").await.unwrap();
        let _ = std::fs::remove_dir_all(dir);
    }
}

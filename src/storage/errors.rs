use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage error: user id is empty")]
    EmptyUserId
}

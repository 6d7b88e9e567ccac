mod errors;
mod transaction_storage;

use crate::models::TransactionRecord;

pub use errors::StorageError;
pub use transaction_storage::MemoryTransactionStore;

/// Persistence of extracted records, unique per `(user, transaction_id)`.
pub trait TransactionStore: Send + Sync + 'static {
    /// Stores records not yet known for `user_id` and returns how many were new.
    fn save(&self, user_id: &str, records: &[TransactionRecord]) -> Result<usize, StorageError>;
    /// Records of `user_id`, oldest first.
    fn read(&self, user_id: &str) -> Result<Vec<TransactionRecord>, StorageError>;
    /// Removes every record of `user_id` and returns how many were removed.
    fn clear(&self, user_id: &str) -> Result<usize, StorageError>;
}

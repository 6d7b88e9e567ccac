use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::models::TransactionRecord;
use crate::storage::{StorageError, TransactionStore};
use crate::types::{MessageId, UserId};

#[derive(Debug, Clone, Default)]
pub struct MemoryTransactionStore {
    records: Arc<DashMap<(UserId, MessageId), TransactionRecord>>
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new())
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn check_user(user_id: &str) -> Result<(), StorageError> {
    if user_id.trim().is_empty() {
        return Err(StorageError::EmptyUserId)
    }

    Ok(())
}

impl TransactionStore for MemoryTransactionStore {
    fn save(&self, user_id: &str, records: &[TransactionRecord]) -> Result<usize, StorageError> {
        check_user(user_id)?;

        let mut saved = 0;

        for record in records {
            if let Entry::Vacant(entry) = self.records.entry((user_id.to_string(), record.transaction_id.clone())) {
                entry.insert(record.clone());
                saved += 1;
            }
        }

        Ok(saved)
    }

    fn read(&self, user_id: &str) -> Result<Vec<TransactionRecord>, StorageError> {
        check_user(user_id)?;

        let mut records: Vec<TransactionRecord> = self.records.iter()
            .filter(|item| item.key().0 == user_id)
            .map(|item| item.value().clone())
            .collect();

        records.sort_by(|left, right| {
            left.transaction_date.cmp(&right.transaction_date)
                .then_with(|| left.transaction_id.cmp(&right.transaction_id))
        });

        Ok(records)
    }

    fn clear(&self, user_id: &str) -> Result<usize, StorageError> {
        check_user(user_id)?;

        let keys: Vec<(UserId, MessageId)> = self.records.iter()
            .filter(|item| item.key().0 == user_id)
            .map(|item| item.key().clone())
            .collect();

        Ok(keys.iter().filter(|key| self.records.remove(*key).is_some()).count())
    }
}

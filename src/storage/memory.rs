use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::Storage;
use crate::models::PasteRecord;

/// Process-local store, shared between clones.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    records: Arc<RwLock<HashMap<String, PasteRecord>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Storage for MemoryStorage {
    async fn get_record(&self, id: &str) -> crate::AppResult<Option<PasteRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn put_record(&self, record: &PasteRecord) -> crate::AppResult<()> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }
}

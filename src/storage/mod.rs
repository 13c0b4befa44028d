use tracing::{error, info};

use crate::models::PasteRecord;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;
pub mod file;
pub mod memory;

#[allow(async_fn_in_trait)]
pub trait Storage {
    /// Get a record by id, `None` if there is no such item.
    async fn get_record(&self, id: &str) -> crate::AppResult<Option<PasteRecord>>;

    /// Write a full record, replacing any record with the same id.
    async fn put_record(&self, record: &PasteRecord) -> crate::AppResult<()>;

    /// Fail early when the backend is missing required settings.
    fn check_config(&self) -> crate::AppResult<()> {
        Ok(())
    }
}

#[derive(Clone)]
pub enum AnyStorage {
    #[cfg(feature = "dynamodb")]
    DynamoDb(dynamodb::DynamoDbStorage),
    File(file::FileStorage),
    Memory(memory::MemoryStorage),
}

impl Storage for AnyStorage {
    async fn get_record(&self, id: &str) -> crate::AppResult<Option<PasteRecord>> {
        match self {
            #[cfg(feature = "dynamodb")]
            AnyStorage::DynamoDb(dynamodb) => dynamodb.get_record(id).await,
            AnyStorage::File(file) => file.get_record(id).await,
            AnyStorage::Memory(memory) => memory.get_record(id).await,
        }
    }

    async fn put_record(&self, record: &PasteRecord) -> crate::AppResult<()> {
        match self {
            #[cfg(feature = "dynamodb")]
            AnyStorage::DynamoDb(dynamodb) => dynamodb.put_record(record).await,
            AnyStorage::File(file) => file.put_record(record).await,
            AnyStorage::Memory(memory) => memory.put_record(record).await,
        }
    }

    fn check_config(&self) -> crate::AppResult<()> {
        match self {
            #[cfg(feature = "dynamodb")]
            AnyStorage::DynamoDb(dynamodb) => dynamodb.check_config(),
            AnyStorage::File(file) => file.check_config(),
            AnyStorage::Memory(memory) => memory.check_config(),
        }
    }
}

#[cfg(feature = "dynamodb")]
impl From<dynamodb::DynamoDbStorage> for AnyStorage {
    fn from(value: dynamodb::DynamoDbStorage) -> Self {
        AnyStorage::DynamoDb(value)
    }
}

impl From<file::FileStorage> for AnyStorage {
    fn from(value: file::FileStorage) -> Self {
        AnyStorage::File(value)
    }
}

impl From<memory::MemoryStorage> for AnyStorage {
    fn from(value: memory::MemoryStorage) -> Self {
        AnyStorage::Memory(value)
    }
}

/// The handlers' view of a backend. Failures are logged here and never reach
/// the caller: reads degrade to "absent", writes to `false`.
#[derive(Clone)]
pub struct RecordStore<S = AnyStorage> {
    storage: S,
}

impl<S: Storage> RecordStore<S> {
    pub fn new(storage: S) -> Self {
        RecordStore { storage }
    }

    pub fn check_config(&self) -> crate::AppResult<()> {
        self.storage.check_config()
    }

    pub async fn get(&self, id: &str) -> Option<PasteRecord> {
        match self.storage.get_record(id).await {
            Ok(record) => record,
            Err(err) => {
                error!(id, error = ?err, "lookup failed, treating as not found");
                None
            }
        }
    }

    pub async fn put(&self, record: &PasteRecord) -> bool {
        match self.storage.put_record(record).await {
            Ok(()) => {
                info!(id = %record.id, size = record.paste.len(), "record stored");
                true
            }
            Err(err) => {
                error!(id = %record.id, error = ?err, "could not store record");
                false
            }
        }
    }
}

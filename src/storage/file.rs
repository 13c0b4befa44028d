use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::bail;
use tokio::fs;

use super::Storage;
use crate::error::AppError;
use crate::models::PasteRecord;

/// One JSON document per record, named `<id>.json`.
#[derive(Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub async fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir: PathBuf = dir.into();

        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
        }

        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }

        Ok(FileStorage { dir })
    }

    fn path_for(&self, id: &str) -> crate::AppResult<PathBuf> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::InvalidId { id: id.to_owned() });
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

impl Storage for FileStorage {
    async fn get_record(&self, id: &str) -> crate::AppResult<Option<PasteRecord>> {
        let path = self.path_for(id)?;

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let record = serde_json::from_slice(&data).map_err(|source| AppError::CorruptRecord {
            id: id.to_owned(),
            source,
        })?;
        Ok(Some(record))
    }

    async fn put_record(&self, record: &PasteRecord) -> crate::AppResult<()> {
        let path = self.path_for(&record.id)?;
        let data = serde_json::to_vec(record).map_err(|source| AppError::EncodeRecord {
            id: record.id.clone(),
            source,
        })?;

        // write then rename so a reader never sees a partial record
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &data).await?;
        fs::rename(&tmp, &path).await?;

        Ok(())
    }
}

use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("table name is not configured (set storage.dynamodb.table or TABLE_NAME)")]
    MissingTableName,
    #[error("request has no body")]
    MissingBody,
    #[error("request body is not valid UTF-8")]
    InvalidUtf8 {
        #[from]
        source: std::string::FromUtf8Error,
    },
    #[error("malformed JSON body")]
    MalformedJson { source: serde_json::Error },
    #[error("invalid paste id {id:?}")]
    InvalidId { id: String },
    #[error("table {table} was not found")]
    TableNotFound { table: String },
    #[error("record {id} is missing attribute {attribute}")]
    IncompleteRecord { id: String, attribute: &'static str },
    #[error("could not encode record {id}")]
    EncodeRecord { id: String, source: serde_json::Error },
    #[error("stored record {id} is corrupt")]
    CorruptRecord { id: String, source: serde_json::Error },
    #[error("IO error")]
    IO {
        #[from]
        source: std::io::Error,
    },
    #[error("dynamodb error")]
    #[cfg(feature = "dynamodb")]
    DynamoDb {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl AppError {
    /// Stable code sent to clients instead of the error text.
    ///
    /// Storage errors never get here: `RecordStore` logs them and degrades.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingTableName => "misconfiguration",
            AppError::MissingBody | AppError::InvalidUtf8 { .. } | AppError::MalformedJson { .. } => {
                "malformed_request"
            }
            _ => "internal_error",
        }
    }
}

#[cfg(feature = "dynamodb")]
impl<E, R> From<aws_sdk_dynamodb::error::SdkError<E, R>> for AppError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    fn from(source: aws_sdk_dynamodb::error::SdkError<E, R>) -> Self {
        AppError::DynamoDb {
            source: Box::new(source),
        }
    }
}

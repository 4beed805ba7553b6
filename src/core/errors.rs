use thiserror::Error;

#[derive(Error, Debug)]
pub enum AbecedaryError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage backend unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Malformed local data in {key}")]
    MalformedLocalData { key: String },

    #[error("AbecedaryError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for AbecedaryError {
    fn from(error: std::io::Error) -> Self {
        AbecedaryError::Io(Box::new(error))
    }
}

// Transport failures and backend refusals are the same condition for callers:
// the durable store cannot be used right now, keep the in-memory state as is.
impl From<reqwest::Error> for AbecedaryError {
    fn from(error: reqwest::Error) -> Self {
        AbecedaryError::StorageUnavailable(error.to_string())
    }
}

impl AbecedaryError {
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, AbecedaryError::StorageUnavailable(_))
    }
}

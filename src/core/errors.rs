use crate::models::ErrorKind;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid or unreachable URL: {0}")]
    InvalidUrl(String),

    #[error("timed out after {timeout_ms}ms fetching {url}")]
    Timeout { url: String, timeout_ms: u128 },

    #[error("network error: {0}")]
    Network(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::InvalidUrl(_) => ErrorKind::InvalidUrl,
            FetchError::Timeout { .. } => ErrorKind::Timeout,
            FetchError::Network(_) => ErrorKind::NetworkError,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("unrecognized content: {0}")]
    Parse(String),

    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Fetch error: {0}")]
    FetchError(#[from] FetchError),

    #[error("Extraction error: {0}")]
    ExtractionError(#[from] ExtractError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

impl ScraperError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScraperError::FetchError(e) => e.kind(),
            ScraperError::UrlError(_) => ErrorKind::InvalidUrl,
            ScraperError::ExtractionError(_) | ScraperError::JsonError(_) => ErrorKind::ParseError,
            ScraperError::StorageError(_) => ErrorKind::CacheStoreError,
            ScraperError::IoError(_) | ScraperError::CsvError(_) | ScraperError::ConfigError(_) => {
                ErrorKind::InternalError
            }
        }
    }
}

pub type ScraperResult<T> = Result<T, ScraperError>;

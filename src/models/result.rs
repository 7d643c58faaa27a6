use crate::http::RequestKey;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    Timeout,
    NetworkError,
    ParseError,
    CacheStoreError,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidUrl => "invalid_url",
            ErrorKind::Timeout => "timeout",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::CacheStoreError => "cache_store_error",
            ErrorKind::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ScrapeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScrapeOutcome {
    Success { products: Vec<Record> },
    Failure { error: ScrapeError },
}

/// The answer for one target URL: either the extracted records or the reason
/// there are none. Never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    #[serde(rename = "url")]
    pub target: RequestKey,
    #[serde(flatten)]
    pub outcome: ScrapeOutcome,
}

impl ScrapeResult {
    pub fn success(target: RequestKey, records: Vec<Record>) -> Self {
        Self {
            target,
            outcome: ScrapeOutcome::Success { products: records },
        }
    }

    pub fn failure(target: RequestKey, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            target,
            outcome: ScrapeOutcome::Failure {
                error: ScrapeError::new(kind, message),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ScrapeOutcome::Success { .. })
    }

    /// Extracted records; empty for a failure.
    pub fn records(&self) -> &[Record] {
        match &self.outcome {
            ScrapeOutcome::Success { products } => products,
            ScrapeOutcome::Failure { .. } => &[],
        }
    }

    pub fn error(&self) -> Option<&ScrapeError> {
        match &self.outcome {
            ScrapeOutcome::Success { .. } => None,
            ScrapeOutcome::Failure { error } => Some(error),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(|e| e.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(url: &str) -> RequestKey {
        RequestKey::parse(url).unwrap()
    }

    #[test]
    fn test_success_wire_shape() {
        let result = ScrapeResult::success(
            key("https://a.test/list"),
            vec![Record::new("Milk", "10", "9").unwrap()],
        );

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "url": "https://a.test/list",
                "status": "success",
                "products": [{"name": "Milk", "price": "10", "promo_price": "9"}]
            })
        );
    }

    #[test]
    fn test_failure_round_trip() {
        let result = ScrapeResult::failure(key("https://b.test/"), ErrorKind::Timeout, "took too long");
        let encoded = serde_json::to_string(&result).unwrap();
        let decoded: ScrapeResult = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, result);
        assert!(decoded.records().is_empty());
        assert_eq!(decoded.error_kind(), Some(ErrorKind::Timeout));
    }

    #[test]
    fn test_success_round_trip_preserves_strings() {
        let result = ScrapeResult::success(
            key("https://a.test/"),
            vec![
                Record::new("Leche Dos Pinos 1 L", "₡1 250", "₡1 100").unwrap(),
                Record::new("Pan \"integral\"", "5", "5").unwrap(),
            ],
        );
        let decoded: ScrapeResult =
            serde_json::from_str(&serde_json::to_string(&result).unwrap()).unwrap();

        assert_eq!(decoded.records(), result.records());
        assert!(decoded.is_success());
    }
}

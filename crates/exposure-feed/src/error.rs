//! Error types for the exposure feed engine
//!
//! Only conditions that abort a run are errors here. A single malformed row is
//! reported as a [`crate::normalize::RecordRejection`] value and the batch
//! carries on; a corrupt state document is recovered inside
//! [`crate::state::StateStore::load`].

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, FeedError>;

/// The input header does not describe the expected record schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputSchemaError {
    #[error("Input has no header row")]
    MissingHeader,

    #[error("Header mismatch: missing [{}], unexpected [{}]", missing.join(", "), unexpected.join(", "))]
    HeaderMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

/// Fatal errors for a single run
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Input schema error: {0}")]
    Schema(#[from] InputSchemaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("No CSV link matching '{pattern}' found on {url}")]
    CsvLinkNotFound { url: String, pattern: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTML error: {0}")]
    Html(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Common(#[from] exposure_common::CommonError),
}

impl FeedError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTML parsing error
    pub fn html(msg: impl Into<String>) -> Self {
        Self::Html(msg.into())
    }
}

impl From<regex::Error> for FeedError {
    fn from(err: regex::Error) -> Self {
        FeedError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_mismatch_message_lists_labels() {
        let err = InputSchemaError::HeaderMismatch {
            missing: vec!["Date".to_string()],
            unexpected: vec!["Datum".to_string(), "Extra".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Header mismatch: missing [Date], unexpected [Datum, Extra]"
        );
    }
}

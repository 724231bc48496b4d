//! Source fetch errors.

use thiserror::Error;

use spotprice_market_data::{MarketDataError, RetryClass};

/// Typed failure of a [`SourceClient`](super::SourceClient) fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Transport failure, timeout or non-success response.
    ///
    /// The date stays a gap and is retried on the next pass.
    #[error("Fetch from {source_id} failed: {message}")]
    Fetch { source_id: String, message: String },

    /// The payload no longer matches the expected shape.
    #[error("Payload from {source_id} could not be parsed: {message}")]
    Parse { source_id: String, message: String },
}

impl SourceError {
    pub fn fetch(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    pub fn parse(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Classifies a provider error by its retry class.
    pub fn from_market_data(source_id: &str, error: &MarketDataError) -> Self {
        match error.retry_class() {
            RetryClass::NextPass => Self::fetch(source_id, error.to_string()),
            RetryClass::Never => Self::parse(source_id, error.to_string()),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, SourceError::Parse { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            SourceError::Fetch { message, .. } | SourceError::Parse { message, .. } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_provider_errors_become_fetch() {
        let err = MarketDataError::HttpStatus {
            provider: "AWATTAR".to_string(),
            status: 502,
        };
        let mapped = SourceError::from_market_data("awattar", &err);
        assert!(matches!(mapped, SourceError::Fetch { .. }));
        assert_eq!(mapped.message(), "HTTP 502 from AWATTAR");
    }

    #[test]
    fn test_schema_errors_become_parse() {
        let err = MarketDataError::Parse {
            provider: "AWATTAR".to_string(),
            message: "missing field `data`".to_string(),
        };
        assert!(SourceError::from_market_data("awattar", &err).is_parse());
    }
}

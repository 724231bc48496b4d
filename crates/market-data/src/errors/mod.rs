//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all provider operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while fetching spot prices from a provider.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The provider answered with a non-success HTTP status.
    #[error("HTTP {status} from {provider}")]
    HttpStatus {
        /// The provider that returned the status
        provider: String,
        /// The HTTP status code
        status: u16,
    },

    /// The request could not be sent or the body could not be read.
    #[error("Network error: {provider} - {message}")]
    Network {
        /// The provider that was being called
        provider: String,
        /// Description of the transport failure
        message: String,
    },

    /// The payload could not be decoded into the expected shape.
    #[error("Parse error: {provider} - {message}")]
    Parse {
        /// The provider whose payload failed to decode
        provider: String,
        /// Description of the decode failure
        message: String,
    },

}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use spotprice_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "AWATTAR".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::NextPass);
    ///
    /// let error = MarketDataError::Parse {
    ///     provider: "AWATTAR".to_string(),
    ///     message: "missing field `data`".to_string(),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Timeout { .. }
            | Self::RateLimited { .. }
            | Self::HttpStatus { .. }
            | Self::Network { .. } => RetryClass::NextPass,

            Self::Parse { .. } => RetryClass::Never,
        }
    }

    /// Maps a `reqwest` send/read failure for `provider` to a typed error.
    pub(crate) fn from_request(provider: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
            }
        } else if error.is_decode() {
            Self::Parse {
                provider: provider.to_string(),
                message: error.to_string(),
            }
        } else {
            Self::Network {
                provider: provider.to_string(),
                message: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_retries_next_pass() {
        let error = MarketDataError::Timeout {
            provider: "AWATTAR".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextPass);
    }

    #[test]
    fn test_rate_limited_retries_next_pass() {
        let error = MarketDataError::RateLimited {
            provider: "AWATTAR".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextPass);
    }

    #[test]
    fn test_http_status_retries_next_pass() {
        let error = MarketDataError::HttpStatus {
            provider: "SMARTENERGY".to_string(),
            status: 503,
        };
        assert_eq!(error.retry_class(), RetryClass::NextPass);
    }

    #[test]
    fn test_parse_never_retries() {
        let error = MarketDataError::Parse {
            provider: "SMARTENERGY".to_string(),
            message: "invalid type: string, expected f64".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::HttpStatus {
            provider: "AWATTAR".to_string(),
            status: 500,
        };
        assert_eq!(format!("{}", error), "HTTP 500 from AWATTAR");

        let error = MarketDataError::Parse {
            provider: "AWATTAR".to_string(),
            message: "expected array".to_string(),
        };
        assert_eq!(format!("{}", error), "Parse error: AWATTAR - expected array");
    }
}

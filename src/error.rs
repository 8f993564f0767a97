//! Typed errors for the Feenox remote API.
//!
//! Usage errors are raised before any network call. Transport errors carry the
//! HTTP status of the failed exchange. Everything else is plumbing and travels
//! as `anyhow::Error` with context.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by the session manager and the remote client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Window start is older than the remote search horizon.
    #[error("date_from {from} cannot be older than {max_days} days (earliest allowed: {earliest})")]
    WindowTooOld {
        from: NaiveDate,
        earliest: NaiveDate,
        max_days: i64,
    },

    /// Window span is larger than the remote search allows.
    #[error("interval between {from} and {to} cannot be greater than {max_days} days")]
    WindowTooWide {
        from: NaiveDate,
        to: NaiveDate,
        max_days: i64,
    },

    /// Zero or several date axes supplied where the search needs exactly one (or at most one).
    #[error("{0}")]
    AxisSelection(String),

    /// Non-success HTTP status from an identity or API endpoint.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Download response without a usable file name header.
    #[error("download of document {0} did not return an x-filename header")]
    MissingFilename(String),

    /// A session is needed but no credentials source was ever supplied.
    #[error("no credentials source available to authenticate")]
    MissingCredentials,

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// Whether the error was raised by argument validation, before any network call.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::WindowTooOld { .. } | Self::WindowTooWide { .. } | Self::AxisSelection(_)
        )
    }

    /// Build a `Status` error from a failed response, consuming its body.
    pub fn from_response(endpoint: &str, response: reqwest::blocking::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        Self::Status {
            endpoint: endpoint.to_string(),
            status,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_classification() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(ApiError::WindowTooOld {
            from: day,
            earliest: day,
            max_days: 90
        }
        .is_usage());
        assert!(ApiError::AxisSelection("x".into()).is_usage());
        assert!(!ApiError::Status {
            endpoint: "login".into(),
            status: 401,
            body: String::new()
        }
        .is_usage());
        assert!(!ApiError::MissingCredentials.is_usage());
    }
}

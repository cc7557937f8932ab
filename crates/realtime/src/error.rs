//! Fleet dashboard errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = anyhow::Result<T, Error>;

/// Domain level error type shared by the telemetry, tracker, and animation
/// crates.
///
/// None of these are fatal: every boundary converts them into a best-effort
/// value (fallback vehicles, last known detail, placeholder record, or a
/// silent discard).
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Error {
    /// The telemetry source could not be reached (network, DNS, non-success
    /// status).
    #[error("code: source_unreachable, description: {0}")]
    SourceUnreachable(String),

    /// A request to the telemetry source did not complete in time.
    #[error("code: timeout, description: {0}")]
    Timeout(String),

    /// The source answered but the payload is missing expected fields.
    #[error("code: malformed_response, description: {0}")]
    MalformedResponse(String),

    /// The requested vehicle is unknown to the source.
    #[error("code: not_found, description: {0}")]
    NotFound(String),

    /// The response belongs to a request that has since been superseded.
    #[error("code: stale, description: {0}")]
    Stale(String),

    /// A non recoverable internal error occurred.
    #[error("code: internal, description: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the stable error code associated with the variant.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SourceUnreachable(_) => "source_unreachable",
            Self::Timeout(_) => "timeout",
            Self::MalformedResponse(_) => "malformed_response",
            Self::NotFound(_) => "not_found",
            Self::Stale(_) => "stale",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the error means the source itself is unavailable, as opposed to
    /// a problem with one record.
    #[must_use]
    pub const fn is_source_failure(&self) -> bool {
        matches!(self, Self::SourceUnreachable(_) | Self::Timeout(_) | Self::Internal(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        let chain = err.chain().map(ToString::to_string).collect::<Vec<_>>().join(" -> ");

        // if type is Error, return it with the newly added context
        if let Some(inner) = err.downcast_ref::<Self>() {
            tracing::debug!("Error: {err}, caused by: {inner}");

            return match inner {
                Self::SourceUnreachable(_) => Self::SourceUnreachable(chain),
                Self::Timeout(_) => Self::Timeout(chain),
                Self::MalformedResponse(_) => Self::MalformedResponse(chain),
                Self::NotFound(_) => Self::NotFound(chain),
                Self::Stale(_) => Self::Stale(chain),
                Self::Internal(_) => Self::Internal(chain),
            };
        }

        // otherwise, return an Internal error
        Self::Internal(chain)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

#[macro_export]
macro_rules! unreachable_source {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::SourceUnreachable(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::SourceUnreachable(format!($err))
    };
}

#[macro_export]
macro_rules! malformed {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::MalformedResponse(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::MalformedResponse(format!($err))
    };
}

#[macro_export]
macro_rules! not_found {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::NotFound(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::NotFound(format!($err))
    };
}

#[cfg(test)]
mod tests {
    use anyhow::{Context, Result, anyhow};
    use serde_json::Value;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Registry, fmt};

    use super::Error;

    #[test]
    fn error_display() {
        let err = Error::NotFound("vehicle 42".to_string());
        assert_eq!(format!("{err}"), "code: not_found, description: vehicle 42");
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn with_context() {
        let _ = Registry::default().with(EnvFilter::new("debug")).with(fmt::layer()).try_init();

        let context_error = || -> Result<(), Error> {
            Err(Error::SourceUnreachable("connection refused".to_string()))
                .context("listing devices")
                .context("fleet poll")?;
            Ok(())
        };

        let result = context_error();
        assert_eq!(
            result.unwrap_err(),
            Error::SourceUnreachable(
                "fleet poll -> listing devices -> code: source_unreachable, description: connection refused"
                    .to_string()
            )
        );
    }

    #[test]
    fn anyhow_context() {
        let result = Err::<(), anyhow::Error>(anyhow!("one-off error")).context("error context");
        let err: Error = result.unwrap_err().into();

        assert_eq!(err.to_string(), "code: internal, description: error context -> one-off error");
        assert!(err.is_source_failure());
    }

    #[test]
    fn serde_context() {
        let result: Result<Value, anyhow::Error> =
            serde_json::from_str(r#"{"foo": "bar""#).context("error context");
        let err: Error = result.unwrap_err().into();

        assert_eq!(
            err.to_string(),
            "code: internal, description: error context -> EOF while parsing an object at line 1 column 13"
        );
    }

    #[test]
    fn serde_direct() {
        let err: Error = serde_json::from_str::<Value>("{").unwrap_err().into();
        assert_eq!(err.code(), "malformed_response");
        assert!(!err.is_source_failure());
    }

    #[test]
    fn macros() {
        let id = "7";
        assert_eq!(not_found!("vehicle {id}"), Error::NotFound("vehicle 7".to_string()));
        assert_eq!(
            malformed!("missing {}", "result"),
            Error::MalformedResponse("missing result".to_string())
        );
        assert_eq!(
            unreachable_source!("status {}", 503),
            Error::SourceUnreachable("status 503".to_string())
        );
    }
}

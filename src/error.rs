/// Error type shared by the sensors, API clients and storage layer
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    /// Input outside the domain of a conversion
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Concentration falls between two AQI bands
    #[error("no AQI breakpoint covers {0} µg/m³")]
    NoMatchingBreakpoint(f64),

    /// Dust sensor reported the saturation sentinel
    #[error("saturated dust sensor reading: {0} pcs/0.01ft³")]
    SaturatedReading(f64),

    #[error("{what} timed out after {secs}s")]
    Timeout { what: &'static str, secs: u64 },

    #[error("command `{command}` failed: {status}")]
    CommandFailed { command: String, status: String },

    #[error("could not parse {what} from {value:?}")]
    Parse { what: &'static str, value: String },

    #[error("pigpio error: {0}")]
    Gpio(String),

    /// Provider answered with an error payload
    #[error("API error: {0}")]
    Api(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MonitorError {
    /// Whether the same call may succeed if simply issued again
    pub fn is_retryable(&self) -> bool {
        match self {
            MonitorError::Timeout { .. } => true,
            MonitorError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_retryable() {
        let err = MonitorError::Timeout {
            what: "pressure command",
            secs: 10,
        };
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "pressure command timed out after 10s");
    }

    #[test]
    fn test_domain_errors_are_not_retryable() {
        assert!(!MonitorError::InvalidInput("negative".into()).is_retryable());
        assert!(!MonitorError::NoMatchingBreakpoint(12.05).is_retryable());
        assert!(!MonitorError::SaturatedReading(1114000.62).is_retryable());
    }
}

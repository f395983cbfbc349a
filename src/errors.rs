//! Error types for the health monitor

use std::fmt;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug)]
pub enum MonitorError {
    /// IO operation failed
    Io(std::io::Error),

    /// HTTP request failed
    Http(reqwest::Error),

    /// JSON serialization/deserialization failed
    Json(serde_json::Error),

    /// Configuration error
    Config(String),

    /// Status snapshot could not be loaded or stored
    Snapshot(String),

    /// Waiting for the shutdown signal failed
    Signal(std::io::Error),
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Io(err) => write!(f, "IO error: {}", err),
            MonitorError::Http(err) => write!(f, "HTTP error: {}", err),
            MonitorError::Json(err) => write!(f, "JSON error: {}", err),
            MonitorError::Config(msg) => write!(f, "Configuration error: {}", msg),
            MonitorError::Snapshot(msg) => write!(f, "Status snapshot error: {}", msg),
            MonitorError::Signal(err) => write!(f, "Shutdown signal error: {}", err),
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::Io(err) => Some(err),
            MonitorError::Http(err) => Some(err),
            MonitorError::Json(err) => Some(err),
            MonitorError::Signal(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::Io(err)
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        MonitorError::Http(err)
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::Json(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_messages() {
        let err = MonitorError::Config("interval must be greater than 0".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: interval must be greater than 0"
        );

        let err = MonitorError::Snapshot("missing file".to_string());
        assert_eq!(err.to_string(), "Status snapshot error: missing file");
    }

    #[test]
    fn test_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = MonitorError::from(io);
        assert!(err.source().is_some());

        let err = MonitorError::Config("plain".to_string());
        assert!(err.source().is_none());

        let signal = std::io::Error::new(std::io::ErrorKind::Other, "no handler");
        let err = MonitorError::Signal(signal);
        assert_eq!(err.to_string(), "Shutdown signal error: no handler");
        assert!(err.source().is_some());
    }
}

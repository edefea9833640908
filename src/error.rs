//! Error handling for the parkwatch telemetry pipeline.

/// A specialized `Result` type for parkwatch operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// The main error type for parkwatch operations.
///
/// Failures local to one capture cycle or one archive line are logged and
/// contained by their callers; only startup resource acquisition propagates
/// one of these out of `main`.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sensor or camera did not return usable data
    #[error("capture error: {0}")]
    Capture(String),

    /// The vision service did not return a usable classification
    #[error("classification error: {0}")]
    Classification(String),

    /// The character display could not be driven
    #[error("display error: {0}")]
    Display(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Archival store access failed
    #[error("archive error: {0}")]
    Archive(String),
}

impl TelemetryError {
    /// Create a new capture error
    pub fn capture_error(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Create a new classification error
    pub fn classification_error(msg: impl Into<String>) -> Self {
        Self::Classification(msg.into())
    }

    /// Create a new display error
    pub fn display_error(msg: impl Into<String>) -> Self {
        Self::Display(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new archive error
    pub fn archive_error(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }
}

//! Error types for the logging pipeline

pub type Result<T> = std::result::Result<T, LoggerError>;

/// Phase of a length-prefixed record write in which a short write occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePhase {
    LengthPrefix,
    Payload,
}

impl std::fmt::Display for WritePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WritePhase::LengthPrefix => f.write_str("length prefix"),
            WritePhase::Payload => f.write_str("payload"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The underlying writer accepted fewer bytes than a framed record required
    #[error("short write during {phase}: wrote {written} of {expected} bytes")]
    ShortWrite {
        phase: WritePhase,
        expected: usize,
        written: usize,
    },

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// A record could not be decoded from its length-prefixed frame
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a short write error for the given record phase
    pub fn short_write(phase: WritePhase, expected: usize, written: usize) -> Self {
        LoggerError::ShortWrite {
            phase,
            expected,
            written,
        }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        LoggerError::MalformedRecord(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// True when this error reports partial persistence of a framed record
    #[must_use]
    pub fn is_short_write(&self) -> bool {
        matches!(self, LoggerError::ShortWrite { .. })
    }
}

use std::{fmt, io, time::Duration};

use crate::codec::{DecodeError, EncodeError};

/// Crate-wide `Result` type using [`BridgeError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Top-level error type for compbridge operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum BridgeError {
    /// Malformed provider output.
    Decode(DecodeError),

    /// Value could not be serialized.
    Encode(EncodeError),

    /// Provider process errors.
    Process(ProcessError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Provider process errors.
#[derive(Debug)]
pub enum ProcessError {
    /// The process could not be started.
    StartFailed(String),

    /// No output arrived within the timeout.
    Timeout(Duration),

    /// Another provider run occupies the run slot.
    Busy,

    /// Reading the process output failed.
    ReadFailed(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// Generic configuration error.
    Generic(String),
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Decode(e) => write!(f, "Decode error: {e}"),
            BridgeError::Encode(e) => write!(f, "Encode error: {e}"),
            BridgeError::Process(e) => write!(f, "Provider error: {e}"),
            BridgeError::Config(e) => write!(f, "Configuration error: {e}"),
            BridgeError::Io(e) => write!(f, "I/O error: {e}"),
            BridgeError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::StartFailed(msg) => write!(f, "Failed to start provider: {msg}"),
            ProcessError::Timeout(after) => {
                write!(f, "Provider timed out after {}s", after.as_secs_f64())
            }
            ProcessError::Busy => write!(f, "Provider busy, previous request cancelled"),
            ProcessError::ReadFailed(msg) => write!(f, "Failed to read provider output: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BridgeError::Decode(e) => Some(e),
            BridgeError::Encode(e) => Some(e),
            BridgeError::Io(e) => Some(e),
            _ => None,
        }
    }
}
impl std::error::Error for ProcessError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to BridgeError ========================= */

impl From<io::Error> for BridgeError {
    fn from(err: io::Error) -> Self {
        BridgeError::Io(err)
    }
}

impl From<DecodeError> for BridgeError {
    fn from(err: DecodeError) -> Self {
        BridgeError::Decode(err)
    }
}

impl From<EncodeError> for BridgeError {
    fn from(err: EncodeError) -> Self {
        BridgeError::Encode(err)
    }
}

impl From<ProcessError> for BridgeError {
    fn from(err: ProcessError) -> Self {
        BridgeError::Process(err)
    }
}

impl From<ConfigError> for BridgeError {
    fn from(err: ConfigError) -> Self {
        BridgeError::Config(err)
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        BridgeError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<toml::ser::Error> for BridgeError {
    fn from(err: toml::ser::Error) -> Self {
        BridgeError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_error_display() {
        let err = BridgeError::from(ProcessError::Timeout(Duration::from_secs(5)));
        assert_eq!(err.to_string(), "Provider error: Provider timed out after 5s");
    }

    #[test]
    fn test_decode_error_conversion_keeps_source() {
        use std::error::Error as _;

        let err = BridgeError::from(DecodeError::TrailingGarbage { line: 1, column: 3 });
        assert!(err.source().is_some());
        assert!(err.to_string().contains("line 1, column 3"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "completion.timeout".to_string(),
            value: "0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value '0' for field 'completion.timeout'"
        );
    }
}

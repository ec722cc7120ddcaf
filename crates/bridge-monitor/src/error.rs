//! Error types for bridge-monitor

use thiserror::Error;

/// Malformed monitor command line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    /// Token is not a monitor keyword
    #[error("Argument \"{0}\" is unknown, try \"bridge monitor help\".")]
    UnknownArgument(String),

    /// Keyword expects a value but the command line ended
    #[error("Command line is not complete. Try option \"help\" ({0} needs a value)")]
    MissingValue(&'static str),
}

/// Errors that can occur while monitoring
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Command line could not be resolved
    #[error(transparent)]
    Arg(#[from] ArgError),

    /// Live subscription or capture file could not be opened
    #[error("Cannot open {target}: {source}")]
    ChannelOpen {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Live channel failed mid-stream
    #[error("Netlink error: {0}")]
    Transport(String),

    /// Record header is not a valid netlink header
    #[error("Malformed record: {0}")]
    Malformed(String),

    /// Capture file ended inside a record
    #[error("Unexpected end of file inside record")]
    Truncated,

    /// Record body for a recognized topic could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for bridge-monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_argument_names_token() {
        let err = ArgError::UnknownArgument("bogus".to_string());
        assert_eq!(
            err.to_string(),
            "Argument \"bogus\" is unknown, try \"bridge monitor help\"."
        );
    }

    #[test]
    fn test_arg_error_is_transparent() {
        let err = MonitorError::from(ArgError::UnknownArgument("x".to_string()));
        assert!(err.to_string().starts_with("Argument \"x\""));
    }

    #[test]
    fn test_channel_open_display() {
        let err = MonitorError::ChannelOpen {
            target: "/tmp/none".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "Cannot open /tmp/none: missing");
    }
}

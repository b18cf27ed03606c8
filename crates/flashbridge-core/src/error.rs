//! Error types for flashbridge-core
//!
//! Collaborators (debug servers, sessions, configuration generators) fail
//! with an opaque [`DeviceError`]. Command implementations classify those
//! failures into an [`Error`] at their own boundary, and the dispatcher turns
//! the first [`Error`] of an invocation into the reported result.

use core::fmt;
use thiserror::Error;

/// Failure raised by a debug-server collaborator
///
/// This carries only the collaborator's message; the command that called it
/// decides which [`ErrorKind`] the failure belongs to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DeviceError(pub String);

impl DeviceError {
    /// Create a new device error from any message
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<std::io::Error> for DeviceError {
    fn from(e: std::io::Error) -> Self {
        Self(e.to_string())
    }
}

/// Result type for collaborator calls
pub type DeviceResult<T> = core::result::Result<T, DeviceError>;

/// Error category reported back to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Configuring, opening or connecting the session failed
    Session,
    /// The target cannot perform the requested flash operation
    UnsupportedOperation,
    /// Unknown option id or unsupported option value type
    Option,
    /// A memory/register/expression/flash/verify call failed
    DeviceIo,
    /// An option value could not be interpreted
    Argument,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session => write!(f, "SessionError"),
            Self::UnsupportedOperation => write!(f, "UnsupportedOperation"),
            Self::Option => write!(f, "OptionError"),
            Self::DeviceIo => write!(f, "DeviceIOError"),
            Self::Argument => write!(f, "ArgumentError"),
        }
    }
}

/// Terminal failure of one invocation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Session configuration, opening or connection failed
    #[error("{0}")]
    Session(String),

    /// Target does not support the requested operation
    #[error("{0}")]
    UnsupportedOperation(String),

    /// Option id unknown or value type unsupported
    #[error("{0}")]
    Option(String),

    /// Failure inside a device call
    #[error("{0}")]
    DeviceIo(String),

    /// Malformed or missing option value
    #[error("{0}")]
    Argument(String),

    /// `setoption` stopped at `id`; the ids in `applied` were already set
    #[error("failed to set option '{id}': {source} (already applied: [{}])", .applied.join(", "))]
    SetOption {
        /// Option that failed
        id: String,
        /// Options applied before the failure, in order
        applied: Vec<String>,
        /// Underlying failure
        source: Box<Error>,
    },
}

impl Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Session(_) => ErrorKind::Session,
            Self::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            Self::Option(_) => ErrorKind::Option,
            Self::DeviceIo(_) => ErrorKind::DeviceIo,
            Self::Argument(_) => ErrorKind::Argument,
            Self::SetOption { source, .. } => source.kind(),
        }
    }

    /// Error returned by branches that need a session when none was started
    pub fn no_session() -> Self {
        Self::Session("no connected session".into())
    }

    /// Classify a collaborator failure as a session error
    pub fn session(e: DeviceError) -> Self {
        Self::Session(e.0)
    }

    /// Classify a collaborator failure as a device I/O error
    pub fn device(e: DeviceError) -> Self {
        Self::DeviceIo(e.0)
    }

    /// Classify a collaborator failure as an option error
    pub fn option(e: DeviceError) -> Self {
        Self::Option(e.0)
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::Session.to_string(), "SessionError");
        assert_eq!(ErrorKind::DeviceIo.to_string(), "DeviceIOError");
        assert_eq!(ErrorKind::Option.to_string(), "OptionError");
    }

    #[test]
    fn test_set_option_lists_applied() {
        let err = Error::SetOption {
            id: "FlashEraseSetting".into(),
            applied: vec!["ResetOnRestart".into(), "VerifyAfterProgramLoad".into()],
            source: Box::new(Error::Option("unknown option".into())),
        };
        assert_eq!(err.kind(), ErrorKind::Option);
        assert_eq!(
            err.to_string(),
            "failed to set option 'FlashEraseSetting': unknown option \
             (already applied: [ResetOnRestart, VerifyAfterProgramLoad])"
        );
    }
}

//! Result values reported back to the controller
//!
//! Every invocation produces exactly one [`CommandResult`]. The controller
//! receives its string form: sequences are joined with [`SEQUENCE_SEPARATOR`],
//! everything else uses `Display`.

use crate::error::{Error, ErrorKind};
use core::fmt;

/// Separator used when a sequence result is flattened into the payload
pub const SEQUENCE_SEPARATOR: &str = ";;";

/// A single reported value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Boolean value (`true`/`false`)
    Bool(bool),
    /// Signed integer, e.g. an evaluated expression
    Int(i64),
    /// Unsigned integer, e.g. a memory word or register
    UInt(u64),
    /// Floating point value
    Float(f64),
    /// Free-form text
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(v) => write!(f, "{}", v),
            Self::UInt(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Captured failure of an operation; terminal for the invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescriptor {
    /// Failure category
    pub kind: ErrorKind,
    /// Human readable message
    pub message: String,
}

impl From<&Error> for ErrorDescriptor {
    fn from(e: &Error) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// The single value produced by one invocation
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Nothing terminal ran and nothing accumulated
    Empty,
    /// One value
    Scalar(Scalar),
    /// Ordered list of values, e.g. CPU names or memory bytes
    Sequence(Vec<Scalar>),
    /// The invocation failed
    Error(ErrorDescriptor),
}

impl CommandResult {
    /// Boolean `true`, the usual success value
    pub fn success() -> Self {
        Self::Scalar(Scalar::Bool(true))
    }

    /// Sequence of text values
    pub fn texts<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Sequence(items.into_iter().map(|s| Scalar::Text(s.into())).collect())
    }

    /// Whether this result describes a failure
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// String form delivered to the controller
    pub fn to_payload(&self) -> String {
        self.to_string()
    }
}

impl From<Scalar> for CommandResult {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<&Error> for CommandResult {
    fn from(e: &Error) -> Self {
        Self::Error(e.into())
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Scalar(s) => write!(f, "{}", s),
            Self::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(SEQUENCE_SEPARATOR)?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Self::Error(e) => write!(f, "{}", e),
        }
    }
}

//! flashbridge-core - command model and debug-server abstraction
//!
//! This crate holds everything the bridge needs that does not depend on a
//! particular debug stack:
//!
//! - [`args`] - the two-tier `--command -option value` grammar
//! - [`value`] - the result model reported back to the controller
//! - [`server`] - capability traits implemented by debug-server backends
//! - [`session`] - the session lifecycle handle (connect on demand,
//!   guaranteed teardown)
//! - [`error`] - error kinds and collaborator failures

pub mod args;
pub mod error;
pub mod server;
pub mod session;
pub mod value;

pub use args::{parse, CommandMap, OptionMap};
pub use error::{DeviceError, DeviceResult, Error, ErrorKind, Result};
pub use server::{
    CompanionSession, ConfigGenerator, DebugServer, DebugSession, OptionType, OptionValue,
};
pub use session::{SessionArgs, SessionHandle};
pub use value::{CommandResult, ErrorDescriptor, Scalar};

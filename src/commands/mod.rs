//! Command implementations
//!
//! One module per command key. Each takes the options parsed for its key
//! and the collaborator it needs, and returns either the command's result or
//! a classified [`flashbridge_core::Error`]. Nothing here delivers results or
//! exits; that is the dispatcher's job.
//!
//! ## Server commands
//!
//! `list` and `genccxml` talk to the debug server directly and work without a
//! session. `attach` opens a companion session on the server.
//!
//! ## Session commands
//!
//! Option commands (`printoptions`, `setoption`, `getoption`) use the session
//! as opened. Every other command connects on demand first.

pub mod attach;
pub mod ccxml;
pub mod erase;
pub mod expression;
pub mod flash;
pub mod list;
pub mod memory;
pub mod operation;
pub mod options;
pub mod register;
pub mod reset;
pub mod verify;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown on stderr while a long device call runs
pub(crate) fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

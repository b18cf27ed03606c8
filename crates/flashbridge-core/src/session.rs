//! Session lifecycle
//!
//! A [`SessionHandle`] wraps one [`DebugSession`] from the moment it is
//! opened until it is torn down. Connection is made on demand with
//! [`SessionHandle::connect_if_needed`]; teardown disconnects (if connected)
//! and terminates, exactly once. A torn-down handle is dead: it never
//! reconnects and every further access fails with a session error.
//!
//! Dropping a live handle tears it down, so the session is released even
//! when the owner unwinds.

use crate::args::{self, OptionMap};
use crate::error::{Error, Result};
use crate::server::{DebugServer, DebugSession};
use std::path::PathBuf;

/// Parameters of the `session` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionArgs {
    /// Target configuration file
    pub config: PathBuf,
    /// Substring identifying the target, matched as `.*<chip>.*`
    pub chip: String,
    /// Script timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

impl SessionArgs {
    /// Build from the options of a `session` command
    ///
    /// `-ccxml` is required; `-chip` defaults to matching any target and
    /// `-timeout` to the server's own default.
    pub fn from_options(options: &OptionMap) -> Result<Self> {
        let config = args::joined(options, "ccxml")
            .ok_or_else(|| Error::Session("no target configuration given (-ccxml)".into()))?;
        let chip = args::joined(options, "chip").unwrap_or_default();
        let timeout_ms = args::joined(options, "timeout")
            .map(|t| {
                args::parse_number(&t)
                    .map_err(|e| Error::Session(format!("invalid script timeout: {}", e)))
            })
            .transpose()?;

        Ok(Self {
            config: PathBuf::from(config),
            chip,
            timeout_ms,
        })
    }

    /// Regular expression used to select the target
    pub fn pattern(&self) -> String {
        session_pattern(&self.chip)
    }
}

/// Pattern matching any session name containing `chip`
pub fn session_pattern(chip: &str) -> String {
    format!(".*{}.*", chip)
}

/// Owned handle to one debug session
pub struct SessionHandle {
    session: Option<Box<dyn DebugSession>>,
    pattern: String,
}

impl SessionHandle {
    /// Configure the server and open a session
    ///
    /// Does not connect to the target.
    pub fn start(server: &mut dyn DebugServer, args: &SessionArgs) -> Result<Self> {
        log::debug!("Applying target configuration {}", args.config.display());
        server.set_config(&args.config).map_err(Error::session)?;

        let pattern = args.pattern();
        let mut session = server.open_session(&pattern).map_err(Error::session)?;
        log::info!("Opened session matching '{}'", pattern);

        if let Some(timeout) = args.timeout_ms {
            log::debug!("Script timeout: {} ms", timeout);
            if let Err(e) = session.set_script_timeout(timeout) {
                // The session is already open; release it before failing
                Self::release(session.as_mut());
                return Err(Error::session(e));
            }
        }

        Ok(Self {
            session: Some(session),
            pattern,
        })
    }

    /// Pattern the session was opened with
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the handle has not been torn down yet
    pub fn is_alive(&self) -> bool {
        self.session.is_some()
    }

    /// Access the live session
    pub fn session(&mut self) -> Result<&mut dyn DebugSession> {
        match self.session.as_mut() {
            Some(session) => Ok(session.as_mut()),
            None => Err(Error::Session("session already terminated".into())),
        }
    }

    /// Connect to the target unless already connected
    pub fn connect_if_needed(&mut self) -> Result<&mut dyn DebugSession> {
        let session = self.session()?;
        if !session.is_connected() {
            log::info!("Connecting to target...");
            session.connect().map_err(Error::session)?;
        }
        Ok(session)
    }

    /// Disconnect if connected, then terminate
    ///
    /// Errors are logged, not returned: teardown runs on every exit path and
    /// must not mask the invocation's own result. Calling it again is a no-op.
    pub fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            Self::release(session.as_mut());
            log::debug!("Session '{}' terminated", self.pattern);
        }
    }

    fn release(session: &mut dyn DebugSession) {
        if session.is_connected() {
            if let Err(e) = session.disconnect() {
                log::warn!("Failed to disconnect target: {}", e);
            }
        }
        if let Err(e) = session.terminate() {
            log::warn!("Failed to terminate session: {}", e);
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Tear down an optional handle; no-op when absent
pub fn teardown(handle: Option<&mut SessionHandle>) {
    if let Some(handle) = handle {
        handle.teardown();
    }
}

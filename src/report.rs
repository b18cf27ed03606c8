//! Result delivery
//!
//! The controller listens on a local port and expects exactly one payload per
//! invocation: the string form of the [`CommandResult`].

use flashbridge_core::CommandResult;
use std::io::Write;
use std::net::{Shutdown, TcpStream};
use thiserror::Error;

/// Delivery failures
#[derive(Error, Debug)]
pub enum ReportError {
    /// Connecting to or writing to the controller failed
    #[error("failed to deliver result to port {port}: {source}")]
    Io {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// A result was already delivered for this invocation
    #[error("result already delivered")]
    AlreadyDelivered,
}

/// Channel the payload is sent over
pub trait ResultTransport {
    /// Send one payload
    fn send(&mut self, payload: &str) -> Result<(), ReportError>;
}

/// Connect-send-close transport to `127.0.0.1:<port>`
pub struct TcpTransport {
    port: u16,
}

impl TcpTransport {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl ResultTransport for TcpTransport {
    fn send(&mut self, payload: &str) -> Result<(), ReportError> {
        let port = self.port;
        let io = |source| ReportError::Io { port, source };

        let mut stream = TcpStream::connect(("127.0.0.1", port)).map_err(io)?;
        stream.write_all(payload.as_bytes()).map_err(io)?;
        stream.shutdown(Shutdown::Write).map_err(io)?;
        Ok(())
    }
}

/// Delivers the invocation's result at most once
pub struct Reporter {
    transport: Box<dyn ResultTransport>,
    delivered: bool,
}

impl Reporter {
    pub fn new(transport: Box<dyn ResultTransport>) -> Self {
        Self {
            transport,
            delivered: false,
        }
    }

    /// Whether a delivery was already attempted
    #[cfg(test)]
    pub fn delivered(&self) -> bool {
        self.delivered
    }

    /// Normalize `result` and send it
    ///
    /// Only the first call sends anything; a failed send still counts as the
    /// delivery.
    pub fn deliver(&mut self, result: &CommandResult) -> Result<(), ReportError> {
        if self.delivered {
            log::warn!("Result already delivered, dropping '{}'", result);
            return Err(ReportError::AlreadyDelivered);
        }
        self.delivered = true;

        let payload = result.to_payload();
        log::debug!("Delivering result: '{}'", payload);
        self.transport.send(&payload)
    }
}

//! Companion (IDE) attach
//!
//! Opens a companion session on the target and keeps it open until the
//! controller signals, by writing to our stdin, that it is done with it.

use flashbridge_core::{DebugServer, Error, Result};
use std::io::Read;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

/// Interval between two checks for controller input
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Source of the "controller is done" signal
pub trait InputProbe {
    /// Whether input became available since the probe was created
    fn input_available(&mut self) -> bool;
}

/// Probe fed by a thread blocking on stdin
///
/// Input and end-of-file both count as available.
pub struct StdinProbe {
    rx: Receiver<()>,
}

impl StdinProbe {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut byte = [0u8; 1];
            let _ = std::io::stdin().read(&mut byte);
            let _ = tx.send(());
        });
        Self { rx }
    }
}

impl InputProbe for StdinProbe {
    fn input_available(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => true,
            Err(TryRecvError::Empty) => false,
        }
    }
}

/// Open a companion session matching `pattern` and hold it until the probe
/// reports input
pub fn run(
    server: &mut dyn DebugServer,
    pattern: &str,
    probe: &mut dyn InputProbe,
    interval: Duration,
) -> Result<()> {
    let mut companion = server.open_companion(pattern).map_err(Error::session)?;
    log::info!("Companion session open on '{}', waiting for controller", pattern);

    let mut polls = 0u64;
    while !probe.input_available() {
        thread::sleep(interval);
        polls += 1;
    }
    log::debug!("Controller input after {} polls", polls);

    companion.terminate().map_err(Error::session)
}

//! Target reset

use flashbridge_core::{CommandResult, Error, Result, SessionHandle};

/// Reset the target
pub fn run(handle: &mut SessionHandle) -> Result<CommandResult> {
    let session = handle.connect_if_needed()?;
    log::info!("Resetting target");
    session.reset().map_err(Error::device)?;
    Ok(CommandResult::success())
}

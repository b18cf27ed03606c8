//! Erase command implementation

use super::spinner;
use flashbridge_core::{Error, Result, SessionHandle};

/// Erase all unprotected sectors
pub fn run(handle: &mut SessionHandle) -> Result<()> {
    let session = handle.connect_if_needed()?;
    if !session.is_flash_supported() {
        return Err(Error::UnsupportedOperation(
            "flash is not supported on this device".into(),
        ));
    }

    let pb = spinner("Erasing flash (this may take a while)...".to_string());
    match session.erase() {
        Ok(()) => {
            pb.finish_with_message("Erase complete");
            Ok(())
        }
        Err(e) => {
            pb.abandon_with_message("Erase failed!");
            Err(Error::device(e))
        }
    }
}

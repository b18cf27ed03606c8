//! Named flash operation (e.g. a mass erase)

use flashbridge_core::args;
use flashbridge_core::{Error, OptionMap, Result, SessionHandle};

/// Run the operation named by `-opcode`
///
/// Flash support is checked before connecting.
pub fn run(handle: &mut SessionHandle, options: &OptionMap) -> Result<()> {
    let opcode = args::required(options, "opcode")?;

    if !handle.session()?.is_flash_supported() {
        return Err(Error::UnsupportedOperation(
            "flash is not supported on this device".into(),
        ));
    }

    let session = handle.connect_if_needed()?;
    log::info!("Performing flash operation {}", opcode);
    session.perform_operation(&opcode).map_err(Error::device)
}

//! Verify command implementation

use super::flash::ImageArgs;
use super::spinner;
use flashbridge_core::{CommandResult, Error, OptionMap, Result, SessionHandle};

/// Run the verify command
///
/// Addressing follows `flash`: `-binary` selects a raw image at `-address`
/// (default 0), otherwise the image is a structured program.
pub fn run(handle: &mut SessionHandle, options: &OptionMap) -> Result<CommandResult> {
    let args = ImageArgs::from_options(options)?;
    let session = handle.connect_if_needed()?;

    let pb = spinner(format!("Verifying {}...", args.image.display()));
    let verified = match args.binary_address {
        Some(address) => session.verify_binary_program(&args.image, address),
        None => session.verify_program(&args.image),
    };

    match verified {
        Ok(()) => {
            pb.finish_with_message("Verification passed");
            Ok(CommandResult::success())
        }
        Err(e) => {
            pb.abandon_with_message("Verification failed!");
            Err(Error::device(e))
        }
    }
}

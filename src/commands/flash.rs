//! Flash command implementation

use super::spinner;
use flashbridge_core::args;
use flashbridge_core::{CommandResult, Error, OptionMap, Result, SessionHandle};
use std::path::PathBuf;

/// Image and addressing parameters shared by `flash` and `verify`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArgs {
    /// Image file, from `-image` or the positional values
    pub image: PathBuf,
    /// Load address for raw binaries; `None` for structured images
    pub binary_address: Option<u64>,
}

impl ImageArgs {
    pub fn from_options(options: &OptionMap) -> Result<Self> {
        let image = args::operand(options, "image")
            .ok_or_else(|| Error::Argument("missing -image".into()))?;

        let binary_address = if options.contains_key("binary") {
            Some(args::number_or(options, "address", 0)?)
        } else {
            None
        };

        Ok(Self {
            image: PathBuf::from(image),
            binary_address,
        })
    }
}

/// Run the flash command
pub fn run(handle: &mut SessionHandle, options: &OptionMap) -> Result<CommandResult> {
    let args = ImageArgs::from_options(options)?;
    let session = handle.connect_if_needed()?;

    let pb = spinner(format!("Flashing {}...", args.image.display()));
    let loaded = match args.binary_address {
        Some(address) => session.load_binary_program(&args.image, address),
        None => session.load_program(&args.image),
    };

    match loaded {
        Ok(()) => {
            pb.finish_with_message(format!("Flashed {}", args.image.display()));
            Ok(CommandResult::success())
        }
        Err(e) => {
            pb.abandon_with_message("Flashing failed!");
            Err(Error::device(e))
        }
    }
}

//! Expression evaluation

use flashbridge_core::args;
use flashbridge_core::{CommandResult, Error, OptionMap, Result, Scalar, SessionHandle};
use std::path::Path;

/// Evaluate `-expression`, loading the `-symbols` file first if given
pub fn run(handle: &mut SessionHandle, options: &OptionMap) -> Result<CommandResult> {
    let expression = args::required(options, "expression")?;
    let symbols = args::joined(options, "symbols");

    let session = handle.connect_if_needed()?;
    if let Some(file) = symbols {
        log::debug!("Loading symbols from {}", file);
        session
            .load_symbols(Path::new(&file))
            .map_err(Error::device)?;
    }

    let value = session.evaluate(&expression).map_err(Error::device)?;
    log::debug!("{} = {}", expression, value);
    Ok(Scalar::Int(value).into())
}

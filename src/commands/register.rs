//! Register read/write

use flashbridge_core::args;
use flashbridge_core::{CommandResult, Error, OptionMap, Result, Scalar, SessionHandle};

/// Run the register command
///
/// `-read` returns the value of `-name`; `-write` stores `-value` and returns
/// `true`. `-read` wins when both are given.
pub fn run(handle: &mut SessionHandle, options: &OptionMap) -> Result<CommandResult> {
    let name = args::required(options, "name")?;

    if options.contains_key("read") {
        let session = handle.connect_if_needed()?;
        let value = session.read_register(&name).map_err(Error::device)?;
        log::debug!("{} = 0x{:X}", name, value);
        Ok(Scalar::UInt(value).into())
    } else if options.contains_key("write") {
        let value = args::parse_number(&args::required(options, "value")?)?;
        let session = handle.connect_if_needed()?;
        session.write_register(&name, value).map_err(Error::device)?;
        log::debug!("{} <- 0x{:X}", name, value);
        Ok(CommandResult::success())
    } else {
        Err(Error::Argument("register needs -read or -write".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashbridge_core::{ErrorKind, SessionArgs};
    use flashbridge_dummy::DummyServer;
    use std::path::PathBuf;

    fn register(handle: &mut SessionHandle, tokens: &[&str]) -> Result<CommandResult> {
        let commands = args::parse(tokens);
        run(handle, commands.get("register").unwrap())
    }

    #[test]
    fn test_register() {
        let mut server = DummyServer::new_default();
        let journal = server.journal();
        let args = SessionArgs {
            config: PathBuf::from("board.ccxml"),
            chip: "MSP".into(),
            timeout_ms: None,
        };
        let mut handle = SessionHandle::start(&mut server, &args).unwrap();

        let result = register(&mut handle, &["--register", "-read", "-name", "SP"]).unwrap();
        assert_eq!(result.to_payload(), "536870912");

        let result = register(
            &mut handle,
            &["--register", "-write", "-name", "PC", "-value", "0x1000"],
        )
        .unwrap();
        assert_eq!(result, CommandResult::success());
        assert_eq!(journal.register("PC"), Some(0x1000));

        let err = register(&mut handle, &["--register", "-read", "-name", "XYZ"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeviceIo);

        let err = register(&mut handle, &["--register", "-name", "PC"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);

        let err = register(&mut handle, &["--register", "-write", "-name", "PC"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }
}

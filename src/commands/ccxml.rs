//! Board configuration file generation

use flashbridge_core::args;
use flashbridge_core::{CommandResult, DebugServer, Error, OptionMap, Result};
use std::path::PathBuf;

/// Parameters of `genccxml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcxmlArgs {
    pub directory: PathBuf,
    pub connection: String,
    pub device: String,
    pub name: String,
}

impl CcxmlArgs {
    pub fn from_options(options: &OptionMap) -> Result<Self> {
        Ok(Self {
            directory: PathBuf::from(args::required(options, "directory")?),
            connection: args::required(options, "connection")?,
            device: args::required(options, "devicetype")?,
            name: args::required(options, "ccxml")?,
        })
    }
}

/// Run the genccxml command
pub fn run(server: &mut dyn DebugServer, options: &OptionMap) -> Result<CommandResult> {
    let args = CcxmlArgs::from_options(options)?;

    let mut generator = server.config_generator().map_err(Error::device)?;
    generator
        .set_output_directory(&args.directory)
        .map_err(Error::device)?;
    generator
        .set_connection(&args.connection)
        .map_err(Error::device)?;
    generator.set_device(&args.device).map_err(Error::device)?;
    generator
        .create_configuration(&args.name)
        .map_err(Error::device)?;

    log::info!(
        "Generated {} ({} / {})",
        args.directory.join(&args.name).display(),
        args.connection,
        args.device
    );
    Ok(CommandResult::success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashbridge_core::ErrorKind;
    use flashbridge_dummy::DummyServer;

    #[test]
    fn test_generate() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();
        let commands = args::parse(&[
            "--genccxml",
            "-directory",
            dir_str,
            "-connection",
            "Texas",
            "Instruments",
            "XDS110",
            "USB",
            "Debug",
            "Probe",
            "-devicetype",
            "CC1310F128",
            "-ccxml",
            "CC1310F128.ccxml",
        ]);

        let mut server = DummyServer::new_default();
        let result = run(&mut server, commands.get("genccxml").unwrap()).unwrap();
        assert_eq!(result, CommandResult::success());
        assert!(dir.path().join("CC1310F128.ccxml").exists());
    }

    #[test]
    fn test_missing_argument() {
        let commands = args::parse(&["--genccxml", "-directory", "/tmp", "-ccxml", "a.ccxml"]);
        let mut server = DummyServer::new_default();
        let journal = server.journal();
        let err = run(&mut server, commands.get("genccxml").unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert_eq!(err.to_string(), "missing -connection");
        // Arguments are checked before the server is touched
        assert!(journal.calls().is_empty());
    }

    #[test]
    fn test_unknown_device() {
        let dir = tempfile::tempdir().unwrap();
        let commands = args::parse(&[
            "--genccxml",
            "-directory",
            dir.path().to_str().unwrap(),
            "-connection",
            "Texas Instruments XDS110 USB Debug Probe",
            "-devicetype",
            "Z80",
            "-ccxml",
            "z80.ccxml",
        ]);
        let mut server = DummyServer::new_default();
        let err = run(&mut server, commands.get("genccxml").unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeviceIo);
        assert!(!dir.path().join("z80.ccxml").exists());
    }
}

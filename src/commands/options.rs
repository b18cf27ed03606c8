//! Session option commands: printoptions, setoption, getoption

use flashbridge_core::args::{self, POSITIONALS};
use flashbridge_core::{
    CommandResult, DebugSession, Error, OptionMap, OptionType, OptionValue, Result, Scalar,
};

/// Print the options matching `-id` (all by default) and the supported flash
/// operations to stdout
pub fn print(session: &mut dyn DebugSession, options: &OptionMap) -> Result<CommandResult> {
    let pattern = args::joined(options, "id").unwrap_or_else(|| ".*".to_string());

    let lines = session.describe_options(&pattern).map_err(Error::option)?;
    let operations = session.supported_operations().map_err(Error::device)?;

    println!("OPTIONS:");
    for line in &lines {
        println!("  {}", line);
    }
    println!();
    println!("Supported operations:");
    for op in &operations {
        println!("  {}", op);
    }

    Ok(CommandResult::success())
}

/// Apply every option given to `setoption`, in id order
///
/// Stops at the first failure; the error lists the ids applied before it.
/// Returns the applied ids.
pub fn set_all(session: &mut dyn DebugSession, options: &OptionMap) -> Result<Vec<String>> {
    let mut applied = Vec::new();

    for (id, values) in options {
        if id == POSITIONALS {
            continue;
        }
        let value = values.join(" ");
        if let Err(source) = set(session, id, &value) {
            return Err(Error::SetOption {
                id: id.clone(),
                applied,
                source: Box::new(source),
            });
        }
        log::debug!("Set option {} = '{}'", id, value);
        applied.push(id.clone());
    }

    Ok(applied)
}

/// Set one option, converting `value` to the option's type
pub fn set(session: &mut dyn DebugSession, id: &str, value: &str) -> Result<()> {
    let applied = match option_type(session, id)? {
        OptionType::String => session.set_string(id, value),
        OptionType::Boolean => session.set_boolean(id, parse_bool(value)?),
        OptionType::Numeric => session.set_numeric(id, parse_numeric(value)?),
        OptionType::Other => {
            return Err(Error::Option(format!(
                "option '{}' has an unsupported value type",
                id
            )))
        }
    };
    applied.map_err(Error::option)
}

/// Read the option named by `-id`
pub fn get(session: &mut dyn DebugSession, options: &OptionMap) -> Result<CommandResult> {
    let id = args::required(options, "id")?;
    option_type(session, &id)?;

    let value = session.get_option(&id).map_err(Error::option)?;
    log::debug!("Option {} = {:?}", id, value);

    Ok(CommandResult::Scalar(match value {
        OptionValue::String(s) => Scalar::Text(s),
        OptionValue::Boolean(b) => Scalar::Bool(b),
        OptionValue::Numeric(n) => Scalar::Float(n),
    }))
}

fn option_type(session: &dyn DebugSession, id: &str) -> Result<OptionType> {
    if !session.option_exists(id) {
        return Err(Error::Option(format!(
            "device does not support option '{}'",
            id
        )));
    }
    session.option_type(id).map_err(Error::option)
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::Argument(format!(
            "invalid boolean '{}' (expected true or false)",
            value
        ))),
    }
}

fn parse_numeric(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        return args::parse_number(trimmed).map(|n| n as f64);
    }
    trimmed
        .parse::<f64>()
        .map_err(|e| Error::Argument(format!("invalid number '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashbridge_core::{ErrorKind, SessionArgs, SessionHandle};
    use flashbridge_dummy::{DummyOptionValue, DummyServer};
    use std::path::PathBuf;

    fn open(server: &mut DummyServer) -> SessionHandle {
        let args = SessionArgs {
            config: PathBuf::from("board.ccxml"),
            chip: "MSP".into(),
            timeout_ms: None,
        };
        SessionHandle::start(server, &args).unwrap()
    }

    fn options_of(tokens: &[&str], command: &str) -> OptionMap {
        args::parse(tokens).get(command).unwrap().clone()
    }

    #[test]
    fn test_set_all_typed() {
        let mut server = DummyServer::new_default();
        let journal = server.journal();
        let mut handle = open(&mut server);

        let opts = options_of(
            &[
                "--setoption",
                "-FlashEraseSetting",
                "All",
                "Unprotected",
                "Sectors",
                "-ResetOnRestart",
                "False",
                "-FlashClockMhz",
                "0x20",
            ],
            "setoption",
        );
        let applied = set_all(handle.session().unwrap(), &opts).unwrap();
        assert_eq!(
            applied,
            vec!["FlashClockMhz", "FlashEraseSetting", "ResetOnRestart"]
        );
        assert_eq!(
            journal.option("FlashEraseSetting"),
            Some(DummyOptionValue::String("All Unprotected Sectors".into()))
        );
        assert_eq!(
            journal.option("ResetOnRestart"),
            Some(DummyOptionValue::Boolean(false))
        );
        assert_eq!(
            journal.option("FlashClockMhz"),
            Some(DummyOptionValue::Numeric(32.0))
        );
        // Options work on an unconnected session
        assert!(!journal.is_connected());
    }

    #[test]
    fn test_set_all_stops_at_first_failure() {
        let mut server = DummyServer::new_default();
        let journal = server.journal();
        let mut handle = open(&mut server);

        let opts = options_of(
            &[
                "--setoption",
                "-ResetOnRestart",
                "false",
                "-Zeta",
                "1",
                "-FlashEraseSetting",
                "All",
                "Unprotected",
                "Sectors",
            ],
            "setoption",
        );
        let err = set_all(handle.session().unwrap(), &opts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Option);
        match &err {
            Error::SetOption { id, applied, .. } => {
                assert_eq!(id, "Zeta");
                assert_eq!(applied, &vec!["FlashEraseSetting", "ResetOnRestart"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(
            err.to_string(),
            "failed to set option 'Zeta': device does not support option 'Zeta' \
             (already applied: [FlashEraseSetting, ResetOnRestart])"
        );
        // Options before the failing one stay applied
        assert_eq!(
            journal.option("ResetOnRestart"),
            Some(DummyOptionValue::Boolean(false))
        );
    }

    #[test]
    fn test_set_unknown_option() {
        let mut server = DummyServer::new_default();
        let mut handle = open(&mut server);
        let err = set(handle.session().unwrap(), "NoSuchOption", "1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Option);
        assert_eq!(err.to_string(), "device does not support option 'NoSuchOption'");
    }

    #[test]
    fn test_set_bad_boolean() {
        let mut server = DummyServer::new_default();
        let mut handle = open(&mut server);
        let err = set(handle.session().unwrap(), "ResetOnRestart", "maybe").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn test_get() {
        let mut server = DummyServer::new_default();
        let mut handle = open(&mut server);
        let session = handle.session().unwrap();

        let opts = options_of(&["--getoption", "-id", "FlashEraseSetting"], "getoption");
        assert_eq!(
            get(session, &opts).unwrap().to_payload(),
            "Necessary Sectors Only"
        );

        let opts = options_of(&["--getoption", "-id", "ResetOnRestart"], "getoption");
        assert_eq!(get(session, &opts).unwrap().to_payload(), "true");

        let opts = options_of(&["--getoption", "-id", "FlashClockMhz"], "getoption");
        assert_eq!(get(session, &opts).unwrap().to_payload(), "16");

        let opts = options_of(&["--getoption"], "getoption");
        assert_eq!(get(session, &opts).unwrap_err().kind(), ErrorKind::Argument);
    }

    #[test]
    fn test_print() {
        let mut server = DummyServer::new_default();
        let mut handle = open(&mut server);
        let opts = options_of(&["--printoptions", "-id", "Flash.*"], "printoptions");
        assert_eq!(
            print(handle.session().unwrap(), &opts).unwrap(),
            CommandResult::success()
        );

        let opts = options_of(&["--printoptions", "-id", "("], "printoptions");
        assert_eq!(
            print(handle.session().unwrap(), &opts).unwrap_err().kind(),
            ErrorKind::Option
        );
    }
}

//! List command implementation

use flashbridge_core::{CommandResult, DebugServer, DeviceResult, Error, OptionMap, Result};

/// What `list` was asked for, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Cpus,
    Connections,
    Devices,
    Configurations,
}

impl ListKind {
    /// First kind present in `options`, if any
    pub fn from_options(options: &OptionMap) -> Option<Self> {
        [
            ("cpus", Self::Cpus),
            ("connections", Self::Connections),
            ("devices", Self::Devices),
            ("configurations", Self::Configurations),
        ]
        .into_iter()
        .find(|(key, _)| options.contains_key(*key))
        .map(|(_, kind)| kind)
    }
}

/// Run the list command
///
/// Returns the names as a sequence; an empty sequence if no kind was given.
pub fn run(server: &mut dyn DebugServer, options: &OptionMap) -> Result<CommandResult> {
    let Some(kind) = ListKind::from_options(options) else {
        log::warn!("list: nothing to list (use -cpus, -connections, -devices or -configurations)");
        return Ok(CommandResult::Sequence(Vec::new()));
    };

    let names = fetch(server, kind).map_err(Error::device)?;
    log::debug!("list {:?}: {} entries", kind, names.len());
    Ok(CommandResult::texts(names))
}

fn fetch(server: &mut dyn DebugServer, kind: ListKind) -> DeviceResult<Vec<String>> {
    match kind {
        ListKind::Cpus => server.list_cpus(),
        ListKind::Connections => server.config_generator()?.list_connections(),
        ListKind::Devices => server.config_generator()?.list_devices(),
        ListKind::Configurations => server.config_generator()?.list_configurations(),
    }
}

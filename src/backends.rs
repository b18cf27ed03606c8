//! Backend registration and opening
//!
//! This module provides a centralized registry for debug-server backends,
//! with support for feature-gated inclusion.

use flashbridge_core::DebugServer;
use std::path::Path;

/// Information about a backend
pub struct BackendInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all backends enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<BackendInfo> {
    let mut backends = Vec::new();

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "In-memory target emulator for testing",
    });

    backends
}

/// Short list of backend names for messages
pub fn backend_names_short() -> String {
    let names: Vec<&str> = available_backends().iter().map(|b| b.name).collect();
    names.join(", ")
}

/// Backend matching `name` or one of its aliases
pub fn find_backend(name: &str) -> Option<BackendInfo> {
    available_backends()
        .into_iter()
        .find(|b| b.name == name || b.aliases.contains(&name))
}

/// Open the backend `name`
///
/// `base_path` is the installation root; `target_db` overrides where the
/// dummy backend reads its target description from.
#[allow(unused_variables)]
pub fn open_backend(
    name: &str,
    base_path: &Path,
    target_db: Option<&Path>,
) -> Result<Box<dyn DebugServer>, Box<dyn std::error::Error>> {
    let info = find_backend(name).ok_or_else(|| {
        format!(
            "Unknown backend '{}' [available: {}]",
            name,
            backend_names_short()
        )
    })?;
    log::debug!("Using backend {} ({})", info.name, info.description);

    match info.name {
        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(base_path, target_db),
        other => Err(format!("Backend '{}' is not supported in this build", other).into()),
    }
}

#[cfg(feature = "dummy")]
fn open_dummy(
    base_path: &Path,
    target_db: Option<&Path>,
) -> Result<Box<dyn DebugServer>, Box<dyn std::error::Error>> {
    use flashbridge_dummy::{DummyConfig, DummyServer};

    let default_db = base_path.join("targets.ron");
    let config = match target_db {
        Some(path) => DummyConfig::from_file(path)?,
        None if default_db.is_file() => DummyConfig::from_file(&default_db)?,
        None => {
            log::debug!("No target description found, using built-in targets");
            DummyConfig::default()
        }
    };

    log::info!("Dummy backend with {} target(s)", config.cpus.len());
    Ok(Box::new(DummyServer::new(config)))
}

//! flashbridge-dummy - In-memory debug server for testing
//!
//! This crate provides a debug server that emulates one or more targets in
//! memory. It's useful for testing the bridge and for development without a
//! vendor debug stack or real hardware.
//!
//! Every collaborator call is recorded in a shared [`Journal`], which tests
//! use to check call ordering and to inject failures into specific calls.
//!
//! Target descriptions can be loaded from RON files:
//!
//! ```ron
//! (
//!     cpus: ["XDS110/CORTEX_M4_0 (MSP432P401R)"],
//!     memory_size: 0x40000,
//!     flash_supported: true,
//!     operations: ["Erase"],
//!     options: [(id: "ResetOnRestart", value: Boolean(true))],
//! )
//! ```

mod generator;
mod session;

pub use generator::{DummyCompanion, DummyConfigGenerator};
pub use session::DummySession;

use flashbridge_core::{
    CompanionSession, ConfigGenerator, DebugServer, DebugSession, DeviceError, DeviceResult,
};
use regex::Regex;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Option value as written in a target description
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum DummyOptionValue {
    String(String),
    Boolean(bool),
    Numeric(f64),
}

/// One emulated session option
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DummyOption {
    pub id: String,
    pub value: DummyOptionValue,
}

/// Description of the emulated targets
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DummyConfig {
    /// Session names, matched against `open_session` patterns
    pub cpus: Vec<String>,
    /// Debug probe connections known to the configuration generator
    pub connections: Vec<String>,
    /// Device types known to the configuration generator
    pub devices: Vec<String>,
    /// Configuration files known to the configuration generator
    pub configurations: Vec<String>,
    /// Size of the emulated memory (page 0, starting at address 0)
    pub memory_size: usize,
    /// Whether the target has flash
    pub flash_supported: bool,
    /// Supported flash operations
    pub operations: Vec<String>,
    /// Session options and their initial values
    pub options: Vec<DummyOption>,
    /// Registers and their initial values
    pub registers: BTreeMap<String, u64>,
    /// Symbols known without loading a symbol file
    pub symbols: BTreeMap<String, i64>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        let registers = [("PC", 0u64), ("SP", 0x2000_0000), ("R0", 0), ("R1", 0)]
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();

        Self {
            cpus: vec![
                "Texas Instruments XDS110 USB Debug Probe/CORTEX_M4_0 (MSP432P401R)".into(),
                "Texas Instruments XDS110 USB Debug Probe/CORTEX_M3_0 (CC1310F128)".into(),
            ],
            connections: vec![
                "Texas Instruments XDS110 USB Debug Probe".into(),
                "Texas Instruments XDS100v3 USB Debug Probe".into(),
            ],
            devices: vec!["MSP432P401R".into(), "CC1310F128".into()],
            configurations: vec!["MSP432P401R.ccxml".into()],
            memory_size: 256 * 1024,
            flash_supported: true,
            operations: vec!["Erase".into(), "MassErase".into(), "BlankCheck".into()],
            options: vec![
                DummyOption {
                    id: "FlashEraseSetting".into(),
                    value: DummyOptionValue::String("Necessary Sectors Only".into()),
                },
                DummyOption {
                    id: "VerifyAfterProgramLoad".into(),
                    value: DummyOptionValue::String("Full verification".into()),
                },
                DummyOption {
                    id: "ResetOnRestart".into(),
                    value: DummyOptionValue::Boolean(true),
                },
                DummyOption {
                    id: "FlashClockMhz".into(),
                    value: DummyOptionValue::Numeric(16.0),
                },
            ],
            registers,
            symbols: BTreeMap::new(),
        }
    }
}

impl DummyConfig {
    /// Parse a target description from RON
    pub fn from_ron_str(s: &str) -> DeviceResult<Self> {
        ron::from_str(s)
            .map_err(|e| DeviceError::new(format!("invalid target description: {}", e)))
    }

    /// Load a target description from a RON file
    pub fn from_file(path: &Path) -> DeviceResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeviceError::new(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_ron_str(&content)
    }
}

/// Emulated target state shared by the server and its sessions
#[derive(Debug)]
pub(crate) struct State {
    pub(crate) config: DummyConfig,
    pub(crate) memory: Vec<u8>,
    pub(crate) registers: BTreeMap<String, u64>,
    pub(crate) options: Vec<DummyOption>,
    pub(crate) symbols: BTreeMap<String, i64>,
    pub(crate) connected: bool,
    pub(crate) target_config: Option<PathBuf>,
    pub(crate) script_timeout: Option<u64>,
    calls: Vec<String>,
    fail_on: Vec<String>,
}

impl State {
    fn new(config: DummyConfig) -> Self {
        Self {
            memory: vec![0xFF; config.memory_size],
            registers: config.registers.clone(),
            options: config.options.clone(),
            symbols: config.symbols.clone(),
            connected: false,
            target_config: None,
            script_timeout: None,
            calls: Vec::new(),
            fail_on: Vec::new(),
            config,
        }
    }

    /// Record a call, failing if a failure was injected for it
    pub(crate) fn record(&mut self, call: &str) -> DeviceResult<()> {
        self.calls.push(call.to_string());
        if self.fail_on.iter().any(|c| c == call) {
            log::debug!("dummy: injected failure in {}", call);
            return Err(DeviceError::new(format!("{} failed (injected)", call)));
        }
        Ok(())
    }

    pub(crate) fn memory_range(
        &self,
        address: u64,
        len: usize,
    ) -> DeviceResult<core::ops::Range<usize>> {
        let start = usize::try_from(address)
            .map_err(|_| DeviceError::new(format!("address 0x{:X} out of range", address)))?;
        match start.checked_add(len) {
            Some(end) if end <= self.memory.len() => Ok(start..end),
            _ => Err(DeviceError::new(format!(
                "range 0x{:08X}+0x{:X} exceeds memory size 0x{:X}",
                address,
                len,
                self.memory.len()
            ))),
        }
    }
}

/// Observer for the emulated targets
///
/// Cloned out of a [`DummyServer`] before it is handed to the bridge; stays
/// valid after the server and its sessions are gone.
#[derive(Clone)]
pub struct Journal {
    state: Rc<RefCell<State>>,
}

impl Journal {
    /// All calls so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    /// Number of times `call` was made
    pub fn count(&self, call: &str) -> usize {
        self.state.borrow().calls.iter().filter(|c| *c == call).count()
    }

    /// Make every future `call` fail
    pub fn fail_on(&self, call: &str) {
        self.state.borrow_mut().fail_on.push(call.to_string());
    }

    /// Whether the target is currently connected
    pub fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    /// Copy of `len` bytes of memory at `address`
    pub fn memory(&self, address: usize, len: usize) -> Vec<u8> {
        self.state.borrow().memory[address..address + len].to_vec()
    }

    /// Current value of a register
    pub fn register(&self, name: &str) -> Option<u64> {
        self.state.borrow().registers.get(name).copied()
    }

    /// Current value of an option
    pub fn option(&self, id: &str) -> Option<DummyOptionValue> {
        let state = self.state.borrow();
        state
            .options
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.value.clone())
    }

    /// Target configuration applied with `set_config`
    pub fn target_config(&self) -> Option<PathBuf> {
        self.state.borrow().target_config.clone()
    }

    /// Script timeout applied to the session
    pub fn script_timeout(&self) -> Option<u64> {
        self.state.borrow().script_timeout
    }
}

/// Dummy debug server
///
/// Emulates a debug server with the targets described by a [`DummyConfig`].
pub struct DummyServer {
    state: Rc<RefCell<State>>,
}

impl DummyServer {
    /// Create a new dummy server with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(State::new(config))),
        }
    }

    /// Create a new dummy server with the default targets
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Observer sharing this server's state
    pub fn journal(&self) -> Journal {
        Journal {
            state: Rc::clone(&self.state),
        }
    }

    fn find_cpu(&self, pattern: &str) -> DeviceResult<String> {
        let re = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            DeviceError::new(format!("invalid session pattern '{}': {}", pattern, e))
        })?;
        let state = self.state.borrow();
        state
            .config
            .cpus
            .iter()
            .find(|cpu| re.is_match(cpu))
            .cloned()
            .ok_or_else(|| DeviceError::new(format!("no session matches '{}'", pattern)))
    }
}

impl DebugServer for DummyServer {
    fn set_config(&mut self, config: &Path) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record("set_config")?;
        state.target_config = Some(config.to_path_buf());
        Ok(())
    }

    fn open_session(&mut self, pattern: &str) -> DeviceResult<Box<dyn DebugSession>> {
        self.state.borrow_mut().record("open_session")?;
        if self.state.borrow().target_config.is_none() {
            return Err(DeviceError::new("no target configuration set"));
        }
        let cpu = self.find_cpu(pattern)?;
        log::debug!("dummy: opened session on {}", cpu);
        Ok(Box::new(DummySession::new(Rc::clone(&self.state), cpu)))
    }

    fn list_cpus(&mut self) -> DeviceResult<Vec<String>> {
        let mut state = self.state.borrow_mut();
        state.record("list_cpus")?;
        Ok(state.config.cpus.clone())
    }

    fn config_generator(&mut self) -> DeviceResult<Box<dyn ConfigGenerator>> {
        self.state.borrow_mut().record("config_generator")?;
        Ok(Box::new(DummyConfigGenerator::new(Rc::clone(&self.state))))
    }

    fn open_companion(&mut self, pattern: &str) -> DeviceResult<Box<dyn CompanionSession>> {
        self.state.borrow_mut().record("open_companion")?;
        let cpu = self.find_cpu(pattern)?;
        Ok(Box::new(DummyCompanion::new(Rc::clone(&self.state), cpu)))
    }

    fn stop(&mut self) -> DeviceResult<()> {
        self.state.borrow_mut().record("stop")
    }
}

//! Debug-server capability traits
//!
//! The bridge never talks to a vendor debug stack directly. Everything it
//! needs from one is expressed by the traits here:
//!
//! - [`DebugServer`] - configures targets, opens sessions, lists CPUs and
//!   hands out configuration generators and companion sessions
//! - [`DebugSession`] - one session on one target: connection state, memory,
//!   flash, options, expressions and symbols
//! - [`ConfigGenerator`] - produces board configuration files and lists the
//!   known connections/devices
//! - [`CompanionSession`] - interactive IDE-side session used by `attach`
//!
//! Every call is attempted exactly once by the bridge; retries, if any, are
//! the implementation's business.

use crate::error::DeviceResult;
use std::path::Path;

/// Value type of a flash/session option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    /// Text value
    String,
    /// `true`/`false`
    Boolean,
    /// Number
    Numeric,
    /// Type the bridge does not know how to handle
    Other,
}

/// Typed option value
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Text value
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Numeric value
    Numeric(f64),
}

/// Debug server owning target configuration and session creation
pub trait DebugServer {
    /// Apply a target configuration file
    fn set_config(&mut self, config: &Path) -> DeviceResult<()>;

    /// Open a session on the first target whose name matches `pattern`
    ///
    /// `pattern` is a regular expression, typically `.*<chip>.*`.
    fn open_session(&mut self, pattern: &str) -> DeviceResult<Box<dyn DebugSession>>;

    /// Names of the CPUs available in the current configuration
    fn list_cpus(&mut self) -> DeviceResult<Vec<String>>;

    /// Create a generator for board configuration files
    fn config_generator(&mut self) -> DeviceResult<Box<dyn ConfigGenerator>>;

    /// Open an interactive companion session matching `pattern`
    fn open_companion(&mut self, pattern: &str) -> DeviceResult<Box<dyn CompanionSession>>;

    /// Stop the server; no further calls are made afterwards
    fn stop(&mut self) -> DeviceResult<()>;
}

/// One debug session on one target
pub trait DebugSession {
    // Session

    /// Limit how long any single scripted call may take
    fn set_script_timeout(&mut self, timeout_ms: u64) -> DeviceResult<()>;

    /// Close the session; no further calls are made afterwards
    fn terminate(&mut self) -> DeviceResult<()>;

    // Target

    /// Whether the target is currently connected
    fn is_connected(&self) -> bool;

    /// Connect to the target
    fn connect(&mut self) -> DeviceResult<()>;

    /// Disconnect from the target
    fn disconnect(&mut self) -> DeviceResult<()>;

    /// Reset the target
    fn reset(&mut self) -> DeviceResult<()>;

    // Memory

    /// Load a structured program image (e.g. ELF/COFF)
    fn load_program(&mut self, image: &Path) -> DeviceResult<()>;

    /// Load a raw binary image at `address`
    fn load_binary_program(&mut self, image: &Path, address: u64) -> DeviceResult<()>;

    /// Compare target memory against a structured program image
    fn verify_program(&mut self, image: &Path) -> DeviceResult<()>;

    /// Compare target memory at `address` against a raw binary image
    fn verify_binary_program(&mut self, image: &Path, address: u64) -> DeviceResult<()>;

    /// Read `count` values of `type_size` bits from `page`/`address`
    fn read_data(
        &mut self,
        page: u32,
        address: u64,
        type_size: u32,
        count: usize,
    ) -> DeviceResult<Vec<u64>>;

    /// Write values of `type_size` bits to `page`/`address`
    fn write_data(
        &mut self,
        page: u32,
        address: u64,
        data: &[u64],
        type_size: u32,
    ) -> DeviceResult<()>;

    /// Read a register by name
    fn read_register(&mut self, name: &str) -> DeviceResult<u64>;

    /// Write a register by name
    fn write_register(&mut self, name: &str, value: u64) -> DeviceResult<()>;

    // Flash

    /// Whether the target has programmable flash
    fn is_flash_supported(&self) -> bool;

    /// Run a named flash operation (e.g. a mass erase)
    fn perform_operation(&mut self, opcode: &str) -> DeviceResult<()>;

    /// Erase all unprotected sectors
    fn erase(&mut self) -> DeviceResult<()>;

    /// Names of the flash operations the target supports
    fn supported_operations(&self) -> DeviceResult<Vec<String>>;

    /// Human readable description of options whose id matches `pattern`
    fn describe_options(&self, pattern: &str) -> DeviceResult<Vec<String>>;

    // Options

    /// Whether an option with this id exists
    fn option_exists(&self, id: &str) -> bool;

    /// Value type of option `id`
    fn option_type(&self, id: &str) -> DeviceResult<OptionType>;

    /// Set a string option
    fn set_string(&mut self, id: &str, value: &str) -> DeviceResult<()>;

    /// Set a boolean option
    fn set_boolean(&mut self, id: &str, value: bool) -> DeviceResult<()>;

    /// Set a numeric option
    fn set_numeric(&mut self, id: &str, value: f64) -> DeviceResult<()>;

    /// Current value of option `id`
    fn get_option(&self, id: &str) -> DeviceResult<OptionValue>;

    // Expressions

    /// Load a symbol file for expression evaluation
    fn load_symbols(&mut self, path: &Path) -> DeviceResult<()>;

    /// Evaluate an expression on the target
    fn evaluate(&mut self, expression: &str) -> DeviceResult<i64>;
}

/// Generator for board configuration files
pub trait ConfigGenerator {
    /// Directory the configuration file is written to
    fn set_output_directory(&mut self, dir: &Path) -> DeviceResult<()>;

    /// Debug probe connection name
    fn set_connection(&mut self, connection: &str) -> DeviceResult<()>;

    /// Device type name
    fn set_device(&mut self, device: &str) -> DeviceResult<()>;

    /// Write the configuration file `name`
    fn create_configuration(&mut self, name: &str) -> DeviceResult<()>;

    /// Known debug probe connections
    fn list_connections(&mut self) -> DeviceResult<Vec<String>>;

    /// Known device types
    fn list_devices(&mut self) -> DeviceResult<Vec<String>>;

    /// Known configuration files
    fn list_configurations(&mut self) -> DeviceResult<Vec<String>>;
}

/// Interactive session opened for `attach`
pub trait CompanionSession {
    /// Close the companion session
    fn terminate(&mut self) -> DeviceResult<()>;
}

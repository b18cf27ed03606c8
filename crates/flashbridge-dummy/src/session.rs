//! Emulated debug session

use crate::{DummyOptionValue, State};
use flashbridge_core::{DebugSession, DeviceError, DeviceResult, OptionType, OptionValue};
use regex::Regex;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Session on one emulated target
///
/// Program images are treated as raw bytes: structured images are loaded at
/// address 0, binary images at the requested address.
pub struct DummySession {
    state: Rc<RefCell<State>>,
    cpu: String,
}

impl DummySession {
    pub(crate) fn new(state: Rc<RefCell<State>>, cpu: String) -> Self {
        Self { state, cpu }
    }

    /// Name of the target this session is attached to
    pub fn cpu(&self) -> &str {
        &self.cpu
    }

    fn require_connected(state: &State) -> DeviceResult<()> {
        if state.connected {
            Ok(())
        } else {
            Err(DeviceError::new("target is not connected"))
        }
    }

    fn load(&mut self, call: &str, image: &Path, address: u64) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record(call)?;
        Self::require_connected(&state)?;
        let data = std::fs::read(image)?;
        let range = state.memory_range(address, data.len())?;
        state.memory[range].copy_from_slice(&data);
        log::debug!("dummy: loaded {} bytes at 0x{:08X}", data.len(), address);
        Ok(())
    }

    fn verify(&mut self, call: &str, image: &Path, address: u64) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record(call)?;
        Self::require_connected(&state)?;
        let expected = std::fs::read(image)?;
        let range = state.memory_range(address, expected.len())?;
        let actual = &state.memory[range];

        let mismatch = actual
            .iter()
            .zip(expected.iter())
            .position(|(a, e)| a != e);
        if let Some(offset) = mismatch {
            return Err(DeviceError::new(format!(
                "verification failed at 0x{:08X}: expected 0x{:02X}, found 0x{:02X}",
                address + offset as u64,
                expected[offset],
                actual[offset]
            )));
        }
        Ok(())
    }

    fn find_option(state: &State, id: &str) -> DeviceResult<usize> {
        state
            .options
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| DeviceError::new(format!("no option '{}'", id)))
    }

    fn set_option(&mut self, call: &str, id: &str, value: DummyOptionValue) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record(call)?;
        let index = Self::find_option(&state, id)?;
        let option = &mut state.options[index];
        if std::mem::discriminant(&option.value) != std::mem::discriminant(&value) {
            return Err(DeviceError::new(format!(
                "option '{}' has a different value type",
                id
            )));
        }
        option.value = value;
        Ok(())
    }

    fn word_bytes(type_size: u32) -> DeviceResult<usize> {
        match type_size {
            8 | 16 | 32 | 64 => Ok(type_size as usize / 8),
            _ => Err(DeviceError::new(format!("unsupported type size {}", type_size))),
        }
    }

    fn check_page(page: u32) -> DeviceResult<()> {
        if page == 0 {
            Ok(())
        } else {
            Err(DeviceError::new(format!("page {} does not exist", page)))
        }
    }
}

fn parse_value(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

impl DebugSession for DummySession {
    fn set_script_timeout(&mut self, timeout_ms: u64) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record("set_script_timeout")?;
        state.script_timeout = Some(timeout_ms);
        Ok(())
    }

    fn terminate(&mut self) -> DeviceResult<()> {
        self.state.borrow_mut().record("terminate")
    }

    fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    fn connect(&mut self) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record("connect")?;
        state.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record("disconnect")?;
        state.connected = false;
        Ok(())
    }

    fn reset(&mut self) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record("reset")?;
        Self::require_connected(&state)?;
        let registers = state.config.registers.clone();
        state.registers = registers;
        Ok(())
    }

    fn load_program(&mut self, image: &Path) -> DeviceResult<()> {
        self.load("load_program", image, 0)
    }

    fn load_binary_program(&mut self, image: &Path, address: u64) -> DeviceResult<()> {
        self.load("load_binary_program", image, address)
    }

    fn verify_program(&mut self, image: &Path) -> DeviceResult<()> {
        self.verify("verify_program", image, 0)
    }

    fn verify_binary_program(&mut self, image: &Path, address: u64) -> DeviceResult<()> {
        self.verify("verify_binary_program", image, address)
    }

    fn read_data(
        &mut self,
        page: u32,
        address: u64,
        type_size: u32,
        count: usize,
    ) -> DeviceResult<Vec<u64>> {
        let mut state = self.state.borrow_mut();
        state.record("read_data")?;
        Self::require_connected(&state)?;
        Self::check_page(page)?;
        let width = Self::word_bytes(type_size)?;
        let range = state.memory_range(address, width * count)?;

        Ok(state.memory[range]
            .chunks(width)
            .map(|word| {
                word.iter()
                    .rev()
                    .fold(0u64, |acc, &byte| (acc << 8) | byte as u64)
            })
            .collect())
    }

    fn write_data(
        &mut self,
        page: u32,
        address: u64,
        data: &[u64],
        type_size: u32,
    ) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record("write_data")?;
        Self::require_connected(&state)?;
        Self::check_page(page)?;
        let width = Self::word_bytes(type_size)?;
        let range = state.memory_range(address, width * data.len())?;

        let mut bytes = Vec::with_capacity(range.len());
        for &value in data {
            if width < 8 && value >> (width * 8) != 0 {
                return Err(DeviceError::new(format!(
                    "value 0x{:X} does not fit in {} bits",
                    value, type_size
                )));
            }
            bytes.extend_from_slice(&value.to_le_bytes()[..width]);
        }
        state.memory[range].copy_from_slice(&bytes);
        Ok(())
    }

    fn read_register(&mut self, name: &str) -> DeviceResult<u64> {
        let mut state = self.state.borrow_mut();
        state.record("read_register")?;
        Self::require_connected(&state)?;
        state
            .registers
            .get(name)
            .copied()
            .ok_or_else(|| DeviceError::new(format!("unknown register '{}'", name)))
    }

    fn write_register(&mut self, name: &str, value: u64) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record("write_register")?;
        Self::require_connected(&state)?;
        match state.registers.get_mut(name) {
            Some(reg) => {
                *reg = value;
                Ok(())
            }
            None => Err(DeviceError::new(format!("unknown register '{}'", name))),
        }
    }

    fn is_flash_supported(&self) -> bool {
        self.state.borrow().config.flash_supported
    }

    fn perform_operation(&mut self, opcode: &str) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record("perform_operation")?;
        Self::require_connected(&state)?;
        if !state.config.operations.iter().any(|op| op == opcode) {
            return Err(DeviceError::new(format!("unsupported operation '{}'", opcode)));
        }
        if opcode.contains("Erase") {
            state.memory.fill(0xFF);
        }
        Ok(())
    }

    fn erase(&mut self) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record("erase")?;
        Self::require_connected(&state)?;
        if !state.config.flash_supported {
            return Err(DeviceError::new("flash is not supported on this device"));
        }
        state.memory.fill(0xFF);
        Ok(())
    }

    fn supported_operations(&self) -> DeviceResult<Vec<String>> {
        Ok(self.state.borrow().config.operations.clone())
    }

    fn describe_options(&self, pattern: &str) -> DeviceResult<Vec<String>> {
        let re = Regex::new(pattern)
            .map_err(|e| DeviceError::new(format!("invalid option pattern: {}", e)))?;
        let state = self.state.borrow();
        Ok(state
            .options
            .iter()
            .filter(|o| re.is_match(&o.id))
            .map(|o| match &o.value {
                DummyOptionValue::String(v) => format!("{} (string): {}", o.id, v),
                DummyOptionValue::Boolean(v) => format!("{} (boolean): {}", o.id, v),
                DummyOptionValue::Numeric(v) => format!("{} (numeric): {}", o.id, v),
            })
            .collect())
    }

    fn option_exists(&self, id: &str) -> bool {
        self.state.borrow().options.iter().any(|o| o.id == id)
    }

    fn option_type(&self, id: &str) -> DeviceResult<OptionType> {
        let state = self.state.borrow();
        let index = Self::find_option(&state, id)?;
        Ok(match state.options[index].value {
            DummyOptionValue::String(_) => OptionType::String,
            DummyOptionValue::Boolean(_) => OptionType::Boolean,
            DummyOptionValue::Numeric(_) => OptionType::Numeric,
        })
    }

    fn set_string(&mut self, id: &str, value: &str) -> DeviceResult<()> {
        self.set_option("set_string", id, DummyOptionValue::String(value.to_string()))
    }

    fn set_boolean(&mut self, id: &str, value: bool) -> DeviceResult<()> {
        self.set_option("set_boolean", id, DummyOptionValue::Boolean(value))
    }

    fn set_numeric(&mut self, id: &str, value: f64) -> DeviceResult<()> {
        self.set_option("set_numeric", id, DummyOptionValue::Numeric(value))
    }

    fn get_option(&self, id: &str) -> DeviceResult<OptionValue> {
        let state = self.state.borrow();
        let index = Self::find_option(&state, id)?;
        Ok(match &state.options[index].value {
            DummyOptionValue::String(v) => OptionValue::String(v.clone()),
            DummyOptionValue::Boolean(v) => OptionValue::Boolean(*v),
            DummyOptionValue::Numeric(v) => OptionValue::Numeric(*v),
        })
    }

    /// Symbol files are plain text, one `name = value` pair per line
    fn load_symbols(&mut self, path: &Path) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record("load_symbols")?;
        let content = std::fs::read_to_string(path)?;

        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parsed = line
                .split_once('=')
                .and_then(|(name, value)| Some((name.trim(), parse_value(value)?)));
            match parsed {
                Some((name, value)) => {
                    state.symbols.insert(name.to_string(), value);
                }
                None => {
                    return Err(DeviceError::new(format!(
                        "{}:{}: malformed symbol",
                        path.display(),
                        lineno + 1
                    )))
                }
            }
        }
        Ok(())
    }

    fn evaluate(&mut self, expression: &str) -> DeviceResult<i64> {
        let mut state = self.state.borrow_mut();
        state.record("evaluate")?;
        Self::require_connected(&state)?;
        let expr = expression.trim();

        if let Some(value) = parse_value(expr) {
            return Ok(value);
        }
        if let Some(value) = state.symbols.get(expr) {
            return Ok(*value);
        }
        if let Some(value) = state.registers.get(expr) {
            return Ok(*value as i64);
        }
        Err(DeviceError::new(format!("identifier not found: {}", expr)))
    }
}

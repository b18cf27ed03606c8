//! Two-tier argument grammar
//!
//! The controller passes a flat token vector. Tokens starting with `--` open
//! a command; within each command's run of tokens, tokens starting with `-`
//! open an option. Every other token is a value appended to the most
//! recently opened key. Values seen before any key land under
//! [`POSITIONALS`].
//!
//! ```text
//! --session -ccxml board.ccxml -chip MSP --flash -image app.out
//!
//! session:     { ccxml: [board.ccxml], chip: [MSP], positionals: [] }
//! flash:       { image: [app.out], positionals: [] }
//! positionals: { positionals: [] }
//! ```
//!
//! A handful of options are switches ([`SWITCHES`]): they never take a value,
//! so a token following them falls back to `positionals`. Names are not
//! validated here; unknown keys are kept and simply never consulted.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Reserved key collecting values not assigned to a named key
pub const POSITIONALS: &str = "positionals";

/// Marker opening a command-level key
pub const COMMAND_MARKER: &str = "--";

/// Marker opening an option-level key
pub const OPTION_MARKER: &str = "-";

/// Options that never take a value
pub const SWITCHES: &[&str] = &[
    "binary",
    "read",
    "write",
    "cpus",
    "connections",
    "devices",
    "configurations",
];

/// Option name to its values, in order of appearance
pub type OptionMap = BTreeMap<String, Vec<String>>;

/// Parsed command surface of one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandMap {
    commands: BTreeMap<String, OptionMap>,
}

impl CommandMap {
    /// Options of `command`, if the command was given
    pub fn get(&self, command: &str) -> Option<&OptionMap> {
        self.commands.get(command)
    }

    /// Whether `command` was given
    pub fn contains(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    /// Iterate over command names, `positionals` included
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Number of keys, `positionals` included
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Always false: `positionals` is always present
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Parse a token vector into a [`CommandMap`]
///
/// Total: every input yields a map, and the map always holds `positionals`.
pub fn parse<S: AsRef<str>>(tokens: &[S]) -> CommandMap {
    let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();

    let commands = group(&tokens, COMMAND_MARKER, &[])
        .into_iter()
        .map(|(name, run)| {
            let run: Vec<&str> = run.iter().map(String::as_str).collect();
            (name, group(&run, OPTION_MARKER, SWITCHES))
        })
        .collect();

    CommandMap { commands }
}

/// Split tokens into keyed runs
///
/// A token opens a key when it starts with `marker` and does not start with
/// a longer marker. Only the command marker is longer than the option
/// marker, so command tokens never reach the option pass anyway; the check
/// keeps the routine correct for either marker on its own.
fn group(tokens: &[&str], marker: &str, switches: &[&str]) -> OptionMap {
    let mut map = OptionMap::new();
    map.insert(POSITIONALS.to_string(), Vec::new());
    let mut current = POSITIONALS.to_string();

    for &token in tokens {
        if let Some(name) = strip_marker(token, marker) {
            map.insert(name.to_string(), Vec::new());
            current = if switches.contains(&name) {
                POSITIONALS.to_string()
            } else {
                name.to_string()
            };
        } else {
            map.entry(current.clone()).or_default().push(token.to_string());
        }
    }

    map
}

fn strip_marker<'a>(token: &'a str, marker: &str) -> Option<&'a str> {
    let longer = [COMMAND_MARKER, OPTION_MARKER]
        .into_iter()
        .filter(|m| m.len() > marker.len() && m.starts_with(marker))
        .any(|m| token.starts_with(m));
    if longer {
        return None;
    }
    token.strip_prefix(marker)
}

// =============================================================================
// Option value helpers
// =============================================================================

/// Values of `option` joined with single spaces
///
/// Paths containing spaces arrive split over several tokens; joining them
/// restores the original value.
pub fn joined(options: &OptionMap, option: &str) -> Option<String> {
    options
        .get(option)
        .filter(|values| !values.is_empty())
        .map(|values| values.join(" "))
}

/// Value of `option`, or the positional values if the option is absent
pub fn operand(options: &OptionMap, option: &str) -> Option<String> {
    joined(options, option).or_else(|| joined(options, POSITIONALS))
}

/// Value of `option`, failing with an argument error if absent
pub fn required(options: &OptionMap, option: &str) -> Result<String> {
    joined(options, option).ok_or_else(|| Error::Argument(format!("missing -{}", option)))
}

/// Parse a string as a hex (`0x`) or decimal number
pub fn parse_number(s: &str) -> Result<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| Error::Argument(format!("invalid hex value '{}': {}", s, e)))
    } else {
        s.parse::<u64>()
            .map_err(|e| Error::Argument(format!("invalid number '{}': {}", s, e)))
    }
}

/// Numeric value of `option`, or `default` if absent
pub fn number_or(options: &OptionMap, option: &str, default: u64) -> Result<u64> {
    match joined(options, option) {
        Some(value) => parse_number(&value),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_input() {
        let map = parse::<&str>(&[]);
        assert_eq!(map.len(), 1);
        let positionals = map.get(POSITIONALS).unwrap();
        assert_eq!(positionals.get(POSITIONALS), Some(&Vec::new()));
    }

    #[test]
    fn test_binary_switch_leaves_image_positional() {
        let map = parse(&["--flash", "-binary", "img.bin", "-address", "0x100"]);
        let flash = map.get("flash").unwrap();
        assert_eq!(flash.get("binary"), Some(&Vec::new()));
        assert_eq!(flash.get("address"), Some(&values(&["0x100"])));
        assert_eq!(flash.get(POSITIONALS), Some(&values(&["img.bin"])));
        assert_eq!(flash.len(), 3);
    }

    #[test]
    fn test_session_scenario() {
        let map = parse(&[
            "--session", "-ccxml", "cfg.ccxml", "-chip", "MSP", "-timeout", "5000", "--flash",
            "-binary", "img.bin", "-address", "0x1000",
        ]);
        let session = map.get("session").unwrap();
        assert_eq!(session.get("ccxml"), Some(&values(&["cfg.ccxml"])));
        assert_eq!(session.get("chip"), Some(&values(&["MSP"])));
        assert_eq!(session.get("timeout"), Some(&values(&["5000"])));
        assert!(map.contains("flash"));
        assert!(map.contains(POSITIONALS));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_marker_without_value() {
        let map = parse(&["--erase", "--reset"]);
        assert_eq!(map.get("erase").unwrap().len(), 1);
        assert_eq!(map.get("reset").unwrap().get(POSITIONALS), Some(&Vec::new()));
    }

    #[test]
    fn test_leading_values_are_positional() {
        let map = parse(&["stray", "-x", "--list", "-cpus"]);
        let top = map.get(POSITIONALS).unwrap();
        assert_eq!(top.get(POSITIONALS), Some(&values(&["stray"])));
        assert_eq!(top.get("x"), Some(&Vec::new()));
        assert!(map.get("list").unwrap().contains_key("cpus"));
    }

    #[test]
    fn test_multi_value_option() {
        let map = parse(&["--memory", "-write", "-address", "0x20", "-data", "1", "2", "0xff"]);
        let memory = map.get("memory").unwrap();
        assert_eq!(memory.get("data"), Some(&values(&["1", "2", "0xff"])));
        assert_eq!(memory.get("write"), Some(&Vec::new()));
    }

    #[test]
    fn test_repeated_command_keeps_last_run() {
        let map = parse(&["--setoption", "-A", "1", "--setoption", "-B", "2"]);
        let options = map.get("setoption").unwrap();
        assert!(!options.contains_key("A"));
        assert_eq!(options.get("B"), Some(&values(&["2"])));
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let map = parse(&["--frobnicate", "-level", "11"]);
        assert_eq!(
            map.get("frobnicate").unwrap().get("level"),
            Some(&values(&["11"]))
        );
    }

    #[test]
    fn test_option_pass_ignores_command_markers() {
        let grouped = group(&["--x", "-y", "1"], OPTION_MARKER, &[]);
        assert_eq!(grouped.get(POSITIONALS), Some(&values(&["--x"])));
        assert_eq!(grouped.get("y"), Some(&values(&["1"])));
    }

    #[test]
    fn test_joined_and_operand() {
        let map = parse(&["--flash", "-image", "My", "Image.out", "--verify", "app.out"]);
        let flash = map.get("flash").unwrap();
        assert_eq!(joined(flash, "image"), Some("My Image.out".to_string()));
        let verify = map.get("verify").unwrap();
        assert_eq!(joined(verify, "image"), None);
        assert_eq!(operand(verify, "image"), Some("app.out".to_string()));
        assert!(required(verify, "image").is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("4096").unwrap(), 4096);
        assert_eq!(parse_number("0x1000").unwrap(), 4096);
        assert_eq!(parse_number("0XFF").unwrap(), 255);
        assert!(parse_number("0xZZ").is_err());
        assert!(parse_number("ten").is_err());
    }
}

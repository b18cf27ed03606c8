//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flashbridge")]
#[command(author, version, about = "Scripted debug-server bridge", long_about = None)]
#[command(after_help = "\
Command tokens use a two-level grammar: `--name` opens a command and `-name`
opens an option of that command; everything else is a value of the most
recently opened key.

Example:
  flashbridge /opt/flashbridge 5555 --session -ccxml board.ccxml -chip MSP \\
      --flash -binary -image app.bin -address 0x1000")]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Debug-server backend
    #[arg(long, default_value = "dummy")]
    pub backend: String,

    /// Target description for the dummy backend (RON)
    /// Defaults to <BASE_PATH>/targets.ron, then to a built-in target
    #[arg(long)]
    pub target_db: Option<PathBuf>,

    /// Installation root
    pub base_path: PathBuf,

    /// Local TCP port the result is delivered to
    pub port: u16,

    /// Command tokens (--session, --flash, --memory, ...)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub tokens: Vec<String>,
}

impl Cli {
    /// Log level selected by `-v`
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// One command key of the token grammar
pub struct CommandDoc {
    /// Name after `--`
    pub name: &'static str,
    /// Option keys after `-`
    pub options: &'static [&'static str],
    pub about: &'static str,
}

/// Command keys in dispatch order
pub const COMMANDS: &[CommandDoc] = &[
    CommandDoc {
        name: "debug",
        options: &[],
        about: "Enable trace logging for the rest of the invocation",
    },
    CommandDoc {
        name: "session",
        options: &["ccxml", "chip", "timeout"],
        about: "Apply a target configuration and open a session on the matching target",
    },
    CommandDoc {
        name: "list",
        options: &["cpus", "connections", "devices", "configurations"],
        about: "List targets, connections, devices or configuration files",
    },
    CommandDoc {
        name: "printoptions",
        options: &["id"],
        about: "Print the device options matching a pattern",
    },
    CommandDoc {
        name: "genccxml",
        options: &["directory", "connection", "devicetype", "ccxml"],
        about: "Generate a target configuration file",
    },
    CommandDoc {
        name: "operation",
        options: &["opcode"],
        about: "Run a named flash operation",
    },
    CommandDoc {
        name: "setoption",
        options: &["<id>"],
        about: "Set device options, one option key per id",
    },
    CommandDoc {
        name: "getoption",
        options: &["id"],
        about: "Read a device option",
    },
    CommandDoc {
        name: "flash",
        options: &["image", "binary", "address"],
        about: "Load an image onto the target",
    },
    CommandDoc {
        name: "erase",
        options: &[],
        about: "Erase the target's flash",
    },
    CommandDoc {
        name: "verify",
        options: &["image", "binary", "address"],
        about: "Verify an image against the target",
    },
    CommandDoc {
        name: "reset",
        options: &[],
        about: "Reset the target",
    },
    CommandDoc {
        name: "memory",
        options: &["read", "write", "page", "address", "numBytes", "data"],
        about: "Read or write target memory, one byte per value",
    },
    CommandDoc {
        name: "register",
        options: &["read", "write", "name", "value"],
        about: "Read or write a target register",
    },
    CommandDoc {
        name: "evaluate",
        options: &["expression", "symbols"],
        about: "Evaluate an expression, loading a symbol file first",
    },
    CommandDoc {
        name: "attach",
        options: &[],
        about: "Open an IDE session after the result is sent and wait for input",
    },
];

impl CommandDoc {
    /// Whether `option` is one of this command's option keys
    ///
    /// `setoption` takes arbitrary option ids.
    pub fn accepts(&self, option: &str) -> bool {
        self.options == ["<id>"] || self.options.contains(&option)
    }
}

/// Command key `name` of the token grammar
pub fn command(name: &str) -> Option<&'static CommandDoc> {
    COMMANDS.iter().find(|c| c.name == name)
}

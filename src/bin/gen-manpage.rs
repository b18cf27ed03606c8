//! Man page generator for flashbridge
//!
//! Renders the clap-derived page, then appends the command token grammar the
//! controller passes after `<PORT>`, the result payload and the exit status.
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

#[allow(dead_code)]
#[path = "../cli.rs"]
mod cli;

fn main() -> io::Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&output_dir)?;

    let mut buffer = Vec::new();
    clap_mangen::Man::new(cli::Cli::command()).render(&mut buffer)?;
    render_tokens(&mut buffer)?;

    let output_path = output_dir.join("flashbridge.1");
    fs::write(&output_path, buffer)?;

    println!("Man page generated at: {}", output_path.display());
    println!("  man -l {}", output_path.display());
    Ok(())
}

/// Escape text for roff
fn roff(text: &str) -> String {
    text.replace('\\', "\\\\").replace('-', "\\-")
}

/// Append the token grammar, result and exit status sections
fn render_tokens(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, ".SH \"COMMAND TOKENS\"")?;
    writeln!(
        out,
        "{}",
        roff(
            "Tokens after PORT form a two-level map. --name opens a command, \
             -name opens an option of the current command, and any other token \
             is a value of the most recently opened key. Values given before \
             any option land in the command's positionals. Commands run in the \
             order listed; the first command that produces a result ends the run."
        )
    )?;

    for command in cli::COMMANDS {
        writeln!(out, ".TP")?;
        write!(out, "\\fB{}\\fR", roff(&format!("--{}", command.name)))?;
        for option in command.options {
            write!(out, " [\\fB{}\\fR]", roff(&format!("-{}", option)))?;
        }
        writeln!(out)?;
        writeln!(out, "{}", roff(command.about))?;
    }

    writeln!(out, ".SH RESULT")?;
    writeln!(
        out,
        "{}",
        roff(
            "Exactly one payload is sent to 127.0.0.1:PORT. Sequences are joined \
             with ;; and failures are sent as KIND: message, where KIND is one of \
             SessionError, UnsupportedOperation, OptionError, DeviceIOError or \
             ArgumentError."
        )
    )?;

    writeln!(out, ".SH \"EXIT STATUS\"")?;
    writeln!(out, "{}", roff("0 on success, -1 (255) on any failure."))?;
    Ok(())
}

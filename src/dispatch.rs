//! Command dispatch
//!
//! Commands are checked in a fixed order. `session` opens the session and
//! falls through. Terminal commands (`list`, `printoptions`, `genccxml`,
//! `getoption`, `flash`, `verify`, `reset`, `memory`, `register`,
//! `evaluate`) end dispatch with their result. `operation`, `setoption` and
//! `erase` fall through on success, leaving `true` as the accumulated
//! result. The first error from any command ends dispatch.
//!
//! ```text
//! session -> list -> printoptions -> genccxml -> operation -> setoption
//!   -> getoption -> flash -> erase -> verify -> reset -> memory
//!   -> register -> evaluate -> (fallthrough)
//! ```
//!
//! When several terminal commands are given only the first in this order
//! runs; the others are ignored.

use crate::bridge::Context;
use crate::cli;
use crate::commands;
use flashbridge_core::args::{self, POSITIONALS};
use flashbridge_core::{CommandMap, CommandResult, Result, SessionArgs};

/// How dispatch ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A terminal command ran and produced the result
    Terminal(CommandResult),
    /// No terminal command was given; carries the accumulated result
    Fallthrough(CommandResult),
}

impl Outcome {
    pub fn into_result(self) -> CommandResult {
        match self {
            Self::Terminal(r) | Self::Fallthrough(r) => r,
        }
    }
}

/// Run the commands in `parsed` against `ctx`
pub fn dispatch(parsed: &CommandMap, ctx: &mut Context) -> Result<Outcome> {
    if parsed.contains("debug") {
        log::set_max_level(log::LevelFilter::Trace);
        log::debug!("Trace logging enabled");
    }
    check_keys(parsed);

    let mut accumulated = CommandResult::Empty;

    if let Some(options) = parsed.get("session") {
        ctx.start_session(&SessionArgs::from_options(options)?)?;
    }

    if let Some(options) = parsed.get("list") {
        return commands::list::run(ctx.server(), options).map(Outcome::Terminal);
    }

    if let Some(options) = parsed.get("printoptions") {
        let session = ctx.session_mut()?.session()?;
        return commands::options::print(session, options).map(Outcome::Terminal);
    }

    if let Some(options) = parsed.get("genccxml") {
        return commands::ccxml::run(ctx.server(), options).map(Outcome::Terminal);
    }

    if let Some(options) = parsed.get("operation") {
        commands::operation::run(ctx.session_mut()?, options)?;
        accumulated = CommandResult::success();
    }

    if let Some(options) = parsed.get("setoption") {
        let applied = commands::options::set_all(ctx.session_mut()?.session()?, options)?;
        log::info!("Applied {} option(s)", applied.len());
        accumulated = CommandResult::success();
    }

    if let Some(options) = parsed.get("getoption") {
        let session = ctx.session_mut()?.session()?;
        return commands::options::get(session, options).map(Outcome::Terminal);
    }

    if let Some(options) = parsed.get("flash") {
        return commands::flash::run(ctx.session_mut()?, options).map(Outcome::Terminal);
    }

    if parsed.contains("erase") {
        commands::erase::run(ctx.session_mut()?)?;
        accumulated = CommandResult::success();
    }

    if let Some(options) = parsed.get("verify") {
        return commands::verify::run(ctx.session_mut()?, options).map(Outcome::Terminal);
    }

    if parsed.contains("reset") {
        return commands::reset::run(ctx.session_mut()?).map(Outcome::Terminal);
    }

    if let Some(options) = parsed.get("memory") {
        return commands::memory::run(ctx.session_mut()?, options).map(Outcome::Terminal);
    }

    if let Some(options) = parsed.get("register") {
        return commands::register::run(ctx.session_mut()?, options).map(Outcome::Terminal);
    }

    if let Some(options) = parsed.get("evaluate") {
        return commands::expression::run(ctx.session_mut()?, options).map(Outcome::Terminal);
    }

    Ok(Outcome::Fallthrough(accumulated))
}

/// Warn about keys that will never be consulted
fn check_keys(parsed: &CommandMap) {
    for name in parsed.names().filter(|n| *n != POSITIONALS) {
        let Some(doc) = cli::command(name) else {
            log::warn!("Ignoring unknown command --{}", name);
            continue;
        };
        log::trace!("--{}: {}", name, doc.about);

        let options = parsed.get(name).into_iter().flat_map(|o| o.keys());
        for option in options.filter(|o| o.as_str() != POSITIONALS && !doc.accepts(o)) {
            log::warn!("Ignoring unknown option -{} of --{}", option, name);
        }
    }
    if let Some(stray) = parsed
        .get(POSITIONALS)
        .and_then(|options| args::joined(options, POSITIONALS))
    {
        log::warn!("Ignoring arguments before the first command: {}", stray);
    }
}

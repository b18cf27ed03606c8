//! flashbridge - Scripted debug-server bridge
//!
//! A controller process runs flashbridge once per command set:
//!
//! ```text
//! flashbridge <BASE_PATH> <PORT> --session -ccxml board.ccxml -chip MSP --flash -image app.out
//! ```
//!
//! # Architecture
//!
//! The command tokens are parsed into a two-level command map, dispatched in
//! a fixed precedence order against a debug server backend, and the single
//! result is delivered to `127.0.0.1:<PORT>`. The session and the server are
//! always released before the process exits with 0 (success) or -1 (failure).
//!
//! Backends implement the capability traits in `flashbridge-core`; the
//! `dummy` backend emulates targets in memory.

mod backends;
mod bridge;
mod cli;
mod commands;
mod dispatch;
mod report;

use clap::Parser;
use cli::Cli;
use report::TcpTransport;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG takes over filtering when set; otherwise the max level is the
    // only gate, so `-v` and the `debug` command can raise it
    let from_env = std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some();
    let mut logger = env_logger::Builder::from_env(env_logger::Env::default());
    if !from_env {
        logger.filter_level(log::LevelFilter::Trace);
    }
    logger.init();
    if !from_env {
        log::set_max_level(cli.log_level());
    }

    log::debug!("Base path {}, result port {}", cli.base_path.display(), cli.port);
    let code = bridge::launch(
        || backends::open_backend(&cli.backend, &cli.base_path, cli.target_db.as_deref()),
        Box::new(TcpTransport::new(cli.port)),
        &cli.tokens,
    );
    std::process::exit(code);
}

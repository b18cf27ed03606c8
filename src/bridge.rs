//! Invocation pipeline and exit control
//!
//! One invocation: parse the tokens, dispatch, deliver the single result,
//! optionally attach, then tear everything down and hand back the exit code.

use crate::commands::attach::{self, InputProbe, StdinProbe};
use crate::dispatch::{self, Outcome};
use crate::report::{ResultTransport, Reporter};
use flashbridge_core::session;
use flashbridge_core::{args, CommandResult, DebugServer, Error, Result, SessionArgs, SessionHandle};
use std::time::Duration;

/// Exit code of a successful invocation
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code of an invocation that hit an error
pub const EXIT_FAILURE: i32 = -1;

/// Open the debug server with `open`, then run the invocation
///
/// A server that fails to open still gets its session error delivered, so
/// the controller receives a payload on every path.
pub fn launch<S, F>(open: F, transport: Box<dyn ResultTransport>, tokens: &[S]) -> i32
where
    S: AsRef<str>,
    F: FnOnce() -> std::result::Result<Box<dyn DebugServer>, Box<dyn std::error::Error>>,
{
    match open() {
        Ok(server) => Bridge::new(server, transport).run(tokens),
        Err(e) => {
            let err = Error::Session(format!("failed to open backend: {}", e));
            log::error!("{}: {}", err.kind(), err);
            if let Err(e) = Reporter::new(transport).deliver(&CommandResult::from(&err)) {
                log::error!("{}", e);
            }
            EXIT_FAILURE
        }
    }
}

/// Debug server and session owned by one invocation
///
/// Dropping the context tears the session down and stops the server, so
/// both are released on every exit path.
pub struct Context {
    server: Box<dyn DebugServer>,
    session: Option<SessionHandle>,
    stopped: bool,
}

impl Context {
    pub fn new(server: Box<dyn DebugServer>) -> Self {
        Self {
            server,
            session: None,
            stopped: false,
        }
    }

    pub fn server(&mut self) -> &mut dyn DebugServer {
        self.server.as_mut()
    }

    /// Configure the server and open the invocation's session
    pub fn start_session(&mut self, args: &SessionArgs) -> Result<()> {
        session::teardown(self.session.as_mut());
        self.session = Some(SessionHandle::start(self.server.as_mut(), args)?);
        Ok(())
    }

    /// The open session, or a session error if none was started
    pub fn session_mut(&mut self) -> Result<&mut SessionHandle> {
        self.session.as_mut().ok_or_else(Error::no_session)
    }

    /// Pattern the session was opened with
    pub fn session_pattern(&self) -> Option<&str> {
        self.session.as_ref().map(SessionHandle::pattern)
    }

    /// Tear down the session (if any) and stop the server
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        session::teardown(self.session.as_mut());
        if !self.stopped {
            self.stopped = true;
            if let Err(e) = self.server.stop() {
                log::warn!("Failed to stop debug server: {}", e);
            }
            log::debug!("Debug server stopped");
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Runs one invocation end to end
pub struct Bridge {
    ctx: Context,
    reporter: Reporter,
    probe: Option<Box<dyn InputProbe>>,
    poll_interval: Duration,
}

impl Bridge {
    pub fn new(server: Box<dyn DebugServer>, transport: Box<dyn ResultTransport>) -> Self {
        Self {
            ctx: Context::new(server),
            reporter: Reporter::new(transport),
            probe: None,
            poll_interval: attach::POLL_INTERVAL,
        }
    }

    /// Use `probe` instead of stdin to detect when `attach` may finish
    #[cfg(test)]
    pub fn with_probe(mut self, probe: Box<dyn InputProbe>, poll_interval: Duration) -> Self {
        self.probe = Some(probe);
        self.poll_interval = poll_interval;
        self
    }

    /// Run the invocation described by `tokens` and return the exit code
    pub fn run<S: AsRef<str>>(mut self, tokens: &[S]) -> i32 {
        let parsed = args::parse(tokens);
        log::debug!("Commands: {:?}", parsed);

        let (result, mut code, fell_through) = match dispatch::dispatch(&parsed, &mut self.ctx) {
            Ok(outcome) => {
                let fell_through = matches!(outcome, Outcome::Fallthrough(_));
                (outcome.into_result(), EXIT_SUCCESS, fell_through)
            }
            Err(e) => {
                log::error!("{}: {}", e.kind(), e);
                (CommandResult::from(&e), EXIT_FAILURE, false)
            }
        };

        if let Err(e) = self.reporter.deliver(&result) {
            log::error!("{}", e);
        }

        if parsed.contains("attach") {
            if fell_through {
                if let Err(e) = self.attach() {
                    log::error!("attach: {}", e);
                    code = EXIT_FAILURE;
                }
            } else {
                log::debug!("Skipping attach: dispatch did not fall through");
            }
        }

        self.ctx.shutdown();
        code
    }

    fn attach(&mut self) -> Result<()> {
        let pattern = self
            .ctx
            .session_pattern()
            .unwrap_or(".*")
            .to_string();
        let mut probe = self
            .probe
            .take()
            .unwrap_or_else(|| Box::new(StdinProbe::spawn()));
        attach::run(
            self.ctx.server(),
            &pattern,
            probe.as_mut(),
            self.poll_interval,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::attach::tests::CountdownProbe;
    use crate::report::tests::RecordingTransport;
    use flashbridge_dummy::{DummyConfig, DummyServer, Journal};
    use std::io::Write;
    use std::path::Path;

    struct Harness {
        bridge: Bridge,
        journal: Journal,
        transport: RecordingTransport,
    }

    fn harness(config: DummyConfig) -> Harness {
        let server = DummyServer::new(config);
        let journal = server.journal();
        let transport = RecordingTransport::default();
        let bridge = Bridge::new(Box::new(server), Box::new(transport.clone()))
            .with_probe(Box::new(CountdownProbe::new(2)), Duration::ZERO);
        Harness {
            bridge,
            journal,
            transport,
        }
    }

    impl Harness {
        fn run(self, tokens: &[&str]) -> (i32, Vec<String>, Journal) {
            let code = self.bridge.run(tokens);
            let payloads = self.transport.payloads.borrow().clone();
            (code, payloads, self.journal)
        }
    }

    fn image(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_session_and_binary_flash() {
        let img = image(&[1, 2, 3, 4]);
        let path = img.path().to_str().unwrap();

        let (code, payloads, journal) = harness(DummyConfig::default()).run(&[
            "--session", "-ccxml", "cfg.ccxml", "-chip", "MSP", "-timeout", "5000",
            "--flash", "-binary", path, "-address", "0x1000",
        ]);

        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(payloads, vec!["true"]);
        assert_eq!(journal.script_timeout(), Some(5000));
        assert_eq!(journal.memory(0x1000, 4), vec![1, 2, 3, 4]);
        assert_eq!(
            journal.calls(),
            vec![
                "set_config",
                "open_session",
                "set_script_timeout",
                "connect",
                "load_binary_program",
                "disconnect",
                "terminate",
                "stop",
            ]
        );
    }

    #[test]
    fn test_getoption_without_session() {
        let (code, payloads, journal) =
            harness(DummyConfig::default()).run(&["--getoption", "-id", "FlashEraseSetting"]);

        assert_eq!(code, EXIT_FAILURE);
        assert_eq!(payloads, vec!["SessionError: no connected session"]);
        assert_eq!(journal.calls(), vec!["stop"]);
    }

    #[test]
    fn test_failure_tears_down_and_reports_once() {
        let img = image(b"app");
        let path = img.path().to_str().unwrap();
        let h = harness(DummyConfig::default());
        h.journal.fail_on("load_program");

        let (code, payloads, journal) = h.run(&[
            "--session", "-ccxml", "cfg.ccxml", "-chip", "MSP", "--flash", "-image", path,
        ]);

        assert_eq!(code, EXIT_FAILURE);
        assert_eq!(
            payloads,
            vec!["DeviceIOError: load_program failed (injected)"]
        );
        assert_eq!(journal.count("disconnect"), 1);
        assert_eq!(journal.count("terminate"), 1);
        assert_eq!(journal.count("stop"), 1);
        assert!(!journal.is_connected());
    }

    #[test]
    fn test_teardown_errors_do_not_change_result() {
        let h = harness(DummyConfig::default());
        h.journal.fail_on("disconnect");
        h.journal.fail_on("stop");

        let (code, payloads, journal) = h.run(&[
            "--session", "-ccxml", "cfg.ccxml", "--reset",
        ]);

        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(payloads, vec!["true"]);
        assert_eq!(journal.count("terminate"), 1);
    }

    #[test]
    fn test_empty_invocation() {
        let (code, payloads, journal) = harness(DummyConfig::default()).run(&[]);
        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(payloads, vec![""]);
        assert_eq!(journal.calls(), vec!["stop"]);
    }

    #[test]
    fn test_session_only_delivers_empty() {
        let (code, payloads, journal) =
            harness(DummyConfig::default()).run(&["--session", "-ccxml", "cfg.ccxml"]);
        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(payloads, vec![""]);
        assert_eq!(journal.count("connect"), 0);
        assert_eq!(journal.count("disconnect"), 0);
        assert_eq!(journal.count("terminate"), 1);
    }

    #[test]
    fn test_erase_failure_is_fatal() {
        let config = DummyConfig {
            flash_supported: false,
            ..DummyConfig::default()
        };
        let (code, payloads, journal) = harness(config).run(&[
            "--session", "-ccxml", "cfg.ccxml", "--erase", "--reset",
        ]);

        assert_eq!(code, EXIT_FAILURE);
        assert_eq!(
            payloads,
            vec!["UnsupportedOperation: flash is not supported on this device"]
        );
        assert_eq!(journal.count("reset"), 0);
    }

    #[test]
    fn test_attach_after_delivery() {
        let (code, payloads, journal) = harness(DummyConfig::default()).run(&[
            "--session", "-ccxml", "cfg.ccxml", "-chip", "CC1310",
            "--setoption", "-ResetOnRestart", "false", "--attach",
        ]);

        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(payloads, vec!["true"]);
        let calls = journal.calls();
        let tail: Vec<&str> = calls.iter().rev().take(4).rev().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec!["open_companion", "companion_terminate", "terminate", "stop"]
        );
    }

    #[test]
    fn test_attach_skipped_after_terminal_command() {
        let (code, payloads, journal) = harness(DummyConfig::default()).run(&[
            "--session", "-ccxml", "cfg.ccxml", "--reset", "--attach",
        ]);

        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(payloads, vec!["true"]);
        assert_eq!(journal.count("open_companion"), 0);
    }

    #[test]
    fn test_attach_failure_sets_exit_code() {
        let h = harness(DummyConfig::default());
        h.journal.fail_on("open_companion");
        let (code, payloads, _) = h.run(&["--attach"]);

        assert_eq!(code, EXIT_FAILURE);
        assert_eq!(payloads, vec![""]);
    }

    #[test]
    fn test_launch_reports_unknown_backend() {
        let transport = RecordingTransport::default();
        let code = launch(
            || crate::backends::open_backend("xds110", Path::new("."), None),
            Box::new(transport.clone()),
            &["--list", "-cpus"],
        );

        assert_eq!(code, EXIT_FAILURE);
        let payloads = transport.payloads.borrow();
        assert_eq!(payloads.len(), 1);
        assert!(payloads[0]
            .starts_with("SessionError: failed to open backend: Unknown backend 'xds110'"));
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_launch_reports_bad_target_description() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("bad.ron");
        std::fs::write(&db, "not ron").unwrap();

        let transport = RecordingTransport::default();
        let code = launch(
            || crate::backends::open_backend("dummy", dir.path(), Some(&db)),
            Box::new(transport.clone()),
            &["--getoption", "-id", "X"],
        );

        assert_eq!(code, EXIT_FAILURE);
        let payloads = transport.payloads.borrow();
        assert_eq!(payloads.len(), 1);
        assert!(payloads[0].starts_with("SessionError: failed to open backend: "));
    }

    #[test]
    fn test_launch_runs_opened_server() {
        let server = DummyServer::new_default();
        let journal = server.journal();
        let transport = RecordingTransport::default();
        let code = launch(
            move || Ok(Box::new(server) as Box<dyn DebugServer>),
            Box::new(transport.clone()),
            &["--list", "-devices"],
        );

        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(*transport.payloads.borrow(), vec!["MSP432P401R;;CC1310F128"]);
        assert_eq!(journal.count("stop"), 1);
    }

    #[test]
    fn test_context_drop_releases_everything() {
        let server = DummyServer::new_default();
        let journal = server.journal();
        {
            let mut ctx = Context::new(Box::new(server));
            let args = SessionArgs {
                config: "cfg.ccxml".into(),
                chip: "MSP".into(),
                timeout_ms: None,
            };
            ctx.start_session(&args).unwrap();
            ctx.session_mut().unwrap().connect_if_needed().unwrap();
        }
        assert!(!journal.is_connected());
        assert_eq!(journal.count("terminate"), 1);
        assert_eq!(journal.count("stop"), 1);
    }
}

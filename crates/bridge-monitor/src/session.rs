//! Monitoring session
//!
//! Resolves the command line, opens the live or replay channel and pumps
//! records through the dispatcher one at a time until the channel is
//! exhausted, fails, or the shutdown future completes.

use crate::channel::{ChannelKind, EventChannel};
use crate::config_file::MonitorSettings;
use crate::decode::{LinkRenderer, NeighborRenderer, RecordRenderer, time};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::mode::{self, MonitorCommand, MonitorConfig};
use crate::netlink::LiveChannel;
use crate::replay::ReplayChannel;
use std::future::Future;
use std::io::Write;
use tracing::{error, info, instrument};

/// Usage text for the `help` keyword
pub const USAGE: &str = "Usage: bridge monitor [file FILE] [ all | link | fdb ]\n";

/// Process exit status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Replay exhausted or interrupted
    Success,
    /// Help requested or bad command line
    Usage,
    /// Configuration file could not be loaded
    ConfigFailed,
    /// Capture file could not be opened or replayed
    ReplayFailed,
    /// Live subscription could not be opened
    OpenFailed,
    /// Live listen loop failed
    ListenFailed,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::OpenFailed => 1,
            ExitStatus::ListenFailed => 2,
            ExitStatus::Usage | ExitStatus::ConfigFailed | ExitStatus::ReplayFailed => 255,
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitStatus::Success
    }

    fn open_failure(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Live => ExitStatus::OpenFailed,
            ChannelKind::Replay => ExitStatus::ReplayFailed,
        }
    }

    fn loop_failure(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Live => ExitStatus::ListenFailed,
            ChannelKind::Replay => ExitStatus::ReplayFailed,
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

/// Presentation and transport options independent of the monitor mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Write a wall-clock capture line ahead of every record
    pub timestamp: bool,
    /// SO_RCVBUF for the live socket
    pub receive_buffer_bytes: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_settings(&MonitorSettings::default())
    }
}

impl SessionOptions {
    pub fn from_settings(settings: &MonitorSettings) -> Self {
        Self {
            timestamp: settings.output.timestamp,
            receive_buffer_bytes: settings.netlink.receive_buffer_bytes,
        }
    }
}

/// Why a session loop stopped without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Channel reported the end of its records
    Exhausted,
    /// Shutdown was requested
    Interrupted,
}

/// An open channel plus the dispatcher feeding the sink
pub struct Session<L = LinkRenderer, N = NeighborRenderer> {
    channel: Box<dyn EventChannel>,
    dispatcher: Dispatcher<L, N>,
    timestamp: bool,
    dispatched: u64,
}

impl Session {
    /// Open the channel `config` selects: replay if a file is given, live otherwise
    pub async fn open(config: &MonitorConfig, options: &SessionOptions) -> Result<Self> {
        let channel: Box<dyn EventChannel> = match &config.replay_file {
            Some(path) => Box::new(ReplayChannel::open(path).await?),
            None => Box::new(LiveChannel::open(
                config.groups,
                options.receive_buffer_bytes,
            )?),
        };
        Ok(Self::new(
            channel,
            Dispatcher::with_default_renderers(config.banner),
            options,
        ))
    }
}

impl<L, N> Session<L, N>
where
    L: RecordRenderer,
    N: RecordRenderer,
{
    pub fn new(
        channel: Box<dyn EventChannel>,
        dispatcher: Dispatcher<L, N>,
        options: &SessionOptions,
    ) -> Self {
        Self {
            channel,
            dispatcher,
            timestamp: options.timestamp,
            dispatched: 0,
        }
    }

    pub fn channel_kind(&self) -> ChannelKind {
        self.channel.kind()
    }

    /// Records pulled from the channel and dispatched so far
    pub fn records_dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Pump records into `sink` until the channel ends or `shutdown` fires
    ///
    /// A pending wait on the channel is abandoned when `shutdown` completes.
    #[instrument(skip_all, fields(kind = ?self.channel.kind()))]
    pub async fn run<W, F>(&mut self, sink: &mut W, shutdown: F) -> Result<SessionEnd>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let next = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(records = self.dispatched, "Shutdown requested");
                    return Ok(SessionEnd::Interrupted);
                }
                next = self.channel.next() => next?,
            };

            let Some(record) = next else {
                info!(records = self.dispatched, "Channel exhausted");
                return Ok(SessionEnd::Exhausted);
            };

            let capture = self.timestamp.then(time::capture_line);
            self.dispatcher.dispatch(record, capture.as_deref(), sink)?;
            self.dispatched += 1;
        }
    }
}

/// Run one monitor invocation
///
/// Records go to `out`; usage and error messages go to `diag`. Dropping the
/// session on return closes the channel.
pub async fn run<W, E, F>(
    tokens: &[String],
    options: &SessionOptions,
    out: &mut W,
    diag: &mut E,
    shutdown: F,
) -> ExitStatus
where
    W: Write,
    E: Write,
    F: Future<Output = ()>,
{
    let config = match mode::resolve(tokens) {
        Ok(MonitorCommand::Monitor(config)) => config,
        Ok(MonitorCommand::Help) => {
            let _ = diag.write_all(USAGE.as_bytes());
            return ExitStatus::Usage;
        }
        Err(e) => {
            let _ = writeln!(diag, "{}", e);
            return ExitStatus::Usage;
        }
    };
    info!(
        groups = ?config.groups,
        banner = config.banner,
        replay = ?config.replay_file,
        "Resolved monitor mode"
    );

    let kind = if config.replay_file.is_some() {
        ChannelKind::Replay
    } else {
        ChannelKind::Live
    };

    let mut session = match Session::open(&config, options).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "Failed to open channel");
            let _ = writeln!(diag, "{}", e);
            return ExitStatus::open_failure(kind);
        }
    };

    let result = session.run(out, shutdown).await;
    let _ = out.flush();

    match result {
        Ok(_) => ExitStatus::Success,
        Err(e) => {
            error!(error = %e, records = session.records_dispatched(), "Monitoring failed");
            let _ = writeln!(diag, "{}", e);
            ExitStatus::loop_failure(kind)
        }
    }
}

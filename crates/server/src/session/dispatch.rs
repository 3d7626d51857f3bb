//! Command dispatch loop
//!
//! A session owns the transport for its whole lifetime. It announces the
//! catalog, then reads command frames one at a time and routes them until the
//! peer sends `EXIT` or a fatal error occurs. The transport is dropped when
//! the session ends, which is the single place the USB interface is released.

use crate::catalog::{Catalog, send_catalog};
use crate::session::file_range::serve_file_range;
use common::{BulkTransport, Result};
use protocol::{Command, CommandFrame, RECORD_SIZE, TransferConfig, decode_command_frame};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Catalog announced, no frame read yet
    CatalogSent,
    /// Blocked on the next command frame
    AwaitFrame,
    /// Handling a decoded command
    Dispatching,
    Terminated,
}

/// Counters reported when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames_received: u64,
    /// Frames dropped for a bad magic or an unknown command id
    pub frames_discarded: u64,
    pub ranges_served: u64,
    /// File bytes streamed across all ranges
    pub bytes_streamed: u64,
}

pub struct Session<'a, T: BulkTransport> {
    transport: T,
    config: &'a TransferConfig,
    state: SessionState,
    summary: SessionSummary,
}

impl<'a, T: BulkTransport> Session<'a, T> {
    /// Announce the catalog and enter [`SessionState::CatalogSent`]
    ///
    /// On failure the transport is dropped before returning.
    pub fn start(mut transport: T, catalog: &Catalog, config: &'a TransferConfig) -> Result<Self> {
        if let Err(e) = send_catalog(&mut transport, catalog, config) {
            error!("Failed to send catalog: {}", e);
            return Err(e);
        }

        Ok(Self {
            transport,
            config,
            state: SessionState::CatalogSent,
            summary: SessionSummary::default(),
        })
    }

    /// Process frames until the session terminates
    ///
    /// Consumes the session so the transport is released exactly once,
    /// whether the peer exited cleanly or an error ended the loop.
    pub fn run(mut self) -> Result<SessionSummary> {
        info!("Waiting for commands");

        while self.state != SessionState::Terminated {
            if let Err(e) = self.step() {
                self.state = SessionState::Terminated;
                error!("Session terminated: {}", e);
                return Err(e);
            }
        }

        info!(
            "Session finished: {} ranges served, {} bytes streamed",
            self.summary.ranges_served, self.summary.bytes_streamed
        );
        Ok(self.summary)
    }

    /// Read and handle one command frame
    fn step(&mut self) -> Result<()> {
        self.state = SessionState::AwaitFrame;

        let mut buf = [0u8; RECORD_SIZE];
        self.transport.receive_exact(&mut buf, None)?;
        self.summary.frames_received += 1;

        let (frame, command) = match parse_frame(&buf) {
            Ok(parsed) => parsed,
            Err(e) if !e.is_fatal() => {
                warn!("Discarding command frame: {}", e);
                self.summary.frames_discarded += 1;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.state = SessionState::Dispatching;
        debug!("Dispatching {:?} (cmd_type={})", command, frame.cmd_type);

        match command {
            Command::Exit => {
                info!("Peer requested exit");
                self.state = SessionState::Terminated;
            }
            Command::FileRange | Command::FileRangePadded => {
                let padded = command == Command::FileRangePadded;
                let stats = serve_file_range(&mut self.transport, frame.cmd_id, padded, self.config)?;
                self.summary.ranges_served += 1;
                self.summary.bytes_streamed += stats.bytes_read;
                self.state = SessionState::AwaitFrame;
            }
        }

        Ok(())
    }
}

fn parse_frame(buf: &[u8]) -> Result<(CommandFrame, Command)> {
    let frame = decode_command_frame(buf)?;
    let command = frame.command()?;
    Ok((frame, command))
}

/// Run a complete session over `transport`
pub fn serve_session<T: BulkTransport>(
    transport: T,
    catalog: &Catalog,
    config: &TransferConfig,
) -> Result<SessionSummary> {
    Session::start(transport, catalog, config)?.run()
}

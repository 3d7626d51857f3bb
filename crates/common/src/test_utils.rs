//! Test utilities for usb-install
//!
//! Provides a scripted in-memory transport and helpers that build the byte
//! sequences a peer would send.
//!
//! # Example
//!
//! ```
//! use common::BulkTransport;
//! use common::test_utils::{MockTransport, exit_frame};
//!
//! let (mut transport, handle) = MockTransport::new();
//! handle.push_inbound(exit_frame());
//!
//! let mut buf = [0u8; 32];
//! transport.receive_exact(&mut buf, None).unwrap();
//! assert_eq!(&buf[..4], b"TUC0");
//!
//! drop(transport);
//! assert_eq!(handle.drop_count(), 1);
//! ```

use crate::transport::{BulkTransport, TransportError};
use protocol::{
    Command, CommandFrame, FileRangeRequest, encode_command_frame, encode_file_range_request,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One recorded OUT transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub data: Vec<u8>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Default)]
struct MockState {
    inbound: VecDeque<Vec<u8>>,
    writes: Vec<RecordedWrite>,
    read_timeouts: Vec<Option<Duration>>,
    fail_writes_after: Option<usize>,
    drops: usize,
}

/// Transport that replays scripted IN transfers and records OUT transfers
///
/// Once the script is exhausted every receive fails with
/// `rusb::Error::NoDevice`, as if the peer had been unplugged.
#[derive(Debug)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

/// Inspection handle that outlives the transport it was created with
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTransport {
    pub fn new() -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: state.clone(),
            },
            MockHandle { state },
        )
    }
}

impl BulkTransport for MockTransport {
    fn send(&mut self, data: &[u8], timeout: Option<Duration>) -> Result<usize, TransportError> {
        let mut state = lock(&self.state);
        if let Some(limit) = state.fail_writes_after {
            if state.writes.len() >= limit {
                return Err(TransportError::Usb(rusb::Error::Io));
            }
        }
        state.writes.push(RecordedWrite {
            data: data.to_vec(),
            timeout,
        });
        Ok(data.len())
    }

    fn receive(
        &mut self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize, TransportError> {
        let mut state = lock(&self.state);
        state.read_timeouts.push(timeout);
        let Some(next) = state.inbound.pop_front() else {
            return Err(TransportError::Usb(rusb::Error::NoDevice));
        };
        if next.len() > buf.len() {
            return Err(TransportError::Usb(rusb::Error::Overflow));
        }
        buf[..next.len()].copy_from_slice(&next);
        Ok(next.len())
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        lock(&self.state).drops += 1;
    }
}

impl MockHandle {
    /// Queue one IN transfer
    pub fn push_inbound(&self, data: impl Into<Vec<u8>>) {
        lock(&self.state).inbound.push_back(data.into());
    }

    /// Queue several IN transfers in order
    pub fn extend_inbound<I, D>(&self, transfers: I)
    where
        I: IntoIterator<Item = D>,
        D: Into<Vec<u8>>,
    {
        let mut state = lock(&self.state);
        state
            .inbound
            .extend(transfers.into_iter().map(Into::into));
    }

    /// Make every OUT transfer after the first `count` fail
    pub fn fail_writes_after(&self, count: usize) {
        lock(&self.state).fail_writes_after = Some(count);
    }

    /// All OUT transfers so far
    pub fn writes(&self) -> Vec<RecordedWrite> {
        lock(&self.state).writes.clone()
    }

    /// Timeouts passed to each receive call
    pub fn read_timeouts(&self) -> Vec<Option<Duration>> {
        lock(&self.state).read_timeouts.clone()
    }

    /// Scripted IN transfers not yet consumed
    pub fn pending_inbound(&self) -> usize {
        lock(&self.state).inbound.len()
    }

    /// Number of times the transport was dropped
    pub fn drop_count(&self) -> usize {
        lock(&self.state).drops
    }
}

/// Command frame bytes for an arbitrary command id
pub fn command_frame(cmd_id: u32) -> Vec<u8> {
    encode_command_frame(&CommandFrame {
        cmd_type: 0,
        cmd_id,
        data_size: 0,
    })
    .to_vec()
}

/// Command frame bytes for `EXIT`
pub fn exit_frame() -> Vec<u8> {
    command_frame(Command::Exit.id())
}

/// The three IN transfers of a file range command: frame, request header, name
pub fn file_range_transfers(padded: bool, name: &str, offset: u64, size: u64) -> Vec<Vec<u8>> {
    let command = if padded {
        Command::FileRangePadded
    } else {
        Command::FileRange
    };
    let request = FileRangeRequest {
        range_size: size,
        range_offset: offset,
        name_len: name.len() as u64,
    };
    vec![
        command_frame(command.id()),
        encode_file_range_request(&request).to_vec(),
        name.as_bytes().to_vec(),
    ]
}

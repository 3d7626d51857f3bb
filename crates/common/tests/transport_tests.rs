//! Transport Integration Tests
//!
//! Tests for the blocking transport contract shared by the USB link and the
//! scripted test transport.
//!
//! Run with: `cargo test -p common --test transport_tests`

use common::test_utils::{MockTransport, exit_frame, file_range_transfers};
use common::{BulkTransport, Error, TransportError};
use protocol::{Command, decode_command_frame, decode_file_range_request};
use std::time::Duration;

/// Transport that only ever moves half of what it is asked to
struct HalfTransport;

impl BulkTransport for HalfTransport {
    fn send(&mut self, data: &[u8], _timeout: Option<Duration>) -> Result<usize, TransportError> {
        Ok(data.len() / 2)
    }

    fn receive(
        &mut self,
        buf: &mut [u8],
        _timeout: Option<Duration>,
    ) -> Result<usize, TransportError> {
        Ok(buf.len() / 2)
    }
}

#[test]
fn test_short_write_is_an_error() {
    let err = HalfTransport.send_all(&[0u8; 32], None).unwrap_err();
    assert!(matches!(
        err,
        TransportError::ShortWrite {
            expected: 32,
            actual: 16
        }
    ));
}

#[test]
fn test_short_read_is_an_error() {
    let mut buf = [0u8; 32];
    let err = HalfTransport.receive_exact(&mut buf, None).unwrap_err();
    assert!(matches!(
        err,
        TransportError::ShortRead {
            expected: 32,
            actual: 16
        }
    ));
}

#[test]
fn test_transport_errors_are_fatal() {
    let err: Error = TransportError::ShortRead {
        expected: 32,
        actual: 0,
    }
    .into();
    assert!(err.is_fatal());
}

#[test]
fn test_scripted_peer_conversation() {
    let (mut transport, handle) = MockTransport::new();
    handle.extend_inbound(file_range_transfers(true, "./a.nsp", 4096, 100));
    handle.push_inbound(exit_frame());

    let mut record = [0u8; 32];
    transport.receive_exact(&mut record, None).unwrap();
    let frame = decode_command_frame(&record).unwrap();
    assert_eq!(frame.command().unwrap(), Command::FileRangePadded);

    transport.receive_exact(&mut record, None).unwrap();
    let request = decode_file_range_request(&record).unwrap();
    assert_eq!(request.range_offset, 4096);
    assert_eq!(request.range_size, 100);

    let mut name = vec![0u8; request.checked_name_len().unwrap()];
    transport.receive_exact(&mut name, None).unwrap();
    assert_eq!(name, b"./a.nsp");

    transport.receive_exact(&mut record, None).unwrap();
    let frame = decode_command_frame(&record).unwrap();
    assert_eq!(frame.command().unwrap(), Command::Exit);

    assert_eq!(handle.pending_inbound(), 0);
    assert_eq!(handle.read_timeouts(), vec![None; 4]);
}

#[test]
fn test_drop_is_observed_once() {
    let (transport, handle) = MockTransport::new();
    assert_eq!(handle.drop_count(), 0);
    drop(transport);
    assert_eq!(handle.drop_count(), 1);
}

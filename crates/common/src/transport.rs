//! Blocking bulk transport abstraction
//!
//! The protocol engine only needs two primitives from the USB layer: send a
//! buffer on the OUT endpoint and receive into a buffer from the IN endpoint.
//! Each call maps to exactly one bulk transfer.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    #[error("Short write: sent {actual} of {expected} bytes")]
    ShortWrite { expected: usize, actual: usize },

    #[error("Short read: received {actual} of {expected} bytes")]
    ShortRead { expected: usize, actual: usize },
}

/// One bulk IN and one bulk OUT endpoint of a claimed interface
///
/// A `timeout` of `None` blocks until the transfer completes or fails.
pub trait BulkTransport {
    /// Send `data` as a single OUT transfer, returning the bytes written
    fn send(&mut self, data: &[u8], timeout: Option<Duration>) -> Result<usize, TransportError>;

    /// Receive a single IN transfer into `buf`, returning the bytes read
    fn receive(&mut self, buf: &mut [u8], timeout: Option<Duration>)
    -> Result<usize, TransportError>;

    /// Send `data` and fail unless every byte was transferred
    fn send_all(&mut self, data: &[u8], timeout: Option<Duration>) -> Result<(), TransportError> {
        let written = self.send(data, timeout)?;
        if written != data.len() {
            return Err(TransportError::ShortWrite {
                expected: data.len(),
                actual: written,
            });
        }
        Ok(())
    }

    /// Receive exactly `buf.len()` bytes in one transfer
    fn receive_exact(
        &mut self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<(), TransportError> {
        let read = self.receive(buf, timeout)?;
        if read != buf.len() {
            return Err(TransportError::ShortRead {
                expected: buf.len(),
                actual: read,
            });
        }
        Ok(())
    }
}

//! Bulk transfer execution
//!
//! Maps the transport primitives onto rusb bulk transfers on the link's
//! endpoints.

use crate::usb::device::UsbLink;
use common::{BulkTransport, TransportError};
use std::time::Duration;
use tracing::trace;

/// libusb treats a zero timeout as unlimited
const WAIT_FOREVER: Duration = Duration::ZERO;

fn libusb_timeout(timeout: Option<Duration>) -> Duration {
    match timeout {
        // A zero deadline would mean "forever" to libusb; keep it bounded
        Some(t) if t.is_zero() => Duration::from_millis(1),
        Some(t) => t,
        None => WAIT_FOREVER,
    }
}

impl BulkTransport for UsbLink {
    fn send(&mut self, data: &[u8], timeout: Option<Duration>) -> Result<usize, TransportError> {
        let written = self
            .handle
            .write_bulk(self.endpoints.bulk_out, data, libusb_timeout(timeout))?;
        trace!(
            "Bulk OUT {:#04x}: {}/{} bytes",
            self.endpoints.bulk_out,
            written,
            data.len()
        );
        Ok(written)
    }

    fn receive(
        &mut self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize, TransportError> {
        let read = self
            .handle
            .read_bulk(self.endpoints.bulk_in, buf, libusb_timeout(timeout))?;
        trace!(
            "Bulk IN {:#04x}: {}/{} bytes",
            self.endpoints.bulk_in,
            read,
            buf.len()
        );
        Ok(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_timeout_waits_forever() {
        assert_eq!(libusb_timeout(None), Duration::ZERO);
    }

    #[test]
    fn test_timeouts_stay_bounded() {
        assert_eq!(
            libusb_timeout(Some(Duration::from_secs(1))),
            Duration::from_secs(1)
        );
        assert_eq!(
            libusb_timeout(Some(Duration::ZERO)),
            Duration::from_millis(1)
        );
    }
}

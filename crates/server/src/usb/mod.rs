//! USB subsystem
//!
//! Thin glue between libusb and the protocol session:
//! - Device lookup by VID:PID
//! - Bulk endpoint resolution
//! - Interface claim and release
//! - Bulk transfers behind the `BulkTransport` trait

pub mod device;
pub mod transfers;

pub use device::{UsbLink, find_device, resolve_endpoints};

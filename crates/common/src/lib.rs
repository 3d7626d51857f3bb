//! Common utilities for usb-install
//!
//! This crate provides shared functionality between the protocol engine and
//! the USB glue: the blocking bulk transport abstraction, the session error
//! taxonomy, logging setup, and test doubles for driving a session without
//! hardware.

pub mod error;
pub mod logging;
pub mod test_utils;
pub mod transport;

pub use error::{Error, Result};
pub use logging::setup_logging;
pub use transport::{BulkTransport, TransportError};

//! Protocol session
//!
//! Drives one peer from catalog announcement to exit:
//! - `dispatch`: command frame loop and session lifetime
//! - `file_range`: file range requests and chunked streaming

pub mod dispatch;
pub mod file_range;

pub use dispatch::{SessionSummary, serve_session};

//! Protocol error types

use thiserror::Error;

/// Protocol-level errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Record did not start with the expected magic tag
    #[error("Invalid magic: expected {expected:?}, got {found:?}")]
    InvalidMagic { expected: [u8; 4], found: [u8; 4] },

    /// Command frame carried a command id this host does not handle
    #[error("Unknown command id: {0}")]
    UnknownCommand(u32),

    /// Response header carried a type tag other than the file-range response
    #[error("Unexpected response type: {0}")]
    UnexpectedResponseType(u8),

    /// Buffer too small for operation
    #[error("Buffer too small: needed {needed}, got {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// File name length announced by the peer exceeds the accepted maximum
    #[error("File name too long: {len} bytes (max: {max})")]
    NameTooLong { len: u64, max: u64 },

    /// File name bytes are not valid UTF-8
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    /// Catalog length does not fit the 32-bit header field
    #[error("Catalog too large: {size} bytes (max: {max})")]
    CatalogTooLarge { size: u64, max: u64 },

    /// Transfer configuration values are inconsistent
    #[error("Invalid transfer configuration: {0}")]
    InvalidConfig(String),
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::InvalidMagic {
            expected: *b"TUC0",
            found: *b"XXXX",
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid magic"));
    }

    #[test]
    fn test_name_too_long_error() {
        let err = ProtocolError::NameTooLong {
            len: 10_000,
            max: 4096,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("File name too long"));
        assert!(msg.contains("4096"));
    }
}

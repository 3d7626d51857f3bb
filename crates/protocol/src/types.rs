//! Supporting protocol types

use crate::error::{ProtocolError, Result};
use std::fmt;
use std::time::Duration;

/// Maximum number of file data bytes carried by one transfer (1 MiB)
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Zero-filled prefix prepended to every chunk in padded mode (4 KiB)
pub const PADDING_SIZE: usize = 4096;

/// Timeout applied to catalog header and entry sends
pub const CATALOG_TIMEOUT: Duration = Duration::from_secs(1);

/// Longest file name accepted from the peer
pub const MAX_NAME_LEN: u64 = 4096;

/// Transfer parameters shared by every stage of a session
///
/// Built once at startup and handed out by reference; nothing mutates it
/// after the session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Upper bound on one outbound data transfer, padding included
    pub chunk_size: usize,
    /// Zero prefix length used by padded file range responses
    pub padding_size: usize,
    /// Timeout for the catalog header and entries
    pub catalog_timeout: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            padding_size: PADDING_SIZE,
            catalog_timeout: CATALOG_TIMEOUT,
        }
    }
}

impl TransferConfig {
    /// Check that a padded chunk still has room for file data
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ProtocolError::InvalidConfig(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.padding_size >= self.chunk_size {
            return Err(ProtocolError::InvalidConfig(format!(
                "padding_size ({}) must be smaller than chunk_size ({})",
                self.padding_size, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Number of file bytes read per chunk for the given mode
    pub fn data_per_chunk(&self, padded: bool) -> usize {
        if padded {
            self.chunk_size - self.padding_size
        } else {
            self.chunk_size
        }
    }

    /// Zero prefix length for the given mode
    pub fn prefix_len(&self, padded: bool) -> usize {
        if padded { self.padding_size } else { 0 }
    }
}

/// File name as read from the wire: exactly `len` bytes, no terminator
#[derive(Clone, PartialEq, Eq)]
pub struct FileName {
    bytes: Vec<u8>,
}

impl FileName {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Interpret the name as UTF-8 text
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.bytes)
            .map_err(|_| ProtocolError::InvalidFileName(self.to_string()))
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Debug for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileName({:?})", String::from_utf8_lossy(&self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TransferConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.data_per_chunk(false), 1_048_576);
        assert_eq!(config.data_per_chunk(true), 1_044_480);
        assert_eq!(config.prefix_len(true), 4096);
        assert_eq!(config.prefix_len(false), 0);
    }

    #[test]
    fn test_padding_must_fit_in_chunk() {
        let config = TransferConfig {
            chunk_size: 4096,
            padding_size: 4096,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TransferConfig {
            chunk_size: 0,
            padding_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_name_is_length_delimited() {
        let name = FileName::new(b"./a.nsp\0junk".to_vec());
        assert_eq!(name.len(), 12);
        assert_eq!(name.as_str().unwrap(), "./a.nsp\0junk");
    }

    #[test]
    fn test_file_name_rejects_invalid_utf8() {
        let name = FileName::new(vec![0x2e, 0xff, 0xfe]);
        assert!(matches!(
            name.as_str(),
            Err(ProtocolError::InvalidFileName(_))
        ));
    }
}

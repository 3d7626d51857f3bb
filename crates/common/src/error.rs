//! Common error types

use crate::transport::TransportError;
use protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("File error on {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Range out of bounds for {path}: offset {offset} + size {size} exceeds file size {file_size}"
    )]
    RangeOutOfBounds {
        path: String,
        offset: u64,
        size: u64,
        file_size: u64,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::File {
            path: path.into(),
            source,
        }
    }

    /// Whether this error ends the session
    ///
    /// Only a bad frame magic or an unknown command id are absorbed by the
    /// dispatch loop; everything else terminates it.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::Protocol(ProtocolError::InvalidMagic { .. })
                | Error::Protocol(ProtocolError::UnknownCommand(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality() {
        let bad_magic = Error::from(ProtocolError::InvalidMagic {
            expected: *b"TUC0",
            found: [0; 4],
        });
        assert!(!bad_magic.is_fatal());
        assert!(!Error::from(ProtocolError::UnknownCommand(5)).is_fatal());

        let too_long = Error::from(ProtocolError::NameTooLong { len: 5000, max: 4096 });
        assert!(too_long.is_fatal());

        let transport = Error::from(TransportError::Usb(rusb::Error::NoDevice));
        assert!(transport.is_fatal());

        let missing = Error::file(
            "./a.nsp",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(missing.is_fatal());
    }

    #[test]
    fn test_range_error_display() {
        let err = Error::RangeOutOfBounds {
            path: "./a.nsp".to_string(),
            offset: 10,
            size: 20,
            file_size: 25,
        };
        let msg = err.to_string();
        assert!(msg.contains("./a.nsp"));
        assert!(msg.contains("25"));
    }
}

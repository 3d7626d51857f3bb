//! Wire record definitions
//!
//! Every record exchanged with the peer has a fixed size independent of its
//! payload. Variable-length data (catalog entries, file names, file bytes)
//! always follows a record that announces its length:
//! - Catalog header (host -> peer, 16 bytes), followed by newline-terminated entries
//! - Command frame (peer -> host, 32 bytes)
//! - File range request (peer -> host, 32 bytes), followed by the raw file name
//! - Response header (host -> peer, 32 bytes), followed by file data chunks

use crate::error::ProtocolError;
use crate::types::MAX_NAME_LEN;

/// Commands the peer can issue, keyed by the command id of a [`CommandFrame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// End the session
    Exit,
    /// Stream a file range without padding
    FileRange,
    /// Stream a file range with a zero-filled prefix on every chunk
    FileRangePadded,
}

impl Command {
    /// Map a wire command id to a command
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Command::Exit),
            1 => Some(Command::FileRange),
            2 => Some(Command::FileRangePadded),
            _ => None,
        }
    }

    /// Wire command id
    pub fn id(self) -> u32 {
        match self {
            Command::Exit => 0,
            Command::FileRange => 1,
            Command::FileRangePadded => 2,
        }
    }
}

impl TryFrom<u32> for Command {
    type Error = ProtocolError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        Command::from_id(id).ok_or(ProtocolError::UnknownCommand(id))
    }
}

/// Header announcing the catalog: total byte length of all entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogHeader {
    pub total_length: u32,
}

/// Fixed 32-byte command frame sent by the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    pub cmd_type: u8,
    pub cmd_id: u32,
    /// Payload size hint; the host does not rely on it
    pub data_size: u64,
}

impl CommandFrame {
    /// Resolve the command id to a known command
    pub fn command(&self) -> Result<Command, ProtocolError> {
        Command::try_from(self.cmd_id)
    }
}

/// Fixed 32-byte file range request, followed on the wire by `name_len` name bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRangeRequest {
    pub range_size: u64,
    pub range_offset: u64,
    pub name_len: u64,
}

impl FileRangeRequest {
    /// Name length as a buffer size, bounded by [`MAX_NAME_LEN`]
    pub fn checked_name_len(&self) -> Result<usize, ProtocolError> {
        if self.name_len > MAX_NAME_LEN {
            return Err(ProtocolError::NameTooLong {
                len: self.name_len,
                max: MAX_NAME_LEN,
            });
        }
        Ok(self.name_len as usize)
    }

    /// Offset one past the last requested byte, `None` on overflow
    pub fn end_offset(&self) -> Option<u64> {
        self.range_offset.checked_add(self.range_size)
    }
}

/// Fixed 32-byte header preceding the data of a file range response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub cmd_id: u32,
    pub range_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_ids() {
        for command in [Command::Exit, Command::FileRange, Command::FileRangePadded] {
            assert_eq!(Command::from_id(command.id()), Some(command));
        }
        assert_eq!(Command::from_id(3), None);
        assert_eq!(Command::from_id(u32::MAX), None);
    }

    #[test]
    fn test_unknown_command_error() {
        let frame = CommandFrame {
            cmd_type: 0,
            cmd_id: 7,
            data_size: 0,
        };
        assert_eq!(frame.command(), Err(ProtocolError::UnknownCommand(7)));
    }

    #[test]
    fn test_name_len_bound() {
        let mut request = FileRangeRequest {
            range_size: 0,
            range_offset: 0,
            name_len: MAX_NAME_LEN,
        };
        assert_eq!(request.checked_name_len(), Ok(4096));

        request.name_len = u64::MAX;
        assert!(matches!(
            request.checked_name_len(),
            Err(ProtocolError::NameTooLong { .. })
        ));
    }

    #[test]
    fn test_end_offset_overflow() {
        let request = FileRangeRequest {
            range_size: 2,
            range_offset: u64::MAX,
            name_len: 0,
        };
        assert_eq!(request.end_offset(), None);
    }
}

//! Fixed-layout record encoding and decoding
//!
//! All integers are little-endian and every record is exactly its stated size;
//! unused bytes are zero on encode and ignored on decode.
//!
//! # Record Layouts
//!
//! ```text
//! Catalog header (16):  "TUL0" | total_length u32 | pad(8)
//! Command frame  (32):  "TUC0" | cmd_type u8 | pad(3) | cmd_id u32 | data_size u64 | pad(12)
//! Range request  (32):  range_size u64 | range_offset u64 | name_len u64 | pad(8)
//! Response hdr   (32):  "TUL0" | type u8 (=1) | pad(3) | cmd_id u32 | range_size u64 | pad(12)
//! ```

use crate::error::{ProtocolError, Result};
use crate::messages::{CatalogHeader, CommandFrame, FileRangeRequest, ResponseHeader};
use bytes::{Buf, BufMut};

/// Magic tag of the catalog header and of response headers
pub const LIST_MAGIC: [u8; 4] = *b"TUL0";

/// Magic tag of command frames
pub const COMMAND_MAGIC: [u8; 4] = *b"TUC0";

/// Size of the catalog header
pub const CATALOG_HEADER_SIZE: usize = 16;

/// Size of command frames, file range requests and response headers
pub const RECORD_SIZE: usize = 32;

/// Type tag of a file range response header
pub const RESPONSE_TYPE_FILE_RANGE: u8 = 1;

fn check_len(bytes: &[u8], needed: usize) -> Result<()> {
    if bytes.len() < needed {
        return Err(ProtocolError::BufferTooSmall {
            needed,
            available: bytes.len(),
        });
    }
    Ok(())
}

fn read_magic(src: &mut &[u8], expected: [u8; 4]) -> Result<()> {
    let mut found = [0u8; 4];
    src.copy_to_slice(&mut found);
    if found != expected {
        return Err(ProtocolError::InvalidMagic { expected, found });
    }
    Ok(())
}

/// Encode the catalog header announcing `total_length` bytes of entries
pub fn encode_catalog_header(total_length: u32) -> [u8; CATALOG_HEADER_SIZE] {
    let mut out = [0u8; CATALOG_HEADER_SIZE];
    let mut dst = &mut out[..];
    dst.put_slice(&LIST_MAGIC);
    dst.put_u32_le(total_length);
    dst.put_bytes(0, 8);
    out
}

/// Decode a catalog header
pub fn decode_catalog_header(bytes: &[u8]) -> Result<CatalogHeader> {
    check_len(bytes, CATALOG_HEADER_SIZE)?;
    let mut src = &bytes[..CATALOG_HEADER_SIZE];
    read_magic(&mut src, LIST_MAGIC)?;
    Ok(CatalogHeader {
        total_length: src.get_u32_le(),
    })
}

/// Encode a command frame (peer side)
pub fn encode_command_frame(frame: &CommandFrame) -> [u8; RECORD_SIZE] {
    let mut out = [0u8; RECORD_SIZE];
    let mut dst = &mut out[..];
    dst.put_slice(&COMMAND_MAGIC);
    dst.put_u8(frame.cmd_type);
    dst.put_bytes(0, 3);
    dst.put_u32_le(frame.cmd_id);
    dst.put_u64_le(frame.data_size);
    dst.put_bytes(0, 12);
    out
}

/// Decode a command frame, rejecting anything not tagged `TUC0`
///
/// # Example
/// ```
/// use protocol::{CommandFrame, decode_command_frame, encode_command_frame};
///
/// let frame = CommandFrame { cmd_type: 0, cmd_id: 1, data_size: 32 };
/// let bytes = encode_command_frame(&frame);
/// assert_eq!(decode_command_frame(&bytes).unwrap(), frame);
/// assert!(decode_command_frame(&[0u8; 32]).is_err());
/// ```
pub fn decode_command_frame(bytes: &[u8]) -> Result<CommandFrame> {
    check_len(bytes, RECORD_SIZE)?;
    let mut src = &bytes[..RECORD_SIZE];
    read_magic(&mut src, COMMAND_MAGIC)?;
    let cmd_type = src.get_u8();
    src.advance(3);
    let cmd_id = src.get_u32_le();
    let data_size = src.get_u64_le();
    Ok(CommandFrame {
        cmd_type,
        cmd_id,
        data_size,
    })
}

/// Encode a file range request header (peer side)
pub fn encode_file_range_request(request: &FileRangeRequest) -> [u8; RECORD_SIZE] {
    let mut out = [0u8; RECORD_SIZE];
    let mut dst = &mut out[..];
    dst.put_u64_le(request.range_size);
    dst.put_u64_le(request.range_offset);
    dst.put_u64_le(request.name_len);
    dst.put_bytes(0, 8);
    out
}

/// Decode a file range request header
///
/// Only the length is checked here; size, offset and name length are
/// validated by whoever serves the request.
pub fn decode_file_range_request(bytes: &[u8]) -> Result<FileRangeRequest> {
    check_len(bytes, RECORD_SIZE)?;
    let mut src = &bytes[..RECORD_SIZE];
    Ok(FileRangeRequest {
        range_size: src.get_u64_le(),
        range_offset: src.get_u64_le(),
        name_len: src.get_u64_le(),
    })
}

/// Encode the header of a file range response
///
/// `range_size` is written as its own little-endian value.
pub fn encode_response_header(cmd_id: u32, range_size: u64) -> [u8; RECORD_SIZE] {
    let mut out = [0u8; RECORD_SIZE];
    let mut dst = &mut out[..];
    dst.put_slice(&LIST_MAGIC);
    dst.put_u8(RESPONSE_TYPE_FILE_RANGE);
    dst.put_bytes(0, 3);
    dst.put_u32_le(cmd_id);
    dst.put_u64_le(range_size);
    dst.put_bytes(0, 12);
    out
}

/// Decode a response header (peer side)
pub fn decode_response_header(bytes: &[u8]) -> Result<ResponseHeader> {
    check_len(bytes, RECORD_SIZE)?;
    let mut src = &bytes[..RECORD_SIZE];
    read_magic(&mut src, LIST_MAGIC)?;
    let response_type = src.get_u8();
    if response_type != RESPONSE_TYPE_FILE_RANGE {
        return Err(ProtocolError::UnexpectedResponseType(response_type));
    }
    src.advance(3);
    Ok(ResponseHeader {
        cmd_id: src.get_u32_le(),
        range_size: src.get_u64_le(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_header_layout() {
        let bytes = encode_catalog_header(16);
        assert_eq!(&bytes[..4], b"TUL0");
        assert_eq!(&bytes[4..8], &[16, 0, 0, 0]);
        assert_eq!(&bytes[8..], &[0u8; 8]);
    }

    #[test]
    fn test_response_header_layout() {
        let bytes = encode_response_header(0x0102_0304, 2_500_000);
        assert_eq!(&bytes[..4], b"TUL0");
        assert_eq!(bytes[4], 1);
        assert_eq!(&bytes[5..8], &[0, 0, 0]);
        assert_eq!(&bytes[8..12], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[12..20], &2_500_000u64.to_le_bytes());
        assert_eq!(&bytes[20..], &[0u8; 12]);
    }

    #[test]
    fn test_command_frame_layout() {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[..4].copy_from_slice(b"TUC0");
        bytes[4] = 0;
        bytes[8..12].copy_from_slice(&2u32.to_le_bytes());
        bytes[12..20].copy_from_slice(&0x20u64.to_le_bytes());
        // Reserved bytes are ignored
        bytes[31] = 0xaa;

        let frame = decode_command_frame(&bytes).unwrap();
        assert_eq!(frame.cmd_type, 0);
        assert_eq!(frame.cmd_id, 2);
        assert_eq!(frame.data_size, 0x20);
    }

    #[test]
    fn test_command_frame_invalid_magic() {
        let mut bytes = encode_command_frame(&CommandFrame {
            cmd_type: 0,
            cmd_id: 1,
            data_size: 0,
        });
        bytes[..4].copy_from_slice(b"TUL0");

        let err = decode_command_frame(&bytes).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidMagic {
                expected: COMMAND_MAGIC,
                found: LIST_MAGIC,
            }
        );
    }

    #[test]
    fn test_short_buffer_rejected() {
        let err = decode_file_range_request(&[0u8; 31]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::BufferTooSmall {
                needed: 32,
                available: 31,
            }
        );
        assert!(decode_catalog_header(&[0u8; 15]).is_err());
    }

    #[test]
    fn test_file_range_request_layout() {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[..8].copy_from_slice(&2_500_000u64.to_le_bytes());
        bytes[8..16].copy_from_slice(&4096u64.to_le_bytes());
        bytes[16..24].copy_from_slice(&7u64.to_le_bytes());

        let request = decode_file_range_request(&bytes).unwrap();
        assert_eq!(request.range_size, 2_500_000);
        assert_eq!(request.range_offset, 4096);
        assert_eq!(request.name_len, 7);
        assert_eq!(encode_file_range_request(&request), bytes);
    }

    #[test]
    fn test_response_header_wrong_type() {
        let mut bytes = encode_response_header(1, 10);
        bytes[4] = 2;
        assert_eq!(
            decode_response_header(&bytes),
            Err(ProtocolError::UnexpectedResponseType(2))
        );
    }
}

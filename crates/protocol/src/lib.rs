//! Protocol library for usb-install
//!
//! This crate defines the fixed-layout records exchanged with a USB peer that
//! installs application packages from the host: the catalog header, command
//! frames, file range requests and response headers, together with the codec
//! that converts them to and from their little-endian wire form.
//!
//! # Example
//!
//! ```
//! use protocol::{Command, CommandFrame, decode_command_frame, encode_command_frame};
//!
//! let frame = CommandFrame {
//!     cmd_type: 0,
//!     cmd_id: Command::FileRangePadded.id(),
//!     data_size: 32,
//! };
//!
//! let bytes = encode_command_frame(&frame);
//! assert_eq!(bytes.len(), 32);
//!
//! let decoded = decode_command_frame(&bytes).unwrap();
//! assert_eq!(decoded.command().unwrap(), Command::FileRangePadded);
//! ```

pub mod codec;
pub mod error;
pub mod messages;
pub mod types;

pub use codec::{
    CATALOG_HEADER_SIZE, COMMAND_MAGIC, LIST_MAGIC, RECORD_SIZE, RESPONSE_TYPE_FILE_RANGE,
    decode_catalog_header, decode_command_frame, decode_file_range_request,
    decode_response_header, encode_catalog_header, encode_command_frame,
    encode_file_range_request, encode_response_header,
};
pub use error::{ProtocolError, Result};
pub use messages::{CatalogHeader, Command, CommandFrame, FileRangeRequest, ResponseHeader};
pub use types::{
    CATALOG_TIMEOUT, CHUNK_SIZE, FileName, MAX_NAME_LEN, PADDING_SIZE, TransferConfig,
};

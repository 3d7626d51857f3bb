//! File range streaming
//!
//! A file range command is followed by a 32-byte request header and the raw
//! file name. The host answers with a response header and then streams the
//! requested span in chunks of at most `chunk_size` bytes. In padded mode
//! every chunk starts with `padding_size` zero bytes, so it carries that much
//! less file data. No end marker follows the last chunk.

use common::{BulkTransport, Error, Result};
use protocol::{
    FileName, FileRangeRequest, RECORD_SIZE, TransferConfig, decode_file_range_request,
    encode_response_header,
};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, info};

/// Counters for one served range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeStats {
    pub chunks: u64,
    /// File bytes read, equal to the requested range size on success
    pub bytes_read: u64,
    /// Bytes handed to the transport, padding included
    pub bytes_sent: u64,
}

/// Serve one file range command
///
/// Reads the request header and file name, answers with a response header
/// echoing `cmd_id`, then streams the range. The file is closed on every
/// return path. Every error is fatal for the session.
pub fn serve_file_range<T: BulkTransport>(
    transport: &mut T,
    cmd_id: u32,
    padded: bool,
    config: &TransferConfig,
) -> Result<RangeStats> {
    let mut header = [0u8; RECORD_SIZE];
    transport.receive_exact(&mut header, None)?;
    let request = decode_file_range_request(&header)?;

    let name = read_file_name(transport, &request)?;
    debug!(
        "File range request: name={}, offset={}, size={}, padded={}",
        name, request.range_offset, request.range_size, padded
    );

    transport.send_all(&encode_response_header(cmd_id, request.range_size), None)?;

    let path = name.as_str()?;
    let mut file = File::open(path).map_err(|e| Error::file(path, e))?;
    let file_size = file.metadata().map_err(|e| Error::file(path, e))?.len();

    let end = request
        .end_offset()
        .filter(|&end| end <= file_size)
        .ok_or_else(|| Error::RangeOutOfBounds {
            path: path.to_string(),
            offset: request.range_offset,
            size: request.range_size,
            file_size,
        })?;

    file.seek(SeekFrom::Start(request.range_offset))
        .map_err(|e| Error::file(path, e))?;

    info!(
        "Serving {} [{}..{}) ({} bytes{})",
        path,
        request.range_offset,
        end,
        request.range_size,
        if padded { ", padded" } else { "" }
    );

    stream_range(transport, &mut file, path, request.range_size, padded, config)
}

fn read_file_name<T: BulkTransport>(
    transport: &mut T,
    request: &FileRangeRequest,
) -> Result<FileName> {
    let mut name = vec![0u8; request.checked_name_len()?];
    if !name.is_empty() {
        transport.receive_exact(&mut name, None)?;
    }
    Ok(FileName::new(name))
}

/// Stream `size` bytes from `reader` in bounded chunks
///
/// The last chunk carries only the remaining bytes; the reader is never read
/// past `size`.
fn stream_range<T: BulkTransport, R: Read>(
    transport: &mut T,
    reader: &mut R,
    path: &str,
    size: u64,
    padded: bool,
    config: &TransferConfig,
) -> Result<RangeStats> {
    let prefix = config.prefix_len(padded);
    let per_chunk = config.data_per_chunk(padded);

    // The prefix region is never written, so it stays zero for every chunk
    let capacity = (per_chunk as u64).min(size) as usize;
    let mut chunk = vec![0u8; prefix + capacity];

    let mut stats = RangeStats::default();
    while stats.bytes_read < size {
        let to_read = (size - stats.bytes_read).min(per_chunk as u64) as usize;
        reader
            .read_exact(&mut chunk[prefix..prefix + to_read])
            .map_err(|e| Error::file(path, e))?;

        let outbound = &chunk[..prefix + to_read];
        transport.send_all(outbound, None)?;

        stats.chunks += 1;
        stats.bytes_read += to_read as u64;
        stats.bytes_sent += outbound.len() as u64;
        debug!(
            "Sent chunk {} of {}: {} bytes ({}/{})",
            stats.chunks,
            path,
            outbound.len(),
            stats.bytes_read,
            size
        );
    }

    Ok(stats)
}

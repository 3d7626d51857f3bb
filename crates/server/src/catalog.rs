//! Catalog of serveable files
//!
//! The catalog is announced once per session: a 16-byte header carrying the
//! total length, then one transfer per entry holding the path followed by a
//! newline.

use common::{BulkTransport, Result};
use protocol::{ProtocolError, TransferConfig, encode_catalog_header};
use std::path::Path;
use tracing::{debug, info, warn};

/// Extensions of the package formats the peer can install (case-sensitive)
pub const ALLOWED_EXTENSIONS: [&str; 2] = [".nsp", ".xci"];

/// Ordered list of validated file paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<String>,
    /// Sum of entry lengths, one separator byte included per entry
    total_length: u64,
}

impl Catalog {
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total length as carried by the 32-bit header field
    pub fn header_length(&self) -> std::result::Result<u32, ProtocolError> {
        u32::try_from(self.total_length).map_err(|_| ProtocolError::CatalogTooLarge {
            size: self.total_length,
            max: u32::MAX as u64,
        })
    }

    fn push(&mut self, path: String) {
        self.total_length += path.len() as u64 + 1;
        self.entries.push(path);
    }
}

/// Extension of `path`: the text from its last '.' onwards
fn extension(path: &str) -> Option<&str> {
    path.rfind('.').map(|idx| &path[idx..])
}

fn rejection_reason(path: &str) -> Option<&'static str> {
    if !Path::new(path).exists() {
        return Some("file does not exist");
    }
    match extension(path) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext) => None,
        _ => Some("not an .nsp or .xci file"),
    }
}

/// Build the catalog from candidate paths
///
/// Candidates that do not exist or have an unsupported extension are logged
/// and skipped; the order of the remaining paths is preserved.
pub fn build_catalog<I, S>(candidates: I) -> Catalog
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut catalog = Catalog::default();

    for candidate in candidates {
        let path = candidate.as_ref();
        if let Some(reason) = rejection_reason(path) {
            warn!("Skipping {}: {}", path, reason);
            continue;
        }
        debug!("Adding {} to catalog", path);
        catalog.push(path.to_string());
    }

    catalog
}

/// Announce the catalog to the peer
///
/// Every transfer uses the short catalog timeout; any failure is fatal.
pub fn send_catalog<T: BulkTransport>(
    transport: &mut T,
    catalog: &Catalog,
    config: &TransferConfig,
) -> Result<()> {
    let header = encode_catalog_header(catalog.header_length()?);
    transport.send_all(&header, Some(config.catalog_timeout))?;

    for entry in catalog.entries() {
        let mut line = Vec::with_capacity(entry.len() + 1);
        line.extend_from_slice(entry.as_bytes());
        line.push(b'\n');
        transport.send_all(&line, Some(config.catalog_timeout))?;
    }

    info!(
        "Sent catalog: {} entries, {} bytes",
        catalog.len(),
        catalog.total_length()
    );
    Ok(())
}

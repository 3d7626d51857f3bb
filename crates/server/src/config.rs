//! Server configuration management

use anyhow::{Context, Result, anyhow};
use protocol::{CATALOG_TIMEOUT, CHUNK_SIZE, PADDING_SIZE, TransferConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub usb: UsbSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub transfer: TransferSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub log_level: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Which attached device to serve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsbSettings {
    /// Vendor ID in `0x` hex form
    #[serde(default = "UsbSettings::default_vendor_id")]
    pub vendor_id: String,
    /// Product ID in `0x` hex form
    #[serde(default = "UsbSettings::default_product_id")]
    pub product_id: String,
    /// Interface number; the first one with bulk IN and OUT endpoints if unset
    #[serde(default)]
    pub interface: Option<u8>,
}

impl Default for UsbSettings {
    fn default() -> Self {
        Self {
            vendor_id: Self::default_vendor_id(),
            product_id: Self::default_product_id(),
            interface: None,
        }
    }
}

impl UsbSettings {
    fn default_vendor_id() -> String {
        "0x057E".to_string()
    }

    fn default_product_id() -> String {
        "0x3000".to_string()
    }

    pub fn vendor_id(&self) -> Result<u16> {
        ServerConfig::parse_hex_id(&self.vendor_id, "VID")
    }

    pub fn product_id(&self) -> Result<u16> {
        ServerConfig::parse_hex_id(&self.product_id, "PID")
    }
}

/// Files offered to the peer, in announcement order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default)]
    pub paths: Vec<String>,
}

impl CatalogSettings {
    /// Paths with a leading `~` expanded to the home directory
    pub fn expanded_paths(&self) -> Vec<String> {
        self.paths
            .iter()
            .map(|p| shellexpand::tilde(p).into_owned())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSettings {
    #[serde(default = "TransferSettings::default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "TransferSettings::default_padding_size")]
    pub padding_size: usize,
    #[serde(default = "TransferSettings::default_catalog_timeout_ms")]
    pub catalog_timeout_ms: u64,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            chunk_size: Self::default_chunk_size(),
            padding_size: Self::default_padding_size(),
            catalog_timeout_ms: Self::default_catalog_timeout_ms(),
        }
    }
}

impl TransferSettings {
    fn default_chunk_size() -> usize {
        CHUNK_SIZE
    }

    fn default_padding_size() -> usize {
        PADDING_SIZE
    }

    fn default_catalog_timeout_ms() -> u64 {
        CATALOG_TIMEOUT.as_millis() as u64
    }

    /// Build the immutable transfer parameters shared by the session
    pub fn transfer_config(&self) -> TransferConfig {
        TransferConfig {
            chunk_size: self.chunk_size,
            padding_size: self.padding_size,
            catalog_timeout: Duration::from_millis(self.catalog_timeout_ms),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the specified path
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            // Try standard locations in order
            let candidates = vec![
                Self::default_path(),
                PathBuf::from("/etc/usb-install/server.toml"),
            ];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ServerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Failed to load config: {:#}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("usb-install").join("server.toml")
        } else {
            PathBuf::from(".config/usb-install/server.toml")
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.server.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.server.log_level,
                valid_levels.join(", ")
            ));
        }

        self.usb.vendor_id()?;
        self.usb.product_id()?;

        if self.transfer.catalog_timeout_ms == 0 {
            return Err(anyhow!("catalog_timeout_ms must be greater than 0"));
        }
        self.transfer.transfer_config().validate()?;

        Ok(())
    }

    /// Parse a hex ID (VID or PID) such as `0x057E`
    fn parse_hex_id(id: &str, name: &str) -> Result<u16> {
        let hex_part = id
            .strip_prefix("0x")
            .or_else(|| id.strip_prefix("0X"))
            .ok_or_else(|| {
                anyhow!(
                    "Invalid {} '{}', must start with '0x' (e.g., '0x1234')",
                    name,
                    id
                )
            })?;

        if hex_part.is_empty() || hex_part.len() > 4 {
            return Err(anyhow!(
                "Invalid {} '{}', hex part must be 1-4 digits",
                name,
                id
            ));
        }

        u16::from_str_radix(hex_part, 16)
            .map_err(|_| anyhow!("Invalid {} '{}', not a valid hex number", name, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.usb.vendor_id().unwrap(), 0x057E);
        assert_eq!(config.usb.product_id().unwrap(), 0x3000);
        assert!(config.catalog.paths.is_empty());
        assert_eq!(config.transfer.transfer_config(), TransferConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_hex_id() {
        assert_eq!(ServerConfig::parse_hex_id("0x1234", "VID").unwrap(), 0x1234);
        assert_eq!(ServerConfig::parse_hex_id("0XABCD", "VID").unwrap(), 0xABCD);
        assert!(ServerConfig::parse_hex_id("1234", "VID").is_err());
        assert!(ServerConfig::parse_hex_id("0x", "VID").is_err());
        assert!(ServerConfig::parse_hex_id("0x12345", "VID").is_err());
        assert!(ServerConfig::parse_hex_id("0xGHIJ", "VID").is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = ServerConfig::from_toml(
            r#"
[catalog]
paths = ["./a.nsp", "~/games/b.xci"]
"#,
        )
        .unwrap();

        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.catalog.paths.len(), 2);
        assert_eq!(config.transfer.chunk_size, CHUNK_SIZE);
        if dirs::home_dir().is_some() {
            assert!(!config.catalog.expanded_paths()[1].starts_with('~'));
        }
        assert_eq!(config.catalog.expanded_paths()[0], "./a.nsp");
    }

    #[test]
    fn test_full_config() {
        let config = ServerConfig::from_toml(
            r#"
[server]
log_level = "debug"

[usb]
vendor_id = "0x1234"
product_id = "0x5678"
interface = 1

[catalog]
paths = ["./a.nsp"]

[transfer]
chunk_size = 65536
padding_size = 512
catalog_timeout_ms = 2500
"#,
        )
        .unwrap();

        assert_eq!(config.usb.interface, Some(1));
        let transfer = config.transfer.transfer_config();
        assert_eq!(transfer.chunk_size, 65536);
        assert_eq!(transfer.padding_size, 512);
        assert_eq!(transfer.catalog_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ServerConfig::from_toml("[server]\nlog_level = \"loud\"\n").is_err());
        assert!(ServerConfig::from_toml("[usb]\nvendor_id = \"057E\"\n").is_err());
        assert!(
            ServerConfig::from_toml("[transfer]\nchunk_size = 4096\npadding_size = 4096\n")
                .is_err()
        );
        assert!(ServerConfig::from_toml("[transfer]\ncatalog_timeout_ms = 0\n").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("server.toml");

        let mut config = ServerConfig::default();
        config.catalog.paths = vec!["./a.nsp".to_string()];
        config.save(&path).unwrap();

        let loaded = ServerConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.catalog.paths, vec!["./a.nsp".to_string()]);
        assert_eq!(loaded.usb.vendor_id, "0x057E");
    }
}

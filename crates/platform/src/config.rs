//! Codec configuration
//!
//! Provides the adjustable protocol-layer ceilings used by the SFTP framing
//! reader and by the READ/WRITE data path.
//!
//! # Example
//!
//! ```
//! use filexfer_platform::CodecConfig;
//!
//! let config = CodecConfig::builder()
//!     .max_packet_length(64 * 1024)
//!     .max_data_length(60 * 1024)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.max_packet_length, 65536);
//! ```

use crate::{FilexferError, FilexferResult};

/// Default maximum total frame length in bytes.
pub const DEFAULT_MAX_PACKET_LENGTH: u32 = 34000;

/// Default maximum READ/WRITE data chunk length in bytes.
pub const DEFAULT_MAX_DATA_LENGTH: u32 = 32768;

/// Largest fixed overhead of a data-carrying packet: type (1), request-id (4),
/// and the byte-string length prefix (4).
const DATA_PACKET_OVERHEAD: u32 = 9;

/// Limits enforced by the codec when reading from an untrusted peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodecConfig {
    /// Maximum value accepted in a frame's length prefix.
    pub max_packet_length: u32,

    /// Maximum number of data bytes in a single READ request or WRITE/DATA payload.
    pub max_data_length: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_packet_length: DEFAULT_MAX_PACKET_LENGTH,
            max_data_length: DEFAULT_MAX_DATA_LENGTH,
        }
    }
}

impl CodecConfig {
    /// Create builder for codec configuration
    pub fn builder() -> CodecConfigBuilder {
        CodecConfigBuilder::new()
    }

    /// Validate configuration
    pub fn validate(&self) -> FilexferResult<()> {
        if self.max_packet_length == 0 {
            return Err(FilexferError::Config(
                "max_packet_length must be non-zero".into(),
            ));
        }
        if self.max_data_length == 0 {
            return Err(FilexferError::Config(
                "max_data_length must be non-zero".into(),
            ));
        }
        if self.max_data_length > self.max_packet_length.saturating_sub(DATA_PACKET_OVERHEAD) {
            return Err(FilexferError::Config(format!(
                "max_data_length ({}) does not fit in max_packet_length ({})",
                self.max_data_length, self.max_packet_length
            )));
        }
        Ok(())
    }

    /// Load configuration from the `[codec]` table of a TOML document.
    ///
    /// Missing keys (or a missing table) fall back to the defaults.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(s: &str) -> FilexferResult<Self> {
        #[derive(serde::Deserialize, Default)]
        #[serde(default)]
        struct Document {
            codec: CodecConfig,
        }

        let doc: Document =
            toml::from_str(s).map_err(|e| FilexferError::Config(e.to_string()))?;
        doc.codec.validate()?;
        Ok(doc.codec)
    }
}

/// Builder for [`CodecConfig`]
#[derive(Debug, Default)]
pub struct CodecConfigBuilder {
    max_packet_length: Option<u32>,
    max_data_length: Option<u32>,
}

impl CodecConfigBuilder {
    /// Create new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum frame length
    pub fn max_packet_length(mut self, len: u32) -> Self {
        self.max_packet_length = Some(len);
        self
    }

    /// Set maximum data chunk length
    pub fn max_data_length(mut self, len: u32) -> Self {
        self.max_data_length = Some(len);
        self
    }

    /// Build and validate configuration
    pub fn build(self) -> FilexferResult<CodecConfig> {
        let config = CodecConfig {
            max_packet_length: self
                .max_packet_length
                .unwrap_or(DEFAULT_MAX_PACKET_LENGTH),
            max_data_length: self.max_data_length.unwrap_or(DEFAULT_MAX_DATA_LENGTH),
        };
        config.validate()?;
        Ok(config)
    }
}

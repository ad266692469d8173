//! # filexfer Platform
//!
//! Core platform types shared by the filexfer crates.
//!
//! This crate provides:
//! - Unified error types (`FilexferError`, `FilexferResult`)
//! - Codec configuration (`CodecConfig`) with builder and TOML loading
//!
//! # Examples
//!
//! ```
//! use filexfer_platform::{CodecConfig, FilexferResult};
//!
//! fn limits() -> FilexferResult<CodecConfig> {
//!     CodecConfig::builder().max_packet_length(40000).build()
//! }
//!
//! # fn main() -> FilexferResult<()> {
//! let config = limits()?;
//! assert_eq!(config.max_packet_length, 40000);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;

pub use config::{
    CodecConfig, CodecConfigBuilder, DEFAULT_MAX_DATA_LENGTH, DEFAULT_MAX_PACKET_LENGTH,
};
pub use error::{FilexferError, FilexferResult};

/// Platform version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

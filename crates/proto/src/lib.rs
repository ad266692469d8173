//! Wire codec for the SSH File Transfer Protocol.
//!
//! This crate encodes and decodes SFTP version 3 packets as exchanged by
//! OpenSSH and compatible implementations:
//!
//! - **Packets** - every request and response kind, plus EXTENDED/EXTENDED_REPLY
//! - **Attributes** - size, owner, permissions, times and extended pairs
//! - **Status** - status codes usable as Rust errors
//! - **Extensions** - a registry of `@openssh.com` and custom extended requests
//!
//! # Features
//!
//! - `async` (default) - read and write whole frames over tokio streams
//!
//! # Example
//!
//! ```rust
//! use filexfer_proto::sftp::{Packet, ReadPacket, Request, RequestPacket};
//!
//! let read = ReadPacket {
//!     handle: "1".into(),
//!     offset: 0,
//!     length: 4096,
//! };
//! let (header, payload) = read.marshal(1);
//! assert!(payload.is_none());
//!
//! let decoded = RequestPacket::decode(&header[..]).unwrap();
//! assert_eq!(decoded.request, Request::Read(read));
//! ```
//!
//! # Security
//!
//! Inputs are treated as hostile:
//! - Frame lengths are checked against [`filexfer_platform::CodecConfig`] before allocating
//! - Every length-prefixed read is bounds checked
//! - Counts from the wire never size an allocation beyond the bytes present

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod sftp;

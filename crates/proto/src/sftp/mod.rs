//! SSH File Transfer Protocol, version 3.
//!
//! Encodes and decodes the packets exchanged between an SFTP client and
//! server. Transport, session handling and file system operations are left
//! to the caller; this module only turns packets into bytes and back.
//!
//! # Layers
//!
//! 1. **Primitives** ([`buffer`], [`string`]) - big-endian integers and length-prefixed strings
//! 2. **Attributes** ([`attrs`]) - flag-gated file attributes
//! 3. **Packets** ([`requests`], [`responses`], [`status`], [`extended`]) - one type per packet kind
//! 4. **Framing** ([`packet`]) - length prefix, type code, request-id and dispatch
//! 5. **Streams** ([`frame`]) - whole frames over tokio readers and writers
//!
//! # Example
//!
//! ```rust
//! use filexfer_proto::sftp::{
//!     Packet, Response, ResponsePacket, StatusCode, StatusPacket,
//! };
//!
//! let status = StatusPacket::new(StatusCode::NoSuchFile, "no such file");
//! let bytes = status.to_bytes(7);
//!
//! let decoded = ResponsePacket::decode(&bytes[..]).unwrap();
//! assert_eq!(decoded.request_id, 7);
//! match decoded.response {
//!     Response::Status(s) => assert_eq!(s, StatusCode::NoSuchFile),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```
//!
//! # References
//!
//! - [draft-ietf-secsh-filexfer-02](https://datatracker.ietf.org/doc/html/draft-ietf-secsh-filexfer-02) - SFTP version 3
//! - [OpenSSH PROTOCOL](https://cvsweb.openbsd.org/src/usr.bin/ssh/PROTOCOL) - `@openssh.com` extensions

pub mod attrs;
pub mod buffer;
pub mod error;
pub mod extended;
#[cfg(feature = "async")]
pub mod frame;
pub mod fs;
pub mod message;
pub mod openssh;
pub mod packet;
pub mod requests;
pub mod responses;
pub mod status;
pub mod string;

pub use attrs::{AttrFlags, Attributes, ExtendedAttribute, FileMode, FileType};
pub use buffer::Buffer;
pub use error::{Error, Result};
pub use extended::{
    new_extended_data, register_extended_packet_type, ExtendedData, ExtendedDataConstructor,
    ExtendedPacket, ExtendedReplyPacket, RawExtendedData,
};
#[cfg(feature = "async")]
pub use frame::{read_frame, read_request, read_response, write_frame, write_packet};
pub use message::{PacketType, SFTP_VERSION};
pub use openssh::{
    FsyncExtendedPacket, HardlinkExtendedPacket, PosixRenameExtendedPacket,
    StatVfsExtendedPacket, StatVfsExtendedReplyPacket,
};
pub use packet::{Frame, Packet, RawPacket, Request, RequestPacket, Response, ResponsePacket};
pub use requests::{
    ClosePacket, FSetStatPacket, FStatPacket, InitPacket, LStatPacket, MkdirPacket, OpenDirPacket,
    OpenFlags, OpenPacket, ReadDirPacket, ReadLinkPacket, ReadPacket, RealPathPacket, RemovePacket,
    RenamePacket, RmdirPacket, SetStatPacket, StatPacket, SymlinkPacket, WritePacket,
};
pub use responses::{
    AttrsPacket, DataPacket, ExtensionPair, HandlePacket, NameEntry, NamePacket, VersionPacket,
};
pub use status::{StatusCode, StatusPacket};
pub use string::SshString;

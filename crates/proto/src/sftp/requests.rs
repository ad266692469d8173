//! Client-to-server packets.
//!
//! One struct per request kind. Bodies are written field by field in wire
//! order; string fields are length-prefixed and handles are opaque bytes.

use super::attrs::Attributes;
use super::buffer::{wire_len, Buffer};
use super::error::{Error, Result};
use super::message::{PacketType, SFTP_VERSION};
use super::packet::Packet;
use super::responses::ExtensionPair;
use super::string::SshString;
use bytes::Bytes;
use filexfer_platform::CodecConfig;

/// SSH_FXF_* open flags (pflags).
pub struct OpenFlags;

impl OpenFlags {
    /// Open for reading
    pub const READ: u32 = 0x00000001;
    /// Open for writing
    pub const WRITE: u32 = 0x00000002;
    /// Force all writes to append data at the end of the file
    pub const APPEND: u32 = 0x00000004;
    /// Create the file if it does not exist
    pub const CREATE: u32 = 0x00000008;
    /// Truncate an existing file to zero length
    pub const TRUNCATE: u32 = 0x00000010;
    /// Fail if the file already exists (requires CREATE)
    pub const EXCLUSIVE: u32 = 0x00000020;
}

/// SSH_FXP_INIT: protocol version and optional extensions offered by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitPacket {
    /// Highest protocol version the client supports
    pub version: u32,
    /// Extension name/data pairs
    pub extensions: Vec<ExtensionPair>,
}

impl Default for InitPacket {
    fn default() -> Self {
        Self {
            version: SFTP_VERSION,
            extensions: Vec::new(),
        }
    }
}

impl Packet for InitPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Init
    }

    fn marshal_size(&self) -> usize {
        4 + self
            .extensions
            .iter()
            .map(ExtensionPair::marshal_size)
            .sum::<usize>()
    }

    fn marshal_body(&self, buf: &mut Buffer) {
        buf.append_u32(self.version);
        for ext in &self.extensions {
            ext.marshal_into(buf);
        }
    }

    fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
        self.version = buf.consume_u32()?;
        self.extensions = ExtensionPair::unmarshal_all(buf)?;
        Ok(())
    }
}

/// SSH_FXP_OPEN
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenPacket {
    /// Path to open
    pub filename: SshString,
    /// Bitwise OR of [`OpenFlags`]
    pub pflags: u32,
    /// Initial attributes for a newly created file
    pub attrs: Attributes,
}

impl OpenPacket {
    /// Returns true if every bit in `flags` is set in `pflags`.
    pub fn has_flags(&self, flags: u32) -> bool {
        self.pflags & flags == flags
    }
}

impl Packet for OpenPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Open
    }

    fn marshal_size(&self) -> usize {
        4 + self.filename.len() + 4 + self.attrs.marshal_size()
    }

    fn marshal_body(&self, buf: &mut Buffer) {
        buf.append_string(&self.filename);
        buf.append_u32(self.pflags);
        self.attrs.marshal_into(buf);
    }

    fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
        self.filename = buf.consume_string()?;
        self.pflags = buf.consume_u32()?;
        self.attrs = Attributes::unmarshal_from(buf)?;
        Ok(())
    }
}

macro_rules! path_packet {
    ($(#[$meta:meta])* $name:ident, $packet_type:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            /// Target path
            pub path: SshString,
        }

        impl $name {
            /// Creates the packet for `path`.
            pub fn new(path: impl Into<SshString>) -> Self {
                Self { path: path.into() }
            }
        }

        impl Packet for $name {
            fn packet_type(&self) -> PacketType {
                PacketType::$packet_type
            }

            fn marshal_size(&self) -> usize {
                4 + self.path.len()
            }

            fn marshal_body(&self, buf: &mut Buffer) {
                buf.append_string(&self.path);
            }

            fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
                self.path = buf.consume_string()?;
                Ok(())
            }
        }
    };
}

macro_rules! handle_packet {
    ($(#[$meta:meta])* $name:ident, $packet_type:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            /// Opaque handle from a previous OPEN or OPENDIR
            pub handle: Bytes,
        }

        impl $name {
            /// Creates the packet for `handle`.
            pub fn new(handle: impl Into<Bytes>) -> Self {
                Self {
                    handle: handle.into(),
                }
            }
        }

        impl Packet for $name {
            fn packet_type(&self) -> PacketType {
                PacketType::$packet_type
            }

            fn marshal_size(&self) -> usize {
                4 + self.handle.len()
            }

            fn marshal_body(&self, buf: &mut Buffer) {
                buf.append_byte_slice(&self.handle);
            }

            fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
                self.handle = buf.consume_byte_slice()?;
                Ok(())
            }
        }
    };
}

macro_rules! path_attrs_packet {
    ($(#[$meta:meta])* $name:ident, $packet_type:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            /// Target path
            pub path: SshString,
            /// Attributes to apply
            pub attrs: Attributes,
        }

        impl Packet for $name {
            fn packet_type(&self) -> PacketType {
                PacketType::$packet_type
            }

            fn marshal_size(&self) -> usize {
                4 + self.path.len() + self.attrs.marshal_size()
            }

            fn marshal_body(&self, buf: &mut Buffer) {
                buf.append_string(&self.path);
                self.attrs.marshal_into(buf);
            }

            fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
                self.path = buf.consume_string()?;
                self.attrs = Attributes::unmarshal_from(buf)?;
                Ok(())
            }
        }
    };
}

handle_packet!(
    /// SSH_FXP_CLOSE
    ClosePacket,
    Close
);
handle_packet!(
    /// SSH_FXP_FSTAT
    FStatPacket,
    FStat
);
handle_packet!(
    /// SSH_FXP_READDIR
    ReadDirPacket,
    ReadDir
);

path_packet!(
    /// SSH_FXP_LSTAT: attributes of a path without following a final symlink.
    LStatPacket,
    LStat
);
path_packet!(
    /// SSH_FXP_OPENDIR
    OpenDirPacket,
    OpenDir
);
path_packet!(
    /// SSH_FXP_REMOVE
    RemovePacket,
    Remove
);
path_packet!(
    /// SSH_FXP_RMDIR
    RmdirPacket,
    Rmdir
);
path_packet!(
    /// SSH_FXP_REALPATH
    RealPathPacket,
    RealPath
);
path_packet!(
    /// SSH_FXP_STAT: attributes of a path, following symlinks.
    StatPacket,
    Stat
);
path_packet!(
    /// SSH_FXP_READLINK
    ReadLinkPacket,
    ReadLink
);

path_attrs_packet!(
    /// SSH_FXP_SETSTAT
    SetStatPacket,
    SetStat
);
path_attrs_packet!(
    /// SSH_FXP_MKDIR
    MkdirPacket,
    Mkdir
);

/// SSH_FXP_FSETSTAT
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FSetStatPacket {
    /// Opaque handle
    pub handle: Bytes,
    /// Attributes to apply
    pub attrs: Attributes,
}

impl Packet for FSetStatPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::FSetStat
    }

    fn marshal_size(&self) -> usize {
        4 + self.handle.len() + self.attrs.marshal_size()
    }

    fn marshal_body(&self, buf: &mut Buffer) {
        buf.append_byte_slice(&self.handle);
        self.attrs.marshal_into(buf);
    }

    fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
        self.handle = buf.consume_byte_slice()?;
        self.attrs = Attributes::unmarshal_from(buf)?;
        Ok(())
    }
}

/// SSH_FXP_READ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadPacket {
    /// Opaque handle
    pub handle: Bytes,
    /// Byte offset to read from
    pub offset: u64,
    /// Maximum number of bytes to return
    pub length: u32,
}

impl ReadPacket {
    /// The requested length, capped at the configured data limit.
    ///
    /// A server allocates its read buffer from this value rather than the
    /// peer-supplied length.
    pub fn clamped_length(&self, config: &CodecConfig) -> u32 {
        self.length.min(config.max_data_length)
    }
}

impl Packet for ReadPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Read
    }

    fn marshal_size(&self) -> usize {
        4 + self.handle.len() + 8 + 4
    }

    fn marshal_body(&self, buf: &mut Buffer) {
        buf.append_byte_slice(&self.handle);
        buf.append_u64(self.offset);
        buf.append_u32(self.length);
    }

    fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
        self.handle = buf.consume_byte_slice()?;
        self.offset = buf.consume_u64()?;
        self.length = buf.consume_u32()?;
        Ok(())
    }
}

/// SSH_FXP_WRITE
///
/// `data` is marshaled as a separate payload so large writes are never
/// copied into the header buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WritePacket {
    /// Opaque handle
    pub handle: Bytes,
    /// Byte offset to write at
    pub offset: u64,
    /// Bytes to write
    pub data: Bytes,
}

impl WritePacket {
    /// Rejects data larger than the configured data limit.
    pub fn check_data_length(&self, config: &CodecConfig) -> Result<()> {
        let length = u32::try_from(self.data.len()).unwrap_or(u32::MAX);
        if length > config.max_data_length {
            return Err(Error::LongPacket {
                length,
                max: config.max_data_length,
            });
        }
        Ok(())
    }
}

impl Packet for WritePacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Write
    }

    fn marshal_size(&self) -> usize {
        4 + self.handle.len() + 8 + 4
    }

    fn marshal_body(&self, buf: &mut Buffer) {
        buf.append_byte_slice(&self.handle);
        buf.append_u64(self.offset);
        buf.append_u32(wire_len(self.data.len()));
    }

    fn payload(&self) -> Option<Bytes> {
        let len = wire_len(self.data.len()) as usize;
        (len > 0).then(|| self.data.slice(..len))
    }

    fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
        self.handle = buf.consume_byte_slice()?;
        self.offset = buf.consume_u64()?;
        self.data = buf.consume_byte_slice()?;
        Ok(())
    }
}

/// SSH_FXP_RENAME
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePacket {
    /// Existing path
    pub old_path: SshString,
    /// New path
    pub new_path: SshString,
}

impl Packet for RenamePacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Rename
    }

    fn marshal_size(&self) -> usize {
        4 + self.old_path.len() + 4 + self.new_path.len()
    }

    fn marshal_body(&self, buf: &mut Buffer) {
        buf.append_string(&self.old_path);
        buf.append_string(&self.new_path);
    }

    fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
        self.old_path = buf.consume_string()?;
        self.new_path = buf.consume_string()?;
        Ok(())
    }
}

/// SSH_FXP_SYMLINK
///
/// OpenSSH sends the target before the link path, the reverse of the
/// draft's field order. This type follows OpenSSH on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymlinkPacket {
    /// Path of the symlink to create
    pub link_path: SshString,
    /// Path the symlink points to
    pub target_path: SshString,
}

impl Packet for SymlinkPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Symlink
    }

    fn marshal_size(&self) -> usize {
        4 + self.target_path.len() + 4 + self.link_path.len()
    }

    fn marshal_body(&self, buf: &mut Buffer) {
        buf.append_string(&self.target_path);
        buf.append_string(&self.link_path);
    }

    fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
        self.target_path = buf.consume_string()?;
        self.link_path = buf.consume_string()?;
        Ok(())
    }
}

//! SFTP packet type codes.
//!
//! The one-byte type code that follows every frame's length prefix.
//!
//! # Ranges
//!
//! - **Requests** (1-23): client to server, INIT through SYMLINK, plus the
//!   LINK/BLOCK/UNBLOCK codes reserved by later protocol drafts
//! - **Responses** (101-105): STATUS, HANDLE, DATA, NAME, ATTRS
//! - **Extensions** (200-201): EXTENDED and EXTENDED_REPLY
//!
//! # Example
//!
//! ```rust
//! use filexfer_proto::sftp::PacketType;
//!
//! assert_eq!(PacketType::from(18), PacketType::Rename);
//! assert_eq!(PacketType::Rename.as_u8(), 18);
//! assert_eq!(PacketType::from(42), PacketType::Unknown(42));
//! ```

use std::fmt;

/// SFTP protocol version (v3).
pub const SFTP_VERSION: u32 = 3;

/// SFTP packet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// SSH_FXP_INIT - Initialize SFTP session
    Init,
    /// SSH_FXP_VERSION - Version response
    Version,
    /// SSH_FXP_OPEN - Open file
    Open,
    /// SSH_FXP_CLOSE - Close file/directory
    Close,
    /// SSH_FXP_READ - Read from file
    Read,
    /// SSH_FXP_WRITE - Write to file
    Write,
    /// SSH_FXP_LSTAT - Get file attributes (no follow symlinks)
    LStat,
    /// SSH_FXP_FSTAT - Get file attributes by handle
    FStat,
    /// SSH_FXP_SETSTAT - Set file attributes
    SetStat,
    /// SSH_FXP_FSETSTAT - Set file attributes by handle
    FSetStat,
    /// SSH_FXP_OPENDIR - Open directory
    OpenDir,
    /// SSH_FXP_READDIR - Read directory
    ReadDir,
    /// SSH_FXP_REMOVE - Remove file
    Remove,
    /// SSH_FXP_MKDIR - Create directory
    Mkdir,
    /// SSH_FXP_RMDIR - Remove directory
    Rmdir,
    /// SSH_FXP_REALPATH - Canonicalize path
    RealPath,
    /// SSH_FXP_STAT - Get file attributes
    Stat,
    /// SSH_FXP_RENAME - Rename file/directory
    Rename,
    /// SSH_FXP_READLINK - Read symbolic link
    ReadLink,
    /// SSH_FXP_SYMLINK - Create symbolic link
    Symlink,
    /// SSH_FXP_LINK - Reserved (filexfer draft 13)
    Link,
    /// SSH_FXP_BLOCK - Reserved (filexfer draft 13)
    Block,
    /// SSH_FXP_UNBLOCK - Reserved (filexfer draft 13)
    Unblock,

    // Response packets
    /// SSH_FXP_STATUS - Status response
    Status,
    /// SSH_FXP_HANDLE - File handle response
    Handle,
    /// SSH_FXP_DATA - Data response
    Data,
    /// SSH_FXP_NAME - Name response
    Name,
    /// SSH_FXP_ATTRS - Attributes response
    Attrs,

    // Extended packets
    /// SSH_FXP_EXTENDED - Extended request
    Extended,
    /// SSH_FXP_EXTENDED_REPLY - Extended response
    ExtendedReply,

    /// A code outside the enumeration, kept for diagnostics.
    Unknown(u8),
}

impl PacketType {
    /// Returns the wire code.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Init => 1,
            Self::Version => 2,
            Self::Open => 3,
            Self::Close => 4,
            Self::Read => 5,
            Self::Write => 6,
            Self::LStat => 7,
            Self::FStat => 8,
            Self::SetStat => 9,
            Self::FSetStat => 10,
            Self::OpenDir => 11,
            Self::ReadDir => 12,
            Self::Remove => 13,
            Self::Mkdir => 14,
            Self::Rmdir => 15,
            Self::RealPath => 16,
            Self::Stat => 17,
            Self::Rename => 18,
            Self::ReadLink => 19,
            Self::Symlink => 20,
            Self::Link => 21,
            Self::Block => 22,
            Self::Unblock => 23,
            Self::Status => 101,
            Self::Handle => 102,
            Self::Data => 103,
            Self::Name => 104,
            Self::Attrs => 105,
            Self::Extended => 200,
            Self::ExtendedReply => 201,
            Self::Unknown(code) => code,
        }
    }

    /// Returns false for INIT and VERSION, the only packets framed without a request-id.
    pub fn has_request_id(self) -> bool {
        !matches!(self, Self::Init | Self::Version)
    }

    /// Returns true for codes sent from client to server.
    pub fn is_request(self) -> bool {
        matches!(self.as_u8(), 1 | 3..=23 | 200)
    }

    /// Returns true for codes sent from server to client.
    pub fn is_response(self) -> bool {
        matches!(
            self,
            Self::Version
                | Self::Status
                | Self::Handle
                | Self::Data
                | Self::Name
                | Self::Attrs
                | Self::ExtendedReply
        )
    }

    /// Returns the `SSH_FXP_*` name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Init => "SSH_FXP_INIT",
            Self::Version => "SSH_FXP_VERSION",
            Self::Open => "SSH_FXP_OPEN",
            Self::Close => "SSH_FXP_CLOSE",
            Self::Read => "SSH_FXP_READ",
            Self::Write => "SSH_FXP_WRITE",
            Self::LStat => "SSH_FXP_LSTAT",
            Self::FStat => "SSH_FXP_FSTAT",
            Self::SetStat => "SSH_FXP_SETSTAT",
            Self::FSetStat => "SSH_FXP_FSETSTAT",
            Self::OpenDir => "SSH_FXP_OPENDIR",
            Self::ReadDir => "SSH_FXP_READDIR",
            Self::Remove => "SSH_FXP_REMOVE",
            Self::Mkdir => "SSH_FXP_MKDIR",
            Self::Rmdir => "SSH_FXP_RMDIR",
            Self::RealPath => "SSH_FXP_REALPATH",
            Self::Stat => "SSH_FXP_STAT",
            Self::Rename => "SSH_FXP_RENAME",
            Self::ReadLink => "SSH_FXP_READLINK",
            Self::Symlink => "SSH_FXP_SYMLINK",
            Self::Link => "SSH_FXP_LINK",
            Self::Block => "SSH_FXP_BLOCK",
            Self::Unblock => "SSH_FXP_UNBLOCK",
            Self::Status => "SSH_FXP_STATUS",
            Self::Handle => "SSH_FXP_HANDLE",
            Self::Data => "SSH_FXP_DATA",
            Self::Name => "SSH_FXP_NAME",
            Self::Attrs => "SSH_FXP_ATTRS",
            Self::Extended => "SSH_FXP_EXTENDED",
            Self::ExtendedReply => "SSH_FXP_EXTENDED_REPLY",
            Self::Unknown(_) => "SSH_FXP_UNKNOWN",
        }
    }
}

impl From<u8> for PacketType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Init,
            2 => Self::Version,
            3 => Self::Open,
            4 => Self::Close,
            5 => Self::Read,
            6 => Self::Write,
            7 => Self::LStat,
            8 => Self::FStat,
            9 => Self::SetStat,
            10 => Self::FSetStat,
            11 => Self::OpenDir,
            12 => Self::ReadDir,
            13 => Self::Remove,
            14 => Self::Mkdir,
            15 => Self::Rmdir,
            16 => Self::RealPath,
            17 => Self::Stat,
            18 => Self::Rename,
            19 => Self::ReadLink,
            20 => Self::Symlink,
            21 => Self::Link,
            22 => Self::Block,
            23 => Self::Unblock,
            101 => Self::Status,
            102 => Self::Handle,
            103 => Self::Data,
            104 => Self::Name,
            105 => Self::Attrs,
            200 => Self::Extended,
            201 => Self::ExtendedReply,
            other => Self::Unknown(other),
        }
    }
}

impl From<PacketType> for u8 {
    fn from(value: PacketType) -> Self {
        value.as_u8()
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "SSH_FXP_UNKNOWN({})", code),
            other => f.write_str(other.name()),
        }
    }
}

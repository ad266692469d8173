//! SSH_FXP_STATUS codes and the status packet, which doubles as an error value.
//!
//! # Example
//!
//! ```rust
//! use filexfer_proto::sftp::{StatusCode, StatusPacket};
//! use std::io::ErrorKind;
//!
//! let status = StatusPacket::new(StatusCode::NoSuchFile, "no such file");
//! assert_eq!(status, StatusCode::NoSuchFile);
//! assert_eq!(status, ErrorKind::NotFound);
//! assert_eq!(status.to_string(), "sftp: SSH_FX_NO_SUCH_FILE: no such file");
//! ```

use super::buffer::Buffer;
use super::error::Result;
use super::message::PacketType;
use super::packet::Packet;
use super::string::SshString;
use std::fmt;
use std::io;

/// Language tag sent with locally generated status messages.
pub const DEFAULT_LANGUAGE_TAG: &str = "en";

/// SFTP status codes (SSH_FX_*).
///
/// Codes 0-8 are defined by protocol version 3; the remaining named codes
/// come from filexfer draft 13 and are accepted for interoperability.
///
/// Codes compare by wire value, so `Other(2)` equals `NoSuchFile`.
#[derive(Debug, Clone, Copy)]
pub enum StatusCode {
    /// SSH_FX_OK - Success
    Ok,
    /// SSH_FX_EOF - End of file
    Eof,
    /// SSH_FX_NO_SUCH_FILE - No such file
    NoSuchFile,
    /// SSH_FX_PERMISSION_DENIED - Permission denied
    PermissionDenied,
    /// SSH_FX_FAILURE - General failure
    Failure,
    /// SSH_FX_BAD_MESSAGE - Bad message
    BadMessage,
    /// SSH_FX_NO_CONNECTION - No connection
    NoConnection,
    /// SSH_FX_CONNECTION_LOST - Connection lost
    ConnectionLost,
    /// SSH_FX_OP_UNSUPPORTED - Operation not supported
    OpUnsupported,
    /// SSH_FX_INVALID_HANDLE
    InvalidHandle,
    /// SSH_FX_NO_SUCH_PATH
    NoSuchPath,
    /// SSH_FX_FILE_ALREADY_EXISTS
    FileAlreadyExists,
    /// SSH_FX_WRITE_PROTECT
    WriteProtect,
    /// SSH_FX_NO_MEDIA
    NoMedia,
    /// SSH_FX_NO_SPACE_ON_FILESYSTEM
    NoSpaceOnFilesystem,
    /// SSH_FX_QUOTA_EXCEEDED
    QuotaExceeded,
    /// SSH_FX_UNKNOWN_PRINCIPAL
    UnknownPrincipal,
    /// SSH_FX_LOCK_CONFLICT
    LockConflict,
    /// SSH_FX_DIR_NOT_EMPTY
    DirNotEmpty,
    /// SSH_FX_NOT_A_DIRECTORY
    NotADirectory,
    /// SSH_FX_INVALID_FILENAME
    InvalidFilename,
    /// SSH_FX_LINK_LOOP
    LinkLoop,
    /// SSH_FX_CANNOT_DELETE
    CannotDelete,
    /// SSH_FX_INVALID_PARAMETER
    InvalidParameter,
    /// SSH_FX_FILE_IS_A_DIRECTORY
    FileIsADirectory,
    /// SSH_FX_BYTE_RANGE_LOCK_CONFLICT
    ByteRangeLockConflict,
    /// SSH_FX_BYTE_RANGE_LOCK_REFUSED
    ByteRangeLockRefused,
    /// SSH_FX_DELETE_PENDING
    DeletePending,
    /// SSH_FX_FILE_CORRUPT
    FileCorrupt,
    /// SSH_FX_OWNER_INVALID
    OwnerInvalid,
    /// SSH_FX_GROUP_INVALID
    GroupInvalid,
    /// SSH_FX_NO_MATCHING_BYTE_RANGE_LOCK
    NoMatchingByteRangeLock,
    /// A code this implementation does not name.
    Other(u32),
}

impl StatusCode {
    /// Returns the wire value.
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Ok => 0,
            Self::Eof => 1,
            Self::NoSuchFile => 2,
            Self::PermissionDenied => 3,
            Self::Failure => 4,
            Self::BadMessage => 5,
            Self::NoConnection => 6,
            Self::ConnectionLost => 7,
            Self::OpUnsupported => 8,
            Self::InvalidHandle => 9,
            Self::NoSuchPath => 10,
            Self::FileAlreadyExists => 11,
            Self::WriteProtect => 12,
            Self::NoMedia => 13,
            Self::NoSpaceOnFilesystem => 14,
            Self::QuotaExceeded => 15,
            Self::UnknownPrincipal => 16,
            Self::LockConflict => 17,
            Self::DirNotEmpty => 18,
            Self::NotADirectory => 19,
            Self::InvalidFilename => 20,
            Self::LinkLoop => 21,
            Self::CannotDelete => 22,
            Self::InvalidParameter => 23,
            Self::FileIsADirectory => 24,
            Self::ByteRangeLockConflict => 25,
            Self::ByteRangeLockRefused => 26,
            Self::DeletePending => 27,
            Self::FileCorrupt => 28,
            Self::OwnerInvalid => 29,
            Self::GroupInvalid => 30,
            Self::NoMatchingByteRangeLock => 31,
            Self::Other(code) => code,
        }
    }

    /// Replaces `Other` holding a named code with that named variant.
    pub fn normalize(self) -> Self {
        Self::from(self.as_u32())
    }

    /// Returns the `SSH_FX_*` name.
    pub fn name(self) -> &'static str {
        match self.normalize() {
            Self::Ok => "SSH_FX_OK",
            Self::Eof => "SSH_FX_EOF",
            Self::NoSuchFile => "SSH_FX_NO_SUCH_FILE",
            Self::PermissionDenied => "SSH_FX_PERMISSION_DENIED",
            Self::Failure => "SSH_FX_FAILURE",
            Self::BadMessage => "SSH_FX_BAD_MESSAGE",
            Self::NoConnection => "SSH_FX_NO_CONNECTION",
            Self::ConnectionLost => "SSH_FX_CONNECTION_LOST",
            Self::OpUnsupported => "SSH_FX_OP_UNSUPPORTED",
            Self::InvalidHandle => "SSH_FX_INVALID_HANDLE",
            Self::NoSuchPath => "SSH_FX_NO_SUCH_PATH",
            Self::FileAlreadyExists => "SSH_FX_FILE_ALREADY_EXISTS",
            Self::WriteProtect => "SSH_FX_WRITE_PROTECT",
            Self::NoMedia => "SSH_FX_NO_MEDIA",
            Self::NoSpaceOnFilesystem => "SSH_FX_NO_SPACE_ON_FILESYSTEM",
            Self::QuotaExceeded => "SSH_FX_QUOTA_EXCEEDED",
            Self::UnknownPrincipal => "SSH_FX_UNKNOWN_PRINCIPAL",
            Self::LockConflict => "SSH_FX_LOCK_CONFLICT",
            Self::DirNotEmpty => "SSH_FX_DIR_NOT_EMPTY",
            Self::NotADirectory => "SSH_FX_NOT_A_DIRECTORY",
            Self::InvalidFilename => "SSH_FX_INVALID_FILENAME",
            Self::LinkLoop => "SSH_FX_LINK_LOOP",
            Self::CannotDelete => "SSH_FX_CANNOT_DELETE",
            Self::InvalidParameter => "SSH_FX_INVALID_PARAMETER",
            Self::FileIsADirectory => "SSH_FX_FILE_IS_A_DIRECTORY",
            Self::ByteRangeLockConflict => "SSH_FX_BYTE_RANGE_LOCK_CONFLICT",
            Self::ByteRangeLockRefused => "SSH_FX_BYTE_RANGE_LOCK_REFUSED",
            Self::DeletePending => "SSH_FX_DELETE_PENDING",
            Self::FileCorrupt => "SSH_FX_FILE_CORRUPT",
            Self::OwnerInvalid => "SSH_FX_OWNER_INVALID",
            Self::GroupInvalid => "SSH_FX_GROUP_INVALID",
            Self::NoMatchingByteRangeLock => "SSH_FX_NO_MATCHING_BYTE_RANGE_LOCK",
            Self::Other(_) => "SSH_FX_UNKNOWN",
        }
    }

    /// Returns the generic I/O error kind this code corresponds to, if any.
    pub fn io_error_kind(self) -> Option<io::ErrorKind> {
        match self.normalize() {
            Self::Eof => Some(io::ErrorKind::UnexpectedEof),
            Self::NoSuchFile => Some(io::ErrorKind::NotFound),
            Self::PermissionDenied => Some(io::ErrorKind::PermissionDenied),
            _ => None,
        }
    }

    /// Maps a local I/O error to the nearest status code.
    ///
    /// Used where a filesystem call made on behalf of a request fails and
    /// the failure has to be reported to the peer.
    pub fn from_io_error(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NoSuchFile,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::UnexpectedEof => Self::Eof,
            io::ErrorKind::Unsupported => Self::OpUnsupported,
            io::ErrorKind::NotConnected => Self::NoConnection,
            io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::BrokenPipe => Self::ConnectionLost,
            _ => Self::Failure,
        }
    }
}

impl From<u32> for StatusCode {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Ok,
            1 => Self::Eof,
            2 => Self::NoSuchFile,
            3 => Self::PermissionDenied,
            4 => Self::Failure,
            5 => Self::BadMessage,
            6 => Self::NoConnection,
            7 => Self::ConnectionLost,
            8 => Self::OpUnsupported,
            9 => Self::InvalidHandle,
            10 => Self::NoSuchPath,
            11 => Self::FileAlreadyExists,
            12 => Self::WriteProtect,
            13 => Self::NoMedia,
            14 => Self::NoSpaceOnFilesystem,
            15 => Self::QuotaExceeded,
            16 => Self::UnknownPrincipal,
            17 => Self::LockConflict,
            18 => Self::DirNotEmpty,
            19 => Self::NotADirectory,
            20 => Self::InvalidFilename,
            21 => Self::LinkLoop,
            22 => Self::CannotDelete,
            23 => Self::InvalidParameter,
            24 => Self::FileIsADirectory,
            25 => Self::ByteRangeLockConflict,
            26 => Self::ByteRangeLockRefused,
            27 => Self::DeletePending,
            28 => Self::FileCorrupt,
            29 => Self::OwnerInvalid,
            30 => Self::GroupInvalid,
            31 => Self::NoMatchingByteRangeLock,
            other => Self::Other(other),
        }
    }
}

impl From<StatusCode> for u32 {
    fn from(value: StatusCode) -> Self {
        value.as_u32()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.normalize() {
            Self::Other(code) => write!(f, "SSH_FX_UNKNOWN({})", code),
            other => f.write_str(other.name()),
        }
    }
}

impl PartialEq for StatusCode {
    fn eq(&self, other: &Self) -> bool {
        self.as_u32() == other.as_u32()
    }
}

impl Eq for StatusCode {}

impl std::hash::Hash for StatusCode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_u32().hash(state);
    }
}

impl PartialEq<io::ErrorKind> for StatusCode {
    fn eq(&self, other: &io::ErrorKind) -> bool {
        self.io_error_kind() == Some(*other)
    }
}

/// SSH_FXP_STATUS packet.
///
/// ```text
/// uint32    status code
/// string    error message
/// string    language tag
/// ```
///
/// Also usable as an error: two status packets are equal when all three
/// fields match, while comparing against a bare [`StatusCode`] looks at
/// the code alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPacket {
    /// Status code
    pub status_code: StatusCode,
    /// Human-readable message
    pub error_message: SshString,
    /// RFC 1766 language tag
    pub language_tag: SshString,
}

impl Default for StatusPacket {
    fn default() -> Self {
        Self {
            status_code: StatusCode::Ok,
            error_message: SshString::new(),
            language_tag: SshString::new(),
        }
    }
}

impl StatusPacket {
    /// Creates a status with the default language tag.
    pub fn new(status_code: StatusCode, error_message: impl Into<SshString>) -> Self {
        Self {
            status_code,
            error_message: error_message.into(),
            language_tag: SshString::from_static(DEFAULT_LANGUAGE_TAG),
        }
    }

    /// Creates a BAD_MESSAGE status.
    pub fn bad_message(error_message: impl Into<SshString>) -> Self {
        Self::new(StatusCode::BadMessage, error_message)
    }

    /// Translates a local I/O failure into the status reported to the peer.
    pub fn from_io_error(err: &io::Error) -> Self {
        Self::new(StatusCode::from_io_error(err), err.to_string())
    }

    /// Returns true for SSH_FX_OK.
    pub fn is_ok(&self) -> bool {
        self.status_code == StatusCode::Ok
    }

    /// Converts an OK status into `Ok(())` and anything else into an error.
    pub fn into_result(self) -> std::result::Result<(), StatusPacket> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<StatusCode> for StatusPacket {
    fn from(status_code: StatusCode) -> Self {
        Self {
            status_code,
            ..Self::default()
        }
    }
}

impl fmt::Display for StatusPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sftp: {}", self.status_code)?;
        if !self.error_message.is_empty() {
            write!(f, ": {}", self.error_message)?;
        }
        Ok(())
    }
}

impl std::error::Error for StatusPacket {}

impl PartialEq<StatusCode> for StatusPacket {
    fn eq(&self, other: &StatusCode) -> bool {
        self.status_code == *other
    }
}

impl PartialEq<StatusPacket> for StatusCode {
    fn eq(&self, other: &StatusPacket) -> bool {
        *self == other.status_code
    }
}

impl PartialEq<io::ErrorKind> for StatusPacket {
    fn eq(&self, other: &io::ErrorKind) -> bool {
        self.status_code == *other
    }
}

impl From<StatusPacket> for io::Error {
    fn from(status: StatusPacket) -> Self {
        let kind = status
            .status_code
            .io_error_kind()
            .unwrap_or(io::ErrorKind::Other);
        io::Error::new(kind, status)
    }
}

impl Packet for StatusPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Status
    }

    fn marshal_size(&self) -> usize {
        4 + 4 + self.error_message.len() + 4 + self.language_tag.len()
    }

    fn marshal_body(&self, buf: &mut Buffer) {
        buf.append_u32(self.status_code.as_u32());
        buf.append_string(&self.error_message);
        buf.append_string(&self.language_tag);
    }

    fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
        self.status_code = StatusCode::from(buf.consume_u32()?);
        self.error_message = buf.consume_string()?;
        self.language_tag = buf.consume_string()?;
        Ok(())
    }
}

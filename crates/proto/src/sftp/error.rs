//! Error types for SFTP wire encoding and decoding.

use super::message::PacketType;
use super::status::StatusPacket;
use filexfer_platform::FilexferError;

/// Result type for SFTP codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// SFTP codec errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A decode needed more bytes than the buffer holds.
    #[error("sftp: short packet")]
    ShortPacket,

    /// A frame's declared length exceeds the configured maximum.
    #[error("sftp: packet too long: {length} bytes (maximum {max})")]
    LongPacket {
        /// Declared frame length
        length: u32,
        /// Configured maximum
        max: u32,
    },

    /// A frame's length prefix disagrees with the bytes supplied.
    #[error("sftp: frame length mismatch: declared {declared} bytes, got {actual}")]
    FrameLength {
        /// Length from the prefix
        declared: usize,
        /// Bytes actually present after the prefix
        actual: usize,
    },

    /// A response frame carried a type code outside the enumeration.
    #[error("sftp: unknown packet type: {0}")]
    UnknownPacketType(u8),

    /// A response frame carried a known code that is not a response.
    #[error("sftp: unexpected response packet type: {0}")]
    UnexpectedPacketType(PacketType),

    /// Protocol-level status, either received from the peer or raised by dispatch.
    #[error(transparent)]
    Status(#[from] StatusPacket),

    /// Transport failure while reading or writing a frame.
    #[error("sftp: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true for errors that mean the frame itself was malformed.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::ShortPacket
                | Error::LongPacket { .. }
                | Error::FrameLength { .. }
                | Error::UnknownPacketType(_)
                | Error::UnexpectedPacketType(_)
        )
    }
}

impl From<Error> for FilexferError {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => FilexferError::Io(e),
            Error::Status(status) => FilexferError::Other(Box::new(status)),
            other => FilexferError::Protocol(other.to_string()),
        }
    }
}

//! SFTP packet framing and dispatch.
//!
//! # Frame Format
//!
//! ```text
//! uint32    length        byte count of everything below
//! byte      type
//! uint32    request-id    absent for INIT and VERSION
//! byte[n]   body
//! ```
//!
//! Every packet kind implements [`Packet`]: it knows its type code, how
//! large its body is, and how to write and read that body against a
//! [`Buffer`]. Inbound frames are turned into typed packets by
//! [`RequestPacket`] and [`ResponsePacket`], or kept opaque with
//! [`RawPacket`] when only the header matters.
//!
//! # Example
//!
//! ```rust
//! use filexfer_proto::sftp::{Packet, RenamePacket, Request, RequestPacket};
//!
//! let rename = RenamePacket {
//!     old_path: "/foo".into(),
//!     new_path: "/bar".into(),
//! };
//! let (header, payload) = rename.marshal(42);
//! assert!(payload.is_none());
//!
//! let decoded = RequestPacket::decode(&header[..]).unwrap();
//! assert_eq!(decoded.request_id, 42);
//! assert_eq!(decoded.request, Request::Rename(rename));
//! ```

use super::buffer::{Buffer, LENGTH_PREFIX_LEN};
use super::error::{Error, Result};
use super::extended::{ExtendedPacket, ExtendedReplyPacket};
use super::message::PacketType;
use super::requests::*;
use super::responses::*;
use super::status::StatusPacket;
use bytes::{Bytes, BytesMut};
use std::fmt;
use tracing::{trace, warn};

/// Length prefix, type and request-id.
pub const HEADER_LEN: usize = LENGTH_PREFIX_LEN + 1 + 4;

/// A packet kind with a fixed body layout.
pub trait Packet: fmt::Debug + Send + Sync {
    /// Type code written after the length prefix.
    fn packet_type(&self) -> PacketType;

    /// Number of body bytes [`Packet::marshal_body`] writes.
    ///
    /// Excludes the header and any separately returned payload.
    fn marshal_size(&self) -> usize;

    /// Writes every body field except the payload.
    fn marshal_body(&self, buf: &mut Buffer);

    /// Bulk data sent after the header without being copied into it.
    fn payload(&self) -> Option<Bytes> {
        None
    }

    /// Populates this packet from a buffer positioned just after the header.
    fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()>;

    /// Encodes the packet as header bytes plus an optional payload.
    ///
    /// The length prefix in the header covers both. `request_id` is not
    /// written for INIT and VERSION.
    fn marshal(&self, request_id: u32) -> (Bytes, Option<Bytes>) {
        let mut buf = Buffer::for_marshal(HEADER_LEN - LENGTH_PREFIX_LEN + self.marshal_size());
        buf.start_packet(self.packet_type(), request_id);
        self.marshal_body(&mut buf);

        let payload = self.payload();
        let header = buf.finish_packet(payload.as_ref().map_or(0, Bytes::len));
        (header, payload)
    }

    /// Encodes the packet into one contiguous frame.
    fn to_bytes(&self, request_id: u32) -> Vec<u8> {
        let (header, payload) = self.marshal(request_id);
        let mut out = Vec::with_capacity(header.len() + payload.as_ref().map_or(0, Bytes::len));
        out.extend_from_slice(&header);
        if let Some(payload) = payload {
            out.extend_from_slice(&payload);
        }
        out
    }
}

/// The common header of a decoded frame, with the body left in a cursor.
#[derive(Debug)]
pub struct Frame {
    /// Packet type
    pub packet_type: PacketType,
    /// Request-id, 0 for INIT and VERSION
    pub request_id: u32,
    /// Body bytes following the header
    pub body: Buffer,
}

impl Frame {
    /// Decodes a complete frame, including its length prefix.
    ///
    /// The length prefix must match the number of bytes that follow it exactly.
    pub fn decode(data: impl Into<Buffer>) -> Result<Self> {
        let mut buf = data.into();
        let declared = buf.consume_u32()? as usize;
        let actual = buf.len();
        if declared > actual {
            return Err(Error::ShortPacket);
        }
        if declared < actual {
            return Err(Error::FrameLength { declared, actual });
        }
        Self::decode_unprefixed(buf)
    }

    /// Decodes a frame whose length prefix has already been stripped.
    pub fn decode_unprefixed(data: impl Into<Buffer>) -> Result<Self> {
        let mut body = data.into();
        let packet_type = PacketType::from(body.consume_u8()?);
        let request_id = if packet_type.has_request_id() {
            body.consume_u32()?
        } else {
            0
        };

        trace!(
            packet_type = %packet_type,
            request_id,
            body_len = body.len(),
            "decoded SFTP frame header"
        );

        Ok(Self {
            packet_type,
            request_id,
            body,
        })
    }
}

/// A packet with only its header decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    /// Packet type
    pub packet_type: PacketType,
    /// Request-id, 0 for INIT and VERSION
    pub request_id: u32,
    /// Undecoded body
    pub data: Bytes,
}

impl RawPacket {
    /// Decodes the header of a complete frame and keeps the body opaque.
    pub fn decode(data: impl Into<Buffer>) -> Result<Self> {
        Ok(Self::from(Frame::decode(data)?))
    }

    /// Encodes the header; the opaque body is returned as the payload.
    pub fn marshal(&self) -> (Bytes, Option<Bytes>) {
        let mut buf = Buffer::for_marshal(HEADER_LEN - LENGTH_PREFIX_LEN);
        buf.start_packet(self.packet_type, self.request_id);
        let payload = (!self.data.is_empty()).then(|| self.data.clone());
        let header = buf.finish_packet(self.data.len());
        (header, payload)
    }

    /// Reopens the body as a cursor; the bytes are only copied if shared.
    fn into_frame(self) -> Frame {
        Frame {
            packet_type: self.packet_type,
            request_id: self.request_id,
            body: Buffer::from(BytesMut::from(self.data)),
        }
    }

    /// Fully decodes the body as a request.
    pub fn into_request(self) -> Result<RequestPacket> {
        RequestPacket::from_frame(self.into_frame())
    }

    /// Fully decodes the body as a response.
    pub fn into_response(self) -> Result<ResponsePacket> {
        ResponsePacket::from_frame(self.into_frame())
    }
}

impl From<Frame> for RawPacket {
    fn from(frame: Frame) -> Self {
        Self {
            packet_type: frame.packet_type,
            request_id: frame.request_id,
            data: frame.body.into_bytes(),
        }
    }
}

macro_rules! packet_kinds {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident($ty:ty), )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant($ty), )*
        }

        impl $name {
            /// Returns an empty packet of the given kind, or `None` for other codes.
            pub fn from_type(packet_type: PacketType) -> Option<Self> {
                match packet_type {
                    $( PacketType::$variant => Some(Self::$variant(<$ty>::default())), )*
                    _ => None,
                }
            }

            /// Borrows the packet through the [`Packet`] trait.
            pub fn as_packet(&self) -> &dyn Packet {
                match self {
                    $( Self::$variant(p) => p, )*
                }
            }

            /// Mutably borrows the packet through the [`Packet`] trait.
            pub fn as_packet_mut(&mut self) -> &mut dyn Packet {
                match self {
                    $( Self::$variant(p) => p, )*
                }
            }

            /// Type code of the contained packet.
            pub fn packet_type(&self) -> PacketType {
                self.as_packet().packet_type()
            }
        }

        $(
            impl From<$ty> for $name {
                fn from(p: $ty) -> Self {
                    Self::$variant(p)
                }
            }
        )*
    };
}

packet_kinds! {
    /// Any packet a client sends.
    pub enum Request {
        /// SSH_FXP_INIT
        Init(InitPacket),
        /// SSH_FXP_OPEN
        Open(OpenPacket),
        /// SSH_FXP_CLOSE
        Close(ClosePacket),
        /// SSH_FXP_READ
        Read(ReadPacket),
        /// SSH_FXP_WRITE
        Write(WritePacket),
        /// SSH_FXP_LSTAT
        LStat(LStatPacket),
        /// SSH_FXP_FSTAT
        FStat(FStatPacket),
        /// SSH_FXP_SETSTAT
        SetStat(SetStatPacket),
        /// SSH_FXP_FSETSTAT
        FSetStat(FSetStatPacket),
        /// SSH_FXP_OPENDIR
        OpenDir(OpenDirPacket),
        /// SSH_FXP_READDIR
        ReadDir(ReadDirPacket),
        /// SSH_FXP_REMOVE
        Remove(RemovePacket),
        /// SSH_FXP_MKDIR
        Mkdir(MkdirPacket),
        /// SSH_FXP_RMDIR
        Rmdir(RmdirPacket),
        /// SSH_FXP_REALPATH
        RealPath(RealPathPacket),
        /// SSH_FXP_STAT
        Stat(StatPacket),
        /// SSH_FXP_RENAME
        Rename(RenamePacket),
        /// SSH_FXP_READLINK
        ReadLink(ReadLinkPacket),
        /// SSH_FXP_SYMLINK
        Symlink(SymlinkPacket),
        /// SSH_FXP_EXTENDED
        Extended(ExtendedPacket),
    }
}

packet_kinds! {
    /// Any packet a server sends.
    pub enum Response {
        /// SSH_FXP_VERSION
        Version(VersionPacket),
        /// SSH_FXP_STATUS
        Status(StatusPacket),
        /// SSH_FXP_HANDLE
        Handle(HandlePacket),
        /// SSH_FXP_DATA
        Data(DataPacket),
        /// SSH_FXP_NAME
        Name(NamePacket),
        /// SSH_FXP_ATTRS
        Attrs(AttrsPacket),
        /// SSH_FXP_EXTENDED_REPLY
        ExtendedReply(ExtendedReplyPacket),
    }
}

impl Request {
    /// Returns an empty request packet for `packet_type`.
    ///
    /// Codes outside the request set produce a BAD_MESSAGE status, which a
    /// server sends back to the peer instead of dropping the connection.
    pub fn new_from_type(packet_type: PacketType) -> Result<Self> {
        Self::from_type(packet_type).ok_or_else(|| {
            warn!(packet_type = %packet_type, "unexpected request packet type");
            Error::Status(StatusPacket::bad_message(format!(
                "unexpected request packet type: {}",
                packet_type
            )))
        })
    }
}

impl Response {
    /// Returns an empty response packet for `packet_type`.
    ///
    /// Codes with no meaning at all yield [`Error::UnknownPacketType`]; known
    /// request codes yield [`Error::UnexpectedPacketType`].
    pub fn new_from_type(packet_type: PacketType) -> Result<Self> {
        Self::from_type(packet_type).ok_or_else(|| {
            warn!(packet_type = %packet_type, "unexpected response packet type");
            match packet_type {
                PacketType::Unknown(code) => Error::UnknownPacketType(code),
                known => Error::UnexpectedPacketType(known),
            }
        })
    }
}

/// A request together with its request-id.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPacket {
    /// Request-id, echoed by the matching response
    pub request_id: u32,
    /// Decoded request
    pub request: Request,
}

impl RequestPacket {
    /// Creates a request packet.
    pub fn new(request_id: u32, request: impl Into<Request>) -> Self {
        Self {
            request_id,
            request: request.into(),
        }
    }

    /// Decodes a complete frame.
    pub fn decode(data: impl Into<Buffer>) -> Result<Self> {
        Self::from_frame(Frame::decode(data)?)
    }

    /// Decodes the body of an already-framed request.
    pub fn from_frame(frame: Frame) -> Result<Self> {
        let Frame {
            packet_type,
            request_id,
            mut body,
        } = frame;

        let mut request = Request::new_from_type(packet_type)?;
        request.as_packet_mut().unmarshal_body(&mut body)?;
        Ok(Self {
            request_id,
            request,
        })
    }

    /// Encodes the request as header bytes plus an optional payload.
    pub fn marshal(&self) -> (Bytes, Option<Bytes>) {
        self.request.as_packet().marshal(self.request_id)
    }
}

/// A response together with the request-id it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsePacket {
    /// Request-id of the request being answered
    pub request_id: u32,
    /// Decoded response
    pub response: Response,
}

impl ResponsePacket {
    /// Creates a response packet.
    pub fn new(request_id: u32, response: impl Into<Response>) -> Self {
        Self {
            request_id,
            response: response.into(),
        }
    }

    /// Decodes a complete frame.
    pub fn decode(data: impl Into<Buffer>) -> Result<Self> {
        Self::from_frame(Frame::decode(data)?)
    }

    /// Decodes the body of an already-framed response.
    pub fn from_frame(frame: Frame) -> Result<Self> {
        let Frame {
            packet_type,
            request_id,
            mut body,
        } = frame;

        let mut response = Response::new_from_type(packet_type)?;
        response.as_packet_mut().unmarshal_body(&mut body)?;
        Ok(Self {
            request_id,
            response,
        })
    }

    /// Encodes the response as header bytes plus an optional payload.
    pub fn marshal(&self) -> (Bytes, Option<Bytes>) {
        self.response.as_packet().marshal(self.request_id)
    }

    /// Returns the status if this response is an error status.
    ///
    /// SSH_FX_OK is not an error and yields `Ok(self)`.
    pub fn into_result(self) -> std::result::Result<Self, StatusPacket> {
        match self.response {
            Response::Status(status) if !status.is_ok() => Err(status),
            _ => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sftp::status::StatusCode;

    #[test]
    fn test_frame_decode() {
        let bytes = [
            0, 0, 0, 9, // length
            4, // CLOSE
            0, 0, 0, 7, // request id
            0, 0, 0, 0, // empty handle
        ];
        let frame = Frame::decode(&bytes[..]).unwrap();
        assert_eq!(frame.packet_type, PacketType::Close);
        assert_eq!(frame.request_id, 7);
        assert_eq!(frame.body.bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_frame_decode_without_request_id() {
        let bytes = [0, 0, 0, 5, 2, 0, 0, 0, 3];
        let frame = Frame::decode(&bytes[..]).unwrap();
        assert_eq!(frame.packet_type, PacketType::Version);
        assert_eq!(frame.request_id, 0);
        assert_eq!(frame.body.bytes(), &[0, 0, 0, 3]);
    }

    #[test]
    fn test_frame_length_mismatch() {
        // Declares more than present.
        let short = [0, 0, 0, 10, 4, 0, 0, 0, 7];
        assert!(matches!(Frame::decode(&short[..]), Err(Error::ShortPacket)));

        // Declares less than present.
        let long = [0, 0, 0, 1, 4, 0, 0, 0, 7];
        assert!(matches!(
            Frame::decode(&long[..]),
            Err(Error::FrameLength {
                declared: 1,
                actual: 5
            })
        ));

        // Declares a header the frame cannot hold.
        let empty = [0, 0, 0, 0];
        assert!(matches!(Frame::decode(&empty[..]), Err(Error::ShortPacket)));
    }

    #[test]
    fn test_unknown_request_type_is_bad_message() {
        let bytes = [0, 0, 0, 5, 99, 0, 0, 0, 1];
        match RequestPacket::decode(&bytes[..]) {
            Err(Error::Status(status)) => {
                assert_eq!(status, StatusCode::BadMessage);
                assert!(status.error_message.to_string_lossy().contains("SSH_FXP_UNKNOWN(99)"));
            }
            other => panic!("expected BAD_MESSAGE status, got {:?}", other),
        }
    }

    #[test]
    fn test_response_type_sent_as_request_is_bad_message() {
        let status = StatusPacket::from(StatusCode::Ok);
        let bytes = status.to_bytes(1);
        assert!(matches!(
            RequestPacket::decode(&bytes[..]),
            Err(Error::Status(s)) if s == StatusCode::BadMessage
        ));
    }

    #[test]
    fn test_reserved_request_codes_are_bad_message() {
        for code in [21u8, 22, 23] {
            assert!(matches!(
                Request::new_from_type(PacketType::from(code)),
                Err(Error::Status(s)) if s == StatusCode::BadMessage
            ));
        }
    }

    #[test]
    fn test_unknown_response_type() {
        let bytes = [0, 0, 0, 5, 150, 0, 0, 0, 1];
        assert!(matches!(
            ResponsePacket::decode(&bytes[..]),
            Err(Error::UnknownPacketType(150))
        ));
    }

    #[test]
    fn test_request_type_sent_as_response() {
        let init = InitPacket::default();
        let bytes = init.to_bytes(0);
        assert!(matches!(
            ResponsePacket::decode(&bytes[..]),
            Err(Error::UnexpectedPacketType(PacketType::Init))
        ));
        assert!(matches!(
            Response::new_from_type(PacketType::Open),
            Err(Error::UnexpectedPacketType(PacketType::Open))
        ));
        assert!(matches!(
            Response::new_from_type(PacketType::from(99)),
            Err(Error::UnknownPacketType(99))
        ));
    }

    #[test]
    fn test_dispatch_covers_every_request_code() {
        for code in (1u8..=20).chain([200]) {
            if code == 2 {
                continue;
            }
            let packet_type = PacketType::from(code);
            let request = Request::new_from_type(packet_type).unwrap();
            assert_eq!(request.packet_type(), packet_type);
        }
        for code in [2u8, 101, 102, 103, 104, 105, 201] {
            let packet_type = PacketType::from(code);
            let response = Response::new_from_type(packet_type).unwrap();
            assert_eq!(response.packet_type(), packet_type);
        }
    }

    #[test]
    fn test_raw_packet_round_trip() {
        let close = ClosePacket::new(&b"h1"[..]);
        let bytes = close.to_bytes(5);

        let raw = RawPacket::decode(&bytes[..]).unwrap();
        assert_eq!(raw.packet_type, PacketType::Close);
        assert_eq!(raw.request_id, 5);
        assert_eq!(&raw.data[..], &[0, 0, 0, 2, b'h', b'1']);

        let (header, payload) = raw.marshal();
        let mut joined = header.to_vec();
        joined.extend_from_slice(&payload.unwrap());
        assert_eq!(joined, bytes);

        let request = raw.into_request().unwrap();
        assert_eq!(request.request, Request::Close(close));
    }

    #[test]
    fn test_raw_packet_reopens_body_without_copy() {
        let bytes = RenamePacket {
            old_path: "/old".into(),
            new_path: "/new".into(),
        }
        .to_bytes(3);

        let raw = RawPacket::decode(&bytes[..]).unwrap();
        let ptr = raw.data.as_ptr();
        let frame = raw.into_frame();
        assert_eq!(frame.body.bytes().as_ptr(), ptr);

        // A shared body is copied instead.
        let raw = RawPacket::decode(&bytes[..]).unwrap();
        let keep = raw.data.clone();
        let frame = raw.clone().into_frame();
        assert_ne!(frame.body.bytes().as_ptr(), keep.as_ptr());
        assert_eq!(frame.body.bytes(), &keep[..]);
    }

    #[test]
    fn test_raw_packet_into_response() {
        let handle = HandlePacket::new(&b"abc"[..]);
        let raw = RawPacket::decode(&handle.to_bytes(9)[..]).unwrap();
        let response = raw.into_response().unwrap();
        assert_eq!(response.request_id, 9);
        assert_eq!(response.response, Response::Handle(handle));
    }

    #[test]
    fn test_response_into_result() {
        let ok = ResponsePacket::new(1, StatusPacket::from(StatusCode::Ok));
        assert!(ok.into_result().is_ok());

        let eof = ResponsePacket::new(1, StatusPacket::from(StatusCode::Eof));
        assert_eq!(eof.into_result().unwrap_err(), StatusCode::Eof);
    }
}

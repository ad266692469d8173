//! SSH_FXP_EXTENDED and SSH_FXP_EXTENDED_REPLY.
//!
//! An extended request carries a name followed by a payload whose layout
//! depends on that name. Payload types are looked up in a process-wide
//! registry keyed by request name. Names without a registration decode to
//! [`RawExtendedData`], which keeps the bytes as they arrived.
//!
//! The OpenSSH extensions in [`super::openssh`] are registered up front;
//! additional ones can be added with [`register_extended_packet_type`].

use super::buffer::Buffer;
use super::error::Result;
use super::message::PacketType;
use super::packet::Packet;
use super::string::SshString;
use bytes::Bytes;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// The payload of an extended request or reply.
pub trait ExtendedData: fmt::Debug + Send + Sync + 'static {
    /// Number of bytes [`ExtendedData::marshal_into`] writes.
    fn marshal_size(&self) -> usize;

    /// Writes the payload.
    fn marshal_into(&self, buf: &mut Buffer);

    /// Reads the payload from the remaining bytes.
    fn unmarshal_from(&mut self, buf: &mut Buffer) -> Result<()>;

    /// Upcast for downcasting to the concrete payload type.
    fn as_any(&self) -> &dyn Any;

    /// Clones into a new box.
    fn clone_box(&self) -> Box<dyn ExtendedData>;
}

impl dyn ExtendedData {
    /// Returns the payload as `T` if that is its concrete type.
    pub fn downcast_ref<T: ExtendedData>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Encodes the payload on its own.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = Buffer::with_capacity(self.marshal_size());
        self.marshal_into(&mut buf);
        buf.into_bytes()
    }
}

impl Clone for Box<dyn ExtendedData> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Payload bytes of an extension with no registered type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExtendedData(pub Bytes);

impl ExtendedData for RawExtendedData {
    fn marshal_size(&self) -> usize {
        self.0.len()
    }

    fn marshal_into(&self, buf: &mut Buffer) {
        buf.append_raw(&self.0);
    }

    fn unmarshal_from(&mut self, buf: &mut Buffer) -> Result<()> {
        self.0 = buf.consume_remaining();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn ExtendedData> {
        Box::new(self.clone())
    }
}

/// Builds an empty payload for a registered extension name.
pub type ExtendedDataConstructor = fn() -> Box<dyn ExtendedData>;

static REGISTRY: LazyLock<RwLock<HashMap<String, ExtendedDataConstructor>>> =
    LazyLock::new(|| RwLock::new(super::openssh::builtin_extensions().into_iter().collect()));

/// Registers the payload type decoded for `extended_request`.
///
/// Replaces any previous registration for the same name.
pub fn register_extended_packet_type(
    extended_request: impl Into<String>,
    constructor: ExtendedDataConstructor,
) {
    let name = extended_request.into();
    debug!(extension = %name, "registering extended packet type");
    REGISTRY.write().insert(name, constructor);
}

/// Builds an empty payload for `extended_request`, if one is registered.
///
/// Names that are not valid UTF-8 never match a registration.
pub fn new_extended_data(extended_request: impl AsRef<[u8]>) -> Option<Box<dyn ExtendedData>> {
    let name = std::str::from_utf8(extended_request.as_ref()).ok()?;
    REGISTRY.read().get(name).map(|constructor| constructor())
}

fn new_extended_data_or_raw(extended_request: &SshString) -> Box<dyn ExtendedData> {
    new_extended_data(extended_request).unwrap_or_else(|| {
        debug!(
            extension = %extended_request,
            "no registered extended packet type, keeping raw payload"
        );
        Box::new(RawExtendedData::default())
    })
}

/// SSH_FXP_EXTENDED
#[derive(Debug, Clone)]
pub struct ExtendedPacket {
    /// Extension name
    pub extended_request: SshString,
    /// Extension payload
    pub data: Box<dyn ExtendedData>,
}

impl ExtendedPacket {
    /// Creates an extended request.
    pub fn new(extended_request: impl Into<SshString>, data: impl ExtendedData) -> Self {
        Self {
            extended_request: extended_request.into(),
            data: Box::new(data),
        }
    }

    /// Returns the payload as `T` if that is its concrete type.
    pub fn data_as<T: ExtendedData>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }
}

impl Default for ExtendedPacket {
    fn default() -> Self {
        Self {
            extended_request: SshString::new(),
            data: Box::new(RawExtendedData::default()),
        }
    }
}

impl PartialEq for ExtendedPacket {
    fn eq(&self, other: &Self) -> bool {
        self.extended_request == other.extended_request
            && self.data.to_bytes() == other.data.to_bytes()
    }
}

impl Packet for ExtendedPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Extended
    }

    fn marshal_size(&self) -> usize {
        4 + self.extended_request.len() + self.data.marshal_size()
    }

    fn marshal_body(&self, buf: &mut Buffer) {
        buf.append_string(&self.extended_request);
        self.data.marshal_into(buf);
    }

    fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
        self.extended_request = buf.consume_string()?;
        let mut data = new_extended_data_or_raw(&self.extended_request);
        data.unmarshal_from(buf)?;
        self.data = data;
        Ok(())
    }
}

/// SSH_FXP_EXTENDED_REPLY
///
/// The reply does not name its extension, so the payload decodes as
/// [`RawExtendedData`]. Use [`ExtendedReplyPacket::decode_as`] once the
/// matching request is known.
#[derive(Debug, Clone)]
pub struct ExtendedReplyPacket {
    /// Reply payload
    pub data: Box<dyn ExtendedData>,
}

impl ExtendedReplyPacket {
    /// Creates a reply.
    pub fn new(data: impl ExtendedData) -> Self {
        Self {
            data: Box::new(data),
        }
    }

    /// Re-decodes the payload as `T`.
    pub fn decode_as<T: ExtendedData + Default>(&self) -> Result<T> {
        let mut buf = Buffer::from(&self.data.to_bytes()[..]);
        let mut typed = T::default();
        typed.unmarshal_from(&mut buf)?;
        Ok(typed)
    }
}

impl Default for ExtendedReplyPacket {
    fn default() -> Self {
        Self {
            data: Box::new(RawExtendedData::default()),
        }
    }
}

impl PartialEq for ExtendedReplyPacket {
    fn eq(&self, other: &Self) -> bool {
        self.data.to_bytes() == other.data.to_bytes()
    }
}

impl Packet for ExtendedReplyPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::ExtendedReply
    }

    fn marshal_size(&self) -> usize {
        self.data.marshal_size()
    }

    fn marshal_body(&self, buf: &mut Buffer) {
        self.data.marshal_into(buf);
    }

    fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
        let mut data = RawExtendedData::default();
        data.unmarshal_from(buf)?;
        self.data = Box::new(data);
        Ok(())
    }
}

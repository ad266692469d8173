//! Server-to-client packets.

use super::attrs::Attributes;
use super::buffer::{wire_len, Buffer};
use super::error::Result;
use super::message::{PacketType, SFTP_VERSION};
use super::packet::Packet;
use super::string::SshString;
use bytes::Bytes;

/// An extension advertised in INIT or VERSION.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ExtensionPair {
    /// Extension name, e.g. `posix-rename@openssh.com`
    pub name: SshString,
    /// Extension data, usually a version string
    pub data: SshString,
}

impl ExtensionPair {
    /// Creates an extension pair.
    pub fn new(name: impl Into<SshString>, data: impl Into<SshString>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub(crate) fn marshal_size(&self) -> usize {
        4 + self.name.len() + 4 + self.data.len()
    }

    pub(crate) fn marshal_into(&self, buf: &mut Buffer) {
        buf.append_string(&self.name);
        buf.append_string(&self.data);
    }

    pub(crate) fn unmarshal_from(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            name: buf.consume_string()?,
            data: buf.consume_string()?,
        })
    }

    /// Reads pairs until the buffer is exhausted.
    pub(crate) fn unmarshal_all(buf: &mut Buffer) -> Result<Vec<Self>> {
        let mut extensions = Vec::new();
        while !buf.is_empty() {
            extensions.push(Self::unmarshal_from(buf)?);
        }
        Ok(extensions)
    }
}

/// SSH_FXP_VERSION: the negotiated version and the server's extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPacket {
    /// Protocol version the server will speak
    pub version: u32,
    /// Extension name/data pairs
    pub extensions: Vec<ExtensionPair>,
}

impl Default for VersionPacket {
    fn default() -> Self {
        Self {
            version: SFTP_VERSION,
            extensions: Vec::new(),
        }
    }
}

impl VersionPacket {
    /// Looks up an advertised extension by name.
    pub fn extension(&self, name: &str) -> Option<&ExtensionPair> {
        self.extensions.iter().find(|ext| ext.name == name)
    }
}

impl Packet for VersionPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Version
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

/// SSH_FXP_HANDLE
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlePacket {
    /// Opaque handle, at most 256 bytes in practice
    pub handle: Bytes,
}

impl HandlePacket {
    /// Creates a handle response.
    pub fn new(handle: impl Into<Bytes>) -> Self {
        Self {
            handle: handle.into(),
        }
    }
}

impl Packet for HandlePacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Handle
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

/// SSH_FXP_DATA
///
/// Like WRITE, the data travels as a separate payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataPacket {
    /// Bytes read
    pub data: Bytes,
}

impl DataPacket {
    /// Creates a data response.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl Packet for DataPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Data
    }

    fn marshal_size(&self) -> usize {
        4
    }

    fn marshal_body(&self, buf: &mut Buffer) {
        buf.append_u32(wire_len(self.data.len()));
    }

    fn payload(&self) -> Option<Bytes> {
        let len = wire_len(self.data.len()) as usize;
        (len > 0).then(|| self.data.slice(..len))
    }

    fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
        self.data = buf.consume_byte_slice()?;
        Ok(())
    }
}

/// One entry of a NAME response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameEntry {
    /// File name relative to the directory (or the resolved path for REALPATH)
    pub filename: SshString,
    /// `ls -l` style line; clients should not parse it
    pub longname: SshString,
    /// Attributes, possibly empty
    pub attrs: Attributes,
}

impl NameEntry {
    /// Creates an entry.
    pub fn new(
        filename: impl Into<SshString>,
        longname: impl Into<SshString>,
        attrs: Attributes,
    ) -> Self {
        Self {
            filename: filename.into(),
            longname: longname.into(),
            attrs,
        }
    }

    fn marshal_size(&self) -> usize {
        4 + self.filename.len() + 4 + self.longname.len() + self.attrs.marshal_size()
    }

    fn marshal_into(&self, buf: &mut Buffer) {
        buf.append_string(&self.filename);
        buf.append_string(&self.longname);
        self.attrs.marshal_into(buf);
    }

    fn unmarshal_from(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            filename: buf.consume_string()?,
            longname: buf.consume_string()?,
            attrs: Attributes::unmarshal_from(buf)?,
        })
    }
}

/// Smallest possible entry: two empty strings and zero attribute flags.
const MIN_NAME_ENTRY_LEN: usize = 12;

/// SSH_FXP_NAME
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamePacket {
    /// Entries, in the order received
    pub entries: Vec<NameEntry>,
}

impl Packet for NamePacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Name
    }

    fn marshal_size(&self) -> usize {
        4 + self
            .entries
            .iter()
            .map(NameEntry::marshal_size)
            .sum::<usize>()
    }

    fn marshal_body(&self, buf: &mut Buffer) {
        buf.append_u32(wire_len(self.entries.len()));
        for entry in &self.entries {
            entry.marshal_into(buf);
        }
    }

    fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
        let count = buf.consume_u32()? as usize;
        let mut entries = Vec::with_capacity(count.min(buf.len() / MIN_NAME_ENTRY_LEN));
        for _ in 0..count {
            entries.push(NameEntry::unmarshal_from(buf)?);
        }
        self.entries = entries;
        Ok(())
    }
}

/// SSH_FXP_ATTRS
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrsPacket {
    /// Attributes of the requested file
    pub attrs: Attributes,
}

impl Packet for AttrsPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Attrs
    }

    fn marshal_size(&self) -> usize {
        self.attrs.marshal_size()
    }

    fn marshal_body(&self, buf: &mut Buffer) {
        self.attrs.marshal_into(buf);
    }

    fn unmarshal_body(&mut self, buf: &mut Buffer) -> Result<()> {
        self.attrs = Attributes::unmarshal_from(buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sftp::attrs::FileMode;
    use crate::sftp::error::Error;

    fn body_of<P: Packet>(packet: &P, request_id: u32) -> Buffer {
        let bytes = packet.to_bytes(request_id);
        let skip = if packet.packet_type().has_request_id() { 9 } else { 5 };
        Buffer::from(&bytes[skip..])
    }

    #[test]
    fn test_version_extension_lookup() {
        let version = VersionPacket {
            version: 3,
            extensions: vec![ExtensionPair::new("posix-rename@openssh.com", "1")],
        };
        let mut decoded = VersionPacket::default();
        decoded.unmarshal_body(&mut body_of(&version, 0)).unwrap();
        assert_eq!(decoded, version);
        assert_eq!(
            decoded.extension("posix-rename@openssh.com").and_then(|e| e.data.to_str()),
            Some("1")
        );
        assert!(decoded.extension("missing").is_none());
    }

    #[test]
    fn test_name_two_entries() {
        let mut attrs = Attributes::new();
        attrs.set_size(1234);
        attrs.set_permissions(FileMode::from(0o100644));

        let name = NamePacket {
            entries: vec![
                NameEntry::new("a.txt", "-rw-r--r-- 1 u g 1234 a.txt", attrs),
                NameEntry::new("b", "b", Attributes::new()),
            ],
        };
        let mut decoded = NamePacket::default();
        decoded.unmarshal_body(&mut body_of(&name, 4)).unwrap();
        assert_eq!(decoded, name);
        assert_eq!(decoded.entries[0].attrs.size(), 1234);
        assert_eq!(decoded.entries[1].attrs.flags(), 0);
    }

    #[test]
    fn test_name_hostile_count() {
        let mut buf = Buffer::new();
        buf.append_u32(u32::MAX);
        let mut decoded = NamePacket::default();
        assert!(matches!(
            decoded.unmarshal_body(&mut buf),
            Err(Error::ShortPacket)
        ));
    }

    #[test]
    fn test_data_payload() {
        let data = DataPacket::new(vec![1u8, 2, 3]);
        let (header, payload) = data.marshal(8);
        assert_eq!(
            &header[..],
            &[0, 0, 0, 12, 103, 0, 0, 0, 8, 0, 0, 0, 3]
        );
        assert_eq!(&payload.unwrap()[..], &[1, 2, 3]);

        let mut decoded = DataPacket::default();
        decoded.unmarshal_body(&mut body_of(&data, 8)).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_attrs_and_handle() {
        let mut attrs = Attributes::new();
        attrs.set_uid_gid(1000, 100);
        let packet = AttrsPacket { attrs };
        let mut decoded = AttrsPacket::default();
        decoded.unmarshal_body(&mut body_of(&packet, 1)).unwrap();
        assert_eq!(decoded, packet);

        let handle = HandlePacket::new(&b"42"[..]);
        let mut decoded = HandlePacket::default();
        decoded.unmarshal_body(&mut body_of(&handle, 1)).unwrap();
        assert_eq!(decoded, handle);
    }
}

//! Byte cursor used to marshal and unmarshal every SFTP packet.
//!
//! # Wire primitives
//!
//! ```text
//! byte      u8
//! boolean   u8, any non-zero value is true
//! uint32    big-endian
//! uint64    big-endian
//! string    uint32 length || byte[length]
//! ```
//!
//! A [`Buffer`] is consumed from the front and appended to at the back.
//! Consumed byte strings are returned as [`Bytes`] views that share the
//! buffer's allocation, so decoding a WRITE or DATA payload never copies it.
//! Use [`Buffer::consume_byte_slice_copy`] to get an owned copy instead.
//!
//! # Ownership
//!
//! - `Buffer::from(BytesMut)` takes ownership of the bytes without copying.
//! - `Buffer::from(&[u8])` copies the slice.
//! - [`Buffer::for_marshal`] starts a fresh buffer with four bytes reserved for
//!   the frame length, which [`Buffer::put_length`] fills in once the body is complete.

use super::error::{Error, Result};
use super::message::PacketType;
use super::string::SshString;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Bytes reserved at the front of a marshal buffer for the length prefix.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Converts a length to its u32 wire form, saturating above `u32::MAX`.
///
/// No valid frame can carry a field that large; callers that must reject it
/// check first, as `WritePacket::check_data_length` does.
pub(crate) fn wire_len(len: usize) -> u32 {
    debug_assert!(
        u32::try_from(len).is_ok(),
        "length {} does not fit a u32 length field",
        len
    );
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Growable, consumable byte sequence.
///
/// Not safe for concurrent use; a buffer represents one encode or decode in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    data: BytesMut,
}

impl Buffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
        }
    }

    /// Creates a buffer for marshaling a packet.
    ///
    /// The first four bytes are zeroed and reserved for the frame length;
    /// `size_hint` is the expected number of bytes that follow them.
    pub fn for_marshal(size_hint: usize) -> Self {
        let mut data = BytesMut::with_capacity(LENGTH_PREFIX_LEN + size_hint);
        data.put_u32(0);
        Self { data }
    }

    /// Number of unconsumed bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The unconsumed bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Converts the unconsumed bytes into an immutable [`Bytes`] without copying.
    pub fn into_bytes(self) -> Bytes {
        self.data.freeze()
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if self.data.len() < n {
            return Err(Error::ShortPacket);
        }
        Ok(())
    }

    /// Consumes a single byte.
    pub fn consume_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.data.get_u8())
    }

    /// Consumes a single byte as a boolean; any non-zero value is true.
    pub fn consume_bool(&mut self) -> Result<bool> {
        Ok(self.consume_u8()? != 0)
    }

    /// Consumes a big-endian u16.
    pub fn consume_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.data.get_u16())
    }

    /// Consumes a big-endian u32.
    pub fn consume_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.data.get_u32())
    }

    /// Consumes a big-endian u64.
    pub fn consume_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.data.get_u64())
    }

    /// Consumes `n` raw bytes as a view sharing this buffer's allocation.
    pub fn consume_raw(&mut self, n: usize) -> Result<Bytes> {
        self.ensure(n)?;
        Ok(self.data.split_to(n).freeze())
    }

    /// Consumes every remaining byte.
    pub fn consume_remaining(&mut self) -> Bytes {
        self.data.split().freeze()
    }

    /// Consumes a length-prefixed byte string without copying.
    ///
    /// Fails with [`Error::ShortPacket`] if the declared length exceeds the
    /// remaining bytes. On failure the length prefix has already been
    /// consumed and the buffer should be discarded.
    pub fn consume_byte_slice(&mut self) -> Result<Bytes> {
        let len = self.consume_u32()? as usize;
        self.consume_raw(len)
    }

    /// Consumes a length-prefixed byte string into `dst`, reusing its allocation.
    ///
    /// `dst` is cleared first. Its capacity is reused when large enough,
    /// otherwise it grows.
    pub fn consume_byte_slice_copy(&mut self, mut dst: Vec<u8>) -> Result<Vec<u8>> {
        let len = self.consume_u32()? as usize;
        self.ensure(len)?;
        dst.clear();
        dst.extend_from_slice(&self.data[..len]);
        self.data.advance(len);
        Ok(dst)
    }

    /// Consumes a length-prefixed string without copying or validating it.
    ///
    /// The bytes are kept exactly as received, invalid UTF-8 included.
    pub fn consume_string(&mut self) -> Result<SshString> {
        Ok(SshString::from(self.consume_byte_slice()?))
    }

    /// Appends a single byte.
    pub fn append_u8(&mut self, v: u8) {
        self.data.put_u8(v);
    }

    /// Appends a boolean as a single byte (1 or 0).
    pub fn append_bool(&mut self, v: bool) {
        self.data.put_u8(u8::from(v));
    }

    /// Appends a big-endian u16.
    pub fn append_u16(&mut self, v: u16) {
        self.data.put_u16(v);
    }

    /// Appends a big-endian u32.
    pub fn append_u32(&mut self, v: u32) {
        self.data.put_u32(v);
    }

    /// Appends a big-endian u64.
    pub fn append_u64(&mut self, v: u64) {
        self.data.put_u64(v);
    }

    /// Appends raw bytes with no length prefix.
    pub fn append_raw(&mut self, v: &[u8]) {
        self.data.put_slice(v);
    }

    /// Appends a length-prefixed byte string.
    ///
    /// The prefix and the bytes written always agree, so input longer than
    /// `u32::MAX` is cut at that length.
    pub fn append_byte_slice(&mut self, v: &[u8]) {
        let len = wire_len(v.len());
        self.data.put_u32(len);
        self.data.put_slice(&v[..len as usize]);
    }

    /// Appends a length-prefixed string: a `&str`, `String` or [`SshString`].
    pub fn append_string(&mut self, v: impl AsRef<[u8]>) {
        self.append_byte_slice(v.as_ref());
    }

    /// Overwrites the first four bytes with `n` in big-endian.
    ///
    /// A buffer shorter than four bytes is zero-extended first.
    pub fn put_length(&mut self, n: u32) {
        if self.data.len() < LENGTH_PREFIX_LEN {
            self.data.resize(LENGTH_PREFIX_LEN, 0);
        }
        self.data[..LENGTH_PREFIX_LEN].copy_from_slice(&n.to_be_bytes());
    }

    /// Writes the common packet header after the reserved length prefix.
    ///
    /// The request-id is omitted for INIT and VERSION.
    pub fn start_packet(&mut self, packet_type: PacketType, request_id: u32) {
        self.append_u8(packet_type.as_u8());
        if packet_type.has_request_id() {
            self.append_u32(request_id);
        }
    }

    /// Completes a packet started with [`Buffer::for_marshal`].
    ///
    /// Fills in the length prefix to cover this buffer and `payload_len`
    /// bytes that will be sent separately, and returns the header bytes.
    pub fn finish_packet(mut self, payload_len: usize) -> Bytes {
        let length = self.data.len().saturating_sub(LENGTH_PREFIX_LEN) + payload_len;
        self.put_length(wire_len(length));
        self.data.freeze()
    }
}

impl From<BytesMut> for Buffer {
    fn from(data: BytesMut) -> Self {
        Self { data }
    }
}

impl From<&[u8]> for Buffer {
    fn from(data: &[u8]) -> Self {
        Self {
            data: BytesMut::from(data),
        }
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_integers() {
        let mut buf = Buffer::from(
            &[
                0x01, // u8
                0x02, 0x03, // u16
                0x04, 0x05, 0x06, 0x07, // u32
                0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, // u64
            ][..],
        );

        assert_eq!(buf.consume_u8().unwrap(), 0x01);
        assert_eq!(buf.consume_u16().unwrap(), 0x0203);
        assert_eq!(buf.consume_u32().unwrap(), 0x04050607);
        assert_eq!(buf.consume_u64().unwrap(), 0x08090a0b0c0d0e0f);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_consume_bool() {
        let mut buf = Buffer::from(&[0x00, 0x01, 0x7f][..]);
        assert!(!buf.consume_bool().unwrap());
        assert!(buf.consume_bool().unwrap());
        assert!(buf.consume_bool().unwrap());
        assert!(matches!(buf.consume_bool(), Err(Error::ShortPacket)));
    }

    #[test]
    fn test_short_reads() {
        let mut buf = Buffer::from(&[0x00, 0x00, 0x00][..]);
        assert!(matches!(buf.consume_u32(), Err(Error::ShortPacket)));
        assert!(matches!(buf.consume_u64(), Err(Error::ShortPacket)));
        // A failed fixed-width consume does not advance.
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.consume_u16().unwrap(), 0);
    }

    #[test]
    fn test_byte_slice_declared_length_too_long() {
        // Declares 0xffffffff bytes but carries two.
        let mut buf = Buffer::from(&[0xff, 0xff, 0xff, 0xff, b'h', b'i'][..]);
        assert!(matches!(buf.consume_byte_slice(), Err(Error::ShortPacket)));
    }

    #[test]
    fn test_byte_slice_is_zero_copy() {
        let mut buf = Buffer::from(&[0, 0, 0, 3, b'a', b'b', b'c', 0xee][..]);
        let base = buf.bytes().as_ptr();
        let view = buf.consume_byte_slice().unwrap();
        assert_eq!(&view[..], b"abc");
        assert_eq!(view.as_ptr(), base.wrapping_add(4));
        assert_eq!(buf.bytes(), &[0xee]);
    }

    #[test]
    fn test_byte_slice_copy_reuses_destination() {
        let mut buf = Buffer::from(&[0, 0, 0, 2, b'o', b'k'][..]);
        let dst = Vec::with_capacity(64);
        let ptr = dst.as_ptr();
        let out = buf.consume_byte_slice_copy(dst).unwrap();
        assert_eq!(out, b"ok");
        assert_eq!(out.as_ptr(), ptr);

        let mut buf = Buffer::from(&[0, 0, 0, 3, b'b', b'i', b'g'][..]);
        let out = buf.consume_byte_slice_copy(vec![9; 1]).unwrap();
        assert_eq!(out, b"big");
    }

    #[test]
    fn test_consume_string_passes_invalid_utf8() {
        let wire = [0, 0, 0, 4, b'c', b'a', b'f', 0xe9];
        let mut buf = Buffer::from(&wire[..]);
        let s = buf.consume_string().unwrap();
        assert_eq!(s.as_bytes(), b"caf\xe9");
        assert!(buf.is_empty());

        let mut out = Buffer::new();
        out.append_string(&s);
        assert_eq!(out.bytes(), &wire[..]);
    }

    #[test]
    fn test_wire_len() {
        assert_eq!(wire_len(0), 0);
        assert_eq!(wire_len(u32::MAX as usize), u32::MAX);
    }

    #[test]
    fn test_append_encoding() {
        let mut buf = Buffer::new();
        buf.append_u8(0xab);
        buf.append_bool(true);
        buf.append_u16(0x0102);
        buf.append_u32(0x03040506);
        buf.append_u64(0x0708090a0b0c0d0e);
        buf.append_string("hi");
        buf.append_byte_slice(&[]);

        assert_eq!(
            buf.bytes(),
            &[
                0xab, 0x01, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b,
                0x0c, 0x0d, 0x0e, 0x00, 0x00, 0x00, 0x02, b'h', b'i', 0x00, 0x00, 0x00, 0x00,
            ]
        );
    }

    #[test]
    fn test_put_length_zero_extends() {
        let mut buf = Buffer::new();
        buf.append_u8(0xaa);
        buf.put_length(0x01020304);
        assert_eq!(buf.bytes(), &[0x01, 0x02, 0x03, 0x04]);

        let mut buf = Buffer::for_marshal(8);
        buf.append_u32(7);
        buf.put_length(4);
        assert_eq!(buf.bytes(), &[0, 0, 0, 4, 0, 0, 0, 7]);
    }

    #[test]
    fn test_start_and_finish_packet() {
        let mut buf = Buffer::for_marshal(5);
        buf.start_packet(PacketType::Close, 7);
        buf.append_string("h");
        let header = buf.finish_packet(0);
        assert_eq!(
            &header[..],
            &[0, 0, 0, 10, 4, 0, 0, 0, 7, 0, 0, 0, 1, b'h']
        );

        let mut buf = Buffer::for_marshal(4);
        buf.start_packet(PacketType::Init, 99);
        buf.append_u32(3);
        let header = buf.finish_packet(0);
        assert_eq!(&header[..], &[0, 0, 0, 5, 1, 0, 0, 0, 3]);
    }

    #[test]
    fn test_finish_packet_counts_payload() {
        let mut buf = Buffer::for_marshal(0);
        buf.start_packet(PacketType::Data, 1);
        buf.append_u32(100);
        let header = buf.finish_packet(100);
        assert_eq!(&header[..4], &(1u32 + 4 + 4 + 100).to_be_bytes());
    }
}

//! The SSH `string` wire type.
//!
//! SFTP v3 strings are arbitrary byte sequences: unix file names need not be
//! UTF-8, and a server that rewrote them would operate on the wrong path.
//! [`SshString`] keeps the exact bytes received and only interprets them as
//! text when asked.
//!
//! ```rust
//! use filexfer_proto::sftp::SshString;
//!
//! let name = SshString::from(&b"caf\xe9"[..]);
//! assert_eq!(name.as_bytes(), b"caf\xe9");
//! assert_eq!(name.to_str(), None);
//! assert_eq!(name.to_string(), "caf\u{fffd}");
//! ```

use bytes::Bytes;
use std::borrow::Cow;
use std::fmt;

/// A length-prefixed wire string, kept byte for byte.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SshString(Bytes);

impl SshString {
    /// Creates an empty string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a static string without copying it.
    pub const fn from_static(s: &'static str) -> Self {
        Self(Bytes::from_static(s.as_bytes()))
    }

    /// The exact bytes, as received or as they will be sent.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Unwraps the underlying buffer.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Byte length, excluding the length prefix.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the zero-length string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the string as `&str` if it is valid UTF-8.
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Text for display and logging; invalid sequences become U+FFFD.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Display for SshString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl fmt::Debug for SshString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_str() {
            Some(s) => fmt::Debug::fmt(s, f),
            None => fmt::Debug::fmt(&self.0, f),
        }
    }
}

impl AsRef<[u8]> for SshString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for SshString {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for SshString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<&[u8]> for SshString {
    fn from(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }
}

impl From<String> for SshString {
    fn from(s: String) -> Self {
        Self(Bytes::from(s))
    }
}

impl From<&String> for SshString {
    fn from(s: &String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<&str> for SshString {
    fn from(s: &str) -> Self {
        Self(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<SshString> for Bytes {
    fn from(s: SshString) -> Self {
        s.0
    }
}

impl PartialEq<str> for SshString {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for SshString {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<String> for SshString {
    fn eq(&self, other: &String) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<[u8]> for SshString {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<SshString> for str {
    fn eq(&self, other: &SshString) -> bool {
        other == self
    }
}

impl PartialEq<SshString> for &str {
    fn eq(&self, other: &SshString) -> bool {
        other == *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_utf8_is_kept() {
        let s = SshString::from(vec![b'a', 0xff, b'b']);
        assert_eq!(s.len(), 3);
        assert_eq!(s.as_bytes(), &[b'a', 0xff, b'b']);
        assert!(s.to_str().is_none());
        assert_eq!(s.to_string_lossy(), "a\u{fffd}b");
        assert_ne!(s, "a\u{fffd}b");
    }

    #[test]
    fn test_text_comparisons() {
        let s = SshString::from("/etc/hosts");
        assert_eq!(s, "/etc/hosts");
        assert_eq!("/etc/hosts", s);
        assert_eq!(s, String::from("/etc/hosts"));
        assert_eq!(s.to_str(), Some("/etc/hosts"));
        assert_eq!(SshString::from_static("/etc/hosts"), s);
    }

    #[test]
    fn test_debug_output() {
        assert_eq!(format!("{:?}", SshString::from("a\"b")), "\"a\\\"b\"");
        assert_eq!(format!("{:?}", SshString::from(&b"caf\xe9"[..])), "b\"caf\\xe9\"");
    }

    #[test]
    fn test_bytes_conversion_is_zero_copy() {
        let bytes = Bytes::from_static(b"handle");
        let ptr = bytes.as_ptr();
        let s = SshString::from(bytes);
        assert_eq!(Bytes::from(s).as_ptr(), ptr);
    }
}

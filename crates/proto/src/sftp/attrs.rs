//! File attributes (ATTRS) and file mode bits.
//!
//! # Wire format
//!
//! ```text
//! uint32    flags
//! uint64    size            present only if flag SIZE
//! uint32    uid             present only if flag UIDGID
//! uint32    gid             present only if flag UIDGID
//! uint32    permissions     present only if flag PERMISSIONS
//! uint32    atime           present only if flag ACMODTIME
//! uint32    mtime           present only if flag ACMODTIME
//! uint32    extended_count  present only if flag EXTENDED
//! string    extended_type   repeated extended_count times
//! string    extended_data
//! ```
//!
//! Every optional field is a (flag bit, value) pair. Setting a field sets its
//! bit, clearing it zeroes both, and reading an unset field returns zero, so the
//! flags that go on the wire always describe exactly the fields that follow.
//!
//! # Example
//!
//! ```rust
//! use filexfer_proto::sftp::{Attributes, Buffer, FileMode};
//!
//! let mut attrs = Attributes::new();
//! attrs.set_size(1024);
//! attrs.set_permissions(FileMode(0o100644));
//!
//! let mut buf = Buffer::new();
//! attrs.marshal_into(&mut buf);
//! assert_eq!(buf.len(), attrs.marshal_size());
//!
//! let parsed = Attributes::unmarshal_from(&mut buf).unwrap();
//! assert_eq!(parsed, attrs);
//! ```

use super::buffer::{wire_len, Buffer};
use super::error::Result;
use super::string::SshString;
use bytes::Bytes;
use std::fmt;

/// File attribute flags (SSH_FILEXFER_ATTR_*).
#[derive(Debug, Clone, Copy)]
pub struct AttrFlags;

impl AttrFlags {
    /// SSH_FILEXFER_ATTR_SIZE
    pub const SIZE: u32 = 0x00000001;
    /// SSH_FILEXFER_ATTR_UIDGID
    pub const UIDGID: u32 = 0x00000002;
    /// SSH_FILEXFER_ATTR_PERMISSIONS
    pub const PERMISSIONS: u32 = 0x00000004;
    /// SSH_FILEXFER_ATTR_ACMODTIME
    pub const ACMODTIME: u32 = 0x00000008;
    /// SSH_FILEXFER_ATTR_EXTENDED
    pub const EXTENDED: u32 = 0x80000000;
}

/// File type encoded in the upper bits of a [`FileMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Regular file
    Regular,
    /// Directory
    Directory,
    /// Symbolic link
    Symlink,
    /// Named pipe (FIFO)
    NamedPipe,
    /// Character device
    CharDevice,
    /// Block device
    BlockDevice,
    /// Unix domain socket
    Socket,
    /// No type bits, or a combination POSIX does not define
    Unknown,
}

/// File mode: POSIX `st_mode` permission and file type bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FileMode(pub u32);

impl FileMode {
    /// Owner read
    pub const USER_READ: u32 = 0o400;
    /// Owner write
    pub const USER_WRITE: u32 = 0o200;
    /// Owner execute
    pub const USER_EXEC: u32 = 0o100;
    /// Group read
    pub const GROUP_READ: u32 = 0o040;
    /// Group write
    pub const GROUP_WRITE: u32 = 0o020;
    /// Group execute
    pub const GROUP_EXEC: u32 = 0o010;
    /// Others read
    pub const OTHER_READ: u32 = 0o004;
    /// Others write
    pub const OTHER_WRITE: u32 = 0o002;
    /// Others execute
    pub const OTHER_EXEC: u32 = 0o001;

    /// Set-user-ID on execution
    pub const SETUID: u32 = 0o4000;
    /// Set-group-ID on execution
    pub const SETGID: u32 = 0o2000;
    /// Sticky bit
    pub const STICKY: u32 = 0o1000;

    /// rwx bits for owner, group and others
    pub const PERM_MASK: u32 = 0o777;
    /// Permission bits including setuid, setgid and sticky
    pub const MODE_MASK: u32 = 0o7777;

    /// S_IFMT
    pub const TYPE_MASK: u32 = 0o170000;
    /// S_IFIFO
    pub const TYPE_FIFO: u32 = 0o010000;
    /// S_IFCHR
    pub const TYPE_CHAR_DEVICE: u32 = 0o020000;
    /// S_IFDIR
    pub const TYPE_DIR: u32 = 0o040000;
    /// S_IFBLK
    pub const TYPE_BLOCK_DEVICE: u32 = 0o060000;
    /// S_IFREG
    pub const TYPE_REGULAR: u32 = 0o100000;
    /// S_IFLNK
    pub const TYPE_SYMLINK: u32 = 0o120000;
    /// S_IFSOCK
    pub const TYPE_SOCKET: u32 = 0o140000;

    /// Default file permissions (0644 = rw-r--r--)
    pub const DEFAULT_FILE: u32 = 0o644;
    /// Default directory permissions (0755 = rwxr-xr-x)
    pub const DEFAULT_DIR: u32 = 0o755;

    /// Builds a mode from a file type and permission bits.
    pub fn new(file_type: FileType, perm: u32) -> Self {
        let type_bits = match file_type {
            FileType::Regular => Self::TYPE_REGULAR,
            FileType::Directory => Self::TYPE_DIR,
            FileType::Symlink => Self::TYPE_SYMLINK,
            FileType::NamedPipe => Self::TYPE_FIFO,
            FileType::CharDevice => Self::TYPE_CHAR_DEVICE,
            FileType::BlockDevice => Self::TYPE_BLOCK_DEVICE,
            FileType::Socket => Self::TYPE_SOCKET,
            FileType::Unknown => 0,
        };
        Self(type_bits | (perm & Self::MODE_MASK))
    }

    /// Returns the file type.
    pub fn file_type(self) -> FileType {
        match self.0 & Self::TYPE_MASK {
            Self::TYPE_REGULAR => FileType::Regular,
            Self::TYPE_DIR => FileType::Directory,
            Self::TYPE_SYMLINK => FileType::Symlink,
            Self::TYPE_FIFO => FileType::NamedPipe,
            Self::TYPE_CHAR_DEVICE => FileType::CharDevice,
            Self::TYPE_BLOCK_DEVICE => FileType::BlockDevice,
            Self::TYPE_SOCKET => FileType::Socket,
            _ => FileType::Unknown,
        }
    }

    /// Returns the rwx permission bits.
    pub fn perm(self) -> u32 {
        self.0 & Self::PERM_MASK
    }

    /// Returns true for directories.
    pub fn is_dir(self) -> bool {
        self.file_type() == FileType::Directory
    }

    /// Returns true for regular files.
    pub fn is_regular(self) -> bool {
        self.file_type() == FileType::Regular
    }

    /// Returns true for symbolic links.
    pub fn is_symlink(self) -> bool {
        self.file_type() == FileType::Symlink
    }
}

impl From<u32> for FileMode {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Renders the mode the way `ls -l` does, e.g. `drwxr-xr-x`.
impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_char = match self.file_type() {
            FileType::Regular | FileType::Unknown => '-',
            FileType::Directory => 'd',
            FileType::Symlink => 'l',
            FileType::NamedPipe => 'p',
            FileType::CharDevice => 'c',
            FileType::BlockDevice => 'b',
            FileType::Socket => 's',
        };

        let m = self.0;
        let bit = |mask: u32, c: char| if m & mask != 0 { c } else { '-' };
        let special = |exec: u32, flag: u32, set: char, unset: char| {
            match (m & exec != 0, m & flag != 0) {
                (true, true) => set,
                (false, true) => unset,
                (true, false) => 'x',
                (false, false) => '-',
            }
        };

        let chars = [
            type_char,
            bit(Self::USER_READ, 'r'),
            bit(Self::USER_WRITE, 'w'),
            special(Self::USER_EXEC, Self::SETUID, 's', 'S'),
            bit(Self::GROUP_READ, 'r'),
            bit(Self::GROUP_WRITE, 'w'),
            special(Self::GROUP_EXEC, Self::SETGID, 's', 'S'),
            bit(Self::OTHER_READ, 'r'),
            bit(Self::OTHER_WRITE, 'w'),
            special(Self::OTHER_EXEC, Self::STICKY, 't', 'T'),
        ];
        for c in chars {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// A vendor-defined (type, data) pair carried under the EXTENDED flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedAttribute {
    /// Extension type, conventionally `name@domain`
    pub ext_type: SshString,
    /// Opaque extension data
    pub data: Bytes,
}

impl ExtendedAttribute {
    /// Creates an extended attribute.
    pub fn new(ext_type: impl Into<SshString>, data: impl Into<Bytes>) -> Self {
        Self {
            ext_type: ext_type.into(),
            data: data.into(),
        }
    }

    fn marshal_size(&self) -> usize {
        4 + self.ext_type.len() + 4 + self.data.len()
    }
}

/// File attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    flags: u32,
    size: u64,
    uid: u32,
    gid: u32,
    permissions: FileMode,
    atime: u32,
    mtime: u32,
    extended: Vec<ExtendedAttribute>,
}

impl Attributes {
    /// Creates empty attributes (flags = 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the flag word.
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Returns true if the SIZE flag is set.
    pub fn has_size(&self) -> bool {
        self.flags & AttrFlags::SIZE != 0
    }

    /// Returns the size, or 0 if unset.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Sets the size and the SIZE flag.
    pub fn set_size(&mut self, size: u64) {
        self.flags |= AttrFlags::SIZE;
        self.size = size;
    }

    /// Clears the size and the SIZE flag.
    pub fn clear_size(&mut self) {
        self.flags &= !AttrFlags::SIZE;
        self.size = 0;
    }

    /// Returns true if the UIDGID flag is set.
    pub fn has_uid_gid(&self) -> bool {
        self.flags & AttrFlags::UIDGID != 0
    }

    /// Returns `(uid, gid)`, or zeros if unset.
    pub fn uid_gid(&self) -> (u32, u32) {
        (self.uid, self.gid)
    }

    /// Sets the owner and the UIDGID flag.
    pub fn set_uid_gid(&mut self, uid: u32, gid: u32) {
        self.flags |= AttrFlags::UIDGID;
        self.uid = uid;
        self.gid = gid;
    }

    /// Clears the owner and the UIDGID flag.
    pub fn clear_uid_gid(&mut self) {
        self.flags &= !AttrFlags::UIDGID;
        self.uid = 0;
        self.gid = 0;
    }

    /// Returns true if the PERMISSIONS flag is set.
    pub fn has_permissions(&self) -> bool {
        self.flags & AttrFlags::PERMISSIONS != 0
    }

    /// Returns the mode, or 0 if unset.
    pub fn permissions(&self) -> FileMode {
        self.permissions
    }

    /// Sets the mode and the PERMISSIONS flag.
    pub fn set_permissions(&mut self, permissions: FileMode) {
        self.flags |= AttrFlags::PERMISSIONS;
        self.permissions = permissions;
    }

    /// Clears the mode and the PERMISSIONS flag.
    pub fn clear_permissions(&mut self) {
        self.flags &= !AttrFlags::PERMISSIONS;
        self.permissions = FileMode::default();
    }

    /// Returns true if the ACMODTIME flag is set.
    pub fn has_acmod_time(&self) -> bool {
        self.flags & AttrFlags::ACMODTIME != 0
    }

    /// Returns `(atime, mtime)` in seconds since the epoch, or zeros if unset.
    pub fn acmod_time(&self) -> (u32, u32) {
        (self.atime, self.mtime)
    }

    /// Sets access and modification times and the ACMODTIME flag.
    pub fn set_acmod_time(&mut self, atime: u32, mtime: u32) {
        self.flags |= AttrFlags::ACMODTIME;
        self.atime = atime;
        self.mtime = mtime;
    }

    /// Clears both times and the ACMODTIME flag.
    pub fn clear_acmod_time(&mut self) {
        self.flags &= !AttrFlags::ACMODTIME;
        self.atime = 0;
        self.mtime = 0;
    }

    /// Returns true if the EXTENDED flag is set.
    pub fn has_extended(&self) -> bool {
        self.flags & AttrFlags::EXTENDED != 0
    }

    /// Returns the extended attributes, empty if unset.
    pub fn extended(&self) -> &[ExtendedAttribute] {
        &self.extended
    }

    /// Sets the extended attributes and the EXTENDED flag.
    pub fn set_extended(&mut self, extended: Vec<ExtendedAttribute>) {
        self.flags |= AttrFlags::EXTENDED;
        self.extended = extended;
    }

    /// Clears the extended attributes and the EXTENDED flag.
    pub fn clear_extended(&mut self) {
        self.flags &= !AttrFlags::EXTENDED;
        self.extended.clear();
    }

    /// Exact number of bytes [`Attributes::marshal_into`] will write.
    pub fn marshal_size(&self) -> usize {
        let mut size = 4;
        if self.has_size() {
            size += 8;
        }
        if self.has_uid_gid() {
            size += 8;
        }
        if self.has_permissions() {
            size += 4;
        }
        if self.has_acmod_time() {
            size += 8;
        }
        if self.has_extended() {
            size += 4;
            size += self
                .extended
                .iter()
                .map(ExtendedAttribute::marshal_size)
                .sum::<usize>();
        }
        size
    }

    /// Writes the flag word followed by every present field.
    pub fn marshal_into(&self, buf: &mut Buffer) {
        buf.append_u32(self.flags);

        if self.has_size() {
            buf.append_u64(self.size);
        }
        if self.has_uid_gid() {
            buf.append_u32(self.uid);
            buf.append_u32(self.gid);
        }
        if self.has_permissions() {
            buf.append_u32(self.permissions.0);
        }
        if self.has_acmod_time() {
            buf.append_u32(self.atime);
            buf.append_u32(self.mtime);
        }
        if self.has_extended() {
            buf.append_u32(wire_len(self.extended.len()));
            for ext in &self.extended {
                buf.append_string(&ext.ext_type);
                buf.append_byte_slice(&ext.data);
            }
        }
    }

    /// Reads a flag word and exactly the fields it announces.
    pub fn unmarshal_from(buf: &mut Buffer) -> Result<Self> {
        let flags = buf.consume_u32()?;
        Self::unmarshal_by_flags(flags, buf)
    }

    /// Reads the fields announced by an already-consumed flag word.
    pub fn unmarshal_by_flags(flags: u32, buf: &mut Buffer) -> Result<Self> {
        let mut attrs = Self {
            flags,
            ..Self::default()
        };
        if flags == 0 {
            return Ok(attrs);
        }

        if flags & AttrFlags::SIZE != 0 {
            attrs.size = buf.consume_u64()?;
        }
        if flags & AttrFlags::UIDGID != 0 {
            attrs.uid = buf.consume_u32()?;
            attrs.gid = buf.consume_u32()?;
        }
        if flags & AttrFlags::PERMISSIONS != 0 {
            attrs.permissions = FileMode(buf.consume_u32()?);
        }
        if flags & AttrFlags::ACMODTIME != 0 {
            attrs.atime = buf.consume_u32()?;
            attrs.mtime = buf.consume_u32()?;
        }
        if flags & AttrFlags::EXTENDED != 0 {
            let count = buf.consume_u32()? as usize;
            // Each pair needs at least eight bytes; don't let a hostile count
            // drive the allocation.
            let mut extended = Vec::with_capacity(count.min(buf.len() / 8));
            for _ in 0..count {
                let ext_type = buf.consume_string()?;
                let data = buf.consume_byte_slice()?;
                extended.push(ExtendedAttribute { ext_type, data });
            }
            attrs.extended = extended;
        }

        Ok(attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sftp::error::Error;

    fn encode(attrs: &Attributes) -> Vec<u8> {
        let mut buf = Buffer::new();
        attrs.marshal_into(&mut buf);
        buf.bytes().to_vec()
    }

    #[test]
    fn test_size_and_permissions_encoding() {
        let mut attrs = Attributes::new();
        attrs.set_size(0x123456789ABCDEF0);
        attrs.set_permissions(FileMode(0x87654321));

        assert_eq!(
            encode(&attrs),
            vec![
                0x00, 0x00, 0x00, 0x05, // flags
                0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, // size
                0x87, 0x65, 0x43, 0x21, // permissions
            ]
        );
    }

    #[test]
    fn test_single_flag_encodings() {
        let mut attrs = Attributes::new();
        attrs.set_size(1);
        assert_eq!(encode(&attrs), vec![0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1]);

        let mut attrs = Attributes::new();
        attrs.set_uid_gid(1000, 100);
        assert_eq!(encode(&attrs), vec![0, 0, 0, 2, 0, 0, 3, 0xe8, 0, 0, 0, 100]);

        let mut attrs = Attributes::new();
        attrs.set_permissions(FileMode(0o755));
        assert_eq!(encode(&attrs), vec![0, 0, 0, 4, 0, 0, 0x01, 0xed]);

        let mut attrs = Attributes::new();
        attrs.set_acmod_time(1, 2);
        assert_eq!(encode(&attrs), vec![0, 0, 0, 8, 0, 0, 0, 1, 0, 0, 0, 2]);
    }

    #[test]
    fn test_all_flags_with_extended() {
        let mut attrs = Attributes::new();
        attrs.set_size(2);
        attrs.set_uid_gid(3, 4);
        attrs.set_permissions(FileMode(5));
        attrs.set_acmod_time(6, 7);
        attrs.set_extended(vec![ExtendedAttribute::new("t", &b"d"[..])]);

        let expected = vec![
            0x80, 0x00, 0x00, 0x0f, // flags
            0, 0, 0, 0, 0, 0, 0, 2, // size
            0, 0, 0, 3, 0, 0, 0, 4, // uid, gid
            0, 0, 0, 5, // permissions
            0, 0, 0, 6, 0, 0, 0, 7, // atime, mtime
            0, 0, 0, 1, // extended count
            0, 0, 0, 1, b't', // type
            0, 0, 0, 1, b'd', // data
        ];
        assert_eq!(encode(&attrs), expected);
        assert_eq!(attrs.marshal_size(), expected.len());

        let mut buf = Buffer::from(&expected[..]);
        let parsed = Attributes::unmarshal_from(&mut buf).unwrap();
        assert_eq!(parsed, attrs);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_every_primary_flag_combination() {
        for mask in 0u32..16 {
            let mut attrs = Attributes::new();
            if mask & AttrFlags::SIZE != 0 {
                attrs.set_size(0x0102030405060708);
            }
            if mask & AttrFlags::UIDGID != 0 {
                attrs.set_uid_gid(11, 22);
            }
            if mask & AttrFlags::PERMISSIONS != 0 {
                attrs.set_permissions(FileMode(0o100600));
            }
            if mask & AttrFlags::ACMODTIME != 0 {
                attrs.set_acmod_time(33, 44);
            }
            assert_eq!(attrs.flags(), mask);

            let bytes = encode(&attrs);
            assert_eq!(bytes.len(), attrs.marshal_size(), "mask {:#x}", mask);

            // A trailing sentinel must be left untouched by the decoder.
            let mut wire = bytes.clone();
            wire.push(0xaa);
            let mut buf = Buffer::from(&wire[..]);
            let parsed = Attributes::unmarshal_from(&mut buf).unwrap();
            assert_eq!(parsed, attrs, "mask {:#x}", mask);
            assert_eq!(buf.bytes(), &[0xaa]);
        }
    }

    #[test]
    fn test_zero_flags_reads_nothing_else() {
        let mut buf = Buffer::from(&[0, 0, 0, 0, 0xde, 0xad][..]);
        let attrs = Attributes::unmarshal_from(&mut buf).unwrap();
        assert_eq!(attrs, Attributes::new());
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_truncated_field_is_short_packet() {
        let mut attrs = Attributes::new();
        attrs.set_size(9);
        attrs.set_acmod_time(1, 2);
        let bytes = encode(&attrs);

        for cut in 0..bytes.len() {
            let mut buf = Buffer::from(&bytes[..cut]);
            assert!(
                matches!(Attributes::unmarshal_from(&mut buf), Err(Error::ShortPacket)),
                "cut at {}",
                cut
            );
        }
    }

    #[test]
    fn test_hostile_extended_count() {
        // Claims 2^32-1 pairs but carries none.
        let mut buf = Buffer::from(&[0x80, 0, 0, 0, 0xff, 0xff, 0xff, 0xff][..]);
        assert!(matches!(
            Attributes::unmarshal_from(&mut buf),
            Err(Error::ShortPacket)
        ));
    }

    #[test]
    fn test_accessors() {
        let mut attrs = Attributes::new();
        assert!(!attrs.has_size());
        assert_eq!(attrs.size(), 0);

        attrs.set_size(10);
        assert!(attrs.has_size());
        assert_eq!(attrs.size(), 10);

        attrs.clear_size();
        assert!(!attrs.has_size());
        assert_eq!(attrs.size(), 0);

        attrs.set_extended(vec![ExtendedAttribute::new("a@b", "c")]);
        assert!(attrs.has_extended());
        attrs.clear_extended();
        assert!(!attrs.has_extended());
        assert!(attrs.extended().is_empty());
        assert_eq!(attrs, Attributes::new());
    }

    #[test]
    fn test_file_mode_type() {
        assert_eq!(FileMode(0o040755).file_type(), FileType::Directory);
        assert_eq!(FileMode(0o100644).file_type(), FileType::Regular);
        assert_eq!(FileMode(0o120777).file_type(), FileType::Symlink);
        assert_eq!(FileMode(0o140755).file_type(), FileType::Socket);
        assert_eq!(FileMode(0o644).file_type(), FileType::Unknown);
        assert!(FileMode(0o040700).is_dir());
        assert_eq!(FileMode(0o104755).perm(), 0o755);

        let mode = FileMode::new(FileType::Directory, 0o1777);
        assert_eq!(mode.0, 0o041777);
    }

    #[test]
    fn test_file_mode_display() {
        assert_eq!(FileMode(0o040755).to_string(), "drwxr-xr-x");
        assert_eq!(FileMode(0o100644).to_string(), "-rw-r--r--");
        assert_eq!(FileMode(0o120777).to_string(), "lrwxrwxrwx");
        assert_eq!(FileMode(0o104755).to_string(), "-rwsr-xr-x");
        assert_eq!(FileMode(0o102644).to_string(), "-rw-r-Sr--");
        assert_eq!(FileMode(0o041777).to_string(), "drwxrwxrwt");
        assert_eq!(FileMode(0o020600).to_string(), "crw-------");
    }
}

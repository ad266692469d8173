//! OpenSSH extended requests.
//!
//! | Request                       | Payload                 | Reply          |
//! |-------------------------------|-------------------------|----------------|
//! | `posix-rename@openssh.com`    | old path, new path      | STATUS         |
//! | `hardlink@openssh.com`        | old path, new path      | STATUS         |
//! | `fsync@openssh.com`           | handle                  | STATUS         |
//! | `statvfs@openssh.com`         | path                    | EXTENDED_REPLY |
//!
//! All four are registered with the extended packet registry when it is
//! first used, so an inbound EXTENDED request with one of these names
//! decodes to the typed payload.

use super::buffer::Buffer;
use super::error::Result;
use super::extended::{ExtendedData, ExtendedDataConstructor, ExtendedPacket, ExtendedReplyPacket};
use super::responses::ExtensionPair;
use super::string::SshString;
use bytes::Bytes;
use std::any::Any;

macro_rules! impl_extended_data {
    ($name:ident) => {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn clone_box(&self) -> Box<dyn ExtendedData> {
            Box::new(<$name>::clone(self))
        }
    };
}

pub(crate) fn builtin_extensions() -> Vec<(String, ExtendedDataConstructor)> {
    fn entry(name: &str, constructor: ExtendedDataConstructor) -> (String, ExtendedDataConstructor) {
        (name.to_string(), constructor)
    }

    vec![
        entry(PosixRenameExtendedPacket::EXTENSION_NAME, || {
            Box::new(PosixRenameExtendedPacket::default())
        }),
        entry(HardlinkExtendedPacket::EXTENSION_NAME, || {
            Box::new(HardlinkExtendedPacket::default())
        }),
        entry(FsyncExtendedPacket::EXTENSION_NAME, || {
            Box::new(FsyncExtendedPacket::default())
        }),
        entry(StatVfsExtendedPacket::EXTENSION_NAME, || {
            Box::new(StatVfsExtendedPacket::default())
        }),
    ]
}

/// Extension pairs a server advertises in VERSION for every request in this module.
pub fn extension_pairs() -> Vec<ExtensionPair> {
    vec![
        PosixRenameExtendedPacket::extension_pair(),
        StatVfsExtendedPacket::extension_pair(),
        HardlinkExtendedPacket::extension_pair(),
        FsyncExtendedPacket::extension_pair(),
    ]
}

/// `posix-rename@openssh.com`: rename that replaces an existing target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PosixRenameExtendedPacket {
    /// Existing path
    pub old_path: SshString,
    /// New path, replaced if present
    pub new_path: SshString,
}

impl PosixRenameExtendedPacket {
    /// Extended request name
    pub const EXTENSION_NAME: &'static str = "posix-rename@openssh.com";

    /// The VERSION advertisement for this extension.
    pub fn extension_pair() -> ExtensionPair {
        ExtensionPair::new(Self::EXTENSION_NAME, "1")
    }

    /// Wraps the payload in an EXTENDED request.
    pub fn into_packet(self) -> ExtendedPacket {
        ExtendedPacket::new(Self::EXTENSION_NAME, self)
    }
}

impl ExtendedData for PosixRenameExtendedPacket {
    fn marshal_size(&self) -> usize {
        4 + self.old_path.len() + 4 + self.new_path.len()
    }

    fn marshal_into(&self, buf: &mut Buffer) {
        buf.append_string(&self.old_path);
        buf.append_string(&self.new_path);
    }

    fn unmarshal_from(&mut self, buf: &mut Buffer) -> Result<()> {
        self.old_path = buf.consume_string()?;
        self.new_path = buf.consume_string()?;
        Ok(())
    }

    impl_extended_data!(PosixRenameExtendedPacket);
}

/// `hardlink@openssh.com`: create `new_path` as a hard link to `old_path`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HardlinkExtendedPacket {
    /// Existing path
    pub old_path: SshString,
    /// Link to create
    pub new_path: SshString,
}

impl HardlinkExtendedPacket {
    /// Extended request name
    pub const EXTENSION_NAME: &'static str = "hardlink@openssh.com";

    /// The VERSION advertisement for this extension.
    pub fn extension_pair() -> ExtensionPair {
        ExtensionPair::new(Self::EXTENSION_NAME, "1")
    }

    /// Wraps the payload in an EXTENDED request.
    pub fn into_packet(self) -> ExtendedPacket {
        ExtendedPacket::new(Self::EXTENSION_NAME, self)
    }
}

impl ExtendedData for HardlinkExtendedPacket {
    fn marshal_size(&self) -> usize {
        4 + self.old_path.len() + 4 + self.new_path.len()
    }

    fn marshal_into(&self, buf: &mut Buffer) {
        buf.append_string(&self.old_path);
        buf.append_string(&self.new_path);
    }

    fn unmarshal_from(&mut self, buf: &mut Buffer) -> Result<()> {
        self.old_path = buf.consume_string()?;
        self.new_path = buf.consume_string()?;
        Ok(())
    }

    impl_extended_data!(HardlinkExtendedPacket);
}

/// `fsync@openssh.com`: flush an open file to stable storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FsyncExtendedPacket {
    /// Handle of an open file
    pub handle: Bytes,
}

impl FsyncExtendedPacket {
    /// Extended request name
    pub const EXTENSION_NAME: &'static str = "fsync@openssh.com";

    /// The VERSION advertisement for this extension.
    pub fn extension_pair() -> ExtensionPair {
        ExtensionPair::new(Self::EXTENSION_NAME, "1")
    }

    /// Wraps the payload in an EXTENDED request.
    pub fn into_packet(self) -> ExtendedPacket {
        ExtendedPacket::new(Self::EXTENSION_NAME, self)
    }
}

impl ExtendedData for FsyncExtendedPacket {
    fn marshal_size(&self) -> usize {
        4 + self.handle.len()
    }

    fn marshal_into(&self, buf: &mut Buffer) {
        buf.append_byte_slice(&self.handle);
    }

    fn unmarshal_from(&mut self, buf: &mut Buffer) -> Result<()> {
        self.handle = buf.consume_byte_slice()?;
        Ok(())
    }

    impl_extended_data!(FsyncExtendedPacket);
}

/// `statvfs@openssh.com`: file system statistics for a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatVfsExtendedPacket {
    /// Any path on the file system of interest
    pub path: SshString,
}

impl StatVfsExtendedPacket {
    /// Extended request name
    pub const EXTENSION_NAME: &'static str = "statvfs@openssh.com";

    /// The VERSION advertisement for this extension.
    pub fn extension_pair() -> ExtensionPair {
        ExtensionPair::new(Self::EXTENSION_NAME, "2")
    }

    /// Wraps the payload in an EXTENDED request.
    pub fn into_packet(self) -> ExtendedPacket {
        ExtendedPacket::new(Self::EXTENSION_NAME, self)
    }
}

impl ExtendedData for StatVfsExtendedPacket {
    fn marshal_size(&self) -> usize {
        4 + self.path.len()
    }

    fn marshal_into(&self, buf: &mut Buffer) {
        buf.append_string(&self.path);
    }

    fn unmarshal_from(&mut self, buf: &mut Buffer) -> Result<()> {
        self.path = buf.consume_string()?;
        Ok(())
    }

    impl_extended_data!(StatVfsExtendedPacket);
}

/// Reply payload for `statvfs@openssh.com`, mirroring `struct statvfs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatVfsExtendedReplyPacket {
    /// File system block size
    pub block_size: u64,
    /// Fundamental block size
    pub fragment_size: u64,
    /// Size in fragments
    pub blocks: u64,
    /// Free blocks
    pub blocks_free: u64,
    /// Free blocks for unprivileged users
    pub blocks_avail: u64,
    /// Inodes
    pub files: u64,
    /// Free inodes
    pub files_free: u64,
    /// Free inodes for unprivileged users
    pub files_avail: u64,
    /// File system id
    pub fsid: u64,
    /// Mount flags
    pub mount_flags: u64,
    /// Maximum file name length
    pub max_name_length: u64,
}

impl StatVfsExtendedReplyPacket {
    /// `ST_RDONLY`
    pub const MOUNT_FLAG_READ_ONLY: u64 = 0x1;
    /// `ST_NOSUID`
    pub const MOUNT_FLAG_NO_SUID: u64 = 0x2;

    /// Total size in bytes.
    pub fn total_space(&self) -> u64 {
        self.fragment_size.saturating_mul(self.blocks)
    }

    /// Free bytes, including space reserved for the superuser.
    pub fn free_space(&self) -> u64 {
        self.fragment_size.saturating_mul(self.blocks_free)
    }

    /// Free bytes available to unprivileged users.
    pub fn avail_space(&self) -> u64 {
        self.fragment_size.saturating_mul(self.blocks_avail)
    }

    /// Returns true if the file system is mounted read-only.
    pub fn is_read_only(&self) -> bool {
        self.mount_flags & Self::MOUNT_FLAG_READ_ONLY != 0
    }

    /// Returns true if setuid bits are ignored on this file system.
    pub fn is_no_suid(&self) -> bool {
        self.mount_flags & Self::MOUNT_FLAG_NO_SUID != 0
    }

    /// Wraps the payload in an EXTENDED_REPLY.
    pub fn into_packet(self) -> ExtendedReplyPacket {
        ExtendedReplyPacket::new(self)
    }

    fn fields(&self) -> [u64; 11] {
        [
            self.block_size,
            self.fragment_size,
            self.blocks,
            self.blocks_free,
            self.blocks_avail,
            self.files,
            self.files_free,
            self.files_avail,
            self.fsid,
            self.mount_flags,
            self.max_name_length,
        ]
    }
}

impl ExtendedData for StatVfsExtendedReplyPacket {
    fn marshal_size(&self) -> usize {
        11 * 8
    }

    fn marshal_into(&self, buf: &mut Buffer) {
        for field in self.fields() {
            buf.append_u64(field);
        }
    }

    fn unmarshal_from(&mut self, buf: &mut Buffer) -> Result<()> {
        self.block_size = buf.consume_u64()?;
        self.fragment_size = buf.consume_u64()?;
        self.blocks = buf.consume_u64()?;
        self.blocks_free = buf.consume_u64()?;
        self.blocks_avail = buf.consume_u64()?;
        self.files = buf.consume_u64()?;
        self.files_free = buf.consume_u64()?;
        self.files_avail = buf.consume_u64()?;
        self.fsid = buf.consume_u64()?;
        self.mount_flags = buf.consume_u64()?;
        self.max_name_length = buf.consume_u64()?;
        Ok(())
    }

    impl_extended_data!(StatVfsExtendedReplyPacket);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sftp::packet::{Packet, Request, RequestPacket, Response, ResponsePacket};

    #[test]
    fn test_posix_rename_decodes_through_registry() {
        let rename = PosixRenameExtendedPacket {
            old_path: "/a".into(),
            new_path: "/b".into(),
        };
        let bytes = rename.clone().into_packet().to_bytes(11);

        let decoded = RequestPacket::decode(&bytes[..]).unwrap();
        assert_eq!(decoded.request_id, 11);
        match decoded.request {
            Request::Extended(ext) => {
                assert_eq!(ext.extended_request, PosixRenameExtendedPacket::EXTENSION_NAME);
                assert_eq!(ext.data_as::<PosixRenameExtendedPacket>(), Some(&rename));
            }
            other => panic!("expected extended request, got {:?}", other),
        }
    }

    #[test]
    fn test_builtin_extensions_registered() {
        for pair in extension_pairs() {
            let data = crate::sftp::extended::new_extended_data(&pair.name);
            assert!(data.is_some(), "{} not registered", pair.name);
        }
    }

    #[test]
    fn test_extension_pair_versions() {
        assert_eq!(StatVfsExtendedPacket::extension_pair().data, "2");
        assert_eq!(FsyncExtendedPacket::extension_pair().data, "1");
        assert_eq!(HardlinkExtendedPacket::extension_pair().data, "1");
    }

    #[test]
    fn test_fsync_handle() {
        let fsync = FsyncExtendedPacket {
            handle: Bytes::from_static(b"\x01\x02"),
        };
        let bytes = fsync.clone().into_packet().to_bytes(1);
        let decoded = RequestPacket::decode(&bytes[..]).unwrap();
        let Request::Extended(ext) = decoded.request else {
            panic!("expected extended request");
        };
        assert_eq!(ext.data_as::<FsyncExtendedPacket>(), Some(&fsync));
    }

    #[test]
    fn test_statvfs_reply() {
        let reply = StatVfsExtendedReplyPacket {
            block_size: 4096,
            fragment_size: 4096,
            blocks: 1000,
            blocks_free: 400,
            blocks_avail: 300,
            files: 10,
            files_free: 5,
            files_avail: 5,
            fsid: 0xabcd,
            mount_flags: StatVfsExtendedReplyPacket::MOUNT_FLAG_READ_ONLY,
            max_name_length: 255,
        };
        assert_eq!(reply.total_space(), 4096 * 1000);
        assert_eq!(reply.free_space(), 4096 * 400);
        assert_eq!(reply.avail_space(), 4096 * 300);
        assert!(reply.is_read_only());
        assert!(!reply.is_no_suid());

        let bytes = reply.into_packet().to_bytes(6);
        assert_eq!(bytes.len(), 9 + 88);

        let decoded = ResponsePacket::decode(&bytes[..]).unwrap();
        let Response::ExtendedReply(ext) = decoded.response else {
            panic!("expected extended reply");
        };
        assert_eq!(ext.decode_as::<StatVfsExtendedReplyPacket>().unwrap(), reply);
    }
}

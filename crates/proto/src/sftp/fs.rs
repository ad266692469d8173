//! Conversions between SFTP attributes and the local file system.

use super::attrs::{Attributes, FileMode, FileType};
use std::fs::{self, File, FileTimes, Metadata};
use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn to_epoch_secs(time: io::Result<SystemTime>) -> Option<u32> {
    let secs = time.ok()?.duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(u32::try_from(secs).unwrap_or(u32::MAX))
}

fn from_epoch_secs(secs: u32) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(u64::from(secs))
}

impl From<fs::FileType> for FileType {
    fn from(ft: fs::FileType) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if ft.is_fifo() {
                return Self::NamedPipe;
            }
            if ft.is_char_device() {
                return Self::CharDevice;
            }
            if ft.is_block_device() {
                return Self::BlockDevice;
            }
            if ft.is_socket() {
                return Self::Socket;
            }
        }

        if ft.is_symlink() {
            Self::Symlink
        } else if ft.is_dir() {
            Self::Directory
        } else if ft.is_file() {
            Self::Regular
        } else {
            Self::Unknown
        }
    }
}

impl FileMode {
    /// Builds a mode from local metadata, type bits included.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self(metadata.mode())
    }

    /// Builds a mode from local metadata, type bits included.
    ///
    /// Permission bits are synthesized from the read-only flag.
    #[cfg(not(unix))]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let default = if metadata.is_dir() {
            Self::DEFAULT_DIR
        } else {
            Self::DEFAULT_FILE
        };
        let perm = if metadata.permissions().readonly() {
            default & !(Self::USER_WRITE | Self::GROUP_WRITE | Self::OTHER_WRITE)
        } else {
            default
        };
        Self::new(FileType::from(metadata.file_type()), perm)
    }

    /// Local permissions carrying this mode's permission bits.
    #[cfg(unix)]
    pub fn to_permissions(self) -> fs::Permissions {
        use std::os::unix::fs::PermissionsExt;
        fs::Permissions::from_mode(self.0 & Self::MODE_MASK)
    }
}

impl Attributes {
    /// Collects size, owner, permissions and times from local metadata.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let mut attrs = Self::new();
        attrs.set_size(metadata.len());

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            attrs.set_uid_gid(metadata.uid(), metadata.gid());
        }

        attrs.set_permissions(FileMode::from_metadata(metadata));

        if let (Some(atime), Some(mtime)) = (
            to_epoch_secs(metadata.accessed()),
            to_epoch_secs(metadata.modified()),
        ) {
            attrs.set_acmod_time(atime, mtime);
        }
        attrs
    }

    /// Applies every present field to an open file.
    ///
    /// Fields are applied in wire order (size, owner, permissions, times) and
    /// the first failure stops the rest. Owner changes are skipped off unix.
    pub fn apply_to_file(&self, file: &File) -> io::Result<()> {
        if self.has_size() {
            file.set_len(self.size())?;
        }

        #[cfg(unix)]
        if self.has_uid_gid() {
            let (uid, gid) = self.uid_gid();
            std::os::unix::fs::fchown(file, Some(uid), Some(gid))?;
        }

        if self.has_permissions() {
            #[cfg(unix)]
            file.set_permissions(self.permissions().to_permissions())?;

            #[cfg(not(unix))]
            {
                let mut perms = file.metadata()?.permissions();
                let writable = FileMode::USER_WRITE | FileMode::GROUP_WRITE | FileMode::OTHER_WRITE;
                perms.set_readonly(self.permissions().0 & writable == 0);
                file.set_permissions(perms)?;
            }
        }

        if self.has_acmod_time() {
            let (atime, mtime) = self.acmod_time();
            file.set_times(
                FileTimes::new()
                    .set_accessed(from_epoch_secs(atime))
                    .set_modified(from_epoch_secs(mtime)),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_metadata() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();
        let metadata = file.as_file().metadata().unwrap();

        let attrs = Attributes::from_metadata(&metadata);
        assert!(attrs.has_size());
        assert_eq!(attrs.size(), 5);
        assert!(attrs.has_permissions());
        assert!(attrs.permissions().is_regular());
        assert!(attrs.has_acmod_time());
        #[cfg(unix)]
        assert!(attrs.has_uid_gid());
    }

    #[test]
    fn test_directory_file_type() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = std::fs::metadata(dir.path()).unwrap();
        assert_eq!(FileType::from(metadata.file_type()), FileType::Directory);
        assert!(FileMode::from_metadata(&metadata).is_dir());
    }

    #[test]
    fn test_apply_size_and_times() {
        let file = tempfile::tempfile().unwrap();
        let mut attrs = Attributes::new();
        attrs.set_size(42);
        attrs.set_acmod_time(1_000_000, 2_000_000);
        attrs.apply_to_file(&file).unwrap();

        let metadata = file.metadata().unwrap();
        assert_eq!(metadata.len(), 42);
        assert_eq!(
            metadata.modified().unwrap(),
            UNIX_EPOCH + Duration::from_secs(2_000_000)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let file = tempfile::tempfile().unwrap();
        let mut attrs = Attributes::new();
        attrs.set_permissions(FileMode::from(0o100600));
        attrs.apply_to_file(&file).unwrap();

        let mode = file.metadata().unwrap().permissions().mode();
        assert_eq!(mode & FileMode::MODE_MASK, 0o600);
    }

    #[test]
    fn test_apply_empty_attributes_is_noop() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"abc").unwrap();
        Attributes::new().apply_to_file(&file).unwrap();
        assert_eq!(file.metadata().unwrap().len(), 3);
    }
}

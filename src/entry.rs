use std::path::PathBuf;
use std::time::SystemTime;

/// A deletion candidate: an entry that survived every exclusion rule.
///
/// The metadata is the snapshot the decision was made on. Nothing guarantees
/// the file still looks like this when the caller gets around to removing it.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Full path to the entry, rooted at the scan root.
    pub path: PathBuf,

    /// Metadata captured when the entry was visited.
    pub metadata: Metadata,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }
}

/// The kind of a traversed entry.
///
/// Anything other than [`EntryKind::File`] and [`EntryKind::Dir`] is
/// "irregular" and only eligible when irregular files are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,

    /// A directory.
    Dir,

    /// A symbolic link. Described, never followed.
    Symlink,

    /// Anything else (device files, pipes, sockets, etc.).
    Other,
}

impl From<std::fs::FileType> for EntryKind {
    fn from(ft: std::fs::FileType) -> Self {
        if ft.is_dir() {
            EntryKind::Dir
        } else if ft.is_file() {
            EntryKind::File
        } else if ft.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::Other
        }
    }
}

/// Snapshot of the stat fields the exclusion rules look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub kind: EntryKind,

    /// Mode bits, file type excluded.
    pub mode: u32,

    /// Owner user id.
    pub uid: u32,

    /// Owner group id.
    pub gid: u32,

    /// Id of the device holding the entry.
    pub dev: u64,

    pub size: u64,

    /// Last access time ("atime").
    pub accessed: SystemTime,
}

impl Metadata {
    /// The `rwxrwxrwx` permission bits.
    pub fn permissions(&self) -> u32 {
        self.mode & 0o777
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }

    /// Regular files and directories; everything else is irregular.
    pub fn is_regular(&self) -> bool {
        matches!(self.kind, EntryKind::File | EntryKind::Dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn meta(kind: EntryKind, mode: u32) -> Metadata {
        Metadata {
            kind,
            mode,
            uid: 1,
            gid: 1,
            dev: 1,
            size: 0,
            accessed: UNIX_EPOCH,
        }
    }

    #[test]
    fn permissions_drop_special_bits() {
        assert_eq!(meta(EntryKind::File, 0o4755).permissions(), 0o755);
        assert_eq!(meta(EntryKind::Dir, 0o1777).permissions(), 0o777);
    }

    #[test]
    fn symlinks_and_others_are_irregular() {
        assert!(meta(EntryKind::File, 0o644).is_regular());
        assert!(meta(EntryKind::Dir, 0o755).is_regular());
        assert!(!meta(EntryKind::Symlink, 0o777).is_regular());
        assert!(meta(EntryKind::Symlink, 0o777).is_symlink());
        assert!(!meta(EntryKind::Other, 0o600).is_regular());
    }
}

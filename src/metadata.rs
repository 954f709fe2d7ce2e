use std::fs;
use std::io;
use std::path::Path;

use crate::entry::Metadata;
use crate::traits::MetadataAccessor;

/// Metadata straight from `lstat(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsMetadata;

impl MetadataAccessor for OsMetadata {
    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let meta = fs::symlink_metadata(path)?;
        snapshot(&meta)
    }
}

#[cfg(unix)]
fn snapshot(meta: &fs::Metadata) -> io::Result<Metadata> {
    use std::os::unix::fs::MetadataExt;

    use crate::entry::EntryKind;

    Ok(Metadata {
        kind:     EntryKind::from(meta.file_type()),
        mode:     meta.mode() & 0o7777,
        uid:      meta.uid(),
        gid:      meta.gid(),
        dev:      meta.dev(),
        size:     meta.len(),
        accessed: meta.accessed()?,
    })
}

#[cfg(not(unix))]
fn snapshot(_meta: &fs::Metadata) -> io::Result<Metadata> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "owner and device metadata are not available on this platform",
    ))
}

/// Whether both entries live on the same device.
pub fn same_device(a: &Metadata, b: &Metadata) -> bool {
    a.dev == b.dev
}

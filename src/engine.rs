use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{select, Receiver, Sender, TryRecvError};
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::credentials::Credentials;
use crate::entry::{Entry, Metadata};
use crate::error::ReaperError;
use crate::filter::{has_expired, is_empty, is_protected, is_writable, on_same_device, Protection};
use crate::results::ScanStats;
use crate::traits::{Clock, MetadataAccessor};

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

/// Everything the producer thread needs, validated and frozen.
///
/// Built by `ReaperBuilder::start()` and moved onto the
/// walker thread.
pub(crate) struct Walker {
    pub root:        PathBuf,
    pub root_meta:   Metadata,
    pub config:      Config,
    pub protection:  Protection,
    pub credentials: Credentials,
    pub metadata:    Arc<dyn MetadataAccessor>,
    pub clock:       Arc<dyn Clock>,
}

/// How the walk ended.
pub(crate) struct WalkOutcome {
    pub error: Option<ReaperError>,
    pub stats: ScanStats,
}

/// What to do with a visited path.
enum Visit {
    /// Not a candidate; keep walking (into it, if it is a directory).
    Continue,
    /// Not a candidate and neither is anything beneath it.
    SkipSubtree,
    /// Hand it to the consumer.
    Candidate,
}

/// Why the walk loop ended early.
enum Halt {
    Cancelled,
    Disconnected,
}

impl Walker {
    /// Walk the tree depth-first, parent before children, sending each
    /// candidate through `results`.
    ///
    /// Blocks on every send until the consumer takes the entry or `stop`
    /// closes. Cancellation is checked before each path is visited.
    pub(crate) fn run(self, results: Sender<Entry>, stop: Receiver<()>) -> WalkOutcome {
        let start = Instant::now();

        let mut files      = 0;
        let mut dirs       = 0;
        let mut candidates = 0;
        let mut errors     = 0;
        let mut last_error = None;

        // Paths still to visit, next one on top. A path is stat'ed before
        // its directory is listed: listing refreshes atime under relatime.
        let mut pending = vec![self.root.clone()];

        let halt = loop {
            if cancelled(&stop) {
                break Some(Halt::Cancelled);
            }

            let Some(next) = pending.pop() else {
                break None;
            };
            let path = next.as_path();

            let meta = match self.metadata.stat(path) {
                Ok(meta) => meta,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(?path, "vanished before it could be inspected");
                    continue;
                }
                Err(source) => {
                    let err = ReaperError::Io {
                        path: path.to_path_buf(),
                        source,
                    };
                    warn!(error = %err, ?path, "cannot read metadata");
                    errors += 1;
                    last_error = Some(err);
                    continue;
                }
            };

            let visit = if meta.is_dir() {
                dirs += 1;
                self.visit_dir(path, &meta)
            } else {
                files += 1;
                self.visit_file(path, &meta)
            };

            match visit {
                Visit::SkipSubtree => {}
                Visit::Continue => {
                    if !meta.is_dir() {
                        continue;
                    }
                    match list_children(path) {
                        Ok(children) => pending.extend(children.into_iter().rev()),
                        Err(e) if e.kind() == io::ErrorKind::NotFound => {
                            debug!(?path, "vanished before it could be listed");
                        }
                        Err(e) => {
                            let err = map_list_error(path, e);
                            warn!(error = %err, ?path, "traversal error");
                            errors += 1;
                            last_error = Some(err);
                        }
                    }
                }
                Visit::Candidate => {
                    trace!(?path, dir = meta.is_dir(), "candidate");
                    let entry = Entry {
                        path: path.to_path_buf(),
                        metadata: meta,
                    };
                    let delivered = select! {
                        send(results, entry) -> res => res.map_err(|_| Halt::Disconnected),
                        recv(stop) -> _ => Err(Halt::Cancelled),
                    };
                    match delivered {
                        Ok(()) => candidates += 1,
                        Err(halt) => break Some(halt),
                    }
                }
            }
        };

        match halt {
            Some(Halt::Cancelled)    => debug!(root = ?self.root, "walk cancelled"),
            Some(Halt::Disconnected) => debug!(root = ?self.root, "consumer went away"),
            None                     => debug!(root = ?self.root, files, dirs, candidates, "walk complete"),
        }

        WalkOutcome {
            error: last_error,
            stats: ScanStats::compute(files, dirs, candidates, errors, start.elapsed()),
        }
    }

    fn visit_dir(&self, path: &Path, meta: &Metadata) -> Visit {
        if is_protected(path, &self.root, &self.protection) {
            debug!(?path, "protected, skipping subtree");
            return Visit::SkipSubtree;
        }
        if !on_same_device(&self.root_meta, meta) {
            debug!(?path, "different device, skipping subtree");
            return Visit::SkipSubtree;
        }
        if !self.permitted(meta) {
            return Visit::Continue;
        }
        if has_expired(meta, self.config.expunge_after, self.clock.as_ref()) && is_empty(path) {
            return Visit::Candidate;
        }
        Visit::Continue
    }

    fn visit_file(&self, path: &Path, meta: &Metadata) -> Visit {
        if is_protected(path, &self.root, &self.protection) {
            debug!(?path, "protected");
            return Visit::Continue;
        }
        if !on_same_device(&self.root_meta, meta) {
            return Visit::Continue;
        }
        if !(meta.is_regular() || self.config.expunge_irregular) {
            return Visit::Continue;
        }
        if !self.permitted(meta) {
            return Visit::Continue;
        }
        if has_expired(meta, self.config.expunge_after, self.clock.as_ref()) {
            return Visit::Candidate;
        }
        Visit::Continue
    }

    /// Writable by us, or `force` says permissions don't matter.
    fn permitted(&self, meta: &Metadata) -> bool {
        self.config.force
            || is_writable(meta.uid, meta.gid, meta.permissions(), &self.credentials)
    }
}

fn cancelled(stop: &Receiver<()>) -> bool {
    matches!(stop.try_recv(), Err(TryRecvError::Disconnected))
}

/// Children of `dir`, sorted by file name.
fn list_children(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut children = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(children)
}

fn map_list_error(path: &Path, e: io::Error) -> ReaperError {
    let path = path.to_path_buf();
    match e.kind() {
        io::ErrorKind::PermissionDenied => ReaperError::PermissionDenied(path),
        _ => ReaperError::Io { path, source: e },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_come_back_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b", "a", "c.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("a.d")).unwrap();

        let names: Vec<_> = list_children(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_owned())
            .collect();

        assert_eq!(names, ["a", "a.d", "b", "c.txt"]);
    }

    #[test]
    fn listing_errors_keep_their_path() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            map_list_error(Path::new("/srv/locked"), denied),
            ReaperError::PermissionDenied(p) if p == Path::new("/srv/locked")
        ));

        let dir = tempfile::tempdir().unwrap();
        let err = list_children(&dir.path().join("gone")).unwrap_err();
        assert!(matches!(
            map_list_error(&dir.path().join("gone"), err),
            ReaperError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound
        ));
    }
}

//! The exclusion rules. Everything here is a pure function of its inputs
//! except [`is_empty`], which has to look at the directory.

use std::fs;
use std::path::Path;
use std::time::Duration;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::credentials::Credentials;
use crate::entry::Metadata;
use crate::error::ReaperError;
use crate::metadata::same_device;
use crate::traits::Clock;

const S_IWUSR: u32 = 0o200;
const S_IWGRP: u32 = 0o020;
const S_IWOTH: u32 = 0o002;

// ---------------------------------------------------------------------------
// Protection
// ---------------------------------------------------------------------------

/// Compiled protection patterns.
///
/// Shell-style globs: `*` and `?` never match a `/`, `[...]` is a character
/// class. Every pattern is compiled up front so a typo fails the session
/// before anything is walked.
#[derive(Debug, Clone)]
pub struct Protection {
    set: GlobSet,
}

impl Protection {
    pub fn new<I, S>(patterns: I) -> Result<Self, ReaperError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut seen = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|source| ReaperError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })?;
            builder.add(glob);
            seen.push(pattern.to_string());
        }
        let set = builder.build().map_err(|source| ReaperError::InvalidPattern {
            pattern: seen.join(" "),
            source,
        })?;
        Ok(Self { set })
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.set.is_match(path)
    }
}

/// Whether any pattern matches `path`.
///
/// `root` is the scan root: the path is tried both relative to it and as
/// given, so `cache/*` and `/srv/scratch/cache/*` protect the same files
/// when scanning `/srv/scratch`. The root itself only matches as given.
pub fn is_protected(path: &Path, root: &Path, protection: &Protection) -> bool {
    if protection.is_empty() {
        return false;
    }
    if protection.matches(path) {
        return true;
    }
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => protection.matches(rel),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Metadata rules
// ---------------------------------------------------------------------------

/// Whether `entry` lives on the same device as `root`.
pub fn on_same_device(root: &Metadata, entry: &Metadata) -> bool {
    same_device(root, entry)
}

/// POSIX write permission, evaluated from the mode bits alone.
///
/// Order matters: superuser, then the "other" bit, then the owner bit for
/// the owner, then the group bit for the owning group (effective or
/// supplementary). Sticky parent directories are not considered.
pub fn is_writable(owner: u32, group: u32, perm: u32, creds: &Credentials) -> bool {
    if creds.is_superuser() {
        return true;
    }
    if perm & S_IWOTH != 0 {
        return true;
    }
    if perm & S_IWUSR != 0 && owner == creds.euid {
        return true;
    }
    perm & S_IWGRP != 0 && creds.in_group(group)
}

/// Whether the directory has no children.
///
/// A directory that cannot be opened or listed counts as non-empty, so it is
/// never offered for removal.
pub fn is_empty(dir: &Path) -> bool {
    match fs::read_dir(dir) {
        Ok(mut children) => children.next().is_none(),
        Err(_) => false,
    }
}

/// Whether the entry was last accessed more than `ttl` before `clock.now()`.
///
/// Access times in the clock's future never expire.
pub fn has_expired(meta: &Metadata, ttl: Duration, clock: &dyn Clock) -> bool {
    clock
        .now()
        .duration_since(meta.accessed)
        .map(|age| age > ttl)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn protection_matches_any_pattern() {
        for (path, globs, want) in [
            ("path/to/foo", vec![], false),
            ("path/to/foo", vec!["path/to/*"], true),
            ("path/to/foo", vec!["bar", "path/to/*"], true),
            ("path/to/junk", vec!["bar", "foo"], false),
            ("path/to/deeper/foo", vec!["path/to/*"], false),
            ("path/to/foo", vec!["path/to/f?o"], true),
            ("path/to/foo", vec!["path/to/[a-f]*"], true),
        ] {
            let protection = Protection::new(&globs).unwrap();
            let got = is_protected(Path::new(path), Path::new("/unrelated"), &protection);
            assert_eq!(got, want, "is_protected({path:?}, {globs:?})");
        }
    }

    #[test]
    fn protection_tries_the_root_relative_path() {
        let root = PathBuf::from("/srv/scratch");
        let protection = Protection::new(&["cache/*"]).unwrap();
        assert!(is_protected(&root.join("cache/blob"), &root, &protection));
        assert!(!is_protected(&root.join("cache"), &root, &protection));
        assert!(!is_protected(&root.join("logs/cache/blob"), &root, &protection));

        let everything = Protection::new(&["*"]).unwrap();
        assert!(!is_protected(&root, &root, &everything));
        assert!(is_protected(&root.join("top"), &root, &everything));
    }

    #[test]
    fn malformed_pattern_fails_up_front() {
        let err = Protection::new(&["ok/*", "broken["]).unwrap_err();
        match err {
            ReaperError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "broken["),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn writability_follows_posix_precedence() {
        for (owner, group, creds, perm, want) in [
            (0, 0, Credentials::new(0, 0, []), 0o000, true),
            (0, 0, Credentials::new(1, 1, []), 0o007, true),
            (1, 0, Credentials::new(1, 0, []), 0o700, true),
            (1, 2, Credentials::new(1, 2, []), 0o070, true),
            (1, 2, Credentials::new(1, 1, [2]), 0o070, true),
            (1, 3, Credentials::new(1, 1, [2]), 0o070, false),
            (2, 0, Credentials::new(1, 1, []), 0o700, false),
            (1, 1, Credentials::new(1, 1, [1]), 0o555, false),
            (7, 7, Credentials::new(9, 9, []), 0o002, true),
        ] {
            assert_eq!(
                is_writable(owner, group, perm, &creds),
                want,
                "is_writable({owner}, {group}, {perm:o}, {creds:?})"
            );
        }
    }

    #[test]
    fn owner_bit_ignored_for_other_users() {
        let creds = Credentials::new(5, 5, []);
        assert!(!is_writable(6, 6, 0o700, &creds));
        assert!(is_writable(5, 6, 0o700, &creds));
        assert!(is_writable(6, 6, 0o702, &creds));
    }

    #[test]
    fn emptiness() {
        let dir = tempfile::tempdir().unwrap();
        assert!(is_empty(dir.path()));

        fs::write(dir.path().join("dummy"), [0, 1, 2, 3, 4]).unwrap();
        assert!(!is_empty(dir.path()));

        assert!(!is_empty(&dir.path().join("missing")));
        assert!(!is_empty(&dir.path().join("dummy")));
    }

    #[test]
    fn expiry_is_strictly_older_than_ttl() {
        let now = UNIX_EPOCH + Duration::from_secs(1_495_991_580);
        let clock = move || now;
        let meta = |age: u64| Metadata {
            kind:     EntryKind::File,
            mode:     0o644,
            uid:      0,
            gid:      0,
            dev:      0,
            size:     0,
            accessed: now - Duration::from_secs(age),
        };

        assert!(!has_expired(&meta(30), Duration::from_secs(60), &clock));
        assert!(has_expired(&meta(90), Duration::from_secs(60), &clock));
        assert!(!has_expired(&meta(60), Duration::from_secs(60), &clock));
    }

    #[test]
    fn future_access_time_never_expires() {
        let now = SystemTime::now();
        let clock = move || now;
        let meta = Metadata {
            kind:     EntryKind::File,
            mode:     0o644,
            uid:      0,
            gid:      0,
            dev:      0,
            size:     0,
            accessed: now + Duration::from_secs(3600),
        };
        assert!(!has_expired(&meta, Duration::from_secs(1), &clock));
    }
}

//! # reaper
//!
//! Find files and directories nobody has accessed in a while.
//!
//! reaper is a decision engine, not a deletion engine. It walks a tree on a
//! background thread, runs every entry through a chain of exclusion rules,
//! and streams the survivors to the caller one at a time. The caller decides
//! what to do with them.
//!
//! An entry is a candidate when all of these hold:
//!
//! - no protection glob matches it (a protected directory hides its whole
//!   subtree),
//! - it lives on the same device as the root (another device hides the whole
//!   subtree),
//! - it is a regular file or directory, unless irregular entries are enabled,
//! - the caller could write to it, unless `force` is set,
//! - its access time is older than the expiry,
//! - and, for a directory, it has no children.
//!
//! # Quick Start
//!
//! ```rust
//! use std::time::{Duration, SystemTime};
//! use reaper::{Config, Credentials};
//!
//! let dir = tempfile::tempdir()?;
//! std::fs::create_dir(dir.path().join("stale"))?;
//! std::fs::write(dir.path().join("notes.txt"), "keep me")?;
//!
//! // Pretend an hour has passed and everything belongs to us.
//! let later = SystemTime::now() + Duration::from_secs(3600);
//! let config = Config::new(Duration::from_secs(60)).protect(["*.txt"]);
//! let reaper = reaper::builder(config)
//!     .clock(move || later)
//!     .credentials(Credentials::new(0, 0, []))
//!     .start(dir.path())?;
//!
//! let found: Vec<_> = reaper.map(|entry| entry.path).collect();
//! assert_eq!(found, [dir.path().join("stale")]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Removing candidates
//!
//! Nothing is locked between the decision and the caller acting on it. A
//! file can be touched, replaced or filled in that window; callers that care
//! should re-check before removing.

#![deny(unsafe_code)]

pub mod duration;

mod builder;
mod config;
mod credentials;
mod engine;
mod entry;
mod error;
mod filter;
mod metadata;
mod results;
mod session;
mod traits;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::ReaperBuilder;
pub use config::Config;
pub use credentials::Credentials;
pub use entry::{Entry, EntryKind, Metadata};
pub use error::ReaperError;
pub use filter::{has_expired, is_empty, is_protected, is_writable, on_same_device, Protection};
pub use metadata::{same_device, OsMetadata};
pub use results::ScanStats;
pub use session::{CancelToken, Reaper};
pub use traits::{Clock, MetadataAccessor, SystemClock};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Create a [`ReaperBuilder`] to start a scan with custom collaborators.
///
/// For the production defaults, [`Reaper::new`] is shorter.
pub fn builder(config: Config) -> ReaperBuilder {
    ReaperBuilder::new(config)
}

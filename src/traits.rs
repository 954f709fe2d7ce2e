use std::io;
use std::path::Path;
use std::time::SystemTime;

use crate::entry::Metadata;

/// Reads the metadata snapshot for a path.
///
/// Implementations must describe symlinks rather than follow them. The
/// production implementation is [`OsMetadata`](crate::OsMetadata); tests
/// substitute their own to fake device boundaries or I/O failures.
///
/// # Thread Safety
///
/// `Send + Sync` are required: the accessor moves to the walker thread.
///
/// # Example
///
/// ```rust
/// use std::io;
/// use std::path::Path;
/// use reaper::{Metadata, MetadataAccessor, OsMetadata};
///
/// /// Pretends everything lives on device 7.
/// struct SingleDevice;
///
/// impl MetadataAccessor for SingleDevice {
///     fn stat(&self, path: &Path) -> io::Result<Metadata> {
///         let mut meta = OsMetadata.stat(path)?;
///         meta.dev = 7;
///         Ok(meta)
///     }
/// }
/// ```
pub trait MetadataAccessor: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<Metadata>;
}

/// Source of "now" for the expiry rule.
///
/// Any `Fn() -> SystemTime` closure is a clock, which keeps tests short:
///
/// ```rust
/// use std::time::{Duration, SystemTime, UNIX_EPOCH};
/// use reaper::Clock;
///
/// let frozen = UNIX_EPOCH + Duration::from_secs(1_500_000_000);
/// let clock = move || frozen;
/// assert_eq!(clock.now(), frozen);
/// ```
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall-clock time. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl<F> Clock for F
where
    F: Fn() -> SystemTime + Send + Sync,
{
    fn now(&self) -> SystemTime {
        self()
    }
}

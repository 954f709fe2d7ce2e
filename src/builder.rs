use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::credentials::Credentials;
use crate::engine::Walker;
use crate::error::ReaperError;
use crate::filter::Protection;
use crate::metadata::OsMetadata;
use crate::session::Reaper;
use crate::traits::{Clock, MetadataAccessor, SystemClock};

// ---------------------------------------------------------------------------
// ReaperBuilder
// ---------------------------------------------------------------------------

/// Starts a [`Reaper`] with non-default collaborators.
///
/// Created via [`reaper::builder()`](crate::builder). Everything except the
/// [`Config`] has a production default; override the rest to make a scan
/// deterministic in tests.
///
/// # Example
///
/// ```rust,ignore
/// let reaper = reaper::builder(config)
///     .clock(move || frozen_now)
///     .credentials(Credentials::new(1000, 1000, [27]))
///     .start("/srv/scratch")?;
/// ```
pub struct ReaperBuilder {
    config:      Config,
    metadata:    Option<Arc<dyn MetadataAccessor>>,
    clock:       Option<Arc<dyn Clock>>,
    credentials: Option<Credentials>,
}

impl ReaperBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            metadata:    None,
            clock:       None,
            credentials: None,
        }
    }

    // ── Collaborators ─────────────────────────────────────────────────────

    /// Replace how metadata is read. Defaults to [`OsMetadata`].
    pub fn metadata(mut self, accessor: impl MetadataAccessor + 'static) -> Self {
        self.metadata = Some(Arc::new(accessor));
        self
    }

    /// Replace the source of "now". Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Evaluate writability as someone else. Defaults to the ids of the
    /// running process.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Validate everything and start walking `root` on a new thread.
    ///
    /// # Errors
    ///
    /// Fails without starting a walk when the expiry is zero, a protection
    /// pattern is malformed, the root cannot be stat'ed, or the process's
    /// groups cannot be read.
    pub fn start(self, root: impl AsRef<Path>) -> Result<Reaper, ReaperError> {
        let root = root.as_ref().to_path_buf();

        self.config.validate()?;
        let protection = Protection::new(&self.config.protect)?;

        let metadata: Arc<dyn MetadataAccessor> = match self.metadata {
            Some(m) => m,
            None    => Arc::new(OsMetadata),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(c) => c,
            None    => Arc::new(SystemClock),
        };

        let root_meta = metadata.stat(&root).map_err(|source| ReaperError::Root {
            path: root.clone(),
            source,
        })?;

        let credentials = match self.credentials {
            Some(c) => c,
            None    => Credentials::current()?,
        };

        let walker = Walker {
            root,
            root_meta,
            config: self.config,
            protection,
            credentials,
            metadata,
            clock,
        };

        Reaper::spawn(walker)
    }
}

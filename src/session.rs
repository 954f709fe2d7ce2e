use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};
use tracing::debug;

use crate::builder::ReaperBuilder;
use crate::config::Config;
use crate::engine::{WalkOutcome, Walker};
use crate::entry::Entry;
use crate::error::ReaperError;
use crate::results::ScanStats;

// ---------------------------------------------------------------------------
// CancelToken
// ---------------------------------------------------------------------------

/// One-shot cancellation signal shared by the walker and its consumer.
///
/// Cancelling drops the only sender of a channel, which every clone of the
/// receiver then observes as "disconnected". Cloning is cheap; calling
/// [`cancel`](CancelToken::cancel) more than once is harmless.
#[derive(Clone)]
pub struct CancelToken {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    signal:  Receiver<()>,
}

impl CancelToken {
    fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            trigger: Arc::new(Mutex::new(Some(tx))),
            signal:  rx,
        }
    }

    pub fn cancel(&self) {
        if let Ok(mut trigger) = self.trigger.lock() {
            trigger.take();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Reaper
// ---------------------------------------------------------------------------

/// A running scan: a walker thread producing candidates and the handle the
/// caller pulls them from.
///
/// Candidates arrive one at a time through a rendezvous channel, so the
/// walker never gets more than one entry ahead of the caller. Removing an
/// entry is up to the caller; nothing here touches the filesystem beyond
/// reading it.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use reaper::{Config, Reaper};
///
/// let config = Config::new(Duration::from_secs(30 * 24 * 3600)).protect(["*.keep"]);
/// let mut reaper = Reaper::new("/tmp", config)?;
/// while reaper.advance() {
///     if let Some(entry) = reaper.current() {
///         println!("{}", entry.path.display());
///     }
/// }
/// if let Some(err) = reaper.terminal_error() {
///     eprintln!("walk failed: {err}");
/// }
/// # Ok::<(), reaper::ReaperError>(())
/// ```
pub struct Reaper {
    root:     PathBuf,
    results:  Receiver<Entry>,
    cancel:   CancelToken,
    current:  Option<Entry>,
    producer: Option<JoinHandle<WalkOutcome>>,
    outcome:  Option<WalkOutcome>,
}

impl Reaper {
    /// Start scanning `root` with the production defaults.
    ///
    /// See [`ReaperBuilder::start`] for the errors.
    pub fn new(root: impl AsRef<Path>, config: Config) -> Result<Self, ReaperError> {
        ReaperBuilder::new(config).start(root)
    }

    pub(crate) fn spawn(walker: Walker) -> Result<Self, ReaperError> {
        let root = walker.root.clone();
        let (tx, rx) = bounded(0);
        let cancel = CancelToken::new();
        let stop = cancel.signal().clone();

        let producer = thread::Builder::new()
            .name("reaper-walker".into())
            .spawn(move || walker.run(tx, stop))
            .map_err(ReaperError::Spawn)?;

        debug!(?root, "walk started");

        Ok(Self {
            root,
            results: rx,
            cancel,
            current: None,
            producer: Some(producer),
            outcome: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wait for the next candidate.
    ///
    /// Returns `true` when one is available through [`current`](Self::current),
    /// `false` once the walk is finished or cancelled. After `false` the
    /// walker thread has exited and [`terminal_error`](Self::terminal_error)
    /// is final. Calling it again keeps returning `false`.
    pub fn advance(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            self.finish();
            return false;
        }

        let next = select! {
            recv(self.results) -> msg => msg.ok(),
            recv(self.cancel.signal()) -> _ => None,
        };
        match next {
            Some(entry) => {
                self.current = Some(entry);
                true
            }
            None => {
                self.finish();
                false
            }
        }
    }

    /// The entry returned by the last successful [`advance`](Self::advance).
    pub fn current(&self) -> Option<&Entry> {
        self.current.as_ref()
    }

    /// Ask the walker to stop at its next checkpoint. Idempotent, and fine
    /// to call after the walk has already finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle that cancels this scan from elsewhere, e.g. a signal handler
    /// thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The last traversal error, once [`advance`](Self::advance) has returned
    /// `false`. Cancelling never produces one.
    pub fn terminal_error(&self) -> Option<&ReaperError> {
        self.outcome.as_ref().and_then(|o| o.error.as_ref())
    }

    /// Counters for the finished walk, once [`advance`](Self::advance) has
    /// returned `false`.
    pub fn stats(&self) -> Option<&ScanStats> {
        self.outcome.as_ref().map(|o| &o.stats)
    }

    /// Join the walker and publish its outcome.
    fn finish(&mut self) {
        self.current = None;
        let Some(handle) = self.producer.take() else {
            return;
        };
        let outcome = handle.join().unwrap_or_else(|_| WalkOutcome {
            error: Some(ReaperError::WalkerPanicked),
            stats: ScanStats::compute(0, 0, 0, 1, Duration::ZERO),
        });
        self.outcome = Some(outcome);
    }
}

impl Iterator for Reaper {
    type Item = Entry;

    /// [`advance`](Reaper::advance), taking ownership of the entry.
    fn next(&mut self) -> Option<Entry> {
        if self.advance() {
            self.current.take()
        } else {
            None
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.cancel();
        self.finish();
    }
}

impl std::fmt::Debug for Reaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaper")
            .field("root", &self.root)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("finished", &self.outcome.is_some())
            .finish()
    }
}

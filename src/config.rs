use std::time::Duration;

use crate::error::ReaperError;

/// What makes an entry eligible. Frozen once a session starts.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use reaper::Config;
///
/// let config = Config::new(Duration::from_secs(7 * 24 * 3600))
///     .protect(["*.keep", "important/*"])
///     .expunge_irregular(true);
///
/// assert_eq!(config.protect.len(), 2);
/// assert!(!config.force);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Entries accessed more recently than this are kept. Must be > 0.
    pub expunge_after: Duration,

    /// Allow irregular entries (symlinks, FIFOs, devices, sockets).
    pub expunge_irregular: bool,

    /// Shell-style globs for data that must never be reported. A matching
    /// directory is skipped along with everything beneath it.
    pub protect: Vec<String>,

    /// Ignore permissions and report candidates by age alone.
    pub force: bool,
}

impl Config {
    pub fn new(expunge_after: Duration) -> Self {
        Self {
            expunge_after,
            expunge_irregular: false,
            protect: Vec::new(),
            force: false,
        }
    }

    pub fn expunge_irregular(mut self, yes: bool) -> Self {
        self.expunge_irregular = yes;
        self
    }

    /// Add protection patterns. Repeated calls accumulate.
    pub fn protect<I, S>(mut self, globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protect.extend(globs.into_iter().map(Into::into));
        self
    }

    pub fn force(mut self, yes: bool) -> Self {
        self.force = yes;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ReaperError> {
        if self.expunge_after.is_zero() {
            return Err(ReaperError::InvalidExpiry);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protect_accumulates() {
        let config = Config::new(Duration::from_secs(1))
            .protect(["a"])
            .protect(vec![String::from("b"), String::from("c")]);
        assert_eq!(config.protect, ["a", "b", "c"]);
    }

    #[test]
    fn zero_expiry_is_rejected() {
        assert!(matches!(
            Config::new(Duration::ZERO).validate(),
            Err(ReaperError::InvalidExpiry)
        ));
        assert!(Config::new(Duration::from_nanos(1)).validate().is_ok());
    }
}

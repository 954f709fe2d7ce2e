use std::time::Duration;

/// Counters for a finished walk.
///
/// Available from [`Reaper::stats`](crate::Reaper::stats) once
/// [`Reaper::advance`](crate::Reaper::advance) has returned `false`. A
/// cancelled walk reports what it saw before stopping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Non-directory entries visited (matched or not).
    pub files: usize,

    /// Directories visited, the root included.
    pub dirs: usize,

    /// Candidates handed to the consumer.
    pub candidates: usize,

    /// Traversal errors recorded. Only the last one is kept as the
    /// terminal error.
    pub errors: usize,

    /// Wall-clock time the walker ran for.
    pub duration: Duration,

    /// Entries visited per second, clamped to 0 on zero-duration runs.
    pub entries_per_sec: usize,
}

impl ScanStats {
    pub(crate) fn compute(
        files: usize,
        dirs: usize,
        candidates: usize,
        errors: usize,
        duration: Duration,
    ) -> Self {
        let total = files + dirs;
        let eps = if duration.as_secs_f64() > 0.0 {
            (total as f64 / duration.as_secs_f64()) as usize
        } else {
            0
        };
        Self {
            files,
            dirs,
            candidates,
            errors,
            duration,
            entries_per_sec: eps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_zero_without_elapsed_time() {
        let stats = ScanStats::compute(3, 1, 1, 0, Duration::ZERO);
        assert_eq!(stats.entries_per_sec, 0);

        let stats = ScanStats::compute(3, 1, 1, 0, Duration::from_secs(2));
        assert_eq!(stats.entries_per_sec, 2);
    }
}

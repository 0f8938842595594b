//! RAII timing of convergence phases.

use std::time::{Duration, Instant};

use tracing::trace;

/// Adds the time between creation and drop to `slot`.
///
/// ```rust,ignore
/// let mut fetch = Duration::ZERO;
/// {
///     let _timer = PhaseTimer::new("fetch", &mut fetch);
///     directory.fetch_acl(&target)?;
/// }
/// ```
pub(crate) struct PhaseTimer<'a> {
    phase: &'static str,
    start: Instant,
    slot: &'a mut Duration,
}

impl<'a> PhaseTimer<'a> {
    pub(crate) fn new(phase: &'static str, slot: &'a mut Duration) -> Self {
        Self {
            phase,
            start: Instant::now(),
            slot,
        }
    }
}

impl Drop for PhaseTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        *self.slot += elapsed;
        trace!(event = "Timer", phase = self.phase, elapsed_us = elapsed.as_micros() as u64);
    }
}

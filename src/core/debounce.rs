use std::time::{Duration, Instant};

/// Quiescence window for snapshot saves; rapid edits inside the window
/// collapse into one write.
pub const SAVE_QUIESCENCE: Duration = Duration::from_millis(400);

/// Coalesces bursts of change signals into a single due event.
///
/// Each signal restarts the window, so a newer signal supersedes an older
/// one that has not fired yet. The caller polls [`Debouncer::take_ready`]
/// with its own notion of "now", which keeps scheduling deterministic in
/// tests.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending_since: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending_since: None,
        }
    }

    pub fn signal(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Consumes the pending signal once the window has elapsed.
    pub fn take_ready(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.duration_since(since) >= self.window => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.pending_since = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_after_the_window_elapses() {
        let mut debouncer = Debouncer::new(Duration::from_millis(400));
        let start = Instant::now();
        debouncer.signal(start);
        assert!(!debouncer.take_ready(start + Duration::from_millis(100)));
        assert!(debouncer.take_ready(start + Duration::from_millis(400)));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn newer_signal_supersedes_older_one() {
        let mut debouncer = Debouncer::new(Duration::from_millis(400));
        let start = Instant::now();
        debouncer.signal(start);
        debouncer.signal(start + Duration::from_millis(300));
        assert!(!debouncer.take_ready(start + Duration::from_millis(500)));
        assert!(debouncer.take_ready(start + Duration::from_millis(700)));
    }

    #[test]
    fn idle_debouncer_never_fires() {
        let mut debouncer = Debouncer::new(Duration::from_millis(400));
        assert!(!debouncer.take_ready(Instant::now()));
    }
}

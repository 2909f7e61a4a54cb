//! Request sequencing and debouncing.
//!
//! There is no way to cancel an in-flight model call, so every request takes
//! a [`Ticket`] and its answer is only applied while that ticket is still the
//! newest one issued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A position in the request sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Monotonic generation counter; last write wins.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier ticket.
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether no newer ticket has been issued since `ticket`.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Waits out a quiet window and lets only the newest caller through.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    sequencer: Arc<RequestSequencer>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            sequencer: Arc::new(RequestSequencer::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Sleep for the window; `None` if a newer call arrived meanwhile.
    ///
    /// The returned ticket can be checked again once the debounced work
    /// finishes, to drop results that a later call has overtaken.
    pub async fn settle(&self) -> Option<Ticket> {
        let ticket = self.sequencer.issue();
        tokio::time::sleep(self.window).await;
        if self.sequencer.is_current(ticket) {
            Some(ticket)
        } else {
            tracing::debug!("Debounced call {} superseded", ticket.id());
            None
        }
    }

    /// Whether `ticket` is still the newest call.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.sequencer.is_current(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequencer_last_write_wins() {
        let sequencer = RequestSequencer::new();
        let first = sequencer.issue();
        assert!(sequencer.is_current(first));

        let second = sequencer.issue();
        assert!(!sequencer.is_current(first));
        assert!(sequencer.is_current(second));
        assert!(second > first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_releases_only_newest() {
        let debouncer = Debouncer::new(Duration::from_secs(2));

        let early = {
            let debouncer = debouncer.clone();
            tokio::spawn(async move { debouncer.settle().await })
        };
        tokio::time::sleep(Duration::from_millis(500)).await;
        let late = {
            let debouncer = debouncer.clone();
            tokio::spawn(async move { debouncer.settle().await })
        };

        assert_eq!(early.await.unwrap(), None);
        let ticket = late.await.unwrap().expect("newest call goes through");
        assert!(debouncer.is_current(ticket));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_waits_full_window() {
        let debouncer = Debouncer::new(Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        assert!(debouncer.settle().await.is_some());
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}

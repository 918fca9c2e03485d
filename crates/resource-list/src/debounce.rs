//! # Debounced Search Gate
//!
//! Typing in the search box produces a burst of text changes. The gate turns each
//! burst into at most one fetch:
//!
//! - Non-empty text (re)arms a single timer. Only the latest text survives.
//! - Empty or whitespace-only text cancels any pending timer and asks for an
//!   immediate fetch, so clearing the box feels instant.
//!
//! The gate does not own a task. It exposes its [`deadline`](SearchGate::deadline)
//! and the owning [`ResourceListController`](crate::controller::ResourceListController)
//! sleeps until it inside its event loop, so the timer lives and dies with the
//! controller.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Quiet period before a typed search is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// What the caller must do after a text change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Fetch page 1 right away with an empty search.
    FetchNow,
    /// Wait; the gate fires at `deadline` unless superseded.
    Scheduled { deadline: Instant },
}

#[derive(Debug)]
struct PendingSearch {
    text: String,
    deadline: Instant,
}

/// Coalesces search-text changes into delayed fetches.
#[derive(Debug)]
pub struct SearchGate {
    delay: Duration,
    pending: Option<PendingSearch>,
}

impl SearchGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn on_search_text_changed(&mut self, text: &str, now: Instant) -> GateDecision {
        let text = text.trim();
        if text.is_empty() {
            if self.cancel() {
                debug!("Pending search cancelled by clear");
            }
            return GateDecision::FetchNow;
        }
        let deadline = now + self.delay;
        if let Some(previous) = self.pending.replace(PendingSearch {
            text: text.to_string(),
            deadline,
        }) {
            debug!(superseded = %previous.text, search = text, "Search timer restarted");
        }
        GateDecision::Scheduled { deadline }
    }

    /// Deadline of the live timer, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Takes the pending text once its deadline has passed.
    pub fn fire(&mut self, now: Instant) -> Option<String> {
        if self.pending.as_ref().is_some_and(|p| p.deadline <= now) {
            self.pending.take().map(|p| p.text)
        } else {
            None
        }
    }

    /// Drops the live timer. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}

impl Default for SearchGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_keeps_only_latest_text() {
        let start = Instant::now();
        let mut gate = SearchGate::default();

        gate.on_search_text_changed("a", start);
        gate.on_search_text_changed("ab", start + Duration::from_millis(100));
        let decision = gate.on_search_text_changed("abc", start + Duration::from_millis(200));

        let deadline = start + Duration::from_millis(700);
        assert_eq!(decision, GateDecision::Scheduled { deadline });
        assert_eq!(gate.deadline(), Some(deadline));
        assert_eq!(gate.fire(start + Duration::from_millis(699)), None);
        assert_eq!(gate.fire(deadline), Some("abc".to_string()));
        assert_eq!(gate.fire(deadline), None);
        assert_eq!(gate.deadline(), None);
    }

    #[test]
    fn clearing_is_immediate_and_cancels_timer() {
        let now = Instant::now();
        let mut gate = SearchGate::default();
        gate.on_search_text_changed("hiper", now);

        assert_eq!(gate.on_search_text_changed("   ", now), GateDecision::FetchNow);
        assert_eq!(gate.deadline(), None);
        assert_eq!(gate.fire(now + Duration::from_secs(1)), None);
    }

    #[test]
    fn text_is_trimmed() {
        let now = Instant::now();
        let mut gate = SearchGate::new(Duration::from_millis(10));
        gate.on_search_text_changed("  asma ", now);
        assert_eq!(gate.fire(now + Duration::from_millis(10)), Some("asma".to_string()));
    }
}

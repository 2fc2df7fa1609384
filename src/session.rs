//! Latest-result-wins holder for analysis responses.
//!
//! Every trigger takes a [`Ticket`] before its request goes out. Responses
//! may arrive in any order; only a response whose ticket is newer than the
//! one currently displayed replaces it. Pending requests are never cancelled,
//! their late results are simply dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tracing::debug;

use crate::analysis::{project, AnalysisResult, Projection};

/// True when `text` is long enough to be worth sending (strictly more than
/// `min_len` characters).
pub fn should_analyze(text: &str, min_len: usize) -> bool {
    text.chars().count() > min_len
}

/// Sequence number handed out by [`AnalysisSession::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    result: Option<AnalysisResult>,
}

#[derive(Debug, Default)]
pub struct AnalysisSession {
    next: AtomicU64,
    slot: Mutex<Slot>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the ticket for a new request. Tickets start at 1.
    pub fn begin(&self) -> Ticket {
        Ticket(self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Store `result` unless a newer ticket already completed.
    ///
    /// Returns whether the result was accepted.
    pub fn complete(&self, ticket: Ticket, result: AnalysisResult) -> bool {
        self.complete_then(ticket, result, |_| {})
    }

    /// Like [`complete`](Self::complete), but when the result is accepted
    /// `on_accept` receives its projection while the slot is still locked.
    /// Output written from `on_accept` therefore appears in ticket order and
    /// exactly once per accepted result.
    pub fn complete_then<F>(&self, ticket: Ticket, result: AnalysisResult, on_accept: F) -> bool
    where
        F: FnOnce(&Projection),
    {
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if ticket.0 <= slot.generation {
            debug!(
                ticket = ticket.0,
                current = slot.generation,
                "dropping stale analysis result"
            );
            return false;
        }
        on_accept(&project(Some(&result)));
        slot.generation = ticket.0;
        slot.result = Some(result);
        true
    }

    /// Generation of the result currently held (0 before the first).
    pub fn current_generation(&self) -> u64 {
        self.slot.lock().map(|s| s.generation).unwrap_or(0)
    }

    pub fn latest(&self) -> Option<AnalysisResult> {
        self.slot.lock().ok().and_then(|s| s.result.clone())
    }

    /// Projection of the latest result; empty when nothing arrived yet.
    pub fn projection(&self) -> Projection {
        project(self.latest().as_ref())
    }
}

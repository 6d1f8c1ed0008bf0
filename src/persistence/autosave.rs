//! Save state machine for one editing session.
//!
//! `Clean -> Dirty` on every mutation, `Dirty -> Saving` on an explicit save
//! or when the inactivity deadline passes, then back to `Clean` or, when the
//! write fails, to `Dirty` with the deadline re-armed. Only one save is ever
//! in flight; requests made meanwhile are coalesced into a single follow-up.

use std::time::{Duration, Instant};

pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_secs(30);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SaveState {
    Clean,
    Dirty,
    Saving,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SaveTrigger {
    Auto,
    Manual,
}

/// Handed out by [`SaveTracker::begin`] and returned on completion so the
/// tracker knows which revision reached the store.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SaveTicket {
    pub revision: u64,
    pub trigger: SaveTrigger,
}

#[derive(Clone, Debug)]
pub struct SaveTracker {
    delay: Duration,
    revision: u64,
    saved_revision: u64,
    deadline: Option<Instant>,
    in_flight: Option<SaveTicket>,
    queued: Option<SaveTrigger>,
}

impl Default for SaveTracker {
    fn default() -> Self { Self::new(DEFAULT_AUTOSAVE_DELAY) }
}

impl SaveTracker {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            revision: 0,
            saved_revision: 0,
            deadline: None,
            in_flight: None,
            queued: None,
        }
    }

    pub fn state(&self) -> SaveState {
        if self.in_flight.is_some() {
            SaveState::Saving
        } else if self.is_dirty() {
            SaveState::Dirty
        } else {
            SaveState::Clean
        }
    }

    pub fn is_dirty(&self) -> bool { self.revision != self.saved_revision }
    pub fn is_saving(&self) -> bool { self.in_flight.is_some() }
    pub fn deadline(&self) -> Option<Instant> { self.deadline }
    pub fn delay(&self) -> Duration { self.delay }
    pub fn revision(&self) -> u64 { self.revision }

    // Every mutation lands here; the single deadline is replaced, never stacked
    pub fn mark_dirty(&mut self, now: Instant) {
        self.revision += 1;
        self.deadline = Some(now + self.delay);
    }

    /// Start a save of the current revision. Returns `None` when a save is
    /// already in flight (the request is queued) or when an auto-save finds
    /// nothing to write.
    pub fn begin(&mut self, trigger: SaveTrigger) -> Option<SaveTicket> {
        if self.in_flight.is_some() {
            self.queued = self.queued.max(Some(trigger));
            return None;
        }
        if trigger == SaveTrigger::Auto && !self.is_dirty() {
            self.deadline = None;
            return None;
        }
        self.deadline = None;
        let ticket = SaveTicket { revision: self.revision, trigger };
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Record the outcome of `ticket`'s write. Returns the queued follow-up
    /// trigger, if any, which the caller should start next.
    pub fn complete(&mut self, ticket: SaveTicket, ok: bool, now: Instant) -> Option<SaveTrigger> {
        if self.in_flight != Some(ticket) {
            return None;
        }
        self.in_flight = None;
        if ok {
            // edits made while saving keep the tracker dirty
            self.saved_revision = self.saved_revision.max(ticket.revision);
        } else if self.deadline.is_none() {
            self.deadline = Some(now + self.delay);
        }
        let next = self.queued.take();
        match next {
            Some(SaveTrigger::Auto) if !self.is_dirty() => None,
            other => other,
        }
    }

    /// True once the inactivity deadline has passed with unsaved edits and
    /// nothing in flight.
    pub fn is_due(&self, now: Instant) -> bool {
        self.in_flight.is_none()
            && self.is_dirty()
            && self.deadline.is_some_and(|d| now >= d)
    }

    // A freshly loaded document is the saved baseline
    pub fn reset_clean(&mut self) {
        self.saved_revision = self.revision;
        self.deadline = None;
        self.queued = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration { Duration::from_secs(n) }

    #[test]
    fn clean_dirty_saving_clean() {
        let t0 = Instant::now();
        let mut tr = SaveTracker::default();
        assert_eq!(tr.state(), SaveState::Clean);
        tr.mark_dirty(t0);
        assert_eq!(tr.state(), SaveState::Dirty);
        let ticket = tr.begin(SaveTrigger::Manual).expect("ticket");
        assert_eq!(tr.state(), SaveState::Saving);
        assert!(tr.deadline().is_none());
        assert_eq!(tr.complete(ticket, true, t0), None);
        assert_eq!(tr.state(), SaveState::Clean);
    }

    #[test]
    fn deadline_restarts_on_each_edit() {
        let t0 = Instant::now();
        let mut tr = SaveTracker::default();
        tr.mark_dirty(t0);
        tr.mark_dirty(t0 + secs(20));
        assert!(!tr.is_due(t0 + secs(31)));
        assert!(tr.is_due(t0 + secs(50)));
    }

    #[test]
    fn failure_keeps_dirty_and_rearms() {
        let t0 = Instant::now();
        let mut tr = SaveTracker::default();
        tr.mark_dirty(t0);
        let ticket = tr.begin(SaveTrigger::Auto).expect("ticket");
        tr.complete(ticket, false, t0 + secs(31));
        assert_eq!(tr.state(), SaveState::Dirty);
        assert_eq!(tr.deadline(), Some(t0 + secs(61)));
        assert!(tr.is_due(t0 + secs(61)));
    }

    #[test]
    fn edits_during_save_stay_dirty() {
        let t0 = Instant::now();
        let mut tr = SaveTracker::default();
        tr.mark_dirty(t0);
        let ticket = tr.begin(SaveTrigger::Manual).expect("ticket");
        tr.mark_dirty(t0 + secs(1));
        tr.complete(ticket, true, t0 + secs(2));
        assert_eq!(tr.state(), SaveState::Dirty);
        assert!(tr.is_due(t0 + secs(31)));
    }

    #[test]
    fn overlapping_requests_are_queued_and_coalesced() {
        let t0 = Instant::now();
        let mut tr = SaveTracker::default();
        tr.mark_dirty(t0);
        let first = tr.begin(SaveTrigger::Auto).expect("ticket");
        tr.mark_dirty(t0 + secs(1));
        assert!(tr.begin(SaveTrigger::Auto).is_none());
        assert!(tr.begin(SaveTrigger::Manual).is_none());
        assert_eq!(tr.complete(first, true, t0 + secs(2)), Some(SaveTrigger::Manual));
        let second = tr.begin(SaveTrigger::Manual).expect("follow-up");
        assert_eq!(second.revision, 2);
        tr.complete(second, true, t0 + secs(3));
        assert_eq!(tr.state(), SaveState::Clean);
    }

    #[test]
    fn stale_completion_is_ignored() {
        let t0 = Instant::now();
        let mut tr = SaveTracker::default();
        tr.mark_dirty(t0);
        let ticket = tr.begin(SaveTrigger::Manual).expect("ticket");
        tr.complete(ticket, true, t0);
        tr.mark_dirty(t0);
        assert_eq!(tr.complete(ticket, true, t0), None);
        assert_eq!(tr.state(), SaveState::Dirty);
    }

    #[test]
    fn auto_save_when_clean_is_skipped() {
        let mut tr = SaveTracker::default();
        assert!(tr.begin(SaveTrigger::Auto).is_none());
        assert!(tr.begin(SaveTrigger::Manual).is_some());
    }
}

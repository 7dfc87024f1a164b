//! Drill session - single owner of a filter stack with ordered change events
//!
//! Every mutation bumps a sequence number and is broadcast to subscribers
//! over `std::sync::mpsc`. A second view (another window, another process
//! behind some transport) keeps in sync by applying snapshots; snapshots
//! that are not newer than the local state are rejected.

use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};

use crate::analysis::descriptive::SpecLimits;
use crate::analysis::drill::{compute_drill_path, DrillPath};
use crate::core::data::{DataRow, Dataset};
use crate::core::filter::{apply_filters, FilterAction};

/// The filter stack at a given sequence number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSnapshot {
    pub sequence: u64,
    pub stack: Vec<FilterAction>,
}

/// Notifications sent to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StackChanged(StackSnapshot),
    OutcomeChanged { sequence: u64, outcome: String },
}

impl SessionEvent {
    pub fn sequence(&self) -> u64 {
        match self {
            SessionEvent::StackChanged(s) => s.sequence,
            SessionEvent::OutcomeChanged { sequence, .. } => *sequence,
        }
    }
}

pub struct DrillSession {
    dataset: Dataset,
    outcome: String,
    specs: Option<SpecLimits>,
    stack: Vec<FilterAction>,
    sequence: u64,
    subscribers: Vec<Sender<SessionEvent>>,
}

impl DrillSession {
    pub fn new(dataset: Dataset, outcome: impl Into<String>, specs: Option<SpecLimits>) -> Self {
        Self {
            dataset,
            outcome: outcome.into(),
            specs,
            stack: Vec::new(),
            sequence: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn outcome(&self) -> &str {
        &self.outcome
    }

    pub fn stack(&self) -> &[FilterAction] {
        &self.stack
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Register a new listener; it sees every change from now on
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, event: SessionEvent) {
        // Receivers that were dropped are forgotten
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn stack_changed(&mut self) {
        self.sequence += 1;
        let snapshot = self.snapshot();
        tracing::debug!(sequence = snapshot.sequence, depth = snapshot.stack.len(), "filter stack changed");
        self.publish(SessionEvent::StackChanged(snapshot));
    }

    /// Current stack with its sequence number
    pub fn snapshot(&self) -> StackSnapshot {
        StackSnapshot {
            sequence: self.sequence,
            stack: self.stack.clone(),
        }
    }

    /// Push a factor filter and return its id
    pub fn push_filter(&mut self, action: FilterAction) -> String {
        let id = action.id().to_string();
        self.stack.push(action);
        self.stack_changed();
        id
    }

    /// Convenience for `push_filter(FilterAction::filter(..))`
    pub fn drill_into<I, V>(&mut self, factor: &str, values: I) -> String
    where
        I: IntoIterator<Item = V>,
        V: Into<crate::core::data::CellValue>,
    {
        self.push_filter(FilterAction::filter(factor, values))
    }

    /// Highlight one row; does not change the filtered rows
    pub fn push_highlight(&mut self, row_index: usize) -> Option<String> {
        let values = self.dataset.rows.get(row_index)?.clone();
        let action = FilterAction::highlight(row_index, values);
        let id = action.id().to_string();
        self.stack.push(action);
        self.stack_changed();
        Some(id)
    }

    /// Remove the most recent action
    pub fn pop(&mut self) -> Option<FilterAction> {
        let action = self.stack.pop()?;
        self.stack_changed();
        Some(action)
    }

    /// Remove an action and everything pushed after it (breadcrumb navigation)
    pub fn truncate_to(&mut self, id: &str) -> bool {
        match self.stack.iter().position(|a| a.id() == id) {
            Some(pos) => {
                self.stack.truncate(pos);
                self.stack_changed();
                true
            }
            None => false,
        }
    }

    /// Remove a single action by id
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.stack.len();
        self.stack.retain(|a| a.id() != id);
        if self.stack.len() == before {
            return false;
        }
        self.stack_changed();
        true
    }

    pub fn clear(&mut self) {
        if self.stack.is_empty() {
            return;
        }
        self.stack.clear();
        self.stack_changed();
    }

    /// Switch the outcome column; the filter stack is kept
    pub fn set_outcome(&mut self, outcome: impl Into<String>) {
        self.outcome = outcome.into();
        self.sequence += 1;
        let event = SessionEvent::OutcomeChanged {
            sequence: self.sequence,
            outcome: self.outcome.clone(),
        };
        self.publish(event);
    }

    /// Apply a snapshot from another view if it is newer than ours
    pub fn apply_remote(&mut self, snapshot: StackSnapshot) -> bool {
        if snapshot.sequence <= self.sequence {
            tracing::debug!(
                remote = snapshot.sequence,
                local = self.sequence,
                "ignoring stale snapshot"
            );
            return false;
        }
        self.stack = snapshot.stack;
        self.sequence = snapshot.sequence;
        let snapshot = self.snapshot();
        self.publish(SessionEvent::StackChanged(snapshot));
        true
    }

    /// Rows that pass the current filters
    pub fn filtered_rows(&self) -> Vec<&DataRow> {
        apply_filters(&self.dataset.rows, &self.stack)
    }

    /// Recompute the drill path for the current state
    pub fn drill_path(&self) -> DrillPath {
        compute_drill_path(
            &self.dataset.rows,
            &self.stack,
            &self.outcome,
            self.specs.as_ref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> DrillSession {
        let csv = "Machine,Shift,Weight\n\
                   A,Morning,10\nA,Afternoon,11\nA,Morning,10\nA,Afternoon,11\n\
                   B,Morning,14\nB,Afternoon,15\nB,Morning,14\nB,Afternoon,15\n";
        let ds = Dataset::from_reader(csv.as_bytes()).unwrap();
        DrillSession::new(ds, "Weight", None)
    }

    #[test]
    fn test_events_arrive_in_order() {
        let mut s = session();
        let rx = s.subscribe();
        s.drill_into("Machine", ["A"]);
        s.drill_into("Shift", ["Morning"]);
        s.pop();

        let seqs: Vec<u64> = rx.try_iter().map(|e| e.sequence()).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(s.stack().len(), 1);
    }

    #[test]
    fn test_drill_path_follows_stack() {
        let mut s = session();
        assert!(s.drill_path().is_empty());
        s.drill_into("Machine", ["A"]);
        let path = s.drill_path();
        assert_eq!(path.steps.len(), 1);
        assert_eq!(path.steps[0].count_after, 4);
        assert_eq!(s.filtered_rows().len(), 4);
    }

    #[test]
    fn test_highlight_does_not_filter() {
        let mut s = session();
        assert!(s.push_highlight(3).is_some());
        assert!(s.push_highlight(99).is_none());
        assert_eq!(s.filtered_rows().len(), 8);
        assert!(s.drill_path().is_empty());
    }

    #[test]
    fn test_stale_remote_snapshot_rejected() {
        let mut a = session();
        let mut b = session();
        a.drill_into("Machine", ["B"]);
        assert!(b.apply_remote(a.snapshot()));
        assert_eq!(b.stack(), a.stack());

        // same sequence again is not newer
        assert!(!b.apply_remote(a.snapshot()));

        b.drill_into("Shift", ["Morning"]);
        let stale = StackSnapshot {
            sequence: 1,
            stack: vec![],
        };
        assert!(!b.apply_remote(stale));
        assert_eq!(b.stack().len(), 2);
    }

    #[test]
    fn test_dropped_subscriber_is_removed() {
        let mut s = session();
        let rx = s.subscribe();
        drop(rx);
        let live = s.subscribe();
        s.drill_into("Machine", ["A"]);
        assert_eq!(s.subscribers.len(), 1);
        assert_eq!(live.try_iter().count(), 1);
    }

    #[test]
    fn test_truncate_and_remove() {
        let mut s = session();
        let first = s.drill_into("Machine", ["A"]);
        let second = s.drill_into("Shift", ["Morning"]);
        assert!(s.remove(&second));
        assert!(!s.remove(&second));
        s.drill_into("Shift", ["Afternoon"]);
        assert!(s.truncate_to(&first));
        assert!(s.stack().is_empty());
        s.clear();
        assert_eq!(s.sequence(), 5);
    }

    #[test]
    fn test_outcome_change_event() {
        let mut s = session();
        let rx = s.subscribe();
        s.set_outcome("Shift");
        let event = rx.try_recv().unwrap();
        assert_eq!(
            event,
            SessionEvent::OutcomeChanged {
                sequence: 1,
                outcome: "Shift".into()
            }
        );
    }
}

//! Scheduled removals keyed by task id.
//!
//! A completed or deleted task stays visible for a short transition before it
//! leaves the list. Each pending removal is an entry here with a due instant;
//! the coordinator applies the due ones when driven, and tests can take them
//! all at once without waiting on a clock.

use crate::store::TaskId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Why a task is scheduled to leave the list.
///
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TransitionKind {
    Complete,
    Delete,
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    kind: TransitionKind,
    due: Instant,
}

/// Pending delayed removals.
///
#[derive(Debug, Default)]
pub struct Transitions {
    pending: HashMap<TaskId, Scheduled>,
}

impl Transitions {
    pub fn new() -> Self {
        Transitions::default()
    }

    /// Schedule a removal relative to `now`. Rescheduling an id replaces its
    /// earlier entry.
    ///
    pub fn schedule(&mut self, id: TaskId, kind: TransitionKind, now: Instant, delay: Duration) {
        self.pending.insert(
            id,
            Scheduled {
                kind,
                due: now + delay,
            },
        );
    }

    /// Drop a scheduled removal. Returns whether one existed.
    ///
    pub fn cancel(&mut self, id: &TaskId) -> bool {
        self.pending.remove(id).is_some()
    }

    pub fn is_scheduled(&self, id: &TaskId) -> bool {
        self.pending.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest due instant, for drivers that sleep until the next removal.
    ///
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.values().map(|s| s.due).min()
    }

    /// Remove and return every entry due at or before `now`, earliest first.
    ///
    pub fn take_due(&mut self, now: Instant) -> Vec<(TaskId, TransitionKind)> {
        let mut due: Vec<(TaskId, Scheduled)> = self
            .pending
            .iter()
            .filter(|(_, s)| s.due <= now)
            .map(|(id, s)| (id.clone(), *s))
            .collect();
        for (id, _) in &due {
            self.pending.remove(id);
        }
        due.sort_by_key(|(_, s)| s.due);
        due.into_iter().map(|(id, s)| (id, s.kind)).collect()
    }

    /// Remove and return every entry regardless of its due instant.
    ///
    pub fn take_all(&mut self) -> Vec<(TaskId, TransitionKind)> {
        let mut all: Vec<(TaskId, Scheduled)> = self.pending.drain().collect();
        all.sort_by_key(|(_, s)| s.due);
        all.into_iter().map(|(id, s)| (id, s.kind)).collect()
    }

    /// Keep only the entries whose id satisfies `keep`.
    ///
    pub fn retain(&mut self, mut keep: impl FnMut(&TaskId) -> bool) {
        self.pending.retain(|id, _| keep(id));
    }
}

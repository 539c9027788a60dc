//! Navigation-related state types.
//!
//! This module contains the load phase, the transient task marks and the
//! selection cursor state machine over the filtered view.

use super::task_list::TaskList;
use crate::store::Task;

/// Specifying what the dashboard should currently show.
///
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Phase {
    NeedsSetup,
    Loading,
    Ready,
    Failed(String),
}

/// Specifying the removal a task is visually waiting for.
///
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mark {
    Completing,
    Deleting,
}

impl TaskList {
    /// Move the cursor down, stopping at the last visible task.
    ///
    pub fn move_next(&mut self) -> &mut Self {
        let len = self.filtered_len();
        if len == 0 {
            return self;
        }
        self.selection = Some(match self.selection {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        });
        self
    }

    /// Move the cursor up, stopping at the first visible task.
    ///
    pub fn move_previous(&mut self) -> &mut Self {
        if self.filtered_len() == 0 {
            return self;
        }
        self.selection = Some(match self.selection {
            Some(i) => i.saturating_sub(1),
            None => 0,
        });
        self
    }

    pub fn clear_selection(&mut self) -> &mut Self {
        self.selection = None;
        self
    }

    /// Resolve the cursor against the current filtered view.
    ///
    pub fn selected_task(&self) -> Option<&Task> {
        let index = self.selection?;
        self.filtered_view().get(index).copied()
    }

    /// Return the cursor as a signed index where -1 means no selection.
    ///
    pub fn selection_index(&self) -> isize {
        self.selection.map(|i| i as isize).unwrap_or(-1)
    }
}

//! Session state management module.
//!
//! This module contains the in-memory side of the sync engine:
//! - `TaskList`, the ordered tasks with filter and selection cursor
//! - Navigation types (Phase, Mark) and the cursor state machine
//! - `Transitions`, the delayed-removal scheduler
//! - Main `State` struct tying them together for one session
//! - State error handling

mod error;
mod navigation;
mod state_impl;
mod task_list;
mod transitions;

pub use error::StateError;
pub use navigation::{Mark, Phase};
pub use state_impl::{
    Notification, NotificationLevel, Row, State, StatsView, MAX_DIAGNOSTICS,
};
pub use task_list::TaskList;
pub use transitions::{TransitionKind, Transitions};

use std::sync::Arc;
use tokio::sync::Mutex;

/// Session state shared between the coordinator and the presentation layer.
///
pub type SharedState = Arc<Mutex<State>>;

//! Optimistic task synchronization for the focus dashboard.
//!
//! The session keeps an in-memory task list consistent with a remote task
//! store while every add, complete, delete and filter is reflected at once.

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod logger;
pub mod state;
pub mod store;
pub mod ui;

//! Event handling module.
//!
//! This module contains handlers for different types of events:
//! - Network events: optimistic task mutations confirmed against the store
//! - Input intents: cursor moves, filter changes and actions on the selection

pub mod input;
pub mod network;

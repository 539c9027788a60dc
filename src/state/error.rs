//! State management-specific error types.

use crate::store::TaskId;

/// Errors that can occur during state operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// Task not found in state
    #[error("Task not found: {id}")]
    TaskNotFound { id: TaskId },

    /// Provisional task was removed before its confirmation arrived
    #[error("Provisional task {id} is no longer present")]
    ProvisionalMissing { id: TaskId },

    /// Only provisional tasks may be inserted optimistically
    #[error("Task {id} is not provisional")]
    NotProvisional { id: TaskId },

    /// Task ids must be unique within the list
    #[error("Duplicate task id: {id}")]
    DuplicateId { id: TaskId },
}

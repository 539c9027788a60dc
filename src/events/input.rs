use super::network::{Detached, Handler as Coordinator};
use crate::error::AppResult;
use crate::state::SharedState;
use crate::store::{AreaFilter, TaskId};
use log::*;

/// Specify different user intent types.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    MoveNext,
    MovePrevious,
    CompleteSelected,
    DeleteSelected,
    ClearSelection,
    SetFilter(AreaFilter),
    Reload,
}

/// Translates user intents into cursor moves and coordinator actions. The
/// cursor always refers to the filtered view.
///
#[derive(Clone)]
pub struct Navigator {
    state: SharedState,
    coordinator: Coordinator,
}

impl Navigator {
    pub fn new(coordinator: Coordinator) -> Self {
        Navigator {
            state: coordinator.state().clone(),
            coordinator,
        }
    }

    /// Handle a user intent. Completion hands back its detached store call.
    ///
    pub async fn handle(&self, intent: Intent) -> AppResult<Option<Detached>> {
        debug!("Processing intent '{:?}'...", intent);
        match intent {
            Intent::MoveNext => {
                self.state.lock().await.tasks_mut().move_next();
            }
            Intent::MovePrevious => {
                self.state.lock().await.tasks_mut().move_previous();
            }
            Intent::ClearSelection => {
                self.state.lock().await.tasks_mut().clear_selection();
            }
            Intent::SetFilter(filter) => {
                info!("Showing tasks in {}", filter);
                self.state.lock().await.tasks_mut().set_filter(filter);
            }
            Intent::CompleteSelected => {
                if let Some(id) = self.selected_id().await {
                    return Ok(self.coordinator.complete_task(&id).await);
                }
            }
            Intent::DeleteSelected => {
                if let Some(id) = self.selected_id().await {
                    self.coordinator.delete_task(&id).await?;
                }
            }
            Intent::Reload => self.coordinator.load().await?,
        }
        Ok(None)
    }

    async fn selected_id(&self) -> Option<TaskId> {
        let state = self.state.lock().await;
        let id = state.tasks().selected_task().map(|task| task.id.clone());
        if id.is_none() {
            debug!("No task selected, ignoring");
        }
        id
    }
}

//! The canonical in-memory task collection.
//!
//! `TaskList` owns the ordered tasks, the active area filter and the
//! selection cursor into the filtered view. It performs no I/O; the
//! coordinator and navigator are its only mutators.

use super::error::StateError;
use crate::store::{AreaFilter, Task, TaskId};
use log::*;
use std::collections::HashSet;

/// Ordered tasks, newest first, plus filter and cursor.
///
#[derive(Clone, Debug, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
    filter: AreaFilter,
    pub(super) selection: Option<usize>,
}

impl TaskList {
    pub fn new() -> Self {
        TaskList::default()
    }

    /// Return every task in list order.
    ///
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    pub fn filter(&self) -> &AreaFilter {
        &self.filter
    }

    /// Return the cursor into the filtered view, if any.
    ///
    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    /// Replace the whole list after a full reload. Clears the selection.
    ///
    pub fn replace_all(&mut self, tasks: Vec<Task>) -> &mut Self {
        let mut seen = HashSet::with_capacity(tasks.len());
        let mut unique: Vec<Task> = Vec::with_capacity(tasks.len());
        for task in tasks {
            if !seen.insert(task.id.clone()) {
                warn!("Dropping duplicate task {} from reload", task.id);
                continue;
            }
            unique.push(task);
        }
        self.tasks = unique;
        self.selection = None;
        self
    }

    /// Prepend a task that has not been confirmed by the store yet.
    ///
    pub fn insert_provisional(&mut self, task: Task) -> Result<&mut Self, StateError> {
        if !task.is_provisional() {
            return Err(StateError::NotProvisional { id: task.id });
        }
        if self.contains(&task.id) {
            return Err(StateError::DuplicateId { id: task.id });
        }
        self.tasks.insert(0, task);
        self.clamp_selection();
        Ok(self)
    }

    /// Swap a provisional entry for its confirmed version in place.
    ///
    pub fn confirm_provisional(
        &mut self,
        provisional_id: &TaskId,
        confirmed: Task,
    ) -> Result<&mut Self, StateError> {
        let index = match self.position(provisional_id) {
            Some(index) => index,
            None => {
                debug!(
                    "Confirmation for {} arrived after it was removed",
                    provisional_id
                );
                return Err(StateError::ProvisionalMissing {
                    id: provisional_id.clone(),
                });
            }
        };
        if self.contains(&confirmed.id) {
            return Err(StateError::DuplicateId { id: confirmed.id });
        }
        self.tasks[index] = confirmed;
        self.clamp_selection();
        Ok(self)
    }

    /// Remove the task with the given id. Removing an absent id is a no-op.
    ///
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.position(id)?;
        let task = self.tasks.remove(index);
        self.clamp_selection();
        Some(task)
    }

    /// Change the active filter. Clears the selection.
    ///
    pub fn set_filter(&mut self, filter: AreaFilter) -> &mut Self {
        self.filter = filter;
        self.selection = None;
        self
    }

    /// Return the tasks matching the active filter in list order.
    ///
    pub fn filtered_view(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| self.filter.matches(&t.area))
            .collect()
    }

    pub fn filtered_len(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| self.filter.matches(&t.area))
            .count()
    }

    /// Keep the cursor inside the filtered view.
    ///
    pub(super) fn clamp_selection(&mut self) {
        if let Some(index) = self.selection {
            let len = self.filtered_len();
            self.selection = if len == 0 {
                None
            } else {
                Some(index.min(len - 1))
            };
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::{Area, TaskStatus};
    use fake::{Fake, Faker};

    pub(crate) fn durable(id: &str, area: Area) -> Task {
        Task {
            id: TaskId::durable(id),
            text: Faker.fake(),
            area,
            status: TaskStatus::Pending,
            carryover_count: 0,
        }
    }

    fn ids(list: &TaskList) -> Vec<String> {
        list.tasks().iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn replace_all_resets_selection() {
        let mut list = TaskList::new();
        list.replace_all(vec![durable("1", Area::work()), durable("2", Area::work())]);
        list.selection = Some(1);
        list.replace_all(vec![durable("3", Area::work())]);
        assert_eq!(ids(&list), vec!["3"]);
        assert_eq!(list.selection(), None);
    }

    #[test]
    fn replace_all_drops_duplicates() {
        let mut list = TaskList::new();
        list.replace_all(vec![durable("1", Area::work()), durable("1", Area::work())]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn insert_provisional_prepends() {
        let mut list = TaskList::new();
        list.replace_all(vec![durable("1", Area::work())]);
        list.insert_provisional(Task::provisional(1, "New", Area::work()))
            .unwrap();
        assert_eq!(ids(&list), vec!["temp-1", "1"]);
        assert!(list.tasks()[0].is_provisional());
    }

    #[test]
    fn insert_provisional_rejects_durable_and_duplicates() {
        let mut list = TaskList::new();
        assert_eq!(
            list.insert_provisional(durable("1", Area::work()))
                .unwrap_err(),
            StateError::NotProvisional {
                id: TaskId::durable("1")
            }
        );
        list.insert_provisional(Task::provisional(1, "a", Area::work()))
            .unwrap();
        assert!(matches!(
            list.insert_provisional(Task::provisional(1, "b", Area::work())),
            Err(StateError::DuplicateId { .. })
        ));
    }

    #[test]
    fn insert_provisional_keeps_selection_index() {
        let mut list = TaskList::new();
        list.replace_all(vec![durable("1", Area::work()), durable("2", Area::work())]);
        list.selection = Some(1);
        list.insert_provisional(Task::provisional(1, "New", Area::work()))
            .unwrap();
        assert_eq!(list.selection(), Some(1));
    }

    #[test]
    fn add_success_confirms_in_place() {
        let mut list = TaskList::new();
        list.insert_provisional(Task::provisional(1, "Buy milk", Area::work()))
            .unwrap();
        let confirmed = Task {
            id: TaskId::durable("42"),
            text: "Buy milk".to_string(),
            area: Area::work(),
            status: TaskStatus::Pending,
            carryover_count: 0,
        };
        list.confirm_provisional(&TaskId::Provisional(1), confirmed.clone())
            .unwrap();
        assert_eq!(list.tasks(), &[confirmed]);
        assert!(list.tasks().iter().all(|t| !t.is_provisional()));
    }

    #[test]
    fn confirm_preserves_order() {
        let mut list = TaskList::new();
        list.replace_all(vec![durable("1", Area::work())]);
        list.insert_provisional(Task::provisional(1, "a", Area::work()))
            .unwrap();
        list.insert_provisional(Task::provisional(2, "b", Area::work()))
            .unwrap();
        list.confirm_provisional(&TaskId::Provisional(1), durable("10", Area::work()))
            .unwrap();
        assert_eq!(ids(&list), vec!["temp-2", "10", "1"]);
    }

    #[test]
    fn confirm_after_removal_is_rejected() {
        let mut list = TaskList::new();
        list.insert_provisional(Task::provisional(1, "a", Area::work()))
            .unwrap();
        list.remove(&TaskId::Provisional(1));
        let result = list.confirm_provisional(&TaskId::Provisional(1), durable("42", Area::work()));
        assert_eq!(
            result.unwrap_err(),
            StateError::ProvisionalMissing {
                id: TaskId::Provisional(1)
            }
        );
        assert!(list.is_empty());
    }

    #[test]
    fn add_failure_rollback_leaves_list_empty() {
        let mut list = TaskList::new();
        list.insert_provisional(Task::provisional(1, "a", Area::work()))
            .unwrap();
        list.remove(&TaskId::Provisional(1));
        assert!(list.is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut list = TaskList::new();
        list.replace_all(vec![durable("1", Area::work()), durable("2", Area::work())]);
        list.selection = Some(1);
        assert!(list.remove(&TaskId::durable("2")).is_some());
        let once = (ids(&list), list.selection());
        assert!(list.remove(&TaskId::durable("2")).is_none());
        assert_eq!((ids(&list), list.selection()), once);
    }

    #[test]
    fn remove_reclamps_selection() {
        let mut list = TaskList::new();
        list.replace_all(vec![durable("1", Area::work()), durable("2", Area::work())]);
        list.selection = Some(1);
        list.remove(&TaskId::durable("2"));
        assert_eq!(list.selection(), Some(0));
        list.remove(&TaskId::durable("1"));
        assert_eq!(list.selection(), None);
    }

    #[test]
    fn filter_change_resets_selection() {
        let mut list = TaskList::new();
        list.replace_all(vec![
            durable("1", Area::work()),
            durable("2", Area::work()),
            durable("3", Area::work()),
        ]);
        list.selection = Some(2);
        list.set_filter(AreaFilter::Area(Area::side_project()));
        assert!(list.filtered_view().is_empty());
        assert_eq!(list.selection(), None);
    }

    #[test]
    fn filtered_view_preserves_order() {
        let mut list = TaskList::new();
        list.replace_all(vec![
            durable("1", Area::work()),
            durable("2", Area::side_project()),
            durable("3", Area::work()),
        ]);
        list.set_filter(AreaFilter::Area(Area::work()));
        let view: Vec<String> = list.filtered_view().iter().map(|t| t.id.to_string()).collect();
        assert_eq!(view, vec!["1", "3"]);
        list.set_filter(AreaFilter::All);
        assert_eq!(list.filtered_len(), 3);
    }
}

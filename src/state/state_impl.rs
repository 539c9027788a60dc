use super::navigation::{Mark, Phase};
use super::task_list::TaskList;
use super::transitions::{TransitionKind, Transitions};
use crate::store::{Area, Article, Stats, Task, TaskId};
use log::*;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

/// Upper bound on retained diagnostic entries.
///
pub const MAX_DIAGNOSTICS: usize = 50;

/// Severity of a transient notification.
///
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A short message for the presentation layer to show and dismiss.
///
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Where the displayed counters came from.
///
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StatsView {
    Remote(Stats),
    /// Store stats unavailable; pending is derived from the local list.
    Local { completed_today: usize },
}

impl Default for StatsView {
    fn default() -> Self {
        StatsView::Local { completed_today: 0 }
    }
}

/// One visible row of the filtered view.
///
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Row<'a> {
    pub task: &'a Task,
    pub mark: Option<Mark>,
    pub selected: bool,
}

/// Houses data representative of a dashboard session.
///
#[derive(Debug)]
pub struct State {
    tasks: TaskList,
    phase: Phase,
    marks: HashMap<TaskId, Mark>,
    transitions: Transitions,
    stats: StatsView,
    article: Option<Article>,
    notifications: VecDeque<Notification>,
    diagnostics: VecDeque<String>,
    superseded: HashMap<TaskId, TransitionKind>,
    completions_in_flight: HashSet<TaskId>,
    last_provisional: u64,
    default_area: Area,
}

/// Defines default session state.
///
impl Default for State {
    fn default() -> State {
        State {
            tasks: TaskList::new(),
            phase: Phase::Loading,
            marks: HashMap::new(),
            transitions: Transitions::new(),
            stats: StatsView::default(),
            article: None,
            notifications: VecDeque::new(),
            diagnostics: VecDeque::new(),
            superseded: HashMap::new(),
            completions_in_flight: HashSet::new(),
            last_provisional: 0,
            default_area: Area::default(),
        }
    }
}

impl State {
    pub fn new(default_area: Area) -> Self {
        State {
            default_area,
            ..State::default()
        }
    }

    /// Return the task list.
    ///
    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    /// Return the task list for mutation.
    ///
    pub fn tasks_mut(&mut self) -> &mut TaskList {
        &mut self.tasks
    }

    pub fn default_area(&self) -> &Area {
        &self.default_area
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn set_phase(&mut self, phase: Phase) -> &mut Self {
        debug!("Session phase is now {:?}", phase);
        self.phase = phase;
        self
    }

    /// Replace the list after a full reload. Unconfirmed tasks stay ahead
    /// of the reloaded ones, and tasks whose completion is still in flight
    /// are left out. Marks and pending removals survive for ids that are
    /// still listed.
    ///
    pub fn replace_tasks(&mut self, tasks: Vec<Task>) -> &mut Self {
        let unconfirmed: Vec<Task> = self
            .tasks
            .tasks()
            .iter()
            .filter(|t| t.is_provisional())
            .cloned()
            .collect();
        let completing = &self.completions_in_flight;
        let reloaded = tasks.into_iter().filter(|t| {
            let keep = !completing.contains(&t.id);
            if !keep {
                debug!("Reload still lists {}, completion is in flight", t.id);
            }
            keep
        });
        self.tasks
            .replace_all(unconfirmed.into_iter().chain(reloaded).collect());

        let tasks = &self.tasks;
        self.marks.retain(|id, _| tasks.contains(id));
        self.transitions.retain(|id| tasks.contains(id));
        self
    }

    /// Build a pending task under a fresh provisional id. Ids are time based
    /// and strictly increasing within the session.
    ///
    pub fn new_provisional_task(&mut self, text: &str, area: Area) -> Task {
        Task::provisional(self.next_provisional_seq(), text, area)
    }

    fn next_provisional_seq(&mut self) -> u64 {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        self.last_provisional = now.max(self.last_provisional + 1);
        self.last_provisional
    }

    pub fn mark(&self, id: &TaskId) -> Option<Mark> {
        self.marks.get(id).copied()
    }

    pub fn set_mark(&mut self, id: TaskId, mark: Mark) -> &mut Self {
        self.marks.insert(id, mark);
        self
    }

    pub fn clear_mark(&mut self, id: &TaskId) -> &mut Self {
        self.marks.remove(id);
        self
    }

    /// Remove a task now, along with anything pending against it.
    ///
    pub fn remove_task(&mut self, id: &TaskId) -> Option<Task> {
        self.marks.remove(id);
        self.transitions.cancel(id);
        self.tasks.remove(id)
    }

    /// Schedule a task's removal after `delay`. A zero delay removes it
    /// immediately.
    ///
    pub fn schedule_removal(&mut self, id: TaskId, kind: TransitionKind, delay: Duration) {
        if delay.is_zero() {
            self.remove_task(&id);
        } else {
            self.transitions.schedule(id, kind, Instant::now(), delay);
        }
    }

    pub fn is_removal_scheduled(&self, id: &TaskId) -> bool {
        self.transitions.is_scheduled(id)
    }

    pub fn next_removal_due(&self) -> Option<Instant> {
        self.transitions.next_due()
    }

    /// Apply every removal due at or before `now`. Returns how many tasks
    /// left the list.
    ///
    pub fn apply_due_removals(&mut self, now: Instant) -> usize {
        let due = self.transitions.take_due(now);
        self.apply_removals(due)
    }

    /// Apply every scheduled removal regardless of its delay.
    ///
    pub fn apply_all_removals(&mut self) -> usize {
        let all = self.transitions.take_all();
        self.apply_removals(all)
    }

    fn apply_removals(&mut self, removals: Vec<(TaskId, TransitionKind)>) -> usize {
        removals
            .into_iter()
            .filter(|(id, kind)| {
                self.marks.remove(id);
                let removed = self.tasks.remove(id).is_some();
                if removed {
                    debug!("Removed task {} after {:?} transition", id, kind);
                }
                removed
            })
            .count()
    }

    /// Note a completion request the store has not answered yet.
    ///
    pub fn begin_completion(&mut self, id: TaskId) {
        self.completions_in_flight.insert(id);
    }

    pub fn finish_completion(&mut self, id: &TaskId) {
        self.completions_in_flight.remove(id);
    }

    /// Remember what the user did to a provisional task so the late
    /// confirmation can be reconciled with the store.
    ///
    pub fn record_superseded(&mut self, provisional_id: TaskId, kind: TransitionKind) {
        self.superseded.insert(provisional_id, kind);
    }

    pub fn take_superseded(&mut self, provisional_id: &TaskId) -> Option<TransitionKind> {
        self.superseded.remove(provisional_id)
    }

    pub fn set_stats(&mut self, stats: Stats) -> &mut Self {
        self.stats = StatsView::Remote(stats);
        self
    }

    /// Fall back to counters derived from the local list, keeping the last
    /// known completed-today count.
    ///
    pub fn fallback_stats(&mut self) -> &mut Self {
        let completed_today = self.completed_today();
        self.stats = StatsView::Local { completed_today };
        self
    }

    pub fn stats_view(&self) -> StatsView {
        self.stats
    }

    pub fn pending_count(&self) -> usize {
        match self.stats {
            StatsView::Remote(stats) => stats.pending,
            StatsView::Local { .. } => self.tasks.len(),
        }
    }

    pub fn completed_today(&self) -> usize {
        match self.stats {
            StatsView::Remote(stats) => stats.completed_today,
            StatsView::Local { completed_today } => completed_today,
        }
    }

    pub fn set_article(&mut self, article: Option<Article>) -> &mut Self {
        self.article = article;
        self
    }

    pub fn article(&self) -> Option<&Article> {
        self.article.as_ref()
    }

    /// Queue a transient notification for the presentation layer.
    ///
    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) -> &mut Self {
        self.notifications.push_back(Notification {
            level,
            message: message.into(),
        });
        self
    }

    /// Drain queued notifications, oldest first.
    ///
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// Keep a failure that is not surfaced to the user.
    ///
    pub fn record_diagnostic(&mut self, entry: impl Into<String>) {
        if self.diagnostics.len() == MAX_DIAGNOSTICS {
            self.diagnostics.pop_front();
        }
        self.diagnostics.push_back(entry.into());
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &String> {
        self.diagnostics.iter()
    }

    /// Return the filtered view decorated with marks and the cursor.
    ///
    pub fn visible_rows(&self) -> Vec<Row<'_>> {
        let selection = self.tasks.selection();
        self.tasks
            .filtered_view()
            .into_iter()
            .enumerate()
            .map(|(index, task)| Row {
                task,
                mark: self.mark(&task.id),
                selected: selection == Some(index),
            })
            .collect()
    }
}

//! Optimistic mutation coordinator.
//!
//! Every mutating user action is applied to the shared session first and
//! then confirmed against the task store. The session lock is never held
//! across a store call, so other actions may run while a request is in
//! flight and each protocol re-checks the list when its response arrives.

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::state::{Mark, NotificationLevel, Phase, SharedState, StateError, TransitionKind};
use crate::store::{Area, StoreError, TaskId, TaskStore};
use log::*;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Store work that runs on its own. Its failure is logged and recorded in
/// the session diagnostics, never returned to the caller.
///
#[must_use = "detached work keeps running; await `settled` to observe its end"]
pub struct Detached(JoinHandle<()>);

impl Detached {
    fn spawn<F>(work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Detached(tokio::spawn(work))
    }

    /// Wait for the work to finish.
    ///
    pub async fn settled(self) {
        if let Err(e) = self.0.await {
            warn!("Detached store work did not finish: {}", e);
        }
    }
}

/// Applies user mutations optimistically and reconciles them with the store.
///
#[derive(Clone)]
pub struct Handler {
    state: SharedState,
    store: TaskStore,
    complete_delay: Duration,
    delete_delay: Duration,
}

impl Handler {
    /// Return new instance with reference to state. Removals happen without
    /// a transition delay.
    ///
    pub fn new(state: SharedState, store: TaskStore) -> Self {
        Handler {
            state,
            store,
            complete_delay: Duration::ZERO,
            delete_delay: Duration::ZERO,
        }
    }

    /// Return new instance using the store and delays from configuration.
    ///
    pub fn from_config(state: SharedState, config: &Config) -> AppResult<Self> {
        Ok(Handler::new(state, config.task_store()?)
            .with_delays(config.complete_delay, config.delete_delay))
    }

    pub fn with_delays(mut self, complete_delay: Duration, delete_delay: Duration) -> Self {
        self.complete_delay = complete_delay;
        self.delete_delay = delete_delay;
        self
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Replace the session with the store's tasks, stats and article.
    /// Only a failure to list tasks fails the reload.
    ///
    pub async fn load(&self) -> AppResult<()> {
        if !self.store.is_configured() {
            info!("Task store is not configured, setup required.");
            self.state.lock().await.set_phase(Phase::NeedsSetup);
            return Ok(());
        }

        info!("Loading tasks, stats and article...");
        self.state.lock().await.set_phase(Phase::Loading);
        let (tasks, stats, article) = tokio::join!(
            self.store.list_tasks(),
            self.store.get_stats(),
            self.store.get_article()
        );

        let mut state = self.state.lock().await;
        let tasks = match tasks {
            Ok(tasks) => tasks,
            Err(StoreError::Unconfigured) => {
                state.set_phase(Phase::NeedsSetup);
                return Ok(());
            }
            Err(e) => {
                error!("Failed to load tasks: {}", e);
                state.set_phase(Phase::Failed(e.to_string()));
                return Err(e.into());
            }
        };
        info!("Received {} pending tasks.", tasks.len());
        state.replace_tasks(tasks);

        match stats {
            Ok(stats) => {
                state.set_stats(stats);
            }
            Err(e) => {
                debug!("Stats unavailable, counting locally: {}", e);
                state.fallback_stats();
            }
        }
        match article {
            Ok(article) => {
                state.set_article(Some(article));
            }
            Err(e) => {
                debug!("Article unavailable, hiding it: {}", e);
                state.set_article(None);
            }
        }
        state.set_phase(Phase::Ready);
        Ok(())
    }

    /// Show the task at once under a provisional id, then swap in the
    /// store's version. Returns the durable id.
    ///
    pub async fn add_task(&self, text: &str, area: Option<Area>) -> AppResult<TaskId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::ValidationFailed("task text is empty".to_string()));
        }

        let (provisional_id, area) = {
            let mut state = self.state.lock().await;
            let area = area.unwrap_or_else(|| state.default_area().clone());
            let task = state.new_provisional_task(text, area.clone());
            let id = task.id.clone();
            state.tasks_mut().insert_provisional(task)?;
            (id, area)
        };
        info!("Added task {} optimistically, confirming...", provisional_id);

        let confirmed = match self.store.create_task(text, &area).await {
            Ok(confirmed) => confirmed,
            Err(e) => {
                error!("Failed to add task {}: {}", provisional_id, e);
                let mut state = self.state.lock().await;
                state.remove_task(&provisional_id);
                state.take_superseded(&provisional_id);
                state.notify(
                    NotificationLevel::Error,
                    format!("Failed to add task: {}", e),
                );
                return Err(e.into());
            }
        };

        let confirmed_id = confirmed.id.clone();
        let superseded = {
            let mut state = self.state.lock().await;
            match state
                .tasks_mut()
                .confirm_provisional(&provisional_id, confirmed)
            {
                Ok(_) => None,
                Err(StateError::ProvisionalMissing { .. }) => {
                    Some(state.take_superseded(&provisional_id))
                }
                Err(e) => {
                    // The durable task is already listed, e.g. by a reload.
                    debug!("Dropping {} on confirmation: {}", provisional_id, e);
                    state.remove_task(&provisional_id);
                    None
                }
            }
        };

        match superseded {
            None => {
                info!("Task {} confirmed as {}.", provisional_id, confirmed_id);
                self.refresh_stats().await;
            }
            Some(Some(kind)) => {
                info!(
                    "Task {} was {:?}d before confirmation, reconciling {} with the store",
                    provisional_id,
                    kind,
                    confirmed_id
                );
                self.reconcile(&confirmed_id, kind).await;
            }
            Some(None) => {
                info!(
                    "Task {} left the list before confirmation, {} appears on next reload",
                    provisional_id, confirmed_id
                );
            }
        }
        Ok(confirmed_id)
    }

    /// Best-effort follow-up for a task the user acted on before the store
    /// confirmed it. The outcome is only logged.
    ///
    async fn reconcile(&self, id: &TaskId, kind: TransitionKind) {
        let result = match kind {
            TransitionKind::Delete => self.store.delete_task(id).await,
            TransitionKind::Complete => self.store.complete_task(id).await,
        };
        if let Err(e) = result {
            warn!("Could not reconcile {} with the store: {}", id, e);
        }
    }

    /// Take the task off the list without waiting for the store. The store
    /// call runs detached and a failure never brings the task back.
    ///
    pub async fn complete_task(&self, id: &TaskId) -> Option<Detached> {
        {
            let mut state = self.state.lock().await;
            if !state.tasks().contains(id) {
                debug!("Ignoring completion of unknown task {}", id);
                return None;
            }
            if state.mark(id).is_some() {
                debug!("Task {} is already leaving the list", id);
                return None;
            }
            if id.is_provisional() {
                info!("Completing unconfirmed task {} locally", id);
                state.remove_task(id);
                state.record_superseded(id.clone(), TransitionKind::Complete);
                return None;
            }
            state.set_mark(id.clone(), Mark::Completing);
            state.begin_completion(id.clone());
            state.schedule_removal(id.clone(), TransitionKind::Complete, self.complete_delay);
        }

        info!("Completing task {}...", id);
        let handler = self.clone();
        let id = id.clone();
        Some(Detached::spawn(async move {
            let result = handler.store.complete_task(&id).await;
            let mut state = handler.state.lock().await;
            state.finish_completion(&id);
            match result {
                Ok(()) => {
                    info!("Task {} completed.", id);
                    drop(state);
                    handler.refresh_stats().await;
                }
                Err(e) => {
                    warn!("Store did not record completion of {}: {}", id, e);
                    state.record_diagnostic(format!("complete {} failed: {}", id, e));
                }
            }
        }))
    }

    /// Delete the task in the store first and only then take it off the
    /// list. On failure the task stays and the user is told.
    ///
    pub async fn delete_task(&self, id: &TaskId) -> AppResult<()> {
        {
            let mut state = self.state.lock().await;
            if !state.tasks().contains(id) {
                debug!("Ignoring deletion of unknown task {}", id);
                return Ok(());
            }
            if state.mark(id).is_some() {
                debug!("Task {} is already leaving the list", id);
                return Ok(());
            }
            if id.is_provisional() {
                info!("Deleting unconfirmed task {} locally", id);
                state.remove_task(id);
                state.record_superseded(id.clone(), TransitionKind::Delete);
                return Ok(());
            }
            state.set_mark(id.clone(), Mark::Deleting);
        }

        info!("Deleting task {}...", id);
        match self.store.delete_task(id).await {
            Ok(()) => {
                {
                    let mut state = self.state.lock().await;
                    if state.tasks().contains(id) {
                        state.schedule_removal(id.clone(), TransitionKind::Delete, self.delete_delay);
                    }
                }
                info!("Task {} deleted.", id);
                self.refresh_stats().await;
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete task {}: {}", id, e);
                let mut state = self.state.lock().await;
                state.clear_mark(id);
                state.notify(NotificationLevel::Error, format!("Failed to delete: {}", e));
                Err(e.into())
            }
        }
    }

    /// Fetch fresh counters, falling back to the local task count.
    ///
    pub async fn refresh_stats(&self) {
        match self.store.get_stats().await {
            Ok(stats) => {
                self.state.lock().await.set_stats(stats);
            }
            Err(e) => {
                debug!("Stats unavailable, counting locally: {}", e);
                self.state.lock().await.fallback_stats();
            }
        }
    }

    /// Apply removals whose transition delay has elapsed.
    ///
    pub async fn settle_transitions(&self) -> usize {
        self.state.lock().await.apply_due_removals(Instant::now())
    }

    /// Apply every scheduled removal now.
    ///
    pub async fn settle_all(&self) -> usize {
        self.state.lock().await.apply_all_removals()
    }

    /// Sleep through pending transitions, applying each as it falls due,
    /// until none are left.
    ///
    pub async fn wait_for_transitions(&self) {
        loop {
            let next_due = self.state.lock().await.next_removal_due();
            match next_due {
                Some(due) => {
                    tokio::time::sleep_until(tokio::time::Instant::from_std(due)).await;
                    self.settle_transitions().await;
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::state::State;
    use crate::store::{Stats, Task, DEFAULT_TIMEOUT};
    use httpmock::MockServer;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    pub(crate) fn handler_for(server: &MockServer) -> Handler {
        let state = Arc::new(Mutex::new(State::default()));
        let store = TaskStore::new(&server.base_url(), "token", DEFAULT_TIMEOUT).unwrap();
        Handler::new(state, store)
    }

    pub(crate) fn task_json(id: u64, text: &str, area: &str) -> serde_json::Value {
        json!({ "id": id, "text": text, "area": area, "status": "pending", "carryover_count": 0 })
    }

    pub(crate) fn durable_task(id: &str, area: Area) -> Task {
        Task {
            id: TaskId::durable(id),
            text: format!("task {}", id),
            area,
            status: Default::default(),
            carryover_count: 0,
        }
    }

    pub(crate) async fn seed(state: &SharedState, ids: &[&str]) {
        let tasks = ids.iter().map(|id| durable_task(id, Area::work())).collect();
        let mut state = state.lock().await;
        state.replace_tasks(tasks);
        state.set_phase(Phase::Ready);
    }

    async fn ids(handler: &Handler) -> Vec<String> {
        let state = handler.state.lock().await;
        state.tasks().tasks().iter().map(|t| t.id.to_string()).collect()
    }

    #[tokio::test]
    async fn add_task_confirms_provisional() {
        let server = MockServer::start();
        let create = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/api/tasks")
                    .json_body(json!({ "text": "Buy milk", "area": "work" }));
                then.status(201).json_body(task_json(42, "Buy milk", "work"));
            })
            .await;
        let stats = server
            .mock_async(|when, then| {
                when.method("GET").path("/api/stats");
                then.status(200)
                    .json_body(json!({ "pending": 1, "completed_today": 0 }));
            })
            .await;

        let handler = handler_for(&server);
        let id = handler.add_task("  Buy milk ", None).await.unwrap();
        create.assert_async().await;
        stats.assert_async().await;

        assert_eq!(id, TaskId::durable("42"));
        let state = handler.state.lock().await;
        assert_eq!(state.tasks().len(), 1);
        assert!(state.tasks().tasks().iter().all(|t| !t.is_provisional()));
        assert_eq!(state.pending_count(), 1);
    }

    #[tokio::test]
    async fn add_task_failure_rolls_back() {
        let server = MockServer::start();
        server
            .mock_async(|when, then| {
                when.method("POST").path("/api/tasks");
                then.status(500);
            })
            .await;

        let handler = handler_for(&server);
        let error = handler.add_task("Buy milk", None).await.unwrap_err();
        assert_eq!(error.store_error().and_then(|e| e.status()), Some(500));

        let mut state = handler.state.lock().await;
        assert!(state.tasks().is_empty());
        let notifications = state.take_notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].level, NotificationLevel::Error);
        assert_eq!(notifications[0].message, "Failed to add task: Request failed: 500");
    }

    #[tokio::test]
    async fn add_task_rejects_empty_text_locally() {
        let server = MockServer::start();
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(201);
            })
            .await;

        let handler = handler_for(&server);
        let error = handler.add_task("   ", None).await.unwrap_err();
        assert!(matches!(error, AppError::ValidationFailed(_)));
        assert!(handler.state.lock().await.tasks().is_empty());
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn add_task_uses_requested_area() {
        let server = MockServer::start();
        let create = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/api/tasks")
                    .json_body(json!({ "text": "Refactor", "area": "side_project" }));
                then.status(201)
                    .json_body(task_json(5, "Refactor", "side_project"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/stats");
                then.status(500);
            })
            .await;

        let handler = handler_for(&server);
        handler
            .add_task("Refactor", Some(Area::side_project()))
            .await
            .unwrap();
        create.assert_async().await;
        let state = handler.state.lock().await;
        assert_eq!(state.tasks().tasks()[0].area, Area::side_project());
    }

    #[tokio::test]
    async fn delete_before_confirm_reconciles_with_store() {
        let server = MockServer::start();
        let create = server
            .mock_async(|when, then| {
                when.method("POST").path("/api/tasks");
                then.status(201)
                    .delay(Duration::from_millis(300))
                    .json_body(task_json(42, "Buy milk", "work"));
            })
            .await;
        let reconcile = server
            .mock_async(|when, then| {
                when.method("DELETE").path("/api/tasks/42");
                then.status(200).json_body(json!({ "success": true }));
            })
            .await;

        let handler = handler_for(&server);
        let adding = handler.add_task("Buy milk", None);
        let deleting = async {
            loop {
                let first = {
                    let state = handler.state.lock().await;
                    state.tasks().tasks().first().map(|t| t.id.clone())
                };
                if let Some(id) = first {
                    assert!(id.is_provisional());
                    handler.delete_task(&id).await.unwrap();
                    break;
                }
                tokio::task::yield_now().await;
            }
        };
        let (added, ()) = tokio::join!(adding, deleting);

        assert_eq!(added.unwrap(), TaskId::durable("42"));
        assert!(ids(&handler).await.is_empty());
        create.assert_async().await;
        reconcile.assert_async().await;
    }

    #[tokio::test]
    async fn complete_before_confirm_completes_in_store() {
        let server = MockServer::start();
        server
            .mock_async(|when, then| {
                when.method("POST").path("/api/tasks");
                then.status(201)
                    .delay(Duration::from_millis(300))
                    .json_body(task_json(7, "Call mom", "work"));
            })
            .await;
        let reconcile = server
            .mock_async(|when, then| {
                when.method("POST").path("/api/tasks/7/complete");
                then.status(200).json_body(json!({ "success": true }));
            })
            .await;

        let handler = handler_for(&server);
        let adding = handler.add_task("Call mom", None);
        let completing = async {
            loop {
                let first = {
                    let state = handler.state.lock().await;
                    state.tasks().tasks().first().map(|t| t.id.clone())
                };
                if let Some(id) = first {
                    assert!(handler.complete_task(&id).await.is_none());
                    break;
                }
                tokio::task::yield_now().await;
            }
        };
        let (added, ()) = tokio::join!(adding, completing);

        added.unwrap();
        assert!(ids(&handler).await.is_empty());
        reconcile.assert_async().await;
    }

    #[tokio::test]
    async fn complete_removes_without_waiting_and_refreshes_stats() {
        let server = MockServer::start();
        let complete = server
            .mock_async(|when, then| {
                when.method("POST").path("/api/tasks/2/complete");
                then.status(200).json_body(json!({ "success": true }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/stats");
                then.status(200)
                    .json_body(json!({ "pending": 1, "completed_today": 4 }));
            })
            .await;

        let handler = handler_for(&server);
        seed(&handler.state, &["1", "2"]).await;
        let work = handler.complete_task(&TaskId::durable("2")).await.unwrap();
        assert_eq!(ids(&handler).await, vec!["1"]);
        work.settled().await;
        complete.assert_async().await;

        let state = handler.state.lock().await;
        assert_eq!(
            state.stats_view(),
            crate::state::StatsView::Remote(Stats {
                pending: 1,
                completed_today: 4
            })
        );
    }

    #[tokio::test]
    async fn complete_failure_does_not_restore_task() {
        let server = MockServer::start();
        server
            .mock_async(|when, then| {
                when.method("POST").path("/api/tasks/1/complete");
                then.status(503);
            })
            .await;

        let handler = handler_for(&server);
        seed(&handler.state, &["1"]).await;
        handler
            .complete_task(&TaskId::durable("1"))
            .await
            .unwrap()
            .settled()
            .await;

        let mut state = handler.state.lock().await;
        assert!(state.tasks().is_empty());
        assert!(state.take_notifications().is_empty());
        let diagnostics: Vec<&String> = state.diagnostics().collect();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].contains("complete 1 failed"));
    }

    #[tokio::test]
    async fn stats_fallback_after_completion_counts_local_tasks() {
        let server = MockServer::start();
        server
            .mock_async(|when, then| {
                when.method("POST").path("/api/tasks/3/complete");
                then.status(200).json_body(json!({ "success": true }));
            })
            .await;
        let stats = server
            .mock_async(|when, then| {
                when.method("GET").path("/api/stats");
                then.status(500);
            })
            .await;

        let handler = handler_for(&server);
        seed(&handler.state, &["1", "2", "3"]).await;
        handler
            .complete_task(&TaskId::durable("3"))
            .await
            .unwrap()
            .settled()
            .await;
        stats.assert_async().await;

        let state = handler.state.lock().await;
        assert_eq!(state.pending_count(), state.tasks().len());
        assert_eq!(state.pending_count(), 2);
    }

    #[tokio::test]
    async fn delayed_completion_keeps_task_until_settled() {
        let server = MockServer::start();
        server
            .mock_async(|when, then| {
                when.method("POST").path("/api/tasks/1/complete");
                then.status(200).json_body(json!({ "success": true }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/stats");
                then.status(500);
            })
            .await;

        let handler = handler_for(&server).with_delays(Duration::from_secs(60), Duration::ZERO);
        seed(&handler.state, &["1"]).await;
        let work = handler.complete_task(&TaskId::durable("1")).await.unwrap();
        {
            let state = handler.state.lock().await;
            assert_eq!(state.mark(&TaskId::durable("1")), Some(Mark::Completing));
            assert!(state.is_removal_scheduled(&TaskId::durable("1")));
        }
        // A second completion while the first is pending does nothing.
        assert!(handler.complete_task(&TaskId::durable("1")).await.is_none());
        work.settled().await;

        assert_eq!(handler.settle_transitions().await, 0);
        assert_eq!(handler.settle_all().await, 1);
        assert!(ids(&handler).await.is_empty());
    }

    #[tokio::test]
    async fn delete_waits_for_store_then_removes() {
        let server = MockServer::start();
        let delete = server
            .mock_async(|when, then| {
                when.method("DELETE").path("/api/tasks/1");
                then.status(200).json_body(json!({ "success": true }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/stats");
                then.status(200)
                    .json_body(json!({ "pending": 1, "completed_today": 0 }));
            })
            .await;

        let handler = handler_for(&server);
        seed(&handler.state, &["1", "2"]).await;
        handler.delete_task(&TaskId::durable("1")).await.unwrap();
        delete.assert_async().await;
        assert_eq!(ids(&handler).await, vec!["2"]);
    }

    #[tokio::test]
    async fn delete_failure_keeps_task_and_notifies() {
        let server = MockServer::start();
        server
            .mock_async(|when, then| {
                when.method("DELETE").path("/api/tasks/1");
                then.status(500);
            })
            .await;

        let handler = handler_for(&server);
        seed(&handler.state, &["1"]).await;
        assert!(handler.delete_task(&TaskId::durable("1")).await.is_err());

        let mut state = handler.state.lock().await;
        assert_eq!(state.tasks().len(), 1);
        assert!(state.mark(&TaskId::durable("1")).is_none());
        let notifications = state.take_notifications();
        assert_eq!(notifications[0].message, "Failed to delete: Request failed: 500");
    }

    #[tokio::test]
    async fn delete_with_delay_marks_then_removes() {
        let server = MockServer::start();
        server
            .mock_async(|when, then| {
                when.method("DELETE").path("/api/tasks/1");
                then.status(200).json_body(json!({ "success": true }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/stats");
                then.status(500);
            })
            .await;

        let handler = handler_for(&server).with_delays(Duration::ZERO, Duration::from_millis(20));
        seed(&handler.state, &["1"]).await;
        handler.delete_task(&TaskId::durable("1")).await.unwrap();
        assert_eq!(
            handler.state.lock().await.mark(&TaskId::durable("1")),
            Some(Mark::Deleting)
        );
        handler.wait_for_transitions().await;
        assert!(ids(&handler).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_are_ignored() {
        let server = MockServer::start();
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let handler = handler_for(&server);
        assert!(handler.complete_task(&TaskId::durable("9")).await.is_none());
        handler.delete_task(&TaskId::durable("9")).await.unwrap();
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn load_populates_session() {
        let server = MockServer::start();
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/tasks");
                then.status(200).json_body(json!({
                    "tasks": [task_json(1, "a", "work"), task_json(2, "b", "side_project")]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/stats");
                then.status(200)
                    .json_body(json!({ "pending": 2, "completed_today": 5 }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/article");
                then.status(200).json_body(json!({
                    "url": "https://example.com",
                    "title": "Deep Work",
                    "description": "Focus"
                }));
            })
            .await;

        let handler = handler_for(&server);
        handler.load().await.unwrap();
        let state = handler.state.lock().await;
        assert_eq!(*state.phase(), Phase::Ready);
        assert_eq!(state.tasks().len(), 2);
        assert_eq!(state.completed_today(), 5);
        assert_eq!(state.article().unwrap().title, "Deep Work");
    }

    #[tokio::test]
    async fn load_degrades_without_stats_or_article() {
        let server = MockServer::start();
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/tasks");
                then.status(200)
                    .json_body(json!({ "tasks": [task_json(1, "a", "work")] }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/stats");
                then.status(500);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/article");
                then.status(404);
            })
            .await;

        let handler = handler_for(&server);
        handler.load().await.unwrap();
        let state = handler.state.lock().await;
        assert_eq!(*state.phase(), Phase::Ready);
        assert_eq!(state.pending_count(), 1);
        assert_eq!(state.completed_today(), 0);
        assert!(state.article().is_none());
    }

    #[tokio::test]
    async fn load_failure_sets_failed_phase() {
        let server = MockServer::start();
        server
            .mock_async(|when, then| {
                when.any_request();
                then.status(401);
            })
            .await;

        let handler = handler_for(&server);
        assert!(handler.load().await.is_err());
        let state = handler.state.lock().await;
        assert_eq!(*state.phase(), Phase::Failed("Invalid API token".to_string()));
    }

    #[tokio::test]
    async fn load_without_configuration_needs_setup() {
        let state = Arc::new(Mutex::new(State::default()));
        let handler = Handler::new(state, TaskStore::unconfigured());
        handler.load().await.unwrap();
        assert_eq!(*handler.state.lock().await.phase(), Phase::NeedsSetup);
    }

    #[tokio::test]
    async fn refresh_stats_replaces_counters() {
        let server = MockServer::start();
        let stats = server
            .mock_async(|when, then| {
                when.method("GET").path("/api/stats");
                then.status(200)
                    .json_body(json!({ "pending": 0, "completed_today": 1 }));
            })
            .await;

        let handler = handler_for(&server);
        handler.refresh_stats().await;
        stats.assert_async().await;
        assert_eq!(handler.state.lock().await.completed_today(), 1);
    }

    #[tokio::test]
    async fn reload_during_add_keeps_confirmed_task() {
        let server = MockServer::start();
        server
            .mock_async(|when, then| {
                when.method("POST").path("/api/tasks");
                then.status(201)
                    .delay(Duration::from_millis(300))
                    .json_body(task_json(42, "Buy milk", "work"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/tasks");
                then.status(200).json_body(json!({ "tasks": [] }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/stats");
                then.status(500);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/article");
                then.status(404);
            })
            .await;

        let handler = handler_for(&server);
        let adding = handler.add_task("Buy milk", None);
        let reloading = async {
            loop {
                let visible = !handler.state.lock().await.tasks().is_empty();
                if visible {
                    handler.load().await.unwrap();
                    break;
                }
                tokio::task::yield_now().await;
            }
        };
        let (added, ()) = tokio::join!(adding, reloading);

        assert_eq!(added.unwrap(), TaskId::durable("42"));
        assert_eq!(ids(&handler).await, vec!["42"]);
        let state = handler.state.lock().await;
        assert_eq!(state.pending_count(), state.tasks().len());
    }

    #[tokio::test]
    async fn reload_during_completion_does_not_restore_task() {
        let server = MockServer::start();
        server
            .mock_async(|when, then| {
                when.method("POST").path("/api/tasks/1/complete");
                then.status(200)
                    .delay(Duration::from_millis(300))
                    .json_body(json!({ "success": true }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/tasks");
                then.status(200).json_body(json!({
                    "tasks": [task_json(1, "a", "work"), task_json(2, "b", "work")]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/stats");
                then.status(500);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/article");
                then.status(404);
            })
            .await;

        let handler = handler_for(&server);
        seed(&handler.state, &["1", "2"]).await;
        let work = handler.complete_task(&TaskId::durable("1")).await.unwrap();
        handler.load().await.unwrap();
        assert_eq!(ids(&handler).await, vec!["2"]);

        work.settled().await;
        assert_eq!(ids(&handler).await, vec!["2"]);
    }

    #[tokio::test]
    async fn reload_during_delete_keeps_mark() {
        let server = MockServer::start();
        server
            .mock_async(|when, then| {
                when.method("DELETE").path("/api/tasks/1");
                then.status(200)
                    .delay(Duration::from_millis(300))
                    .json_body(json!({ "success": true }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/tasks");
                then.status(200)
                    .json_body(json!({ "tasks": [task_json(1, "a", "work")] }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/stats");
                then.status(500);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/article");
                then.status(404);
            })
            .await;

        let handler = handler_for(&server);
        seed(&handler.state, &["1"]).await;
        let deleting_id = TaskId::durable("1");
        let deleting = handler.delete_task(&deleting_id);
        let reloading = async {
            loop {
                let marked = handler
                    .state
                    .lock()
                    .await
                    .mark(&TaskId::durable("1"))
                    .is_some();
                if marked {
                    handler.load().await.unwrap();
                    let state = handler.state.lock().await;
                    assert_eq!(state.mark(&TaskId::durable("1")), Some(Mark::Deleting));
                    break;
                }
                tokio::task::yield_now().await;
            }
        };
        let (deleted, ()) = tokio::join!(deleting, reloading);

        deleted.unwrap();
        assert!(ids(&handler).await.is_empty());
    }
}

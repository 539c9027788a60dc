use crate::config::Config;
use crate::error::AppError;
use crate::events::input::{Intent, Navigator};
use crate::events::network::Handler as NetworkEventHandler;
use crate::state::{Phase, SharedState, State};
use crate::store::{Area, AreaFilter, StoreError, TaskId, TaskStore};
use crate::ui;
use anyhow::{anyhow, bail, Result};
use log::*;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Specify the commands the front end understands.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Configure {
        endpoint: String,
        token: String,
        test: bool,
    },
    Disconnect,
    Health,
    List { area: Option<String> },
    Add { text: String, area: Option<String> },
    Complete { id: String },
    Delete { id: String },
    Stats,
}

/// Oversees one command run: loads the session, applies the command through
/// the coordinator and prints the resulting snapshot.
///
pub struct App {
    state: SharedState,
    config: Config,
}

impl App {
    /// Run the given command according to the configuration. Returns the
    /// result of the execution.
    ///
    pub async fn start(config: Config, command: Command) -> Result<()> {
        info!("Starting application...");
        let app = App {
            state: Arc::new(Mutex::new(State::new(config.default_area.clone()))),
            config,
        };
        let result = app.run(command).await;
        app.flush_notifications().await;
        info!("Exiting application...");
        result
    }

    async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Configure {
                endpoint,
                token,
                test,
            } => self.configure(&endpoint, &token, test).await,
            Command::Disconnect => self.disconnect(),
            Command::Health => self.health().await,
            command => self.run_session(command).await,
        }
    }

    async fn configure(&self, endpoint: &str, token: &str, test: bool) -> Result<()> {
        if test {
            let status = TaskStore::probe_health(endpoint, token).await?;
            println!("{}", ui::health_line(&status));
            if !status.is_healthy() {
                bail!("configuration not saved");
            }
        }
        let mut config = self.config.clone();
        config.save_connection(endpoint, token)?;
        println!("Saved connection to {}", config.endpoint);
        Ok(())
    }

    fn disconnect(&self) -> Result<()> {
        let mut config = self.config.clone();
        config.clear()?;
        println!("Forgot the stored connection");
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        match TaskStore::probe_health(&self.config.endpoint, &self.config.token).await {
            Ok(status) => {
                println!("{}", ui::health_line(&status));
                if status.is_healthy() {
                    Ok(())
                } else {
                    Err(anyhow!("health check failed"))
                }
            }
            Err(StoreError::Unconfigured) => {
                println!("{}", ui::SETUP_HINT);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load the session and apply a task command to it.
    ///
    async fn run_session(&self, command: Command) -> Result<()> {
        let handler = NetworkEventHandler::from_config(Arc::clone(&self.state), &self.config)?;
        let navigator = Navigator::new(handler.clone());

        let loaded = navigator.handle(Intent::Reload).await;
        if !matches!(self.state.lock().await.phase(), Phase::Ready) {
            self.print().await;
            return loaded.map(|_| ()).map_err(anyhow::Error::from);
        }

        match command {
            Command::List { area } => {
                if let Some(area) = area {
                    navigator
                        .handle(Intent::SetFilter(AreaFilter::parse(&area)))
                        .await?;
                }
            }
            Command::Add { text, area } => {
                let area = area.map(|name| self.known_area(&name)).transpose()?;
                let id = handler.add_task(&text, area).await?;
                println!("Added task {}", id);
            }
            Command::Complete { id } => {
                let id = self.pending_id(&id).await?;
                if let Some(work) = handler.complete_task(&id).await {
                    work.settled().await;
                }
                handler.settle_all().await;
                println!("Completed task {}", id);
            }
            Command::Delete { id } => {
                let id = self.pending_id(&id).await?;
                handler.delete_task(&id).await?;
                handler.settle_all().await;
                println!("Deleted task {}", id);
            }
            Command::Stats => {
                let state = self.state.lock().await;
                println!("{}", ui::stats_line(&state));
                return Ok(());
            }
            Command::Configure { .. } | Command::Disconnect | Command::Health => (),
        }
        self.print().await;
        Ok(())
    }

    fn known_area(&self, name: &str) -> Result<Area, AppError> {
        let area = Area::new(name.trim());
        if self.config.areas.contains(&area) {
            Ok(area)
        } else {
            Err(AppError::ValidationFailed(format!(
                "unknown area '{}', expected one of {}",
                area,
                self.config
                    .areas
                    .iter()
                    .map(Area::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }

    async fn pending_id(&self, raw: &str) -> Result<TaskId, AppError> {
        let id = TaskId::durable(raw.trim());
        if self.state.lock().await.tasks().contains(&id) {
            Ok(id)
        } else {
            Err(AppError::ValidationFailed(format!(
                "no pending task with id {}",
                id
            )))
        }
    }

    async fn print(&self) {
        let state = self.state.lock().await;
        println!("{}", ui::render(&state));
    }

    async fn flush_notifications(&self) {
        let mut state = self.state.lock().await;
        for notification in state.take_notifications() {
            eprintln!("{}", ui::notification_line(&notification));
        }
    }
}

use fake::Dummy;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Prefix used when rendering provisional ids.
///
pub const PROVISIONAL_PREFIX: &str = "temp-";

/// Identifies a task either by the id the store issued or by a locally
/// generated provisional id. The two variants never compare equal.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TaskId {
    Durable(String),
    Provisional(u64),
}

impl TaskId {
    /// Return a durable id for the given store identifier.
    ///
    pub fn durable(id: impl Into<String>) -> Self {
        TaskId::Durable(id.into())
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, TaskId::Provisional(_))
    }

    /// Return the identifier as sent to the store, or none for a provisional id.
    ///
    pub fn as_durable(&self) -> Option<&str> {
        match self {
            TaskId::Durable(id) => Some(id.as_str()),
            TaskId::Provisional(_) => None,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Durable(id) => write!(f, "{}", id),
            TaskId::Provisional(seq) => write!(f, "{}{}", PROVISIONAL_PREFIX, seq),
        }
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // The store issues integer ids, but accept strings as well.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => TaskId::Durable(n.to_string()),
            RawId::Text(s) => TaskId::Durable(s),
        })
    }
}

/// Categorical tag attached to every task.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Area(String);

impl Area {
    pub const WORK: &'static str = "work";
    pub const SIDE_PROJECT: &'static str = "side_project";

    pub fn new(name: impl Into<String>) -> Self {
        Area(name.into())
    }

    pub fn work() -> Self {
        Area::new(Area::WORK)
    }

    pub fn side_project() -> Self {
        Area::new(Area::SIDE_PROJECT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Area {
    fn default() -> Self {
        Area::work()
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Selects which tasks are visible.
///
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum AreaFilter {
    #[default]
    All,
    Area(Area),
}

impl AreaFilter {
    /// Parse a filter name, where `all` selects every area.
    ///
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "" | "all" => AreaFilter::All,
            other => AreaFilter::Area(Area::new(other)),
        }
    }

    pub fn matches(&self, area: &Area) -> bool {
        match self {
            AreaFilter::All => true,
            AreaFilter::Area(wanted) => wanted == area,
        }
    }
}

impl fmt::Display for AreaFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaFilter::All => f.write_str("all"),
            AreaFilter::Area(area) => area.fmt(f),
        }
    }
}

/// Task lifecycle status as reported by the store.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

/// Defines task data structure.
///
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub area: Area,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub carryover_count: u32,
}

impl Task {
    /// Return a pending, not yet confirmed task with the given provisional id.
    ///
    pub fn provisional(seq: u64, text: &str, area: Area) -> Self {
        Task {
            id: TaskId::Provisional(seq),
            text: text.to_owned(),
            area,
            status: TaskStatus::Pending,
            carryover_count: 0,
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.id.is_provisional()
    }
}

/// Defines the summary counters returned by the store.
///
#[derive(Clone, Copy, Debug, Dummy, PartialEq, Eq, Deserialize)]
pub struct Stats {
    pub pending: usize,
    pub completed_today: usize,
}

/// Defines the daily reading suggestion.
///
#[derive(Clone, Debug, Dummy, PartialEq, Eq, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Result of a connectivity probe against a candidate endpoint.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    InvalidToken,
    Failed(u16),
    Unreachable,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => f.write_str("Connection successful!"),
            HealthStatus::InvalidToken => f.write_str("Invalid token"),
            HealthStatus::Failed(status) => write!(f, "Connection failed: {}", status),
            HealthStatus::Unreachable => f.write_str("Could not reach server. Is it running?"),
        }
    }
}

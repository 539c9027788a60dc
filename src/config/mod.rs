//! Configuration management module.
//!
//! This module handles loading, saving, and managing the dashboard
//! configuration: the task store endpoint and token, the known areas and the
//! removal transition delays.

mod error;

pub use error::ConfigError;

use crate::error::AppError;
use crate::store::{Area, TaskStore, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

const FILE_NAME: &str = "config.yml";
const DEFAULT_DIRECTORY_PATH: &str = ".config/focus-sync";

/// Oversees management of configuration file.
///
#[derive(Clone, Debug)]
pub struct Config {
    pub endpoint: String,
    pub token: String,
    pub default_area: Area,
    pub areas: Vec<Area>,
    pub complete_delay: Duration,
    pub delete_delay: Duration,
    pub request_timeout: Duration,
    file_path: Option<PathBuf>,
}

/// Define specification for configuration file.
///
#[derive(Serialize, Deserialize)]
struct FileSpec {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub default_area: Area,
    #[serde(default = "default_areas")]
    pub areas: Vec<Area>,
    #[serde(default = "default_complete_delay_ms")]
    pub complete_delay_ms: u64,
    #[serde(default = "default_delete_delay_ms")]
    pub delete_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_areas() -> Vec<Area> {
    vec![Area::work(), Area::side_project()]
}

fn default_complete_delay_ms() -> u64 {
    300
}

fn default_delete_delay_ms() -> u64 {
    200
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl Config {
    /// Return a new, unconfigured instance.
    ///
    pub fn new() -> Config {
        Config {
            endpoint: String::new(),
            token: String::new(),
            default_area: Area::default(),
            areas: default_areas(),
            complete_delay: Duration::from_millis(default_complete_delay_ms()),
            delete_delay: Duration::from_millis(default_delete_delay_ms()),
            request_timeout: DEFAULT_TIMEOUT,
            file_path: None,
        }
    }

    /// Try to load an existing configuration from the disk using the custom
    /// directory if provided. A missing file leaves the instance unconfigured.
    ///
    pub fn load(&mut self, custom_path: Option<&str>) -> Result<(), AppError> {
        let dir_path = match custom_path {
            Some(path) => Path::new(&path).to_path_buf(),
            None => Config::default_path()?,
        };
        let file_path = dir_path.join(Path::new(FILE_NAME));
        self.file_path = Some(file_path.clone());

        if !file_path.exists() {
            log::debug!("No configuration at {}, dashboard needs setup", file_path.display());
            return Ok(());
        }

        let contents = fs::read_to_string(&file_path).map_err(|e| ConfigError::Read {
            path: file_path.clone(),
            source: e,
        })?;
        let data: FileSpec =
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Malformed {
                path: file_path.clone(),
                message: e.to_string(),
            })?;
        self.apply(data)?;
        log::debug!("Loaded configuration from {}", file_path.display());
        Ok(())
    }

    fn apply(&mut self, data: FileSpec) -> Result<(), ConfigError> {
        if data.default_area.as_str().trim().is_empty()
            || data.areas.iter().any(|area| area.as_str().trim().is_empty())
        {
            return Err(ConfigError::EmptyArea);
        }
        self.endpoint = data.endpoint;
        self.token = data.token;
        self.default_area = data.default_area;
        self.areas = if data.areas.is_empty() {
            default_areas()
        } else {
            data.areas
        };
        if !self.areas.contains(&self.default_area) {
            self.areas.insert(0, self.default_area.clone());
        }
        self.complete_delay = Duration::from_millis(data.complete_delay_ms);
        self.delete_delay = Duration::from_millis(data.delete_delay_ms);
        self.request_timeout = Duration::from_secs(data.request_timeout_secs.max(1));
        Ok(())
    }

    fn file_spec(&self) -> FileSpec {
        FileSpec {
            endpoint: self.endpoint.clone(),
            token: self.token.clone(),
            default_area: self.default_area.clone(),
            areas: self.areas.clone(),
            complete_delay_ms: self.complete_delay.as_millis() as u64,
            delete_delay_ms: self.delete_delay.as_millis() as u64,
            request_timeout_secs: self.request_timeout.as_secs(),
        }
    }

    /// Serialize the configuration and write it to the disk, creating the
    /// directory if needed.
    ///
    pub fn save(&self) -> Result<(), AppError> {
        let file_path = self.file_path.as_ref().ok_or(ConfigError::FilePathNotSet)?;
        let content = serde_yaml::to_string(&self.file_spec())
            .map_err(|e| ConfigError::Encode(e.to_string()))?;

        if let Some(parent) = file_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| ConfigError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let mut file = fs::File::create(file_path).map_err(|e| ConfigError::Write {
            path: file_path.clone(),
            source: e,
        })?;
        write!(file, "{}", content).map_err(|e| ConfigError::Write {
            path: file_path.clone(),
            source: e,
        })?;
        file.flush().map_err(|e| ConfigError::Write {
            path: file_path.clone(),
            source: e,
        })?;
        Ok(())
    }

    /// Store a new endpoint and token. Both are trimmed and a trailing slash
    /// is dropped from the endpoint.
    ///
    pub fn save_connection(&mut self, endpoint: &str, token: &str) -> Result<(), AppError> {
        self.endpoint = normalize_endpoint(endpoint);
        self.token = token.trim().to_owned();
        if self.file_path.is_none() {
            self.file_path = Some(Config::default_path()?.join(Path::new(FILE_NAME)));
        }
        self.save()
    }

    /// Forget the endpoint and token.
    ///
    pub fn clear(&mut self) -> Result<(), AppError> {
        self.endpoint.clear();
        self.token.clear();
        self.save()
    }

    pub fn is_configured(&self) -> bool {
        !self.endpoint.is_empty() && !self.token.is_empty()
    }

    /// Build a task store client from the stored endpoint and token.
    ///
    pub fn task_store(&self) -> Result<TaskStore, AppError> {
        Ok(TaskStore::new(
            &self.endpoint,
            &self.token,
            self.request_timeout,
        )?)
    }

    /// Returns the path buffer for the default configuration directory or
    /// an error if the home directory could not be found.
    ///
    fn default_path() -> Result<PathBuf, AppError> {
        match dirs::home_dir() {
            Some(home) => Ok(Path::new(&home).join(Path::new(DEFAULT_DIRECTORY_PATH))),
            None => Err(ConfigError::HomeDirectoryNotFound.into()),
        }
    }
}

/// Trim an endpoint and drop trailing slashes.
///
pub fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim().trim_end_matches('/').to_owned()
}

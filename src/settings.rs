//! Application settings.
//!
//! Settings are persisted as pretty-printed JSON. Only the binary reads
//! them; the poller receives a [`PollerConfig`] built from them and
//! never touches the file.

use crate::error::AppError;
use crate::models::{MergeRequestFilters, WatchedRepository};
use crate::services::aggregator::{AggregateOptions, FailurePolicy, SortOrder};
use crate::services::gateway::{DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::services::poller::{PollerConfig, DEFAULT_REFRESH_INTERVAL_SECS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default settings filename.
pub const SETTINGS_FILE: &str = "settings.json";

/// Shortest allowed refresh interval in seconds.
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 15;

/// Longest allowed refresh interval in seconds.
pub const MAX_REFRESH_INTERVAL_SECS: u64 = 600;

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Base URL of the GitLab instance.
    pub gitlab_base_url: String,

    /// Projects to watch.
    pub repositories: Vec<WatchedRepository>,

    /// Seconds between refreshes (15-600).
    pub refresh_interval_secs: u64,

    pub notifications_enabled: bool,

    pub filters: MergeRequestFilters,

    pub sort_order: SortOrder,

    pub failure_policy: FailurePolicy,

    /// Merge requests listed per repository (max 100).
    pub per_page: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            gitlab_base_url: String::new(),
            repositories: Vec::new(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            notifications_enabled: true,
            filters: MergeRequestFilters::default(),
            sort_order: SortOrder::default(),
            failure_policy: FailurePolicy::default(),
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl AppSettings {
    /// Refresh interval, clamped to the allowed range.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(
            self.refresh_interval_secs
                .clamp(MIN_REFRESH_INTERVAL_SECS, MAX_REFRESH_INTERVAL_SECS),
        )
    }

    /// Whether polling can start: a base URL, a token and something to watch.
    pub fn is_configured(&self, has_token: bool) -> bool {
        !self.gitlab_base_url.trim().is_empty() && has_token && !self.repositories.is_empty()
    }

    /// The configuration a poller runs with.
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            repositories: self.repositories.clone(),
            filters: self.filters.clone(),
            interval: self.refresh_interval(),
            options: AggregateOptions {
                per_page: self.per_page.clamp(1, MAX_PER_PAGE),
                sort_order: self.sort_order,
                failure_policy: self.failure_policy,
            },
            notifications_enabled: self.notifications_enabled,
        }
    }

    /// Add a repository to watch.
    pub fn add_repository(&mut self, repository: WatchedRepository) -> Result<(), AppError> {
        if repository.display_name.trim().is_empty() {
            return Err(AppError::invalid_input_field(
                "Display name is required",
                "display_name",
            ));
        }
        if self
            .repositories
            .iter()
            .any(|r| r.project_id == repository.project_id)
        {
            return Err(AppError::invalid_input_field(
                format!("Project {} is already watched", repository.project_id),
                "project_id",
            ));
        }

        self.repositories.push(repository);
        Ok(())
    }

    /// Stop watching a project. Returns whether it was watched.
    pub fn remove_repository(&mut self, project_id: i64) -> bool {
        let before = self.repositories.len();
        self.repositories.retain(|r| r.project_id != project_id);
        self.repositories.len() != before
    }
}

/// JSON file holding [`AppSettings`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings.
    ///
    /// A missing file yields defaults. So does a file that cannot be
    /// decoded, with a warning; it is left in place until the next save.
    pub fn load(&self) -> Result<AppSettings, AppError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "[settings] No settings at {}, using defaults",
                    self.path.display()
                );
                return Ok(AppSettings::default());
            }
            Err(e) => {
                return Err(AppError::settings(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_str(&contents) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                log::warn!(
                    "[settings] Ignoring unreadable settings at {}: {}",
                    self.path.display(),
                    e
                );
                Ok(AppSettings::default())
            }
        }
    }

    /// Save settings, creating parent directories as needed.
    pub fn save(&self, settings: &AppSettings) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::settings(format!("Failed to encode settings: {}", e)))?;
        std::fs::write(&self.path, json)?;

        log::debug!("[settings] Saved to {}", self.path.display());
        Ok(())
    }
}

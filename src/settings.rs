//! # Settings
//!
//! Persisted user configuration, stored as JSON in the settings home:
//!
//! ```json
//! { "directory": "/data/boms", "template": ["Part Number"], "firstRunComplete": true }
//! ```
//!
//! The tally engine never reads settings; [`Settings::tally_options`] turns
//! them into explicit [`TallyOptions`].
use crate::error::PartTallyError;
use crate::error::ResultMessage;
use crate::tally::MatchMode;
use crate::tally::TallyOptions;
use crate::tally::DEFAULT_LABEL;
use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding the settings home.
pub const HOME_ENV: &str = "PART_TALLY_HOME";
const HOME_DIR_NAME: &str = ".part_tally";
const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Cannot determine home directory; set {HOME_ENV}")]
    HomeNotFound,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Directory scanned for workbooks
    pub directory: Option<PathBuf>,
    /// Header labels; the first one is used for counting
    pub template: Vec<String>,
    pub first_run_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_mode: Option<MatchMode>,
}

/// A partial update: only the fields that are `Some` are applied.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsUpdate {
    pub directory: Option<PathBuf>,
    pub template: Option<Vec<String>>,
    pub first_run_complete: Option<bool>,
    pub match_mode: Option<MatchMode>,
}

/// Settings home: `$PART_TALLY_HOME`, else `~/.part_tally`.
pub fn settings_home() -> Result<PathBuf, PartTallyError> {
    if let Some(path) = std::env::var_os(HOME_ENV).filter(|path| !path.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir().ok_or(SettingsError::HomeNotFound)?;
    Ok(home.join(HOME_DIR_NAME))
}

pub fn default_settings_path() -> Result<PathBuf, PartTallyError> {
    Ok(settings_home()?.join(SETTINGS_FILE_NAME))
}

impl Settings {
    /// Reads settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, PartTallyError> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let prefix = format!("Cannot load settings from '{}'", path.display());
        let content = fs::read_to_string(path)
            .map_err(PartTallyError::from)
            .with_prefix(&prefix)?;
        serde_json::from_str(&content)
            .map_err(PartTallyError::from)
            .with_prefix(&prefix)
    }

    /// Writes settings to `path`, creating its directory.
    pub fn save(&self, path: &Path) -> Result<(), PartTallyError> {
        let prefix = format!("Cannot save settings to '{}'", path.display());
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(PartTallyError::from)
                .with_prefix(&prefix)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .map_err(PartTallyError::from)
            .with_prefix(&prefix)?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Applies the fields present in `update`, keeping the rest.
    pub fn merge(&mut self, update: SettingsUpdate) {
        if let Some(directory) = update.directory {
            self.directory = Some(directory);
        }
        if let Some(template) = update.template {
            self.template = template;
        }
        if let Some(first_run_complete) = update.first_run_complete {
            self.first_run_complete = first_run_complete;
        }
        if let Some(match_mode) = update.match_mode {
            self.match_mode = Some(match_mode);
        }
    }

    /// First non-blank template entry, or [`DEFAULT_LABEL`].
    pub fn header_label(&self) -> &str {
        self.template
            .iter()
            .map(String::as_str)
            .find(|label| !label.trim().is_empty())
            .unwrap_or(DEFAULT_LABEL)
    }

    pub fn tally_options(&self) -> TallyOptions {
        TallyOptions {
            mode: self.match_mode.unwrap_or_default(),
            ..TallyOptions::with_label(self.header_label())
        }
    }
}

//! Configuration loading and parsing.
//!
//! Defines the hub config schema, resolves defaults, and applies in-place
//! edits for settings the user changes from the shell.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use band_hub_types::UserIdentity;
use serde::Deserialize;

use crate::quality::{self, QualityPreset};

pub const DEFAULT_DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_DRIVE_UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";
pub const DEFAULT_CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_CALENDAR_ID: &str = "primary";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level hub configuration loaded from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct HubConfig {
    /// Drive folder shared by the band. Unset means a personal folder.
    pub shared_folder_id: Option<String>,
    /// Calendar holding rehearsals and gigs.
    pub calendar_id: Option<String>,
    /// Optional full path to the local recordings SQLite file.
    pub db_path: Option<String>,
    /// Quality preset id used for new recordings.
    pub recording_quality: Option<String>,
    /// Identity used for favorites and comments.
    pub user: Option<UserConfig>,
    /// Google endpoint overrides.
    pub google: Option<GoogleConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserConfig {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Google API endpoint settings.
#[derive(Debug, Default, Deserialize)]
pub struct GoogleConfig {
    pub drive_base_url: Option<String>,
    pub drive_upload_base_url: Option<String>,
    pub calendar_base_url: Option<String>,
    /// Per-request timeout in seconds (default: 30).
    pub timeout_secs: Option<u64>,
}

/// Resolved Google endpoints with trailing slashes removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleEndpoints {
    pub drive: String,
    pub drive_upload: String,
    pub calendar: String,
    pub timeout: Duration,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        endpoints_from_config(&HubConfig::default())
    }
}

impl HubConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<HubConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        Ok(cfg)
    }

    /// Load configuration, treating a missing file as all defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file missing; using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

pub fn endpoints_from_config(cfg: &HubConfig) -> GoogleEndpoints {
    let google = cfg.google.as_ref();
    let pick = |value: Option<&String>, default: &str| {
        value
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    };
    GoogleEndpoints {
        drive: pick(google.and_then(|g| g.drive_base_url.as_ref()), DEFAULT_DRIVE_BASE_URL),
        drive_upload: pick(
            google.and_then(|g| g.drive_upload_base_url.as_ref()),
            DEFAULT_DRIVE_UPLOAD_BASE_URL,
        ),
        calendar: pick(
            google.and_then(|g| g.calendar_base_url.as_ref()),
            DEFAULT_CALENDAR_BASE_URL,
        ),
        timeout: Duration::from_secs(
            google
                .and_then(|g| g.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
                .max(1),
        ),
    }
}

/// Configured shared folder id, if any.
pub fn shared_folder_id_from_config(cfg: &HubConfig) -> Option<String> {
    non_blank(cfg.shared_folder_id.as_deref())
}

pub fn calendar_id_from_config(cfg: &HubConfig) -> String {
    non_blank(cfg.calendar_id.as_deref()).unwrap_or_else(|| DEFAULT_CALENDAR_ID.to_string())
}

/// Recordings DB path from config, else `<base_dir>/.band-hub/recordings.sqlite`.
pub fn db_path_from_config(cfg: &HubConfig, base_dir: &Path) -> PathBuf {
    non_blank(cfg.db_path.as_deref())
        .map(PathBuf::from)
        .unwrap_or_else(|| default_db_path(base_dir))
}

pub fn default_db_path(base_dir: &Path) -> PathBuf {
    base_dir.join(".band-hub").join("recordings.sqlite")
}

pub fn recording_quality_from_config(cfg: &HubConfig) -> &'static QualityPreset {
    match cfg.recording_quality.as_deref() {
        Some(id) => quality::preset(id.trim()),
        None => quality::default_preset(),
    }
}

/// Identity from the `[user]` table; requires an email.
pub fn user_from_config(cfg: &HubConfig) -> Option<UserIdentity> {
    let user = cfg.user.as_ref()?;
    let email = non_blank(user.email.as_deref())?;
    let name = non_blank(user.name.as_deref()).unwrap_or_else(|| email.clone());
    Some(UserIdentity { email, name })
}

/// Extract a Drive folder id from a bare id or a folder URL.
///
/// Accepts `https://drive.google.com/drive/folders/<id>` and
/// `https://drive.google.com/drive/u/0/folders/<id>` (query strings allowed).
pub fn extract_folder_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input.len() < 50 && !input.contains('/') && !input.contains("http") {
        return Some(input.to_string());
    }
    let (_, rest) = input.split_once("/folders/")?;
    let id: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if id.is_empty() { None } else { Some(id) }
}

/// Set or clear `shared_folder_id` in the config file on disk.
pub fn update_shared_folder(path: &Path, folder_id: Option<&str>) -> Result<()> {
    edit_config(path, |doc| match folder_id {
        Some(id) => doc["shared_folder_id"] = toml_edit::value(id),
        None => {
            doc.remove("shared_folder_id");
        }
    })
}

/// Persist the quality preset used for new recordings.
pub fn update_recording_quality(path: &Path, preset_id: &str) -> Result<()> {
    edit_config(path, |doc| {
        doc["recording_quality"] = toml_edit::value(preset_id);
    })
}

fn edit_config(path: &Path, apply: impl FnOnce(&mut toml_edit::DocumentMut)) -> Result<()> {
    let raw = if path.exists() {
        std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?
    } else {
        String::new()
    };
    let mut doc = raw
        .parse::<toml_edit::DocumentMut>()
        .with_context(|| format!("parse config {:?}", path))?;
    apply(&mut doc);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {:?}", parent))?;
    }
    std::fs::write(path, doc.to_string()).with_context(|| format!("write config {:?}", path))?;
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

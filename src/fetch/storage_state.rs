//! Cookie persistence between runs.
//!
//! The file holds `{ "cookies": [...] }` with camelCase cookie fields, the
//! same shape browser automation tools use for a storage state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Seconds since the epoch; negative for session cookies.
    #[serde(default = "session_expiry")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

fn default_path() -> String {
    "/".to_string()
}

fn session_expiry() -> f64 {
    -1.0
}

impl StoredCookie {
    #[must_use]
    pub fn is_session(&self) -> bool {
        self.expires < 0.0
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageState {
    #[serde(default)]
    cookies: Vec<StoredCookie>,
}

/// Read cookies saved by [`save_storage_state`].
///
/// # Errors
///
/// Fails when the file cannot be read or is not a storage state document.
pub fn load_storage_state(path: &Path) -> Result<Vec<StoredCookie>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read storage state {}", path.display()))?;
    let state: StorageState = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse storage state {}", path.display()))?;
    Ok(state.cookies)
}

/// Write `cookies` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Fails when the directory or file cannot be written.
pub fn save_storage_state(path: &Path, cookies: &[StoredCookie]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let state = StorageState {
        cookies: cookies.to_vec(),
    };
    let json = serde_json::to_string_pretty(&state).context("Failed to serialize storage state")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write storage state {}", path.display()))?;
    Ok(())
}

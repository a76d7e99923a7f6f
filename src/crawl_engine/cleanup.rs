//! Browser and resource cleanup
//!
//! Runs once at the end of a rendered session. Each step is attempted even
//! when an earlier one failed; failures are collected rather than raised.

use log::{debug, warn};

use crate::browser_setup::{LaunchedBrowser, ProfileDir};

/// Result of cleanup operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupResult {
    /// All cleanup operations succeeded
    Success,
    /// Some cleanup operations failed, with error details
    PartialFailure(Vec<String>),
}

impl CleanupResult {
    /// Log a partial failure under the cleanup target.
    pub fn log(&self) {
        if let Self::PartialFailure(errors) = self {
            for error in errors {
                warn!(target: "sitescout::cleanup", "{error}");
            }
        }
    }
}

/// Close the browser, stop its handler task and remove a temporary profile.
pub async fn cleanup_browser_and_data(launched: LaunchedBrowser) -> CleanupResult {
    let LaunchedBrowser {
        mut browser,
        handler,
        profile,
    } = launched;
    let mut errors = Vec::new();

    debug!(target: "sitescout::cleanup", "Closing browser");
    if let Err(e) = browser.close().await {
        warn!(target: "sitescout::cleanup", "Failed to close browser: {e}");
        errors.push(format!("Browser close failed: {e}"));
    }

    // Chrome must release its profile files before the directory goes away
    debug!(target: "sitescout::cleanup", "Waiting for browser process to exit");
    if let Err(e) = browser.wait().await {
        warn!(target: "sitescout::cleanup", "Failed to wait for browser exit: {e}");
        errors.push(format!("Browser wait failed: {e}"));
    }

    handler.abort();

    match profile {
        ProfileDir::Temporary(dir) => {
            let path = dir.path().to_path_buf();
            debug!(target: "sitescout::cleanup", "Removing profile {}", path.display());
            if let Err(e) = dir.close() {
                warn!(target: "sitescout::cleanup", "Failed to remove {}: {e}", path.display());
                errors.push(format!("Directory cleanup failed: {e}"));
            }
        }
        ProfileDir::Persistent(path) => {
            debug!(target: "sitescout::cleanup", "Keeping profile {}", path.display());
        }
    }

    if errors.is_empty() {
        CleanupResult::Success
    } else {
        CleanupResult::PartialFailure(errors)
    }
}

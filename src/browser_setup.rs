//! Chromium discovery and launch for rendered sessions.
//!
//! Lookup order: `CHROMIUM_PATH`, the usual install locations for the
//! platform, `which`, and finally a managed download into the user cache.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use chromiumoxide::Handler;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::config::CrawlConfig;

const BROWSER_ENV_VAR: &str = "CHROMIUM_PATH";
const CDP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const WINDOW_SIZE: (u32, u32) = (1366, 900);

/// Flags for an unattended discovery browser.
const CHROME_FLAGS: &[&str] = &[
    "--no-first-run",
    "--no-default-browser-check",
    "--no-sandbox",
    "--disable-extensions",
    "--disable-infobars",
    "--disable-notifications",
    "--disable-popup-blocking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
    "--password-store=basic",
    "--use-mock-keychain",
    "--mute-audio",
];

#[cfg(target_os = "windows")]
const INSTALL_LOCATIONS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files\Chromium\Application\chrome.exe",
];

#[cfg(target_os = "macos")]
const INSTALL_LOCATIONS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "~/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/opt/homebrew/bin/chromium",
];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const INSTALL_LOCATIONS: &[&str] = &[
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/snap/bin/chromium",
    "/usr/local/bin/chromium",
    "/opt/google/chrome/chrome",
];

const PATH_COMMANDS: &[&str] = &["chromium", "chromium-browser", "google-chrome", "chrome"];

/// How the browser for a rendered session is started.
#[derive(Debug, Clone, Default)]
pub struct BrowserOptions {
    pub headless: bool,
    pub ignore_https_errors: bool,
    /// Persistent profile directory. A throwaway one is created when unset.
    pub user_data_dir: Option<PathBuf>,
}

impl BrowserOptions {
    #[must_use]
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            headless: config.headless(),
            ignore_https_errors: config.ignore_https_errors(),
            user_data_dir: config.chrome_data_dir().cloned(),
        }
    }

    fn chrome_args(&self) -> Vec<&'static str> {
        let mut args = CHROME_FLAGS.to_vec();
        if self.ignore_https_errors {
            args.push("--ignore-certificate-errors");
        }
        args
    }
}

/// Chrome profile directory used by a launched browser.
#[derive(Debug)]
pub enum ProfileDir {
    /// Removed when the browser is cleaned up.
    Temporary(TempDir),
    /// Caller-supplied; left in place.
    Persistent(PathBuf),
}

impl ProfileDir {
    fn prepare(user_data_dir: Option<&Path>) -> Result<Self> {
        match user_data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create profile directory {}", dir.display()))?;
                Ok(Self::Persistent(dir.to_path_buf()))
            }
            None => tempfile::Builder::new()
                .prefix("sitescout-chrome-")
                .tempdir()
                .map(Self::Temporary)
                .context("Failed to create temporary profile directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Temporary(dir) => dir.path(),
            Self::Persistent(path) => path,
        }
    }
}

/// A running browser together with its CDP handler task and profile.
pub struct LaunchedBrowser {
    pub browser: Browser,
    pub handler: JoinHandle<()>,
    pub profile: ProfileDir,
}

fn expand_home(location: &str) -> Option<PathBuf> {
    match location.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(location)),
    }
}

fn which(command: &str) -> Option<PathBuf> {
    let output = Command::new("which").arg(command).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!found.is_empty()).then(|| PathBuf::from(found))
}

/// Locate an installed Chrome or Chromium.
///
/// # Errors
///
/// Fails when no executable is found by any lookup.
pub fn find_browser_executable() -> Result<PathBuf> {
    if let Ok(raw) = std::env::var(BROWSER_ENV_VAR) {
        let path = PathBuf::from(raw);
        if path.exists() {
            info!("Using browser from {BROWSER_ENV_VAR}: {}", path.display());
            return Ok(path);
        }
        warn!("{BROWSER_ENV_VAR} points to a missing file: {}", path.display());
    }

    if let Some(path) = INSTALL_LOCATIONS
        .iter()
        .filter_map(|location| expand_home(location))
        .find(|path| path.exists())
    {
        info!("Found browser at {}", path.display());
        return Ok(path);
    }

    if !cfg!(target_os = "windows")
        && let Some(path) = PATH_COMMANDS.iter().find_map(|cmd| which(cmd))
    {
        info!("Found browser on PATH: {}", path.display());
        return Ok(path);
    }

    Err(anyhow::anyhow!("no Chrome/Chromium executable found"))
}

/// Download a managed Chromium into the user cache directory.
///
/// # Errors
///
/// Fails when the cache directory cannot be created or the download fails.
pub async fn download_managed_browser() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sitescout")
        .join("chromium");
    info!("Downloading Chromium into {}", cache_dir.display());
    tokio::fs::create_dir_all(&cache_dir)
        .await
        .with_context(|| format!("Failed to create {}", cache_dir.display()))?;

    let options = BrowserFetcherOptions::builder()
        .with_path(&cache_dir)
        .build()
        .context("Failed to build fetcher options")?;
    let revision = BrowserFetcher::new(options)
        .fetch()
        .await
        .context("Failed to download Chromium")?;

    info!("Chromium ready at {}", revision.executable_path.display());
    Ok(revision.executable_path)
}

// chromiumoxide lags behind Chrome's CDP; unknown events fail to decode
fn is_benign_cdp_error(message: &str) -> bool {
    message.contains("data did not match any variant of untagged enum Message")
        || message.contains("Failed to deserialize WS response")
}

fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                let message = e.to_string();
                if is_benign_cdp_error(&message) {
                    trace!("Ignoring undecodable CDP message: {message}");
                } else {
                    error!("Browser handler error: {e:?}");
                }
            }
        }
        debug!("Browser handler finished");
    })
}

/// Find or download Chromium and launch it with `options`.
///
/// # Errors
///
/// Fails when no browser is available, the profile directory cannot be
/// prepared, or Chromium does not start.
pub async fn launch_browser(options: &BrowserOptions) -> Result<LaunchedBrowser> {
    let executable = match find_browser_executable() {
        Ok(path) => path,
        Err(e) => {
            warn!("{e}; falling back to a managed download");
            download_managed_browser().await?
        }
    };
    let profile = ProfileDir::prepare(options.user_data_dir.as_deref())?;

    let mut builder = BrowserConfigBuilder::default()
        .request_timeout(CDP_REQUEST_TIMEOUT)
        .window_size(WINDOW_SIZE.0, WINDOW_SIZE.1)
        .user_data_dir(profile.path())
        .chrome_executable(executable)
        .args(options.chrome_args());
    builder = if options.headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };
    if !options.ignore_https_errors {
        builder = builder.respect_https_errors();
    }

    let browser_config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid browser configuration: {e}"))?;

    debug!(
        "Launching browser (headless: {}, profile: {})",
        options.headless,
        profile.path().display()
    );
    let (browser, handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch browser")?;

    Ok(LaunchedBrowser {
        browser,
        handler: spawn_handler(handler),
        profile,
    })
}

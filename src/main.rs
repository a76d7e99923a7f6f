// sitescout: discover the pages and interactive elements of a site.
//
// Crawls same-origin pages breadth-first and writes them as a YAML listing.
// With --extract, every page's buttons, inputs, links and textareas are also
// written as one JSON file per page.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sitescout::config::{CrawlConfig, LoginConfig, WaitUntil};
use sitescout::crawl_engine::{CancelFlag, CrawlError, LogProgress, PageTarget, crawl_impl, load_targets};
use sitescout::output::write_pages_yaml;
use sitescout::utils::{
    DEFAULT_MAX_BYTES, DEFAULT_OUTPUT_PATH, DEFAULT_PAGES_DIR, DEFAULT_SAFETY_CONFIG,
    DEFAULT_SCROLL_DELAY_MS, DEFAULT_SCROLL_STEPS, DEFAULT_USER_AGENT,
};

const EXIT_CONFIG: u8 = 2;
const EXIT_FAILURE: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

/// Crawl the same-origin pages of a site and list their URLs and titles as YAML.
#[derive(Parser, Debug)]
#[command(name = "sitescout", version, about)]
struct Cli {
    /// Start URL, e.g. https://example.com/
    #[arg(required_unless_present = "urls")]
    start_url: Option<String>,

    /// Output YAML file
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Maximum number of pages to record
    #[arg(long, default_value_t = 1000)]
    max_pages: usize,

    /// Maximum link depth (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    max_depth: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "10", value_parser = parse_seconds)]
    timeout: Duration,

    /// Pause between requests in seconds
    #[arg(long, default_value = "0", value_parser = parse_seconds)]
    delay: Duration,

    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Keep URL fragments (needed for hash-routed single-page apps)
    #[arg(long)]
    keep_fragment: bool,

    /// Maximum bytes read from one response
    #[arg(long, default_value_t = DEFAULT_MAX_BYTES)]
    max_bytes: usize,

    /// Fetch through a headless Chromium session (implied by --login-url)
    #[arg(long, alias = "playwright")]
    rendered: bool,

    /// Navigation wait condition: load, domcontentloaded or networkidle
    #[arg(long, default_value = "networkidle")]
    wait_until: WaitUntil,

    /// Show the browser window
    #[arg(long = "no-headless", action = ArgAction::SetFalse)]
    headless: bool,

    /// Ignore TLS certificate errors (self-signed intranet hosts)
    #[arg(long)]
    ignore_https_errors: bool,

    /// Scroll each page to trigger lazy loading
    #[arg(long)]
    scroll: bool,

    #[arg(long, default_value_t = DEFAULT_SCROLL_STEPS)]
    scroll_steps: u32,

    #[arg(long, default_value_t = DEFAULT_SCROLL_DELAY_MS)]
    scroll_delay_ms: u64,

    /// Chrome profile directory to reuse instead of a temporary one
    #[arg(long)]
    chrome_profile: Option<PathBuf>,

    /// Cookie file restored before the crawl and rewritten after login
    #[arg(long)]
    storage_state: Option<PathBuf>,

    /// Login page URL
    #[arg(long, help_heading = "Login")]
    login_url: Option<String>,

    /// Username (or SITESCOUT_USERNAME)
    #[arg(long, help_heading = "Login")]
    username: Option<String>,

    /// Password (or SITESCOUT_PASSWORD)
    #[arg(long, help_heading = "Login")]
    password: Option<String>,

    #[arg(long, help_heading = "Login")]
    username_selector: Option<String>,

    /// "Next" button between the username and password steps
    #[arg(long, help_heading = "Login")]
    next_selector: Option<String>,

    #[arg(long, help_heading = "Login")]
    password_selector: Option<String>,

    #[arg(long, help_heading = "Login")]
    submit_selector: Option<String>,

    /// Selector that appears once login succeeded
    #[arg(long, help_heading = "Login")]
    post_login_selector: Option<String>,

    /// Write the interactive elements of every page as JSON
    #[arg(long, help_heading = "Extraction")]
    extract: bool,

    /// Extract these pages instead of crawling: comma-separated URLs, a .txt
    /// file or a YAML list of {name, url}
    #[arg(long, help_heading = "Extraction")]
    urls: Option<String>,

    /// Open popups and dialogs to find hidden elements (rendered mode)
    #[arg(long, help_heading = "Extraction")]
    explore: bool,

    /// Directory for per-page element files
    #[arg(long, default_value = DEFAULT_PAGES_DIR, help_heading = "Extraction")]
    pages_dir: PathBuf,

    /// Safety rules for exploration
    #[arg(long, default_value = DEFAULT_SAFETY_CONFIG, help_heading = "Extraction")]
    safety_config: PathBuf,

    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_seconds(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("'{raw}' is not a number: {e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("'{raw}' is not a valid duration: {e}"))
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn login_config(cli: &Cli) -> Option<LoginConfig> {
    let login_url = cli.login_url.as_ref()?;
    let mut login = LoginConfig::new(login_url.clone());
    login.username = cli
        .username
        .clone()
        .or_else(|| std::env::var("SITESCOUT_USERNAME").ok());
    login.password = cli
        .password
        .clone()
        .or_else(|| std::env::var("SITESCOUT_PASSWORD").ok());
    login.username_selector = cli.username_selector.clone();
    login.next_selector = cli.next_selector.clone();
    login.password_selector = cli.password_selector.clone();
    login.submit_selector = cli.submit_selector.clone();
    login.post_login_selector = cli.post_login_selector.clone();
    Some(login)
}

fn build_config(cli: &Cli, start_url: &str) -> anyhow::Result<CrawlConfig> {
    // Round partial seconds up so a sub-second timeout never becomes zero
    let timeout_secs = cli.timeout.as_secs() + u64::from(cli.timeout.subsec_nanos() > 0);

    let builder = CrawlConfig::builder()
        .output_path(&cli.output)
        .start_url(start_url)
        .max_pages(cli.max_pages)
        .max_depth(cli.max_depth)
        .timeout_secs(timeout_secs)
        .delay(cli.delay)
        .user_agent(&cli.user_agent)
        .keep_fragment(cli.keep_fragment)
        .max_bytes(cli.max_bytes)
        .rendered(cli.rendered)
        .wait_until(cli.wait_until)
        .headless(cli.headless)
        .ignore_https_errors(cli.ignore_https_errors)
        .auto_scroll(cli.scroll, cli.scroll_steps, cli.scroll_delay_ms)
        .storage_state_path(cli.storage_state.clone())
        .extract_elements(cli.extract || cli.urls.is_some())
        .explore(cli.explore)
        .safety_config_path(&cli.safety_config)
        .pages_dir(&cli.pages_dir);

    let builder = match login_config(cli) {
        Some(login) => builder.login(login),
        None => builder,
    };
    let config = builder.build()?;

    Ok(match &cli.chrome_profile {
        Some(dir) => config.with_chrome_data_dir(dir.clone()),
        None => config,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let targets: Option<Vec<PageTarget>> = match cli.urls.as_deref().map(load_targets).transpose() {
        Ok(targets) => targets,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    // With an explicit target list the first target only seeds the config
    let start_url = cli
        .start_url
        .clone()
        .or_else(|| targets.as_ref()?.first().map(|t| t.url.clone()));
    let Some(start_url) = start_url else {
        error!("a start URL or --urls is required");
        return ExitCode::from(EXIT_CONFIG);
    };

    let config = match build_config(&cli, &start_url) {
        Ok(config) => config,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; finishing the current page");
            on_interrupt.cancel();
        }
    });

    let crawled = targets.is_none();
    let discovery = match crawl_impl(&config, targets, &LogProgress, &cancel).await {
        Ok(discovery) => discovery,
        Err(CrawlError::Config(msg)) => {
            error!("Configuration error: {msg}");
            return ExitCode::from(EXIT_CONFIG);
        }
        Err(e) => {
            error!("{e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    if crawled {
        if let Err(e) = write_pages_yaml(config.output_path(), &discovery.pages).await {
            error!("{e:#}");
            return ExitCode::from(EXIT_FAILURE);
        }
        println!(
            "Saved {} pages to {}",
            discovery.pages.len(),
            config.output_path().display()
        );
    }
    if config.extract_elements() {
        info!(
            "Wrote {} element files to {}",
            discovery.element_files.len(),
            config.pages_dir().display()
        );
    }

    if cancel.is_cancelled() {
        warn!("Interrupted by user");
        return ExitCode::from(EXIT_INTERRUPTED);
    }
    ExitCode::SUCCESS
}

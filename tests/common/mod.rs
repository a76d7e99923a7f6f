//! Test utilities and helper functions for the sitescout test suite

use anyhow::Result;
use async_trait::async_trait;
use mockito::{Mock, Server};
use serde_json::{Value, json};
use sitescout::config::{CrawlConfig, WaitUntil};
use sitescout::crawl_engine::page_timeout::with_page_timeout;
use sitescout::crawl_engine::{Page, ProgressReporter, SkipReason};
use sitescout::fetch::{RenderedSession, StoredCookie};
use sitescout::page_extractor::DomSnapshot;
use sitescout::page_extractor::js_scripts::{
    CONTENT_TYPE_SCRIPT, DIALOG_VISIBLE_SCRIPT, LINKS_SCRIPT, SNAPSHOT_SCRIPT, TITLE_SCRIPT,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// Creates a temporary directory for test output
#[allow(dead_code)]
pub fn create_test_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test HTML document with specified content
#[allow(dead_code)]
pub fn create_test_html(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{}</title>
</head>
<body>
    {}
</body>
</html>"#,
        html_escape::encode_text(title),
        body
    )
}

/// Creates a mock endpoint that returns HTML content
#[allow(dead_code)]
pub fn create_html_mock(server: &mut Server, path: &str, html: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(html)
        .create()
}

/// Creates a mock endpoint with an arbitrary content type
#[allow(dead_code)]
pub fn create_typed_mock(server: &mut Server, path: &str, content_type: &str, body: &[u8]) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", content_type)
        .with_body(body)
        .create()
}

/// Creates a mock endpoint that returns a redirect
#[allow(dead_code)]
pub fn create_redirect_mock(server: &mut Server, from: &str, to: &str) -> Mock {
    server
        .mock("GET", from)
        .with_status(301)
        .with_header("location", to)
        .create()
}

/// Creates a mock endpoint that returns an error
#[allow(dead_code)]
pub fn create_error_mock(server: &mut Server, path: &str, status: usize) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_body("Error")
        .create()
}

/// Helper to create test URLs
#[allow(dead_code)]
pub fn test_url(server: &Server, path: &str) -> String {
    format!("{}{}", server.url(), path)
}

/// Creates a crawl configuration writing into `output_dir`
#[allow(dead_code)]
pub fn create_test_config(output_dir: &Path, start_url: &str) -> CrawlConfig {
    CrawlConfig::builder()
        .output_path(output_dir.join("site.yaml"))
        .start_url(start_url)
        .max_pages(10)
        .timeout_secs(5)
        .pages_dir(output_dir.join("pages"))
        .build()
        .expect("Failed to create test config")
}

/// Verifies that a file exists and has content
#[allow(dead_code)]
pub async fn assert_file_exists_with_content(path: &Path) -> Result<String> {
    assert!(path.exists(), "File does not exist: {path:?}");
    let content = tokio::fs::read_to_string(path).await?;
    assert!(!content.is_empty(), "File is empty: {path:?}");
    Ok(content)
}

/// Progress reporter that remembers every skip
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingProgress {
    pub started: Mutex<Vec<String>>,
    pub skipped: Mutex<Vec<(String, SkipReason)>>,
    pub recorded: Mutex<Vec<Page>>,
}

impl ProgressReporter for RecordingProgress {
    fn report_fetch_started(&self, url: &str, _depth: u32) {
        self.started.lock().unwrap().push(url.to_string());
    }

    fn report_page_recorded(&self, page: &Page, _recorded: usize) {
        self.recorded.lock().unwrap().push(page.clone());
    }

    fn report_skipped(&self, url: &str, reason: &SkipReason) {
        self.skipped
            .lock()
            .unwrap()
            .push((url.to_string(), reason.clone()));
    }

    fn report_completed(&self, _recorded: usize) {}
}

/// A page served by [`FakeSession`]
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct FakePage {
    pub html: String,
    pub content_type: String,
    /// Where navigation actually ends up, when it redirects
    pub lands_on: Option<String>,
    /// Links as the browser would report them: `(raw, abs)`
    pub links: Vec<(String, Option<String>)>,
    /// Markup after any node click, with a dialog showing until Escape
    pub opened: Option<String>,
}

#[allow(dead_code)]
impl FakePage {
    pub fn html(html: &str) -> Self {
        Self {
            html: html.to_string(),
            content_type: "text/html".to_string(),
            ..Self::default()
        }
    }

    pub fn link(mut self, raw: &str, abs: &str) -> Self {
        self.links.push((raw.to_string(), Some(abs.to_string())));
        self
    }

    pub fn typed(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    pub fn redirects_to(mut self, url: &str) -> Self {
        self.lands_on = Some(url.to_string());
        self
    }

    pub fn opens_dialog(mut self, html: &str) -> Self {
        self.opened = Some(html.to_string());
        self
    }
}

#[derive(Default)]
struct FakeState {
    current: String,
    cookies: Vec<StoredCookie>,
    events: Vec<String>,
    dialog_open: bool,
}

/// In-memory [`RenderedSession`] serving canned pages.
///
/// Scripts are answered by identity with the extraction scripts; anything
/// else evaluates to `null`. Navigating to an unknown URL times out.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeSession {
    pages: HashMap<String, FakePage>,
    /// Selectors that exist on every page
    present: HashSet<String>,
    /// Cookies handed out once a submit click happened
    login_cookies: Vec<StoredCookie>,
    state: Mutex<FakeState>,
}

#[allow(dead_code)]
impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn selector(mut self, selector: &str) -> Self {
        self.present.insert(selector.to_string());
        self
    }

    pub fn issues_cookie_on_submit(mut self, cookie: StoredCookie) -> Self {
        self.login_cookies.push(cookie);
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn cookie_jar(&self) -> Vec<StoredCookie> {
        self.state.lock().unwrap().cookies.clone()
    }

    fn current_page(&self) -> Option<FakePage> {
        let state = self.state.lock().unwrap();
        self.pages
            .get(&state.current)
            .or_else(|| {
                self.pages
                    .values()
                    .find(|p| p.lands_on.as_deref() == Some(state.current.as_str()))
            })
            .cloned()
    }

    fn log(&self, event: String) {
        self.state.lock().unwrap().events.push(event);
    }

    fn require(&self, selector: &str) -> Result<()> {
        if self.present.contains(selector) {
            Ok(())
        } else {
            Err(anyhow::anyhow!("No element matches {selector}"))
        }
    }
}

#[async_trait]
impl RenderedSession for FakeSession {
    async fn navigate(&self, url: &str, _wait: WaitUntil, _timeout: Duration) -> Result<()> {
        self.log(format!("goto {url}"));
        let Some(page) = self.pages.get(url) else {
            // Unknown pages never finish loading
            return with_page_timeout(
                std::future::pending::<Result<()>>(),
                Duration::from_millis(5),
                "navigation",
            )
            .await;
        };
        let landed = page.lands_on.clone().unwrap_or_else(|| url.to_string());
        self.state.lock().unwrap().current = landed;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().current.clone())
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let page = self.current_page().unwrap_or_default();
        let dialog_open = self.state.lock().unwrap().dialog_open;
        let value = if script == CONTENT_TYPE_SCRIPT {
            json!(page.content_type)
        } else if script == TITLE_SCRIPT {
            let title = sitescout::page_extractor::extract_links(&page.html)?.title;
            json!(title)
        } else if script == LINKS_SCRIPT {
            let links: Vec<Value> = page
                .links
                .iter()
                .map(|(raw, abs)| json!({ "raw": raw, "abs": abs }))
                .collect();
            Value::Array(links)
        } else if script == SNAPSHOT_SCRIPT {
            let html = match &page.opened {
                Some(opened) if dialog_open => opened,
                _ => &page.html,
            };
            serde_json::to_value(DomSnapshot::from_html(html))?
        } else if script == DIALOG_VISIBLE_SCRIPT {
            json!(dialog_open)
        } else {
            Value::Null
        };
        Ok(value)
    }

    async fn wait_for_load(&self, wait: WaitUntil, _timeout: Duration) -> Result<()> {
        self.log(format!("wait {wait}"));
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.require(selector)?;
        self.log(format!("fill {selector}={value}"));
        Ok(())
    }

    async fn click_selector(&self, selector: &str) -> Result<()> {
        self.require(selector)?;
        self.log(format!("click {selector}"));
        if !self.login_cookies.is_empty() {
            self.state
                .lock()
                .unwrap()
                .cookies
                .extend(self.login_cookies.iter().cloned());
        }
        Ok(())
    }

    async fn wait_for_visible(&self, selector: &str, _timeout: Duration) -> Result<()> {
        self.require(selector)
    }

    async fn hover_node(&self, index: usize) -> Result<()> {
        self.log(format!("hover {index}"));
        Ok(())
    }

    async fn click_node(&self, index: usize) -> Result<()> {
        self.log(format!("click node {index}"));
        let opens = self.current_page().is_some_and(|p| p.opened.is_some());
        self.state.lock().unwrap().dialog_open = opens;
        Ok(())
    }

    async fn press_escape(&self) -> Result<()> {
        self.log("escape".to_string());
        self.state.lock().unwrap().dialog_open = false;
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<StoredCookie>> {
        Ok(self.state.lock().unwrap().cookies.clone())
    }

    async fn set_cookies(&self, cookies: &[StoredCookie]) -> Result<()> {
        self.log(format!("set {} cookies", cookies.len()));
        self.state.lock().unwrap().cookies.extend(cookies.iter().cloned());
        Ok(())
    }
}

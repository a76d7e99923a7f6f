//! Rendered fetching, login and session preparation over an in-memory session

use sitescout::config::{CrawlConfig, LoginConfig};
use sitescout::crawl_engine::{
    CancelFlag, NoOpProgress, crawl_site, discover_rendered, prepare_session,
};
use sitescout::fetch::{
    ChromiumSession, FetchError, FetchedContent, Fetcher, LoginStep, RenderedFetcher,
    StoredCookie, load_storage_state, perform_login, save_storage_state,
};
use sitescout::{ElementTag, PageElements};
use std::path::Path;
use std::time::Duration;

mod common;
use common::{
    FakePage, FakeSession, RecordingProgress, create_test_dir, create_test_html,
};

const HOME: &str = "https://app.example/";
const LOGIN: &str = "https://app.example/login";

fn rendered_config(dir: &Path) -> CrawlConfig {
    CrawlConfig::builder()
        .output_path(dir.join("site.yaml"))
        .start_url(HOME)
        .rendered(true)
        .timeout_secs(1)
        .pages_dir(dir.join("pages"))
        .build()
        .unwrap()
}

fn login_form() -> LoginConfig {
    LoginConfig::new(LOGIN)
        .credentials("alice", "s3cret")
        .username_selector("#user")
        .password_selector("#pass")
        .submit_selector("#go")
}

fn session_cookie() -> StoredCookie {
    StoredCookie {
        name: "sid".to_string(),
        value: "abc123".to_string(),
        domain: "app.example".to_string(),
        path: "/".to_string(),
        expires: -1.0,
        http_only: true,
        secure: true,
        same_site: Some("Lax".to_string()),
    }
}

#[tokio::test]
async fn test_navigation_timeout_is_classified() {
    let temp_dir = create_test_dir().unwrap();
    let config = rendered_config(temp_dir.path());
    let session = FakeSession::new();
    let mut fetcher = RenderedFetcher::new(&session, &config);

    let err = fetcher.fetch("https://app.example/slow").await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn test_live_dom_title_and_links_are_returned() {
    let temp_dir = create_test_dir().unwrap();
    let config = rendered_config(temp_dir.path());
    let session = FakeSession::new().page(
        HOME,
        FakePage::html(&create_test_html("Dashboard", ""))
            .link("/reports", "https://app.example/reports")
            .link("#", "https://app.example/#"),
    );
    let mut fetcher = RenderedFetcher::new(&session, &config);

    let result = fetcher.fetch(HOME).await.unwrap();
    assert_eq!(result.final_url, HOME);
    assert_eq!(result.content_type.as_deref(), Some("text/html"));
    assert!(result.charset.is_none());
    let FetchedContent::Live { title, links } = result.content else {
        panic!("expected live content");
    };
    assert_eq!(title, "Dashboard");
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].raw, "/reports");
    assert_eq!(links[0].abs.as_deref(), Some("https://app.example/reports"));
}

#[tokio::test]
async fn test_non_html_document_skips_dom_reads() {
    let temp_dir = create_test_dir().unwrap();
    let config = rendered_config(temp_dir.path());
    let pdf = "https://app.example/manual.pdf";
    let session = FakeSession::new().page(
        pdf,
        FakePage::html("<title>ignored</title>")
            .typed("application/pdf")
            .link("/a", "https://app.example/a"),
    );
    let mut fetcher = RenderedFetcher::new(&session, &config);

    let result = fetcher.fetch(pdf).await.unwrap();
    assert!(!result.is_html());
    match result.content {
        FetchedContent::Live { title, links } => {
            assert!(title.is_empty());
            assert!(links.is_empty());
        }
        FetchedContent::Html(_) => panic!("rendered fetch returned markup"),
    }
}

#[tokio::test]
async fn test_crawl_through_rendered_session() {
    let temp_dir = create_test_dir().unwrap();
    let config = rendered_config(temp_dir.path());
    let session = FakeSession::new()
        .page(
            HOME,
            FakePage::html(&create_test_html("Home", ""))
                .link("/a", "https://app.example/a")
                .link("#", "https://app.example/#")
                .link("https://other.example/x", "https://other.example/x")
                .link("javascript:void(0)", "javascript:void(0)"),
        )
        .page(
            "https://app.example/a",
            FakePage::html(&create_test_html("Page A", "")).link("/", HOME),
        );
    let mut fetcher = RenderedFetcher::new(&session, &config);
    let progress = RecordingProgress::default();

    let pages = crawl_site(&config, &mut fetcher, &progress, &CancelFlag::new())
        .await
        .unwrap();

    let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls, [HOME, "https://app.example/a"]);
    assert_eq!(pages[1].title, "Page A");
    assert_eq!(progress.started.lock().unwrap().len(), 2);
    assert!(progress.skipped.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_continues_past_a_failed_step() {
    let session = FakeSession::new()
        .page(LOGIN, FakePage::html(&create_test_html("Sign in", "")))
        .selector("#user")
        .selector("#pass")
        .selector("#go");
    let config = CrawlConfig::builder()
        .output_path("site.yaml")
        .start_url(HOME)
        .login(login_form().next_selector("#next"))
        .build()
        .unwrap();

    let outcome = perform_login(
        &session,
        config.login().unwrap(),
        config.wait_until(),
        Duration::from_secs(1),
    )
    .await;

    assert_eq!(outcome.failed_steps, [LoginStep::Next]);
    let events = session.events();
    assert_eq!(events[0], format!("goto {LOGIN}"));
    assert!(events.contains(&"fill #user=alice".to_string()));
    assert!(events.contains(&"fill #pass=s3cret".to_string()));
    assert!(events.contains(&"click #go".to_string()));
    assert_eq!(events.last().map(String::as_str), Some("wait networkidle"));
}

#[tokio::test]
async fn test_login_cookies_are_saved_to_storage_state() {
    let temp_dir = create_test_dir().unwrap();
    let state_path = temp_dir.path().join("state.json");
    let session = FakeSession::new()
        .page(LOGIN, FakePage::html(&create_test_html("Sign in", "")))
        .selector("#user")
        .selector("#pass")
        .selector("#go")
        .issues_cookie_on_submit(session_cookie());
    let config = CrawlConfig::builder()
        .output_path(temp_dir.path().join("site.yaml"))
        .start_url(HOME)
        .login(login_form())
        .storage_state_path(Some(state_path.clone()))
        .build()
        .unwrap();

    prepare_session(&session, &config).await;

    let saved = load_storage_state(&state_path).unwrap();
    assert_eq!(saved, [session_cookie()]);
}

#[tokio::test]
async fn test_saved_cookies_are_restored_without_login() {
    let temp_dir = create_test_dir().unwrap();
    let state_path = temp_dir.path().join("state.json");
    save_storage_state(&state_path, &[session_cookie()]).unwrap();

    let session = FakeSession::new();
    let config = CrawlConfig::builder()
        .output_path(temp_dir.path().join("site.yaml"))
        .start_url(HOME)
        .rendered(true)
        .storage_state_path(Some(state_path))
        .build()
        .unwrap();

    prepare_session(&session, &config).await;

    assert_eq!(session.cookie_jar(), [session_cookie()]);
    assert_eq!(session.events(), ["set 1 cookies"]);
}

#[tokio::test]
async fn test_broken_storage_state_is_ignored() {
    let temp_dir = create_test_dir().unwrap();
    let state_path = temp_dir.path().join("state.json");
    std::fs::write(&state_path, "not json").unwrap();

    let session = FakeSession::new();
    let config = CrawlConfig::builder()
        .output_path(temp_dir.path().join("site.yaml"))
        .start_url(HOME)
        .rendered(true)
        .storage_state_path(Some(state_path))
        .build()
        .unwrap();

    prepare_session(&session, &config).await;
    assert!(session.cookie_jar().is_empty());
}

#[tokio::test]
async fn test_rendered_discovery_extracts_every_crawled_page() {
    let temp_dir = create_test_dir().unwrap();
    let config = CrawlConfig::builder()
        .output_path(temp_dir.path().join("site.yaml"))
        .start_url(HOME)
        .rendered(true)
        .extract_elements(true)
        .pages_dir(temp_dir.path().join("pages"))
        .build()
        .unwrap();
    let session = FakeSession::new()
        .page(
            HOME,
            FakePage::html(&create_test_html(
                "Home",
                r#"<a href="/settings">Settings</a><button>Refresh</button>"#,
            ))
            .link("/settings", "https://app.example/settings"),
        )
        .page(
            "https://app.example/settings",
            FakePage::html(&create_test_html(
                "User Settings",
                r#"<input name="email" type="email"><textarea id="bio"></textarea>"#,
            )),
        );

    let discovery = discover_rendered(&session, &config, None, &NoOpProgress, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(discovery.pages.len(), 2);
    let pages_dir = temp_dir.path().join("pages");
    assert_eq!(
        discovery.element_files,
        [pages_dir.join("home.json"), pages_dir.join("user_settings.json")]
    );

    let settings: PageElements = serde_json::from_str(
        &common::assert_file_exists_with_content(&discovery.element_files[1])
            .await
            .unwrap(),
    )
    .unwrap();
    assert_eq!(settings.url, "https://app.example/settings");
    let tags: Vec<ElementTag> = settings.elements.iter().map(|e| e.tag).collect();
    assert_eq!(tags, [ElementTag::Input, ElementTag::Textarea]);
}

#[tokio::test]
#[ignore = "requires a local Chrome or Chromium"]
async fn test_real_browser_crawl() {
    let mut server = mockito::Server::new_async().await;
    let _home = common::create_html_mock(
        &mut server,
        "/",
        &create_test_html("Home", r#"<a href="/next">Next</a>"#),
    );
    let _next = common::create_html_mock(&mut server, "/next", &create_test_html("Next", ""));

    let temp_dir = create_test_dir().unwrap();
    let config = CrawlConfig::builder()
        .output_path(temp_dir.path().join("site.yaml"))
        .start_url(format!("{}/", server.url()))
        .rendered(true)
        .build()
        .unwrap();

    let session = ChromiumSession::launch(&config).await.unwrap();
    let discovery = discover_rendered(&session, &config, None, &NoOpProgress, &CancelFlag::new()).await;
    session.close().await;

    let titles: Vec<String> = discovery.unwrap().pages.into_iter().map(|p| p.title).collect();
    assert_eq!(titles, ["Home", "Next"]);
}

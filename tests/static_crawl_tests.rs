//! End-to-end static crawls against a mock HTTP server

use mockito::Server;
use sitescout::config::CrawlConfig;
use sitescout::crawl_engine::{
    CancelFlag, NoOpProgress, PageTarget, SkipReason, crawl_impl, crawl_site,
};
use sitescout::fetch::{FetchedContent, Fetcher, StaticFetcher};
use sitescout::output::write_pages_yaml;
use sitescout::{ElementTag, Page, PageElements};

mod common;
use common::{
    RecordingProgress, create_error_mock, create_html_mock, create_redirect_mock,
    create_test_config, create_test_dir, create_test_html, create_typed_mock, test_url,
};

fn site_root(server: &Server) -> String {
    format!("{}/", server.url())
}

#[tokio::test]
async fn test_crawl_follows_same_origin_links_breadth_first() {
    let mut server = Server::new_async().await;
    let _home = create_html_mock(
        &mut server,
        "/",
        &create_test_html(
            "Home",
            r##"<a href="/a">A</a> <a href="b">B</a> <a href="https://elsewhere.example/">Out</a>
               <a href="mailto:team@example.com">Mail</a> <a href="#top">Top</a>"##,
        ),
    );
    let _a = create_html_mock(
        &mut server,
        "/a",
        &create_test_html("Page   A", r#"<a href="/a/deep">Deeper</a> <a href="/">Home</a>"#),
    );
    let _b = create_html_mock(&mut server, "/b", &create_test_html("Page B", ""));
    let _deep = create_html_mock(&mut server, "/a/deep", &create_test_html("Deep", ""));

    let temp_dir = create_test_dir().unwrap();
    let config = create_test_config(temp_dir.path(), &site_root(&server));
    let progress = RecordingProgress::default();

    let discovery = crawl_impl(&config, None, &progress, &CancelFlag::new())
        .await
        .unwrap();

    let urls: Vec<&str> = discovery.pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        [
            site_root(&server),
            test_url(&server, "/a"),
            test_url(&server, "/b"),
            test_url(&server, "/a/deep"),
        ]
    );
    assert_eq!(discovery.pages[1].title, "Page A");
    assert!(discovery.element_files.is_empty());

    let started = progress.started.lock().unwrap();
    assert!(started.iter().all(|u| !u.contains("elsewhere.example")));
    assert_eq!(started.len(), 4);
}

#[tokio::test]
async fn test_non_html_and_failed_pages_are_skipped() {
    let mut server = Server::new_async().await;
    let _home = create_html_mock(
        &mut server,
        "/",
        &create_test_html(
            "Home",
            r#"<a href="/report.pdf">PDF</a> <a href="/missing">Gone</a> <a href="/ok">OK</a>"#,
        ),
    );
    let _pdf = create_typed_mock(&mut server, "/report.pdf", "application/pdf", b"%PDF-1.4");
    let _missing = create_error_mock(&mut server, "/missing", 404);
    let _ok = create_html_mock(&mut server, "/ok", &create_test_html("OK", ""));

    let temp_dir = create_test_dir().unwrap();
    let config = create_test_config(temp_dir.path(), &site_root(&server));
    let mut fetcher = StaticFetcher::new(&config).unwrap();
    let progress = RecordingProgress::default();

    let pages = crawl_site(&config, &mut fetcher, &progress, &CancelFlag::new())
        .await
        .unwrap();

    let titles: Vec<&str> = pages.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Home", "OK"]);

    let skipped = progress.skipped.lock().unwrap();
    assert_eq!(skipped.len(), 2);
    assert!(
        skipped
            .iter()
            .any(|(url, reason)| url.ends_with("/report.pdf") && matches!(reason, SkipReason::NotHtml(_)))
    );
    assert!(
        skipped
            .iter()
            .any(|(url, reason)| url.ends_with("/missing") && matches!(reason, SkipReason::FetchFailed(_)))
    );
}

#[tokio::test]
async fn test_redirect_onto_seen_page_is_not_recorded_twice() {
    let mut server = Server::new_async().await;
    let home_url = site_root(&server);
    let _home = create_html_mock(
        &mut server,
        "/",
        &create_test_html("Home", r#"<a href="/old-home">Old</a>"#),
    );
    let _old = create_redirect_mock(&mut server, "/old-home", &home_url);

    let temp_dir = create_test_dir().unwrap();
    let config = create_test_config(temp_dir.path(), &home_url);
    let progress = RecordingProgress::default();

    let discovery = crawl_impl(&config, None, &progress, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(discovery.pages.len(), 1);
    let skipped = progress.skipped.lock().unwrap();
    assert!(matches!(skipped.as_slice(), [(_, SkipReason::Duplicate(_))]));
}

#[tokio::test]
async fn test_depth_and_page_limits() {
    let mut server = Server::new_async().await;
    let _home = create_html_mock(
        &mut server,
        "/",
        &create_test_html("Home", r#"<a href="/1">1</a><a href="/2">2</a><a href="/3">3</a>"#),
    );
    let _one = create_html_mock(&mut server, "/1", &create_test_html("One", r#"<a href="/1/x">x</a>"#));
    let _two = create_html_mock(&mut server, "/2", &create_test_html("Two", ""));
    let _three = create_html_mock(&mut server, "/3", &create_test_html("Three", ""));
    let _x = create_html_mock(&mut server, "/1/x", &create_test_html("X", ""));

    let temp_dir = create_test_dir().unwrap();

    let shallow = CrawlConfig::builder()
        .output_path(temp_dir.path().join("site.yaml"))
        .start_url(site_root(&server))
        .max_depth(1)
        .build()
        .unwrap();
    let pages = crawl_impl(&shallow, None, &NoOpProgress, &CancelFlag::new())
        .await
        .unwrap()
        .pages;
    assert_eq!(pages.len(), 4);
    assert!(pages.iter().all(|p| p.title != "X"));

    let capped = CrawlConfig::builder()
        .output_path(temp_dir.path().join("site.yaml"))
        .start_url(site_root(&server))
        .max_pages(2)
        .build()
        .unwrap();
    let pages = crawl_impl(&capped, None, &NoOpProgress, &CancelFlag::new())
        .await
        .unwrap()
        .pages;
    let titles: Vec<&str> = pages.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Home", "One"]);
}

#[tokio::test]
async fn test_cancelled_crawl_fetches_nothing() {
    let mut server = Server::new_async().await;
    let home = server.mock("GET", "/").expect(0).create_async().await;

    let temp_dir = create_test_dir().unwrap();
    let config = create_test_config(temp_dir.path(), &site_root(&server));
    let cancel = CancelFlag::new();
    cancel.cancel();

    let discovery = crawl_impl(&config, None, &NoOpProgress, &cancel).await.unwrap();
    assert!(discovery.pages.is_empty());
    home.assert_async().await;
}

#[tokio::test]
async fn test_page_listing_is_written_as_yaml() {
    let mut server = Server::new_async().await;
    let _home = create_html_mock(
        &mut server,
        "/",
        &create_test_html("Home & Garden", r#"<a href="/about">About</a>"#),
    );
    let _about = create_html_mock(&mut server, "/about", &create_test_html("About", ""));

    let temp_dir = create_test_dir().unwrap();
    let config = create_test_config(temp_dir.path(), &site_root(&server));
    let pages = crawl_impl(&config, None, &NoOpProgress, &CancelFlag::new())
        .await
        .unwrap()
        .pages;

    write_pages_yaml(config.output_path(), &pages).await.unwrap();

    let yaml = common::assert_file_exists_with_content(config.output_path())
        .await
        .unwrap();
    let parsed: Vec<Page> = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, pages);
    assert_eq!(parsed[0].title, "Home & Garden");
}

#[tokio::test]
async fn test_static_extraction_writes_one_file_per_target() {
    let mut server = Server::new_async().await;
    let _login = create_html_mock(
        &mut server,
        "/login",
        &create_test_html(
            "Sign in",
            r#"<form>
                 <input id="user" name="username" placeholder="Username">
                 <input id="pass" type="password" name="password">
                 <input type="hidden" name="csrf" value="x">
                 <button data-testid="submit">Log in</button>
               </form>"#,
        ),
    );
    let _rows = create_html_mock(
        &mut server,
        "/items",
        &create_test_html(
            "Items",
            r#"<table><tbody>
                 <tr><td>One</td><td><button>Edit</button></td></tr>
                 <tr><td>Two</td><td><button>Edit</button></td></tr>
                 <tr><td>Three</td><td><button>Edit</button></td></tr>
               </tbody></table>
               <textarea name="notes"></textarea>"#,
        ),
    );

    let temp_dir = create_test_dir().unwrap();
    let config = CrawlConfig::builder()
        .output_path(temp_dir.path().join("site.yaml"))
        .start_url(test_url(&server, "/login"))
        .extract_elements(true)
        .pages_dir(temp_dir.path().join("pages"))
        .build()
        .unwrap();

    let targets = vec![
        PageTarget::named(test_url(&server, "/login"), "Login Page"),
        PageTarget::new(test_url(&server, "/items")),
        PageTarget::new(test_url(&server, "/nowhere")),
    ];
    let discovery = crawl_impl(&config, Some(targets), &NoOpProgress, &CancelFlag::new())
        .await
        .unwrap();

    assert!(discovery.pages.is_empty());
    assert_eq!(
        discovery.element_files,
        [
            temp_dir.path().join("pages").join("Login Page.json"),
            temp_dir.path().join("pages").join("items.json"),
        ]
    );

    let login: PageElements =
        serde_json::from_str(&std::fs::read_to_string(&discovery.element_files[0]).unwrap())
            .unwrap();
    assert_eq!(login.title, "Sign in");
    let inputs: Vec<_> = login
        .elements
        .iter()
        .filter(|e| e.tag == ElementTag::Input)
        .collect();
    assert_eq!(inputs.len(), 2);
    assert!(login.elements.iter().any(|e| e.test_id == "submit"));

    let items: PageElements =
        serde_json::from_str(&std::fs::read_to_string(&discovery.element_files[1]).unwrap())
            .unwrap();
    let buttons = items
        .elements
        .iter()
        .filter(|e| e.tag == ElementTag::Button)
        .count();
    assert_eq!(buttons, 1);
    assert!(items.elements.iter().any(|e| e.tag == ElementTag::Textarea));
}

#[tokio::test]
async fn test_untitled_pages_get_distinct_fallback_names() {
    let mut server = Server::new_async().await;
    let _one = create_html_mock(&mut server, "/one", "<html><body><button>One</button></body></html>");
    let _two = create_html_mock(&mut server, "/two", "<html><body><button>Two</button></body></html>");

    let temp_dir = create_test_dir().unwrap();
    let pages_dir = temp_dir.path().join("pages");
    let config = CrawlConfig::builder()
        .output_path(temp_dir.path().join("site.yaml"))
        .start_url(test_url(&server, "/one"))
        .extract_elements(true)
        .pages_dir(&pages_dir)
        .build()
        .unwrap();

    let targets = vec![
        PageTarget::new(test_url(&server, "/one")),
        PageTarget::new(test_url(&server, "/two")),
    ];
    let discovery = crawl_impl(&config, Some(targets), &NoOpProgress, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(
        discovery.element_files,
        [pages_dir.join("untitled_page.json"), pages_dir.join("untitled_page_2.json")]
    );
}

#[tokio::test]
async fn test_body_is_cut_at_byte_cap() {
    let mut server = Server::new_async().await;
    let body = format!("<html><body>{}</body></html>", "x".repeat(300));
    let _big = create_html_mock(&mut server, "/big", &body);

    let temp_dir = create_test_dir().unwrap();
    let config = CrawlConfig::builder()
        .output_path(temp_dir.path().join("site.yaml"))
        .start_url(test_url(&server, "/big"))
        .max_bytes(100)
        .build()
        .unwrap();
    let mut fetcher = StaticFetcher::new(&config).unwrap();

    let result = fetcher.fetch(&test_url(&server, "/big")).await.unwrap();
    let FetchedContent::Html(html) = result.content else {
        panic!("static fetch returned live content");
    };
    assert_eq!(html.len(), 100);
    assert_eq!(html, body[..100]);
}

#[tokio::test]
async fn test_meta_charset_decodes_body_without_header_charset() {
    let mut server = Server::new_async().await;
    let body: &[u8] =
        b"<html><head><meta charset=\"iso-8859-1\"><title>Caf\xe9 cr\xe8me</title></head><body></body></html>";
    let _latin = create_typed_mock(&mut server, "/latin", "text/html", body);

    let temp_dir = create_test_dir().unwrap();
    let config = create_test_config(temp_dir.path(), &test_url(&server, "/latin"));
    let mut fetcher = StaticFetcher::new(&config).unwrap();

    let result = fetcher.fetch(&test_url(&server, "/latin")).await.unwrap();
    assert_eq!(result.content_type.as_deref(), Some("text/html"));
    assert_eq!(result.charset.as_deref(), Some("iso-8859-1"));
    let FetchedContent::Html(html) = result.content else {
        panic!("static fetch returned live content");
    };
    assert!(html.contains("<title>Café crème</title>"), "{html}");
}

#[tokio::test]
async fn test_page_urls_keep_the_spelling_of_the_link() {
    let mut server = Server::new_async().await;
    let _home = create_html_mock(
        &mut server,
        "/",
        &create_test_html("Home", r#"<a href="/用户/设置?q=a b">Settings</a>"#),
    );
    // The request line itself is percent-encoded on the wire
    let _settings = create_html_mock(
        &mut server,
        "/%E7%94%A8%E6%88%B7/%E8%AE%BE%E7%BD%AE?q=a%20b",
        &create_test_html("Settings", ""),
    );

    let temp_dir = create_test_dir().unwrap();
    let config = create_test_config(temp_dir.path(), &site_root(&server));
    let pages = crawl_impl(&config, None, &NoOpProgress, &CancelFlag::new())
        .await
        .unwrap()
        .pages;

    let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls, [site_root(&server), test_url(&server, "/用户/设置?q=a b")]);
    assert_eq!(pages[1].title, "Settings");
}

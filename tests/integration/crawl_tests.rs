//! Integration tests for complete discovery runs
//!
//! These tests use wiremock to create mock HTTP servers and drive the
//! coordinator end-to-end with the real HTTP fetcher and SQLite storage.

use std::path::Path;
use sumi_scout::config::{parse_config, Config};
use sumi_scout::crawler::Coordinator;
use sumi_scout::output::generate_markdown_summary;
use sumi_scout::state::StopReason;
use sumi_scout::storage::{RunStatus, SqliteStorage, Storage};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration seeded with `seed` and storing into `dir`
fn create_test_config(seed: &str, dir: &TempDir, extra: &str) -> Config {
    let toml = format!(
        r#"
[scheduler]
max-concurrent-crawls = 2
max-retries = 2

[run]
max-pages = 20
time-limit = 30
max-depth = 2
idle-wait-ms = 10

[user-agent]
crawler-name = "TestScout"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
database-path = "{db}"
summary-path = "{summary}"

[[seed]]
url = "{seed}"
anchor = "Company profile"
task = "integration"

{extra}
"#,
        db = dir.path().join("scout.db").display(),
        summary = dir.path().join("summary.md").display(),
        seed = seed,
        extra = extra,
    );
    parse_config(&toml).expect("Test config should be valid")
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

async fn mount_robots(server: &MockServer, content: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(content))
        .mount(server)
        .await;
}

async fn requests_to(server: &MockServer, target: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == target)
        .count()
}

#[tokio::test]
async fn test_full_run_discovers_linked_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><head><title>Acme Corporation</title></head><body>
            <a href="{0}/about/company-profile">Company profile</a>
            <a href="{0}/contact-us">Contact us by email or phone</a>
            <a href="{0}/login">Sign in</a>
            </body></html>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about/company-profile"))
        .respond_with(html(
            r#"<html><head><title>About Acme</title></head><body>
            <h1 class="company-name">Acme Corporation</h1>
            <p>Founded in 1990.</p></body></html>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contact-us"))
        .respond_with(html(
            r#"<html><head><title>Contact Acme</title></head><body>
            <footer class="contact">Email info@acme.com or call (555) 123-4567</footer>
            </body></html>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", base_url), &dir, "");
    let db_path = config.output.database_path.clone();

    let mut coordinator =
        Coordinator::new(config, "test-hash".to_string()).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Run failed");

    assert_eq!(summary.stop_reason, StopReason::QueueExhausted);
    assert_eq!(summary.pages_crawled, 3);
    assert_eq!(summary.pages_failed, 0);

    // The irrelevant link is classified but never dispatched
    assert_eq!(requests_to(&mock_server, "/login").await, 0);
    assert_eq!(requests_to(&mock_server, "/").await, 1);

    let graph = coordinator.graph();
    let graph = graph.read();
    let about = graph
        .node(&format!("{}/about/company-profile", base_url))
        .expect("Linked page should be in the graph");
    assert!(about.crawled);

    // The run is recorded in the database
    let storage = SqliteStorage::new(Path::new(&db_path)).expect("Failed to open DB");
    let run = storage
        .get_latest_run()
        .expect("Failed to read runs")
        .expect("Run should be recorded");
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.totals.pages_crawled, 3);
    assert_eq!(run.totals.stop_reason.as_deref(), Some("queue_exhausted"));
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_robots(&mock_server, "User-agent: *\nDisallow: /private").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><body>
            <a href="{0}/about/company-profile">Company profile</a>
            <a href="{0}/private/company-profile">Company profile archive</a>
            </body></html>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about/company-profile"))
        .respond_with(html("<html><body>About us</body></html>".to_string()))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", base_url), &dir, "");

    let mut coordinator = Coordinator::new(config, "hash".to_string()).unwrap();
    let summary = coordinator.run().await.expect("Run failed");

    assert_eq!(
        requests_to(&mock_server, "/private/company-profile").await,
        0,
        "Disallowed page must not be requested"
    );
    assert_eq!(summary.pages_crawled, 2);
    assert_eq!(summary.pages_failed, 1);

    // Robots denials are not retried
    assert_eq!(coordinator.scheduler().stats().retried, 0);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/flaky", base_url), &dir, "");

    let mut coordinator = Coordinator::new(config, "hash".to_string()).unwrap();
    let summary = coordinator.run().await.expect("Run failed");

    // Initial attempt plus max-retries = 2
    assert_eq!(requests_to(&mock_server, "/flaky").await, 3);
    assert_eq!(summary.pages_crawled, 0);
    assert_eq!(summary.pages_failed, 1);

    let failed = coordinator.scheduler().failed_requests();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].error, "HTTP 503");
}

#[tokio::test]
async fn test_non_html_content_is_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "application/pdf"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/report.pdf", base_url), &dir, "");

    let mut coordinator = Coordinator::new(config, "hash".to_string()).unwrap();
    let summary = coordinator.run().await.expect("Run failed");

    assert_eq!(requests_to(&mock_server, "/report.pdf").await, 1);
    assert_eq!(summary.pages_failed, 1);
}

#[tokio::test]
async fn test_page_budget_stops_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    let links: String = (0..10)
        .map(|i| {
            format!(
                r#"<a href="{}/about/company-profile-{}">Company profile {}</a>"#,
                base_url, i, i
            )
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!("<html><body>{}</body></html>", links)))
        .mount(&mock_server)
        .await;

    // Every other page is a leaf
    Mock::given(method("GET"))
        .respond_with(html("<html><body>Profile</body></html>".to_string()))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&format!("{}/", base_url), &dir, "");
    config.run.max_pages = 4;

    let mut coordinator = Coordinator::new(config, "hash".to_string()).unwrap();
    let summary = coordinator.run().await.expect("Run failed");

    assert_eq!(summary.stop_reason, StopReason::MaxPages);
    assert_eq!(summary.pages_crawled, 4);
    assert!(coordinator.scheduler().queued_len() > 0);
}

#[tokio::test]
async fn test_runs_accumulate_in_database() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<html><body>Home</body></html>".to_string()))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    for _ in 0..2 {
        let config = create_test_config(&format!("{}/", base_url), &dir, "");
        let mut coordinator = Coordinator::new(config, "hash".to_string()).unwrap();
        coordinator.run().await.expect("Run failed");
    }

    let storage = SqliteStorage::new(&dir.path().join("scout.db")).unwrap();
    let latest = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(latest.id, 2);
    assert_eq!(storage.get_run(1).unwrap().status, RunStatus::Completed);
}

#[tokio::test]
async fn test_excluded_domains_are_not_fetched() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
            <a href="https://partners.example.org/about/company-profile">Company profile</a>
            </body></html>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &format!("{}/", base_url),
        &dir,
        "[[exclude]]\ndomain = \"*.example.org\"\n",
    );

    let mut coordinator = Coordinator::new(config, "hash".to_string()).unwrap();
    let summary = coordinator.run().await.expect("Run failed");

    assert_eq!(summary.pages_crawled, 1);
    assert_eq!(summary.links_admitted, 1);
    assert!(!coordinator
        .scheduler()
        .is_queued("https://partners.example.org/about/company-profile"));
}

#[tokio::test]
async fn test_summary_report_written() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            "<html><head><title>Home</title></head><body>Home</body></html>".to_string(),
        ))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", base_url), &dir, "");
    let summary_path = dir.path().join("summary.md");

    let mut coordinator = Coordinator::new(config, "hash".to_string()).unwrap();
    let summary = coordinator.run().await.expect("Run failed");

    generate_markdown_summary(&summary, &summary_path).expect("Failed to write summary");

    let report = std::fs::read_to_string(&summary_path).unwrap();
    assert!(report.contains("# Sumi-Scout Run Summary"));
    assert!(report.contains("- **Pages Crawled**: 1"));
}

//! Integration tests for policy resolution
//!
//! These tests use wiremock to stand in for the fetch executor and exercise
//! the resolver end-to-end over HTTP.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use robots_policy::config::{parse_config, Config};
use robots_policy::{crawl_delay, is_allowed, FetchError, PolicyError, PolicyResolver, DEFAULT_AGENT};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXAMPLE_ROBOTS: &str = "User-agent: DataflowKitBot\nDisallow: /private\nCrawl-delay: 5";

/// Creates a test configuration pointing at the mock executor
fn create_test_config(server: &MockServer, cache: bool) -> Config {
    let toml = format!(
        "[fetcher]\naddress = \"{}\"\n\n[cache]\nenabled = {}\n",
        server.address(),
        cache
    );
    parse_config(&toml).expect("Failed to parse test config")
}

/// Builds the executor's response envelope for a robots.txt retrieval
fn envelope(status: u16, body: &str) -> Value {
    json!({
        "StatusCode": status,
        "HTML": STANDARD.encode(body),
        "Headers": {"Content-Type": ["text/plain"]},
    })
}

/// Mounts an executor response for one robots.txt URL
async fn mount_robots(server: &MockServer, robots_url: &str, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path("/response/base"))
        .and(body_json(json!({"URL": robots_url, "Method": "GET"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(status, body)))
        .mount(server)
        .await;
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_example_robots_decisions() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/response/base"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"URL": "https://example.com/robots.txt", "Method": "GET"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(200, EXAMPLE_ROBOTS)))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = PolicyResolver::from_config(&create_test_config(&server, true))
        .expect("Failed to build resolver");
    let policy = resolver
        .resolve("https://example.com/private/page?x=1#frag")
        .await
        .expect("Resolve failed");

    assert!(!is_allowed("https://example.com/private/page", Some(&*policy), DEFAULT_AGENT).unwrap());
    assert!(is_allowed("https://example.com/public", Some(&*policy), DEFAULT_AGENT).unwrap());
    assert_eq!(crawl_delay(Some(&*policy), DEFAULT_AGENT), Duration::from_secs(5));
}

#[tokio::test]
async fn test_client_errors_are_full_allow() {
    let server = MockServer::start().await;
    let sites = [
        (401, "https://unauthorized.test"),
        (403, "https://forbidden.test"),
        (404, "https://missing.test"),
    ];

    for (status, site) in sites {
        mount_robots(
            &server,
            &format!("{}/robots.txt", site),
            status,
            "User-agent: *\nDisallow: /",
        )
        .await;
    }

    let resolver = PolicyResolver::from_config(&create_test_config(&server, false)).unwrap();

    for (status, site) in sites {
        let policy = resolver.resolve(site).await.unwrap();
        for page in ["/", "/admin", "/private/page", "/a?b=c"] {
            let url = format!("{}{}", site, page);
            assert!(
                is_allowed(&url, Some(&*policy), DEFAULT_AGENT).unwrap(),
                "HTTP {} should allow {}",
                status,
                url
            );
        }
    }
}

#[tokio::test]
async fn test_server_errors_are_full_disallow() {
    let server = MockServer::start().await;
    let sites = [
        (500, "https://broken.test"),
        (503, "https://unavailable.test"),
        (599, "https://odd.test"),
    ];

    for (status, site) in sites {
        mount_robots(
            &server,
            &format!("{}/robots.txt", site),
            status,
            "User-agent: *\nAllow: /",
        )
        .await;
    }

    let resolver = PolicyResolver::from_config(&create_test_config(&server, false)).unwrap();

    for (status, site) in sites {
        let policy = resolver.resolve(site).await.unwrap();
        for page in ["/", "/public", "/robots-free-zone"] {
            let url = format!("{}{}", site, page);
            assert!(
                !is_allowed(&url, Some(&*policy), DEFAULT_AGENT).unwrap(),
                "HTTP {} should disallow {}",
                status,
                url
            );
        }
    }
}

#[tokio::test]
async fn test_malformed_url_makes_no_request() {
    let server = MockServer::start().await;
    let resolver = PolicyResolver::from_config(&create_test_config(&server, true)).unwrap();

    for url in ["not a url", "example.com/page", "mailto:bot@example.com"] {
        let result = resolver.resolve(url).await;
        assert!(
            matches!(result, Err(PolicyError::MalformedUrl { .. })),
            "url {:?}",
            url
        );
    }

    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_executor_error_is_retrieval_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/response/base"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let resolver = PolicyResolver::from_config(&create_test_config(&server, true)).unwrap();
    let result = resolver.resolve("https://example.com/").await;

    match result {
        Err(PolicyError::RetrievalFailed { url, source }) => {
            assert_eq!(url, "https://example.com/robots.txt");
            assert!(matches!(source, FetchError::Status(502)));
        }
        other => panic!("expected RetrievalFailed, got {:?}", other),
    }

    // Failures are not cached; the next resolve asks again
    let _ = resolver.resolve("https://example.com/").await;
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_garbage_envelope_is_retrieval_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/response/base"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let resolver = PolicyResolver::from_config(&create_test_config(&server, false)).unwrap();
    let result = resolver.resolve("https://example.com/").await;

    assert!(matches!(
        result,
        Err(PolicyError::RetrievalFailed {
            source: FetchError::Decode(_),
            ..
        })
    ));
}

#[tokio::test]
async fn test_unreachable_executor_is_retrieval_failure() {
    let config = parse_config("[fetcher]\naddress = \"127.0.0.1:1\"\n").unwrap();
    let resolver = PolicyResolver::from_config(&config).unwrap();

    let result = resolver.resolve("https://example.com/").await;
    assert!(matches!(
        result,
        Err(PolicyError::RetrievalFailed {
            source: FetchError::Transport(_),
            ..
        })
    ));
}

#[tokio::test]
async fn test_repeated_resolution_is_idempotent() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        "https://example.com/robots.txt",
        200,
        "User-agent: *\nDisallow: /admin\nAllow: /admin/public\n\nUser-agent: DataflowKitBot\nDisallow: /private",
    )
    .await;

    let resolver = PolicyResolver::from_config(&create_test_config(&server, false)).unwrap();
    let first = resolver.resolve("https://example.com/").await.unwrap();
    let second = resolver.resolve("https://example.com/").await.unwrap();

    assert_eq!(request_count(&server).await, 2);
    for page in ["/", "/admin", "/admin/public", "/private", "/private/x", "/other"] {
        let url = format!("https://example.com{}", page);
        assert_eq!(
            is_allowed(&url, Some(&*first), DEFAULT_AGENT).unwrap(),
            is_allowed(&url, Some(&*second), DEFAULT_AGENT).unwrap(),
            "decisions differ for {}",
            url
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolves_share_one_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/response/base"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(200, EXAMPLE_ROBOTS))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resolver =
        Arc::new(PolicyResolver::from_config(&create_test_config(&server, true)).unwrap());

    let mut handles = Vec::new();
    for i in 0..12 {
        let resolver = Arc::clone(&resolver);
        handles.push(tokio::spawn(async move {
            resolver
                .resolve(&format!("https://example.com/page/{}", i))
                .await
        }));
    }

    for handle in handles {
        let policy = handle.await.unwrap().expect("Resolve failed");
        assert_eq!(crawl_delay(Some(&*policy), DEFAULT_AGENT), Duration::from_secs(5));
    }

    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_deadline_bounds_slow_executor() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/response/base"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(200, ""))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let resolver = PolicyResolver::from_config(&create_test_config(&server, true)).unwrap();
    let result = resolver
        .resolve_within("https://example.com/", Duration::from_millis(100))
        .await;

    assert!(matches!(result, Err(PolicyError::DeadlineExceeded { .. })));
    assert!(resolver.cache().unwrap().is_empty());
}

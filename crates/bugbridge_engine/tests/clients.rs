use std::sync::{Arc, Once};

use bugbridge_core::{Bug, TrackerConfig};
use bugbridge_engine::{
    BugzillaClient, CacheState, FailureKind, FetchSettings, Fetcher, ReqwestFetcher, SentryClient,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(bridge_logging::initialize_for_tests);
}

fn setup(server: &MockServer) -> (Arc<TrackerConfig>, Arc<dyn Fetcher>) {
    let config = TrackerConfig {
        sentry_base: server.uri(),
        bugzilla_base: format!("{}/bz", server.uri()),
        ..TrackerConfig::default()
    };
    let fetcher = ReqwestFetcher::new(FetchSettings::default()).expect("client builds");
    (Arc::new(config), Arc::new(fetcher))
}

const EVENTS: &str = "/operations/nightly-js-errors/issues/123/events";

#[tokio::test]
async fn issue_is_fetched_once_then_served_from_cache() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/0/issues/123/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "123", "title": "Crash"})))
        .expect(1)
        .mount(&server)
        .await;

    let (config, fetcher) = setup(&server);
    let sentry = SentryClient::new(config, fetcher);
    assert_eq!(sentry.issue_state("123"), CacheState::Absent);

    let first = sentry.get_issue("123").await.expect("issue loads");
    let second = sentry.get_issue("123").await.expect("issue cached");
    assert_eq!(first.title, "Crash");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(sentry.issue_state("123"), CacheState::Ready);
}

#[tokio::test]
async fn failed_issue_fetch_is_retried_on_next_call() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/0/issues/123/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/0/issues/123/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "Crash"})))
        .expect(1)
        .mount(&server)
        .await;

    let (config, fetcher) = setup(&server);
    let sentry = SentryClient::new(config, fetcher);

    assert!(sentry.get_issue("123").await.is_none());
    assert_eq!(
        sentry.issue_state("123"),
        CacheState::Failed(FailureKind::HttpStatus(503))
    );

    let issue = sentry.get_issue("123").await.expect("retry succeeds");
    assert_eq!(issue.title, "Crash");
    assert_eq!(sentry.issue_state("123"), CacheState::Ready);
}

#[tokio::test]
async fn events_are_cached_per_issue_and_event() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{EVENTS}/latest/json/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "latest"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{EVENTS}/456/json/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "pinned"})))
        .expect(1)
        .mount(&server)
        .await;

    let (config, fetcher) = setup(&server);
    let sentry = SentryClient::new(config, fetcher);

    for _ in 0..2 {
        let latest = sentry.get_event("123", None).await.unwrap();
        let pinned = sentry.get_event("123", Some("456")).await.unwrap();
        assert_eq!(latest.message, "latest");
        assert_eq!(pinned.message, "pinned");
    }
    assert_eq!(sentry.event_state("123", None), CacheState::Ready);
    assert_eq!(sentry.event_state("123", Some("456")), CacheState::Ready);
    assert_eq!(sentry.event_state("123", Some("789")), CacheState::Absent);
}

#[tokio::test]
async fn bug_list_is_refreshed_on_every_lookup() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bz/rest/bug"))
        .and(query_param("whiteboard", "[nightly-js-sentry:123]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bugs": []})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bz/rest/bug"))
        .and(query_param("whiteboard", "[nightly-js-sentry:123]"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"bugs": [{"id": 42, "summary": "Crash"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (config, fetcher) = setup(&server);
    let bugzilla = BugzillaClient::new(config, fetcher);

    assert!(bugzilla.get_bugs_for_issue("123").await.is_empty());
    assert_eq!(bugzilla.get_bugs_for_issue("123").await, vec![Bug { id: 42 }]);
    assert_eq!(bugzilla.cached_bugs("123"), Some(vec![Bug { id: 42 }]));
}

#[tokio::test]
async fn failed_bug_search_reads_as_no_bugs() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bz/rest/bug"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (config, fetcher) = setup(&server);
    let bugzilla = BugzillaClient::new(config, fetcher);

    assert!(bugzilla.get_bugs_for_issue("123").await.is_empty());
    assert_eq!(
        bugzilla.bug_list_state("123"),
        CacheState::Failed(FailureKind::HttpStatus(500))
    );
    assert_eq!(bugzilla.cached_bugs("123"), None);
}

#[tokio::test]
async fn bugzilla_links_use_configured_base() {
    init_logging();
    let server = MockServer::start().await;
    let (config, fetcher) = setup(&server);
    let bugzilla = BugzillaClient::new(config, fetcher);

    assert_eq!(
        bugzilla.bug_url(42),
        format!("{}/bz/show_bug.cgi?id=42", server.uri())
    );
    assert_eq!(
        bugzilla.search_url(&[("status_whiteboard", "[nightly-js-sentry:1]")]),
        format!(
            "{}/bz/buglist.cgi?status_whiteboard=%5Bnightly-js-sentry%3A1%5D",
            server.uri()
        )
    );
}

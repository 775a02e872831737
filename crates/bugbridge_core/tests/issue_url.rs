use std::sync::Once;

use bugbridge_core::{IssueRef, IssueUrlPattern, TrackerConfig, LATEST_EVENT};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(bridge_logging::initialize_for_tests);
}

fn pattern() -> IssueUrlPattern {
    IssueUrlPattern::new(&TrackerConfig::default()).expect("default pattern")
}

const ISSUES: &str = "https://sentry.prod.mozaws.net/operations/nightly-js-errors/issues";

#[test]
fn parses_issue_without_event() {
    init_logging();
    let parsed = pattern().parse(&format!("{ISSUES}/123/"));
    assert_eq!(parsed, Some(IssueRef::new("123", None)));
    assert_eq!(parsed.unwrap().event_key(), LATEST_EVENT);
}

#[test]
fn parses_explicit_event() {
    init_logging();
    let parsed = pattern().parse(&format!("{ISSUES}/123/events/456/")).unwrap();
    assert_eq!(parsed.issue_id, "123");
    assert_eq!(parsed.event_id.as_deref(), Some("456"));
    assert_eq!(parsed.event_key(), "456");
}

#[test]
fn ignores_trailing_path_query_and_fragment() {
    init_logging();
    let pattern = pattern();
    assert_eq!(
        pattern.parse(&format!("{ISSUES}/123/events/456/?environment=nightly#frame")),
        Some(IssueRef::new("123", Some("456".to_string())))
    );
    assert_eq!(
        pattern.parse(&format!("{ISSUES}/77/activity/")),
        Some(IssueRef::new("77", None))
    );
}

#[test]
fn non_numeric_event_falls_back_to_latest() {
    init_logging();
    let parsed = pattern().parse(&format!("{ISSUES}/123/events/latest/")).unwrap();
    assert_eq!(parsed, IssueRef::new("123", None));
}

#[test]
fn rejects_non_issue_urls() {
    init_logging();
    let pattern = pattern();
    let rejected = [
        format!("{ISSUES}/123"),
        format!("{ISSUES}/abc/"),
        format!("{ISSUES}/"),
        "http://sentry.prod.mozaws.net/operations/nightly-js-errors/issues/1/".to_string(),
        "https://sentryxprod.mozaws.net/operations/nightly-js-errors/issues/1/".to_string(),
        "https://sentry.prod.mozaws.net/operations/other-project/issues/1/".to_string(),
        format!("https://example.com/?next={ISSUES}/1/"),
        String::new(),
    ];
    for url in rejected {
        assert_eq!(pattern.parse(&url), None, "{url} should not match");
    }
}

#[test]
fn pattern_follows_configured_base() {
    init_logging();
    let config = TrackerConfig {
        sentry_base: "http://127.0.0.1:9000/".to_string(),
        sentry_org: "acme".to_string(),
        sentry_project: "web".to_string(),
        ..TrackerConfig::default()
    };
    let pattern = IssueUrlPattern::new(&config).unwrap();
    assert_eq!(
        pattern.parse("http://127.0.0.1:9000/acme/web/issues/9/events/10/"),
        Some(IssueRef::new("9", Some("10".to_string())))
    );
    assert_eq!(pattern.parse(&format!("{ISSUES}/9/")), None);
}

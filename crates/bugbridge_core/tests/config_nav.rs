use bugbridge_core::{
    bug_url, search_url, whiteboard_tags, ConfigError, NavigationFilter, PageMessage,
    TrackerConfig,
};

#[test]
fn endpoints_follow_default_deployment() {
    let config = TrackerConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(
        config.issue_api_url("123"),
        "https://sentry.prod.mozaws.net/api/0/issues/123/"
    );
    assert_eq!(
        config.event_api_url("123", "latest"),
        "https://sentry.prod.mozaws.net/operations/nightly-js-errors/issues/123/events/latest/json/"
    );
    assert_eq!(
        config.bug_search_api_url("123"),
        "https://bugzilla.mozilla.org/rest/bug?whiteboard=%5Bnightly-js-sentry%3A123%5D"
    );
}

#[test]
fn trailing_slashes_on_bases_are_ignored() {
    let config = TrackerConfig {
        sentry_base: "https://sentry.example.com/".to_string(),
        bugzilla_base: "https://bz.example.com/".to_string(),
        ..TrackerConfig::default()
    };
    assert_eq!(
        config.issue_page_url("1"),
        "https://sentry.example.com/operations/nightly-js-errors/issues/1/"
    );
    assert_eq!(bug_url(&config, 3), "https://bz.example.com/show_bug.cgi?id=3");
}

#[test]
fn partial_config_keeps_defaults() {
    let config: TrackerConfig = serde_json::from_str(r#"{"product": "Core"}"#).unwrap();
    assert_eq!(config.product, "Core");
    assert_eq!(config.component, "General");
    assert_eq!(config.version, "Trunk");
}

#[test]
fn invalid_bases_are_reported() {
    let config = TrackerConfig {
        bugzilla_base: "not a url".to_string(),
        ..TrackerConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidUrl {
            field: "bugzilla_base",
            ..
        })
    ));

    let config = TrackerConfig {
        sentry_base: "data:text/plain,hello".to_string(),
        ..TrackerConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingHost {
            field: "sentry_base",
            ..
        })
    ));
}

#[test]
fn search_url_encodes_arbitrary_params() {
    let config = TrackerConfig::default();
    assert_eq!(
        search_url(&config, &[("status_whiteboard", "[a:b]"), ("resolution", "---")]),
        "https://bugzilla.mozilla.org/buglist.cgi?status_whiteboard=%5Ba%3Ab%5D&resolution=---"
    );
    assert_eq!(whiteboard_tags([("a", "1"), ("b", "2")]), "[a:1][b:2]");
}

#[test]
fn navigation_filter_matches_issue_pages_only() {
    let filter = NavigationFilter::from_config(&TrackerConfig::default()).unwrap();
    assert_eq!(filter.host_equals, "sentry.prod.mozaws.net");
    assert_eq!(filter.path_prefix, "/operations/nightly-js-errors/issues/");

    assert!(filter.matches("https://sentry.prod.mozaws.net/operations/nightly-js-errors/issues/5/"));
    assert!(filter.matches(
        "https://SENTRY.prod.mozaws.net:8443/operations/nightly-js-errors/issues/5/events/6/"
    ));
    assert!(!filter.matches("http://sentry.prod.mozaws.net/operations/nightly-js-errors/issues/5/"));
    assert!(!filter.matches("https://sentry.prod.mozaws.net/operations/nightly-js-errors/"));
    assert!(!filter.matches("https://example.com/operations/nightly-js-errors/issues/5/"));
    assert!(!filter.matches("not a url"));
}

#[test]
fn page_message_wire_form() {
    assert_eq!(
        PageMessage::PageChanged.to_json().unwrap(),
        r#"{"event":"pageChange"}"#
    );
    assert_eq!(
        PageMessage::from_json(r#"{"event":"pageChange","url":"https://x/"}"#).unwrap(),
        PageMessage::PageChanged
    );
    assert!(PageMessage::from_json(r#"{"event":"tabClosed"}"#).is_err());
    assert!(PageMessage::from_json(r#"{}"#).is_err());
}

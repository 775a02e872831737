use regex::Regex;

use crate::config::{ConfigError, TrackerConfig};

/// Event key used when the page URL names no explicit event.
pub const LATEST_EVENT: &str = "latest";

/// A specific error report, or the latest occurrence of an issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueRef {
    pub issue_id: String,
    /// `None` means the page showed the issue without pinning an event.
    pub event_id: Option<String>,
}

impl IssueRef {
    pub fn new(issue_id: impl Into<String>, event_id: Option<String>) -> Self {
        Self {
            issue_id: issue_id.into(),
            event_id,
        }
    }

    pub fn event_key(&self) -> &str {
        self.event_id.as_deref().unwrap_or(LATEST_EVENT)
    }
}

/// Matches Sentry issue page URLs of the form
/// `{base}/{org}/{project}/issues/{id}/[events/{id}/]...`.
///
/// The match is anchored at the start only; anything after the recognised
/// prefix (further path segments, query, fragment) is ignored.
#[derive(Debug, Clone)]
pub struct IssueUrlPattern {
    regex: Regex,
}

impl IssueUrlPattern {
    pub fn new(config: &TrackerConfig) -> Result<Self, ConfigError> {
        let pattern = format!(
            r"^{}{}([0-9]+)/(?:events/([0-9]+)/)?",
            regex::escape(config.sentry_base()),
            regex::escape(&config.issues_path()),
        );
        let regex = Regex::new(&pattern).map_err(|err| ConfigError::Pattern(err.to_string()))?;
        Ok(Self { regex })
    }

    pub fn parse(&self, href: &str) -> Option<IssueRef> {
        let captures = self.regex.captures(href)?;
        let issue_id = captures.get(1)?.as_str();
        let event_id = captures.get(2).map(|m| m.as_str().to_string());
        Some(IssueRef::new(issue_id, event_id))
    }
}

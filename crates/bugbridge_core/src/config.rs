use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::synth::{encode_query, whiteboard_tag};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {field} url {value:?}: {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("{field} url {value:?} has no host")]
    MissingHost { field: &'static str, value: String },
    #[error("issue url pattern: {0}")]
    Pattern(String),
}

/// Where the two trackers live and how filed bugs are categorised.
///
/// Every field has a default matching the production deployment, so a config
/// file only needs to list what it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub sentry_base: String,
    pub sentry_org: String,
    pub sentry_project: String,
    pub bugzilla_base: String,
    pub product: String,
    pub component: String,
    pub version: String,
    pub whiteboard_key: String,
    pub button_icon: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sentry_base: "https://sentry.prod.mozaws.net".to_string(),
            sentry_org: "operations".to_string(),
            sentry_project: "nightly-js-errors".to_string(),
            bugzilla_base: "https://bugzilla.mozilla.org".to_string(),
            product: "Firefox".to_string(),
            component: "General".to_string(),
            version: "Trunk".to_string(),
            whiteboard_key: "nightly-js-sentry".to_string(),
            button_icon: "bugzilla.png".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Check that both base URLs parse and carry a host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_base("sentry_base", &self.sentry_base)?;
        parse_base("bugzilla_base", &self.bugzilla_base)?;
        Ok(())
    }

    pub fn sentry_base(&self) -> &str {
        self.sentry_base.trim_end_matches('/')
    }

    pub fn bugzilla_base(&self) -> &str {
        self.bugzilla_base.trim_end_matches('/')
    }

    /// Path prefix shared by every issue page, e.g. `/operations/nightly-js-errors/issues/`.
    pub fn issues_path(&self) -> String {
        format!("/{}/{}/issues/", self.sentry_org, self.sentry_project)
    }

    /// Human-facing issue page, always ending in `/`.
    pub fn issue_page_url(&self, issue_id: &str) -> String {
        format!("{}{}{issue_id}/", self.sentry_base(), self.issues_path())
    }

    pub fn issue_api_url(&self, issue_id: &str) -> String {
        format!("{}/api/0/issues/{issue_id}/", self.sentry_base())
    }

    pub fn event_api_url(&self, issue_id: &str, event_key: &str) -> String {
        format!("{}events/{event_key}/json/", self.issue_page_url(issue_id))
    }

    /// Bugzilla REST search for bugs carrying this issue's whiteboard tag.
    pub fn bug_search_api_url(&self, issue_id: &str) -> String {
        let tag = whiteboard_tag(self, issue_id);
        format!(
            "{}/rest/bug?{}",
            self.bugzilla_base(),
            encode_query(&[("whiteboard", tag.as_str())])
        )
    }
}

pub(crate) fn parse_base(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|err| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        reason: err.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(ConfigError::MissingHost {
            field,
            value: value.to_string(),
        });
    }
    Ok(url)
}

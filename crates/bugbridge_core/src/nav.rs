use url::Url;

use crate::config::{parse_base, ConfigError};
use crate::TrackerConfig;

/// URL filter for history-state navigations worth relaying to a page.
///
/// Mirrors the browser's navigation event filter: scheme must be one of
/// `schemes`, host must equal `host_equals` (case-insensitive, port ignored)
/// and the path must start with `path_prefix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationFilter {
    pub schemes: Vec<String>,
    pub host_equals: String,
    pub path_prefix: String,
}

impl NavigationFilter {
    /// Filter covering every issue page under the configured Sentry project.
    pub fn from_config(config: &TrackerConfig) -> Result<Self, ConfigError> {
        let base = parse_base("sentry_base", config.sentry_base())?;
        let host = base.host_str().ok_or_else(|| ConfigError::MissingHost {
            field: "sentry_base",
            value: config.sentry_base.clone(),
        })?;
        Ok(Self {
            schemes: vec![base.scheme().to_string()],
            host_equals: host.to_string(),
            path_prefix: config.issues_path(),
        })
    }

    pub fn matches(&self, url: &str) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };
        let scheme_ok = self.schemes.iter().any(|s| s.eq_ignore_ascii_case(url.scheme()));
        let host_ok = url
            .host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(&self.host_equals));
        scheme_ok && host_ok && url.path().starts_with(&self.path_prefix)
    }
}

use std::sync::Arc;

use bridge_logging::bridge_warn;
use bugbridge_core::{Event, Issue, TrackerConfig, LATEST_EVENT};

use crate::cache::{CacheState, ReadThroughCache};
use crate::fetch::{fetch_json, Fetcher};
use crate::FetchError;

/// Read-through client for Sentry issue and event payloads.
///
/// Issues are keyed by id, events by `issue_id:event_key`. Both live for the
/// lifetime of the page and are never invalidated.
pub struct SentryClient {
    config: Arc<TrackerConfig>,
    fetcher: Arc<dyn Fetcher>,
    issues: ReadThroughCache<Issue>,
    events: ReadThroughCache<Event>,
}

impl SentryClient {
    pub fn new(config: Arc<TrackerConfig>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            fetcher,
            issues: ReadThroughCache::new("sentry issue"),
            events: ReadThroughCache::new("sentry event"),
        }
    }

    pub async fn fetch_issue(&self, issue_id: &str) -> Result<Arc<Issue>, FetchError> {
        let url = self.config.issue_api_url(issue_id);
        self.issues
            .get_or_fetch(issue_id, || fetch_json(self.fetcher.as_ref(), &url))
            .await
    }

    /// Issue payload, or `None` after logging when it could not be loaded.
    pub async fn get_issue(&self, issue_id: &str) -> Option<Arc<Issue>> {
        match self.fetch_issue(issue_id).await {
            Ok(issue) => Some(issue),
            Err(err) => {
                bridge_warn!("Failed to load Sentry issue {}: {}", issue_id, err);
                None
            }
        }
    }

    pub async fn fetch_event(
        &self,
        issue_id: &str,
        event_id: Option<&str>,
    ) -> Result<Arc<Event>, FetchError> {
        let event_key = event_id.unwrap_or(LATEST_EVENT);
        let url = self.config.event_api_url(issue_id, event_key);
        self.events
            .get_or_fetch(&event_cache_key(issue_id, event_key), || {
                fetch_json(self.fetcher.as_ref(), &url)
            })
            .await
    }

    /// Event payload (`None` event id means latest), or `None` after logging
    /// when it could not be loaded.
    pub async fn get_event(&self, issue_id: &str, event_id: Option<&str>) -> Option<Arc<Event>> {
        match self.fetch_event(issue_id, event_id).await {
            Ok(event) => Some(event),
            Err(err) => {
                bridge_warn!(
                    "Failed to load Sentry event {}:{}: {}",
                    issue_id,
                    event_id.unwrap_or(LATEST_EVENT),
                    err
                );
                None
            }
        }
    }

    pub fn issue_state(&self, issue_id: &str) -> CacheState {
        self.issues.state(issue_id)
    }

    pub fn event_state(&self, issue_id: &str, event_id: Option<&str>) -> CacheState {
        self.events
            .state(&event_cache_key(issue_id, event_id.unwrap_or(LATEST_EVENT)))
    }
}

fn event_cache_key(issue_id: &str, event_key: &str) -> String {
    format!("{issue_id}:{event_key}")
}

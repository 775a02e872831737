use std::sync::Arc;

use bridge_logging::{bridge_debug, bridge_warn};
use bugbridge_core::{bug_url, search_url, Bug, BugList, TrackerConfig};

use crate::cache::{CacheState, ReadThroughCache};
use crate::fetch::{fetch_json, Fetcher};
use crate::FetchError;

/// Bugzilla client: whiteboard-tag bug lookups plus the view/search links.
///
/// Bug lists are re-fetched on every lookup since bugs can be filed without
/// the Sentry page navigating; the stored list only records the last answer.
pub struct BugzillaClient {
    config: Arc<TrackerConfig>,
    fetcher: Arc<dyn Fetcher>,
    bug_lists: ReadThroughCache<Vec<Bug>>,
}

impl BugzillaClient {
    pub fn new(config: Arc<TrackerConfig>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            fetcher,
            bug_lists: ReadThroughCache::new("bugzilla bug list"),
        }
    }

    pub async fn fetch_bugs_for_issue(&self, issue_id: &str) -> Result<Arc<Vec<Bug>>, FetchError> {
        let url = self.config.bug_search_api_url(issue_id);
        self.bug_lists
            .refresh(issue_id, || async {
                fetch_json::<BugList>(self.fetcher.as_ref(), &url)
                    .await
                    .map(|list| list.bugs)
            })
            .await
    }

    /// Bugs tagged for `issue_id`. A failed lookup reads as no bugs.
    pub async fn get_bugs_for_issue(&self, issue_id: &str) -> Vec<Bug> {
        match self.fetch_bugs_for_issue(issue_id).await {
            Ok(bugs) => {
                bridge_debug!("Issue {} has {} tagged bug(s)", issue_id, bugs.len());
                bugs.as_ref().clone()
            }
            Err(err) => {
                bridge_warn!("Failed to search bugs for issue {}: {}", issue_id, err);
                Vec::new()
            }
        }
    }

    /// Last successfully fetched list, without touching the network.
    pub fn cached_bugs(&self, issue_id: &str) -> Option<Vec<Bug>> {
        self.bug_lists
            .peek(issue_id)
            .map(|bugs| bugs.as_ref().clone())
    }

    pub fn bug_list_state(&self, issue_id: &str) -> CacheState {
        self.bug_lists.state(issue_id)
    }

    pub fn bug_url(&self, bug_id: u64) -> String {
        bug_url(&self.config, bug_id)
    }

    pub fn search_url(&self, params: &[(&str, &str)]) -> String {
        search_url(&self.config, params)
    }
}

use crate::synth::{bug_url, search_url, whiteboard_tag};
use crate::{Bug, TrackerConfig};

pub const FILE_BUG_LABEL: &str = "File Bugzilla Bug";
pub const VIEW_BUG_LABEL: &str = "View Bugzilla Bug";
pub const VIEW_BUGS_LABEL: &str = "View Bugzilla Bugs";

/// What the bridge button offers, derived from how many bugs carry the issue's
/// whiteboard tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    NoBug,
    OneBug(u64),
    ManyBugs,
}

impl ButtonState {
    pub fn from_bugs(bugs: &[Bug]) -> Self {
        match bugs {
            [] => ButtonState::NoBug,
            [bug] => ButtonState::OneBug(bug.id),
            _ => ButtonState::ManyBugs,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ButtonState::NoBug => FILE_BUG_LABEL,
            ButtonState::OneBug(_) => VIEW_BUG_LABEL,
            ButtonState::ManyBugs => VIEW_BUGS_LABEL,
        }
    }

    /// Link target for states that need no Sentry data.
    ///
    /// `NoBug` returns `None`: its target is a synthesized new-bug URL built
    /// from the issue and event payloads.
    pub fn existing_bug_href(self, config: &TrackerConfig, issue_id: &str) -> Option<String> {
        match self {
            ButtonState::NoBug => None,
            ButtonState::OneBug(id) => Some(bug_url(config, id)),
            ButtonState::ManyBugs => {
                let tag = whiteboard_tag(config, issue_id);
                Some(search_url(config, &[("status_whiteboard", tag.as_str())]))
            }
        }
    }
}

//! Bugbridge core: pure page-state logic shared by the engine and the app.
mod button;
mod config;
mod issue_ref;
mod model;
mod msg;
mod nav;
mod synth;

pub use button::{ButtonState, FILE_BUG_LABEL, VIEW_BUGS_LABEL, VIEW_BUG_LABEL};
pub use config::{ConfigError, TrackerConfig};
pub use issue_ref::{IssueRef, IssueUrlPattern, LATEST_EVENT};
pub use model::{Bug, BugList, Event, ExceptionInterface, ExceptionValue, Frame, Issue, Stacktrace};
pub use msg::PageMessage;
pub use nav::NavigationFilter;
pub use synth::{
    build_new_bug_url, bug_url, comment_url, format_comment, search_url, whiteboard_tag,
    whiteboard_tags,
};

//! Bugbridge engine: tracker clients, the host page model, and the page and
//! background drivers.
mod bugzilla;
mod cache;
mod content;
mod fetch;
mod notifier;
mod page;
mod reconciler;
mod sentry;
mod types;

pub use bugzilla::BugzillaClient;
pub use cache::{CacheState, ReadThroughCache};
pub use content::{ContentScript, RunSummary};
pub use fetch::{fetch_json, FetchSettings, Fetcher, ReqwestFetcher};
pub use notifier::{ChangeNotifier, NavigationDetails, Port, TabId};
pub use page::{ElementHandle, HostPage, PageError};
pub use reconciler::{Outcome, PageReconciler, ACTION_BAR_SELECTOR, BUTTON_SELECTOR};
pub use sentry::SentryClient;
pub use types::{FailureCategory, FailureKind, FetchError, FetchMetadata, FetchOutput};

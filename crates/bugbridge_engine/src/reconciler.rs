use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use bridge_logging::{bridge_debug, bridge_info};
use bugbridge_core::{
    build_new_bug_url, ButtonState, ConfigError, IssueRef, IssueUrlPattern, TrackerConfig,
    FILE_BUG_LABEL,
};

use crate::bugzilla::BugzillaClient;
use crate::fetch::Fetcher;
use crate::page::{escape_attr, escape_text, ElementHandle, HostPage, PageError};
use crate::sentry::SentryClient;

/// Container the host page renders its issue actions into.
pub const ACTION_BAR_SELECTOR: &str = ".group-actions";
/// Marker class of the bridge button.
pub const BUTTON_SELECTOR: &str = ".btn-bugzilla";
const BUTTON_CLASS: &str = "btn btn-default btn-sm btn-bugzilla";

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The location is not an issue page; nothing changed.
    Ignored,
    Rendered {
        issue: IssueRef,
        state: ButtonState,
        href: String,
    },
    /// A newer pass started before this one finished, so this one left the
    /// button alone.
    Superseded { issue: IssueRef },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Binding {
    Uninitialized,
    Bound(String),
}

/// Keeps the bridge button of one page in sync with the page location.
///
/// Built once per page load and owns every piece of per-page state: both
/// tracker caches, the issue the page is bound to, and the single button node.
pub struct PageReconciler {
    config: Arc<TrackerConfig>,
    pattern: IssueUrlPattern,
    page: Rc<HostPage>,
    sentry: SentryClient,
    bugzilla: BugzillaClient,
    binding: RefCell<Binding>,
    button: Cell<Option<ElementHandle>>,
    generation: Cell<u64>,
}

impl PageReconciler {
    pub fn new(
        config: Arc<TrackerConfig>,
        page: Rc<HostPage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, ConfigError> {
        let pattern = IssueUrlPattern::new(&config)?;
        Ok(Self {
            sentry: SentryClient::new(config.clone(), fetcher.clone()),
            bugzilla: BugzillaClient::new(config.clone(), fetcher),
            config,
            pattern,
            page,
            binding: RefCell::new(Binding::Uninitialized),
            button: Cell::new(None),
            generation: Cell::new(0),
        })
    }

    pub fn page(&self) -> &HostPage {
        &self.page
    }

    pub fn sentry(&self) -> &SentryClient {
        &self.sentry
    }

    pub fn bugzilla(&self) -> &BugzillaClient {
        &self.bugzilla
    }

    pub fn bound_issue(&self) -> Option<String> {
        match &*self.binding.borrow() {
            Binding::Uninitialized => None,
            Binding::Bound(issue_id) => Some(issue_id.clone()),
        }
    }

    /// The bridge button, if it is currently on the page.
    pub fn button(&self) -> Option<ElementHandle> {
        self.attached_button()
    }

    /// Re-derive the target issue from the page location and bring the button
    /// up to date. Safe to call redundantly and concurrently.
    pub async fn on_page_change(&self) -> Result<Outcome, PageError> {
        let location = self.page.location();
        let Some(issue) = self.pattern.parse(&location) else {
            bridge_debug!("Ignoring non-issue location {}", location);
            return Ok(Outcome::Ignored);
        };
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        self.bind(&issue).await?;

        let bugs = self.bugzilla.get_bugs_for_issue(&issue.issue_id).await;
        let state = ButtonState::from_bugs(&bugs);
        let href = match state.existing_bug_href(&self.config, &issue.issue_id) {
            Some(href) => href,
            None => self.new_bug_url(&issue).await,
        };

        // The host may have re-rendered the action bar during the fetches.
        let button = self.ensure_button().await?;
        if self.generation.get() != generation {
            bridge_debug!("Dropping stale render for issue {}", issue.issue_id);
            return Ok(Outcome::Superseded { issue });
        }

        self.render(button, &href, state.label())?;
        bridge_info!(
            "Issue {} (event {}): {:?}",
            issue.issue_id,
            issue.event_key(),
            state
        );
        Ok(Outcome::Rendered { issue, state, href })
    }

    async fn bind(&self, issue: &IssueRef) -> Result<(), PageError> {
        self.ensure_button().await?;
        let mut binding = self.binding.borrow_mut();
        if *binding != Binding::Bound(issue.issue_id.clone()) {
            bridge_info!("Bound to issue {}", issue.issue_id);
            *binding = Binding::Bound(issue.issue_id.clone());
        }
        Ok(())
    }

    /// The button currently on the page, adopting or creating one when the
    /// slot is empty or its element was removed by the host.
    async fn ensure_button(&self) -> Result<ElementHandle, PageError> {
        if let Some(button) = self.attached_button() {
            return Ok(button);
        }
        if self.button.take().is_some() {
            bridge_debug!("Button was removed from the page");
        }

        if let Some(existing) = self.page.query_selector(BUTTON_SELECTOR)? {
            bridge_debug!("Adopting button already on the page");
            self.button.set(Some(existing));
            return Ok(existing);
        }

        let action_bar = self.page.wait_for_element(ACTION_BAR_SELECTOR).await?;
        // Another pass may have created the button while this one waited.
        if let Some(button) = self.attached_button() {
            return Ok(button);
        }
        let button = self.page.append_html(action_bar, &self.button_markup())?;
        self.button.set(Some(button));
        Ok(button)
    }

    fn attached_button(&self) -> Option<ElementHandle> {
        self.button
            .get()
            .filter(|button| self.page.contains(*button))
    }

    fn button_markup(&self) -> String {
        format!(
            r#"<a class="{BUTTON_CLASS}" style="margin-left: 5px"><img src="{}" style="vertical-align: top"><span style="margin-left: 5px">{}</span></a>"#,
            escape_attr(&self.config.button_icon),
            escape_text(FILE_BUG_LABEL),
        )
    }

    async fn new_bug_url(&self, issue: &IssueRef) -> String {
        let (issue_data, event) = futures_util::join!(
            self.sentry.get_issue(&issue.issue_id),
            self.sentry
                .get_event(&issue.issue_id, issue.event_id.as_deref()),
        );
        build_new_bug_url(&self.config, issue_data.as_deref(), event.as_deref(), issue)
    }

    fn render(&self, button: ElementHandle, href: &str, label: &str) -> Result<(), PageError> {
        self.page.set_attribute(button, "href", href)?;
        match self.page.select_within(button, "span")? {
            Some(text) => self.page.set_text_content(text, label),
            None => {
                self.page.clear_text(button)?;
                self.page.append_html(button, &label_markup(label))?;
                Ok(())
            }
        }
    }
}

fn label_markup(label: &str) -> String {
    format!(
        r#"<span style="margin-left: 5px">{}</span>"#,
        escape_text(label)
    )
}

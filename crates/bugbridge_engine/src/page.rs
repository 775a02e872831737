//! In-process model of the host page: a parsed document the bridge can query
//! and mutate, the tab's current location, and a mutation feed that lets
//! callers wait for elements the page has not rendered yet.
use std::cell::RefCell;

use bridge_logging::bridge_trace;
use ego_tree::{NodeId, NodeMut, NodeRef};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("element {0:?} is not attached to the page")]
    StaleElement(ElementHandle),
    #[error("markup contains no element: {0:?}")]
    EmptyFragment(String),
}

/// Reference to an element of a [`HostPage`]. Only meaningful for the page that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(NodeId);

pub struct HostPage {
    document: RefCell<Html>,
    location: RefCell<String>,
    mutations: watch::Sender<u64>,
}

impl HostPage {
    pub fn new(location: impl Into<String>, html: &str) -> Self {
        let (mutations, _) = watch::channel(0);
        Self {
            document: RefCell::new(Html::parse_document(html)),
            location: RefCell::new(location.into()),
            mutations,
        }
    }

    pub fn location(&self) -> String {
        self.location.borrow().clone()
    }

    /// Same-document navigation (`history.pushState`). Does not touch the DOM.
    pub fn set_location(&self, href: impl Into<String>) {
        *self.location.borrow_mut() = href.into();
    }

    /// Number of mutation batches applied so far.
    pub fn revision(&self) -> u64 {
        *self.mutations.borrow()
    }

    /// Whether `element` is still part of the document.
    pub fn contains(&self, element: ElementHandle) -> bool {
        is_attached(&self.document.borrow(), element.0)
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>, PageError> {
        let selector = parse_selector(selector)?;
        Ok(self.select_first(&selector))
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError> {
        let selector = parse_selector(selector)?;
        let document = self.document.borrow();
        Ok(select_attached(&document, &selector).collect())
    }

    /// First descendant of `element` matching `selector`.
    pub fn select_within(
        &self,
        element: ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>, PageError> {
        let selector = parse_selector(selector)?;
        let document = self.document.borrow();
        let element = attached_element(&document, element)?;
        let found = element
            .select(&selector)
            .next()
            .map(|found| ElementHandle(found.id()));
        Ok(found)
    }

    /// Resolve to the first element matching `selector`, waiting for page
    /// mutations until one appears.
    ///
    /// There is no timeout: if nothing ever matches, the future stays pending.
    /// Each call has its own subscription, so any number may wait at once.
    pub async fn wait_for_element(&self, selector: &str) -> Result<ElementHandle, PageError> {
        let parsed = parse_selector(selector)?;
        let mut mutations = self.mutations.subscribe();
        loop {
            if let Some(found) = self.select_first(&parsed) {
                return Ok(found);
            }
            bridge_trace!("Waiting for {} (revision {})", selector, self.revision());
            // The sender lives as long as `self`, so this only fails if the
            // page is torn down mid-wait.
            if mutations.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Parse `markup` and append its nodes to `parent`, returning the first
    /// element appended.
    pub fn append_html(
        &self,
        parent: ElementHandle,
        markup: &str,
    ) -> Result<ElementHandle, PageError> {
        let fragment = Html::parse_fragment(markup);
        let appended = {
            let mut document = self.document.borrow_mut();
            ensure_attached(&document, parent)?;
            let mut parent_node = node_mut(&mut document, parent)?;
            let mut first_element = None;
            for child in fragment.root_element().children() {
                let mut copy = parent_node.append(child.value().clone());
                if first_element.is_none() && child.value().is_element() {
                    first_element = Some(ElementHandle(copy.id()));
                }
                graft(&mut copy, child);
            }
            first_element
        };
        let appended = appended.ok_or_else(|| PageError::EmptyFragment(markup.to_string()))?;
        self.notify_mutation();
        Ok(appended)
    }

    /// Detach `element` from the page.
    pub fn remove(&self, element: ElementHandle) -> Result<(), PageError> {
        {
            let mut document = self.document.borrow_mut();
            ensure_attached(&document, element)?;
            node_mut(&mut document, element)?.detach();
        }
        self.notify_mutation();
        Ok(())
    }

    pub fn attribute(&self, element: ElementHandle, name: &str) -> Result<Option<String>, PageError> {
        let document = self.document.borrow();
        let element = attached_element(&document, element)?;
        Ok(element.value().attr(name).map(str::to_string))
    }

    pub fn set_attribute(
        &self,
        element: ElementHandle,
        name: &str,
        value: &str,
    ) -> Result<(), PageError> {
        let replacement = {
            let document = self.document.borrow();
            let current = attached_element(&document, element)?;
            let tag = current.value().name().to_string();
            let mut attrs: Vec<(String, String)> = current
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
            element_node(&tag, &attrs)?
        };
        {
            let mut document = self.document.borrow_mut();
            *node_mut(&mut document, element)?.value() = replacement;
        }
        self.notify_mutation();
        Ok(())
    }

    pub fn text_content(&self, element: ElementHandle) -> Result<String, PageError> {
        let document = self.document.borrow();
        let element = attached_element(&document, element)?;
        Ok(element.text().collect())
    }

    /// Replace all children of `element` with a single text node.
    pub fn set_text_content(&self, element: ElementHandle, text: &str) -> Result<(), PageError> {
        let text_node = text_node(text);
        {
            let mut document = self.document.borrow_mut();
            ensure_attached(&document, element)?;
            let mut node = node_mut(&mut document, element)?;
            while let Some(mut child) = node.first_child() {
                child.detach();
            }
            if let Some(text_node) = text_node {
                node.append(text_node);
            }
        }
        self.notify_mutation();
        Ok(())
    }

    /// Drop the text nodes directly under `element`, keeping its child
    /// elements.
    pub fn clear_text(&self, element: ElementHandle) -> Result<(), PageError> {
        {
            let mut document = self.document.borrow_mut();
            ensure_attached(&document, element)?;
            let text_children: Vec<NodeId> = document
                .tree
                .get(element.0)
                .map(|node| {
                    node.children()
                        .filter(|child| child.value().is_text())
                        .map(|child| child.id())
                        .collect()
                })
                .unwrap_or_default();
            for id in text_children {
                if let Some(mut child) = document.tree.get_mut(id) {
                    child.detach();
                }
            }
        }
        self.notify_mutation();
        Ok(())
    }

    pub fn outer_html(&self, element: ElementHandle) -> Result<String, PageError> {
        let document = self.document.borrow();
        Ok(attached_element(&document, element)?.html())
    }

    /// Serialized form of the whole document.
    pub fn html(&self) -> String {
        self.document.borrow().html()
    }

    fn select_first(&self, selector: &Selector) -> Option<ElementHandle> {
        let document = self.document.borrow();
        let found = select_attached(&document, selector).next();
        found
    }

    fn notify_mutation(&self) {
        self.mutations.send_modify(|revision| *revision += 1);
    }
}

fn parse_selector(selector: &str) -> Result<Selector, PageError> {
    Selector::parse(selector).map_err(|err| PageError::InvalidSelector {
        selector: selector.to_string(),
        reason: err.to_string(),
    })
}

/// Matches of `selector` still in the document. The arena keeps removed
/// subtrees, which `Html::select` would otherwise visit.
fn select_attached<'a>(
    document: &'a Html,
    selector: &'a Selector,
) -> impl Iterator<Item = ElementHandle> + 'a {
    document
        .select(selector)
        .filter(move |element| is_attached(document, element.id()))
        .map(|element| ElementHandle(element.id()))
}

fn is_attached(document: &Html, id: NodeId) -> bool {
    let root = document.tree.root().id();
    document
        .tree
        .get(id)
        .is_some_and(|node| node.id() == root || node.ancestors().any(|a| a.id() == root))
}

fn ensure_attached(document: &Html, element: ElementHandle) -> Result<(), PageError> {
    if is_attached(document, element.0) {
        Ok(())
    } else {
        Err(PageError::StaleElement(element))
    }
}

fn attached_element(document: &Html, element: ElementHandle) -> Result<ElementRef<'_>, PageError> {
    ensure_attached(document, element)?;
    document
        .tree
        .get(element.0)
        .and_then(ElementRef::wrap)
        .ok_or(PageError::StaleElement(element))
}

fn node_mut(document: &mut Html, element: ElementHandle) -> Result<NodeMut<'_, Node>, PageError> {
    document
        .tree
        .get_mut(element.0)
        .ok_or(PageError::StaleElement(element))
}

fn graft(dest: &mut NodeMut<'_, Node>, src: NodeRef<'_, Node>) {
    for child in src.children() {
        let mut copy = dest.append(child.value().clone());
        graft(&mut copy, child);
    }
}

/// Build a detached element node by letting the HTML parser construct it.
fn element_node(tag: &str, attrs: &[(String, String)]) -> Result<Node, PageError> {
    let mut markup = format!("<{tag}");
    for (name, value) in attrs {
        markup.push_str(&format!(" {name}=\"{}\"", escape_attr(value)));
    }
    markup.push('>');
    let fragment = Html::parse_fragment(&markup);
    let node = fragment
        .root_element()
        .children()
        .find(|child| child.value().is_element())
        .map(|child| child.value().clone());
    node.ok_or(PageError::EmptyFragment(markup))
}

fn text_node(text: &str) -> Option<Node> {
    if text.is_empty() {
        return None;
    }
    let fragment = Html::parse_fragment(&format!("<span>{}</span>", escape_text(text)));
    let span = fragment
        .root_element()
        .children()
        .find(|child| child.value().is_element())?;
    let text = span.first_child()?;
    Some(text.value().clone())
}

pub(crate) fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

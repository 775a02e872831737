use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use bridge_logging::{bridge_debug, bridge_trace};
use bugbridge_core::{NavigationFilter, PageMessage};
use tokio::sync::mpsc;

pub type TabId = u64;

/// A same-document (history state) navigation reported by the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationDetails {
    pub tab_id: TabId,
    pub url: String,
}

struct Listener {
    id: u64,
    tab_id: TabId,
    tx: mpsc::UnboundedSender<PageMessage>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<Listener>,
}

/// Background-side relay from history-state navigations to connected pages.
///
/// Each [`Port`] registers one listener for its tab. A navigation in that tab
/// whose URL passes the filter sends the port a single
/// [`PageMessage::PageChanged`]; nothing else about the navigation is relayed.
#[derive(Clone)]
pub struct ChangeNotifier {
    filter: Arc<NavigationFilter>,
    registry: Arc<Mutex<Registry>>,
}

impl ChangeNotifier {
    pub fn new(filter: NavigationFilter) -> Self {
        Self {
            filter: Arc::new(filter),
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    pub fn filter(&self) -> &NavigationFilter {
        &self.filter
    }

    /// A page in `tab_id` connected.
    pub fn connect(&self, tab_id: TabId) -> Port {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.lock();
        registry.next_id += 1;
        let listener_id = registry.next_id;
        registry.listeners.push(Listener {
            id: listener_id,
            tab_id,
            tx,
        });
        bridge_debug!("Tab {} connected (listener {})", tab_id, listener_id);
        Port {
            tab_id,
            listener_id,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Relay a navigation; returns how many ports were notified.
    pub fn on_history_state_updated(&self, details: &NavigationDetails) -> usize {
        if !self.filter.matches(&details.url) {
            bridge_trace!("Navigation to {} does not match the issue filter", details.url);
            return 0;
        }
        let mut registry = self.lock();
        let mut delivered = 0;
        registry.listeners.retain(|listener| {
            if listener.tab_id != details.tab_id {
                return true;
            }
            match listener.tx.send(PageMessage::PageChanged) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        bridge_trace!("Navigation in tab {} notified {} port(s)", details.tab_id, delivered);
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Drop every listener; connected ports then see the end of their stream.
    pub fn shutdown(&self) {
        let mut registry = self.lock();
        bridge_debug!("Dropping {} listener(s)", registry.listeners.len());
        registry.listeners.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Page end of a notifier connection. Dropping it deregisters the listener.
pub struct Port {
    tab_id: TabId,
    listener_id: u64,
    rx: mpsc::UnboundedReceiver<PageMessage>,
    registry: Weak<Mutex<Registry>>,
}

impl Port {
    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    /// Next message, or `None` once the background side dropped the listener.
    pub async fn recv(&mut self) -> Option<PageMessage> {
        self.rx.recv().await
    }

    pub fn disconnect(self) {
        drop(self);
    }
}

impl Drop for Port {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry
            .listeners
            .retain(|listener| listener.id != self.listener_id);
        bridge_debug!("Tab {} disconnected", self.tab_id);
    }
}

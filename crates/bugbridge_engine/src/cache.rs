use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use bridge_logging::bridge_trace;

use crate::{FailureKind, FetchError};

/// What a cache knows about one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    /// Never requested.
    Absent,
    /// The last request failed and nothing has been stored.
    Failed(FailureKind),
    Ready,
}

enum Slot<V> {
    Ready(Arc<V>),
    Failed(FetchError),
}

/// Per-page map from key to fetched value.
///
/// Not shared across threads: the page that owns it drives every access. Two
/// concurrent misses on the same key both fetch; the later result wins.
pub struct ReadThroughCache<V> {
    name: &'static str,
    slots: RefCell<HashMap<String, Slot<V>>>,
}

impl<V> ReadThroughCache<V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: RefCell::new(HashMap::new()),
        }
    }

    pub fn state(&self, key: &str) -> CacheState {
        match self.slots.borrow().get(key) {
            None => CacheState::Absent,
            Some(Slot::Failed(err)) => CacheState::Failed(err.kind.clone()),
            Some(Slot::Ready(_)) => CacheState::Ready,
        }
    }

    pub fn peek(&self, key: &str) -> Option<Arc<V>> {
        match self.slots.borrow().get(key) {
            Some(Slot::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Return the stored value, or run `fetch` and store its result.
    ///
    /// A populated key is never fetched again. A failure is remembered for
    /// [`state`](Self::state) only; the next call fetches again.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<Arc<V>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, FetchError>>,
    {
        if let Some(value) = self.peek(key) {
            bridge_trace!("{} cache hit for {}", self.name, key);
            return Ok(value);
        }
        bridge_trace!("{} cache miss for {}", self.name, key);
        let result = fetch().await;
        self.record(key, result, true)
    }

    /// Always run `fetch`, replacing whatever was stored.
    pub async fn refresh<F, Fut>(&self, key: &str, fetch: F) -> Result<Arc<V>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, FetchError>>,
    {
        let result = fetch().await;
        self.record(key, result, false)
    }

    fn record(
        &self,
        key: &str,
        result: Result<V, FetchError>,
        keep_ready: bool,
    ) -> Result<Arc<V>, FetchError> {
        let mut slots = self.slots.borrow_mut();
        match result {
            Ok(value) => {
                let value = Arc::new(value);
                slots.insert(key.to_string(), Slot::Ready(value.clone()));
                Ok(value)
            }
            Err(err) => {
                let has_value = matches!(slots.get(key), Some(Slot::Ready(_)));
                if !(keep_ready && has_value) {
                    slots.insert(key.to_string(), Slot::Failed(err.clone()));
                }
                Err(err)
            }
        }
    }
}

//! Bounded FIFO map correlating tool calls with their call identifiers.
//!
//! Framework adapters see a tool invocation and, some time later, a tool
//! result that only carries the function name and arguments. This cache lets
//! the adapter recover the call identifier for the result without growing
//! memory unboundedly over a long process lifetime.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Default maximum number of pending correlations retained.
pub const DEFAULT_CAPACITY: usize = 1000;

/// A bounded, thread-safe map from `functionName:argumentsJson` to a call
/// identifier.
///
/// Insertion beyond capacity evicts the oldest-inserted entries (FIFO, not
/// LRU: lookups do not refresh an entry's position). Correlation is a
/// best-effort aid — malformed input is ignored rather than rejected.
#[derive(Debug)]
pub struct CorrelationCache {
    inner: Mutex<CorrelationInner>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct CorrelationInner {
    entries: HashMap<String, String>,
    // Insertion order; keys appear at most once because overwrites keep
    // the original position.
    order: VecDeque<String>,
}

impl CorrelationCache {
    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a cache bounded to `capacity` entries.
    ///
    /// A capacity of zero is treated as 1 so the cache stays usable.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CorrelationInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Remember the call identifier for a tool invocation.
    ///
    /// A blank function name or call id makes this a no-op. Recording an
    /// already-known key overwrites its value without changing its eviction
    /// order.
    pub fn record(&self, function_name: &str, arguments_json: &str, call_id: &str) {
        if function_name.trim().is_empty() || call_id.trim().is_empty() {
            return;
        }

        let key = Self::cache_key(function_name, arguments_json);
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if inner.entries.insert(key.clone(), call_id.to_string()).is_none() {
            inner.order.push_back(key);
        }

        while inner.entries.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    /// Look up the call identifier recorded for a tool invocation.
    pub fn lookup(&self, function_name: &str, arguments_json: &str) -> Option<String> {
        let key = Self::cache_key(function_name, arguments_json);
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.get(&key).cloned()
    }

    /// Number of correlations currently retained.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.len()
    }

    /// Check whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cache_key(function_name: &str, arguments_json: &str) -> String {
        format!("{}:{}", function_name, arguments_json)
    }
}

impl Default for CorrelationCache {
    fn default() -> Self {
        Self::new()
    }
}

//! BundleCache - process-wide memo of resolved handler bundles
//!
//! Keyed by handler text. Each key owns a `OnceCell`, which gives:
//! - hits that never wait on a resolution in progress for another key
//! - single-flight misses: concurrent first use of one key runs the resolver
//!   once, and every other caller for that key waits for and shares the result
//! - no negative caching: a failed resolution leaves the cell empty, so the
//!   next caller retries from scratch
//!
//! The map lock is only held to look up or insert a cell, never while a
//! resolver runs. Entries are never evicted.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use carrier_bundle::HandlerBundle;
use carrier_model::HandlerText;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::{HandlerResolver, ResolveError};

type Entry = Arc<OnceCell<Arc<HandlerBundle>>>;

pub struct BundleCache {
    resolver: Arc<dyn HandlerResolver>,
    entries: RwLock<HashMap<HandlerText, Entry>>,
}

impl BundleCache {
    pub fn new(resolver: Arc<dyn HandlerResolver>) -> Self {
        Self { resolver, entries: RwLock::new(HashMap::new()) }
    }

    /// Get the bundle for `text`, resolving it on first use.
    pub async fn resolve(&self, text: &HandlerText) -> Result<Arc<HandlerBundle>, ResolveError> {
        let entry = self.entry(text);
        if let Some(bundle) = entry.get() {
            return Ok(bundle.clone());
        }

        let bundle = entry
            .get_or_try_init(|| async {
                debug!(handler = %text.digest(), "Resolving handler");
                match self.resolver.resolve(text).await {
                    Ok(bundle) => {
                        debug!(handler = %text.digest(), operations = ?bundle.operations(), "Resolved handler");
                        Ok(Arc::new(bundle))
                    }
                    Err(e) => {
                        warn!(handler = %text.digest(), error = %e, "Handler resolution failed");
                        Err(e)
                    }
                }
            })
            .await?;
        Ok(bundle.clone())
    }

    fn entry(&self, text: &HandlerText) -> Entry {
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = entries.get(text) {
                return entry.clone();
            }
        }
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.entry(text.clone()).or_default().clone()
    }

    /// Whether `text` has been resolved successfully.
    pub fn contains(&self, text: &HandlerText) -> bool {
        self.entries
            .read()
            .map(|e| e.get(text).is_some_and(|cell| cell.initialized()))
            .unwrap_or(false)
    }

    /// Number of successfully resolved bundles.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .map(|e| e.values().filter(|cell| cell.initialized()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::data::{Entry, ListState};
use crate::provider::DataProvider;

/// The ListStore owns the paginated, searchable list for one screen session.
///
/// It is the only writer of `ListState`. Readers get immutable snapshots,
/// either on demand (`snapshot`) or pushed through a watch channel
/// (`subscribe`). No operation returns an error: a failed page load is
/// recorded in `load_error`, everything else degrades silently.
pub struct ListStore {
    provider: Arc<dyn DataProvider>,
    page_size: usize,
    inner: Mutex<Inner>,
    tx: watch::Sender<Arc<ListState>>,
}

struct Inner {
    state: ListState,
    /// Full unfiltered list, taken on the first search and restored on clear
    snapshot: Option<Vec<Entry>>,
    query: Option<String>,
    /// Bumped by every `apply_filter` so older searches can tell they lost
    search_generation: u64,
    /// `items` came from the provider's search endpoint, not a local filter
    remote_results: bool,
}

/// A provider search started by `filter_loaded`
#[derive(Debug)]
pub struct PendingSearch {
    query: String,
    generation: u64,
}

impl Inner {
    fn refilter(&mut self) {
        if let (Some(all), Some(query)) = (&self.snapshot, &self.query) {
            self.state.items = all.iter().filter(|e| e.matches(query)).cloned().collect();
        }
    }
}

impl ListStore {
    /// Create an empty store. Nothing is fetched until `load_next_page`.
    pub fn new(provider: Arc<dyn DataProvider>, page_size: usize) -> Self {
        let (tx, _) = watch::channel(Arc::new(ListState::default()));
        Self {
            provider,
            page_size: page_size.max(1),
            inner: Mutex::new(Inner {
                state: ListState::default(),
                snapshot: None,
                query: None,
                search_generation: 0,
                remote_results: false,
            }),
            tx,
        }
    }

    /// Current state
    pub fn snapshot(&self) -> Arc<ListState> {
        self.tx.borrow().clone()
    }

    /// Receive a new snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<Arc<ListState>> {
        self.tx.subscribe()
    }

    /// Load the next page from the provider.
    ///
    /// No-op while a page is loading, once the end is reached, or while a
    /// search is active. On failure `items` and `next_offset` are left
    /// untouched so calling again repeats the same request.
    pub async fn load_next_page(&self) {
        let offset = {
            let mut inner = self.lock();
            if !inner.state.can_load_more() {
                debug!(
                    "Skipping page load (loading={}, end={}, searching={})",
                    inner.state.is_loading, inner.state.reached_end, inner.state.is_searching
                );
                return;
            }
            inner.state.is_loading = true;
            inner.state.load_error = None;
            self.publish(&inner);
            inner.state.next_offset
        };

        let result = self.provider.get_page(offset, self.page_size).await;

        let mut inner = self.lock();
        inner.state.is_loading = false;

        match result {
            Ok(page) => {
                let count = page.entries.len();
                inner.state.next_offset += count;
                if count < self.page_size || !page.has_more {
                    inner.state.reached_end = true;
                }

                // A search started while this page was in flight
                if inner.state.is_searching {
                    if let Some(all) = inner.snapshot.as_mut() {
                        all.extend(page.entries);
                    }
                    if !inner.remote_results {
                        inner.refilter();
                    }
                } else {
                    inner.state.items.extend(page.entries);
                }

                info!(
                    "📦 Loaded {} entries at offset {} ({} total{})",
                    count,
                    offset,
                    inner.state.next_offset,
                    if inner.state.reached_end { ", end reached" } else { "" }
                );
            }
            Err(e) => {
                warn!("⚠️  Page load at offset {} failed: {}", offset, e);
                inner.state.load_error = Some(e.to_string());
            }
        }

        self.publish(&inner);
    }

    /// Retry after a failed page load
    pub async fn retry(&self) {
        self.load_next_page().await;
    }

    /// Filter the list by `query`, including any provider-side search.
    pub async fn apply_filter(&self, query: &str) {
        if let Some(search) = self.filter_loaded(query) {
            self.search_remote(search).await;
        }
    }

    /// Filter the loaded entries by `query` right away.
    ///
    /// A blank query restores the full list. Otherwise entries match by name
    /// substring (case-insensitive) or exact Pokédex number. Every call
    /// supersedes the ones before it, so callers must invoke this in input
    /// order. Returns the provider search to run for a non-blank query.
    pub fn filter_loaded(&self, query: &str) -> Option<PendingSearch> {
        let query = query.trim().to_string();

        let mut inner = self.lock();
        inner.search_generation += 1;
        inner.remote_results = false;

        if query.is_empty() {
            if let Some(all) = inner.snapshot.take() {
                inner.state.items = all;
            }
            inner.state.is_searching = false;
            inner.query = None;
            self.publish(&inner);
            return None;
        }

        if inner.snapshot.is_none() {
            inner.snapshot = Some(inner.state.items.clone());
        }
        inner.state.is_searching = true;
        inner.query = Some(query.clone());
        inner.refilter();
        self.publish(&inner);

        Some(PendingSearch {
            query,
            generation: inner.search_generation,
        })
    }

    /// Ask the provider for `search`; its results replace the local matches
    /// unless a later filter has been applied in the meantime.
    pub async fn search_remote(&self, search: PendingSearch) {
        let PendingSearch { query, generation } = search;

        match self.provider.search(&query).await {
            Ok(Some(results)) => {
                let mut inner = self.lock();
                if inner.search_generation != generation {
                    debug!("Discarding superseded results for {:?}", query);
                    return;
                }
                debug!("🔍 {} remote results for {:?}", results.len(), query);
                inner.state.items = results;
                inner.remote_results = true;
                self.publish(&inner);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("⚠️  Remote search for {:?} failed, keeping local matches: {}", query, e);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.tx.send_replace(Arc::new(inner.state.clone()));
    }
}

impl std::fmt::Debug for ListStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListStore")
            .field("page_size", &self.page_size)
            .field("state", &self.snapshot())
            .finish()
    }
}

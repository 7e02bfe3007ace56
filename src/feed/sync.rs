use std::sync::{Arc, Mutex};

use crate::feed::fetcher::Fetcher;
use crate::feed::model::Feed;
use crate::feed::parser::{self, ParseError};
use crate::feed::reconcile::{reconcile, ReconcilePolicy};
use crate::presenter::Presenter;
use crate::storage::ReadStateStore;

/// What one refresh cycle amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The item list changed: `new_items` entered, a notification may have
    /// fired.
    Updated { new_items: usize, notified: bool },
    /// Steady state — the candidate set matched what we already had.
    Unchanged,
    /// Fetch or parse failed; error state is set and `on_error` fired.
    Failed,
}

/// Runs one fetch-and-reconcile cycle for a feed.
///
/// The lock is held only for the synchronous merge — never across the fetch
/// await — so user actions like mark-read stay responsive and an abort can
/// only land at the await point, where no partial state exists yet.
///
/// Error policy: every failure is recoverable. Fetch and parse errors set
/// the feed's error state and fire `on_error`; store failures are logged
/// and swallowed. The caller's timer re-arms regardless of the outcome.
pub async fn refresh_feed<F: Fetcher>(
    feed: &Arc<Mutex<Feed>>,
    fetcher: &F,
    store: &ReadStateStore,
    presenter: &dyn Presenter,
    policy: &ReconcilePolicy,
) -> SyncOutcome {
    // Optimistic reset: a new attempt clears the previous error state.
    let url = {
        let mut feed = feed.lock().expect("feed lock poisoned");
        feed.clear_error();
        feed.url.clone()
    };

    let bytes = match fetcher.fetch(&url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return fail(
                feed,
                presenter,
                &url,
                "Unable to download feed",
                &e.to_string(),
            );
        }
    };

    let parsed = match parser::parse(&bytes) {
        Ok(parsed) => parsed,
        Err(ParseError::NoItems) => {
            // Structurally valid but empty: soft error, same surfacing path
            return fail(
                feed,
                presenter,
                &url,
                "Unable to read feed contents",
                "feed contains no items",
            );
        }
        Err(e) => {
            return fail(feed, presenter, &url, "Failed to parse feed", &e.to_string());
        }
    };

    let persisted = match store.load(&url) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(feed = %url, error = %e, "Read-state load failed, starting empty");
            Default::default()
        }
    };

    // Synchronous run-to-completion merge under the lock.
    let (result, title) = {
        let mut feed = feed.lock().expect("feed lock poisoned");
        let mut result = reconcile(&feed.items, parsed.items, &persisted, policy);
        feed.metadata = parsed.metadata;
        feed.items = std::mem::take(&mut result.items);
        (result, feed.display_title().to_string())
    };

    tracing::debug!(
        feed = %url,
        new = result.new_count,
        unread = result.unread_new.len(),
        dropped = result.dropped_vanished,
        trimmed = result.trimmed,
        "Reconciled fetch"
    );

    if result.should_update() {
        presenter.on_update(&url);
    }
    let notified = result.should_notify();
    if notified {
        if let Some(summary) = result.notification_summary() {
            presenter.on_new_item(&title, &summary);
        }
    }

    if result.should_persist() {
        persist(feed, store, &url);
    }

    if result.changed() {
        SyncOutcome::Updated {
            new_items: result.new_count,
            notified,
        }
    } else {
        SyncOutcome::Unchanged
    }
}

/// Marks one item read and persists, mirroring a user opening the item.
/// Returns false if the item does not exist or was already read.
pub fn mark_item_read(feed: &Arc<Mutex<Feed>>, store: &ReadStateStore, id: &str) -> bool {
    let (changed, url) = {
        let mut feed = feed.lock().expect("feed lock poisoned");
        (feed.mark_read(id), feed.url.clone())
    };
    if changed {
        persist(feed, store, &url);
    }
    changed
}

/// Marks every item read and persists.
pub fn mark_all_read(feed: &Arc<Mutex<Feed>>, store: &ReadStateStore) {
    let url = {
        let mut feed = feed.lock().expect("feed lock poisoned");
        feed.mark_all_read();
        feed.url.clone()
    };
    persist(feed, store, &url);
}

/// Soft-deletes one item and persists. Returns false for unknown ids.
pub fn mark_item_deleted(feed: &Arc<Mutex<Feed>>, store: &ReadStateStore, id: &str) -> bool {
    let (changed, url) = {
        let mut feed = feed.lock().expect("feed lock poisoned");
        (feed.mark_deleted(id), feed.url.clone())
    };
    if changed {
        persist(feed, store, &url);
    }
    changed
}

fn persist(feed: &Arc<Mutex<Feed>>, store: &ReadStateStore, url: &str) {
    // Snapshot outside the store call; a save failure only costs us until
    // the next successful save.
    let snapshot = feed.lock().expect("feed lock poisoned").clone();
    if let Err(e) = store.save(&snapshot) {
        tracing::warn!(feed = %url, error = %e, "Failed to save read state");
    }
}

fn fail(
    feed: &Arc<Mutex<Feed>>,
    presenter: &dyn Presenter,
    url: &str,
    message: &str,
    details: &str,
) -> SyncOutcome {
    tracing::warn!(feed = %url, details = %details, "{message}");
    feed.lock()
        .expect("feed lock poisoned")
        .set_error(message, details);
    presenter.on_error(url, message, details);
    SyncOutcome::Failed
}

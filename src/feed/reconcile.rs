use std::collections::{HashMap, HashSet};

use crate::feed::model::FeedItem;
use crate::storage::PersistedState;

/// Knobs governing a reconcile pass.
#[derive(Debug, Clone)]
pub struct ReconcilePolicy {
    /// Upper bound on retained items; excess is dropped from the tail in
    /// source order. 0 = unlimited.
    pub max_items: usize,
    /// How many consecutive fetches an unread item may be absent from the
    /// upstream document before it is dropped. 0 drops vanished items
    /// immediately (the historical behavior).
    pub unread_retention_cycles: u32,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            max_items: 100,
            unread_retention_cycles: 3,
        }
    }
}

/// Outcome of merging one fetch's candidates against known state.
///
/// The reconciler computes *what happened*; the sync driver turns that into
/// presenter callbacks and persistence. Keeping the decision here makes
/// every signaling rule a plain unit test.
#[derive(Debug)]
pub struct Reconciliation {
    /// The new canonical item list, candidate order first, retained
    /// vanished items at the tail.
    pub items: Vec<FeedItem>,
    /// Items seen for the first time in this process (including ones
    /// restored read from persisted state).
    pub new_count: usize,
    /// Titles of genuinely new unread items, in arrival order.
    pub unread_new: Vec<String>,
    /// True when the in-memory list was empty at the start of the cycle —
    /// the first successful fetch of this process's lifetime for this feed.
    pub first_fetch: bool,
    /// Vanished items dropped this cycle (read, or retention expired).
    pub dropped_vanished: usize,
    /// Items cut by the max_items bound.
    pub trimmed: usize,
}

impl Reconciliation {
    /// Did the canonical list gain items this cycle?
    pub fn changed(&self) -> bool {
        self.new_count > 0
    }

    /// `on_update` fires whenever items landed in a "new" bucket. The
    /// steady-state poll with nothing new stays completely silent.
    pub fn should_update(&self) -> bool {
        self.changed()
    }

    /// `on_new_item` fires for genuinely new unread items — but never on the
    /// first fetch, where "new" just means "loaded after restart".
    pub fn should_notify(&self) -> bool {
        !self.first_fetch && !self.unread_new.is_empty()
    }

    /// One notification per cycle: a single new item is named by title,
    /// several collapse to a count.
    pub fn notification_summary(&self) -> Option<String> {
        match self.unread_new.as_slice() {
            [] => None,
            [title] => Some(title.clone()),
            many => Some(format!("{} unread items", many.len())),
        }
    }

    /// Persist whenever the list changed, so newly seen ids reach disk
    /// before the next restart.
    pub fn should_persist(&self) -> bool {
        self.changed()
    }
}

/// Merges freshly parsed candidates against the previous in-memory list and
/// the persisted read-state.
///
/// - A candidate whose id already exists in memory is discarded in favor of
///   the existing item, carried forward unchanged — user mutations (read,
///   deleted) since the last fetch always win over refetched content.
/// - A candidate unknown to this process consults `persisted`: a record
///   flagged read comes back read with no notification (restart recovery);
///   anything else is created unread and counted as genuinely new.
/// - In-memory items missing from the candidate set are retained at the
///   tail while unread and within the retention window, otherwise dropped.
///
/// The merged list preserves candidate order; nothing is re-sorted by
/// timestamp.
pub fn reconcile(
    current: &[FeedItem],
    candidates: Vec<FeedItem>,
    persisted: &PersistedState,
    policy: &ReconcilePolicy,
) -> Reconciliation {
    let first_fetch = current.is_empty();
    let by_id: HashMap<&str, &FeedItem> = current.iter().map(|i| (i.id.as_str(), i)).collect();

    let mut items: Vec<FeedItem> = Vec::with_capacity(candidates.len());
    let mut new_count = 0;
    let mut unread_new = Vec::new();

    for candidate in candidates {
        if let Some(existing) = by_id.get(candidate.id.as_str()) {
            let mut kept = (*existing).clone();
            kept.missed_cycles = 0;
            items.push(kept);
            continue;
        }

        let mut item = candidate;
        if let Some(record) = persisted.get(&item.id) {
            item.read = record.read;
            item.deleted = record.deleted;
        }
        new_count += 1;
        if !item.read && !item.deleted {
            unread_new.push(item.title.clone());
        }
        items.push(item);
    }

    // Vanished items: in memory last cycle, absent from this fetch.
    let mut dropped_vanished = 0;
    let vanished: Vec<FeedItem> = {
        let merged_ids: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
        current
            .iter()
            .filter(|i| !merged_ids.contains(i.id.as_str()))
            .cloned()
            .collect()
    };
    for mut item in vanished {
        item.missed_cycles += 1;
        let retain =
            !item.read && !item.deleted && item.missed_cycles <= policy.unread_retention_cycles;
        if retain {
            items.push(item);
        } else {
            dropped_vanished += 1;
        }
    }

    let mut trimmed = 0;
    if policy.max_items > 0 && items.len() > policy.max_items {
        trimmed = items.len() - policy.max_items;
        items.truncate(policy.max_items);
    }

    Reconciliation {
        items,
        new_count,
        unread_new,
        first_fetch,
        dropped_vanished,
        trimmed,
    }
}

use chrono::{DateTime, Utc};

/// A single entry within a feed.
///
/// `id` is the join key for reconciliation: it uniquely identifies an item
/// within one feed across fetch cycles. The parser derives it from the
/// source document (RSS `guid`, falling back to `link`; Atom `id`), so a
/// feed that changes its identity scheme will make every item look new once.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub link: String,
    /// Description rendered to the safe display-markup subset.
    pub description: String,
    /// Description rendered to plain text.
    pub description_text: String,
    /// Best-effort parsed publication time. Absent or unparseable dates are
    /// `None`; they never fail the pipeline.
    pub published: Option<DateTime<Utc>>,
    /// False at creation; set true by user action and never reset by a fetch.
    pub read: bool,
    /// Soft-delete flag. Deleted items stay in the list (and on disk) but are
    /// excluded from display listings.
    pub deleted: bool,
    /// Consecutive fetches this item has been absent from the upstream
    /// document. In-memory bookkeeping for the vanished-item retention
    /// policy; not persisted.
    pub missed_cycles: u32,
}

impl FeedItem {
    pub fn mark_read(&mut self) {
        self.read = true;
    }
}

/// Feed-level image metadata (RSS `<image>`, Atom `<logo>`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageInfo {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Feed-level metadata, overwritten wholesale on each successful fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedMetadata {
    pub title: String,
    pub description: String,
    pub link: String,
    pub image: Option<ImageInfo>,
}

/// Error state exposed per-feed for a display layer to render.
///
/// Set on fetch/parse failure, cleared at the start of the next fetch
/// attempt (optimistic reset, not sticky until dismissal).
#[derive(Debug, Clone, PartialEq)]
pub struct FeedError {
    pub message: String,
    pub details: String,
}

/// One subscribed feed: its URL, last-known metadata, and the canonical
/// item list in source-document order (newest first by upstream convention —
/// items are never re-sorted by timestamp).
#[derive(Debug, Clone)]
pub struct Feed {
    pub url: String,
    /// Configured title override; takes precedence over the fetched title.
    pub title_override: Option<String>,
    pub metadata: FeedMetadata,
    pub items: Vec<FeedItem>,
    pub error: Option<FeedError>,
}

impl Feed {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title_override: None,
            metadata: FeedMetadata::default(),
            items: Vec::new(),
            error: None,
        }
    }

    pub fn with_title_override(url: impl Into<String>, title: Option<String>) -> Self {
        Self {
            title_override: title,
            ..Self::new(url)
        }
    }

    /// Display title: the configured override if present, else the last
    /// fetched title, else the URL (a feed that has never fetched
    /// successfully still needs a label).
    pub fn display_title(&self) -> &str {
        if let Some(t) = &self.title_override {
            return t;
        }
        if !self.metadata.title.is_empty() {
            return &self.metadata.title;
        }
        &self.url
    }

    pub fn set_error(&mut self, message: impl Into<String>, details: impl Into<String>) {
        self.error = Some(FeedError {
            message: message.into(),
            details: details.into(),
        });
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|i| !i.read && !i.deleted).count()
    }

    /// Items for a display layer: deleted items are always excluded, read
    /// items only when `show_read` is set, capped at `max_items`.
    pub fn visible_items(&self, show_read: bool, max_items: usize) -> Vec<&FeedItem> {
        self.items
            .iter()
            .filter(|i| !i.deleted && (show_read || !i.read))
            .take(max_items)
            .collect()
    }

    pub fn item_by_id_mut(&mut self, id: &str) -> Option<&mut FeedItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Marks a single item read. Returns true if the item existed and was
    /// previously unread.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.item_by_id_mut(id) {
            Some(item) if !item.read => {
                item.mark_read();
                true
            }
            _ => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for item in &mut self.items {
            item.mark_read();
        }
    }

    /// Soft-deletes a single item. Returns true if the item existed.
    pub fn mark_deleted(&mut self, id: &str) -> bool {
        match self.item_by_id_mut(id) {
            Some(item) => {
                item.deleted = true;
                true
            }
            None => false,
        }
    }
}

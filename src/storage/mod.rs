//! On-disk persistence for per-feed read state.
//!
//! The store is partitioned one-JSON-file-per-feed, keyed by a sanitized
//! form of the feed URL, so feeds never contend with each other. Only item
//! identity and user flags are persisted — item content always comes from
//! the freshest fetch.

mod read_state;

pub use read_state::{sanitize_url, PersistedItem, PersistedState, ReadStateStore, StoreError};

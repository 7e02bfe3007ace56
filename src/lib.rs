//! newswire — headless RSS/Atom feed polling and read-state sync engine.
//!
//! The crate polls a configured set of feed URLs, tracks which items the
//! user has seen across process restarts, and reports updates, errors and
//! genuinely new unread items through a [`presenter::Presenter`] callback
//! sink. The heart of it is the reconciliation step
//! ([`feed::reconcile`]): merging a freshly fetched document against the
//! previous in-memory list and the per-feed persisted read state, so user
//! mutations survive refetches and a restart never re-notifies old news.
//!
//! The two outward seams are [`feed::Fetcher`] (URL → raw document bytes)
//! and [`presenter::Presenter`] (event callbacks); everything in between —
//! parsing, merging, persistence, scheduling — is this crate.

pub mod config;
pub mod feed;
pub mod presenter;
pub mod scheduler;
pub mod storage;
pub mod util;

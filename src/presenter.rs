//! Callback sink for feed events.
//!
//! The sync core never renders anything; it reports what happened through a
//! [`Presenter`] passed in at construction. A desktop shell would map these
//! onto menu rebuilds and notification toasts; the bundled [`LogPresenter`]
//! just writes structured log lines for headless operation.

/// Event sink invoked by the sync core.
///
/// Implementations must be cheap and non-blocking: callbacks run on the
/// feed's sync task between reconcile and persist.
pub trait Presenter: Send + Sync {
    /// The feed's item list changed; a display layer should re-render.
    fn on_update(&self, feed_url: &str);

    /// A fetch or parse failed. The same information is recorded on the
    /// feed's error state; this is the push-style notification of it.
    fn on_error(&self, feed_url: &str, message: &str, details: &str);

    /// One or more genuinely new unread items arrived. `summary` is the
    /// single item's title, or an "N unread items" count — one call per
    /// fetch cycle, never one per item.
    fn on_new_item(&self, feed_title: &str, summary: &str);
}

/// Presenter that reports events through `tracing`.
#[derive(Debug, Default, Clone)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn on_update(&self, feed_url: &str) {
        tracing::info!(feed = %feed_url, "Feed updated");
    }

    fn on_error(&self, feed_url: &str, message: &str, details: &str) {
        tracing::error!(feed = %feed_url, details = %details, "{message}");
    }

    fn on_new_item(&self, feed_title: &str, summary: &str) {
        tracing::info!(feed = %feed_title, "New items: {summary}");
    }
}

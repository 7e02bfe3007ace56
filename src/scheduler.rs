//! Periodic polling: one timer per feed, one in-flight cycle per feed.
//!
//! Each feed gets its own tokio task running refresh-then-sleep. Because
//! the refresh is awaited inside the task's own loop, a new tick can never
//! overlap an outstanding fetch for the same feed — the "exactly one
//! in-flight cycle" rule holds by construction, not by locking. All
//! cancellation is task abort; an aborted cycle can only die at the fetch
//! await, before any state was touched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::feed::{refresh_feed, Feed, Fetcher, ReconcilePolicy};
use crate::presenter::Presenter;
use crate::storage::ReadStateStore;

struct FeedHandle {
    feed: Arc<Mutex<Feed>>,
    task: JoinHandle<()>,
}

/// Drives periodic refresh cycles for a set of feeds.
///
/// Feeds are keyed by URL. Adding a URL that is already scheduled replaces
/// its timer (never duplicates it); removing a feed aborts its timer and
/// discards the in-memory state, leaving the persisted read state on disk
/// for a future re-subscribe.
pub struct Scheduler<F: Fetcher> {
    fetcher: Arc<F>,
    store: ReadStateStore,
    presenter: Arc<dyn Presenter>,
    policy: ReconcilePolicy,
    interval: Duration,
    feeds: HashMap<String, FeedHandle>,
}

impl<F: Fetcher> Scheduler<F> {
    pub fn new(
        fetcher: F,
        store: ReadStateStore,
        presenter: Arc<dyn Presenter>,
        policy: ReconcilePolicy,
        interval: Duration,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            store,
            presenter,
            policy,
            interval,
            feeds: HashMap::new(),
        }
    }

    /// Registers a feed and starts its polling loop; the first refresh runs
    /// immediately. The last-known title is preloaded from the persisted
    /// state so the feed has a label before its first successful fetch.
    pub fn add_feed(
        &mut self,
        url: impl Into<String>,
        title_override: Option<String>,
    ) -> Arc<Mutex<Feed>> {
        let url = url.into();

        let mut feed = Feed::with_title_override(url.clone(), title_override);
        match self.store.load(&url) {
            Ok(state) if !state.feed_title.is_empty() => {
                feed.metadata.title = state.feed_title;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(feed = %url, error = %e, "Could not preload persisted title");
            }
        }

        let feed = Arc::new(Mutex::new(feed));
        let task = self.spawn_loop(Arc::clone(&feed));

        if let Some(previous) = self.feeds.insert(
            url.clone(),
            FeedHandle {
                feed: Arc::clone(&feed),
                task,
            },
        ) {
            previous.task.abort();
            tracing::debug!(feed = %url, "Replaced existing polling task");
        }

        tracing::info!(feed = %url, interval_secs = self.interval.as_secs(), "Feed scheduled");
        feed
    }

    /// Stops polling a feed and discards its in-memory state. Returns false
    /// if the URL was not scheduled.
    pub fn remove_feed(&mut self, url: &str) -> bool {
        match self.feeds.remove(url) {
            Some(handle) => {
                handle.task.abort();
                tracing::info!(feed = %url, "Feed unscheduled");
                true
            }
            None => false,
        }
    }

    /// Manual reload: cancels the feed's timer and restarts its loop, which
    /// refreshes immediately. Restarting (rather than firing an extra fetch)
    /// keeps a reload burst from stacking overlapping cycles.
    pub fn reload(&mut self, url: &str) -> bool {
        let feed = match self.feeds.get_mut(url) {
            Some(handle) => {
                handle.task.abort();
                Arc::clone(&handle.feed)
            }
            None => return false,
        };
        let task = self.spawn_loop(feed);
        if let Some(handle) = self.feeds.get_mut(url) {
            handle.task = task;
        }
        tracing::debug!(feed = %url, "Manual reload");
        true
    }

    /// Changes the polling interval and re-arms every feed's timer.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
        let urls: Vec<String> = self.feeds.keys().cloned().collect();
        for url in urls {
            self.reload(&url);
        }
        tracing::info!(interval_secs = interval.as_secs(), "Polling interval changed");
    }

    pub fn feed(&self, url: &str) -> Option<Arc<Mutex<Feed>>> {
        self.feeds.get(url).map(|h| Arc::clone(&h.feed))
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.feeds.keys().map(String::as_str)
    }

    /// Aborts every polling task. Also runs on drop.
    pub fn shutdown(&mut self) {
        for (url, handle) in self.feeds.drain() {
            handle.task.abort();
            tracing::debug!(feed = %url, "Polling task stopped");
        }
    }

    fn spawn_loop(&self, feed: Arc<Mutex<Feed>>) -> JoinHandle<()> {
        let fetcher = Arc::clone(&self.fetcher);
        let store = self.store.clone();
        let presenter = Arc::clone(&self.presenter);
        let policy = self.policy.clone();
        let interval = self.interval;

        tokio::spawn(async move {
            loop {
                refresh_feed(&feed, fetcher.as_ref(), &store, presenter.as_ref(), &policy).await;
                tokio::time::sleep(interval).await;
            }
        })
    }
}

impl<F: Fetcher> Drop for Scheduler<F> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FetchError;
    use crate::presenter::LogPresenter;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INTERVAL: Duration = Duration::from_secs(300);
    const URL: &str = "https://example.com/rss";

    /// Fetcher that counts calls and serves a fixed document (or errors).
    struct CountingFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingFetcher {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    impl Fetcher for CountingFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(FetchError::HttpStatus(500))
            } else {
                Ok(br#"<rss version="2.0"><channel><title>t</title>
                    <item><guid>a</guid><title>A</title></item></channel></rss>"#
                    .to_vec())
            }
        }
    }

    fn scheduler(fetcher: CountingFetcher, dir: &tempfile::TempDir) -> Scheduler<CountingFetcher> {
        Scheduler::new(
            fetcher,
            ReadStateStore::new(dir.path()),
            Arc::new(LogPresenter),
            ReconcilePolicy::default(),
            INTERVAL,
        )
    }

    /// Lets the paused clock run past the next tick and the task drain.
    async fn run_one_interval() {
        tokio::time::sleep(INTERVAL + Duration::from_millis(50)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_refresh_is_immediate() {
        let dir = tempfile::tempdir().unwrap();
        let mut sched = scheduler(CountingFetcher::ok(), &dir);
        sched.add_feed(URL, None);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sched.fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_rearms_each_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut sched = scheduler(CountingFetcher::ok(), &dir);
        sched.add_feed(URL, None);

        tokio::time::sleep(Duration::from_millis(50)).await;
        run_one_interval().await;
        run_one_interval().await;
        assert_eq!(sched.fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_the_timer() {
        let dir = tempfile::tempdir().unwrap();
        let mut sched = scheduler(CountingFetcher::failing(), &dir);
        sched.add_feed(URL, None);

        tokio::time::sleep(Duration::from_millis(50)).await;
        run_one_interval().await;
        run_one_interval().await;
        assert_eq!(
            sched.fetcher.calls.load(Ordering::SeqCst),
            3,
            "every failed cycle still re-arms"
        );

        let feed = sched.feed(URL).unwrap();
        assert!(feed.lock().unwrap().error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_cancels_timer() {
        let dir = tempfile::tempdir().unwrap();
        let mut sched = scheduler(CountingFetcher::ok(), &dir);
        sched.add_feed(URL, None);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(sched.remove_feed(URL));
        assert!(!sched.remove_feed(URL), "second remove is a no-op");

        run_one_interval().await;
        run_one_interval().await;
        assert_eq!(sched.fetcher.calls.load(Ordering::SeqCst), 1, "no fetches after removal");
    }

    #[tokio::test(start_paused = true)]
    async fn test_re_adding_does_not_duplicate_timer() {
        let dir = tempfile::tempdir().unwrap();
        let mut sched = scheduler(CountingFetcher::ok(), &dir);
        sched.add_feed(URL, None);
        tokio::time::sleep(Duration::from_millis(50)).await;
        sched.add_feed(URL, None);
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Two immediate fetches (one per add), then exactly one per interval
        let after_adds = sched.fetcher.calls.load(Ordering::SeqCst);
        assert_eq!(after_adds, 2);
        run_one_interval().await;
        assert_eq!(sched.fetcher.calls.load(Ordering::SeqCst), after_adds + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_refreshes_immediately_and_restarts_timer() {
        let dir = tempfile::tempdir().unwrap();
        let mut sched = scheduler(CountingFetcher::ok(), &dir);
        sched.add_feed(URL, None);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sched.fetcher.calls.load(Ordering::SeqCst), 1);

        assert!(sched.reload(URL));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sched.fetcher.calls.load(Ordering::SeqCst), 2, "reload fetches now");

        assert!(!sched.reload("https://unknown.example/rss"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut sched = scheduler(CountingFetcher::ok(), &dir);
        sched.add_feed(URL, None);
        sched.add_feed("https://example.org/atom", None);
        tokio::time::sleep(Duration::from_millis(50)).await;

        sched.shutdown();
        let calls = sched.fetcher.calls.load(Ordering::SeqCst);
        run_one_interval().await;
        assert_eq!(sched.fetcher.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preloads_persisted_title() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReadStateStore::new(dir.path());
        let mut seeded = Feed::new(URL);
        seeded.metadata.title = "Saved Title".into();
        seeded.items = vec![];
        store.save(&seeded).unwrap();

        let mut sched = scheduler(CountingFetcher::failing(), &dir);
        let feed = sched.add_feed(URL, None);
        // Fetch fails, but the label from the last run is already there
        assert_eq!(feed.lock().unwrap().display_title(), "Saved Title");
    }
}

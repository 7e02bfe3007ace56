use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use newswire::config::Config;
use newswire::feed::{refresh_feed, HttpFetcher};
use newswire::presenter::LogPresenter;
use newswire::scheduler::Scheduler;
use newswire::storage::ReadStateStore;

/// Headless RSS/Atom feed poller with persistent read state.
#[derive(Parser, Debug)]
#[command(name = "newswire", version, about)]
struct Args {
    /// Path to the config file (default: ~/.config/newswire/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the read-state storage directory
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Run a single refresh pass over all feeds and exit
    #[arg(long)]
    once: bool,
}

fn home_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home))
}

fn default_config_path() -> Result<PathBuf> {
    Ok(home_dir()?.join(".config").join("newswire").join("config.toml"))
}

fn default_storage_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join(".local").join("share").join("newswire"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("newswire=info")),
        )
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let feeds = config.valid_feeds();
    if feeds.is_empty() {
        anyhow::bail!(
            "No valid feeds configured. Add [[feeds]] entries to {}",
            config_path.display()
        );
    }

    let storage_dir = match args.storage_dir.or_else(|| config.storage_dir.clone()) {
        Some(dir) => dir,
        None => default_storage_dir()?,
    };
    let store = ReadStateStore::new(&storage_dir);
    tracing::info!(dir = %storage_dir.display(), "Using storage directory");

    let client = reqwest::Client::builder()
        .user_agent(concat!("newswire/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let fetcher = HttpFetcher::new(client);
    let presenter = Arc::new(LogPresenter);
    let policy = config.policy();

    if args.once {
        // Single sequential pass, no timers.
        for entry in &feeds {
            let feed = Arc::new(std::sync::Mutex::new(
                newswire::feed::Feed::with_title_override(entry.url.clone(), entry.title.clone()),
            ));
            let outcome =
                refresh_feed(&feed, &fetcher, &store, presenter.as_ref(), &policy).await;
            let feed = feed.lock().expect("feed lock poisoned");
            tracing::info!(
                feed = %entry.url,
                title = %feed.display_title(),
                items = feed.items.len(),
                unread = feed.unread_count(),
                outcome = ?outcome,
                "Refresh complete"
            );
        }
        return Ok(());
    }

    let mut scheduler = Scheduler::new(fetcher, store, presenter, policy, config.interval());
    for entry in feeds {
        scheduler.add_feed(entry.url, entry.title);
    }

    tracing::info!(
        interval_minutes = config.refresh_interval_minutes,
        "Polling started, press Ctrl-C to stop"
    );
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");
    scheduler.shutdown();

    Ok(())
}

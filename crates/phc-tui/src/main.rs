mod action;
mod app;
mod app_state;
mod audio;
mod component;
mod components;
mod feed_link;
mod mpv;
mod player;
mod scope;
mod theme;
mod widgets;

use phc_core::storage::LocalStore;
use phc_core::theme::ThemeStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = phc_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("phc-radio.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("phc-radio log: {}", log_path.display());

    tracing::info!("phc-radio starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = match phc_core::config::Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("config unreadable, using defaults: {}", e);
            phc_core::config::Config::default()
        }
    };
    tracing::info!(
        "stream={} feed={}",
        config.stream.stream_url,
        config.feed.metadata_url
    );

    // ── Persisted theme ──────────────────────────────────────────────────────
    let storage_path = config.paths.storage_file.clone();
    let store = match LocalStore::open(storage_path.clone()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("starting with empty storage: {}", e);
            LocalStore::empty(storage_path)
        }
    };
    let theme_store = ThemeStore::load(store);

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(&config, theme_store);
    app.run().await?;

    tracing::info!("phc-radio exited");
    Ok(())
}

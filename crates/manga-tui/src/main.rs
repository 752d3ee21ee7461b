mod action;
mod app;
mod app_state;
mod carousel;
mod component;
mod components;
mod export_manager;
mod focus;
mod scroll_loop;
mod theme;
mod widgets;
mod wizard;

#[cfg(test)]
mod test_support;

use manga_proto::catalog::CatalogClient;
use manga_proto::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = manga_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = manga_proto::platform::log_path();
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
    eprintln!("anymanga log: {}", log_path.display());

    tracing::info!("anymanga starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("config: {:#}, using defaults", e);
        Config::default()
    });

    // ── Catalog client ───────────────────────────────────────────────────────
    let client = CatalogClient::with_timeout(
        config.catalog.base_url.clone(),
        config.catalog.timeout(),
    )?;

    // ── Run TUI ──────────────────────────────────────────────────────────────
    app::App::new(config, client).run().await?;

    Ok(())
}

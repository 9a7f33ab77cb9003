mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tubepilot_driver::{DriverConfig, WebDriverFactory};
use tubepilot_playback::{Orchestrator, OrchestratorConfig, parse_url_list};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { list, sessions, threads, no_ad_skip, webdriver_url, headless, save } => {
            run(RunArgs { list, sessions, threads, no_ad_skip, webdriver_url, headless, save })
                .await
        }
    }
}

struct RunArgs {
    list: Option<PathBuf>,
    sessions: Option<PathBuf>,
    threads: usize,
    no_ad_skip: bool,
    webdriver_url: String,
    headless: bool,
    save: Option<PathBuf>,
}

async fn run(args: RunArgs) -> Result<()> {
    let driver_config =
        DriverConfig::new().webdriver_url(args.webdriver_url).headless(args.headless);
    let factory = Arc::new(WebDriverFactory::new(driver_config));
    let orch = Orchestrator::new(
        factory,
        OrchestratorConfig::new().default_ad_skip(!args.no_ad_skip),
    );

    if let Some(path) = args.sessions {
        let count = orch.load_sessions(&path).await?;
        tracing::info!(count, path = %path.display(), "sessions loaded");
    }
    if let Some(path) = args.list {
        let text = std::fs::read_to_string(&path)?;
        let count = orch.import_urls(parse_url_list(&text)).await;
        tracing::info!(count, path = %path.display(), "URLs imported");
    }
    if orch.session_count().await == 0 {
        anyhow::bail!("nothing to play: provide --list or --sessions");
    }

    let opened = orch.open_pending(args.threads).await;
    tracing::info!(opened, "sessions opened");

    let maintenance = orch.spawn_maintenance();

    let mut status = tokio::time::interval(Duration::from_millis(1500));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = status.tick() => {
                let progress = orch.current_progress().await;
                tracing::info!(
                    title = %progress.title,
                    position = progress.position,
                    total = progress.total,
                    "playing"
                );
            }
        }
    }

    tracing::info!("shutting down");
    maintenance.stop();
    if let Some(path) = args.save {
        let count = orch.save_sessions(&path).await?;
        tracing::info!(count, path = %path.display(), "sessions saved");
    }
    orch.shutdown().await;
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .expect("Failed to create env filter");

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

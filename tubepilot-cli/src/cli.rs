use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tubepilot")]
#[command(about = "Multi-session video playback orchestrator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open sessions over a URL list and keep them playing
    Run {
        /// URL list file: one URL per line, `#` comments allowed
        #[arg(short, long)]
        list: Option<PathBuf>,

        /// Saved sessions file (JSON with url/proxy/profile per session)
        #[arg(short, long)]
        sessions: Option<PathBuf>,

        /// How many sessions to open at once
        #[arg(short, long, default_value = "2")]
        threads: usize,

        /// Disable automatic ad skipping
        #[arg(long)]
        no_ad_skip: bool,

        /// WebDriver endpoint (a running chromedriver)
        #[arg(long, default_value = "http://localhost:4444")]
        webdriver_url: String,

        /// Run browsers headless (unreliable for video playback)
        #[arg(long)]
        headless: bool,

        /// Save the session list here on exit
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

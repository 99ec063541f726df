use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::{CommitCache, CommitsCache, FileCache};
use crate::clipboard::SystemClipboard;
use crate::config::Config;
use crate::github::GhClient;
use crate::retriever::CommitRetriever;
use crate::tui::App;

#[derive(Parser)]
#[command(name = "shiplog")]
#[command(about = "Interactive terminal summary of your GitHub commits, grouped by repository")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Path to the cache directory")]
    pub cache_dir: Option<PathBuf>,

    #[arg(long, help = "Path to the config file")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect or clear the commit cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Remove all cached entries
    Clear,
    /// Remove cached entries for one user
    Invalidate {
        /// GitHub login whose entries should be dropped
        user: String,
    },
    /// Show cache statistics
    Stats,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Some(Commands::Cache { command }) => cache_exec(command, self.common),
            None => session_exec(self.common),
        }
    }
}

/// Wire up the interactive session and hand control to the event loop.
fn session_exec(common: CommonArgs) -> Result<()> {
    let config = Config::load(common.config.as_deref());

    // A broken cache never blocks the session; it just runs uncached.
    let cache: Option<Box<dyn CommitCache>> = match CommitsCache::open(common.cache_dir) {
        Ok(cache) => Some(Box::new(cache)),
        Err(e) => {
            log::warn!("cache disabled: {e}");
            None
        }
    };

    let retriever = Arc::new(CommitRetriever::new(Box::new(GhClient::new()), cache));
    let today = Local::now().date_naive();
    let app = App::new(config, Box::new(SystemClipboard), today);

    crate::tui::run(app, retriever).context("terminal session failed")?;
    Ok(())
}

fn cache_exec(command: CacheCommands, common: CommonArgs) -> Result<()> {
    use console::style;

    match command {
        CacheCommands::Clear => {
            let cache = FileCache::open(common.cache_dir).context("Failed to initialize cache")?;
            let removed = cache.clear().context("Failed to clear cache")?;
            println!("Removed {} cache entries.", style(removed).green());
        }
        CacheCommands::Invalidate { user } => {
            let cache =
                CommitsCache::open(common.cache_dir).context("Failed to initialize cache")?;
            let removed = cache
                .invalidate(&user)
                .context("Failed to invalidate cache")?;
            println!(
                "Removed {} cache entries for {}.",
                style(removed).green(),
                style(&user).cyan()
            );
        }
        CacheCommands::Stats => {
            let cache = FileCache::open(common.cache_dir).context("Failed to initialize cache")?;
            let stats = cache.stats().context("Failed to read cache")?;
            println!("Cache directory: {}", style(cache.dir().display()).cyan());
            println!("Entries: {}", style(stats.total_files).cyan());
            println!("Expired: {}", style(stats.expired_files).yellow());
            println!("Total size: {} bytes", style(stats.total_bytes).cyan());
        }
    }

    Ok(())
}

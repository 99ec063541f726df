use anyhow::{Context, Result};
use log::LevelFilter;
use std::io::Write;

use crate::config;

/// Initialize the logging system.
///
/// Diagnostics go to a log file under the config directory so they never
/// corrupt the raw-mode terminal. `RUST_LOG` picks the level; setting the
/// `DEBUG` environment variable bumps the default from info to debug.
pub fn init() -> Result<()> {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or_else(|| {
            if std::env::var_os("DEBUG").is_some() {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            }
        });

    let log_path = config::log_file()?;
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:5}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .ok();

    log::info!("shiplog started (log level {level})");
    Ok(())
}

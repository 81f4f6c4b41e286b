pub mod app;
pub mod board;
pub mod config;
pub mod error;

pub use app::App;
pub use board::{AdminSession, Board, BoardWatch, WeekView};
pub use config::{AdminConfig, AnalysisConfig, Config, PollingConfig, StoreConfig, ValidationResult};
pub use error::{AppError, ConfigError};

use anyhow::Result;

/// Initialize logging for the process
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Visitboard core initialized");
    Ok(())
}

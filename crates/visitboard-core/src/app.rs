use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::board::{Board, BoardWatch};
use crate::config::Config;
use crate::error::{AppError, ConfigError};

/// Main application state and lifecycle manager
pub struct App {
    config: Arc<Config>,
    board: Board,
    cancel: CancellationToken,
}

impl App {
    /// Load and validate configuration, then connect the board
    pub fn new() -> Result<Self> {
        let (config, _) = Config::load_validated()?;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let validation = config.validate();
        if !validation.is_valid() {
            return Err(AppError::from(ConfigError::Invalid(validation.error_summary())).into());
        }

        let board = Board::from_config(&config)?;
        tracing::info!(
            "Board connected: {}/{}_*",
            config.store.base_url,
            config.store.bucket
        );

        Ok(Self {
            config: Arc::new(config),
            board,
            cancel: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Start the background pollers; they stop on [`shutdown`](Self::shutdown).
    pub fn watch(&self) -> BoardWatch {
        self.board.watch(&self.config.polling, &self.cancel)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn shutdown(&self) {
        tracing::info!("Shutting down application");
        self.cancel.cancel();
    }
}

//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::{
    error::{ForecastError, Result},
    train::TrainingConfig,
};

/// Default dataset file, resolved against the working directory
pub const DEFAULT_DATA_PATH: &str = "bg_data_mth.csv";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Everything the `serve` command needs to boot
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// CSV dataset location
    pub data_path: PathBuf,
    /// Maximum charts rendered at once
    pub render_concurrency: usize,
    /// Split and forest settings
    pub training: TrainingConfig,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            render_concurrency: default_render_concurrency(),
            training: TrainingConfig::default(),
        }
    }
}

impl ServeConfig {
    /// Set the bind address
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the listen port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the dataset path
    #[must_use]
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    /// Set the render permit count
    #[must_use]
    pub fn with_render_concurrency(mut self, permits: usize) -> Self {
        self.render_concurrency = permits;
        self
    }

    /// Set the training options
    #[must_use]
    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }

    /// Check the values and resolve the socket address
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::InvalidConfiguration`] for a zero render
    /// concurrency, invalid forest parameters, or an unparseable address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        if self.render_concurrency == 0 {
            return Err(ForecastError::InvalidConfiguration(
                "render concurrency must be at least 1".to_string(),
            ));
        }
        self.training.forest.validate()?;
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                ForecastError::InvalidConfiguration(format!(
                    "invalid address {}:{}: {e}",
                    self.host, self.port
                ))
            })
    }
}

/// Available parallelism, or 1 if it cannot be determined
#[must_use]
pub fn default_render_concurrency() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

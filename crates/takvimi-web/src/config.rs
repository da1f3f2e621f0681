//! Server configuration: config file cascade, then environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use takvimi_core::ManagerOptions;
use takvimi_core::config_file::{self, ConfigFile};
use takvimi_core::manager::{DEFAULT_EXTRACTION_TIMEOUT, DEFAULT_WORKERS};
use takvimi_parsing::{ParsingConfig, ParsingConfigBuilder};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3010;
pub const DEFAULT_PDF_DIR: &str = "takvimi-pdf";
pub const DEFAULT_JSON_DIR: &str = "api/takvimi";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub pdf_dir: PathBuf,
    pub json_dir: PathBuf,
    pub workers: usize,
    pub timeout: Duration,
    pub row_tolerance: Option<f32>,
    pub heading_band: Option<f32>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            pdf_dir: PathBuf::from(DEFAULT_PDF_DIR),
            json_dir: PathBuf::from(DEFAULT_JSON_DIR),
            workers: DEFAULT_WORKERS,
            timeout: DEFAULT_EXTRACTION_TIMEOUT,
            row_tolerance: None,
            heading_band: None,
        }
    }
}

impl Config {
    /// Config files (`.takvimi.toml` over the platform file), then process
    /// environment.
    pub fn load() -> Self {
        Self::from_sources(config_file::load_config(), |key| std::env::var(key).ok())
    }

    pub fn from_sources(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        if let Some(server) = file.server {
            if let Some(host) = server.host {
                config.host = host;
            }
            if let Some(port) = server.port {
                config.port = port;
            }
        }
        if let Some(storage) = file.storage {
            if let Some(dir) = storage.pdf_dir {
                config.pdf_dir = PathBuf::from(dir);
            }
            if let Some(dir) = storage.json_dir {
                config.json_dir = PathBuf::from(dir);
            }
        }
        if let Some(extraction) = file.extraction {
            if let Some(workers) = extraction.workers {
                config.workers = workers;
            }
            if let Some(secs) = extraction.timeout_secs {
                config.timeout = Duration::from_secs(secs);
            }
            config.row_tolerance = extraction.row_tolerance;
            config.heading_band = extraction.heading_band;
        }

        if let Some(host) = env("HOST") {
            config.host = host;
        }
        if let Some(port) = parsed(&env, "PORT") {
            config.port = port;
        }
        if let Some(dir) = env("PDF_DIR") {
            config.pdf_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env("JSON_DIR") {
            config.json_dir = PathBuf::from(dir);
        }
        if let Some(workers) = parsed(&env, "EXTRACTION_WORKERS") {
            config.workers = workers;
        }
        if let Some(secs) = parsed(&env, "EXTRACTION_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs);
        }

        config.workers = config.workers.max(1);
        config
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn manager_options(&self) -> ManagerOptions {
        ManagerOptions {
            workers: self.workers,
            timeout: self.timeout,
        }
    }

    pub fn parsing_config(&self) -> anyhow::Result<ParsingConfig> {
        let mut builder = ParsingConfigBuilder::new();
        if let Some(tolerance) = self.row_tolerance {
            builder = builder.row_tolerance(tolerance);
        }
        if let Some(band) = self.heading_band {
            builder = builder.heading_band(band);
        }
        Ok(builder.build()?)
    }
}

fn parsed<T: std::str::FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment value");
            None
        }
    }
}

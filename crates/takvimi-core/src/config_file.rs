use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub server: Option<ServerConfig>,
    pub storage: Option<StorageConfig>,
    pub extraction: Option<ExtractionConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub pdf_dir: Option<String>,
    pub json_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub workers: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub row_tolerance: Option<f32>,
    pub heading_band: Option<f32>,
}

/// Platform config directory path: `<config_dir>/takvimi/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("takvimi").join("config.toml"))
}

/// Load config by cascading CWD `.takvimi.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".takvimi.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let server = pick_section(base.server, overlay.server, |b, o| ServerConfig {
        host: o.host.or(b.host),
        port: o.port.or(b.port),
    });
    let storage = pick_section(base.storage, overlay.storage, |b, o| StorageConfig {
        pdf_dir: o.pdf_dir.or(b.pdf_dir),
        json_dir: o.json_dir.or(b.json_dir),
    });
    let extraction = pick_section(base.extraction, overlay.extraction, |b, o| {
        ExtractionConfig {
            workers: o.workers.or(b.workers),
            timeout_secs: o.timeout_secs.or(b.timeout_secs),
            row_tolerance: o.row_tolerance.or(b.row_tolerance),
            heading_band: o.heading_band.or(b.heading_band),
        }
    });
    ConfigFile {
        server,
        storage,
        extraction,
    }
}

fn pick_section<T: Default>(
    base: Option<T>,
    overlay: Option<T>,
    combine: impl FnOnce(T, T) -> T,
) -> Option<T> {
    match (base, overlay) {
        (None, None) => None,
        (Some(b), None) => Some(b),
        (None, Some(o)) => Some(o),
        (Some(b), Some(o)) => Some(combine(b, o)),
    }
}

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tasklane_http::ClientConfig;
use tracing::debug;

const APP_DIR: &str = "tasklane";
const CONFIG_FILE: &str = "config.toml";
const TOKEN_FILE: &str = "token.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub timeout_secs: u64,
    /// Defaults to `token.json` next to the config file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            token_file: None,
        }
    }
}

impl Config {
    pub fn config_dir() -> CliResult<PathBuf> {
        let base = dirs::config_dir().ok_or(CliError::NoConfigDir)?;
        Ok(base.join(APP_DIR))
    }

    pub fn default_path() -> CliResult<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Read the config at `path`, writing the defaults there on first use.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Creating default config");
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> CliResult<()> {
        let write_err = |source| CliError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(write_err)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(write_err)?;
        Ok(())
    }

    /// Where the session token is persisted for a config loaded from `config_path`.
    pub fn token_path(&self, config_path: &Path) -> PathBuf {
        match &self.token_file {
            Some(path) => path.clone(),
            None => config_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(TOKEN_FILE),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::builder()
            .base_url(self.server_url.clone())
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
    }
}

//! Resolution of connection settings from file, environment and flags.

use std::path::{Path, PathBuf};

use tracing::debug;
use vmap_client::{ClientError, ClientSettings};

/// File read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "vmap.toml";

/// Connection values given on the command line or through `VMAP_*`
/// variables. Each one beats the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOverrides {
    pub config: Option<PathBuf>,
    pub base_url: Option<String>,
    pub csrf_token: Option<String>,
    pub session_cookie: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ConnectionOverrides {
    /// Builds the client settings.
    ///
    /// An explicit `--config` file must exist. Without one,
    /// `vmap.toml` in `dir` is used when present.
    pub fn resolve_in(&self, dir: &Path) -> Result<ClientSettings, ClientError> {
        let mut settings = match &self.config {
            Some(path) => ClientSettings::load(path)?,
            None => {
                let path = dir.join(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    ClientSettings::load(&path)?
                } else {
                    ClientSettings::default()
                }
            }
        };
        if let Some(base_url) = &self.base_url {
            settings.base_url.clone_from(base_url);
        }
        if let Some(token) = &self.csrf_token {
            settings.csrf_token = Some(token.clone());
        }
        if let Some(cookie) = &self.session_cookie {
            settings.session_cookie = Some(cookie.clone());
        }
        if let Some(timeout) = self.timeout_secs {
            settings.timeout_secs = timeout;
        }
        debug!(base_url = %settings.base_url, "resolved connection settings");
        Ok(settings)
    }

    pub fn resolve(&self) -> Result<ClientSettings, ClientError> {
        let dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        self.resolve_in(&dir)
    }
}

use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::paths::Paths;
use crate::schema::GregConfig;

/// Loads and saves `config.json`.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the config from disk.
    ///
    /// A missing or unparsable file is `Ok(None)`: the caller runs setup.
    /// A file that parses but fails validation (e.g. no API key anywhere) is
    /// a `Config` error.
    pub fn load(paths: &Paths) -> greg_core::Result<Option<GregConfig>> {
        Self::load_with_env(paths, |var| std::env::var(var).ok())
    }

    /// [`ConfigLoader::load`] with an injectable environment lookup.
    pub fn load_with_env(
        paths: &Paths,
        env: impl Fn(&str) -> Option<String>,
    ) -> greg_core::Result<Option<GregConfig>> {
        let Some(config) = Self::read(&paths.config_file()) else {
            return Ok(None);
        };

        // API keys: env var fills in when config file doesn't have the key set.
        let config = Self::apply_env_overrides(config, env);

        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => return Err(greg_core::GregError::Config(e)),
        }

        Ok(Some(config))
    }

    fn read(path: &Path) -> Option<GregConfig> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(?path, error = %e, "no config file");
                return None;
            }
        };
        match serde_json::from_str::<GregConfig>(&raw) {
            Ok(config) => {
                info!(?path, provider = %config.provider, "loaded configuration");
                Some(config)
            }
            Err(e) => {
                warn!(?path, error = %e, "config file is not valid, running setup");
                None
            }
        }
    }

    fn apply_env_overrides(
        mut config: GregConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> GregConfig {
        if config.api_key().is_none()
            && let Some(var) = config.provider.api_key_env()
            && let Some(key) = env(var).filter(|k| !k.is_empty())
        {
            debug!(var, "using API key from environment");
            config.api_key = Some(key);
        }
        config
    }

    /// Persist the config as pretty JSON, readable by the owner only.
    pub fn save(paths: &Paths, config: &GregConfig) -> greg_core::Result<()> {
        std::fs::create_dir_all(paths.config_dir())?;
        let path = paths.config_file();
        let mut body = serde_json::to_string_pretty(config)?;
        body.push('\n');

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path)?;
        file.write_all(body.as_bytes())?;

        // `mode` only applies on creation; tighten a pre-existing file too.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }

        info!(?path, provider = %config.provider, "saved configuration");
        Ok(())
    }
}

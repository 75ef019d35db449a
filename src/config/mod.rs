use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable naming the TOML file to load (and persist admin keys to).
pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    /// File the configuration was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwtConfig {
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Comma-joined list, rewritten by the admin key persistence flush.
    #[serde(default)]
    pub api_keys: String,
}

impl AdminConfig {
    pub fn keys(&self) -> Vec<String> {
        parse_key_list(&self.api_keys)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Split a comma-joined key list, dropping blanks.
pub fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        Self::load_from(&path)
    }

    /// Load defaults, then `path` if it exists, then `GATEWAY_*` environment overrides.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("admin.api_keys", "")?
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("GATEWAY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        config.source = Some(path.to_path_buf());

        Ok(config)
    }
}

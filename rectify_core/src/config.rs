//! Process-wide configuration.
//!
//! Resolved once at startup and passed down explicitly. Sources, lowest
//! priority first: built-in defaults, an optional YAML file, then the
//! environment.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use yaml_peg::serde as yaml;

use crate::logging::debug;
use crate::permissions::{PermissionSet, DEFAULT_REQUIRED_PERMISSIONS};

/// The default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "rectify_config.yaml";

/// Template used to build a credential connection string. Fields are
/// `username`, `password`, `host` and `app`.
pub const DEFAULT_CONNECTION_TEMPLATE: &str =
    "mongodb+srv://{username}:{password}@{host}/?retryWrites=true&w=majority&appName={app}";

/// Struct representing the rectify_config.yaml file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RectifyConfig {
    /// Host used when a credential request doesn't name one.
    pub default_host: String,
    /// Application label used when a request doesn't name one.
    pub default_app: String,
    /// Required permissions used when a request doesn't list any.
    pub default_permissions: Vec<String>,
    /// Template for credential connection strings.
    pub connection_template: String,
    /// Username used when a credential request doesn't supply one.
    pub default_username: Option<String>,
    /// Password used when a credential request doesn't supply one.
    pub default_password: Option<String>,
    /// PEM client certificate used when a certificate request has none.
    pub default_cert: Option<String>,
    /// PEM private key used when a certificate request has none.
    pub default_key: Option<String>,
    /// PEM certificate authority used when a certificate request has none.
    pub default_ca: Option<String>,
    /// Address the HTTP server binds to.
    pub bind: String,
    /// Provider timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            default_host: "cluster0.example.mongodb.net".to_owned(),
            default_app: "MyLocalApp".to_owned(),
            default_permissions: DEFAULT_REQUIRED_PERMISSIONS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            connection_template: DEFAULT_CONNECTION_TEMPLATE.to_owned(),
            default_username: None,
            default_password: None,
            default_cert: None,
            default_key: None,
            default_ca: None,
            bind: "0.0.0.0:3001".to_owned(),
            timeout_secs: 10,
        }
    }
}

impl RectifyConfig {
    /// Read the config from a YAML file.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<RectifyConfig> {
        let config_raw = fs::read_to_string(&path).context("Reading file")?;
        Self::from_yaml(&config_raw)
    }

    /// Parse the config from a YAML string.
    pub fn from_yaml(raw: &str) -> Result<RectifyConfig> {
        let mut config = yaml::from_str::<RectifyConfig>(raw).context("Deserializing config")?;
        config.pop().ok_or_else(|| anyhow!["config file is empty"])
    }

    /// Resolve the config for this process: the given file (or
    /// `rectify_config.yaml` if it exists), then environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<RectifyConfig> {
        let mut config = match path {
            Some(p) => Self::read_from_file(p)
                .with_context(|| format!("Reading config from {}", p.display()))?,
            None if Path::new(CONFIG_FILENAME).exists() => Self::read_from_file(CONFIG_FILENAME)
                .with_context(|| format!("Reading config from {}", CONFIG_FILENAME))?,
            None => {
                debug!("No config file found. Using defaults.");
                RectifyConfig::default()
            }
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from environment-style variables. `lookup` returns
    /// the value for a variable name, if it is set.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(host) = lookup("DB_HOST") {
            self.default_host = host;
        }
        if let Some(app) = lookup("DB_APP") {
            self.default_app = app;
        }
        if let Some(perms) = lookup("DB_PERMISSIONS") {
            self.default_permissions = perms
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned)
                .collect();
        }
        self.default_username = lookup("DB_USERNAME").or(self.default_username.take());
        self.default_password = lookup("DB_PASSWORD").or(self.default_password.take());
        self.default_cert = lookup("DB_CERT").or(self.default_cert.take());
        self.default_key = lookup("DB_KEY").or(self.default_key.take());
        self.default_ca = lookup("DB_CA").or(self.default_ca.take());
        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .parse()
                .with_context(|| format!("PORT must be a port number, got {:?}", port))?;
            self.bind = format!("0.0.0.0:{}", port);
        }
        Ok(())
    }

    /// The default required set, in configured order.
    pub fn default_required(&self) -> PermissionSet {
        self.default_permissions.iter().cloned().collect()
    }

    /// The provider timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

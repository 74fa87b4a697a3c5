use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::backend::BackendConfig;
use super::logging::LoggingConfig;
use super::store::StoreConfig;
use crate::authenticators::AuthenticatorConfig;
use crate::models::OAuthProvider;

/// Environment variable naming the config file. Defaults to "./config.yaml".
pub const CONFIG_PATH_ENV: &str = "SESSIONKEEPER_CONFIG";
/// Prefix of environment variables overriding config values,
/// e.g. `SESSIONKEEPER_BIND_ADDRESS` or `SESSIONKEEPER_BACKEND__API_KEY`.
pub const ENV_PREFIX: &str = "SESSIONKEEPER_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct ConfigV1 {
    #[serde(default)]
    pub logging: LoggingConfig,
    pub backend: BackendConfig,
    pub authenticator: AuthenticatorConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// OAuth provider descriptors. Google is used when empty.
    #[serde(default)]
    pub providers: Vec<OAuthProvider>,
    pub store: StoreConfig,
    pub bind_address: String,
}

fn default_timeout_in_ms() -> u64 {
    3000
}

/// Settings for calls into the authenticator.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            timeout_in_ms: default_timeout_in_ms(),
        }
    }
}

/// Extract a versioned config from any figment.
pub fn extract_config(figment: Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
    // handle configuration migration between versions here when necessary
}

/// The YAML config file merged with `SESSIONKEEPER_`-prefixed environment variables.
pub fn config_figment() -> Figment {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "./config.yaml".to_string());
    Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
}

/// Load the config, exiting the process if it is invalid.
pub fn load_config() -> ConfigV1 {
    match extract_config(config_figment()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

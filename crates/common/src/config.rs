use serde::Deserialize;

pub use ::config::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_filter() -> String {
    "chainql=info,warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            request_timeout_secs: default_request_timeout_secs(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Loads settings from `CHAINQL_CONFIG_PATH` (or `config/default.toml`),
    /// then `CHAINQL__*` environment variables. The file is optional.
    pub fn new() -> Result<Self, ConfigError> {
        let config_file_path = std::env::var("CHAINQL_CONFIG_PATH")
            .unwrap_or_else(|_| "config/default.toml".to_string());
        Self::from_file(&config_file_path, false)
    }

    pub fn from_file(path: &str, required: bool) -> Result<Self, ConfigError> {
        let s = config::Config::builder()
            .add_source(config::File::with_name(path).required(required))
            .add_source(config::Environment::with_prefix("CHAINQL").separator("__"))
            .build()?;
        s.try_deserialize()
    }
}

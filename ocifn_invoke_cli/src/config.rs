use ocifn_functions_library::config::ApiConfig;
use ocifn_library::logging::LoggingConfig;
use serde::Deserialize;
use std::sync::Arc;

/// Environment variables prefixed with this override any setting, e.g. `OCIFN__API__REGION`.
pub const ENV_PREFIX: &str = "OCIFN";

#[derive(Debug, Deserialize)]
pub struct Configuration {
    pub api: Arc<ApiConfig>,
    pub logging: Arc<LoggingConfig>,
}
pub type CliConfig = Arc<Configuration>;

impl Configuration {
    pub fn new(config_fpath: Option<&str>, overrides: Option<Vec<(String, String)>>) -> anyhow::Result<Self> {
        ocifn_library::load_config_default!("ocifn_invoke_cli/src/defaults.json", config_fpath, overrides, ENV_PREFIX)
    }

    pub fn boxed(config_fpath: Option<&str>, overrides: Option<Vec<(String, String)>>) -> anyhow::Result<CliConfig> {
        Ok(Arc::new(Configuration::new(config_fpath, overrides)?))
    }
}

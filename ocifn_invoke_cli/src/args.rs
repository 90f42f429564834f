use clap::Parser;
use ocifn_functions_library::services::resolver::FunctionPath;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(long = "compartmentName")]
    /// Name of the compartment for Oracle Functions service
    pub compartment_name: String,
    #[arg(long = "appName")]
    /// Oracle Functions application name
    pub app_name: String,
    #[arg(long = "funcName")]
    /// Oracle Functions function name
    pub func_name: String,
    #[arg(long = "invokePayload", default_value = "")]
    /// (optional) Invocation payload for your function
    pub invoke_payload: String,
    #[arg(long = "invokePayloadFile", conflicts_with = "invoke_payload")]
    /// (optional) Read the invocation payload from this file instead, e.g. an image
    pub invoke_payload_file: Option<PathBuf>,
    #[arg(long)]
    /// Region hosting the function, overrides the configured region
    pub region: Option<String>,
    #[arg(long)]
    /// Path to a JSON configuration file layered over the built-in defaults
    pub config: Option<String>,
    #[arg(long = "logLevel")]
    /// Write logs at this level and above to stderr
    pub log_level: Option<String>,
}

impl Args {
    pub fn function_path(&self) -> FunctionPath {
        FunctionPath {
            compartment: self.compartment_name.clone(),
            application: self.app_name.clone(),
            function: self.func_name.clone(),
        }
    }

    /// Configuration overrides implied by flags.
    pub fn overrides(&self) -> Option<Vec<(String, String)>> {
        let mut overrides = vec![];
        if let Some(region) = &self.region {
            overrides.push(("api.region".to_string(), region.clone()));
        }
        if let Some(level) = &self.log_level {
            overrides.push(("logging.level".to_string(), level.clone()));
            overrides.push(("logging.stderr".to_string(), "true".to_string()));
        }
        match overrides.is_empty() {
            true => None,
            false => Some(overrides),
        }
    }
}

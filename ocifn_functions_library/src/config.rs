use serde::Deserialize;

const REGION_PLACEHOLDER: &str = "{region}";

#[derive(Debug, Deserialize, Clone)]
/// Where and how to reach the management APIs.
pub struct ApiConfig {
    /// Region hosting the tenancy's Functions service, e.g. `us-phoenix-1`.
    pub region: String,
    /// Identity service base URL, `{region}` is substituted.
    pub identity_endpoint: String,
    /// Functions management base URL, `{region}` is substituted.
    pub functions_endpoint: String,
    /// Timeout on establishing a connection, in seconds.
    pub connect_timeout_sec: u64,
    /// Whole-request timeout in seconds, 0 keeps the transport default.
    #[serde(default)]
    pub request_timeout_sec: u64,
    /// Max items requested per listing page, [None] lets the service choose.
    #[serde(default)]
    pub page_limit: Option<u32>,
}

impl ApiConfig {
    pub fn identity_base(&self) -> String {
        expand_region(&self.identity_endpoint, &self.region)
    }
    pub fn functions_base(&self) -> String {
        expand_region(&self.functions_endpoint, &self.region)
    }
}

fn expand_region(template: &str, region: &str) -> String {
    template.replace(REGION_PLACEHOLDER, region).trim_end_matches('/').to_string()
}

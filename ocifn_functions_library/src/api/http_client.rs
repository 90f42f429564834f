use crate::api::{FunctionsInvokeApi, FunctionsManagementApi, IdentityApi, InvokeResponse};
use crate::config::ApiConfig;
use crate::credentials::Credentials;
use crate::errors::{FnError, FnResult};
use crate::models::{Application, Compartment, Function, Page};
use crate::signer::{sign_request, SignedBody};
use ocifn_library::{bail_typed, transaction::TransactionId};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;

const IDENTITY_API_VERSION: &str = "20160918";
const FUNCTIONS_API_VERSION: &str = "20181201";
pub const INVOKE_CONTENT_TYPE: &str = "application/octet-stream";
const NEXT_PAGE_HEADER: &str = "opc-next-page";
const REQUEST_ID_HEADER: &str = "opc-request-id";

/// Error body returned by OCI services.
#[derive(Debug, Deserialize)]
struct ServiceError {
    code: String,
    message: String,
}

/// Signed HTTP access to the identity, functions management, and functions invoke APIs.
/// One instance serves the whole run and is never mutated after construction,
/// the per-function invoke host is passed into each call.
#[derive(Debug, Clone)]
pub struct OciHttpClient {
    client: Client,
    creds: Arc<Credentials>,
    identity_base: String,
    functions_base: String,
    page_limit: Option<u32>,
}

impl OciHttpClient {
    pub fn new(config: &ApiConfig, creds: Arc<Credentials>, tid: &TransactionId) -> FnResult<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("ocifn/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(config.connect_timeout_sec));
        if config.request_timeout_sec > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_sec));
        }
        let client = match builder.build() {
            Ok(c) => c,
            Err(e) => {
                bail_typed!(
                    FnError::config(format!("Could not instantiate HTTP client - {}", e)),
                    tid=tid, error=%e, "Unable to build reqwest HTTP client"
                )
            },
        };
        Ok(Self {
            client,
            creds,
            identity_base: config.identity_base(),
            functions_base: config.functions_base(),
            page_limit: config.page_limit,
        })
    }

    fn build_url(&self, base: &str, path: &str, params: &[(&str, &str)], page: Option<&str>) -> FnResult<Url> {
        let mut url = Url::parse(&format!("{}/{}", base.trim_end_matches('/'), path))
            .map_err(|e| FnError::config(format!("Invalid API URL '{}/{}': {}", base, path, e)))?;
        {
            let mut query = url.query_pairs_mut();
            for (k, v) in params {
                query.append_pair(k, v);
            }
            if let Some(limit) = self.page_limit {
                query.append_pair("limit", &limit.to_string());
            }
            if let Some(page) = page {
                query.append_pair("page", page);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    /// Sign and send one request, then reject any non-success status.
    async fn send(
        &self,
        operation: &str,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        tid: &TransactionId,
    ) -> FnResult<Response> {
        let signature = sign_request(
            &self.creds,
            &method,
            &url,
            body.as_deref().map(|bytes| SignedBody {
                bytes,
                content_type: INVOKE_CONTENT_TYPE,
            }),
            OffsetDateTime::now_utc(),
        )?;
        debug!(tid=tid, operation=operation, method=%method, url=%url, "Sending signed request");
        let mut builder = self.client.request(method, url).header(REQUEST_ID_HEADER, tid.as_str());
        for (name, value) in signature.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                bail_typed!(
                    FnError::upstream(operation, e.status().map(|s| s.as_u16()), e.to_string()),
                    tid=tid, operation=operation, inner=std::error::Error::source(&e), error=%e,
                    "HTTP error when trying to reach the service"
                )
            },
        };
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let request_id = header_str(&response, REQUEST_ID_HEADER);
        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ServiceError>(&text) {
            Ok(err) => format!("{}: {}", err.code, err.message),
            Err(_) if text.is_empty() => status.canonical_reason().unwrap_or("no response body").to_string(),
            Err(_) => text,
        };
        bail_typed!(
            FnError::upstream(operation, Some(status.as_u16()), message.clone()),
            tid=tid, operation=operation, status=status.as_u16(), opc_request_id=?request_id, result=%message,
            "Service returned an error status"
        )
    }

    async fn get_page<T: DeserializeOwned>(&self, operation: &str, url: Url, tid: &TransactionId) -> FnResult<Page<T>> {
        let response = self.send(operation, Method::GET, url, None, tid).await?;
        let next_page = header_str(&response, NEXT_PAGE_HEADER).filter(|p| !p.is_empty());
        let items = match response.json::<Vec<T>>().await {
            Ok(items) => items,
            Err(e) => {
                bail_typed!(
                    FnError::upstream(operation, None, format!("unreadable listing: {}", e)),
                    tid=tid, operation=operation, error=%e, "Failed to parse listing response"
                )
            },
        };
        Ok(Page { items, next_page })
    }
}

fn header_str(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait::async_trait]
impl IdentityApi for OciHttpClient {
    #[tracing::instrument(skip(self, tid), fields(tid=tid), name = "OciHttpClient::list_compartments")]
    async fn list_compartments(
        &self,
        tenancy_id: &str,
        page: Option<&str>,
        tid: &TransactionId,
    ) -> FnResult<Page<Compartment>> {
        let url = self.build_url(
            &self.identity_base,
            &format!("{}/compartments", IDENTITY_API_VERSION),
            &[
                ("compartmentId", tenancy_id),
                ("compartmentIdInSubtree", "true"),
                ("accessLevel", "ANY"),
            ],
            page,
        )?;
        self.get_page("ListCompartments", url, tid).await
    }
}

#[async_trait::async_trait]
impl FunctionsManagementApi for OciHttpClient {
    #[tracing::instrument(skip(self, tid), fields(tid=tid), name = "OciHttpClient::list_applications")]
    async fn list_applications(
        &self,
        compartment_id: &str,
        display_name: &str,
        page: Option<&str>,
        tid: &TransactionId,
    ) -> FnResult<Page<Application>> {
        let url = self.build_url(
            &self.functions_base,
            &format!("{}/applications", FUNCTIONS_API_VERSION),
            &[("compartmentId", compartment_id), ("displayName", display_name)],
            page,
        )?;
        self.get_page("ListApplications", url, tid).await
    }

    #[tracing::instrument(skip(self, tid), fields(tid=tid), name = "OciHttpClient::list_functions")]
    async fn list_functions(
        &self,
        application_id: &str,
        display_name: &str,
        page: Option<&str>,
        tid: &TransactionId,
    ) -> FnResult<Page<Function>> {
        let url = self.build_url(
            &self.functions_base,
            &format!("{}/functions", FUNCTIONS_API_VERSION),
            &[("applicationId", application_id), ("displayName", display_name)],
            page,
        )?;
        self.get_page("ListFunctions", url, tid).await
    }
}

#[async_trait::async_trait]
impl FunctionsInvokeApi for OciHttpClient {
    #[tracing::instrument(skip(self, payload, tid), fields(tid=tid, payload_len=payload.len()), name = "OciHttpClient::invoke_function")]
    async fn invoke_function(
        &self,
        invoke_endpoint: &str,
        function_id: &str,
        payload: Vec<u8>,
        tid: &TransactionId,
    ) -> FnResult<InvokeResponse> {
        let mut url = Url::parse(invoke_endpoint.trim_end_matches('/'))
            .map_err(|e| FnError::config(format!("Invalid invoke endpoint '{}': {}", invoke_endpoint, e)))?;
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments
                    .pop_if_empty()
                    .extend([FUNCTIONS_API_VERSION, "functions", function_id, "actions", "invoke"]);
            },
            Err(_) => {
                return Err(FnError::config(format!(
                    "Invoke endpoint '{}' cannot carry a path",
                    invoke_endpoint
                )))
            },
        }
        let response = self.send("InvokeFunction", Method::POST, url, Some(payload), tid).await?;
        let status = response.status().as_u16();
        let opc_request_id = header_str(&response, REQUEST_ID_HEADER);
        let body = match response.bytes().await {
            Ok(b) => b.to_vec(),
            Err(e) => {
                bail_typed!(
                    FnError::upstream("InvokeFunction", Some(status), format!("unreadable response body: {}", e)),
                    tid=tid, error=%e, "Error reading function response"
                )
            },
        };
        if body.is_empty() {
            warn!(tid = tid, status = status, "Function returned an empty body");
        }
        Ok(InvokeResponse {
            status,
            opc_request_id,
            body,
        })
    }
}

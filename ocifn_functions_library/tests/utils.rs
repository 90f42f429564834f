#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ocifn_functions_library::api::{FunctionsInvokeApi, FunctionsManagementApi, IdentityApi, InvokeResponse};
use ocifn_functions_library::config::ApiConfig;
use ocifn_functions_library::credentials::Credentials;
use ocifn_functions_library::errors::{FnError, FnResult};
use ocifn_functions_library::models::{Application, Compartment, Function, Page};
use ocifn_library::transaction::TransactionId;
use parking_lot::Mutex;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

pub const TEST_KEY: &str = include_str!("resources/test_key_pkcs1.pem");
pub const TENANCY: &str = "ocid1.tenancy.oc1..tenant";

pub fn compartment(id: &str, name: &str) -> Compartment {
    Compartment {
        id: id.to_string(),
        name: name.to_string(),
        compartment_id: Some(TENANCY.to_string()),
        description: None,
        lifecycle_state: Some("ACTIVE".to_string()),
    }
}

pub fn application(id: &str, name: &str, compartment_id: &str) -> Application {
    Application {
        id: id.to_string(),
        display_name: name.to_string(),
        compartment_id: compartment_id.to_string(),
        lifecycle_state: Some("ACTIVE".to_string()),
    }
}

pub fn function(id: &str, name: &str, application_id: &str, endpoint: &str) -> Function {
    Function {
        id: id.to_string(),
        display_name: name.to_string(),
        application_id: application_id.to_string(),
        invoke_endpoint: endpoint.to_string(),
        image: None,
        memory_in_mbs: Some(128),
        lifecycle_state: Some("ACTIVE".to_string()),
    }
}

pub fn test_credentials() -> Arc<Credentials> {
    Arc::new(
        Credentials::new(TENANCY, "ocid1.user.oc1..user", "us-phoenix-1", "aa:bb:cc", TEST_KEY.as_bytes(), None)
            .expect("test key should load"),
    )
}

/// The cloud used by the test suites: `dev` holds `billing` which holds `compute-tax`.
/// Compartments are split over two pages, `dev` being on the second.
/// Application and function listings return `leading_empty_pages` empty pages before their items.
#[derive(Clone)]
pub struct CloudFixture {
    pub compartment_pages: Vec<Vec<Compartment>>,
    pub applications: Vec<Application>,
    pub functions: Vec<Function>,
    pub leading_empty_pages: usize,
}

impl CloudFixture {
    pub fn standard(invoke_endpoint: &str) -> Self {
        Self {
            compartment_pages: vec![
                vec![compartment("ocid1.compartment.oc1..prod", "prod"), compartment("ocid1.compartment.oc1..qa", "qa")],
                vec![
                    compartment("ocid1.compartment.oc1..dev", "dev"),
                    compartment("ocid1.compartment.oc1..dev2", "dev"),
                    compartment("ocid1.compartment.oc1..Dev", "Dev"),
                ],
            ],
            applications: vec![
                application("ocid1.fnapp.oc1..billing", "billing", "ocid1.compartment.oc1..dev"),
                application("ocid1.fnapp.oc1..billing-dup", "billing", "ocid1.compartment.oc1..dev"),
                application("ocid1.fnapp.oc1..billing-prod", "billing", "ocid1.compartment.oc1..prod"),
            ],
            functions: vec![
                function("ocid1.fnfunc.oc1..tax", "compute-tax", "ocid1.fnapp.oc1..billing", invoke_endpoint),
                function("ocid1.fnfunc.oc1..ship", "compute-shipping", "ocid1.fnapp.oc1..billing", invoke_endpoint),
            ],
            leading_empty_pages: 0,
        }
    }

    fn compartment_page(&self, page: Option<&str>) -> FnResult<Page<Compartment>> {
        let idx = match page {
            None => 0,
            Some(p) => p
                .parse::<usize>()
                .map_err(|_| FnError::upstream("ListCompartments", Some(400), "bad page token"))?,
        };
        let items = self.compartment_pages.get(idx).cloned().unwrap_or_default();
        let next_page = match idx + 1 < self.compartment_pages.len() {
            true => Some((idx + 1).to_string()),
            false => None,
        };
        Ok(Page { items, next_page })
    }

    fn filtered_page<T>(&self, operation: &'static str, items: Vec<T>, page: Option<&str>) -> FnResult<Page<T>> {
        let idx = match page {
            None => 0,
            Some(p) => p
                .parse::<usize>()
                .map_err(|_| FnError::upstream(operation, Some(400), "bad page token"))?,
        };
        match idx < self.leading_empty_pages {
            true => Ok(Page {
                items: vec![],
                next_page: Some((idx + 1).to_string()),
            }),
            false => Ok(Page::last(items)),
        }
    }

    fn applications_named(&self, compartment_id: &str, name: &str) -> Vec<Application> {
        self.applications
            .iter()
            .filter(|a| a.compartment_id == compartment_id && a.display_name == name)
            .cloned()
            .collect()
    }

    fn functions_named(&self, application_id: &str, name: &str) -> Vec<Function> {
        self.functions
            .iter()
            .filter(|f| f.application_id == application_id && f.display_name == name)
            .cloned()
            .collect()
    }
}

/// In-memory stand-in for the remote APIs that records every call.
pub struct FakeCloud {
    pub fixture: CloudFixture,
    pub calls: Mutex<Vec<String>>,
    pub fail_operation: Option<&'static str>,
}

impl FakeCloud {
    pub fn new(fixture: CloudFixture) -> Self {
        Self {
            fixture,
            calls: Mutex::new(vec![]),
            fail_operation: None,
        }
    }

    pub fn failing(fixture: CloudFixture, operation: &'static str) -> Self {
        Self {
            fail_operation: Some(operation),
            ..Self::new(fixture)
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, operation: &'static str, detail: String) -> FnResult<()> {
        self.calls.lock().push(format!("{} {}", operation, detail));
        match self.fail_operation {
            Some(op) if op == operation => Err(FnError::upstream(operation, Some(500), "InternalServerError")),
            _ => Ok(()),
        }
    }
}

fn listing_detail(parent_id: &str, display_name: &str, page: Option<&str>) -> String {
    match page {
        Some(p) => format!("{} {} page={}", parent_id, display_name, p),
        None => format!("{} {}", parent_id, display_name),
    }
}

#[async_trait::async_trait]
impl IdentityApi for FakeCloud {
    async fn list_compartments(&self, tenancy_id: &str, page: Option<&str>, _tid: &TransactionId) -> FnResult<Page<Compartment>> {
        self.record("ListCompartments", format!("{} page={:?}", tenancy_id, page))?;
        self.fixture.compartment_page(page)
    }
}

#[async_trait::async_trait]
impl FunctionsManagementApi for FakeCloud {
    async fn list_applications(
        &self,
        compartment_id: &str,
        display_name: &str,
        page: Option<&str>,
        _tid: &TransactionId,
    ) -> FnResult<Page<Application>> {
        self.record("ListApplications", listing_detail(compartment_id, display_name, page))?;
        let items = self.fixture.applications_named(compartment_id, display_name);
        self.fixture.filtered_page("ListApplications", items, page)
    }

    async fn list_functions(
        &self,
        application_id: &str,
        display_name: &str,
        page: Option<&str>,
        _tid: &TransactionId,
    ) -> FnResult<Page<Function>> {
        self.record("ListFunctions", listing_detail(application_id, display_name, page))?;
        let items = self.fixture.functions_named(application_id, display_name);
        self.fixture.filtered_page("ListFunctions", items, page)
    }
}

#[async_trait::async_trait]
impl FunctionsInvokeApi for FakeCloud {
    async fn invoke_function(
        &self,
        invoke_endpoint: &str,
        function_id: &str,
        payload: Vec<u8>,
        _tid: &TransactionId,
    ) -> FnResult<InvokeResponse> {
        self.record("InvokeFunction", format!("{} {} {}", invoke_endpoint, function_id, payload.len()))?;
        Ok(InvokeResponse {
            status: 200,
            opc_request_id: None,
            body: payload,
        })
    }
}

/// A request as seen by [TestServer].
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path_and_query: String,
    pub signature_valid: bool,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

struct ServerState {
    fixture: CloudFixture,
    public_key: RsaPublicKey,
    seen: Mutex<Vec<SeenRequest>>,
}

/// Local HTTP server speaking the identity, management, and invoke APIs.
/// Every request's signature is checked against [TEST_KEY].
pub struct TestServer {
    pub addr: SocketAddr,
    state: Arc<ServerState>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let private = RsaPrivateKey::from_pkcs1_pem(TEST_KEY).unwrap();
        let state = Arc::new(ServerState {
            fixture: CloudFixture::standard(&format!("http://{}", addr)),
            public_key: RsaPublicKey::from(&private),
            seen: Mutex::new(vec![]),
        });
        let app = Router::new()
            .route("/20160918/compartments", get(list_compartments))
            .route("/20181201/applications", get(list_applications))
            .route("/20181201/functions", get(list_functions))
            .route("/20181201/functions/:function_id/actions/invoke", post(invoke))
            .with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            region: "us-phoenix-1".to_string(),
            identity_endpoint: self.base_url(),
            functions_endpoint: self.base_url(),
            connect_timeout_sec: 5,
            request_timeout_sec: 10,
            page_limit: None,
        }
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.state.seen.lock().clone()
    }

    pub fn seen_paths(&self) -> Vec<String> {
        self.seen()
            .into_iter()
            .map(|r| r.path_and_query.split('?').next().unwrap_or_default().to_string())
            .collect()
    }
}

fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect()
}

fn auth_param<'a>(auth: &'a str, name: &str) -> Option<&'a str> {
    let start = auth.find(&format!("{}=\"", name))? + name.len() + 2;
    let len = auth[start..].find('"')?;
    Some(&auth[start..start + len])
}

fn signature_valid(state: &ServerState, method: &Method, uri: &Uri, headers: &HashMap<String, String>) -> bool {
    let Some(auth) = headers.get("authorization") else {
        return false;
    };
    let (Some(names), Some(sig)) = (auth_param(auth, "headers"), auth_param(auth, "signature")) else {
        return false;
    };
    let target = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let mut lines = vec![];
    for name in names.split(' ') {
        let value = match name {
            "(request-target)" => format!("{} {}", method.as_str().to_lowercase(), target),
            other => match headers.get(other) {
                Some(v) => v.clone(),
                None => return false,
            },
        };
        lines.push(format!("{}: {}", name, value));
    }
    use base64::Engine;
    let Ok(raw) = base64::engine::general_purpose::STANDARD.decode(sig) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(raw.as_slice()) else {
        return false;
    };
    VerifyingKey::<Sha256>::new(state.public_key.clone())
        .verify(lines.join("\n").as_bytes(), &signature)
        .is_ok()
}

fn record(state: &ServerState, method: &Method, uri: &Uri, headers: &HeaderMap, body: &[u8]) {
    let headers = header_map(headers);
    let signature_valid = signature_valid(state, method, uri, &headers);
    state.seen.lock().push(SeenRequest {
        method: method.to_string(),
        path_and_query: uri.path_and_query().map(|p| p.to_string()).unwrap_or_default(),
        signature_valid,
        headers,
        body: body.to_vec(),
    });
}

fn with_next_page<T: serde::Serialize>(items: Vec<T>, next: Option<String>) -> Response {
    let mut headers = HeaderMap::new();
    if let Some(next) = next {
        headers.insert("opc-next-page", next.parse().unwrap());
    }
    (headers, Json(items)).into_response()
}

fn service_error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(serde_json::json!({ "code": code, "message": message }))).into_response()
}

async fn list_compartments(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&state, &method, &uri, &headers, &[]);
    if params.get("compartmentId").map(String::as_str) != Some(TENANCY) {
        return service_error(StatusCode::NOT_FOUND, "NotAuthorizedOrNotFound", "unknown tenancy");
    }
    match state.fixture.compartment_page(params.get("page").map(String::as_str)) {
        Ok(page) => with_next_page(page.items, page.next_page),
        Err(_) => service_error(StatusCode::BAD_REQUEST, "InvalidParameter", "bad page"),
    }
}

async fn list_applications(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&state, &method, &uri, &headers, &[]);
    let compartment = params.get("compartmentId").cloned().unwrap_or_default();
    let name = params.get("displayName").cloned().unwrap_or_default();
    if name == "forbidden" {
        return service_error(StatusCode::UNAUTHORIZED, "NotAuthenticated", "The required information to complete authentication was not provided");
    }
    with_next_page(state.fixture.applications_named(&compartment, &name), None)
}

async fn list_functions(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&state, &method, &uri, &headers, &[]);
    let application = params.get("applicationId").cloned().unwrap_or_default();
    let name = params.get("displayName").cloned().unwrap_or_default();
    with_next_page(state.fixture.functions_named(&application, &name), None)
}

async fn invoke(
    State(state): State<Arc<ServerState>>,
    Path(function_id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record(&state, &method, &uri, &headers, &body);
    match function_id.as_str() {
        "ocid1.fnfunc.oc1..broken" => (StatusCode::BAD_GATEWAY, "function crashed").into_response(),
        _ => (StatusCode::OK, body).into_response(),
    }
}

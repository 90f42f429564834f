use crate::errors::FnResult;
use crate::models::{Application, Compartment, Function, Page};
use ocifn_library::transaction::TransactionId;
use std::borrow::Cow;

pub mod http_client;
pub use http_client::OciHttpClient;

#[async_trait::async_trait]
pub trait IdentityApi: Send + Sync {
    /// List every compartment in the subtree under `tenancy_id`, regardless of access level.
    /// `page` is a token from a previous [Page::next_page].
    async fn list_compartments(
        &self,
        tenancy_id: &str,
        page: Option<&str>,
        tid: &TransactionId,
    ) -> FnResult<Page<Compartment>>;
}

#[async_trait::async_trait]
pub trait FunctionsManagementApi: Send + Sync {
    /// List applications in the compartment whose display name is exactly `display_name`.
    async fn list_applications(
        &self,
        compartment_id: &str,
        display_name: &str,
        page: Option<&str>,
        tid: &TransactionId,
    ) -> FnResult<Page<Application>>;
    /// List functions in the application whose display name is exactly `display_name`.
    async fn list_functions(
        &self,
        application_id: &str,
        display_name: &str,
        page: Option<&str>,
        tid: &TransactionId,
    ) -> FnResult<Page<Function>>;
}

#[async_trait::async_trait]
pub trait FunctionsInvokeApi: Send + Sync {
    /// Send `payload` to the function through its own `invoke_endpoint`.
    async fn invoke_function(
        &self,
        invoke_endpoint: &str,
        function_id: &str,
        payload: Vec<u8>,
        tid: &TransactionId,
    ) -> FnResult<InvokeResponse>;
}

/// The buffered result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeResponse {
    pub status: u16,
    pub opc_request_id: Option<String>,
    pub body: Vec<u8>,
}

impl InvokeResponse {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

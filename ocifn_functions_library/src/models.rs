use serde::{Deserialize, Serialize};

/// A compartment as returned by the identity service listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Compartment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub compartment_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub display_name: String,
    pub compartment_id: String,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub id: String,
    pub display_name: String,
    pub application_id: String,
    /// Dedicated host for triggering this function, distinct from the management API host.
    pub invoke_endpoint: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, rename = "memoryInMBs")]
    pub memory_in_mbs: Option<u64>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
}

/// One page of a listing call.
/// `next_page` carries the `opc-next-page` token when more results exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next_page: None }
    }
}

//! Resolve Oracle Cloud Functions by display name and invoke them.
//!
//! The pipeline is strictly sequential: [credentials] builds the signing context,
//! [services::resolver] walks compartment → application → function through the [api] traits,
//! and [services::invoker] posts the payload to the function's own invoke endpoint.

pub mod api;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod models;
pub mod services;
pub mod signer;

pub use errors::{FnError, FnResult};

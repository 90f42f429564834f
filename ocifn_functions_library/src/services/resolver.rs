//! Name → identifier resolution.
//! Display names are not unique remotely, every lookup takes the first match in listing order.

use crate::api::{FunctionsManagementApi, IdentityApi};
use crate::errors::{FnError, FnResult, ResourceKind};
use crate::models::{Application, Compartment, Function, Page};
use ocifn_library::{bail_typed, transaction::TransactionId};
use std::future::Future;
use tracing::info;

/// Walk pages in order until `pick` accepts an item.
async fn first_match<T, F, Fut, P>(mut fetch: F, mut pick: P) -> FnResult<Option<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = FnResult<Page<T>>>,
    P: FnMut(&T) -> bool,
{
    let mut token = None;
    loop {
        let page = fetch(token).await?;
        if let Some(found) = page.items.into_iter().find(|item| pick(item)) {
            return Ok(Some(found));
        }
        match page.next_page {
            Some(next) => token = Some(next),
            None => return Ok(None),
        }
    }
}

/// Find the first compartment anywhere under the tenancy whose name is exactly `name`.
pub async fn resolve_compartment<I>(
    identity: &I,
    name: &str,
    tenancy_id: &str,
    tid: &TransactionId,
) -> FnResult<Compartment>
where
    I: IdentityApi + ?Sized,
{
    info!(tid = tid, compartment = name, tenancy = tenancy_id, "Finding details for compartment");
    let found = first_match(
        |page| async move { identity.list_compartments(tenancy_id, page.as_deref(), tid).await },
        |c: &Compartment| c.name == name,
    )
    .await?;
    match found {
        Some(c) => {
            info!(tid=tid, compartment=name, id=%c.id, "Found details for compartment");
            Ok(c)
        },
        None => bail_typed!(
            FnError::not_found(ResourceKind::Compartment, name, format!("tenancy {}", tenancy_id)),
            tid = tid, compartment = name, tenancy = tenancy_id, "Could not find details for compartment"
        ),
    }
}

/// First application in the compartment with display name `name`.
pub async fn resolve_application<M>(
    management: &M,
    name: &str,
    compartment_id: &str,
    tid: &TransactionId,
) -> FnResult<Application>
where
    M: FunctionsManagementApi + ?Sized,
{
    info!(tid = tid, application = name, compartment = compartment_id, "Finding details for application");
    let found = first_match(
        |page| async move {
            management
                .list_applications(compartment_id, name, page.as_deref(), tid)
                .await
        },
        |_: &Application| true,
    )
    .await?;
    match found {
        Some(app) => {
            info!(tid=tid, application=name, id=%app.id, "Found details for application");
            Ok(app)
        },
        None => bail_typed!(
            FnError::not_found(ResourceKind::Application, name, format!("compartment {}", compartment_id)),
            tid = tid, application = name, compartment = compartment_id, "Could not find application"
        ),
    }
}

/// First function in the application with display name `name`.
pub async fn resolve_function<M>(
    management: &M,
    name: &str,
    application_id: &str,
    tid: &TransactionId,
) -> FnResult<Function>
where
    M: FunctionsManagementApi + ?Sized,
{
    info!(tid = tid, function = name, application = application_id, "Finding details for function");
    let found = first_match(
        |page| async move {
            management
                .list_functions(application_id, name, page.as_deref(), tid)
                .await
        },
        |_: &Function| true,
    )
    .await?;
    match found {
        Some(func) => {
            info!(tid=tid, function=name, id=%func.id, endpoint=%func.invoke_endpoint, "Found details for function");
            Ok(func)
        },
        None => bail_typed!(
            FnError::not_found(ResourceKind::Function, name, format!("application {}", application_id)),
            tid = tid, function = name, application = application_id, "Could not find function"
        ),
    }
}

/// Display names identifying one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionPath {
    pub compartment: String,
    pub application: String,
    pub function: String,
}

/// Resolve compartment, then application, then function.
/// Stops at the first failure, later listings are never issued.
pub async fn locate_function<I, M>(
    identity: &I,
    management: &M,
    path: &FunctionPath,
    tenancy_id: &str,
    tid: &TransactionId,
) -> FnResult<Function>
where
    I: IdentityApi + ?Sized,
    M: FunctionsManagementApi + ?Sized,
{
    let compartment = resolve_compartment(identity, &path.compartment, tenancy_id, tid).await?;
    let application = resolve_application(management, &path.application, &compartment.id, tid).await?;
    resolve_function(management, &path.function, &application.id, tid).await
}

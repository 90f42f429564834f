use crate::api::{FunctionsInvokeApi, InvokeResponse};
use crate::errors::FnResult;
use crate::models::Function;
use ocifn_library::transaction::TransactionId;
use tracing::{error, info};

/// Invoke a function once through its dedicated endpoint.
/// Failure is returned to the caller, which decides whether it is fatal.
pub async fn invoke<A>(
    api: &A,
    function_id: &str,
    invoke_endpoint: &str,
    payload: &[u8],
    tid: &TransactionId,
) -> FnResult<InvokeResponse>
where
    A: FunctionsInvokeApi + ?Sized,
{
    info!(
        tid = tid,
        function = function_id,
        endpoint = invoke_endpoint,
        payload_len = payload.len(),
        "Invoking function endpoint"
    );
    match api.invoke_function(invoke_endpoint, function_id, payload.to_vec(), tid).await {
        Ok(resp) => {
            info!(
                tid = tid,
                function = function_id,
                status = resp.status,
                response_len = resp.body.len(),
                "Function response received"
            );
            Ok(resp)
        },
        Err(e) => {
            error!(tid=tid, function=function_id, error=%e, "Function invocation failed");
            Err(e)
        },
    }
}

/// Convenience over [invoke] for a resolved [Function].
pub async fn invoke_resolved<A>(
    api: &A,
    function: &Function,
    payload: &[u8],
    tid: &TransactionId,
) -> FnResult<InvokeResponse>
where
    A: FunctionsInvokeApi + ?Sized,
{
    invoke(api, &function.id, &function.invoke_endpoint, payload, tid).await
}

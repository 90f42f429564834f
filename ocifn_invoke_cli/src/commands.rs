use crate::args::Args;
use crate::config::CliConfig;
use anyhow::Result;
use ocifn_functions_library::api::OciHttpClient;
use ocifn_functions_library::credentials::{CredentialSource, Credentials};
use ocifn_functions_library::services::{invoker, resolver};
use ocifn_library::transaction::TransactionId;
use ocifn_library::utils::file::read_file_bytes;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

/// Payload bytes from `--invokePayloadFile` if given, otherwise `--invokePayload`.
pub fn load_payload(args: &Args, tid: &TransactionId) -> Result<Vec<u8>> {
    match &args.invoke_payload_file {
        Some(pth) => read_file_bytes(pth, tid),
        None => Ok(args.invoke_payload.as_bytes().to_vec()),
    }
}

/// Resolve the function named by `args` and invoke it once, writing the raw response to `out`.
/// All local input is validated before the first network call.
pub async fn invoke<W: Write>(args: &Args, config: &CliConfig, out: &mut W, tid: &TransactionId) -> Result<()> {
    let source = CredentialSource::from_env()?;
    debug!(tid=tid, source=?source, "Loaded credential source");
    let payload = load_payload(args, tid)?;
    let creds = Arc::new(Credentials::load(&source, &config.api.region, tid)?);
    let client = OciHttpClient::new(&config.api, creds.clone(), tid)?;

    let function =
        resolver::locate_function(&client, &client, &args.function_path(), creds.tenancy_id(), tid).await?;
    let response = invoker::invoke_resolved(&client, &function, &payload, tid).await?;
    info!(tid=tid, status=response.status, opc_request_id=?response.opc_request_id, "Function response");
    out.write_all(&response.body)?;
    out.flush()?;
    Ok(())
}

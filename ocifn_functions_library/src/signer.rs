//! OCI request signing, version 1 of the draft-cavage HTTP signature scheme with `rsa-sha256`.

use crate::credentials::Credentials;
use crate::errors::{FnError, FnResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Method;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::{Digest, Sha256};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use url::Url;

const REQUEST_TARGET: &str = "(request-target)";

/// Headers to attach to a request, and the exact string that was signed.
#[derive(Debug, Clone)]
pub struct RequestSignature {
    pub headers: Vec<(&'static str, String)>,
    pub signing_string: String,
}

impl RequestSignature {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
    }
}

/// A request body to cover with the signature.
pub struct SignedBody<'a> {
    pub bytes: &'a [u8],
    pub content_type: &'a str,
}

/// Format a timestamp as an RFC 7231 IMF-fixdate.
pub fn http_date(when: OffsetDateTime) -> FnResult<String> {
    when.to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
        ))
        .map_err(|e| FnError::config(format!("Unable to format request date: {}", e)))
}

pub fn content_sha256(body: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(body))
}

fn host_header(url: &Url) -> FnResult<String> {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => Ok(format!("{}:{}", host, port)),
        (Some(host), None) => Ok(host.to_string()),
        (None, _) => Err(FnError::config(format!("URL '{}' has no host to sign", url))),
    }
}

fn request_target(method: &Method, url: &Url) -> String {
    let method = method.as_str().to_lowercase();
    match url.query() {
        Some(q) => format!("{} {}?{}", method, url.path(), q),
        None => format!("{} {}", method, url.path()),
    }
}

/// Sign a request.
/// Bodyless requests cover `date (request-target) host`,
/// requests with a body also cover `content-length content-type x-content-sha256`.
pub fn sign_request(
    creds: &Credentials,
    method: &Method,
    url: &Url,
    body: Option<SignedBody<'_>>,
    when: OffsetDateTime,
) -> FnResult<RequestSignature> {
    let mut signed: Vec<(&'static str, String)> = vec![
        ("date", http_date(when)?),
        (REQUEST_TARGET, request_target(method, url)),
        ("host", host_header(url)?),
    ];
    if let Some(body) = body {
        signed.push(("content-length", body.bytes.len().to_string()));
        signed.push(("content-type", body.content_type.to_string()));
        signed.push(("x-content-sha256", content_sha256(body.bytes)));
    }

    let signing_string = signed
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join("\n");
    let signature = creds
        .signing_key()
        .try_sign(signing_string.as_bytes())
        .map_err(|e| FnError::config(format!("Unable to sign request: {}", e)))?;
    let names = signed.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(" ");
    let authorization = format!(
        r#"Signature version="1",keyId="{}",algorithm="rsa-sha256",headers="{}",signature="{}""#,
        creds.key_id(),
        names,
        STANDARD.encode(signature.to_bytes())
    );

    signed.retain(|(k, _)| *k != REQUEST_TARGET);
    signed.push(("authorization", authorization));
    Ok(RequestSignature {
        headers: signed,
        signing_string,
    })
}

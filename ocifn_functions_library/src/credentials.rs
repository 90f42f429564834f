use crate::errors::{FnError, FnResult};
use ocifn_library::transaction::TransactionId;
use ocifn_library::utils::file::read_file_bytes;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use sha2::Sha256;
use std::path::PathBuf;
use tracing::{debug, info};

pub const TENANT_OCID_ENV: &str = "TENANT_OCID";
pub const USER_OCID_ENV: &str = "USER_OCID";
pub const FINGERPRINT_ENV: &str = "PUBLIC_KEY_FINGERPRINT";
pub const PRIVATE_KEY_LOCATION_ENV: &str = "PRIVATE_KEY_LOCATION";
pub const PASSPHRASE_ENV: &str = "PASSPHRASE";

/// Identity values as found in the environment, before the key file is read.
#[derive(Clone)]
pub struct CredentialSource {
    pub tenancy_id: String,
    pub user_id: String,
    pub fingerprint: String,
    pub private_key_location: PathBuf,
    pub passphrase: Option<String>,
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSource")
            .field("tenancy_id", &self.tenancy_id)
            .field("user_id", &self.user_id)
            .field("fingerprint", &self.fingerprint)
            .field("private_key_location", &self.private_key_location)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CredentialSource {
    pub fn from_env() -> FnResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Every required variable must be present and non-empty.
    /// `PASSPHRASE` is optional, an empty value means no passphrase.
    pub fn from_lookup<F>(lookup: F) -> FnResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| match lookup(name) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(FnError::config(format!("Please set the environment variable {}", name))),
        };
        Ok(Self {
            tenancy_id: required(TENANT_OCID_ENV)?,
            user_id: required(USER_OCID_ENV)?,
            fingerprint: required(FINGERPRINT_ENV)?,
            private_key_location: PathBuf::from(required(PRIVATE_KEY_LOCATION_ENV)?),
            passphrase: lookup(PASSPHRASE_ENV).filter(|p| !p.is_empty()),
        })
    }
}

/// The signing context used for every outbound request.
/// Read-only once built.
#[derive(Clone)]
pub struct Credentials {
    tenancy_id: String,
    user_id: String,
    region: String,
    fingerprint: String,
    signing_key: SigningKey<Sha256>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("tenancy_id", &self.tenancy_id)
            .field("user_id", &self.user_id)
            .field("region", &self.region)
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Read the private key named by `source` and build the signing context.
    pub fn load(source: &CredentialSource, region: &str, tid: &TransactionId) -> FnResult<Self> {
        let path = &source.private_key_location;
        info!(tid=tid, path=%path.display(), "Reading private key");
        let pem = read_file_bytes(path, tid).map_err(|e| {
            FnError::config(format!(
                "Unable to read private key file contents from {} due to {}",
                path.display(),
                e
            ))
        })?;
        Self::new(
            &source.tenancy_id,
            &source.user_id,
            region,
            &source.fingerprint,
            &pem,
            source.passphrase.as_deref(),
        )
    }

    pub fn new(
        tenancy_id: &str,
        user_id: &str,
        region: &str,
        fingerprint: &str,
        private_key_pem: &[u8],
        passphrase: Option<&str>,
    ) -> FnResult<Self> {
        for (what, value) in [
            ("tenancy id", tenancy_id),
            ("user id", user_id),
            ("region", region),
            ("key fingerprint", fingerprint),
        ] {
            if value.trim().is_empty() {
                return Err(FnError::config(format!("The {} must not be empty", what)));
            }
        }
        let key = parse_private_key(private_key_pem, passphrase)?;
        debug!(tenancy = tenancy_id, user = user_id, region = region, "Built signing context");
        Ok(Self {
            tenancy_id: tenancy_id.to_string(),
            user_id: user_id.to_string(),
            region: region.to_string(),
            fingerprint: fingerprint.to_string(),
            signing_key: SigningKey::<Sha256>::new(key),
        })
    }

    /// `keyId` value of the authorization header.
    pub fn key_id(&self) -> String {
        format!("{}/{}/{}", self.tenancy_id, self.user_id, self.fingerprint)
    }

    pub fn tenancy_id(&self) -> &str {
        &self.tenancy_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub(crate) fn signing_key(&self) -> &SigningKey<Sha256> {
        &self.signing_key
    }
}

fn parse_private_key(pem: &[u8], passphrase: Option<&str>) -> FnResult<RsaPrivateKey> {
    let pem = std::str::from_utf8(pem).map_err(|_| FnError::config("Private key is not PEM encoded text"))?;
    let parsed = if pem.contains("BEGIN ENCRYPTED PRIVATE KEY") {
        let passphrase = match passphrase {
            Some(p) if !p.is_empty() => p,
            _ => {
                return Err(FnError::config(
                    "Private key is encrypted but no passphrase was provided",
                ))
            },
        };
        RsaPrivateKey::from_pkcs8_encrypted_pem(pem, passphrase.as_bytes()).map_err(|e| e.to_string())
    } else if pem.contains("BEGIN RSA PRIVATE KEY") {
        if pem.contains("Proc-Type: 4,ENCRYPTED") {
            return Err(FnError::config(
                "Legacy encrypted PKCS#1 keys are not supported, convert the key to encrypted PKCS#8",
            ));
        }
        RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| e.to_string())
    } else if pem.contains("BEGIN PRIVATE KEY") {
        RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| e.to_string())
    } else {
        Err("no RSA private key PEM block found".to_string())
    };
    parsed.map_err(|e| FnError::config(format!("Unable to parse private key: {}", e)))
}

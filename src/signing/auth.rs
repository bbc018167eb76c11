//! Request authentication for the signing service.
//!
//! Every call carries the API key in `X-API-Key` and a short-lived RS256 JWT
//! in `Authorization: Bearer`. The token binds the request URI and a SHA-256
//! of the exact body, so it cannot be replayed against another request.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::signing::service::SigningServiceError;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "MPC_SIGNER_API_KEY";

/// Environment variable holding the path to the API secret PEM.
pub const API_SECRET_PATH_ENV: &str = "MPC_SIGNER_API_SECRET_PATH";

/// Token lifetime in seconds.
pub const TOKEN_TTL_SECS: u64 = 55;

/// JWT claims for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestClaims {
    /// Path and query of the request.
    pub uri: String,
    /// Fresh per request.
    pub nonce: String,
    pub iat: u64,
    pub exp: u64,
    /// API key.
    pub sub: String,
    /// Hex SHA-256 of the request body.
    pub body_hash: String,
}

/// API key plus the RSA key that signs request tokens.
#[derive(Clone)]
pub struct ApiCredentials {
    api_key: String,
    signing_key: EncodingKey,
}

impl ApiCredentials {
    /// Build from an API key and the PEM text of the API secret.
    pub fn new(api_key: impl Into<String>, secret_pem: &[u8]) -> Result<Self, SigningServiceError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SigningServiceError::Auth("API key is empty".to_string()));
        }
        let signing_key = EncodingKey::from_rsa_pem(secret_pem)
            .map_err(|e| SigningServiceError::Auth(format!("invalid API secret: {}", e)))?;
        Ok(Self {
            api_key,
            signing_key,
        })
    }

    /// Build from an API key and a PEM file.
    pub fn load(api_key: impl Into<String>, secret_path: &Path) -> Result<Self, SigningServiceError> {
        let pem = std::fs::read(secret_path).map_err(|e| {
            SigningServiceError::Auth(format!(
                "cannot read API secret {}: {}",
                secret_path.display(),
                e
            ))
        })?;
        Self::new(api_key, &pem)
    }

    /// Build from `MPC_SIGNER_API_KEY` and the secret path.
    ///
    /// `MPC_SIGNER_API_SECRET_PATH` takes precedence over `configured_path`.
    pub fn from_env(configured_path: Option<&str>) -> Result<Self, SigningServiceError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| SigningServiceError::Auth(format!("{} is not set", API_KEY_ENV)))?;
        let secret_path = std::env::var(API_SECRET_PATH_ENV)
            .ok()
            .or_else(|| configured_path.map(str::to_string))
            .ok_or_else(|| {
                SigningServiceError::Auth(format!(
                    "no API secret: set {} or signer.api_secret_path",
                    API_SECRET_PATH_ENV
                ))
            })?;
        Self::load(api_key, Path::new(&secret_path))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Claims for a request to `uri` with `body` (empty for GET).
    pub fn claims(&self, uri: &str, body: &str) -> RequestClaims {
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        RequestClaims {
            uri: uri.to_string(),
            nonce: uuid::Uuid::new_v4().to_string(),
            iat,
            exp: iat + TOKEN_TTL_SECS,
            sub: self.api_key.clone(),
            body_hash: hex::encode(Sha256::digest(body.as_bytes())),
        }
    }

    /// Signed bearer token for a request to `uri` with `body`.
    pub fn sign_request(&self, uri: &str, body: &str) -> Result<String, SigningServiceError> {
        let claims = self.claims(uri, body);
        encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| SigningServiceError::Auth(format!("token signing failed: {}", e)))
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

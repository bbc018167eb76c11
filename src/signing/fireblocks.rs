//! REST implementation of [`SigningService`].
//!
//! # Endpoints
//! - `GET /v1/vault/public_key_info` for public keys
//! - `POST /v1/transactions` with operation `RAW` to sign a hash
//! - `GET /v1/transactions/{id}` for status and signatures
//!
//! Each call is a single HTTP request. Retrying is the caller's decision.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::config::schema::SignerConfig;
use crate::signing::auth::ApiCredentials;
use crate::signing::service::{SigningService, SigningServiceError};
use crate::signing::types::{
    DerivationPath, RequestId, SigningAlgorithm, SigningRequest, StatusReport,
};

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicKeyInfo {
    public_key: String,
}

#[derive(Debug, Deserialize)]
struct CreatedRequest {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

/// HTTP client for the signing service REST API.
#[derive(Debug, Clone)]
pub struct FireblocksService {
    http: reqwest::Client,
    base_url: String,
    credentials: ApiCredentials,
    note: String,
}

impl FireblocksService {
    pub fn new(config: &SignerConfig, credentials: ApiCredentials) -> Result<Self, SigningServiceError> {
        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(config.request_timeout_secs));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder
            .build()
            .map_err(|e| SigningServiceError::Transport(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            note: config.note.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, uri: &str) -> Result<T, SigningServiceError> {
        let token = self.credentials.sign_request(uri, "")?;
        let response = self
            .http
            .get(format!("{}{}", self.base_url, uri))
            .header(API_KEY_HEADER, self.credentials.api_key())
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;
        decode_response(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        uri: &str,
        body: &serde_json::Value,
    ) -> Result<T, SigningServiceError> {
        // The token hashes these exact bytes
        let body = serde_json::to_string(body)
            .map_err(|e| SigningServiceError::Decode(format!("request body: {}", e)))?;
        let token = self.credentials.sign_request(uri, &body)?;
        let response = self
            .http
            .post(format!("{}{}", self.base_url, uri))
            .header(API_KEY_HEADER, self.credentials.api_key())
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(token)
            .body(body)
            .send()
            .await
            .map_err(transport)?;
        decode_response(response).await
    }
}

fn transport(e: reqwest::Error) -> SigningServiceError {
    SigningServiceError::Transport(e.to_string())
}

async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T, SigningServiceError> {
    let status = response.status();
    let text = response.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(SigningServiceError::Http {
            status: status.as_u16(),
            body: text,
        });
    }
    serde_json::from_str(&text).map_err(|e| SigningServiceError::Decode(e.to_string()))
}

/// Request body for a raw-hash signing request.
pub(crate) fn raw_signing_body(request: &SigningRequest, note: &str) -> serde_json::Value {
    json!({
        "operation": "RAW",
        "note": note,
        "extraParameters": {
            "rawMessageData": {
                "messages": [{
                    "content": hex::encode(request.payload_hash),
                    "derivationPath": request.derivation_path,
                }],
                "algorithm": request.algorithm,
            }
        }
    })
}

#[async_trait]
impl SigningService for FireblocksService {
    async fn get_public_key(
        &self,
        algorithm: SigningAlgorithm,
        path: &DerivationPath,
        compressed: bool,
    ) -> Result<String, SigningServiceError> {
        let uri = format!(
            "/v1/vault/public_key_info?derivationPath={}&algorithm={}&compressed={}",
            path,
            algorithm.as_str(),
            compressed
        );
        let info: PublicKeyInfo = self.get_json(&uri).await?;
        Ok(info.public_key)
    }

    async fn create_signing_request(
        &self,
        request: &SigningRequest,
    ) -> Result<RequestId, SigningServiceError> {
        let body = raw_signing_body(request, &self.note);
        let created: CreatedRequest = self.post_json("/v1/transactions", &body).await?;
        tracing::debug!(
            request_id = %created.id,
            status = created.status.as_deref().unwrap_or("unknown"),
            "Signing request created"
        );
        Ok(RequestId::from(created.id))
    }

    async fn get_status(&self, id: &RequestId) -> Result<StatusReport, SigningServiceError> {
        self.get_json(&format!("/v1/transactions/{}", id)).await
    }
}

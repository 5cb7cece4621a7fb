//! Access grant and S3 client creation

use aws_config::Region;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::Client;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SetupError;

pub const DEFAULT_REGION: &str = "us-east-1";

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// Connection parameters carried by the serialized `-a` credential.
///
/// The serialized form is base64 (standard or URL-safe, padding optional)
/// of the JSON encoding of this struct.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessGrant {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl fmt::Debug for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGrant")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("force_path_style", &self.force_path_style)
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl AccessGrant {
    pub fn parse(serialized: &str) -> Result<Self, SetupError> {
        let trimmed = serialized.trim();
        if trimmed.is_empty() {
            return Err(SetupError::MissingAccess);
        }

        let raw = STANDARD
            .decode(trimmed)
            .or_else(|_| URL_SAFE_NO_PAD.decode(trimmed.trim_end_matches('=')))
            .map_err(|e| SetupError::InvalidAccess(format!("not base64: {}", e)))?;

        let grant: AccessGrant = serde_json::from_slice(&raw)
            .map_err(|e| SetupError::InvalidAccess(format!("malformed grant: {}", e)))?;

        if grant.access_key_id.trim().is_empty() || grant.secret_access_key.trim().is_empty() {
            return Err(SetupError::InvalidAccess(
                "access key id and secret are required".to_string(),
            ));
        }
        if grant.region.trim().is_empty() {
            return Err(SetupError::InvalidAccess("region is empty".to_string()));
        }

        Ok(grant)
    }

    /// Serialize to the URL-safe form accepted by [`AccessGrant::parse`]
    pub fn encode(&self) -> serde_json::Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    fn endpoint_url(&self) -> Option<&str> {
        let endpoint = self.endpoint.as_deref()?.trim();
        if endpoint.is_empty() {
            return None;
        }
        Some(endpoint)
    }
}

/// Create an S3 client from explicit grant credentials
pub fn create_s3_client(grant: &AccessGrant) -> Client {
    let credentials = Credentials::new(
        &grant.access_key_id,
        &grant.secret_access_key,
        grant.session_token.clone(),
        None,
        "access-grant",
    );

    let mut builder = S3ConfigBuilder::new()
        .credentials_provider(credentials)
        .region(Region::new(grant.region.clone()));

    if let Some(endpoint_url) = grant.endpoint_url() {
        builder = builder.endpoint_url(endpoint_url);
    }

    if grant.force_path_style {
        builder = builder.force_path_style(true);
    }

    Client::from_conf(builder.build())
}

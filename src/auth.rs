//!
//! src/auth.rs  Andrew Belles  Oct 19th, 2026
//!
//! Google service-account auth: sign a short lived JWT with the account's
//! private key and trade it for a bearer token
//!

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use ring::{rand::SystemRandom, signature};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::{SyncError, status_error};

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Read/write on spreadsheets plus drive file access
pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

fn default_token_uri() -> String { GOOGLE_TOKEN_URI.to_string() }

/// The parts of a service-account key file we need
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct JwtHeader<'a> {
    alg: &'static str,
    typ: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<&'a str>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(key: &ServiceAccountKey, issued_at: i64) -> Self {
        Self {
            iss: key.client_email.clone(),
            scope: SCOPES.join(" "),
            aud: key.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + TOKEN_LIFETIME_SECS,
        }
    }
}

/// Strips PEM armour and decodes the DER body
fn pem_to_der(pem: &str) -> Result<Vec<u8>, SyncError> {
    let body: String = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"))
        .collect();
    if body.is_empty() {
        return Err(SyncError::Auth("private key is empty".to_string()));
    }
    STANDARD
        .decode(body)
        .map_err(|e| SyncError::Auth(format!("private key is not base64: {e}")))
}

/// `header.claims` with both segments base64url encoded
pub fn signing_input(key: &ServiceAccountKey, claims: &Claims) -> Result<String, SyncError> {
    let header = JwtHeader { alg: "RS256", typ: "JWT", kid: key.private_key_id.as_deref() };
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
    let claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    Ok(format!("{header}.{claims}"))
}

/// RS256 signed assertion for the token endpoint
pub fn sign_assertion(key: &ServiceAccountKey, claims: &Claims) -> Result<String, SyncError> {
    let der = pem_to_der(&key.private_key)?;
    let key_pair = signature::RsaKeyPair::from_pkcs8(&der)
        .map_err(|e| SyncError::Auth(format!("private key rejected: {e}")))?;

    let message = signing_input(key, claims)?;
    let mut sig = vec![0; key_pair.public().modulus_len()];
    key_pair
        .sign(&signature::RSA_PKCS1_SHA256, &SystemRandom::new(), message.as_bytes(), &mut sig)
        .map_err(|_| SyncError::Auth("failed to sign assertion".to_string()))?;

    Ok(format!("{message}.{}", URL_SAFE_NO_PAD.encode(sig)))
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchanges a signed assertion for an access token
#[instrument(skip(http, key), fields(account = %key.client_email))]
pub async fn fetch_access_token(
    http: &reqwest::Client,
    key: &ServiceAccountKey,
) -> Result<String, SyncError> {
    let claims = Claims::new(key, chrono::Utc::now().timestamp());
    let assertion = sign_assertion(key, &claims)?;

    let resp = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;
    if !resp.status().is_success() {
        return Err(status_error("google-oauth", resp).await);
    }
    let token: TokenResponse = resp.json().await?;
    debug!("google.token");
    Ok(token.access_token)
}

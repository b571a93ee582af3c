use std::sync::Arc;

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::{AccessMode, Config};
use crate::constants::PASSWORD_HEADER;
use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Kind of access a request needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// What a request presented about its caller
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub password: Option<String>,
    pub user: Option<String>,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Credentials {
    /// Extract credentials from request headers
    ///
    /// `user_header` is the header a hosting proxy fills with the signed-in user.
    pub fn from_headers(headers: &HeaderMap, user_header: &str) -> Self {
        Self {
            password: header_value(headers, PASSWORD_HEADER),
            user: header_value(headers, user_header),
        }
    }
}

/// Gate in front of the record store
pub trait AccessPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn authorize(&self, credentials: &Credentials, access: Access) -> Result<()>;
}

pub type SharedPolicy = Arc<dyn AccessPolicy>;

/// No gating at all
#[derive(Debug, Default)]
pub struct OpenAccess;

impl AccessPolicy for OpenAccess {
    fn name(&self) -> &'static str {
        "open"
    }

    fn authorize(&self, _credentials: &Credentials, _access: Access) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Shared Editor Password
// =============================================================================

/// Digest stored in configuration for an editor password
///
/// `digest = HMAC-SHA256(key = pepper, message = password)`, hex encoded.
/// The pepper lives in the environment, so a leaked digest alone cannot be
/// checked against a password list.
pub fn password_digest(password: &str, pepper: &str) -> String {
    match keyed_mac(pepper, password) {
        Some(mac) => hex::encode(mac.finalize().into_bytes()),
        None => String::new(),
    }
}

fn keyed_mac(pepper: &str, password: &str) -> Option<HmacSha256> {
    let mut mac = match HmacSha256::new_from_slice(pepper.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return None;
        }
    };
    mac.update(password.as_bytes());
    Some(mac)
}

/// Anyone may read; writes need the editor password
#[derive(Debug)]
pub struct PasswordAccess {
    digest: Vec<u8>,
    pepper: String,
}

impl PasswordAccess {
    /// Create from a hex digest produced by [`password_digest`]
    pub fn new(hex_digest: &str, pepper: impl Into<String>) -> std::result::Result<Self, String> {
        let digest = hex::decode(hex_digest.trim())
            .map_err(|_| "ACCESS_PASSWORD_DIGEST must be hex encoded".to_string())?;
        Ok(Self {
            digest,
            pepper: pepper.into(),
        })
    }

    fn verify(&self, password: &str) -> bool {
        // verify_slice compares in constant time
        keyed_mac(&self.pepper, password)
            .map(|mac| mac.verify_slice(&self.digest).is_ok())
            .unwrap_or(false)
    }
}

impl AccessPolicy for PasswordAccess {
    fn name(&self) -> &'static str {
        "password"
    }

    fn authorize(&self, credentials: &Credentials, access: Access) -> Result<()> {
        if access == Access::Read {
            return Ok(());
        }
        match credentials.password.as_deref() {
            Some(password) if self.verify(password) => Ok(()),
            Some(_) => {
                tracing::warn!("Rejected write with wrong editor password");
                Err(AppError::Unauthorized)
            }
            None => Err(AppError::Unauthorized),
        }
    }
}

// =============================================================================
// Hosted Sign-in
// =============================================================================

/// Trusts the user header set by a hosting proxy
///
/// Any signed-in user may read; only listed editors may write.
#[derive(Debug)]
pub struct TrustedHeaderAccess {
    editors: Vec<String>,
}

impl TrustedHeaderAccess {
    pub fn new(editors: Vec<String>) -> Self {
        Self {
            editors: editors.into_iter().map(|e| e.to_lowercase()).collect(),
        }
    }
}

impl AccessPolicy for TrustedHeaderAccess {
    fn name(&self) -> &'static str {
        "header"
    }

    fn authorize(&self, credentials: &Credentials, access: Access) -> Result<()> {
        let user = credentials
            .user
            .as_deref()
            .ok_or(AppError::Unauthorized)?
            .to_lowercase();

        if access == Access::Write && !self.editors.contains(&user) {
            tracing::warn!("User {} is not an editor", user);
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}

/// Build the access policy selected by configuration
pub fn build_policy(config: &Config) -> std::result::Result<SharedPolicy, String> {
    let policy: SharedPolicy = match config.access_mode {
        AccessMode::Open => Arc::new(OpenAccess),
        AccessMode::Password => {
            let digest = config
                .access_password_digest
                .as_deref()
                .ok_or("ACCESS_PASSWORD_DIGEST must be set for ACCESS_POLICY=password")?;
            Arc::new(PasswordAccess::new(digest, config.access_pepper.clone())?)
        }
        AccessMode::Header => Arc::new(TrustedHeaderAccess::new(config.editors.clone())),
    };

    tracing::info!("Access policy: {}", policy.name());
    Ok(policy)
}

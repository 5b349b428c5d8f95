//! API credentials and HMAC-SHA256 signing primitives
//!
//! # Security
//!
//! The API secret is stored using the `secrecy` crate which:
//! - Zeroizes memory on drop (prevents memory scanning)
//! - Prevents accidental logging via Debug impl
//! - Provides explicit access via `expose_secret()`

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// API credentials for authenticated requests
///
/// Supplied once when the client is built and never mutated afterwards.
pub struct Credentials {
    /// API key (public)
    api_key: String,
    /// HMAC secret (zeroized on drop)
    secret: SecretString,
    /// Key id sent on login; falls back to the API key
    public_key: Option<String>,
    /// ECDSA private key (zeroized on drop)
    private_key: Option<SecretString>,
}

impl Credentials {
    /// Create new credentials from an API key and HMAC secret
    ///
    /// # Security
    /// The secret is immediately moved into a `SecretString` which will be
    /// zeroized when dropped.
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> AuthResult<Self> {
        let api_key = api_key.into();
        let secret = secret.into();

        if api_key.is_empty() {
            return Err(AuthError::InvalidCredentials("API key is empty".to_string()));
        }
        if secret.is_empty() {
            return Err(AuthError::InvalidCredentials("API secret is empty".to_string()));
        }

        Ok(Self {
            api_key,
            secret: SecretString::from(secret),
            public_key: None,
            private_key: None,
        })
    }

    /// Set the public key used on the login handshake
    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    /// Attach an ECDSA private key
    pub fn with_private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = Some(SecretString::from(private_key.into()));
        self
    }

    /// Create credentials from environment variables
    ///
    /// Reads `BULLISH_API_KEY` and `BULLISH_API_SECRET`, plus the optional
    /// `BULLISH_PUBLIC_KEY` and `BULLISH_PRIVATE_KEY`.
    pub fn from_env() -> AuthResult<Self> {
        let api_key = std::env::var("BULLISH_API_KEY")
            .map_err(|_| AuthError::EnvVarNotSet("BULLISH_API_KEY".to_string()))?;
        let secret = std::env::var("BULLISH_API_SECRET")
            .map_err(|_| AuthError::EnvVarNotSet("BULLISH_API_SECRET".to_string()))?;

        let mut credentials = Self::new(api_key, secret)?;
        if let Ok(public_key) = std::env::var("BULLISH_PUBLIC_KEY") {
            credentials = credentials.with_public_key(public_key);
        }
        if let Ok(private_key) = std::env::var("BULLISH_PRIVATE_KEY") {
            credentials = credentials.with_private_key(private_key);
        }
        Ok(credentials)
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Key id sent in the login headers
    pub fn public_key(&self) -> &str {
        self.public_key.as_deref().unwrap_or(&self.api_key)
    }

    /// Check whether an ECDSA private key was supplied
    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// HMAC-SHA256 of `message` under the secret, as lowercase hex
    pub fn sign(&self, message: &str) -> AuthResult<String> {
        self.hmac_hex(message.as_bytes())
    }

    /// Double-hashed signature used for request bodies
    ///
    /// 1. SHA256(message), rendered as lowercase hex
    /// 2. HMAC-SHA256(secret, hex digest text)
    /// 3. Lowercase hex of the MAC
    pub fn sign_digest(&self, message: &str) -> AuthResult<String> {
        let digest = hex::encode(Sha256::digest(message.as_bytes()));
        self.hmac_hex(digest.as_bytes())
    }

    fn hmac_hex(&self, input: &[u8]) -> AuthResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| AuthError::InvalidCredentials(format!("Unusable secret: {}", e)))?;
        mac.update(input);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl Clone for Credentials {
    /// Clone credentials (creates new secret boxes with the same content)
    fn clone(&self) -> Self {
        Self {
            api_key: self.api_key.clone(),
            secret: SecretString::from(self.secret.expose_secret().to_string()),
            public_key: self.public_key.clone(),
            private_key: self
                .private_key
                .as_ref()
                .map(|k| SecretString::from(k.expose_secret().to_string())),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field(
                "api_key",
                &format!("{}...", self.api_key.chars().take(8).collect::<String>()),
            )
            .field("secret", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

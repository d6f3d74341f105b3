//! API credential providers.

use secrecy::{ExposeSecret, SecretString};

/// Environment variable holding the order API key.
pub const DEFAULT_API_KEY_VAR: &str = "SELLASIST_API_KEY";

/// Supplies the order API key on demand.
pub trait CredentialProvider: Send + Sync {
    /// Name of the credential, for error messages.
    fn name(&self) -> &str;

    /// The key, or `None` when it is unset or empty.
    fn api_key(&self) -> Option<SecretString>;
}

/// Reads the key from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::new(DEFAULT_API_KEY_VAR)
    }
}

impl CredentialProvider for EnvCredential {
    fn name(&self) -> &str {
        &self.var
    }

    fn api_key(&self) -> Option<SecretString> {
        std::env::var(&self.var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from)
    }
}

/// A fixed key, set at construction.
pub struct StaticCredential {
    name: String,
    key: Option<SecretString>,
}

impl StaticCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            name: DEFAULT_API_KEY_VAR.to_string(),
            key: Some(SecretString::from(key.into())),
        }
    }

    /// A provider that never has a key.
    pub fn missing() -> Self {
        Self {
            name: DEFAULT_API_KEY_VAR.to_string(),
            key: None,
        }
    }
}

impl std::fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredential")
            .field("name", &self.name)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl CredentialProvider for StaticCredential {
    fn name(&self) -> &str {
        &self.name
    }

    fn api_key(&self) -> Option<SecretString> {
        self.key
            .as_ref()
            .filter(|k| !k.expose_secret().trim().is_empty())
            .cloned()
    }
}

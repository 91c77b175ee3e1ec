//! Access token storage in the OS keychain.
//!
//! Tokens are keyed by instance URL, normalized so `https://GitLab.com/`
//! and `https://gitlab.com` share one entry.

use crate::error::AppError;
use keyring::Entry;

/// Service name used in the keychain.
const SERVICE_NAME: &str = "mr-status";

/// Environment variable that overrides the stored token.
pub const TOKEN_ENV_VAR: &str = "GITLAB_TOKEN";

/// Keychain-backed token store.
#[derive(Debug, Clone)]
pub struct CredentialService {
    service: String,
}

impl Default for CredentialService {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialService {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a different keychain service name.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Store the token for an instance, replacing any previous one.
    pub fn store_token(&self, instance_url: &str, token: &str) -> Result<(), AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::invalid_input_field("Token is empty", "token"));
        }

        self.entry(instance_url)?
            .set_password(token)
            .map_err(|e| AppError::credential_storage(format!("Failed to store token: {}", e)))
    }

    /// The stored token for an instance, if any.
    pub fn get_token(&self, instance_url: &str) -> Result<Option<String>, AppError> {
        match self.entry(instance_url)?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::credential_storage(format!(
                "Failed to retrieve token: {}",
                e
            ))),
        }
    }

    /// Remove the token for an instance. Removing a missing token is not an error.
    pub fn delete_token(&self, instance_url: &str) -> Result<(), AppError> {
        match self.entry(instance_url)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AppError::credential_storage(format!(
                "Failed to delete token: {}",
                e
            ))),
        }
    }

    pub fn has_token(&self, instance_url: &str) -> Result<bool, AppError> {
        Ok(self.get_token(instance_url)?.is_some())
    }

    /// Token to use for an instance: `env_token` if set, else the keychain.
    ///
    /// Fails with `Unauthorized` when neither has one.
    pub fn resolve_token(
        &self,
        instance_url: &str,
        env_token: Option<String>,
    ) -> Result<String, AppError> {
        if let Some(token) = env_token.filter(|t| !t.trim().is_empty()) {
            log::debug!("[credentials] Using token from {}", TOKEN_ENV_VAR);
            return Ok(token.trim().to_string());
        }

        self.get_token(instance_url)?.ok_or(AppError::Unauthorized)
    }

    fn entry(&self, instance_url: &str) -> Result<Entry, AppError> {
        let account = normalize_url(instance_url);
        if account.is_empty() {
            return Err(AppError::invalid_input_field(
                "GitLab URL is required",
                "gitlab_base_url",
            ));
        }

        Entry::new(&self.service, &account).map_err(|e| {
            AppError::credential_storage(format!("Failed to create keyring entry: {}", e))
        })
    }
}

/// Normalize an instance URL for use as the keychain account.
fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_lowercase()
}

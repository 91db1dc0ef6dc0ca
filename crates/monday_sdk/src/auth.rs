//! Session credential providers.
//!
//! The transport uses the credential to authenticate outbound calls; the
//! normalization layer only ever sees a redacted view of it. Reading the
//! token is a pure, idempotent probe with no side effects, so providers may
//! be queried once per request.

use crate::error::{SdkError, SdkResult};
use async_trait::async_trait;

/// Environment variable consulted by [`EnvTokenProvider::default`].
pub const TOKEN_ENV_VAR: &str = "MONDAY_TOKEN";

/// Supplies the current session credential.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Reads the current credential. Failure means "no credential right
    /// now", not a fatal condition; callers degrade gracefully.
    async fn session_token(&self) -> SdkResult<String>;
}

/// A fixed credential, for personal API tokens.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn session_token(&self) -> SdkResult<String> {
        if self.token.is_empty() {
            return Err(SdkError::auth("configured token is empty"));
        }
        Ok(self.token.clone())
    }
}

/// Reads the credential from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new(TOKEN_ENV_VAR)
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn session_token(&self) -> SdkResult<String> {
        std::env::var(&self.var)
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SdkError::auth(format!("{} is not set", self.var)))
    }
}

/// Always fails the probe. Useful when running outside a platform session,
/// where every call is expected to surface as a normalized auth failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

#[async_trait]
impl TokenProvider for NoToken {
    async fn session_token(&self) -> SdkResult<String> {
        Err(SdkError::auth("no session credential available"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticTokenProvider::new("abc123");
        assert_eq!(provider.session_token().await.unwrap(), "abc123");
    }

    #[tokio::test]
    async fn test_static_provider_rejects_empty() {
        let provider = StaticTokenProvider::new("");
        assert!(provider.session_token().await.is_err());
    }

    #[tokio::test]
    async fn test_no_token_always_fails() {
        let err = NoToken.session_token().await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::AuthError);
    }
}

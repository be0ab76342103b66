use std::path::PathBuf;

use chrono::Utc;

use crate::{config, error::SyncError, spotify, types::Token};

/// Refresh this many seconds before the token actually expires.
const EXPIRY_MARGIN_SECS: u64 = 240;

pub struct TokenManager {
    token: Token,
}

impl TokenManager {
    pub fn new(token: Token) -> Self {
        TokenManager { token }
    }

    /// Loads the token stored by `favsync auth`.
    pub async fn load() -> Result<Self, SyncError> {
        let path = Self::token_path();
        let content = async_fs::read_to_string(&path).await.map_err(|e| {
            SyncError::Auth(format!(
                "no stored token at {} ({}). Please run favsync auth",
                path.display(),
                e
            ))
        })?;
        let token: Token = serde_json::from_str(&content).map_err(|e| {
            SyncError::Auth(format!("stored token is unreadable ({e}). Please run favsync auth"))
        })?;
        Ok(Self { token })
    }

    pub async fn persist(&self) -> Result<(), SyncError> {
        let path = Self::token_path();
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.token)
            .map_err(|e| SyncError::Parse(e.to_string()))?;
        async_fs::write(path, json).await?;
        Ok(())
    }

    /// Returns an access token, refreshing and persisting it first if it is about
    /// to expire.
    pub async fn get_valid_token(&mut self) -> Result<String, SyncError> {
        if self.is_expired_at(Utc::now().timestamp() as u64) {
            let refreshed = spotify::auth::refresh_token(&self.token.refresh_token).await?;
            self.token = refreshed;
            if let Err(e) = self.persist().await {
                crate::warning!("Failed to save refreshed token: {}", e);
            }
        }

        Ok(self.token.access_token.clone())
    }

    fn is_expired_at(&self, now: u64) -> bool {
        let expires_at = self.token.obtained_at + self.token.expires_in;
        now >= expires_at.saturating_sub(EXPIRY_MARGIN_SECS)
    }

    fn token_path() -> PathBuf {
        config::data_dir().join("cache").join("token.json")
    }

    /// Whether the stored token was granted `scope`.
    ///
    /// Tokens without a recorded scope are assumed to grant everything; the API
    /// rejects the request if they do not.
    pub fn grants(&self, scope: &str) -> bool {
        let granted = self.token.scope.trim();
        granted.is_empty() || granted.split_whitespace().any(|s| s == scope)
    }
}

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::Client;
use tokio::sync::Mutex;

use crate::{
    config,
    error::SyncError,
    management::TokenManager,
    server::start_api_server,
    success,
    types::{PkceToken, Token, TokenResponse},
    utils, warning,
};

/// How long `favsync auth` waits for the browser to hit the callback.
const AUTH_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs the complete OAuth 2.0 PKCE flow for `scope` and stores the resulting
/// token.
///
/// 1. Generates a PKCE code verifier and its SHA256 challenge
/// 2. Starts the local callback server
/// 3. Opens the Spotify authorization URL in the browser
/// 4. Waits for the callback to exchange the code for a token
/// 5. Persists the token for later `favsync sync` runs
///
/// # Errors
///
/// [`SyncError::Config`] when the client ID is missing, [`SyncError::Auth`] when
/// no token arrives in time, and IO errors from persisting the token.
pub async fn auth(
    shared_state: Arc<Mutex<Option<PkceToken>>>,
    scope: &str,
) -> Result<(), SyncError> {
    let client_id = config::spotify_client_id()?;
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);

    let server_state = Arc::clone(&shared_state);
    tokio::spawn(async move {
        if let Err(e) = start_api_server(server_state).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    let auth_url = format!(
        "{spotify_auth_url}?client_id={client_id}&response_type=code&redirect_uri={redirect_uri}&code_challenge={code_challenge}&code_challenge_method=S256&scope={scope}",
        spotify_auth_url = &config::spotify_apiauth_url(),
        client_id = client_id,
        redirect_uri = &config::spotify_redirect_uri(),
        code_challenge = code_challenge,
        scope = scope.replace(' ', "%20"),
    );

    // the verifier must be in place before the browser can call back
    {
        let mut lock = shared_state.lock().await;
        *lock = Some(PkceToken {
            code_verifier,
            token: None,
        });
    }

    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let token = wait_for_token(shared_state, AUTH_TIMEOUT)
        .await
        .ok_or_else(|| SyncError::Auth("authentication failed or timed out".to_string()))?;

    TokenManager::new(token).persist().await?;
    success!("Authentication successful!");
    Ok(())
}

/// Polls the shared state once per second until the callback stored a token or
/// `max_wait` has passed.
async fn wait_for_token(
    shared_state: Arc<Mutex<Option<PkceToken>>>,
    max_wait: Duration,
) -> Option<Token> {
    use std::time::Instant;

    let start = Instant::now();

    while start.elapsed() < max_wait {
        let lock = shared_state.lock().await;
        if let Some(token) = lock.as_ref().and_then(|pkce| pkce.token.as_ref()) {
            return Some(token.clone());
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

/// Exchanges a refresh token for a new access token.
///
/// # Errors
///
/// Any failure is an [`SyncError::Auth`]: without a valid token nothing else can
/// run.
pub async fn refresh_token(refresh_token: &str) -> Result<Token, SyncError> {
    let client_id = config::spotify_client_id()?;
    let client = Client::new();
    let res = client
        .post(config::spotify_apitoken_url())
        .timeout(config::http_timeout())
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id.as_str()),
        ])
        .send()
        .await
        .map_err(|e| SyncError::Auth(format!("token refresh failed: {e}")))?;

    let response = read_token_response(res).await?;
    Ok(Token::from_response(
        response,
        Some(refresh_token),
        Utc::now().timestamp() as u64,
    ))
}

/// Exchanges the authorization code received by the callback for a token.
///
/// `verifier` must be the verifier whose challenge was sent in the authorization
/// request.
pub async fn exchange_code_pkce(code: &str, verifier: &str) -> Result<Token, SyncError> {
    let client_id = config::spotify_client_id()?;
    let redirect_uri = config::spotify_redirect_uri();

    let client = Client::new();
    let res = client
        .post(config::spotify_apitoken_url())
        .timeout(config::http_timeout())
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| SyncError::Auth(format!("code exchange failed: {e}")))?;

    let response = read_token_response(res).await?;
    Ok(Token::from_response(
        response,
        None,
        Utc::now().timestamp() as u64,
    ))
}

async fn read_token_response(res: reqwest::Response) -> Result<TokenResponse, SyncError> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(SyncError::Auth(format!(
            "token endpoint answered {}: {}",
            status.as_u16(),
            body.trim()
        )));
    }

    res.json::<TokenResponse>()
        .await
        .map_err(|e| SyncError::Auth(format!("unexpected token response: {e}")))
}

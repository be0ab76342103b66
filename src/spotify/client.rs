use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::{
    config,
    error::SyncError,
    management::TokenManager,
    retry::{RetryConfig, retry_with_backoff},
    spotify::LibraryClient,
    trace,
    types::{
        AlbumTrack, LikedAlbum, Page, Paging, SaveTracksRequest, SavedAlbum, Track, TrackId,
    },
};

/// [`LibraryClient`] backed by the Spotify Web API.
///
/// Every request gets a fresh (refreshed if needed) access token, the configured
/// timeout and the retry policy.
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    token_mgr: Mutex<TokenManager>,
    retry: RetryConfig,
}

impl SpotifyClient {
    /// Creates a client from the stored token.
    ///
    /// # Errors
    ///
    /// [`SyncError::Auth`] when no token has been stored yet.
    pub async fn from_cache() -> Result<Self, SyncError> {
        let token_mgr = TokenManager::load().await?;
        Self::new(
            token_mgr,
            config::spotify_apiurl(),
            RetryConfig::default(),
            config::http_timeout(),
        )
    }

    pub fn new(
        token_mgr: TokenManager,
        api_url: String,
        retry: RetryConfig,
        timeout: Duration,
    ) -> Result<Self, SyncError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token_mgr: Mutex::new(token_mgr),
            retry,
        })
    }

    /// Whether the stored token may like tracks.
    pub async fn can_modify_library(&self) -> bool {
        self.token_mgr.lock().await.grants(config::MODIFY_SCOPE)
    }

    /// Sends one attempt of the request produced by `build`.
    async fn execute<F>(&self, build: &F) -> Result<Response, SyncError>
    where
        F: Fn(&Client) -> RequestBuilder + Sync,
    {
        let token = self.token_mgr.lock().await.get_valid_token().await?;
        let response = build(&self.http).bearer_auth(token).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::from_status(status, retry_after, body))
    }

    /// Sends the request produced by `build` and decodes the JSON body, retrying
    /// transient failures of either step.
    ///
    /// `build` is called once per attempt, since a request builder is consumed on
    /// send.
    async fn get_json<T, F>(&self, operation: &str, build: F) -> Result<T, SyncError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder + Sync,
    {
        let build = &build;
        retry_with_backoff(&self.retry, operation, move || async move {
            let response = self.execute(build).await?;
            Ok(response.json::<T>().await?)
        })
        .await
    }

    /// Like [`Self::get_json`] for requests whose response body is not needed.
    async fn send_write<F>(&self, operation: &str, build: F) -> Result<(), SyncError>
    where
        F: Fn(&Client) -> RequestBuilder + Sync,
    {
        let build = &build;
        retry_with_backoff(&self.retry, operation, move || async move {
            self.execute(build).await?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl LibraryClient for SpotifyClient {
    async fn saved_albums_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Page<LikedAlbum>, SyncError> {
        let api_url = format!(
            "{uri}/me/albums?limit={limit}&offset={offset}",
            uri = self.api_url,
        );
        trace!("GET {}", api_url);

        let paging: Paging<SavedAlbum> = self
            .get_json("saved albums", |http| http.get(&api_url))
            .await?;
        let next = paging.next_offset();

        Ok(Page {
            items: paging
                .items
                .into_iter()
                .map(|saved| LikedAlbum::from(saved.album))
                .collect(),
            next,
            total: paging.total,
        })
    }

    async fn album_tracks_page(
        &self,
        album_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<AlbumTrack>, SyncError> {
        let api_url = format!(
            "{uri}/albums/{id}/tracks?limit={limit}&offset={offset}",
            uri = self.api_url,
            id = album_id,
        );
        trace!("GET {}", api_url);

        let paging: Paging<Track> = self
            .get_json("album tracks", |http| http.get(&api_url))
            .await?;
        let next = paging.next_offset();

        // Tracks without an ID are dropped, so the reported total no longer
        // matches the item count.
        Ok(Page {
            items: paging
                .items
                .into_iter()
                .filter_map(AlbumTrack::from_track)
                .collect(),
            next,
            total: None,
        })
    }

    async fn contains_saved_tracks(&self, ids: &[TrackId]) -> Result<Vec<bool>, SyncError> {
        let api_url = format!(
            "{uri}/me/tracks/contains?ids={ids}",
            uri = self.api_url,
            ids = ids.join(","),
        );
        trace!("GET {}", api_url);

        self.get_json("liked status", |http| http.get(&api_url))
            .await
    }

    async fn save_tracks(&self, ids: &[TrackId]) -> Result<(), SyncError> {
        let api_url = format!("{uri}/me/tracks", uri = self.api_url);
        let body = SaveTracksRequest { ids: ids.to_vec() };
        trace!("PUT {} ({} ids)", api_url, ids.len());

        self.send_write("like tracks", |http| http.put(&api_url).json(&body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use chrono::Utc;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;
    use crate::types::Token;

    fn fresh_token() -> TokenManager {
        TokenManager::new(Token {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            scope: "user-library-read".to_string(),
            expires_in: 3_600,
            obtained_at: Utc::now().timestamp() as u64,
        })
    }

    /// Serves `[true,false]`, except that the first connection stalls after half
    /// of the body.
    async fn stalling_server(connections: Arc<AtomicU32>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let attempt = connections.fetch_add(1, Ordering::SeqCst);

                tokio::spawn(async move {
                    let mut request = [0_u8; 4096];
                    let _ = socket.read(&mut request).await;

                    let body = "[true,false]";
                    let head = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                        body.len()
                    );
                    if attempt == 0 {
                        let _ = socket.write_all(format!("{head}[tr").as_bytes()).await;
                        tokio::time::sleep(Duration::from_secs(10)).await;
                    } else {
                        let _ = socket.write_all(format!("{head}{body}").as_bytes()).await;
                    }
                });
            }
        });

        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_stalled_body_is_retried() {
        let connections = Arc::new(AtomicU32::new(0));
        let api_url = stalling_server(connections.clone()).await;

        let client = SpotifyClient::new(
            fresh_token(),
            api_url,
            RetryConfig::immediate(3),
            Duration::from_millis(500),
        )
        .unwrap();

        let statuses = client
            .contains_saved_tracks(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(statuses, vec![true, false]);
        assert_eq!(connections.load(Ordering::SeqCst), 2);
    }
}

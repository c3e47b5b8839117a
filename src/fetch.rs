//!
//! src/fetch.rs  Andrew Belles  Oct 19th, 2026
//!
//! Spotify side of the sync: client-credentials auth and paged retrieval
//! of every track in a playlist
//!

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header, redirect};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::{HttpConfig, SpotifyConfig};
use crate::errors::{SyncError, status_error};
use crate::types::{PlaylistPage, Track};

/// Largest page the playlist items endpoint serves
pub const PAGE_LIMIT: u32 = 50;

/// Client building functionality
fn client_helper(http: &HttpConfig) -> reqwest::ClientBuilder  {
    Client::builder()
        .timeout(http.timeout)
        .connect_timeout(http.connect_timeout)
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .pool_idle_timeout(Some(http.pool_idle_timeout))
        .redirect(redirect::Policy::limited(http.max_redirects as usize))
}

pub fn base_client(http: &HttpConfig) -> Result<Client, SyncError> {
    let mut h = header::HeaderMap::new();
    h.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    client_helper(http)
        .default_headers(h)
        .build()
        .map_err(|e| SyncError::Http(format!("build client: {e}")))
}

/// Anything that can hand back one playlist page for a page url
#[async_trait]
pub trait PageFetch {
    async fn fetch_page(&self, url: &Url) -> Result<PlaylistPage, SyncError>;
}

///
/// Walks a playlist one page at a time by following each page's `next`
/// link. Yields every page exactly once; once exhausted it stays exhausted.
///
#[derive(Debug)]
pub struct PageCursor {
    next: Option<Url>,
    pages: usize,
}

impl PageCursor {
    pub fn new(first: Url) -> Self {
        Self { next: Some(first), pages: 0 }
    }

    pub fn pages_read(&self) -> usize { self.pages }

    pub async fn next_page<F>(&mut self, fetcher: &F) -> Result<Option<PlaylistPage>, SyncError>
    where
        F: PageFetch + ?Sized,
    {
        let Some(url) = self.next.take() else {
            return Ok(None);
        };
        let page = fetcher.fetch_page(&url).await?;
        self.next = match page.next.as_deref() {
            Some(link) => Some(Url::parse(link).map_err(|e| {
                SyncError::Parse(format!("bad next link {link}: {e}"))
            })?),
            None => None,
        };
        self.pages += 1;
        debug!(page = self.pages, items = page.items.len(), "spotify.page");
        Ok(Some(page))
    }
}

/// Drains a cursor, keeping playable tracks in playlist order
pub async fn collect_tracks<F>(fetcher: &F, first: Url) -> Result<Vec<Track>, SyncError>
where
    F: PageFetch + ?Sized,
{
    let mut cursor = PageCursor::new(first);
    let mut tracks = Vec::new();
    while let Some(page) = cursor.next_page(fetcher).await? {
        tracks.extend(page.tracks());
    }
    info!(count = tracks.len(), pages = cursor.pages_read(), "spotify.fetched");
    Ok(tracks)
}

/// Where the tracks to sync come from
#[async_trait]
pub trait PlaylistSource {
    async fn authenticate(&mut self) -> Result<(), SyncError>;
    async fn fetch_all_tracks(&self, playlist_id: &str) -> Result<Vec<Track>, SyncError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Clone, Debug)]
pub struct SpotifyClient {
    pub http: Client,
    pub cfg: SpotifyConfig,
    bearer: Option<String>,
}

impl SpotifyClient {
    pub fn new(http_config: &HttpConfig, cfg: &SpotifyConfig) -> Result<Self, SyncError> {
        let http = base_client(http_config)?;
        Ok( Self {
            http,
            cfg: cfg.clone(),
            bearer: None,
        })
    }

    pub fn token_request(&self) -> reqwest::RequestBuilder {
        self.http
            .post(self.cfg.token_url.clone())
            .basic_auth(&self.cfg.client_id, Some(&self.cfg.client_secret))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
    }

    /// GET /v1/playlists/{id}/tracks?limit=50
    pub fn playlist_tracks_url(&self, playlist_id: &str) -> Result<Url, SyncError> {
        let mut url = self.cfg.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::Config("SPOTIFY_API_BASE cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["playlists", playlist_id, "tracks"]);
        url.query_pairs_mut().append_pair("limit", &PAGE_LIMIT.to_string());
        Ok(url)
    }

    fn bearer(&self) -> Result<&str, SyncError> {
        self.bearer
            .as_deref()
            .ok_or_else(|| SyncError::Auth("spotify client used before authenticate".to_string()))
    }
}

/// Page fetcher bound to one playlist so a 404 can name it
struct PlaylistPages<'a> {
    client: &'a SpotifyClient,
    playlist_id: &'a str,
}

#[async_trait]
impl PageFetch for PlaylistPages<'_> {
    async fn fetch_page(&self, url: &Url) -> Result<PlaylistPage, SyncError> {
        let resp = self.client.http
            .get(url.clone())
            .bearer_auth(self.client.bearer()?)
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(resp.json::<PlaylistPage>().await?),
            StatusCode::NOT_FOUND => Err(SyncError::PlaylistNotFound(self.playlist_id.to_string())),
            _ => Err(status_error("spotify", resp).await),
        }
    }
}

#[async_trait]
impl PlaylistSource for SpotifyClient {
    #[instrument(skip(self))]
    async fn authenticate(&mut self) -> Result<(), SyncError> {
        let resp = self.token_request().send().await?;
        if !resp.status().is_success() {
            return Err(status_error("spotify", resp).await);
        }
        let token: TokenResponse = resp.json().await?;
        self.bearer = Some(token.access_token);
        info!("spotify.connected");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_all_tracks(&self, playlist_id: &str) -> Result<Vec<Track>, SyncError> {
        let first = self.playlist_tracks_url(playlist_id)?;
        let pages = PlaylistPages { client: self, playlist_id };
        collect_tracks(&pages, first).await
    }
}

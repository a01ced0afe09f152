//! API clients for Plex.
//!
//! This module provides two API clients:
//! - [`PlexAccount`]: plex.tv account API for discovering server resources
//! - [`PlexServer`]: a connected media server session

pub mod account;
pub mod server;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::error;
use url::Url;

use crate::error::{PlexportError, Result};
use crate::models::{Playlist, Track};

pub use account::{Connection, PlexAccount, Resource};
pub use server::PlexServer;

/// Product name sent with every Plex request.
pub const PRODUCT: &str = "plexport";

/// Client identifier sent with every Plex request.
pub const CLIENT_IDENTIFIER: &str = concat!("plexport-", env!("CARGO_PKG_VERSION"));

/// Header carrying the access token.
pub const TOKEN_HEADER: &str = "X-Plex-Token";

/// The narrow set of remote capabilities an export needs.
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Resolve a playlist by name, including its ordered tracks.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistNotFound` if no playlist carries that name.
    async fn playlist(&self, name: &str) -> Result<Playlist>;

    /// Signed URL serving the raw bytes of the track's first media part.
    fn download_url(&self, track: &Track) -> Result<Url>;
}

/// Build the HTTP client used for Plex metadata requests.
pub fn plex_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert("X-Plex-Product", HeaderValue::from_static(PRODUCT));
    headers.insert(
        "X-Plex-Version",
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    headers.insert(
        "X-Plex-Client-Identifier",
        HeaderValue::from_static(CLIENT_IDENTIFIER),
    );

    let client = Client::builder().default_headers(headers).build()?;
    Ok(client)
}

/// Check the status of a Plex response and decode its JSON body.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let url = response.url().path().to_string();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(PlexportError::BadCredentials(format!(
            "{} rejected the token",
            url
        )));
    }
    if !status.is_success() {
        return Err(PlexportError::ApiError(format!(
            "{} returned status {}",
            url, status
        )));
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        let preview: String = text.chars().take(500).collect();
        error!(
            "Failed to parse Plex response from {} (status {}): {}",
            url, status, preview
        );
        PlexportError::ParseError(e)
    })
}

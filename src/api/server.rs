//! Plex media server session.
//!
//! A [`PlexServer`] is an authenticated handle on one server: a base URL
//! plus the token every request carries. It is created once per run and
//! serves every playlist lookup.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{decode_json, PlaylistSource, TOKEN_HEADER};
use crate::error::{PlexportError, Result};
use crate::models::{Envelope, Playlist, PlaylistSummary, Track};

/// Server identity as reported by `/identity`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Unique machine identifier of the server.
    #[serde(default)]
    pub machine_identifier: Option<String>,
}

#[derive(Deserialize)]
struct IdentityEnvelope {
    #[serde(rename = "MediaContainer")]
    media_container: Identity,
}

/// Connected Plex media server.
///
/// # Example
///
/// ```rust,no_run
/// use plexport::api::{plex_client, PlexServer};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = PlexServer::connect(plex_client()?, "http://127.0.0.1:32400", "token").await?;
///     let playlist = server.playlist_by_title("Road Trip").await?;
///     println!("{} tracks", playlist.track_count());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PlexServer {
    client: Client,
    base_url: Url,
    token: String,
    identity: Identity,
}

impl PlexServer {
    /// Connect directly to a server at `address` using `token`.
    ///
    /// The connection is verified with a single `/identity` request.
    pub async fn connect(client: Client, address: &str, token: &str) -> Result<Self> {
        let base_url = Url::parse(address)?;

        let mut server = Self {
            client,
            base_url,
            token: token.to_string(),
            identity: Identity::default(),
        };
        server.identity = server.fetch_identity().await?;

        Ok(server)
    }

    /// Server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Token used for requests and signed URLs.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Identity reported when the session was established.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.base_url.join(key)?;
        debug!("GET {} with params: {:?}", url, params);

        let response = self
            .client
            .get(url)
            .query(params)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await?;

        decode_json(response).await
    }

    async fn fetch_identity(&self) -> Result<Identity> {
        let envelope: IdentityEnvelope = self.get("/identity", &[]).await?;
        Ok(envelope.media_container)
    }

    /// List playlists of every type, optionally filtered by title on the
    /// server.
    pub async fn playlists(&self, title: Option<&str>) -> Result<Vec<PlaylistSummary>> {
        let params: Vec<(&str, &str)> = title.map(|t| ("title", t)).into_iter().collect();

        let envelope: Envelope<PlaylistSummary> = self.get("/playlists", &params).await?;
        Ok(envelope.into_metadata())
    }

    /// Get the tracks of a playlist in order.
    pub async fn playlist_items(&self, summary: &PlaylistSummary) -> Result<Vec<Track>> {
        let envelope: Envelope<Track> = self.get(&summary.key, &[]).await?;
        Ok(envelope.into_metadata())
    }

    /// Find a playlist by title and fetch its tracks.
    ///
    /// The server filters by title; the result is then narrowed to an exact,
    /// case-insensitive match.
    pub async fn playlist_by_title(&self, title: &str) -> Result<Playlist> {
        let wanted = title.to_lowercase();
        let summary = self
            .playlists(Some(title))
            .await?
            .into_iter()
            .find(|p| p.title.to_lowercase() == wanted)
            .ok_or_else(|| PlexportError::PlaylistNotFound(title.to_string()))?;

        let tracks = self.playlist_items(&summary).await?;

        Ok(Playlist {
            title: summary.title,
            tracks,
        })
    }

    /// Signed download URL for a track's first media part.
    pub fn track_download_url(&self, track: &Track) -> Result<Url> {
        let part = track.first_part()?;
        let mut url = self.base_url.join(&part.key)?;
        url.query_pairs_mut()
            .append_pair("download", "1")
            .append_pair(TOKEN_HEADER, &self.token);
        Ok(url)
    }
}

#[async_trait]
impl PlaylistSource for PlexServer {
    async fn playlist(&self, name: &str) -> Result<Playlist> {
        self.playlist_by_title(name).await
    }

    fn download_url(&self, track: &Track) -> Result<Url> {
        self.track_download_url(track)
    }
}

/// Fetch the raw root response of a server.
///
/// Informational only; the body is returned unparsed.
pub async fn probe(client: &Client, address: &str, token: &str) -> Result<String> {
    let response = client
        .get(address)
        .header(TOKEN_HEADER, token)
        .send()
        .await?;
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::plex_client;
    use crate::models::{Media, Part};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_identity(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/identity"))
            .and(header(TOKEN_HEADER, "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MediaContainer": {"size": 0, "machineIdentifier": "m1"}
            })))
            .mount(server)
            .await;
    }

    async fn connected(mock: &MockServer) -> PlexServer {
        mount_identity(mock).await;
        PlexServer::connect(plex_client().unwrap(), &mock.uri(), "tok")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_connect_reads_identity() {
        let mock = MockServer::start().await;
        let server = connected(&mock).await;
        assert_eq!(server.identity().machine_identifier.as_deref(), Some("m1"));
        assert_eq!(server.token(), "tok");
    }

    #[tokio::test]
    async fn test_connect_bad_token() {
        let mock = MockServer::start().await;
        Mock::given(path("/identity"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock)
            .await;

        let err = PlexServer::connect(plex_client().unwrap(), &mock.uri(), "bad")
            .await
            .unwrap_err();
        assert!(matches!(err, PlexportError::BadCredentials(_)));
    }

    #[tokio::test]
    async fn test_playlist_by_title() {
        let mock = MockServer::start().await;
        let server = connected(&mock).await;

        Mock::given(method("GET"))
            .and(path("/playlists"))
            .and(query_param("title", "road trip"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MediaContainer": {"size": 2, "Metadata": [
                    {"ratingKey": "7", "key": "/playlists/7/items", "title": "Road Trip Extended"},
                    {"ratingKey": "8", "key": "/playlists/8/items", "title": "Road Trip"}
                ]}
            })))
            .mount(&mock)
            .await;
        Mock::given(method("GET"))
            .and(path("/playlists/8/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MediaContainer": {"size": 2, "Metadata": [
                    {"title": "One", "Media": [{"Part": [{"key": "/library/parts/1/1/file.mp3", "container": "mp3"}]}]},
                    {"title": "Two", "Media": [{"Part": [{"key": "/library/parts/2/1/file.flac", "container": "flac"}]}]}
                ]}
            })))
            .mount(&mock)
            .await;

        let playlist = server.playlist("road trip").await.unwrap();
        assert_eq!(playlist.title, "Road Trip");
        assert_eq!(playlist.track_count(), 2);
        assert_eq!(playlist.tracks[1].title, "Two");
    }

    #[tokio::test]
    async fn test_playlist_not_found() {
        let mock = MockServer::start().await;
        let server = connected(&mock).await;

        Mock::given(path("/playlists"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"MediaContainer": {"size": 0}})),
            )
            .mount(&mock)
            .await;

        let err = server.playlist("Missing").await.unwrap_err();
        assert!(matches!(err, PlexportError::PlaylistNotFound(name) if name == "Missing"));
    }

    #[tokio::test]
    async fn test_playlist_of_any_type_is_found() {
        let mock = MockServer::start().await;
        let server = connected(&mock).await;

        Mock::given(method("GET"))
            .and(path("/playlists"))
            .and(query_param("title", "Movies"))
            .and(query_param_is_missing("playlistType"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MediaContainer": {"size": 1, "Metadata": [
                    {"key": "/playlists/9/items", "title": "Movies", "playlistType": "video"}
                ]}
            })))
            .mount(&mock)
            .await;
        Mock::given(method("GET"))
            .and(path("/playlists/9/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MediaContainer": {"size": 1, "Metadata": [
                    {"title": "Film", "Media": [{"container": "mkv", "Part": [{"key": "/library/parts/3/1/file.mkv"}]}]}
                ]}
            })))
            .mount(&mock)
            .await;

        let playlist = server.playlist("Movies").await.unwrap();
        assert_eq!(playlist.title, "Movies");
        assert_eq!(playlist.tracks[0].container().unwrap(), "mkv");
    }

    #[tokio::test]
    async fn test_download_url_is_signed() {
        let mock = MockServer::start().await;
        let server = connected(&mock).await;

        let track = Track {
            title: "Song".to_string(),
            media: vec![Media {
                container: None,
                parts: vec![Part {
                    key: "/library/parts/5/160/file.mp3".to_string(),
                    container: None,
                }],
            }],
        };

        let url = server.download_url(&track).unwrap();
        assert_eq!(url.path(), "/library/parts/5/160/file.mp3");
        assert_eq!(url.query(), Some("download=1&X-Plex-Token=tok"));
        assert!(url.as_str().starts_with(&mock.uri()));
    }

    #[tokio::test]
    async fn test_probe_returns_raw_text() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header(TOKEN_HEADER, "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<MediaContainer/>"))
            .mount(&mock)
            .await;

        let text = probe(&plex_client().unwrap(), &mock.uri(), "tok").await.unwrap();
        assert_eq!(text, "<MediaContainer/>");
    }
}

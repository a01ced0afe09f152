//! Playlist-related models.

use serde::Deserialize;

use super::track::Track;

/// Playlist entry as listed by `/playlists`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PlaylistSummary {
    /// Items path, e.g. `/playlists/42/items`.
    pub key: String,

    /// Playlist title.
    pub title: String,
}

/// A resolved playlist with its ordered tracks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playlist {
    /// Playlist title as stored on the server.
    pub title: String,

    /// Tracks in playlist order.
    pub tracks: Vec<Track>,
}

impl Playlist {
    /// Get the number of tracks.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

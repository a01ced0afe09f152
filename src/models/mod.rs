//! Data models for Plex API responses.
//!
//! This module contains the data structures used to represent
//! playlists, tracks, and their media parts.

pub mod playlist;
pub mod track;

use serde::Deserialize;

// Re-exports for convenience
pub use playlist::{Playlist, PlaylistSummary};
pub use track::{Media, Part, Track};

/// Envelope wrapping every Plex server response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: MediaContainer<T>,
}

/// Plex `MediaContainer` payload.
///
/// `Metadata` is omitted by the server when the container is empty.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaContainer<T> {
    #[serde(rename = "Metadata", default = "Vec::new")]
    pub metadata: Vec<T>,
}

impl<T> Envelope<T> {
    /// Unwrap the metadata entries.
    pub fn into_metadata(self) -> Vec<T> {
        self.media_container.metadata
    }
}

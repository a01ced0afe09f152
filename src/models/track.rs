//! Track-related models.
//!
//! A Plex track carries one or more alternate encodings (`Media`), each
//! split into one or more file parts (`Part`). Export only ever looks at
//! the first of each.

use serde::Deserialize;

use crate::error::{PlexportError, Result};

/// A single file part of a media item.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Part {
    /// Server-relative resource key, e.g. `/library/parts/1/1600000/file.mp3`.
    #[serde(default)]
    pub key: String,

    /// File-format extension of this part.
    #[serde(default)]
    pub container: Option<String>,
}

/// One encoding of a track.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Media {
    /// Container of the encoding as a whole.
    #[serde(default)]
    pub container: Option<String>,

    /// File parts.
    #[serde(rename = "Part", default)]
    pub parts: Vec<Part>,
}

/// A track entry of a playlist.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Track {
    /// Track title.
    #[serde(default)]
    pub title: String,

    /// Alternate encodings.
    #[serde(rename = "Media", default)]
    pub media: Vec<Media>,
}

impl Track {
    /// First part of the first media entry.
    ///
    /// # Errors
    ///
    /// Returns `MissingMedia` if the track has no media, the first media
    /// has no parts, or the first part has no key.
    pub fn first_part(&self) -> Result<&Part> {
        self.media
            .first()
            .and_then(|m| m.parts.first())
            .filter(|p| !p.key.is_empty())
            .ok_or_else(|| PlexportError::MissingMedia(self.title.clone()))
    }

    /// Container extension of the first part, falling back to the
    /// media container.
    pub fn container(&self) -> Result<&str> {
        let part = self.first_part()?;
        part.container
            .as_deref()
            .or_else(|| self.media[0].container.as_deref())
            .ok_or_else(|| PlexportError::MissingMedia(self.title.clone()))
    }
}

//! Playlist export.
//!
//! Resolves a playlist through a [`PlaylistSource`] and writes each of its
//! tracks to `<output_dir>/<playlist>/<title>.<container>`.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::{Client, Response};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use crate::api::PlaylistSource;
use crate::error::{PlexportError, Result};
use crate::models::Track;

/// Result of a single track export.
#[derive(Debug)]
pub struct ExportResult {
    /// Path to the written file.
    pub path: PathBuf,
    /// Bytes written.
    pub size: u64,
    /// Track title.
    pub title: String,
}

/// Result of exporting a whole playlist.
#[derive(Debug)]
pub struct BatchExportResult {
    /// Playlist name as requested.
    pub name: String,
    /// Output directory.
    pub directory: PathBuf,
    /// Successfully exported tracks.
    pub successful: Vec<ExportResult>,
    /// Failed track titles with error messages.
    pub failed: Vec<(String, String)>,
}

impl BatchExportResult {
    /// Total number of tracks attempted.
    pub fn total(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    /// Check if all tracks were exported successfully.
    pub fn all_successful(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Writes playlists from a source to local storage.
#[derive(Debug)]
pub struct Exporter<S> {
    source: S,
    http: Client,
    output_dir: PathBuf,
}

impl<S: PlaylistSource> Exporter<S> {
    /// Create an exporter writing below `output_dir`.
    ///
    /// Downloads use a plain client: signed URLs carry their own token.
    pub fn new<P: AsRef<Path>>(source: S, output_dir: P) -> Self {
        Self {
            source,
            http: Client::new(),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Export every track of the playlist called `name`.
    ///
    /// A track that fails is logged and recorded in
    /// [`BatchExportResult::failed`]; the remaining tracks are still
    /// exported.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistNotFound` if the playlist cannot be resolved, in
    /// which case nothing is written.
    pub async fn export_playlist(&self, name: &str) -> Result<BatchExportResult> {
        let playlist = self.source.playlist(name).await?;
        info!(
            "Resolved playlist '{}' ({} tracks)",
            playlist.title,
            playlist.track_count()
        );

        let playlist_dir = self.output_dir.join(sanitize_filename(name));
        fs::create_dir_all(&playlist_dir).await?;

        let mut result = BatchExportResult {
            name: name.to_string(),
            directory: playlist_dir.clone(),
            successful: Vec::new(),
            failed: Vec::new(),
        };

        for track in &playlist.tracks {
            match self.export_track(track, &playlist_dir).await {
                Ok(exported) => {
                    info!("Downloaded: {}", exported.path.display());
                    result.successful.push(exported);
                }
                Err(e) => {
                    error!("Error downloading track '{}': {}", track.title, e);
                    result.failed.push((track.title.clone(), e.to_string()));
                }
            }
        }

        Ok(result)
    }

    /// Download one track into `dir`, overwriting any existing file.
    ///
    /// The body is streamed into `<filename>.part` and renamed over the
    /// target once complete. On failure the partial file is removed and any
    /// previous export of the track is left untouched.
    pub async fn export_track(&self, track: &Track, dir: &Path) -> Result<ExportResult> {
        let filename = track_filename(track)?;
        let output_path = dir.join(&filename);

        let url = self.source.download_url(track)?;
        debug!("GET {}", url.path());

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PlexportError::DownloadFailed {
                status,
                url: url.path().to_string(),
            });
        }

        let partial_path = dir.join(format!("{}.part", filename));
        let written = match write_body(response, &partial_path).await {
            Ok(size) => fs::rename(&partial_path, &output_path)
                .await
                .map(|_| size)
                .map_err(PlexportError::from),
            Err(e) => Err(e),
        };
        if written.is_err() {
            let _ = fs::remove_file(&partial_path).await;
        }
        let size = written?;

        Ok(ExportResult {
            path: output_path,
            size,
            title: track.title.clone(),
        })
    }
}

async fn write_body(response: Response, path: &Path) -> Result<u64> {
    let mut file = File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut size = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk: Bytes = chunk?;
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(size)
}

/// File name for a track: sanitized title plus the first part's container.
pub fn track_filename(track: &Track) -> Result<String> {
    let container = track.container()?;
    Ok(format!("{}.{}", sanitize_filename(&track.title), container))
}

/// Sanitize a string for use as a single path component.
///
/// Path separators and reserved characters become `_`, control characters
/// are dropped. Names that end up empty or made only of dots map to `_`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

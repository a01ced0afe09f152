//! Run orchestration.
//!
//! Loads the configuration, connects, then exports each playlist named in
//! `playlists.txt` in file order. A playlist that cannot be resolved is
//! logged and skipped; it never stops the run.

use std::fs;
use std::path::Path;

use tracing::{error, info, warn};

use crate::api::account::PLEX_TV_URL;
use crate::api::PlaylistSource;
use crate::config::Config;
use crate::connector::{ConnectMethod, Connector};
use crate::error::Result;
use crate::exporter::{BatchExportResult, Exporter};

/// Options that shape a run but are not part of the configuration file.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Log the raw root response of the server before connecting.
    pub probe: bool,
    /// plex.tv endpoint used for account discovery.
    pub account_url: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            probe: false,
            account_url: PLEX_TV_URL.to_string(),
        }
    }
}

/// Outcome of a full run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// How the session was established.
    pub method: Option<ConnectMethod>,
    /// Playlists that were resolved, in input order.
    pub exported: Vec<BatchExportResult>,
    /// Playlists that could not be resolved, with the error message.
    pub skipped: Vec<(String, String)>,
}

impl RunSummary {
    /// Number of files written.
    pub fn files_written(&self) -> usize {
        self.exported.iter().map(|p| p.successful.len()).sum()
    }

    /// Number of tracks that failed.
    pub fn tracks_failed(&self) -> usize {
        self.exported.iter().map(|p| p.failed.len()).sum()
    }
}

/// Read playlist names, one per line.
///
/// Names are used as-is: no trimming, no deduplication, blank lines kept.
pub fn read_playlist_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Execute a full export run.
///
/// # Errors
///
/// Fails on configuration errors, when neither connection strategy
/// succeeds, or when the playlist list cannot be read.
pub async fn run(config_path: &Path, options: &RunOptions) -> Result<RunSummary> {
    let config = Config::load(config_path)?;

    info!("Connecting to Plex server at {}", config.plex_url);
    let connector = Connector::new()?.with_account_url(options.account_url.clone());

    if options.probe {
        match connector.probe(&config.plex_url, &config.plex_token).await {
            Ok(raw) => info!("Raw server response:\n{}", raw),
            Err(e) => warn!("Probe request failed: {}", e),
        }
    }

    let session = connector
        .connect(&config.plex_url, &config.plex_token)
        .await?;

    let names = read_playlist_names(config.playlists_file())?;
    let exporter = Exporter::new(session.server, &config.output_dir);

    let mut summary = export_all(&exporter, &names).await;
    summary.method = Some(session.method);
    Ok(summary)
}

/// Export each named playlist in order.
pub async fn export_all<S: PlaylistSource>(
    exporter: &Exporter<S>,
    names: &[String],
) -> RunSummary {
    let mut summary = RunSummary::default();

    for name in names {
        info!("Downloading playlist: {}", name);
        match exporter.export_playlist(name).await {
            Ok(result) => summary.exported.push(result),
            Err(e) => {
                error!("Error finding playlist '{}': {}", name, e);
                summary.skipped.push((name.clone(), e.to_string()));
            }
        }
        info!("Finished downloading playlist: {}", name);
    }

    summary
}

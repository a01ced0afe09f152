//! # plexport
//!
//! Export Plex playlists to local storage.
//!
//! ## Quick Start
//!
//! The easiest way to use this library is through [`driver::run`], which
//! performs a complete configuration-driven export:
//!
//! ```rust,no_run
//! use std::path::Path;
//! use plexport::driver::{run, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let summary = run(Path::new("config/config.toml"), &RunOptions::default()).await?;
//!     println!("Wrote {} files", summary.files_written());
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level APIs
//!
//! - [`Connector`] - account discovery with direct-connection fallback
//! - [`PlexServer`] - playlist lookup and signed download URLs
//! - [`Exporter`] - writes one playlist to disk through any [`PlaylistSource`]

pub mod api;
pub mod config;
pub mod connector;
pub mod driver;
pub mod error;
pub mod exporter;
pub mod models;

// Main interface (recommended)
pub use config::Config;
pub use connector::{ConnectMethod, Connector, Session};
pub use exporter::{BatchExportResult, ExportResult, Exporter};

// Low-level APIs
pub use api::{PlaylistSource, PlexAccount, PlexServer};
pub use error::PlexportError;
pub use models::{Playlist, Track};

//! Configuration loading.
//!
//! The configuration is a TOML document with two required tables:
//!
//! ```toml
//! [credentials]
//! plex_url = "http://192.168.1.10:32400"
//! plex_token = "xxxxxxxxxxxxxxxxxxxx"
//!
//! [directories]
//! input_dir = "input"
//! output_dir = "output"
//! ```
//!
//! Every key is required. Nothing is defaulted.

use std::fs;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::error::{PlexportError, Result};

/// Conventional location of the configuration file, relative to the
/// working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Name of the playlist list inside the input directory.
pub const PLAYLISTS_FILE: &str = "playlists.txt";

/// Connection credentials and filesystem locations for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Plex server address.
    pub plex_url: String,
    /// Plex access token.
    pub plex_token: String,
    /// Directory holding `playlists.txt`.
    pub input_dir: PathBuf,
    /// Directory that receives one subdirectory per playlist.
    pub output_dir: PathBuf,
}

impl Config {
    /// Load the configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the file does not exist and
    /// `ConfigKeyMissing` if any of the four required keys is absent.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PlexportError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse the configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let doc: Table = content.parse()?;

        Ok(Self {
            plex_url: required_str(&doc, "credentials", "plex_url")?,
            plex_token: required_str(&doc, "credentials", "plex_token")?,
            input_dir: required_str(&doc, "directories", "input_dir")?.into(),
            output_dir: required_str(&doc, "directories", "output_dir")?.into(),
        })
    }

    /// Path of the playlist list file.
    pub fn playlists_file(&self) -> PathBuf {
        self.input_dir.join(PLAYLISTS_FILE)
    }
}

fn required_str(doc: &Table, table: &str, key: &str) -> Result<String> {
    let name = format!("{}.{}", table, key);

    let value = doc
        .get(table)
        .and_then(Value::as_table)
        .and_then(|t| t.get(key))
        .ok_or_else(|| PlexportError::ConfigKeyMissing(name.clone()))?;

    value
        .as_str()
        .map(str::to_string)
        .ok_or(PlexportError::ConfigInvalid {
            key: name,
            expected: "string",
        })
}

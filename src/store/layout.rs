//! Where every persisted artifact lives under the data directory.
//!
//! ```text
//! <root>/
//!   weather/<NETWORK>.parquet   one intermediate file per station network
//!   weather.parquet             merged weather table
//!   flights.csv.zip             raw on-time archive
//!   <member>.csv                extracted archive member
//!   flights.parquet             normalized flights table
//! ```

use std::path::{Path, PathBuf};

const WEATHER_DIR_NAME: &str = "weather";
const WEATHER_STORE_FILE_NAME: &str = "weather.parquet";
const FLIGHTS_ZIP_FILE_NAME: &str = "flights.csv.zip";
const FLIGHTS_STORE_FILE_NAME: &str = "flights.parquet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn weather_dir(&self) -> PathBuf {
        self.root.join(WEATHER_DIR_NAME)
    }

    /// Intermediate file for one network. Distinct network keys map to distinct
    /// paths, so concurrent writers never share a file.
    pub fn group_path(&self, network: &str) -> PathBuf {
        self.weather_dir()
            .join(format!("{}.parquet", encode_file_stem(network)))
    }

    pub fn weather_store(&self) -> PathBuf {
        self.root.join(WEATHER_STORE_FILE_NAME)
    }

    pub fn flights_zip(&self) -> PathBuf {
        self.root.join(FLIGHTS_ZIP_FILE_NAME)
    }

    /// Destination of an extracted archive member. Only the final path
    /// component of the member name is used.
    pub fn flights_csv(&self, member_name: &str) -> PathBuf {
        let file_name = Path::new(member_name)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| encode_file_stem(member_name));
        self.root.join(file_name)
    }

    pub fn flights_store(&self) -> PathBuf {
        self.root.join(FLIGHTS_STORE_FILE_NAME)
    }
}

/// Keeps `[A-Za-z0-9_-]` and percent-encodes every other byte, `%` included,
/// so the mapping is injective and never produces a path separator.
fn encode_file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A playable item: a local file or a network stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Media {
    File(PathBuf),
    Network(String),
}

impl Media {
    pub fn file(path: impl AsRef<Path>) -> Self {
        Media::File(path.as_ref().to_path_buf())
    }

    pub fn network(url: impl Into<String>) -> Self {
        Media::Network(url.into())
    }

    /// Parses a location as typed on a command line. `http://` and `https://`
    /// locations are network media, everything else is a file path.
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Media::network(location)
        } else {
            Media::file(location)
        }
    }

    pub fn location(&self) -> String {
        match self {
            Media::File(path) => path.display().to_string(),
            Media::Network(url) => url.clone(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Media::Network(_))
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location())
    }
}

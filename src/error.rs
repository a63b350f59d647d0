use std::io;

use thiserror::Error;

/// Failures reported by an [`Engine`](crate::engine::Engine) backend.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to open {location}: {source}")]
    Open {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to fetch network media: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("failed to decode media: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),

    #[error("seek failed: {0}")]
    Seek(String),

    #[error("no media at index {index} (list holds {len})")]
    NoSuchItem { index: usize, len: usize },

    #[error("no media loaded")]
    NothingLoaded,
}

/// Errors returned by the [`Player`](crate::player::Player) and its playlist.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("index {index} out of range for playlist of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] io::Error),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T, E = PlayerError> = std::result::Result<T, E>;

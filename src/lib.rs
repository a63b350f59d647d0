// Remu Playback Library

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod loader;
pub mod media;
pub mod player;
pub mod playlist;
pub mod state;

pub use config::EngineConfig;
pub use engine::{Engine, EngineEvent, SinkEngine};
pub use error::{EngineError, PlayerError};
pub use events::{EventAdapter, EventKind};
pub use media::Media;
pub use player::Player;
pub use playlist::Playlist;
pub use state::PlayerState;

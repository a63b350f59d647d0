//! The media engine the player sits on top of.
//!
//! An [`Engine`] answers state queries, drives a media list, and fires native
//! lifecycle events through its [`EventManager`]. [`SinkEngine`] plays through
//! rodio; [`mock::MockEngine`] is scripted by hand for tests and headless hosts.

mod event_manager;
pub mod mock;
mod sink;

pub use event_manager::EventManager;
pub use sink::SinkEngine;

use crate::error::EngineError;
use crate::media::Media;

/// Native events an engine can fire.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    MediaChanged(Media),
    Playing,
    Paused,
    Stopped,
    /// Position as a fraction of the media length, `0.0..=1.0`.
    PositionChanged(f32),
    SeekableChanged(bool),
    EndReached,
}

/// Discriminant of [`EngineEvent`], used as the key for handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeEvent {
    MediaChanged,
    Playing,
    Paused,
    Stopped,
    PositionChanged,
    SeekableChanged,
    EndReached,
}

impl EngineEvent {
    pub fn kind(&self) -> NativeEvent {
        match self {
            EngineEvent::MediaChanged(_) => NativeEvent::MediaChanged,
            EngineEvent::Playing => NativeEvent::Playing,
            EngineEvent::Paused => NativeEvent::Paused,
            EngineEvent::Stopped => NativeEvent::Stopped,
            EngineEvent::PositionChanged(_) => NativeEvent::PositionChanged,
            EngineEvent::SeekableChanged(_) => NativeEvent::SeekableChanged,
            EngineEvent::EndReached => NativeEvent::EndReached,
        }
    }
}

pub trait Engine: Send + Sync + 'static {
    fn event_manager(&self) -> &EventManager;

    fn is_playing(&self) -> bool;
    fn is_valid(&self) -> bool;
    /// Duration of the current media in milliseconds, `<= 0` when unknown.
    fn duration(&self) -> i64;
    /// Playback position in milliseconds.
    fn position(&self) -> i64;
    /// Total media length in milliseconds, used to resolve relative positions.
    fn length(&self) -> i64 {
        self.duration()
    }

    fn set_media_list(&self, items: &[Media]);
    fn play_item_at_index(&self, index: usize) -> Result<(), EngineError>;
    fn stop(&self);

    fn play(&self) -> Result<(), EngineError>;
    fn pause(&self);
    fn seek(&self, position_ms: i64) -> Result<(), EngineError>;
    fn set_volume(&self, volume: f32);
    fn set_rate(&self, rate: f32);
}

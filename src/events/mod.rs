//! Player events exposed to the host, and the adapter that derives them from
//! native engine events.

mod adapter;
mod callbacks;

pub use adapter::EventAdapter;
pub use callbacks::{Callback, Callbacks};

use crate::engine::NativeEvent;

/// Kinds of event a host can subscribe to. At most one callback per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A new media item was opened.
    Open,
    Play,
    Pause,
    Stop,
    /// Playback position moved.
    Position,
    /// Seekability of the current media changed.
    Seekable,
    /// The current media played to its end.
    Complete,
    Volume,
    Rate,
    /// The playlist was re-applied after a modification.
    Playlist,
}

impl EventKind {
    /// Native engine event backing this kind. Volume, rate and playlist have
    /// none; they are raised by the player itself.
    pub fn native(self) -> Option<NativeEvent> {
        match self {
            EventKind::Open => Some(NativeEvent::MediaChanged),
            EventKind::Play => Some(NativeEvent::Playing),
            EventKind::Pause => Some(NativeEvent::Paused),
            EventKind::Stop => Some(NativeEvent::Stopped),
            EventKind::Position => Some(NativeEvent::PositionChanged),
            EventKind::Seekable => Some(NativeEvent::SeekableChanged),
            EventKind::Complete => Some(NativeEvent::EndReached),
            EventKind::Volume | EventKind::Rate | EventKind::Playlist => None,
        }
    }
}

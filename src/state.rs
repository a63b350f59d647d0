/// Cached view of the engine's playback state, refreshed on every handled event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerState {
    pub is_playing: bool,
    pub is_valid: bool,
    pub is_completed: bool,
    pub is_seekable: bool,
    /// Milliseconds.
    pub position: i64,
    /// Milliseconds.
    pub duration: i64,
    /// Index of the current item in the playlist.
    pub index: usize,
}

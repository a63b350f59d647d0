use parking_lot::Mutex;

use super::{Engine, EngineEvent, EventManager};
use crate::error::EngineError;
use crate::media::Media;

/// Calls the player made on a [`MockEngine`], in order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    SetMediaList(Vec<Media>),
    PlayItemAtIndex(usize),
    Stop,
    Play,
    Pause,
    Seek(i64),
    SetVolume(f32),
    SetRate(f32),
}

#[derive(Debug, Default)]
struct MockState {
    playing: bool,
    valid: bool,
    duration: i64,
    position: i64,
    length: Option<i64>,
    list: Vec<Media>,
    calls: Vec<EngineCall>,
}

/// An engine whose reported state is set by hand and whose events are fired
/// explicitly with [`MockEngine::fire`]. Operations are recorded, never played.
#[derive(Default)]
pub struct MockEngine {
    events: EventManager,
    state: Mutex<MockState>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires a native event as the engine's own thread would.
    pub fn fire(&self, event: EngineEvent) {
        self.events.emit(&event);
    }

    pub fn set_playing(&self, playing: bool) {
        self.state.lock().playing = playing;
    }

    pub fn set_valid(&self, valid: bool) {
        self.state.lock().valid = valid;
    }

    pub fn set_duration(&self, duration: i64) {
        self.state.lock().duration = duration;
    }

    pub fn set_position(&self, position: i64) {
        self.state.lock().position = position;
    }

    /// Overrides the reported length; by default it follows the duration.
    pub fn set_length(&self, length: i64) {
        self.state.lock().length = Some(length);
    }

    pub fn media_list(&self) -> Vec<Media> {
        self.state.lock().list.clone()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<EngineCall> {
        std::mem::take(&mut self.state.lock().calls)
    }

    fn record(&self, call: EngineCall) {
        self.state.lock().calls.push(call);
    }
}

impl Engine for MockEngine {
    fn event_manager(&self) -> &EventManager {
        &self.events
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    fn is_valid(&self) -> bool {
        self.state.lock().valid
    }

    fn duration(&self) -> i64 {
        self.state.lock().duration
    }

    fn position(&self) -> i64 {
        self.state.lock().position
    }

    fn length(&self) -> i64 {
        let state = self.state.lock();
        state.length.unwrap_or(state.duration)
    }

    fn set_media_list(&self, items: &[Media]) {
        let mut state = self.state.lock();
        state.list = items.to_vec();
        state.calls.push(EngineCall::SetMediaList(items.to_vec()));
    }

    fn play_item_at_index(&self, index: usize) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::PlayItemAtIndex(index));
        if index >= state.list.len() {
            return Err(EngineError::NoSuchItem {
                index,
                len: state.list.len(),
            });
        }
        state.playing = true;
        state.valid = true;
        Ok(())
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Stop);
        state.playing = false;
    }

    fn play(&self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Play);
        state.playing = true;
        Ok(())
    }

    fn pause(&self) {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Pause);
        state.playing = false;
    }

    fn seek(&self, position_ms: i64) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Seek(position_ms));
        state.position = position_ms;
        Ok(())
    }

    fn set_volume(&self, volume: f32) {
        self.record(EngineCall::SetVolume(volume));
    }

    fn set_rate(&self, rate: f32) {
        self.record(EngineCall::SetRate(rate));
    }
}

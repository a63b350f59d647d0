use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, trace, warn};

use super::callbacks::{Callback, Callbacks};
use super::EventKind;
use crate::engine::{Engine, EngineEvent, NativeEvent};
use crate::error::{PlayerError, Result};
use crate::media::Media;
use crate::playlist::Playlist;
use crate::state::PlayerState;

/// Bridges native engine events to host callbacks and keeps the
/// [`PlayerState`] snapshot in step with the engine.
///
/// Registering a callback for a native-backed [`EventKind`] installs a
/// trampoline on the engine's event manager that enqueues the native event.
/// Queued events are handled one at a time by [`EventAdapter::handle`], either
/// from the [`Player`](crate::Player)'s dispatcher thread or by draining the
/// receiver returned from [`EventAdapter::new`].
pub struct EventAdapter<E: Engine> {
    engine: Arc<E>,
    state: PlayerState,
    playlist: Playlist,
    modified: bool,
    volume: f32,
    rate: f32,
    callbacks: Callbacks,
    queue: Sender<EngineEvent>,
}

impl<E: Engine> EventAdapter<E> {
    /// Creates the adapter and the receiving end of its event queue.
    pub fn new(engine: Arc<E>) -> (Self, Receiver<EngineEvent>) {
        let (queue, events) = crossbeam_channel::unbounded();
        let adapter = Self {
            engine,
            state: PlayerState::default(),
            playlist: Playlist::default(),
            modified: false,
            volume: 1.0,
            rate: 1.0,
            callbacks: Callbacks::default(),
            queue,
        };
        (adapter, events)
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    /// Volume last applied through [`EventAdapter::set_volume`], 1.0 until
    /// then. Kept apart from the [`PlayerState`] snapshot, which playlist
    /// changes may reset.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Whether the playlist changed since it was last applied to the engine.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn on_open<F>(&mut self, callback: F)
    where
        F: FnMut(&Media) + Send + 'static,
    {
        self.register(EventKind::Open, Callback::Media(Box::new(callback)));
    }

    pub fn on_play<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.register(EventKind::Play, Callback::Unit(Box::new(callback)));
    }

    pub fn on_pause<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.register(EventKind::Pause, Callback::Unit(Box::new(callback)));
    }

    pub fn on_stop<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.register(EventKind::Stop, Callback::Unit(Box::new(callback)));
    }

    /// `callback` receives the position in milliseconds.
    pub fn on_position<F>(&mut self, callback: F)
    where
        F: FnMut(i64) + Send + 'static,
    {
        self.register(EventKind::Position, Callback::Millis(Box::new(callback)));
    }

    pub fn on_seekable<F>(&mut self, callback: F)
    where
        F: FnMut(bool) + Send + 'static,
    {
        self.register(EventKind::Seekable, Callback::Flag(Box::new(callback)));
    }

    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.register(EventKind::Complete, Callback::Unit(Box::new(callback)));
    }

    pub fn on_volume<F>(&mut self, callback: F)
    where
        F: FnMut(f32) + Send + 'static,
    {
        self.register(EventKind::Volume, Callback::Level(Box::new(callback)));
    }

    pub fn on_rate<F>(&mut self, callback: F)
    where
        F: FnMut(f32) + Send + 'static,
    {
        self.register(EventKind::Rate, Callback::Level(Box::new(callback)));
    }

    pub fn on_playlist<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.register(EventKind::Playlist, Callback::Unit(Box::new(callback)));
    }

    fn register(&mut self, kind: EventKind, callback: Callback) {
        let replaced = self.callbacks.set(kind, callback).is_some();
        debug!(?kind, replaced, "callback registered");
        if let Some(native) = kind.native() {
            self.attach(native);
        }
    }

    /// Installs the trampoline forwarding `native` into the event queue.
    fn attach(&self, native: NativeEvent) {
        let events = self.engine.event_manager();
        let queue = self.queue.clone();
        match native {
            NativeEvent::MediaChanged => events.on_media_changed(move |media| {
                forward(&queue, EngineEvent::MediaChanged(media.clone()))
            }),
            NativeEvent::Playing => events.on_playing(move || forward(&queue, EngineEvent::Playing)),
            NativeEvent::Paused => events.on_paused(move || forward(&queue, EngineEvent::Paused)),
            NativeEvent::Stopped => events.on_stopped(move || forward(&queue, EngineEvent::Stopped)),
            NativeEvent::PositionChanged => events.on_position_changed(move |relative| {
                forward(&queue, EngineEvent::PositionChanged(relative))
            }),
            NativeEvent::SeekableChanged => events.on_seekable_changed(move |seekable| {
                forward(&queue, EngineEvent::SeekableChanged(seekable))
            }),
            NativeEvent::EndReached => {
                events.on_end_reached(move || forward(&queue, EngineEvent::EndReached))
            }
        }
    }

    /// Handles every event already waiting in `events`, returning how many.
    pub fn drain(&mut self, events: &Receiver<EngineEvent>) -> usize {
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    pub fn handle(&mut self, event: EngineEvent) {
        trace!(?event, "dispatching engine event");
        match event {
            EngineEvent::MediaChanged(media) => self.handle_open(&media),
            EngineEvent::Playing => {
                if self.refresh("play") {
                    self.state.is_completed = false;
                    self.callbacks.fire(EventKind::Play);
                }
            }
            EngineEvent::Paused => {
                if self.refresh("pause") {
                    self.callbacks.fire(EventKind::Pause);
                }
            }
            EngineEvent::Stopped => {
                if self.refresh("stop") {
                    self.callbacks.fire(EventKind::Stop);
                }
            }
            EngineEvent::PositionChanged(relative) => {
                if self.refresh("position") {
                    let millis = (f64::from(relative) * self.engine.length() as f64) as i64;
                    self.callbacks.fire_millis(EventKind::Position, millis);
                }
            }
            EngineEvent::SeekableChanged(seekable) => {
                if self.duration_guard("seekable").is_some() {
                    self.state.is_seekable = seekable;
                    self.callbacks.fire_flag(EventKind::Seekable, seekable);
                }
            }
            EngineEvent::EndReached => {
                if self.refresh("complete") {
                    self.state.is_completed = true;
                    self.advance(true);
                    self.callbacks.fire(EventKind::Complete);
                }
            }
        }
    }

    /** 切换媒体 */
    fn handle_open(&mut self, media: &Media) {
        // 更新状态，时长未知时清零
        let duration = self.engine.duration();
        self.state.is_playing = self.engine.is_playing();
        self.state.is_valid = self.engine.is_valid();
        self.state.is_completed = false;
        if duration > 0 {
            self.state.position = self.engine.position();
            self.state.duration = duration;
        } else {
            self.state.position = 0;
            self.state.duration = 0;
        }
        // 定位当前项
        match self.playlist.index_of(media) {
            Some(index) => self.state.index = index,
            None => warn!(%media, "opened media is not in the playlist"),
        }
        info!(%media, index = self.state.index, "media opened");
        self.callbacks.fire_media(EventKind::Open, media);
    }

    // Engines report a non-positive duration while tearing down or switching
    // media. Events arriving then are dropped. This also drops events for
    // media that legitimately has no length, such as some live streams.
    fn duration_guard(&self, handler: &'static str) -> Option<i64> {
        let duration = self.engine.duration();
        if duration <= 0 {
            debug!(handler, duration, "engine reports no duration, event dropped");
            return None;
        }
        Some(duration)
    }

    /// Copies playback flags, position and duration from the engine, unless
    /// the duration guard rejects the event.
    fn refresh(&mut self, handler: &'static str) -> bool {
        let Some(duration) = self.duration_guard(handler) else {
            return false;
        };
        self.state.is_playing = self.engine.is_playing();
        self.state.is_valid = self.engine.is_valid();
        self.state.position = self.engine.position();
        self.state.duration = duration;
        true
    }

    /// Re-applies a modified playlist to the engine and brings the current
    /// index back into range, starting playback there when `play` is set.
    ///
    /// Does nothing when the playlist has not been modified. An emptied
    /// playlist resets the state and stops the engine without notifying the
    /// playlist callback.
    pub fn advance(&mut self, play: bool) {
        if !self.modified {
            return;
        }
        self.engine.set_media_list(self.playlist.items());

        // 列表已清空，重置状态
        if self.playlist.is_empty() {
            info!("playlist emptied, stopping playback");
            self.state = PlayerState::default();
            self.engine.stop();
            self.modified = false;
            return;
        }

        // 修正越界的索引
        let len = self.playlist.len();
        if self.state.index >= len {
            self.state.index = len - 1;
        }
        if play {
            if let Err(err) = self.engine.play_item_at_index(self.state.index) {
                warn!(index = self.state.index, error = %err, "failed to play after playlist change");
            }
        }
        self.modified = false;
        debug!(len, index = self.state.index, "playlist applied");
        self.callbacks.fire(EventKind::Playlist);
    }

    /// Replaces the playlist and applies it immediately, optionally starting
    /// the first item.
    pub fn open(&mut self, items: Vec<Media>, autostart: bool) -> Result<()> {
        self.playlist = Playlist::new(items);
        self.engine.set_media_list(self.playlist.items());
        self.state.index = 0;
        self.modified = false;
        info!(len = self.playlist.len(), "playlist opened");
        if autostart && !self.playlist.is_empty() {
            self.engine.play_item_at_index(0)?;
        }
        Ok(())
    }

    pub fn add(&mut self, media: Media) {
        self.playlist.add(media);
        self.modified = true;
    }

    pub fn insert(&mut self, index: usize, media: Media) -> Result<()> {
        self.playlist.insert(index, media)?;
        self.modified = true;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Media> {
        let media = self.playlist.remove(index)?;
        self.modified = true;
        Ok(media)
    }

    pub fn move_media(&mut self, from: usize, to: usize) -> Result<()> {
        self.playlist.move_item(from, to)?;
        self.modified = true;
        Ok(())
    }

    /// Plays the item after the current one; does nothing at the end.
    pub fn next(&mut self) -> Result<()> {
        self.advance(false);
        let next = self.state.index + 1;
        if next >= self.playlist.len() {
            return Ok(());
        }
        self.start(next)
    }

    /// Plays the item before the current one; does nothing at the start.
    pub fn back(&mut self) -> Result<()> {
        self.advance(false);
        if self.playlist.is_empty() || self.state.index == 0 {
            return Ok(());
        }
        self.start(self.state.index - 1)
    }

    pub fn jump(&mut self, index: usize) -> Result<()> {
        self.advance(false);
        if index >= self.playlist.len() {
            return Err(PlayerError::IndexOutOfRange {
                index,
                len: self.playlist.len(),
            });
        }
        self.start(index)
    }

    /** 播放指定项 */
    fn start(&mut self, index: usize) -> Result<()> {
        self.engine.play_item_at_index(index)?;
        self.state.index = index;
        Ok(())
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.engine.set_volume(volume);
        self.volume = volume;
        self.callbacks.fire_level(EventKind::Volume, volume);
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.engine.set_rate(rate);
        self.rate = rate;
        self.callbacks.fire_level(EventKind::Rate, rate);
    }
}

fn forward(queue: &Sender<EngineEvent>, event: EngineEvent) {
    if queue.send(event).is_err() {
        trace!("event queue closed, native event discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::{EngineCall, MockEngine};
    use parking_lot::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    fn setup() -> (Arc<MockEngine>, EventAdapter<MockEngine>, Receiver<EngineEvent>) {
        let engine = Arc::new(MockEngine::new());
        engine.set_duration(2000);
        engine.set_valid(true);
        let (adapter, events) = EventAdapter::new(engine.clone());
        (engine, adapter, events)
    }

    fn media(names: &[&str]) -> Vec<Media> {
        names.iter().map(|n| Media::file(n)).collect()
    }

    fn log_unit(log: &Log, label: &'static str) -> impl FnMut() + Send + 'static {
        let log = log.clone();
        move || log.lock().push(label.to_string())
    }

    #[test]
    fn position_is_relative_times_length() {
        let (engine, mut adapter, events) = setup();
        let log: Log = Default::default();
        let sink = log.clone();
        adapter.on_position(move |ms| sink.lock().push(ms.to_string()));

        engine.fire(EngineEvent::PositionChanged(0.5));
        assert_eq!(adapter.drain(&events), 1);
        assert_eq!(*log.lock(), vec!["1000"]);
    }

    #[test]
    fn position_truncates() {
        let (engine, mut adapter, events) = setup();
        engine.set_length(999);
        let log: Log = Default::default();
        let sink = log.clone();
        adapter.on_position(move |ms| sink.lock().push(ms.to_string()));

        engine.fire(EngineEvent::PositionChanged(0.5));
        adapter.drain(&events);
        assert_eq!(*log.lock(), vec!["499"]);
    }

    #[test]
    fn zero_duration_drops_guarded_events() {
        let (engine, mut adapter, events) = setup();
        let log: Log = Default::default();
        adapter.on_play(log_unit(&log, "play"));
        adapter.on_pause(log_unit(&log, "pause"));
        adapter.on_stop(log_unit(&log, "stop"));
        adapter.on_complete(log_unit(&log, "complete"));
        let sink = log.clone();
        adapter.on_position(move |ms| sink.lock().push(ms.to_string()));
        let sink = log.clone();
        adapter.on_seekable(move |s| sink.lock().push(s.to_string()));

        engine.set_duration(0);
        engine.set_playing(true);
        engine.set_position(500);
        for event in [
            EngineEvent::Playing,
            EngineEvent::Paused,
            EngineEvent::Stopped,
            EngineEvent::PositionChanged(0.5),
            EngineEvent::SeekableChanged(true),
            EngineEvent::EndReached,
        ] {
            engine.fire(event);
        }
        assert_eq!(adapter.drain(&events), 6);

        assert!(log.lock().is_empty());
        assert_eq!(*adapter.state(), PlayerState::default());
    }

    #[test]
    fn play_refreshes_snapshot() {
        let (engine, mut adapter, events) = setup();
        let log: Log = Default::default();
        adapter.on_play(log_unit(&log, "play"));

        engine.set_playing(true);
        engine.set_position(750);
        engine.fire(EngineEvent::Playing);
        adapter.drain(&events);

        let state = adapter.state();
        assert!(state.is_playing);
        assert!(state.is_valid);
        assert!(!state.is_completed);
        assert_eq!(state.position, 750);
        assert_eq!(state.duration, 2000);
        assert_eq!(*log.lock(), vec!["play"]);
    }

    #[test]
    fn seekable_sets_flag_only() {
        let (engine, mut adapter, events) = setup();
        let log: Log = Default::default();
        let sink = log.clone();
        adapter.on_seekable(move |s| sink.lock().push(s.to_string()));

        engine.set_position(300);
        engine.fire(EngineEvent::SeekableChanged(true));
        adapter.drain(&events);

        assert!(adapter.state().is_seekable);
        assert_eq!(adapter.state().position, 0);
        assert_eq!(*log.lock(), vec!["true"]);
    }

    #[test]
    fn open_resolves_index_even_without_duration() {
        let (engine, mut adapter, events) = setup();
        adapter.open(media(&["a", "b", "c"]), false).unwrap();
        let log: Log = Default::default();
        let sink = log.clone();
        adapter.on_open(move |m| sink.lock().push(m.to_string()));

        engine.set_duration(-1);
        engine.fire(EngineEvent::MediaChanged(Media::file("c")));
        adapter.drain(&events);

        assert_eq!(adapter.state().index, 2);
        assert_eq!(adapter.state().duration, 0);
        assert_eq!(*log.lock(), vec!["c"]);
    }

    #[test]
    fn events_without_callback_are_not_routed() {
        let (engine, mut adapter, events) = setup();
        adapter.on_pause(|| {});

        engine.set_playing(true);
        engine.fire(EngineEvent::Playing);
        assert_eq!(adapter.drain(&events), 0);
        assert!(!adapter.state().is_playing);
    }

    #[test]
    fn reregistering_replaces_callback() {
        let (engine, mut adapter, events) = setup();
        let log: Log = Default::default();
        adapter.on_stop(log_unit(&log, "first"));
        adapter.on_stop(log_unit(&log, "second"));

        engine.fire(EngineEvent::Stopped);
        engine.fire(EngineEvent::Stopped);
        assert_eq!(adapter.drain(&events), 2);
        assert_eq!(*log.lock(), vec!["second", "second"]);
    }

    #[test]
    fn advance_without_modification_is_noop() {
        let (engine, mut adapter, _events) = setup();
        adapter.open(media(&["a", "b"]), false).unwrap();
        engine.take_calls();
        let log: Log = Default::default();
        adapter.on_playlist(log_unit(&log, "playlist"));

        adapter.advance(true);
        assert!(engine.calls().is_empty());
        assert!(log.lock().is_empty());

        adapter.add(Media::file("c"));
        adapter.advance(true);
        adapter.advance(true);
        assert_eq!(
            engine.take_calls(),
            vec![
                EngineCall::SetMediaList(media(&["a", "b", "c"])),
                EngineCall::PlayItemAtIndex(0),
            ]
        );
        assert_eq!(*log.lock(), vec!["playlist"]);
        assert!(!adapter.is_modified());
    }

    #[test]
    fn advance_clamps_index_into_range() {
        let (engine, mut adapter, events) = setup();
        adapter.open(media(&["a", "b", "c", "d", "e", "f"]), false).unwrap();
        adapter.on_open(|_| {});
        engine.fire(EngineEvent::MediaChanged(Media::file("f")));
        adapter.drain(&events);
        assert_eq!(adapter.state().index, 5);

        for _ in 0..3 {
            adapter.remove(0).unwrap();
        }
        engine.take_calls();
        adapter.advance(true);

        assert_eq!(adapter.state().index, 2);
        assert_eq!(engine.calls().last(), Some(&EngineCall::PlayItemAtIndex(2)));
    }

    #[test]
    fn advance_clamps_index_equal_to_length() {
        let (_engine, mut adapter, _events) = setup();
        adapter.open(media(&["a", "b"]), false).unwrap();
        adapter.jump(1).unwrap();
        adapter.remove(1).unwrap();

        adapter.advance(false);
        assert_eq!(adapter.state().index, 0);
    }

    #[test]
    fn emptied_playlist_resets_and_stops() {
        let (engine, mut adapter, events) = setup();
        adapter.open(media(&["a"]), false).unwrap();
        let log: Log = Default::default();
        adapter.on_playlist(log_unit(&log, "playlist"));
        adapter.on_play(|| {});
        engine.set_playing(true);
        engine.fire(EngineEvent::Playing);
        adapter.drain(&events);
        assert!(adapter.state().is_playing);

        adapter.remove(0).unwrap();
        engine.take_calls();
        adapter.advance(true);

        assert_eq!(*adapter.state(), PlayerState::default());
        assert_eq!(
            engine.calls(),
            vec![EngineCall::SetMediaList(Vec::new()), EngineCall::Stop]
        );
        assert!(log.lock().is_empty());
        assert!(!adapter.is_modified());
    }

    #[test]
    fn emptied_playlist_replaces_snapshot_wholesale() {
        let (engine, mut adapter, _events) = setup();
        adapter.open(media(&["a"]), true).unwrap();
        adapter.set_volume(0.5);
        adapter.set_rate(2.0);
        adapter.remove(0).unwrap();
        engine.take_calls();

        adapter.advance(true);

        assert_eq!(*adapter.state(), PlayerState::default());
        assert_eq!(adapter.volume(), 0.5);
        assert_eq!(adapter.rate(), 2.0);
        assert_eq!(
            engine.calls(),
            vec![EngineCall::SetMediaList(Vec::new()), EngineCall::Stop]
        );
    }

    #[test]
    fn completion_advances_before_complete_callback() {
        let (engine, mut adapter, events) = setup();
        adapter.open(media(&["a", "b", "c"]), false).unwrap();
        let log: Log = Default::default();
        adapter.on_playlist(log_unit(&log, "playlist"));
        adapter.on_complete(log_unit(&log, "complete"));
        adapter.jump(2).unwrap();
        adapter.remove(0).unwrap();
        engine.take_calls();

        engine.fire(EngineEvent::EndReached);
        adapter.drain(&events);

        assert!(adapter.state().is_completed);
        assert_eq!(adapter.state().index, 1);
        assert_eq!(*log.lock(), vec!["playlist", "complete"]);
        assert_eq!(engine.calls().last(), Some(&EngineCall::PlayItemAtIndex(1)));
    }

    #[test]
    fn completion_without_modification_only_notifies() {
        let (engine, mut adapter, events) = setup();
        adapter.open(media(&["a"]), false).unwrap();
        let log: Log = Default::default();
        adapter.on_complete(log_unit(&log, "complete"));
        engine.take_calls();

        engine.fire(EngineEvent::EndReached);
        adapter.drain(&events);

        assert!(engine.calls().is_empty());
        assert_eq!(*log.lock(), vec!["complete"]);
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let (engine, mut adapter, _events) = setup();
        adapter.open(media(&["a", "b"]), true).unwrap();
        adapter.back().unwrap();
        adapter.next().unwrap();
        adapter.next().unwrap();
        assert_eq!(adapter.state().index, 1);
        assert!(matches!(
            adapter.jump(2),
            Err(PlayerError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::SetMediaList(media(&["a", "b"])),
                EngineCall::PlayItemAtIndex(0),
                EngineCall::PlayItemAtIndex(1),
            ]
        );
    }

    #[test]
    fn volume_and_rate_fire_synchronously() {
        let (engine, mut adapter, _events) = setup();
        let log: Log = Default::default();
        let sink = log.clone();
        adapter.on_volume(move |v| sink.lock().push(format!("volume {v}")));
        let sink = log.clone();
        adapter.on_rate(move |r| sink.lock().push(format!("rate {r}")));

        adapter.set_volume(0.5);
        adapter.set_rate(1.25);

        assert_eq!(*log.lock(), vec!["volume 0.5", "rate 1.25"]);
        assert_eq!(adapter.volume(), 0.5);
        assert_eq!(adapter.rate(), 1.25);
        assert_eq!(
            engine.calls(),
            vec![EngineCall::SetVolume(0.5), EngineCall::SetRate(1.25)]
        );
    }
}

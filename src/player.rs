use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, Receiver, Sender};
use parking_lot::Mutex;
use tracing::debug;

use crate::engine::{Engine, EngineEvent};
use crate::error::Result;
use crate::events::EventAdapter;
use crate::media::Media;
use crate::playlist::Playlist;
use crate::state::PlayerState;

/// A playlist player over an [`Engine`], reporting lifecycle events to
/// registered callbacks.
///
/// Native events are handled one at a time on a dedicated dispatcher thread.
/// Volume, rate and playlist callbacks may also run on the thread calling into
/// the player. Callbacks always run while the player's adapter is locked, so
/// they must not call back into the `Player`.
pub struct Player<E: Engine> {
    engine: Arc<E>,
    adapter: Arc<Mutex<EventAdapter<E>>>,
    shutdown: Sender<()>,
    dispatcher: Option<JoinHandle<()>>,
}

impl<E: Engine> Player<E> {
    pub fn new(engine: E) -> Self {
        let engine = Arc::new(engine);
        let (adapter, events) = EventAdapter::new(engine.clone());
        let adapter = Arc::new(Mutex::new(adapter));
        let (shutdown, shutdown_rx) = crossbeam_channel::bounded(1);

        // 启动事件分发线程
        let dispatcher = {
            let adapter = adapter.clone();
            thread::spawn(move || dispatch(adapter, events, shutdown_rx))
        };

        Self {
            engine,
            adapter,
            shutdown,
            dispatcher: Some(dispatcher),
        }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /** 当前状态的副本 */
    pub fn state(&self) -> PlayerState {
        *self.adapter.lock().state()
    }

    pub fn volume(&self) -> f32 {
        self.adapter.lock().volume()
    }

    pub fn rate(&self) -> f32 {
        self.adapter.lock().rate()
    }

    pub fn playlist(&self) -> Playlist {
        self.adapter.lock().playlist().clone()
    }

    pub fn on_open<F>(&self, callback: F)
    where
        F: FnMut(&Media) + Send + 'static,
    {
        self.adapter.lock().on_open(callback);
    }

    pub fn on_play<F>(&self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.adapter.lock().on_play(callback);
    }

    pub fn on_pause<F>(&self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.adapter.lock().on_pause(callback);
    }

    pub fn on_stop<F>(&self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.adapter.lock().on_stop(callback);
    }

    pub fn on_position<F>(&self, callback: F)
    where
        F: FnMut(i64) + Send + 'static,
    {
        self.adapter.lock().on_position(callback);
    }

    pub fn on_seekable<F>(&self, callback: F)
    where
        F: FnMut(bool) + Send + 'static,
    {
        self.adapter.lock().on_seekable(callback);
    }

    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.adapter.lock().on_complete(callback);
    }

    pub fn on_volume<F>(&self, callback: F)
    where
        F: FnMut(f32) + Send + 'static,
    {
        self.adapter.lock().on_volume(callback);
    }

    pub fn on_rate<F>(&self, callback: F)
    where
        F: FnMut(f32) + Send + 'static,
    {
        self.adapter.lock().on_rate(callback);
    }

    pub fn on_playlist<F>(&self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.adapter.lock().on_playlist(callback);
    }

    /// Replaces the playlist, starting its first item when `autostart` is set.
    pub fn open(&self, items: Vec<Media>, autostart: bool) -> Result<()> {
        self.adapter.lock().open(items, autostart)
    }

    pub fn play(&self) -> Result<()> {
        self.engine.play()?;
        Ok(())
    }

    pub fn pause(&self) {
        self.engine.pause();
    }

    pub fn play_or_pause(&self) -> Result<()> {
        if self.engine.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    pub fn stop(&self) {
        self.engine.stop();
    }

    pub fn seek(&self, position: Duration) -> Result<()> {
        self.engine.seek(position.as_millis() as i64)?;
        Ok(())
    }

    pub fn next(&self) -> Result<()> {
        self.adapter.lock().next()
    }

    pub fn back(&self) -> Result<()> {
        self.adapter.lock().back()
    }

    pub fn jump(&self, index: usize) -> Result<()> {
        self.adapter.lock().jump(index)
    }

    pub fn set_volume(&self, volume: f32) {
        self.adapter.lock().set_volume(volume);
    }

    pub fn set_rate(&self, rate: f32) {
        self.adapter.lock().set_rate(rate);
    }

    /// Appends to the playlist. Takes effect on the next navigation or
    /// completion.
    pub fn add(&self, media: Media) {
        self.adapter.lock().add(media);
    }

    pub fn insert(&self, index: usize, media: Media) -> Result<()> {
        self.adapter.lock().insert(index, media)
    }

    pub fn remove(&self, index: usize) -> Result<Media> {
        self.adapter.lock().remove(index)
    }

    pub fn move_media(&self, from: usize, to: usize) -> Result<()> {
        self.adapter.lock().move_media(from, to)
    }
}

fn dispatch<E: Engine>(
    adapter: Arc<Mutex<EventAdapter<E>>>,
    events: Receiver<EngineEvent>,
    shutdown: Receiver<()>,
) {
    loop {
        select! {
            recv(events) -> event => match event {
                Ok(event) => adapter.lock().handle(event),
                Err(_) => break,
            },
            recv(shutdown) -> _ => break,
        }
    }
    debug!("event dispatcher stopped");
}

impl<E: Engine> Drop for Player<E> {
    fn drop(&mut self) {
        // 通知分发线程退出
        let _ = self.shutdown.try_send(());
        if let Some(dispatcher) = self.dispatcher.take() {
            // A callback owning the player may drop it on the dispatcher itself.
            if dispatcher.thread().id() != thread::current().id() {
                let _ = dispatcher.join();
            }
        }
    }
}

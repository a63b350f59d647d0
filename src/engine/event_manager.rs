use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{EngineEvent, NativeEvent};
use crate::media::Media;

type Handler = Arc<dyn Fn(&EngineEvent) + Send + Sync + 'static>;

/// Registry of native event handlers, one per [`NativeEvent`].
///
/// Registering a handler for an event that already has one replaces it.
#[derive(Default)]
pub struct EventManager {
    handlers: Mutex<HashMap<NativeEvent, Handler>>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_media_changed<F>(&self, handler: F)
    where
        F: Fn(&Media) + Send + Sync + 'static,
    {
        self.register(NativeEvent::MediaChanged, move |event| {
            if let EngineEvent::MediaChanged(media) = event {
                handler(media);
            }
        });
    }

    pub fn on_playing<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.register(NativeEvent::Playing, move |_| handler());
    }

    pub fn on_paused<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.register(NativeEvent::Paused, move |_| handler());
    }

    pub fn on_stopped<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.register(NativeEvent::Stopped, move |_| handler());
    }

    pub fn on_position_changed<F>(&self, handler: F)
    where
        F: Fn(f32) + Send + Sync + 'static,
    {
        self.register(NativeEvent::PositionChanged, move |event| {
            if let EngineEvent::PositionChanged(relative) = event {
                handler(*relative);
            }
        });
    }

    pub fn on_seekable_changed<F>(&self, handler: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.register(NativeEvent::SeekableChanged, move |event| {
            if let EngineEvent::SeekableChanged(seekable) = event {
                handler(*seekable);
            }
        });
    }

    pub fn on_end_reached<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.register(NativeEvent::EndReached, move |_| handler());
    }

    pub fn register<F>(&self, kind: NativeEvent, handler: F)
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.handlers.lock().insert(kind, Arc::new(handler));
    }

    pub fn is_registered(&self, kind: NativeEvent) -> bool {
        self.handlers.lock().contains_key(&kind)
    }

    /// Delivers `event` to its handler, if any. The registry lock is released
    /// before the handler runs so handlers may re-enter the engine.
    pub fn emit(&self, event: &EngineEvent) {
        let handler = self.handlers.lock().get(&event.kind()).cloned();
        if let Some(handler) = handler {
            handler(event);
        }
    }
}

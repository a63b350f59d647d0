use std::collections::HashMap;

use tracing::debug;

use super::EventKind;
use crate::media::Media;

/// A host callback, shaped by the argument its event carries.
pub enum Callback {
    Media(Box<dyn FnMut(&Media) + Send + 'static>),
    Unit(Box<dyn FnMut() + Send + 'static>),
    /// Milliseconds.
    Millis(Box<dyn FnMut(i64) + Send + 'static>),
    Flag(Box<dyn FnMut(bool) + Send + 'static>),
    /// Volume or rate.
    Level(Box<dyn FnMut(f32) + Send + 'static>),
}

/// One optional callback slot per [`EventKind`].
#[derive(Default)]
pub struct Callbacks {
    slots: HashMap<EventKind, Callback>,
}

impl Callbacks {
    /// Stores `callback` for `kind`, returning the one it replaces.
    pub fn set(&mut self, kind: EventKind, callback: Callback) -> Option<Callback> {
        self.slots.insert(kind, callback)
    }

    pub fn is_set(&self, kind: EventKind) -> bool {
        self.slots.contains_key(&kind)
    }

    pub fn fire(&mut self, kind: EventKind) {
        match self.slots.get_mut(&kind) {
            Some(Callback::Unit(f)) => f(),
            other => mismatch(kind, other.is_some()),
        }
    }

    pub fn fire_media(&mut self, kind: EventKind, media: &Media) {
        match self.slots.get_mut(&kind) {
            Some(Callback::Media(f)) => f(media),
            other => mismatch(kind, other.is_some()),
        }
    }

    pub fn fire_millis(&mut self, kind: EventKind, millis: i64) {
        match self.slots.get_mut(&kind) {
            Some(Callback::Millis(f)) => f(millis),
            other => mismatch(kind, other.is_some()),
        }
    }

    pub fn fire_flag(&mut self, kind: EventKind, flag: bool) {
        match self.slots.get_mut(&kind) {
            Some(Callback::Flag(f)) => f(flag),
            other => mismatch(kind, other.is_some()),
        }
    }

    pub fn fire_level(&mut self, kind: EventKind, level: f32) {
        match self.slots.get_mut(&kind) {
            Some(Callback::Level(f)) => f(level),
            other => mismatch(kind, other.is_some()),
        }
    }
}

fn mismatch(kind: EventKind, registered: bool) {
    if registered {
        debug!(?kind, "callback shape does not match event, skipped");
    }
}

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use rodio::mixer::Mixer;
use rodio::{Decoder, Sink, Source};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Engine, EngineEvent, EventManager};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::loader;
use crate::media::Media;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Idle,
    Playing,
    Paused,
    Stopped,
    Ended,
}

struct Inner {
    sink: Option<Sink>,
    list: Vec<Media>,
    current: Option<usize>,
    duration: Option<Duration>,
    status: Status,
    volume: f32,
    rate: f32,
    /// Bumped by every host request that changes what should play. An
    /// auto-advance started under an older generation is discarded.
    generation: u64,
}

struct Shared {
    mixer: Mixer,
    config: EngineConfig,
    events: EventManager,
    inner: Mutex<Inner>,
    finished: Sender<()>,
}

/// Media-list engine playing through a rodio [`Mixer`].
///
/// Each item gets a fresh [`Sink`]. A poller thread reports position while
/// playing, fires `EndReached` when the sink runs dry and then moves on to the
/// next item in the list, if there is one. Any host request made after that
/// point (`set_media_list`, `play_item_at_index`, `stop`) takes precedence
/// over the pending move.
pub struct SinkEngine {
    shared: Arc<Shared>,
    finished: Receiver<()>,
    cancellation_token: CancellationToken,
    poller: Option<JoinHandle<()>>,
}

impl SinkEngine {
    pub fn new(mixer: &Mixer, config: EngineConfig) -> Self {
        let (finished_tx, finished) = crossbeam_channel::unbounded();
        let shared = Arc::new(Shared {
            mixer: mixer.clone(),
            inner: Mutex::new(Inner {
                sink: None,
                list: Vec::new(),
                current: None,
                duration: None,
                status: Status::Idle,
                volume: config.volume,
                rate: config.rate,
                generation: 0,
            }),
            config,
            events: EventManager::new(),
            finished: finished_tx,
        });

        // 轮询播放进度，直到引擎被销毁
        let cancellation_token = CancellationToken::new();
        let poller = {
            let shared = shared.clone();
            let token = cancellation_token.clone();
            thread::spawn(move || {
                while !token.is_cancelled() {
                    thread::sleep(shared.config.poll_interval());
                    shared.poll();
                }
            })
        };

        Self {
            shared,
            finished,
            cancellation_token,
            poller: Some(poller),
        }
    }

    /** 播放列表结束时收到通知 */
    ///
    /// Signalled once each time playback runs off the end of the media list,
    /// whether or not the media reported a duration.
    pub fn finished(&self) -> Receiver<()> {
        self.finished.clone()
    }
}

impl Shared {
    fn emit_all(&self, events: &[EngineEvent]) {
        for event in events {
            self.events.emit(event);
        }
    }

    /** 加载音频源 */
    ///
    /// Returns a new paused sink holding `media`, with the media's total
    /// duration if the container reports one.
    fn load(&self, media: &Media) -> Result<(Sink, Option<Duration>), EngineError> {
        let sink = Sink::connect_new(&self.mixer);
        sink.pause();

        let duration = match media {
            Media::File(path) => {
                // 打开本地文件，扩展名作为解码提示
                let open_error = |source| EngineError::Open {
                    location: media.location(),
                    source,
                };
                let file = File::open(path).map_err(open_error)?;
                let byte_len = file.metadata().map_err(open_error)?.len();
                let mut builder = Decoder::builder()
                    .with_data(BufReader::new(file))
                    .with_byte_len(byte_len)
                    .with_seekable(true);
                if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                    builder = builder.with_hint(ext);
                }
                let decoder = builder.build()?;
                let duration = decoder.total_duration();
                sink.append(decoder);
                duration
            }
            Media::Network(url) => {
                // 下载完整内容后再解码
                let body = loader::fetch(url, self.config.network_timeout())?;
                let byte_len = body.len() as u64;
                let decoder = Decoder::builder()
                    .with_data(Cursor::new(body))
                    .with_byte_len(byte_len)
                    .with_seekable(true)
                    .build()?;
                let duration = decoder.total_duration();
                sink.append(decoder);
                duration
            }
        };

        Ok((sink, duration))
    }

    /// Starts the item at `index`. `pending` carries the generation an
    /// auto-advance was decided under; host requests pass `None`.
    fn start(&self, index: usize, pending: Option<u64>) -> Result<(), EngineError> {
        let (media, generation) = {
            let mut inner = self.inner.lock();
            let generation = match pending {
                Some(generation) if generation != inner.generation => {
                    debug!(index, "auto-advance dropped, superseded by a host request");
                    return Ok(());
                }
                Some(generation) => generation,
                None => {
                    inner.generation += 1;
                    inner.generation
                }
            };
            let media = inner
                .list
                .get(index)
                .cloned()
                .ok_or(EngineError::NoSuchItem {
                    index,
                    len: inner.list.len(),
                })?;
            (media, generation)
        };

        let (sink, duration) = self.load(&media)?;
        debug!(%media, index, ?duration, "media loaded");

        {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                debug!(%media, index, "load superseded, discarding sink");
                return Ok(());
            }
            sink.set_volume(inner.volume);
            sink.set_speed(inner.rate);
            sink.play();
            // 替换上一个sink，旧的sink随之停止
            inner.sink = Some(sink);
            inner.current = Some(index);
            inner.duration = duration;
            inner.status = Status::Playing;
        }

        self.emit_all(&[
            EngineEvent::MediaChanged(media),
            EngineEvent::SeekableChanged(duration.is_some()),
            EngineEvent::Playing,
        ]);
        Ok(())
    }

    fn poll(&self) {
        let mut events = Vec::new();
        let mut next = None;
        let generation;
        {
            let mut inner = self.inner.lock();
            if inner.status != Status::Playing {
                return;
            }
            let Some((empty, position)) = inner.sink.as_ref().map(|s| (s.empty(), s.get_pos()))
            else {
                return;
            };
            generation = inner.generation;

            if empty {
                // 播放结束，决定下一项
                inner.status = Status::Ended;
                events.push(EngineEvent::EndReached);
                next = Some(
                    inner
                        .current
                        .map(|i| i + 1)
                        .filter(|&i| i < inner.list.len()),
                );
            } else if let Some(duration) = inner.duration.filter(|d| !d.is_zero()) {
                let relative = (position.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0);
                events.push(EngineEvent::PositionChanged(relative as f32));
            }
        }

        self.emit_all(&events);

        match next {
            Some(Some(index)) => {
                if let Err(err) = self.start(index, Some(generation)) {
                    warn!(index, error = %err, "failed to advance to next item");
                    self.finish();
                }
            }
            Some(None) => self.finish(),
            None => {}
        }
    }

    fn finish(&self) {
        info!("end of media list");
        let _ = self.finished.send(());
    }
}

impl Engine for SinkEngine {
    fn event_manager(&self) -> &EventManager {
        &self.shared.events
    }

    fn is_playing(&self) -> bool {
        self.shared.inner.lock().status == Status::Playing
    }

    fn is_valid(&self) -> bool {
        self.shared.inner.lock().sink.is_some()
    }

    fn duration(&self) -> i64 {
        self.shared
            .inner
            .lock()
            .duration
            .map_or(-1, |d| d.as_millis() as i64)
    }

    fn position(&self) -> i64 {
        self.shared
            .inner
            .lock()
            .sink
            .as_ref()
            .map_or(0, |s| s.get_pos().as_millis() as i64)
    }

    fn set_media_list(&self, items: &[Media]) {
        debug!(len = items.len(), "media list replaced");
        let mut inner = self.shared.inner.lock();
        inner.list = items.to_vec();
        inner.generation += 1;
    }

    fn play_item_at_index(&self, index: usize) -> Result<(), EngineError> {
        self.shared.start(index, None)
    }

    fn stop(&self) {
        let stopped = {
            let mut inner = self.shared.inner.lock();
            if let Some(sink) = inner.sink.as_ref() {
                sink.stop();
            }
            let was_active = matches!(
                inner.status,
                Status::Playing | Status::Paused | Status::Ended
            );
            inner.status = Status::Stopped;
            inner.generation += 1;
            was_active
        };
        if stopped {
            self.shared.events.emit(&EngineEvent::Stopped);
        }
    }

    fn play(&self) -> Result<(), EngineError> {
        let restart = {
            let mut inner = self.shared.inner.lock();
            match inner.status {
                Status::Playing => return Ok(()),
                Status::Paused => {
                    if let Some(sink) = inner.sink.as_ref() {
                        sink.play();
                    }
                    inner.status = Status::Playing;
                    None
                }
                Status::Idle | Status::Stopped | Status::Ended => {
                    if inner.list.is_empty() {
                        return Err(EngineError::NothingLoaded);
                    }
                    Some(inner.current.unwrap_or(0))
                }
            }
        };

        match restart {
            Some(index) => self.shared.start(index, None),
            None => {
                self.shared.events.emit(&EngineEvent::Playing);
                Ok(())
            }
        }
    }

    fn pause(&self) {
        let paused = {
            let mut inner = self.shared.inner.lock();
            if inner.status != Status::Playing {
                false
            } else {
                if let Some(sink) = inner.sink.as_ref() {
                    sink.pause();
                }
                inner.status = Status::Paused;
                true
            }
        };
        if paused {
            self.shared.events.emit(&EngineEvent::Paused);
        }
    }

    fn seek(&self, position_ms: i64) -> Result<(), EngineError> {
        let inner = self.shared.inner.lock();
        let sink = inner.sink.as_ref().ok_or(EngineError::NothingLoaded)?;
        sink
            .try_seek(Duration::from_millis(position_ms.max(0) as u64))
            .map_err(|err| EngineError::Seek(err.to_string()))?;
        Ok(())
    }

    fn set_volume(&self, volume: f32) {
        let mut inner = self.shared.inner.lock();
        inner.volume = volume;
        if let Some(sink) = inner.sink.as_ref() {
            sink.set_volume(volume);
        }
    }

    fn set_rate(&self, rate: f32) {
        let mut inner = self.shared.inner.lock();
        inner.rate = rate;
        if let Some(sink) = inner.sink.as_ref() {
            sink.set_speed(rate);
        }
    }
}

impl Drop for SinkEngine {
    fn drop(&mut self) {
        // 通知轮询线程退出
        self.cancellation_token.cancel();
        // 停止当前播放
        if let Some(sink) = self.shared.inner.lock().sink.take() {
            sink.stop();
        }
        if let Some(poller) = self.poller.take() {
            let _ = poller.join();
        }
    }
}

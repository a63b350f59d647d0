use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rodio::OutputStreamBuilder;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use remu_player::{EngineConfig, Media, Player, SinkEngine};

/// Plays audio files or http(s) URLs in order, logging player events.
#[derive(Parser, Debug)]
#[command(name = "remu-player")]
#[command(version)]
struct Args {
    /// Media to play: file paths or http(s) URLs
    #[arg(required = true)]
    media: Vec<String>,

    /// TOML file with engine settings
    #[arg(short, long, env = "REMU_PLAYER_CONFIG")]
    config: Option<PathBuf>,

    /// Initial volume, 1.0 is unity gain
    #[arg(long)]
    volume: Option<f32>,

    /// Playback rate, 1.0 is normal speed
    #[arg(long)]
    rate: Option<f32>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remu_player=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // 读取配置，命令行参数优先
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(volume) = args.volume {
        config.volume = volume;
    }
    if let Some(rate) = args.rate {
        config.rate = rate;
    }
    config.validate()?;

    // 创建输出流和播放器
    let stream = OutputStreamBuilder::open_default_stream().context("opening audio output")?;
    let (volume, rate) = (config.volume, config.rate);
    let player = Player::new(SinkEngine::new(stream.mixer(), config));
    player.set_volume(volume);
    player.set_rate(rate);
    let finished = player.engine().finished();

    // 注册事件回调
    player.on_open(|media| info!(%media, "opened"));
    player.on_play(|| info!("playing"));
    player.on_pause(|| info!("paused"));
    player.on_stop(|| info!("stopped"));
    player.on_seekable(|seekable| info!(seekable, "seekable changed"));
    player.on_position(|ms| tracing::debug!(position_ms = ms, "position"));
    player.on_playlist(|| info!("playlist changed"));
    player.on_complete(|| info!("completed"));

    let media = args.media.iter().map(|m| Media::parse(m)).collect();
    player.open(media, true).context("starting playback")?;

    // The engine signals the end of the list even for media whose duration
    // is unknown, where the completion callback never fires.
    let _ = finished.recv();
    info!("playlist finished");
    Ok(())
}

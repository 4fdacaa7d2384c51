use anyhow::Result;
use clap::Parser;
use scribeflow::audio::{
    CaptureDeviceFactory, Converter, ConverterHooks, InMemoryUrlRegistry, Recorder,
    RecorderConfig, RecorderHooks, SymphoniaDecoder,
};
use scribeflow::{create_router, AppState, Config, TranscriptionClient};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "scribeflow", about = "Audio capture and normalization service")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config/scribeflow")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Scribeflow v0.1.0");
    info!("Loaded config: {}", cfg.service.name);

    let device = CaptureDeviceFactory::create(cfg.capture.source()?)?;
    let playback = Arc::new(InMemoryUrlRegistry::new());

    let recorder_config = RecorderConfig {
        constraints: cfg.capture.constraints(),
        chunk_interval: cfg.capture.chunk_interval(),
        ..RecorderConfig::default()
    };

    let recorder_hooks = RecorderHooks {
        on_recording_stop: Some(Box::new(|audio, _url| match audio {
            Some(audio) => info!(
                "Recording finalized: {} ({} bytes)",
                audio.suggested_filename,
                audio.bytes.len()
            ),
            None => warn!("Recording stopped with no audio"),
        })),
        on_permission_denied: Some(Box::new(|| warn!("Microphone permission denied"))),
        ..RecorderHooks::default()
    };

    let recorder = Recorder::new(recorder_config, recorder_hooks, device, playback.clone());

    let converter_hooks = ConverterHooks {
        on_conversion_progress: Some(Box::new(|percent| {
            debug!("Conversion progress: {}%", percent)
        })),
        on_conversion_end: Some(Box::new(|audio| match audio {
            Some(audio) => info!("Converted audio ready: {}", audio.filename),
            None => warn!("Conversion produced no output"),
        })),
    };

    let converter = Converter::new(Arc::new(SymphoniaDecoder), converter_hooks);
    let transcription = TranscriptionClient::new(&cfg.transcription)?;

    let state = AppState::new(
        recorder,
        converter,
        playback,
        transcription,
        cfg.transcription.language.clone(),
    );

    let router = create_router(state);
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, router).await?;

    Ok(())
}

use std::io::Write;
use std::process::ExitCode;

use playlist_loader::{Config, LoaderEvent, PlaylistLoader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let Some(url) = std::env::args().nth(1) else {
        error!("Usage: playlist-loader <manifest-url>");
        return ExitCode::from(2);
    };

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let loader = match PlaylistLoader::with_http(config) {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to create loader: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut events = loader.subscribe();
    loader.on_manifest_loading(&url);

    // Manifest, then the first level and the first audio rendition that has its own playlist
    let mut pending = 1;
    let mut status = ExitCode::SUCCESS;
    while pending > 0 {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(n)) => {
                warn!("Missed {} loader events", n);
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        pending -= 1;

        match event {
            LoaderEvent::ManifestLoaded {
                variants,
                audio_tracks,
                url,
                ..
            } => {
                info!("Manifest {}: {} variants", url, variants.len());
                print_json(&variants);
                if let Some(first) = variants.first() {
                    loader.on_level_loading(&first.url, 0);
                    pending += 1;
                }
                if let Some(track) = audio_tracks.iter().find(|t| !t.url.is_empty()) {
                    loader.on_audio_track_loading(&track.url, track.id as u32);
                    pending += 1;
                }
            }
            LoaderEvent::LevelLoaded { details, .. }
            | LoaderEvent::AudioTrackLoaded { details, .. } => {
                info!(
                    "Playlist {}: {} fragments, {:.3}s, live={}",
                    details.url,
                    details.fragments.len(),
                    details.total_duration,
                    details.live
                );
                print_json(&details);
            }
            LoaderEvent::Error(err) => {
                error!("{}", err);
                status = ExitCode::FAILURE;
                if err.fatal {
                    break;
                }
            }
        }
    }

    loader.destroy();
    status
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let _ = writeln!(std::io::stdout().lock(), "{}", json);
        }
        Err(e) => error!("Failed to serialize result: {}", e),
    }
}

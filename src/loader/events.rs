use tokio::sync::broadcast;

use super::LoadStats;
use crate::error::LoadError;
use crate::hls::{MediaGroupEntry, MediaPlaylist, VariantStream};

/// Results announced by the [`PlaylistLoader`](super::PlaylistLoader).
#[derive(Clone, Debug)]
pub enum LoaderEvent {
    /// A master playlist was parsed, or a manifest request returned a
    /// single media playlist (one variant pointing at `url`).
    ManifestLoaded {
        variants: Vec<VariantStream>,
        audio_tracks: Vec<MediaGroupEntry>,
        url: String,
        stats: LoadStats,
    },
    LevelLoaded {
        details: MediaPlaylist,
        level_id: Option<u32>,
        stats: LoadStats,
    },
    AudioTrackLoaded {
        details: MediaPlaylist,
        track_id: Option<u32>,
        stats: LoadStats,
    },
    Error(LoadError),
}

impl LoaderEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ManifestLoaded { .. } => "manifest-loaded",
            Self::LevelLoaded { .. } => "level-loaded",
            Self::AudioTrackLoaded { .. } => "audio-track-loaded",
            Self::Error(_) => "error",
        }
    }
}

/// Outbound event channel.
///
/// `publish()` is a sync call. If there are no subscribers, events are
/// silently dropped.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<LoaderEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: LoaderEvent) {
        let _ = self.tx.send(event);
    }

    /// Each subscriber gets an independent receiver. Slow subscribers
    /// receive `RecvError::Lagged(n)` instead of blocking the loader.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.tx.subscribe()
    }
}

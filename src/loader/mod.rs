//! Playlist load orchestration.
//!
//! [`PlaylistLoader`] keeps at most one request in flight per
//! [`RequestKind`]. Submitting a new request of a kind aborts the one in
//! flight; results of superseded requests are never announced.

pub mod events;
pub mod transport;

pub use events::{EventBus, LoaderEvent};
pub use transport::{
    HttpTransport, HttpTransportFactory, LoadOutcome, LoadRequest, LoadStats, LoaderCallbacks,
    LoaderResponse, ResponseInfo, Transport, TransportFactory,
};

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ErrorDetails, LoadError, Result};
use crate::hls::{
    FRAGMENT_DURATION_TAG, MediaType, PLAYLIST_HEADER, PlaylistKind, VariantStream,
    parse_master_playlist, parse_media_groups, parse_media_playlist,
};
use crate::metrics;

/// Logical request class. Each kind owns one in-flight slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestKind {
    Manifest,
    Level,
    AudioTrack,
}

impl RequestKind {
    pub const ALL: [RequestKind; 3] = [Self::Manifest, Self::Level, Self::AudioTrack];

    fn index(self) -> usize {
        match self {
            Self::Manifest => 0,
            Self::Level => 1,
            Self::AudioTrack => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::Level => "level",
            Self::AudioTrack => "audioTrack",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a request is for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestContext {
    pub kind: RequestKind,
    pub level_id: Option<u32>,
    pub track_id: Option<u32>,
}

impl RequestContext {
    pub fn manifest() -> Self {
        Self {
            kind: RequestKind::Manifest,
            level_id: None,
            track_id: None,
        }
    }

    pub fn level(level_id: u32) -> Self {
        Self {
            kind: RequestKind::Level,
            level_id: Some(level_id),
            track_id: None,
        }
    }

    pub fn audio_track(track_id: u32) -> Self {
        Self {
            kind: RequestKind::AudioTrack,
            level_id: None,
            track_id: Some(track_id),
        }
    }
}

struct Slot {
    generation: u64,
    transport: Arc<dyn Transport>,
}

#[derive(Default)]
struct Slots {
    active: [Option<Slot>; 3],
    next_generation: u64,
    destroyed: bool,
}

struct Inner {
    config: Config,
    factory: Box<dyn TransportFactory>,
    events: EventBus,
    slots: Mutex<Slots>,
}

/// Fetches playlists and announces parsed results on its [`EventBus`].
#[derive(Clone)]
pub struct PlaylistLoader {
    inner: Arc<Inner>,
}

impl PlaylistLoader {
    pub fn new(config: Config, factory: impl TransportFactory + 'static) -> Self {
        let events = EventBus::new(config.event_channel_capacity);
        Self {
            inner: Arc::new(Inner {
                config,
                factory: Box::new(factory),
                events,
                slots: Mutex::new(Slots::default()),
            }),
        }
    }

    /// Loader using [`HttpTransport`] with the configured user agent.
    pub fn with_http(config: Config) -> Result<Self> {
        let factory = HttpTransportFactory::new(&config.user_agent)?;
        Ok(Self::new(config, factory))
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.inner.events.subscribe()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn on_manifest_loading(&self, url: &str) {
        self.submit(url, RequestContext::manifest());
    }

    pub fn on_level_loading(&self, url: &str, level_id: u32) {
        self.submit(url, RequestContext::level(level_id));
    }

    pub fn on_audio_track_loading(&self, url: &str, track_id: u32) {
        self.submit(url, RequestContext::audio_track(track_id));
    }

    /// Start loading `url`, replacing any request of the same kind still in flight.
    pub fn submit(&self, url: &str, context: RequestContext) {
        let kind = context.kind;
        let policy = self.inner.config.retry_policy(kind).clone();
        let transport = self.inner.factory.create();

        let (generation, previous) = {
            let mut slots = self.inner.slots.lock();
            if slots.destroyed {
                warn!("Ignoring {} request for {} after destroy", kind, url);
                return;
            }
            slots.next_generation += 1;
            let generation = slots.next_generation;
            let previous = slots.active[kind.index()].replace(Slot {
                generation,
                transport: Arc::clone(&transport),
            });
            (generation, previous)
        };

        if let Some(previous) = previous {
            warn!("abort previous loader for type: {}", kind);
            metrics::record_abort(kind);
            previous.transport.abort();
        }

        let weak = Arc::downgrade(&self.inner);
        let request_url = url.to_string();
        let callback_context = context.clone();
        let callbacks = LoaderCallbacks::new(move |outcome, stats| {
            if let Some(inner) = weak.upgrade() {
                inner.complete(generation, &request_url, callback_context, outcome, stats);
            }
        });

        debug!("Loading {} playlist: {}", kind, url);
        transport.load(
            LoadRequest {
                url: url.to_string(),
                context,
                cache_key: String::new(),
                policy,
            },
            callbacks,
        );
    }

    /// Whether a request of `kind` is currently in flight.
    pub fn is_loading(&self, kind: RequestKind) -> bool {
        self.inner.slots.lock().active[kind.index()].is_some()
    }

    /// Abort every in-flight request. Later submits are ignored.
    pub fn destroy(&self) {
        let active: Vec<Slot> = {
            let mut slots = self.inner.slots.lock();
            slots.destroyed = true;
            slots.active.iter_mut().filter_map(Option::take).collect()
        };
        for slot in active {
            slot.transport.destroy();
        }
        debug!("Playlist loader destroyed");
    }
}

impl Inner {
    /// Clear the slot for `kind` if it still belongs to `generation`.
    fn release(&self, kind: RequestKind, generation: u64) -> Option<Slot> {
        let mut slots = self.slots.lock();
        let entry = &mut slots.active[kind.index()];
        if entry.as_ref().is_some_and(|slot| slot.generation == generation) {
            entry.take()
        } else {
            None
        }
    }

    fn complete(
        &self,
        generation: u64,
        url: &str,
        context: RequestContext,
        outcome: LoadOutcome,
        stats: LoadStats,
    ) {
        let kind = context.kind;
        let Some(slot) = self.release(kind, generation) else {
            debug!("Ignoring completion of superseded {} load: {}", kind, url);
            return;
        };
        metrics::record_duration(kind, stats.trequest);

        match outcome {
            LoadOutcome::Success(response) => self.handle_success(url, context, response, stats),
            LoadOutcome::Error(response) => {
                slot.transport.abort();
                metrics::record_request(kind, "error");
                let err = LoadError::new(ErrorDetails::load_error(kind), url.to_string(), context)
                    .with_response(response)
                    .with_stats(stats);
                warn!("{}", err);
                self.events.publish(LoaderEvent::Error(err));
            }
            LoadOutcome::Timeout => {
                slot.transport.abort();
                metrics::record_request(kind, "timeout");
                let err = LoadError::new(ErrorDetails::load_timeout(kind), url.to_string(), context)
                    .with_stats(stats);
                warn!("{}", err);
                self.events.publish(LoaderEvent::Error(err));
            }
        }
    }

    fn handle_success(
        &self,
        request_url: &str,
        context: RequestContext,
        response: LoaderResponse,
        mut stats: LoadStats,
    ) {
        let kind = context.kind;
        // Redirect target when known; data: URLs are not useful as a base
        let url = if response.url.is_empty() || response.url.starts_with("data:") {
            request_url.to_string()
        } else {
            response.url
        };
        stats.tload.get_or_insert_with(Instant::now);
        stats.mtime = response.last_modified;

        let text = response.text.trim_start_matches('\u{feff}');
        if !text.starts_with(PLAYLIST_HEADER) {
            self.parsing_error(url, context, stats, "no EXTM3U delimiter");
            return;
        }

        let event = if text.contains(FRAGMENT_DURATION_TAG) {
            match kind {
                RequestKind::Manifest => {
                    // Single rendition: the media playlist is parsed by the follow-up level request
                    info!("Manifest {} is a media playlist", url);
                    LoaderEvent::ManifestLoaded {
                        variants: vec![VariantStream::from_url(url.as_str())],
                        audio_tracks: Vec::new(),
                        url,
                        stats,
                    }
                }
                RequestKind::Level => {
                    let details =
                        parse_media_playlist(text, &url, context.level_id, PlaylistKind::Main);
                    stats.tparsed = Some(Instant::now());
                    LoaderEvent::LevelLoaded {
                        details,
                        level_id: context.level_id,
                        stats,
                    }
                }
                RequestKind::AudioTrack => {
                    let details =
                        parse_media_playlist(text, &url, context.track_id, PlaylistKind::Audio);
                    stats.tparsed = Some(Instant::now());
                    LoaderEvent::AudioTrackLoaded {
                        details,
                        track_id: context.track_id,
                        stats,
                    }
                }
            }
        } else {
            let variants = parse_master_playlist(text, &url);
            if variants.is_empty() {
                self.parsing_error(url, context, stats, "no level found in manifest");
                return;
            }
            let audio_tracks = parse_media_groups(text, &url, MediaType::Audio);
            stats.tparsed = Some(Instant::now());
            info!(
                "Manifest {} loaded: {} variants, {} audio tracks",
                url,
                variants.len(),
                audio_tracks.len()
            );
            LoaderEvent::ManifestLoaded {
                variants,
                audio_tracks,
                url,
                stats,
            }
        };

        metrics::record_request(kind, "loaded");
        self.events.publish(event);
    }

    fn parsing_error(&self, url: String, context: RequestContext, stats: LoadStats, reason: &str) {
        metrics::record_request(context.kind, "parse-error");
        let err = LoadError::new(ErrorDetails::ManifestParsingError, url, context)
            .with_reason(reason)
            .with_stats(stats);
        warn!("{}", err);
        self.events.publish(LoaderEvent::Error(err));
    }
}

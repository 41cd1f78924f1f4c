use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::loader::{LoadStats, RequestContext, RequestKind};
use crate::loader::transport::ResponseInfo;

/// Errors raised while fetching playlists or configuring the loader.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Request for {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LoaderError>;

/// Top-level category of an emitted error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Network,
}

/// Detail code attached to every emitted error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorDetails {
    ManifestLoadError,
    ManifestLoadTimeout,
    ManifestParsingError,
    LevelLoadError,
    LevelLoadTimeout,
    AudioTrackLoadError,
    AudioTrackLoadTimeout,
}

impl ErrorDetails {
    /// Detail code for a transport failure of the given request kind.
    pub fn load_error(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Manifest => Self::ManifestLoadError,
            RequestKind::Level => Self::LevelLoadError,
            RequestKind::AudioTrack => Self::AudioTrackLoadError,
        }
    }

    /// Detail code for a transport timeout of the given request kind.
    pub fn load_timeout(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Manifest => Self::ManifestLoadTimeout,
            RequestKind::Level => Self::LevelLoadTimeout,
            RequestKind::AudioTrack => Self::AudioTrackLoadTimeout,
        }
    }

    /// Manifest failures stop playback; level and audio track failures can be recovered by the caller.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            Self::ManifestLoadError | Self::ManifestLoadTimeout | Self::ManifestParsingError
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManifestLoadError => "manifest-load-error",
            Self::ManifestLoadTimeout => "manifest-load-timeout",
            Self::ManifestParsingError => "manifest-parsing-error",
            Self::LevelLoadError => "level-load-error",
            Self::LevelLoadTimeout => "level-load-timeout",
            Self::AudioTrackLoadError => "audio-track-load-error",
            Self::AudioTrackLoadTimeout => "audio-track-load-timeout",
        }
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a [`LoaderEvent::Error`](crate::loader::LoaderEvent::Error).
#[derive(Debug, Clone)]
pub struct LoadError {
    pub kind: ErrorKind,
    pub details: ErrorDetails,
    pub fatal: bool,
    pub url: String,
    /// Human readable cause for parsing failures.
    pub reason: Option<String>,
    pub context: RequestContext,
    /// Raw transport response, present for load errors.
    pub response: Option<ResponseInfo>,
    pub stats: Option<LoadStats>,
}

impl LoadError {
    pub(crate) fn new(details: ErrorDetails, url: String, context: RequestContext) -> Self {
        Self {
            kind: ErrorKind::Network,
            details,
            fatal: details.is_fatal(),
            url,
            reason: None,
            context,
            response: None,
            stats: None,
        }
    }

    pub(crate) fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    pub(crate) fn with_response(mut self, response: ResponseInfo) -> Self {
        self.response = Some(response);
        self
    }

    pub(crate) fn with_stats(mut self, stats: LoadStats) -> Self {
        self.stats = Some(stats);
        self
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} for {}", self.details, self.url)?;
        if let Some(reason) = &self.reason {
            write!(f, ": {}", reason)?;
        }
        if self.fatal {
            f.write_str(" (fatal)")?;
        }
        Ok(())
    }
}

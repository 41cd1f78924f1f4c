//! HLS playlist loading and parsing.
//!
//! [`PlaylistLoader`] fetches master and media playlists, one request in
//! flight per request kind, and announces parsed results or classified
//! errors on an [`EventBus`]. The parsers in [`hls`] are pure functions
//! over playlist text and can be used on their own.

pub mod config;
pub mod error;
pub mod hls;
pub mod loader;
pub mod metrics;

pub use config::{Config, RetryPolicy};
pub use error::{ErrorDetails, ErrorKind, LoadError, LoaderError, Result};
pub use loader::{
    EventBus, HttpTransport, HttpTransportFactory, LoaderEvent, PlaylistLoader, RequestContext,
    RequestKind, Transport, TransportFactory,
};

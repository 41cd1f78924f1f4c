//! HLS playlist text parsing.

pub mod attr_list;
pub mod master;
pub mod media;
pub mod media_group;
pub mod model;
pub mod url;

pub use attr_list::AttributeList;
pub use master::parse_master_playlist;
pub use media::parse_media_playlist;
pub use media_group::parse_media_groups;
pub use model::{
    EncryptionKey, Fragment, MediaGroupEntry, MediaPlaylist, MediaType, PlaylistKind, RawTag,
    VariantStream,
};

/// First line marker of every playlist.
pub const PLAYLIST_HEADER: &str = "#EXTM3U";

/// Tag that only appears in media playlists.
pub const FRAGMENT_DURATION_TAG: &str = "#EXTINF:";

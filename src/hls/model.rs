//! Parsed playlist data.
//!
//! Every value here is built fresh by a parse call and owned by whoever
//! receives the result; nothing is shared or mutated afterwards.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::attr_list::AttributeList;

/// One selectable rendition from a master playlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariantStream {
    /// Media playlist URL, resolved against the master playlist URL.
    pub url: String,
    pub attributes: AttributeList,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// `AVERAGE-BANDWIDTH` when declared, otherwise `BANDWIDTH`.
    pub bitrate: Option<u64>,
    pub name: Option<String>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
}

impl VariantStream {
    /// Variant standing in for a single-rendition manifest.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Alternate rendition group type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum MediaType {
    Audio,
    Video,
    Subtitles,
    ClosedCaptions,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "AUDIO",
            Self::Video => "VIDEO",
            Self::Subtitles => "SUBTITLES",
            Self::ClosedCaptions => "CLOSED-CAPTIONS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaGroupEntry {
    /// Position among the entries of the requested type, starting at 0.
    pub id: usize,
    pub group_id: Option<String>,
    /// `NAME`, or the language when no name is declared.
    pub name: Option<String>,
    pub is_default: bool,
    pub is_autoselect: bool,
    pub is_forced: bool,
    /// Empty when the rendition is carried in the variant stream itself.
    pub url: String,
    pub language: Option<String>,
}

/// Which kind of request a media playlist was loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistKind {
    Main,
    Audio,
}

/// Reference to a segment decryption key.
///
/// `key` is filled in by a separate key fetch step; parsing only captures
/// the method, URI and IV.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EncryptionKey {
    pub method: Option<String>,
    pub uri: Option<String>,
    pub key: Option<Vec<u8>>,
    pub iv: Option<[u8; 16]>,
}

impl EncryptionKey {
    /// Key reference for the segment with the given media sequence number.
    ///
    /// When the playlist declared no IV the sequence number is used, as a
    /// 128-bit big-endian integer.
    pub fn for_sequence(&self, sequence: u64) -> EncryptionKey {
        if self.method.is_some() && self.uri.is_some() && self.iv.is_none() {
            EncryptionKey {
                iv: Some(sequence_iv(sequence)),
                ..self.clone()
            }
        } else {
            self.clone()
        }
    }
}

/// 16-byte IV with the low 32 bits of `sequence` in the last four bytes.
pub fn sequence_iv(sequence: u64) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[12..].copy_from_slice(&(sequence as u32).to_be_bytes());
    iv
}

/// A tag line kept on a fragment for traceability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawTag {
    /// Tag name without the leading `#` (e.g. `EXTINF`, `EXT-X-DISCONTINUITY`).
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    /// Segment URL, resolved against the playlist URL.
    pub url: String,
    pub kind: PlaylistKind,
    pub start: f64,
    pub duration: f64,
    pub title: Option<String>,
    pub sequence_number: u64,
    pub level_id: Option<u32>,
    /// Discontinuity sequence (count of discontinuities seen so far).
    pub cc: u32,
    pub byte_range_start: Option<u64>,
    pub byte_range_end: Option<u64>,
    pub decrypt_data: Option<EncryptionKey>,
    pub program_date_time: Option<DateTime<FixedOffset>>,
    pub tags: Vec<RawTag>,
}

/// A parsed media playlist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaPlaylist {
    /// `EXT-X-PLAYLIST-TYPE`, uppercased.
    pub playlist_type: Option<String>,
    pub version: Option<u32>,
    pub url: String,
    pub fragments: Vec<Fragment>,
    /// Cleared by `EXT-X-ENDLIST`.
    pub live: bool,
    pub start_sn: u64,
    /// Sequence number of the last fragment, `start_sn - 1` when empty.
    pub end_sn: i64,
    pub target_duration: Option<f64>,
    pub total_duration: f64,
    /// `None` when the playlist has no fragments.
    pub average_target_duration: Option<f64>,
    pub start_time_offset: Option<f64>,
}

//! Media playlist parsing.
//!
//! A single pass over the playlist lines. Each line is classified into a
//! [`Line`] and fed to [`PlaylistBuilder`], which keeps the pending
//! per-fragment state and emits a [`Fragment`] whenever a URI line follows
//! an `EXTINF` tag.

use chrono::{DateTime, FixedOffset};
use tracing::{debug, warn};

use super::attr_list::AttributeList;
use super::model::{EncryptionKey, Fragment, MediaPlaylist, PlaylistKind, RawTag};
use super::url::resolve;

/// One classified playlist line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line<'a> {
    Blank,
    Header,
    PlaylistType(&'a str),
    MediaSequence(u64),
    TargetDuration(f64),
    Version(u32),
    Key(&'a str),
    Start(&'a str),
    Inf {
        duration: f64,
        title: Option<&'a str>,
        raw: &'a str,
    },
    ByteRange {
        length: u64,
        offset: Option<u64>,
    },
    EndList,
    Discontinuity,
    ProgramDateTime(&'a str),
    /// Any other `#` line: tag name and optional value.
    Comment {
        name: &'a str,
        value: Option<&'a str>,
    },
    Uri(&'a str),
    /// A known tag whose value could not be parsed.
    Malformed {
        name: &'a str,
        value: Option<&'a str>,
    },
}

/// Classify a single line (without its line terminator).
///
/// Surrounding whitespace is ignored.
pub fn classify_line(line: &str) -> Line<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Line::Blank;
    }

    let Some(tag) = line.strip_prefix('#') else {
        return Line::Uri(line);
    };

    if tag.starts_with("EXTM3U") {
        return Line::Header;
    }

    let (name, value) = match tag.split_once(':') {
        Some((name, value)) => (name, Some(value)),
        None => (tag, None),
    };

    let malformed = Line::Malformed { name, value };
    match (name, value) {
        ("EXT-X-PLAYLIST-TYPE", Some(v)) if !v.is_empty() => Line::PlaylistType(v),
        ("EXT-X-MEDIA-SEQUENCE", Some(v)) => leading_number(v)
            .and_then(|n| n.parse().ok())
            .map_or(malformed, Line::MediaSequence),
        ("EXT-X-TARGETDURATION", Some(v)) => leading_number(v)
            .and_then(|n| n.parse().ok())
            .map_or(malformed, Line::TargetDuration),
        ("EXT-X-VERSION", Some(v)) => leading_number(v)
            .and_then(|n| n.parse().ok())
            .map_or(malformed, Line::Version),
        ("EXT-X-KEY", Some(v)) if !v.is_empty() => Line::Key(v),
        ("EXT-X-START", Some(v)) if !v.is_empty() => Line::Start(v),
        ("EXTINF", Some(v)) => parse_inf(v).unwrap_or(malformed),
        ("EXT-X-BYTERANGE", Some(v)) => parse_byte_range(v).unwrap_or(malformed),
        ("EXT-X-ENDLIST", _) => Line::EndList,
        ("EXT-X-DISCONTINUITY", None) => Line::Discontinuity,
        ("EXT-X-PROGRAM-DATE-TIME", Some(v)) if !v.is_empty() => Line::ProgramDateTime(v),
        _ => Line::Comment { name, value },
    }
}

/// Digits with an optional fractional part at the start of `s`.
fn leading_number(s: &str) -> Option<&str> {
    let s = s.trim_start();
    let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
    if int_len == 0 {
        return None;
    }
    let rest = &s[int_len..];
    let frac_len = match rest.strip_prefix('.') {
        Some(frac) => match frac.bytes().take_while(u8::is_ascii_digit).count() {
            0 => 0,
            n => n + 1,
        },
        None => 0,
    };
    Some(&s[..int_len + frac_len])
}

fn parse_inf(value: &str) -> Option<Line<'_>> {
    let number = leading_number(value)?;
    let duration = number.parse().ok()?;
    let title = value
        .trim_start()
        .get(number.len()..)
        .and_then(|rest| rest.strip_prefix(','))
        .filter(|t| !t.is_empty());
    Some(Line::Inf {
        duration,
        title,
        raw: value,
    })
}

fn parse_byte_range(value: &str) -> Option<Line<'_>> {
    let (length, offset) = match value.trim().split_once('@') {
        Some((length, offset)) => (length, Some(offset)),
        None => (value.trim(), None),
    };
    let length = length.parse().ok()?;
    let offset: Option<u64> = match offset {
        Some(o) => Some(leading_number(o)?.split('.').next()?.parse().ok()?),
        None => None,
    };
    // The end offset must be representable
    if let Some(o) = offset {
        o.checked_add(length)?;
    }
    Some(Line::ByteRange { length, offset })
}

fn parse_program_date_time(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

/// Scan state for one media playlist.
struct PlaylistBuilder<'a> {
    base_url: &'a str,
    level_id: Option<u32>,
    kind: PlaylistKind,
    playlist: MediaPlaylist,

    current_sn: u64,
    total_duration: f64,
    cc: u32,
    level_key: EncryptionKey,
    last_byte_range_end: Option<u64>,

    duration: Option<f64>,
    title: Option<String>,
    byte_range_start: Option<u64>,
    program_date_time: Option<DateTime<FixedOffset>>,
    tags: Vec<RawTag>,
}

impl<'a> PlaylistBuilder<'a> {
    fn new(base_url: &'a str, level_id: Option<u32>, kind: PlaylistKind) -> Self {
        Self {
            base_url,
            level_id,
            kind,
            playlist: MediaPlaylist {
                playlist_type: None,
                version: None,
                url: base_url.to_string(),
                fragments: Vec::new(),
                live: true,
                start_sn: 0,
                end_sn: -1,
                target_duration: None,
                total_duration: 0.0,
                average_target_duration: None,
                start_time_offset: None,
            },
            current_sn: 0,
            total_duration: 0.0,
            cc: 0,
            level_key: EncryptionKey::default(),
            last_byte_range_end: None,
            duration: None,
            title: None,
            byte_range_start: None,
            program_date_time: None,
            tags: Vec::new(),
        }
    }

    fn push_tag(&mut self, name: &str, value: Option<&str>) {
        self.tags.push(RawTag {
            name: name.to_string(),
            value: value.map(str::to_string),
        });
    }

    fn apply(&mut self, line: Line<'_>) {
        match line {
            Line::Blank | Line::Header => {}
            Line::PlaylistType(t) => {
                self.playlist.playlist_type = Some(t.trim().to_uppercase());
            }
            Line::MediaSequence(sn) => {
                self.current_sn = sn;
                self.playlist.start_sn = sn;
            }
            Line::TargetDuration(d) => self.playlist.target_duration = Some(d),
            Line::Version(v) => self.playlist.version = Some(v),
            Line::EndList => self.playlist.live = false,
            Line::Discontinuity => {
                self.cc += 1;
                self.push_tag("EXT-X-DISCONTINUITY", None);
            }
            Line::ByteRange { length, offset } => {
                let start = offset.unwrap_or_else(|| self.last_byte_range_end.unwrap_or(0));
                match start.checked_add(length) {
                    Some(end) => {
                        self.byte_range_start = Some(start);
                        self.last_byte_range_end = Some(end);
                    }
                    None => {
                        warn!("EXT-X-BYTERANGE length {} past offset {} ignored", length, start);
                        self.byte_range_start = None;
                    }
                }
            }
            Line::Inf {
                duration,
                title,
                raw,
            } => {
                self.duration = Some(duration);
                self.title = title.map(str::to_string);
                self.push_tag("EXTINF", Some(raw));
            }
            Line::Uri(uri) => self.emit_fragment(uri),
            Line::Key(attrs) => self.apply_key(attrs),
            Line::Start(attrs) => {
                if let Some(offset) =
                    AttributeList::parse(attrs).decimal_floating_point("TIME-OFFSET")
                {
                    self.playlist.start_time_offset = Some(offset);
                }
            }
            Line::ProgramDateTime(value) => {
                self.program_date_time = parse_program_date_time(value);
                if self.program_date_time.is_none() {
                    debug!("Unparseable EXT-X-PROGRAM-DATE-TIME: {}", value);
                }
                self.push_tag("EXT-X-PROGRAM-DATE-TIME", Some(value));
            }
            Line::Comment { name, value } => self.push_tag(name, value),
            Line::Malformed { name, value } => {
                warn!("line parsed but not handled: #{}:{}", name, value.unwrap_or_default());
                self.push_tag(name, value);
            }
        }
    }

    fn apply_key(&mut self, attrs: &str) {
        let attrs = AttributeList::parse(attrs);
        let Some(method) = attrs.enumerated_string("METHOD") else {
            return;
        };

        self.level_key = EncryptionKey::default();
        match (method, attrs.get("URI")) {
            ("AES-128", Some(uri)) => {
                self.level_key.method = Some(method.to_string());
                self.level_key.uri = Some(resolve(uri, self.base_url));
                self.level_key.iv = attrs.hexadecimal_integer("IV").map(|bytes| iv_from_bytes(&bytes));
            }
            _ => debug!("Encryption key with method {} is not applied", method),
        }
    }

    fn emit_fragment(&mut self, uri: &str) {
        let Some(duration) = self.duration.take() else {
            debug!("URI line without EXTINF ignored: {}", uri);
            return;
        };

        let sn = self.current_sn;
        self.current_sn = sn.saturating_add(1);

        let byte_range_start = self.byte_range_start.take();
        let decrypt_data = self
            .level_key
            .method
            .is_some()
            .then(|| self.level_key.for_sequence(sn));

        self.playlist.fragments.push(Fragment {
            url: resolve(uri, self.base_url),
            kind: self.kind,
            start: self.total_duration,
            duration,
            title: self.title.take(),
            sequence_number: sn,
            level_id: self.level_id,
            cc: self.cc,
            byte_range_start,
            byte_range_end: byte_range_start.and(self.last_byte_range_end),
            decrypt_data,
            program_date_time: self.program_date_time.take(),
            tags: std::mem::take(&mut self.tags),
        });
        self.total_duration += duration;
    }

    fn finish(mut self) -> MediaPlaylist {
        if let Some(duration) = self.duration {
            debug!(
                "Discarding trailing fragment without URI (duration {})",
                duration
            );
        }

        let count = self.playlist.fragments.len();
        self.playlist.total_duration = self.total_duration;
        self.playlist.average_target_duration =
            (count > 0).then(|| self.total_duration / count as f64);
        self.playlist.end_sn = match self.playlist.fragments.last() {
            Some(last) => i64::try_from(last.sequence_number).unwrap_or(i64::MAX),
            None => i64::try_from(self.current_sn).map_or(i64::MAX, |sn| sn - 1),
        };
        self.playlist
    }
}

/// Right-align an IV attribute into 16 bytes.
fn iv_from_bytes(bytes: &[u8]) -> [u8; 16] {
    let mut iv = [0u8; 16];
    let take = bytes.len().min(16);
    iv[16 - take..].copy_from_slice(&bytes[bytes.len() - take..]);
    iv
}

/// Parse a media playlist into its fragment timeline.
///
/// `base_url` is the playlist's own (post-redirect) URL and is used to
/// resolve fragment and key URIs. `level_id` and `kind` are copied onto
/// every fragment.
pub fn parse_media_playlist(
    content: &str,
    base_url: &str,
    level_id: Option<u32>,
    kind: PlaylistKind,
) -> MediaPlaylist {
    let mut builder = PlaylistBuilder::new(base_url, level_id, kind);
    for line in content.lines() {
        builder.apply(classify_line(line));
    }

    let playlist = builder.finish();
    debug!(
        "Parsed media playlist {}: {} fragments, {:.3}s",
        playlist.url,
        playlist.fragments.len(),
        playlist.total_duration
    );
    playlist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::model::sequence_iv;

    const BASE: &str = "https://cdn.example.com/live/index.m3u8";

    fn parse(content: &str) -> MediaPlaylist {
        parse_media_playlist(content, BASE, Some(2), PlaylistKind::Main)
    }

    const VOD: &str = "\
#EXTM3U
#EXT-X-VERSION:3
#EXT-X-PLAYLIST-TYPE:vod
#EXT-X-TARGETDURATION:10
#EXT-X-MEDIA-SEQUENCE:7
#EXTINF:9.009,first
seg7.ts
#EXTINF:10.0,
seg8.ts
#EXTINF:4.5
https://other.example.com/seg9.ts
#EXT-X-ENDLIST
";

    // -- classify_line -------------------------------------------------------

    #[test]
    fn classifies_structural_tags() {
        assert_eq!(classify_line("#EXTM3U"), Line::Header);
        assert_eq!(classify_line(""), Line::Blank);
        assert_eq!(classify_line("#EXT-X-MEDIA-SEQUENCE:42"), Line::MediaSequence(42));
        assert_eq!(classify_line("#EXT-X-TARGETDURATION:6"), Line::TargetDuration(6.0));
        assert_eq!(classify_line("#EXT-X-VERSION:7\r"), Line::Version(7));
        assert_eq!(classify_line("#EXT-X-ENDLIST"), Line::EndList);
        assert_eq!(classify_line("#EXT-X-DISCONTINUITY"), Line::Discontinuity);
        assert_eq!(classify_line("seg0.ts"), Line::Uri("seg0.ts"));
    }

    #[test]
    fn classifies_extinf_with_and_without_title() {
        assert_eq!(
            classify_line("#EXTINF:9.5,Intro"),
            Line::Inf {
                duration: 9.5,
                title: Some("Intro"),
                raw: "9.5,Intro"
            }
        );
        assert_eq!(
            classify_line("#EXTINF:10,"),
            Line::Inf {
                duration: 10.0,
                title: None,
                raw: "10,"
            }
        );
    }

    #[test]
    fn classifies_byte_ranges() {
        assert_eq!(
            classify_line("#EXT-X-BYTERANGE:100@0"),
            Line::ByteRange {
                length: 100,
                offset: Some(0)
            }
        );
        assert_eq!(
            classify_line("#EXT-X-BYTERANGE:50"),
            Line::ByteRange {
                length: 50,
                offset: None
            }
        );
    }

    #[test]
    fn other_tags_are_comments() {
        assert_eq!(
            classify_line("#EXT-X-DISCONTINUITY-SEQUENCE:3"),
            Line::Comment {
                name: "EXT-X-DISCONTINUITY-SEQUENCE",
                value: Some("3")
            }
        );
        assert_eq!(
            classify_line("#EXT-X-INDEPENDENT-SEGMENTS"),
            Line::Comment {
                name: "EXT-X-INDEPENDENT-SEGMENTS",
                value: None
            }
        );
    }

    #[test]
    fn malformed_values_are_flagged() {
        assert_eq!(
            classify_line("#EXT-X-MEDIA-SEQUENCE:abc"),
            Line::Malformed {
                name: "EXT-X-MEDIA-SEQUENCE",
                value: Some("abc")
            }
        );
        assert!(matches!(classify_line("#EXTINF:,title"), Line::Malformed { .. }));
        assert!(matches!(classify_line("#EXTINF:-1,"), Line::Malformed { .. }));
        assert!(matches!(
            classify_line("#EXT-X-BYTERANGE:18446744073709551615@10"),
            Line::Malformed { .. }
        ));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(classify_line("   indented.ts"), Line::Uri("indented.ts"));
        assert_eq!(classify_line("\tseg.ts  \r"), Line::Uri("seg.ts"));
        assert_eq!(classify_line("  #EXT-X-ENDLIST"), Line::EndList);
        assert_eq!(classify_line("   "), Line::Blank);
    }

    // -- parse_media_playlist ------------------------------------------------

    #[test]
    fn parses_vod_playlist_metadata() {
        let playlist = parse(VOD);

        assert_eq!(playlist.playlist_type.as_deref(), Some("VOD"));
        assert_eq!(playlist.version, Some(3));
        assert_eq!(playlist.target_duration, Some(10.0));
        assert_eq!(playlist.url, BASE);
        assert!(!playlist.live);
        assert_eq!(playlist.start_sn, 7);
        assert_eq!(playlist.end_sn, 9);
    }

    #[test]
    fn fragments_carry_cumulative_timing() {
        let playlist = parse(VOD);
        let frags = &playlist.fragments;

        assert_eq!(frags.len(), 3);
        assert_eq!(
            frags.iter().map(|f| f.sequence_number).collect::<Vec<_>>(),
            vec![7, 8, 9]
        );
        assert_eq!(frags[0].start, 0.0);
        assert!((frags[1].start - 9.009).abs() < 1e-9);
        assert!((frags[2].start - 19.009).abs() < 1e-9);
        assert_eq!(frags[0].title.as_deref(), Some("first"));
        assert_eq!(frags[1].title, None);
        assert_eq!(frags[0].url, "https://cdn.example.com/live/seg7.ts");
        assert_eq!(frags[2].url, "https://other.example.com/seg9.ts");
        assert_eq!(frags[0].level_id, Some(2));
        assert_eq!(frags[0].kind, PlaylistKind::Main);

        let sum: f64 = frags.iter().map(|f| f.duration).sum();
        assert!((playlist.total_duration - sum).abs() < 1e-9);
        assert!((playlist.average_target_duration.unwrap() - sum / 3.0).abs() < 1e-9);
    }

    #[test]
    fn sequence_defaults_to_zero_and_live_without_endlist() {
        let playlist = parse("#EXTM3U\n#EXTINF:2,\na.ts\n#EXTINF:2,\nb.ts\n");
        assert!(playlist.live);
        assert_eq!(playlist.start_sn, 0);
        assert_eq!(
            playlist
                .fragments
                .iter()
                .map(|f| f.sequence_number)
                .collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert_eq!(playlist.end_sn, 1);
    }

    #[test]
    fn trailing_extinf_without_uri_is_dropped() {
        let complete = "#EXTM3U\n#EXTINF:4,\na.ts\n#EXTINF:5,\nb.ts\n";
        let truncated = format!("{complete}#EXTINF:6,\n");

        let a = parse(complete);
        let b = parse(&truncated);

        assert_eq!(a.fragments.len(), b.fragments.len());
        assert_eq!(a.total_duration, b.total_duration);
        assert_eq!(b.total_duration, 9.0);
        assert_eq!(b.end_sn, 1);
    }

    #[test]
    fn empty_playlist_has_no_average() {
        let playlist = parse("#EXTM3U\n#EXT-X-MEDIA-SEQUENCE:10\n#EXT-X-ENDLIST\n");
        assert!(playlist.fragments.is_empty());
        assert_eq!(playlist.total_duration, 0.0);
        assert_eq!(playlist.average_target_duration, None);
        assert_eq!(playlist.end_sn, 9);
    }

    #[test]
    fn byte_range_continues_from_previous_end() {
        let playlist = parse(
            "#EXTM3U\n\
#EXTINF:1,\n#EXT-X-BYTERANGE:100@0\nmain.ts\n\
#EXTINF:1,\n#EXT-X-BYTERANGE:50\nmain.ts\n\
#EXTINF:1,\nother.ts\n",
        );
        let frags = &playlist.fragments;

        assert_eq!(frags[0].byte_range_start, Some(0));
        assert_eq!(frags[0].byte_range_end, Some(100));
        assert_eq!(frags[1].byte_range_start, Some(100));
        assert_eq!(frags[1].byte_range_end, Some(150));
        assert_eq!(frags[2].byte_range_start, None);
        assert_eq!(frags[2].byte_range_end, None);
    }

    #[test]
    fn discontinuities_increment_cc() {
        let playlist = parse(
            "#EXTM3U\n\
#EXTINF:2,\na.ts\n\
#EXT-X-DISCONTINUITY\n#EXTINF:2,\nb.ts\n\
#EXTINF:2,\nc.ts\n\
#EXT-X-DISCONTINUITY\n#EXT-X-DISCONTINUITY\n#EXTINF:2,\nd.ts\n",
        );
        let cc: Vec<u32> = playlist.fragments.iter().map(|f| f.cc).collect();
        assert_eq!(cc, vec![0, 1, 1, 3]);
        assert_eq!(playlist.fragments[1].tags[0].name, "EXT-X-DISCONTINUITY");
    }

    #[test]
    fn implicit_iv_derived_from_sequence_number() {
        let playlist = parse(
            "#EXTM3U\n#EXT-X-MEDIA-SEQUENCE:5\n\
#EXT-X-KEY:METHOD=AES-128,URI=\"keys/k1.bin\"\n\
#EXTINF:4,\na.ts\n#EXTINF:4,\nb.ts\n",
        );
        let k5 = playlist.fragments[0].decrypt_data.as_ref().unwrap();
        let k6 = playlist.fragments[1].decrypt_data.as_ref().unwrap();

        assert_eq!(k5.method.as_deref(), Some("AES-128"));
        assert_eq!(k5.uri.as_deref(), Some("https://cdn.example.com/live/keys/k1.bin"));
        assert_eq!(k5.key, None);
        assert_eq!(k5.iv, Some(sequence_iv(5)));
        assert_eq!(k6.iv, Some(sequence_iv(6)));

        let (iv5, iv6) = (k5.iv.unwrap(), k6.iv.unwrap());
        assert_eq!(iv5[..12], iv6[..12]);
        assert_eq!(iv5[12..], [0, 0, 0, 5]);
        assert_eq!(iv6[12..], [0, 0, 0, 6]);
    }

    #[test]
    fn explicit_iv_is_kept() {
        let playlist = parse(
            "#EXTM3U\n\
#EXT-X-KEY:METHOD=AES-128,URI=\"k.bin\",IV=0x0000000000000000000000000000ABCD\n\
#EXTINF:4,\na.ts\n#EXTINF:4,\nb.ts\n",
        );
        let expected = {
            let mut iv = [0u8; 16];
            iv[14] = 0xab;
            iv[15] = 0xcd;
            iv
        };
        for frag in &playlist.fragments {
            assert_eq!(frag.decrypt_data.as_ref().unwrap().iv, Some(expected));
        }
    }

    #[test]
    fn method_none_clears_key_and_missing_method_keeps_it() {
        let playlist = parse(
            "#EXTM3U\n\
#EXT-X-KEY:METHOD=AES-128,URI=\"k.bin\"\n#EXTINF:4,\na.ts\n\
#EXT-X-KEY:URI=\"ignored.bin\"\n#EXTINF:4,\nb.ts\n\
#EXT-X-KEY:METHOD=NONE\n#EXTINF:4,\nc.ts\n",
        );
        let frags = &playlist.fragments;
        assert!(frags[0].decrypt_data.is_some());
        assert_eq!(
            frags[1].decrypt_data.as_ref().unwrap().uri.as_deref(),
            Some("https://cdn.example.com/live/k.bin")
        );
        assert_eq!(frags[2].decrypt_data, None);
    }

    #[test]
    fn start_offset_and_program_date_time() {
        let playlist = parse(
            "#EXTM3U\n#EXT-X-START:TIME-OFFSET=-12.5,PRECISE=YES\n\
#EXT-X-PROGRAM-DATE-TIME:2026-01-01T00:00:00.000Z\n#EXTINF:2,\na.ts\n\
#EXTINF:2,\nb.ts\n",
        );
        assert_eq!(playlist.start_time_offset, Some(-12.5));

        let pdt = playlist.fragments[0].program_date_time.unwrap();
        assert_eq!(pdt.to_rfc3339(), "2026-01-01T00:00:00+00:00");
        assert_eq!(playlist.fragments[1].program_date_time, None);
    }

    #[test]
    fn raw_tags_are_buffered_per_fragment() {
        let playlist = parse(
            "#EXTM3U\n#EXT-X-CUE-OUT:30\n#EXTINF:2,\na.ts\n#EXTINF:3,\nb.ts\n",
        );
        let names: Vec<&str> = playlist.fragments[0]
            .tags
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["EXT-X-CUE-OUT", "EXTINF"]);
        assert_eq!(playlist.fragments[0].tags[0].value.as_deref(), Some("30"));
        assert_eq!(playlist.fragments[1].tags.len(), 1);
    }

    #[test]
    fn indented_uri_still_emits_fragment() {
        let playlist = parse("#EXTM3U\n#EXTINF:4,\n  a.ts\n#EXTINF:5,\nb.ts\n");
        let frags = &playlist.fragments;

        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0].url, "https://cdn.example.com/live/a.ts");
        assert_eq!(frags[1].tags.len(), 1);
        assert_eq!(playlist.total_duration, 9.0);
    }

    #[test]
    fn malformed_tags_are_kept_as_raw_tags() {
        let playlist = parse("#EXTM3U\n#EXTINF:-1,\n#EXTINF:2,\na.ts\n");
        let tags = &playlist.fragments[0].tags;

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "EXTINF");
        assert_eq!(tags[0].value.as_deref(), Some("-1,"));
        assert_eq!(playlist.fragments[0].duration, 2.0);
    }

    #[test]
    fn media_sequence_at_upper_bound_does_not_overflow() {
        let playlist = parse(
            "#EXTM3U\n#EXT-X-MEDIA-SEQUENCE:18446744073709551615\n\
#EXTINF:1,\na.ts\n#EXTINF:1,\nb.ts\n",
        );

        assert_eq!(playlist.start_sn, u64::MAX);
        assert_eq!(playlist.fragments.len(), 2);
        assert_eq!(playlist.fragments[0].sequence_number, u64::MAX);
        assert_eq!(playlist.fragments[1].sequence_number, u64::MAX);
        assert_eq!(playlist.end_sn, i64::MAX);

        let empty = parse("#EXTM3U\n#EXT-X-MEDIA-SEQUENCE:18446744073709551615\n");
        assert_eq!(empty.end_sn, i64::MAX);
    }

    #[test]
    fn oversized_byte_ranges_are_ignored() {
        let playlist = parse(
            "#EXTM3U\n\
#EXTINF:1,\n#EXT-X-BYTERANGE:18446744073709551615@10\na.ts\n\
#EXTINF:1,\n#EXT-X-BYTERANGE:18446744073709551615@0\nb.ts\n\
#EXTINF:1,\n#EXT-X-BYTERANGE:1\nc.ts\n",
        );
        let frags = &playlist.fragments;

        assert_eq!(frags.len(), 3);
        assert_eq!(frags[0].byte_range_start, None);
        assert_eq!(frags[0].tags[1].name, "EXT-X-BYTERANGE");
        assert_eq!(frags[1].byte_range_start, Some(0));
        assert_eq!(frags[1].byte_range_end, Some(u64::MAX));
        // Continuing past u64::MAX has no representable end
        assert_eq!(frags[2].byte_range_start, None);
        assert_eq!(frags[2].byte_range_end, None);
    }

    #[test]
    fn audio_playlist_fragments_are_tagged() {
        let playlist = parse_media_playlist(
            "#EXTM3U\n#EXTINF:2,\na.aac\n",
            BASE,
            None,
            PlaylistKind::Audio,
        );
        assert_eq!(playlist.fragments[0].kind, PlaylistKind::Audio);
        assert_eq!(playlist.fragments[0].level_id, None);
    }
}

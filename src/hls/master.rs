//! Variant stream extraction from master playlists.

use tracing::debug;

use super::attr_list::AttributeList;
use super::model::VariantStream;
use super::url::resolve;

const STREAM_INF: &str = "#EXT-X-STREAM-INF:";

/// Collect every `EXT-X-STREAM-INF` entry, in playlist order.
///
/// The line after the tag (blank lines skipped) is the variant URI and is
/// resolved against `base_url`. Duplicate entries are kept.
pub fn parse_master_playlist(content: &str, base_url: &str) -> Vec<VariantStream> {
    let mut variants = Vec::new();
    let mut lines = content.lines().map(str::trim_end);

    while let Some(line) = lines.next() {
        let Some(attr_line) = line.strip_prefix(STREAM_INF) else {
            continue;
        };
        let Some(uri) = lines.by_ref().find(|l| !l.trim().is_empty()) else {
            debug!("EXT-X-STREAM-INF without URI at end of playlist");
            break;
        };
        variants.push(build_variant(attr_line, uri.trim(), base_url));
    }

    debug!("Found {} variant streams", variants.len());
    variants
}

fn build_variant(attr_line: &str, uri: &str, base_url: &str) -> VariantStream {
    let attributes = AttributeList::parse(attr_line);

    let (width, height) = match attributes.decimal_resolution("RESOLUTION") {
        Some((w, h)) => (Some(w), Some(h)),
        None => (None, None),
    };
    let bitrate = attributes
        .decimal_integer("AVERAGE-BANDWIDTH")
        .filter(|bw| *bw > 0)
        .or_else(|| attributes.decimal_integer("BANDWIDTH"));
    let name = attributes.get("NAME").map(str::to_string);

    let mut video_codec = None;
    let mut audio_codec = None;
    if let Some(codecs) = attributes.get("CODECS") {
        for codec in codecs.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            if codec.contains("avc1") {
                video_codec = Some(avc1_to_avcoti(codec));
            } else {
                audio_codec = Some(codec.to_string());
            }
        }
    }

    VariantStream {
        url: resolve(uri, base_url),
        attributes,
        width,
        height,
        bitrate,
        name,
        video_codec,
        audio_codec,
    }
}

/// Rewrite the legacy decimal AVC form `avc1.<profile>.<level>` into the
/// RFC 6381 hex form `avc1.<PP><CCLL>`: profile in hex, then the level in
/// hex zero-padded to four digits (constraint byte `00`).
///
/// Codecs that are not in the three-field decimal form are returned as-is.
pub fn avc1_to_avcoti(codec: &str) -> String {
    let fields: Vec<&str> = codec.split('.').collect();
    if fields.len() < 3 {
        return codec.to_string();
    }

    match (fields[1].parse::<u32>(), fields[2].parse::<u32>()) {
        (Ok(profile), Ok(level)) => format!("{}.{:x}{:04x}", fields[0], profile, level),
        _ => codec.to_string(),
    }
}

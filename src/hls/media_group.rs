use tracing::debug;

use super::attr_list::AttributeList;
use super::model::{MediaGroupEntry, MediaType};
use super::url::resolve;

const MEDIA: &str = "#EXT-X-MEDIA:";

/// Collect the `EXT-X-MEDIA` renditions of type `media_type`.
///
/// Ids are assigned from 0 in playlist order, counting only the retained
/// entries. A rendition without `URI` gets an empty `url`.
pub fn parse_media_groups(
    content: &str,
    base_url: &str,
    media_type: MediaType,
) -> Vec<MediaGroupEntry> {
    let mut entries: Vec<MediaGroupEntry> = Vec::new();

    for line in content.lines() {
        let Some(attr_line) = line.trim_end().strip_prefix(MEDIA) else {
            continue;
        };
        let attrs = AttributeList::parse(attr_line);
        if attrs.enumerated_string("TYPE") != Some(media_type.as_str()) {
            continue;
        }

        let language = attrs.get("LANGUAGE").map(str::to_string);
        let name = attrs
            .get("NAME")
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| language.clone());

        entries.push(MediaGroupEntry {
            id: entries.len(),
            group_id: attrs.get("GROUP-ID").map(str::to_string),
            name,
            is_default: attrs.flag("DEFAULT"),
            is_autoselect: attrs.flag("AUTOSELECT"),
            is_forced: attrs.flag("FORCED"),
            url: attrs
                .get("URI")
                .map(|uri| resolve(uri, base_url))
                .unwrap_or_default(),
            language,
        });
    }

    debug!("Found {} {} renditions", entries.len(), media_type.as_str());
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "\
#EXTM3U
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",NAME=\"English\",LANGUAGE=\"en\",DEFAULT=YES,AUTOSELECT=YES,URI=\"audio/en.m3u8\"
#EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID=\"subs\",NAME=\"English\",LANGUAGE=\"en\",URI=\"subs/en.m3u8\"
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",LANGUAGE=\"fr\",FORCED=YES
#EXT-X-STREAM-INF:BANDWIDTH=100000,AUDIO=\"aac\"
low.m3u8
";

    #[test]
    fn keeps_only_requested_type() {
        let audio = parse_media_groups(MASTER, "https://example.com/master.m3u8", MediaType::Audio);
        assert_eq!(audio.len(), 2);
        assert_eq!(audio[0].id, 0);
        assert_eq!(audio[1].id, 1);

        let subs = parse_media_groups(
            MASTER,
            "https://example.com/master.m3u8",
            MediaType::Subtitles,
        );
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, 0);
        assert_eq!(subs[0].url, "https://example.com/subs/en.m3u8");
    }

    #[test]
    fn builds_entry_fields() {
        let audio = parse_media_groups(MASTER, "https://example.com/master.m3u8", MediaType::Audio);

        let en = &audio[0];
        assert_eq!(en.group_id.as_deref(), Some("aac"));
        assert_eq!(en.name.as_deref(), Some("English"));
        assert!(en.is_default);
        assert!(en.is_autoselect);
        assert!(!en.is_forced);
        assert_eq!(en.url, "https://example.com/audio/en.m3u8");
        assert_eq!(en.language.as_deref(), Some("en"));
    }

    #[test]
    fn name_falls_back_to_language_and_url_to_empty() {
        let audio = parse_media_groups(MASTER, "https://example.com/master.m3u8", MediaType::Audio);

        let fr = &audio[1];
        assert_eq!(fr.name.as_deref(), Some("fr"));
        assert!(fr.is_forced);
        assert!(!fr.is_default);
        assert_eq!(fr.url, "");
    }
}

//! Attribute-list tokenizer for tag values such as
//! `BANDWIDTH=1280000,CODECS="avc1.4d401f,mp4a.40.2",RESOLUTION=640x360`.
//!
//! Values are kept as raw strings (quotes stripped) and converted on demand
//! by the typed accessors. Malformed values read as `None`.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeList {
    attrs: Vec<(String, String)>,
}

impl AttributeList {
    /// Tokenize a comma separated `KEY=value` list.
    ///
    /// Quoted values may contain commas. Pairs without `=` are skipped.
    pub fn parse(input: &str) -> Self {
        let mut attrs = Vec::new();
        let mut rest = input;

        while !rest.is_empty() {
            let Some(eq) = rest.find('=') else {
                break;
            };
            let key = rest[..eq].rsplit(',').next().unwrap_or_default().trim();
            let after = &rest[eq + 1..];

            let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
                match quoted.find('"') {
                    Some(close) => {
                        let tail = &quoted[close + 1..];
                        let next = tail.find(',').map_or("", |i| &tail[i + 1..]);
                        (&quoted[..close], next)
                    }
                    // Unterminated quote: take the remainder verbatim
                    None => (quoted, ""),
                }
            } else {
                match after.find(',') {
                    Some(comma) => (&after[..comma], &after[comma + 1..]),
                    None => (after, ""),
                }
            };

            if !key.is_empty() {
                attrs.push((key.to_string(), value.trim().to_string()));
            }
            rest = remainder;
        }

        Self { attrs }
    }

    /// Raw value for `key`, quotes removed.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn decimal_integer(&self, key: &str) -> Option<u64> {
        self.get(key)?.parse().ok()
    }

    pub fn decimal_floating_point(&self, key: &str) -> Option<f64> {
        self.get(key)?.parse().ok()
    }

    /// `0x`-prefixed hexadecimal value as big-endian bytes.
    ///
    /// An odd number of digits is left-padded with a zero nibble.
    pub fn hexadecimal_integer(&self, key: &str) -> Option<Vec<u8>> {
        let raw = self.get(key)?;
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .unwrap_or(raw);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_string()
        };

        (0..padded.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&padded[i..i + 2], 16).ok())
            .collect()
    }

    /// Unquoted enumerated value such as `AES-128` or `YES`.
    pub fn enumerated_string(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// `WIDTHxHEIGHT` pair.
    pub fn decimal_resolution(&self, key: &str) -> Option<(u32, u32)> {
        let (w, h) = self.get(key)?.split_once(['x', 'X'])?;
        Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
    }

    /// `true` when `key` is the enumerated value `YES`.
    pub fn flag(&self, key: &str) -> bool {
        self.enumerated_string(key) == Some("YES")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

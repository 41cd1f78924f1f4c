use url::Url;

/// Resolve `reference` against `base`.
///
/// Absolute references are returned as-is. When `base` is not an absolute
/// URL the reference cannot be resolved and is returned unchanged.
pub fn resolve(reference: &str, base: &str) -> String {
    let reference = reference.trim();
    if let Ok(absolute) = Url::parse(reference) {
        return absolute.into();
    }

    match Url::parse(base).and_then(|b| b.join(reference)) {
        Ok(url) => url.into(),
        Err(_) => reference.to_string(),
    }
}

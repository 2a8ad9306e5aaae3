//! Image reference normalization.
//!
//! The upstream catalog does not always send clean URLs. Besides plain
//! `https://...` strings it has been seen to send quoted fragments and whole
//! JSON arrays serialized into a single element, sometimes split across
//! several elements:
//!
//! ```text
//! ["[\"https://i.imgur.com/a.jpeg\"", "\"https://i.imgur.com/b.jpeg\"", "\"https://i.imgur.com/c.jpeg\"]"]
//! ```
//!
//! Every reference is classified into an [`ImageRef`] and resolved here, at
//! the display boundary. Cart logic stores the raw strings untouched.

/// Fallback shown when a product has no usable image.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x400";

const QUOTES: &[char] = &['"', '\''];

/// A classified image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// A plain reference with surrounding quotes removed.
    RawUrl(String),
    /// A reference that is itself (part of) a serialized JSON array.
    NestedEncoded(String),
}

impl ImageRef {
    /// Classify a raw catalog string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let cleaned = strip_one_quote(raw.trim());
        if cleaned.starts_with('[') || cleaned.ends_with(']') {
            Self::NestedEncoded(cleaned.to_string())
        } else {
            Self::RawUrl(cleaned.to_string())
        }
    }

    /// Resolve to a displayable `http(s)` URL, if there is one.
    #[must_use]
    pub fn resolve(&self) -> Option<String> {
        match self {
            Self::RawUrl(url) => is_http(url).then(|| url.clone()),
            Self::NestedEncoded(encoded) => {
                if let Ok(urls) = serde_json::from_str::<Vec<String>>(encoded) {
                    return urls
                        .into_iter()
                        .map(|url| url.trim_matches(QUOTES).to_string())
                        .find(|url| is_http(url));
                }
                // Fragment of an array split across elements
                let fragment = encoded
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .trim()
                    .trim_matches(QUOTES);
                is_http(fragment).then(|| fragment.to_string())
            }
        }
    }
}

/// Resolve a product's image list into displayable URLs.
///
/// Unusable references are dropped. The result is never empty; it falls back
/// to [`PLACEHOLDER_IMAGE`].
#[must_use]
pub fn normalize_images<S: AsRef<str>>(images: &[S]) -> Vec<String> {
    let resolved: Vec<String> = images
        .iter()
        .filter_map(|raw| ImageRef::parse(raw.as_ref()).resolve())
        .collect();

    if resolved.is_empty() {
        vec![PLACEHOLDER_IMAGE.to_string()]
    } else {
        resolved
    }
}

/// Remove at most one quote character from each end.
fn strip_one_quote(s: &str) -> &str {
    let s = s.strip_prefix(QUOTES).unwrap_or(s);
    s.strip_suffix(QUOTES).unwrap_or(s)
}

fn is_http(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

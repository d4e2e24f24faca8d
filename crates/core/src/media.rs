//! Media reference classification and export-time resolution.
//!
//! Interactive renderers can fetch media references as stored. Export engines cannot perform
//! authenticated or relative fetches, so every reference is rewritten to an absolute URL first:
//!
//! - remote object-storage download URLs go through the same-origin image proxy
//!   (`{base}/api/images/{decoded object path}`)
//! - other absolute URLs pass through unchanged
//! - relative paths are prefixed with the export base URL
//!
//! Resolution is a pure string computation. It never fails: a storage URL that cannot be
//! parsed is logged and passed through as-is.

use crate::constants::{
    IMAGE_PROXY_ROUTE, STORAGE_BUCKET_SEGMENT, STORAGE_HOST_MARKER, STORAGE_OBJECT_SEGMENT,
};
use crate::CoreConfig;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::collections::HashSet;

/// Kind of a media reference, declared by the record rather than sniffed from content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A media reference with its declared kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MediaItem {
    pub uri: String,
    pub kind: MediaKind,
}

/// Classifies references by membership in a declared video list.
#[derive(Clone, Debug, Default)]
pub struct MediaClassifier<'a> {
    videos: HashSet<&'a str>,
}

impl<'a> MediaClassifier<'a> {
    /// Builds a classifier from the declared video references.
    pub fn new(videos: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            videos: videos.into_iter().collect(),
        }
    }

    pub fn classify(&self, uri: &str) -> MediaKind {
        if self.videos.contains(uri) {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    pub fn item(&self, uri: &str) -> MediaItem {
        MediaItem {
            uri: uri.to_string(),
            kind: self.classify(uri),
        }
    }
}

/// Rewrites media references into URLs the export engine can fetch.
#[derive(Clone, Debug)]
pub struct MediaResolver {
    base_url: String,
}

impl MediaResolver {
    /// Creates a resolver for an already validated base URL.
    ///
    /// Trailing slashes are trimmed so joined URLs contain exactly one separator.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: base_url.as_ref().trim().trim_end_matches('/').to_string(),
        }
    }

    /// Creates a resolver from the export base URL of `cfg`.
    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(cfg.export_base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves a media reference to an absolute URL.
    ///
    /// # Arguments
    ///
    /// * `uri` - Media reference as stored in the patient record.
    ///
    /// # Returns
    ///
    /// The proxied URL for storage download URLs, `uri` unchanged for other absolute URLs
    /// and for malformed storage URLs, or `uri` joined to the base URL otherwise.
    pub fn resolve(&self, uri: &str) -> String {
        let trimmed = uri.trim();

        if is_storage_url(trimmed) {
            return match storage_object_path(trimmed) {
                Some(object_path) => self.join(&format!("{IMAGE_PROXY_ROUTE}/{object_path}")),
                None => {
                    tracing::warn!(
                        "unable to extract object path from storage URL, passing through: {}",
                        trimmed
                    );
                    uri.to_string()
                }
            };
        }

        if has_scheme(trimmed) {
            return uri.to_string();
        }

        self.join(trimmed)
    }

    /// Resolves every item, keeping kind and order.
    pub fn resolve_item(&self, item: &MediaItem) -> MediaItem {
        MediaItem {
            uri: self.resolve(&item.uri),
            kind: item.kind,
        }
    }

    fn join(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for MediaResolver {
    fn default() -> Self {
        Self::from_config(&CoreConfig::default())
    }
}

/// Returns `true` if `uri` carries the storage download signature: the storage host marker
/// followed by the bucket path prefix.
pub fn is_storage_url(uri: &str) -> bool {
    uri.find(STORAGE_HOST_MARKER)
        .is_some_and(|at| uri[at..].contains(STORAGE_BUCKET_SEGMENT))
}

/// Extracts and percent-decodes the object path of a storage download URL.
///
/// Returns `None` when the URL does not parse, the bucket or object segment is missing,
/// the object path is empty, or it does not decode to UTF-8.
fn storage_object_path(uri: &str) -> Option<String> {
    let parsed = url::Url::parse(uri).ok()?;
    let path = parsed.path();

    let after_bucket = &path[path.find(STORAGE_BUCKET_SEGMENT)? + STORAGE_BUCKET_SEGMENT.len()..];
    let object_at = after_bucket.find(STORAGE_OBJECT_SEGMENT)?;
    if object_at == 0 {
        return None;
    }

    let encoded = &after_bucket[object_at + STORAGE_OBJECT_SEGMENT.len()..];
    if encoded.is_empty() {
        return None;
    }

    let decoded = percent_decode_str(encoded).decode_utf8().ok()?;
    let decoded = decoded.trim_matches('/');
    if decoded.is_empty() {
        return None;
    }
    Some(decoded.to_string())
}

// RFC 3986 scheme: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) followed by ':'.
fn has_scheme(uri: &str) -> bool {
    let Some((scheme, _)) = uri.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

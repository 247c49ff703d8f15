//! Accept-filter parsing and matching
//!
//! Acceptance is defined, not ad hoc: an entry is `*/*` (anything), a
//! wildcard subtype like `image/*`, an exact MIME type, or a filename
//! extension like `.pdf`. A file passes when any entry matches.

use mime::Mime;
use tracing::warn;
use upload_broker::FileMetadata;

#[derive(Debug, Clone)]
enum AcceptPattern {
    Any,
    /// `type/*`: matches any subtype of one top-level type
    WildcardSubtype(String),
    /// Exact `type/subtype` match
    Exact(Mime),
    /// Filename extension, stored lowercase without the leading dot
    Extension(String),
}

/// A parsed comma-separated accept filter
#[derive(Debug, Clone)]
pub struct AcceptFilter {
    patterns: Vec<AcceptPattern>,
    raw: String,
}

impl AcceptFilter {
    /// Accepts every file
    #[must_use]
    pub fn any() -> Self {
        Self {
            patterns: vec![AcceptPattern::Any],
            raw: "*/*".to_owned(),
        }
    }

    /// Parses a comma-separated filter such as `image/*,.pdf`.
    ///
    /// Entries that look like MIME types but do not parse are dropped with a
    /// warning and match nothing.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let patterns = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(parse_entry)
            .collect();
        Self {
            patterns,
            raw: raw.to_owned(),
        }
    }

    /// The filter string as configured, for error messages
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `file` matches at least one filter entry
    #[must_use]
    pub fn matches(&self, file: &FileMetadata) -> bool {
        let file_mime: Option<Mime> = file.mime_type.parse().ok();
        self.patterns.iter().any(|pattern| match pattern {
            AcceptPattern::Any => true,
            AcceptPattern::WildcardSubtype(top_level) => file_mime
                .as_ref()
                .is_some_and(|mime| mime.type_().as_str() == top_level),
            AcceptPattern::Exact(expected) => file_mime
                .as_ref()
                .is_some_and(|mime| mime.essence_str() == expected.essence_str()),
            AcceptPattern::Extension(extension) => file
                .name
                .rsplit_once('.')
                .is_some_and(|(_, file_ext)| file_ext.eq_ignore_ascii_case(extension)),
        })
    }
}

fn parse_entry(entry: &str) -> Option<AcceptPattern> {
    if entry == "*/*" || entry == "*" {
        return Some(AcceptPattern::Any);
    }
    if let Some(extension) = entry.strip_prefix('.') {
        return Some(AcceptPattern::Extension(extension.to_ascii_lowercase()));
    }
    if entry.contains('/') {
        let Ok(mime) = entry.parse::<Mime>() else {
            warn!(entry, "unparseable accept-filter entry; it will match nothing");
            return None;
        };
        if mime.subtype() == mime::STAR {
            return Some(AcceptPattern::WildcardSubtype(mime.type_().to_string()));
        }
        return Some(AcceptPattern::Exact(mime));
    }
    // Bare extension without the dot, e.g. "pdf"
    Some(AcceptPattern::Extension(entry.to_ascii_lowercase()))
}

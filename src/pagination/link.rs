//! `Link` header parsing (RFC 8288)
//!
//! Format: `<https://api.github.com/...?page=2>; rel="next", <...>; rel="last"`

use crate::http::{names, Headers};
use regex::Regex;
use std::sync::LazyLock;

/// One `<uri>; params` entry
static LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<([^>]*)>([^<]*)").unwrap());

/// The `rel` parameter, quoted or bare
static REL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*rel\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s;,]+))"#).unwrap()
});

/// A parsed link entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Target URI, verbatim
    pub uri: String,
    /// Relation types, lower-cased
    pub rels: Vec<String>,
}

impl Link {
    /// Whether the link carries the given relation (case-insensitive)
    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels.iter().any(|r| r.eq_ignore_ascii_case(rel))
    }
}

/// Parse every entry of a `Link` header value
pub fn parse_links(header: &str) -> Vec<Link> {
    LINK_REGEX
        .captures_iter(header)
        .map(|caps| {
            let uri = caps[1].trim().to_string();
            let rels = REL_REGEX
                .captures(&caps[2])
                .and_then(|rel| rel.get(1).or_else(|| rel.get(2)).or_else(|| rel.get(3)))
                .map(|m| {
                    m.as_str()
                        .split_whitespace()
                        .map(str::to_ascii_lowercase)
                        .collect()
                })
                .unwrap_or_default();
            Link { uri, rels }
        })
        .collect()
}

/// Parse a Link header and extract the URL for the given rel
pub fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    parse_links(header)
        .into_iter()
        .find(|link| link.has_rel(target_rel))
        .map(|link| link.uri)
}

/// URI of the `rel` link across all `Link` header values
pub fn next_link(headers: &Headers, rel: &str) -> Option<String> {
    headers
        .get(names::LINK)?
        .iter()
        .find_map(|value| parse_link_header(value, rel))
}

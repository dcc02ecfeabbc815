//! Plain-text extraction for markup-wrapped input
//!
//! Rich clipboard pastes arrive as HTML fragments. The normalizer only needs
//! the text content, the way a browser's `textContent` would report it.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Collaborator that turns markup into its plain text content
pub trait TextExtractor: Send + Sync {
    fn extract_plain_text(&self, markup: &str) -> String;
}

/// Regex-based HTML text extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTextExtractor;

static HIDDEN_BLOCK_REGEX: OnceLock<Regex> = OnceLock::new();
static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static ENTITY_REGEX: OnceLock<Regex> = OnceLock::new();

fn hidden_block_regex() -> &'static Regex {
    HIDDEN_BLOCK_REGEX.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<!--.*?-->")
            .expect("valid hidden block pattern")
    })
}

fn tag_regex() -> &'static Regex {
    TAG_REGEX.get_or_init(|| {
        Regex::new(r"</?[a-zA-Z][^>]*>").expect("valid tag pattern")
    })
}

fn entity_regex() -> &'static Regex {
    ENTITY_REGEX.get_or_init(|| {
        Regex::new(r"&(#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[a-zA-Z]{2,8});")
            .expect("valid entity pattern")
    })
}

impl TextExtractor for HtmlTextExtractor {
    fn extract_plain_text(&self, markup: &str) -> String {
        let without_hidden = hidden_block_regex().replace_all(markup, "");
        let without_tags = tag_regex().replace_all(&without_hidden, "");
        decode_entities(&without_tags)
    }
}

/// Decode the named and numeric character references common in pasted HTML
pub fn decode_entities(input: &str) -> String {
    entity_regex()
        .replace_all(input, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "amp" => Some('&'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

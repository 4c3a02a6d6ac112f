//! Inline `<@ID>` mentions.
//!
//! A mention is recognized in prose text, starting at a `<` immediately
//! followed by `@` and closed by the next `>` on the same line. An empty
//! identifier or a missing `>` leaves the text as it was.

use thiserror::Error;
use tracing::warn;

pub const MENTION_TRIGGER: char = '<';

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("lookup for user {id} returned status {status}")]
    Status { id: String, status: u16 },
    #[error("no user with id {0}")]
    UnknownUser(String),
}

/// Turns a mention identifier into a display name.
pub trait MentionResolver: Send + Sync {
    fn resolve(&self, id: &str) -> Result<String, ResolveError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub id: String,
}

impl Mention {
    /// Shown when the mention cannot be resolved.
    pub fn placeholder(&self) -> String {
        format!("<@{}>", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline<'a> {
    Text(&'a str),
    Mention(Mention),
}

/// Reads a mention at the start of `line`, returning it together with the
/// number of bytes it spans.
pub fn parse_mention(line: &str) -> Option<(Mention, usize)> {
    let rest = line.strip_prefix(MENTION_TRIGGER)?.strip_prefix('@')?;

    let mut id = String::new();
    for (offset, c) in rest.char_indices() {
        match c {
            '>' => {
                if id.is_empty() {
                    return None;
                }
                // "<@" plus the identifier plus ">"
                return Some((Mention { id }, 2 + offset + 1));
            }
            '\n' | '\r' => return None,
            _ => id.push(c),
        }
    }

    None
}

/// Splits prose into plain runs and mentions.
pub fn split_mentions(text: &str) -> Vec<Inline<'_>> {
    let mut inlines = Vec::new();
    let mut plain_start = 0;
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find(MENTION_TRIGGER) {
        let start = cursor + found;
        match parse_mention(&text[start..]) {
            Some((mention, consumed)) => {
                if plain_start < start {
                    inlines.push(Inline::Text(&text[plain_start..start]));
                }
                inlines.push(Inline::Mention(mention));
                cursor = start + consumed;
                plain_start = cursor;
            }
            None => cursor = start + MENTION_TRIGGER.len_utf8(),
        }
    }

    if plain_start < text.len() {
        inlines.push(Inline::Text(&text[plain_start..]));
    }

    inlines
}

/// Text a mention renders to. Without a resolver, or when resolution fails,
/// this is the `<@ID>` placeholder; failures are logged and never abort
/// rendering.
pub fn render_mention(mention: &Mention, resolver: Option<&dyn MentionResolver>) -> String {
    let Some(resolver) = resolver else {
        return mention.placeholder();
    };

    match resolver.resolve(&mention.id) {
        Ok(name) => name,
        Err(e) => {
            warn!(user_id = %mention.id, error = %e, "Failed to resolve mention");
            mention.placeholder()
        }
    }
}

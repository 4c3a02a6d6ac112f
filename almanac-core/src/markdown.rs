use std::ops::Range;
use std::sync::{Arc, LazyLock};

use pulldown_cmark::{CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, html};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::links::WikiLinkResolver;
use crate::mention::{Inline, MENTION_TRIGGER, MentionResolver, render_mention, split_mentions};

// Initialize syntax highlighting resources once
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

pub const DEFAULT_SYNTAX_THEME: &str = "base16-ocean.dark";

/// Whether syntect ships a highlighting theme called `name`.
pub fn is_known_syntax_theme(name: &str) -> bool {
    THEME_SET.themes.contains_key(name)
}

pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_PLUSES_DELIMITED_METADATA_BLOCKS
        | Options::ENABLE_WIKILINKS
}

/// Output of one markdown conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub html: String,
    /// Raw contents of the `+++` frontmatter block, if the document has one.
    pub frontmatter: Option<String>,
}

/// The markdown conversion pipeline with the wiki's extensions attached:
/// frontmatter extraction, wikilink resolution, mentions and code
/// highlighting.
#[derive(Clone)]
pub struct Markdown {
    resolver: Option<Arc<dyn MentionResolver>>,
    syntax_theme: String,
}

impl Default for Markdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Markdown {
    pub fn new() -> Self {
        Self {
            resolver: None,
            syntax_theme: DEFAULT_SYNTAX_THEME.to_string(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn MentionResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn syntax_theme<S: Into<String>>(mut self, theme: S) -> Self {
        self.syntax_theme = theme.into();
        self
    }

    /// Converts `source` to HTML. Every wikilink destination is passed to
    /// `record_destination` in order of appearance.
    pub fn convert(&self, source: &str, record_destination: &mut dyn FnMut(&str)) -> Converted {
        let events: Vec<(Event, Range<usize>)> =
            Parser::new_ext(source, markdown_options()).into_offset_iter().collect();
        let mut links = WikiLinkResolver::recording(record_destination);
        let mut frontmatter = None;
        let mut processed_events = Vec::with_capacity(events.len());
        // Adjacent text events are joined so a mention split by the parser
        // is still seen whole.
        let mut prose = String::new();
        let mut i = 0;

        while i < events.len() {
            match &events[i].0 {
                Event::Start(Tag::MetadataBlock(_)) => {
                    let mut block = String::new();
                    i += 1;

                    while i < events.len() {
                        match &events[i].0 {
                            Event::End(TagEnd::MetadataBlock(_)) => break,
                            Event::Text(text) => block.push_str(text),
                            _ => {}
                        }
                        i += 1;
                    }

                    frontmatter = Some(block);
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    self.flush_prose(&mut prose, &mut processed_events);

                    let language = match kind {
                        CodeBlockKind::Fenced(info) => info.split_whitespace().next(),
                        CodeBlockKind::Indented => None,
                    };

                    let mut code = String::new();
                    i += 1;

                    while i < events.len() {
                        match &events[i].0 {
                            Event::End(TagEnd::CodeBlock) => break,
                            Event::Text(text) => code.push_str(text),
                            _ => {}
                        }
                        i += 1;
                    }

                    processed_events.push(Event::Html(self.highlight(language, &code).into()));
                }
                Event::Start(Tag::Link {
                    link_type: LinkType::WikiLink { has_pothole },
                    dest_url,
                    title,
                    id,
                }) => {
                    self.flush_prose(&mut prose, &mut processed_events);

                    let destination = links.resolve(dest_url);
                    processed_events.push(Event::Start(Tag::Link {
                        link_type: LinkType::WikiLink {
                            has_pothole: *has_pothole,
                        },
                        dest_url: destination.into(),
                        title: title.clone(),
                        id: id.clone(),
                    }));
                }
                Event::Start(Tag::Image {
                    link_type: LinkType::WikiLink { has_pothole },
                    dest_url,
                    title,
                    id,
                }) => {
                    self.flush_prose(&mut prose, &mut processed_events);

                    let destination = links.resolve(dest_url);
                    processed_events.push(Event::Start(Tag::Image {
                        link_type: LinkType::WikiLink {
                            has_pothole: *has_pothole,
                        },
                        dest_url: destination.into(),
                        title: title.clone(),
                        id: id.clone(),
                    }));
                }
                // An escaped `\<` cannot open a mention
                Event::Text(text) if is_escaped_trigger(source, &events[i].1, text) => {
                    self.flush_prose(&mut prose, &mut processed_events);
                    let (trigger, rest) = text.split_at(MENTION_TRIGGER.len_utf8());
                    processed_events.push(Event::Text(CowStr::from(trigger.to_string())));
                    prose.push_str(rest);
                }
                Event::Text(text) => prose.push_str(text),
                event => {
                    self.flush_prose(&mut prose, &mut processed_events);
                    processed_events.push(event.clone());
                }
            }
            i += 1;
        }
        self.flush_prose(&mut prose, &mut processed_events);

        let mut out = String::new();
        html::push_html(&mut out, processed_events.into_iter());

        Converted {
            html: out,
            frontmatter,
        }
    }

    fn flush_prose(&self, prose: &mut String, events: &mut Vec<Event<'_>>) {
        if prose.is_empty() {
            return;
        }

        for inline in split_mentions(prose) {
            let text = match inline {
                Inline::Text(text) => text.to_string(),
                Inline::Mention(mention) => render_mention(&mention, self.resolver.as_deref()),
            };
            events.push(Event::Text(CowStr::from(text)));
        }

        prose.clear();
    }

    fn highlight(&self, language: Option<&str>, code: &str) -> String {
        let plain = || format!("<pre><code>{}</code></pre>\n", html_escape::encode_text(code));

        let Some(lang) = language else {
            return plain();
        };

        let syntax = SYNTAX_SET.find_syntax_by_token(lang).or_else(|| {
            // Fallback mappings for unsupported languages
            match lang {
                "nix" => SYNTAX_SET.find_syntax_by_name("JavaScript"),
                "toml" => SYNTAX_SET.find_syntax_by_name("YAML"),
                _ => None,
            }
        });

        match (syntax, THEME_SET.themes.get(&self.syntax_theme)) {
            (Some(syntax), Some(theme)) => {
                highlighted_html_for_string(code, &SYNTAX_SET, syntax, theme)
                    .unwrap_or_else(|_| plain())
            }
            _ => plain(),
        }
    }
}

/// Whether a text event starts with the mention trigger written as a
/// backslash escape. The event's source range may or may not include the
/// backslash.
fn is_escaped_trigger(source: &str, range: &Range<usize>, text: &str) -> bool {
    if !text.starts_with(MENTION_TRIGGER) {
        return false;
    }

    let raw = source.get(range.clone()).unwrap_or_default();
    if raw.strip_prefix('\\') == Some(text) {
        return true;
    }

    // An odd run of backslashes right before the text ends in an escape
    let backslashes = source
        .get(..range.start)
        .unwrap_or_default()
        .bytes()
        .rev()
        .take_while(|b| *b == b'\\')
        .count();
    raw == text && backslashes % 2 == 1
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::TimeDelta;
use tracing::{debug, info, warn};

use crate::config::{Config, DiscordConfig};
use crate::discord::discord_resolver;
use crate::graph::PageGraph;
use crate::markdown::{Markdown, is_known_syntax_theme};
use crate::mention::MentionResolver;
use crate::page::Page;
use crate::parser::{PageParser, ParseError};
use crate::scanner::{ScanError, SiteScanner};
use crate::template::{TemplateError, Templates};

/// A content directory together with everything needed to turn it into
/// pages. Shared by the batch output and the server.
pub struct Wiki {
    content_dir: PathBuf,
    scanner: SiteScanner,
    templates: Arc<Templates>,
}

impl Wiki {
    pub fn new<P: AsRef<Path>>(content_dir: P, markdown: Markdown, templates: Arc<Templates>) -> Self {
        Self {
            content_dir: content_dir.as_ref().to_path_buf(),
            scanner: SiteScanner::new(PageParser::new(markdown), Arc::clone(&templates)),
            templates,
        }
    }

    /// Wires up a wiki from configuration. A mention resolver that cannot be
    /// set up is skipped with a warning; bad templates are an error.
    pub fn from_config(config: &Config) -> Result<Self, TemplateError> {
        let content = &config.content;

        if !is_known_syntax_theme(&content.syntax_theme) {
            warn!(theme = %content.syntax_theme, "Unknown syntax theme, code blocks will not be highlighted");
        }

        let mut markdown = Markdown::new().syntax_theme(&content.syntax_theme);
        if let Some(resolver) = mention_resolver(&config.discord) {
            markdown = markdown.with_resolver(resolver);
        }

        let templates = match &content.theme_dir {
            Some(theme_dir) => {
                debug!(dir = %theme_dir, "Loading theme templates");
                Templates::with_theme(theme_dir)?
            }
            None => Templates::builtin()?,
        };

        Ok(Self::new(&content.dir, markdown, Arc::new(templates)))
    }

    /// Parses every page in the content directory into a fresh graph.
    pub fn discover(&self) -> Result<PageGraph, ScanError> {
        let graph = self.scanner.scan(&self.content_dir)?;
        info!(pages = graph.len(), "Discovered pages");
        Ok(graph)
    }

    pub fn parse_page<P: AsRef<Path>>(&self, path: P) -> Result<Page, ParseError> {
        self.scanner.parser().parse_page(path.as_ref())
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }
}

/// The Discord resolver described by `config`, or `None` when no token is
/// configured or the resolver cannot be set up.
pub fn mention_resolver(config: &DiscordConfig) -> Option<Arc<dyn MentionResolver>> {
    let Some(token) = config.token.as_deref() else {
        debug!("No Discord token configured, mentions will not be resolved");
        return None;
    };

    let ttl = (config.cache_ttl_days > 0).then(|| TimeDelta::days(config.cache_ttl_days));
    let cache_path = config.cache_path.as_deref().map(Path::new);

    match discord_resolver(token, cache_path, ttl) {
        Ok(resolver) => Some(Arc::new(resolver)),
        Err(e) => {
            warn!(error = %e, "Failed to create Discord user resolver, mentions will not be resolved");
            None
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::markdown::DEFAULT_SYNTAX_THEME;
use crate::resolver::DEFAULT_CACHE_TTL_DAYS;

/// Settings for discovering and rendering a wiki.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub content: ContentConfig,
    pub discord: DiscordConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ContentConfig {
    /// Directory holding the `*.md` sources
    pub dir: String,
    /// Where `output` writes the rendered site
    pub output_dir: String,
    /// Extra assets copied into the output, or served in place of the bundled ones
    pub static_dir: Option<String>,
    /// Directory of Tera templates overriding the built-in ones
    pub theme_dir: Option<String>,
    pub syntax_theme: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: "./content".to_string(),
            output_dir: "./output".to_string(),
            static_dir: None,
            theme_dir: None,
            syntax_theme: DEFAULT_SYNTAX_THEME.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token; mentions are left unresolved without one
    pub token: Option<String>,
    pub cache_path: Option<String>,
    /// Zero or less keeps cached names forever
    pub cache_ttl_days: i64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            cache_path: None,
            cache_ttl_days: DEFAULT_CACHE_TTL_DAYS,
        }
    }
}

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::markdown::Markdown;
use crate::page::{Page, PageMeta};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8: {source}")]
    Encoding {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[error("failed to decode frontmatter of {path}: {source}")]
    Frontmatter {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("cannot derive a page title from {0}")]
    InvalidPath(PathBuf),
}

/// Turns one markdown source file into a [`Page`].
#[derive(Clone, Default)]
pub struct PageParser {
    markdown: Markdown,
}

impl PageParser {
    pub fn new(markdown: Markdown) -> Self {
        Self { markdown }
    }

    pub fn parse_page(&self, path: &Path) -> Result<Page, ParseError> {
        let title = page_title(path).ok_or_else(|| ParseError::InvalidPath(path.to_path_buf()))?;

        let bytes = std::fs::read(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = String::from_utf8(bytes).map_err(|source| ParseError::Encoding {
            path: path.to_path_buf(),
            source,
        })?;

        let mut links_to = Vec::new();
        let converted = self
            .markdown
            .convert(&source, &mut |destination: &str| links_to.push(destination.to_string()));

        let meta = match converted.frontmatter.as_deref() {
            Some(raw) => toml::from_str::<PageMeta>(raw).map_err(|source| ParseError::Frontmatter {
                path: path.to_path_buf(),
                source,
            })?,
            None => PageMeta::default(),
        };

        Ok(Page {
            title,
            path: Some(path.to_path_buf()),
            links_to,
            backlinks: Vec::new(),
            meta,
            content: converted.html,
        })
    }
}

/// The file name without directories or extension.
pub fn page_title(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|title| !title.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_title_from_file_name() {
        assert_eq!(page_title(Path::new("/wiki/content/Home Page.md")).as_deref(), Some("Home Page"));
        assert_eq!(page_title(Path::new("notes.md")).as_deref(), Some("notes"));
    }

    #[test]
    fn test_parses_page() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "Rust.md",
            "+++\ncategories = [\"tech\", \"life\"]\ndate = 2023-01-15\nredirect = \"Crab\"\nroot = true\nyoutube_id = \"abc123\"\n+++\n\nLinks to [[Cargo]] and [[Crab.html]].\n",
        );

        let page = PageParser::default().parse_page(&path).unwrap();
        assert_eq!(page.title, "Rust");
        assert_eq!(page.path.as_deref(), Some(path.as_path()));
        assert_eq!(page.links_to, vec!["Cargo", "Crab"]);
        assert!(page.backlinks.is_empty());
        assert_eq!(page.meta.categories, vec!["tech", "life"]);
        assert_eq!(page.meta.display_date().as_deref(), Some("Jan 15, 2023"));
        assert_eq!(page.meta.redirect.as_deref(), Some("Crab"));
        assert!(page.meta.root);
        assert_eq!(page.meta.youtube_id.as_deref(), Some("abc123"));
        assert!(page.content.contains("<a href=\"Cargo\">Cargo</a>"));
    }

    #[test]
    fn test_page_without_frontmatter() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "Plain.md", "Nothing special here.\n");

        let page = PageParser::default().parse_page(&path).unwrap();
        assert_eq!(page.meta, PageMeta::default());
        assert!(page.links_to.is_empty());
    }

    #[test]
    fn test_bad_frontmatter_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "Broken.md", "+++\ncategories = tech\n+++\n");

        let err = PageParser::default().parse_page(&path).unwrap_err();
        assert!(matches!(err, ParseError::Frontmatter { .. }));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = PageParser::default()
            .parse_page(&tmp.path().join("Nope.md"))
            .unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Binary.md");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = PageParser::default().parse_page(&path).unwrap_err();
        assert!(matches!(err, ParseError::Encoding { .. }));
    }
}

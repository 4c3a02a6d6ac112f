use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::graph::PageGraph;
use crate::page::{Page, SPECIAL_PAGES_TITLE, category_title, sort_titles};
use crate::parser::{PageParser, ParseError};
use crate::template::{TemplateError, Templates};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to list {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse page: {0}")]
    Parse(#[from] ParseError),
    #[error("failed to create special pages: {0}")]
    SpecialPages(#[from] TemplateError),
    #[error("more than one page is titled {0:?}")]
    DuplicateTitle(String),
}

/// Builds the page graph of a content directory.
pub struct SiteScanner {
    parser: PageParser,
    templates: Arc<Templates>,
}

impl SiteScanner {
    pub fn new(parser: PageParser, templates: Arc<Templates>) -> Self {
        Self { parser, templates }
    }

    pub fn parser(&self) -> &PageParser {
        &self.parser
    }

    /// Parses every markdown file directly inside `dir`, adds the special
    /// pages and fills in backlinks. Any failure aborts the whole scan.
    pub fn scan<P: AsRef<Path>>(&self, dir: P) -> Result<PageGraph, ScanError> {
        let dir = dir.as_ref();
        let paths = markdown_files(dir)?;
        debug!(dir = %dir.display(), files = paths.len(), "Scanning pages");

        let mut pages = Vec::with_capacity(paths.len());
        for path in &paths {
            pages.push(self.parser.parse_page(path)?);
        }

        let special_pages = create_special_pages(&pages, &self.templates)?;

        let mut graph = PageGraph::new();
        for page in pages.into_iter().chain(special_pages) {
            if graph.contains(&page.title) {
                return Err(ScanError::DuplicateTitle(page.title));
            }
            graph.insert(page);
        }

        graph.populate_backlinks();

        Ok(graph)
    }
}

/// The `*.md` files directly inside `dir`, sorted by path.
pub fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let read_dir_error = |source| ScanError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_error)? {
        let path = entry.map_err(read_dir_error)?.path();

        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

/// Category indexes for every category used by `pages`, followed by the
/// index of all special pages.
///
/// A category page links to the pages in that category in the order they
/// appear in `pages`.
pub fn create_special_pages(pages: &[Page], templates: &Templates) -> Result<Vec<Page>, TemplateError> {
    let mut categories: Vec<String> = pages
        .iter()
        .flat_map(|page| page.meta.categories.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    sort_titles(&mut categories);

    let mut special_pages = Vec::with_capacity(categories.len() + 1);

    for category in &categories {
        let members: Vec<String> = pages
            .iter()
            .filter(|page| page.meta.categories.contains(category))
            .map(|page| page.title.clone())
            .collect();

        let content = templates.render_link_listing(&members)?;
        special_pages.push(Page::synthesized(category_title(category), members, content));
    }

    let special_titles: Vec<String> = special_pages.iter().map(|page| page.title.clone()).collect();
    let content = templates.render_link_listing(&special_titles)?;
    special_pages.push(Page::synthesized(SPECIAL_PAGES_TITLE, special_titles, content));

    Ok(special_pages)
}

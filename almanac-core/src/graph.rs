use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::page::{Page, sort_titles};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("no root page found")]
    NoRootPage,
    #[error("multiple root pages found: {}", .0.join(", "))]
    MultipleRootPages(Vec<String>),
}

/// Every page of the wiki keyed by title, with backlinks filled in once
/// discovery is complete.
#[derive(Debug, Clone, Default)]
pub struct PageGraph {
    pages: BTreeMap<String, Page>,
}

impl PageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page, returning the page it replaced if the title was taken.
    pub fn insert(&mut self, page: Page) -> Option<Page> {
        self.pages.insert(page.title.clone(), page)
    }

    pub fn get(&self, title: &str) -> Option<&Page> {
        self.pages.get(title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.pages.contains_key(title)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    /// All titles, sorted case-insensitively, for navigation.
    pub fn all_page_titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self.pages.keys().cloned().collect();
        sort_titles(&mut titles);
        titles
    }

    /// The single page flagged `root`.
    pub fn find_root_page(&self) -> Result<&Page, GraphError> {
        let roots: Vec<&Page> = self.pages.values().filter(|page| page.meta.root).collect();

        match roots.as_slice() {
            [] => Err(GraphError::NoRootPage),
            [root] => Ok(*root),
            _ => Err(GraphError::MultipleRootPages(
                roots.iter().map(|page| page.title.clone()).collect(),
            )),
        }
    }

    /// Recomputes every page's backlinks from the forward links.
    ///
    /// Links to titles that are not in the graph are ignored. Each linking
    /// page appears once per target however often it links there.
    pub fn populate_backlinks(&mut self) {
        let mut edges: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for page in self.pages.values() {
            for target in &page.links_to {
                if self.pages.contains_key(target) {
                    edges
                        .entry(target.clone())
                        .or_default()
                        .insert(page.title.clone());
                }
            }
        }

        for page in self.pages.values_mut() {
            let mut backlinks: Vec<String> = edges
                .remove(&page.title)
                .map(|sources| sources.into_iter().collect())
                .unwrap_or_default();
            sort_titles(&mut backlinks);
            page.backlinks = backlinks;
        }
    }
}

impl FromIterator<Page> for PageGraph {
    fn from_iter<I: IntoIterator<Item = Page>>(iter: I) -> Self {
        let mut graph = PageGraph::new();
        for page in iter {
            graph.insert(page);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageMeta;
    use std::path::PathBuf;

    fn page(title: &str, links: &[&str]) -> Page {
        Page {
            title: title.to_string(),
            path: Some(PathBuf::from(format!("{title}.md"))),
            links_to: links.iter().map(|l| l.to_string()).collect(),
            ..Page::default()
        }
    }

    fn root(title: &str) -> Page {
        Page {
            meta: PageMeta {
                root: true,
                ..PageMeta::default()
            },
            ..page(title, &[])
        }
    }

    #[test]
    fn test_backlinks_are_deduplicated() {
        let mut graph: PageGraph = [page("A", &["B", "B", "B"]), page("B", &[])]
            .into_iter()
            .collect();
        graph.populate_backlinks();

        assert_eq!(graph.get("B").unwrap().backlinks, vec!["A"]);
        assert!(graph.get("A").unwrap().backlinks.is_empty());
    }

    #[test]
    fn test_dangling_links_are_kept_but_not_backlinked() {
        let mut graph: PageGraph = [page("A", &["Missing", "B"]), page("B", &[])]
            .into_iter()
            .collect();
        graph.populate_backlinks();

        assert_eq!(graph.get("A").unwrap().links_to, vec!["Missing", "B"]);
        assert!(!graph.contains("Missing"));
        for p in graph.pages() {
            assert!(!p.backlinks.contains(&"Missing".to_string()));
        }
    }

    #[test]
    fn test_mutual_links() {
        let mut graph: PageGraph = [page("A", &["B"]), page("B", &["A"])].into_iter().collect();
        graph.populate_backlinks();

        assert_eq!(graph.get("A").unwrap().backlinks, vec!["B"]);
        assert_eq!(graph.get("B").unwrap().backlinks, vec!["A"]);
    }

    #[test]
    fn test_backlinks_sorted_case_insensitively() {
        let mut graph: PageGraph = [
            page("zeta", &["Target"]),
            page("Alpha", &["Target"]),
            page("beta", &["Target"]),
            page("Target", &[]),
        ]
        .into_iter()
        .collect();
        graph.populate_backlinks();

        assert_eq!(graph.get("Target").unwrap().backlinks, vec!["Alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_populate_backlinks_is_idempotent() {
        let mut graph: PageGraph = [
            page("A", &["B", "C", "B"]),
            page("B", &["A"]),
            page("C", &["C", "Nowhere"]),
        ]
        .into_iter()
        .collect();

        graph.populate_backlinks();
        let first: Vec<Vec<String>> = graph.pages().map(|p| p.backlinks.clone()).collect();
        graph.populate_backlinks();
        let second: Vec<Vec<String>> = graph.pages().map(|p| p.backlinks.clone()).collect();

        assert_eq!(first, second);
        assert_eq!(graph.get("C").unwrap().backlinks, vec!["A", "C"]);
    }

    #[test]
    fn test_find_root_page() {
        let graph: PageGraph = [page("A", &[]), root("Home")].into_iter().collect();
        assert_eq!(graph.find_root_page().unwrap().title, "Home");
    }

    #[test]
    fn test_find_root_page_none() {
        let graph: PageGraph = [page("A", &[])].into_iter().collect();
        assert_eq!(graph.find_root_page().unwrap_err(), GraphError::NoRootPage);
    }

    #[test]
    fn test_find_root_page_multiple() {
        let graph: PageGraph = [root("One"), root("Two"), page("A", &[])].into_iter().collect();
        assert_eq!(
            graph.find_root_page().unwrap_err(),
            GraphError::MultipleRootPages(vec!["One".into(), "Two".into()])
        );
    }

    #[test]
    fn test_all_page_titles() {
        let graph: PageGraph = [page("b", &[]), page("C", &[]), page("a", &[])]
            .into_iter()
            .collect();
        assert_eq!(graph.all_page_titles(), vec!["a", "b", "C"]);
    }
}

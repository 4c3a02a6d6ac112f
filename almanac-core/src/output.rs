use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::graph::PageGraph;
use crate::page::Page;
use crate::template::{TemplateError, Templates};

pub const MAIN_CSS: &str = include_str!("../static/assets/css/main.css");
pub const FAVICON_SVG: &str = include_str!("../static/favicon.svg");

/// Assets every rendered page refers to, by path relative to the site root.
pub const BUNDLED_ASSETS: &[(&str, &str)] = &[
    ("assets/css/main.css", MAIN_CSS),
    ("favicon.svg", FAVICON_SVG),
];

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to render page: {0}")]
    Template(#[from] TemplateError),
    #[error("failed to copy static assets: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("page {0:?} cannot be written inside the output directory")]
    InvalidFileName(String),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> OutputError + '_ {
    move |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes every page to `{output_dir}/{title}.html`, replacing whatever was
/// in `output_dir`, then the bundled assets and the contents of `static_dir`.
pub fn output_all_pages(
    graph: &PageGraph,
    templates: &Templates,
    output_dir: &Path,
    static_dir: Option<&Path>,
) -> Result<(), OutputError> {
    match fs::remove_dir_all(output_dir) {
        Ok(()) => debug!(dir = %output_dir.display(), "Removed previous output"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(io_error(output_dir)(e)),
    }
    fs::create_dir_all(output_dir).map_err(io_error(output_dir))?;

    let all_page_titles = graph.all_page_titles();

    for page in graph.pages() {
        let html = templates.render_page(page, &all_page_titles)?;
        let output_path = output_dir.join(page_file(page)?);
        // A `/` in a title, e.g. from a category name, nests the file
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::write(&output_path, html).map_err(io_error(&output_path))?;
    }

    write_bundled_assets(output_dir)?;

    if let Some(static_dir) = static_dir {
        copy_dir(static_dir, output_dir)?;
    }

    info!(pages = graph.len(), dir = %output_dir.display(), "Wrote pages");

    Ok(())
}

/// The page's file name as a relative path, refusing anything that would
/// land outside the output directory.
fn page_file(page: &Page) -> Result<PathBuf, OutputError> {
    let file_name = PathBuf::from(page.file_name());
    if file_name
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        Ok(file_name)
    } else {
        Err(OutputError::InvalidFileName(page.title.clone()))
    }
}

fn write_bundled_assets(output_dir: &Path) -> Result<(), OutputError> {
    for (relative, content) in BUNDLED_ASSETS {
        let output_path = output_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::write(&output_path, content).map_err(io_error(&output_path))?;
    }

    Ok(())
}

/// Recursively copies the contents of `src` into `dst`.
fn copy_dir(src: &Path, dst: &Path) -> Result<(), OutputError> {
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(io_error(&target))?;
        } else {
            fs::copy(entry.path(), &target).map_err(io_error(&target))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn graph() -> PageGraph {
        let mut graph: PageGraph = [
            Page {
                links_to: vec!["Other".into()],
                ..Page::synthesized("Home", vec![], "<p>home body</p>".into())
            },
            Page::synthesized("Other", vec![], "<p>other body</p>".into()),
        ]
        .into_iter()
        .collect();
        graph.populate_backlinks();
        graph
    }

    #[test]
    fn test_writes_one_file_per_page() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let templates = Templates::builtin().unwrap();

        output_all_pages(&graph(), &templates, &out, None).unwrap();

        let home = fs::read_to_string(out.join("Home.html")).unwrap();
        assert!(home.contains("<p>home body</p>"));
        let other = fs::read_to_string(out.join("Other.html")).unwrap();
        assert!(other.contains("<h2>Backlinks</h2>"));
        assert_eq!(fs::read_to_string(out.join("assets/css/main.css")).unwrap(), MAIN_CSS);
        assert!(out.join("favicon.svg").exists());
    }

    #[test]
    fn test_replaces_previous_output() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("Stale.html"), "old").unwrap();

        output_all_pages(&graph(), &Templates::builtin().unwrap(), &out, None).unwrap();
        assert!(!out.join("Stale.html").exists());
    }

    #[test]
    fn test_slash_in_title_nests_the_file() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let graph: PageGraph = [Page::synthesized("$Category:tech/rust", vec![], "<p>rusty</p>".into())]
            .into_iter()
            .collect();

        output_all_pages(&graph, &Templates::builtin().unwrap(), &out, None).unwrap();

        let html = fs::read_to_string(out.join("$Category:tech").join("rust.html")).unwrap();
        assert!(html.contains("<p>rusty</p>"));
    }

    #[test]
    fn test_title_escaping_output_dir_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let graph: PageGraph = [Page::synthesized("$Category:a/../../escaped", vec![], String::new())]
            .into_iter()
            .collect();

        let err = output_all_pages(&graph, &Templates::builtin().unwrap(), &out, None).unwrap_err();
        assert!(matches!(err, OutputError::InvalidFileName(title) if title == "$Category:a/../../escaped"));
        assert!(!tmp.path().join("escaped.html").exists());
    }

    #[test]
    fn test_copies_static_dir_over_bundled_assets() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let static_dir = tmp.path().join("static");
        fs::create_dir_all(static_dir.join("assets/css")).unwrap();
        fs::write(static_dir.join("assets/css/main.css"), "body {}").unwrap();
        fs::write(static_dir.join("robots.txt"), "User-agent: *").unwrap();

        output_all_pages(&graph(), &Templates::builtin().unwrap(), &out, Some(&static_dir)).unwrap();

        assert_eq!(fs::read_to_string(out.join("assets/css/main.css")).unwrap(), "body {}");
        assert_eq!(fs::read_to_string(out.join("robots.txt")).unwrap(), "User-agent: *");
    }
}

use std::cmp::Ordering;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

/// Title prefix of the synthesized per-category index pages.
pub const CATEGORY_PREFIX: &str = "$Category:";

/// Title of the synthesized index over every special page.
pub const SPECIAL_PAGES_TITLE: &str = "$SpecialPages";

/// Frontmatter of a page, decoded from the `+++` block at the top of the file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    pub categories: Vec<String>,
    pub date: Option<toml::value::Datetime>,
    pub redirect: Option<String>,
    pub root: bool,
    pub youtube_id: Option<String>,
}

impl PageMeta {
    /// The date as shown on a page, e.g. `Aug 2, 2006`.
    pub fn display_date(&self) -> Option<String> {
        let date = self.date.as_ref()?.date?;
        let date = NaiveDate::from_ymd_opt(
            i32::from(date.year),
            u32::from(date.month),
            u32::from(date.day),
        )?;
        Some(date.format("%b %-d, %Y").to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub title: String,
    /// Source file; `None` for synthesized pages.
    pub path: Option<PathBuf>,
    /// Wikilink destinations in order of appearance, dangling ones included.
    pub links_to: Vec<String>,
    pub backlinks: Vec<String>,
    pub meta: PageMeta,
    /// Rendered HTML body.
    pub content: String,
}

impl Page {
    /// A page that has no source file, only a title, its links and a body.
    pub fn synthesized(title: impl Into<String>, links_to: Vec<String>, content: String) -> Self {
        Self {
            title: title.into(),
            path: None,
            links_to,
            backlinks: Vec::new(),
            meta: PageMeta::default(),
            content,
        }
    }

    pub fn is_special(&self) -> bool {
        self.path.is_none()
    }

    /// Name of the file this page is written to in batch output.
    pub fn file_name(&self) -> String {
        format!("{}.html", self.title)
    }
}

pub fn category_title(category: &str) -> String {
    format!("{CATEGORY_PREFIX}{category}")
}

/// Case-insensitive ascending order; equal-when-lowercased titles fall back
/// to byte order so the result never depends on input order.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub fn sort_titles(titles: &mut [String]) {
    titles.sort_by(|a, b| compare_titles(a, b));
}

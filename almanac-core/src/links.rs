//! Wikilink destination handling.
//!
//! Pages may link to each other by rendered filename (`[[Foo.html]]`) or by
//! title (`[[Foo]]`); both resolve to the destination `Foo`.

/// Resolves a wikilink target into the destination written into the link.
///
/// The target is used as-is apart from a trailing `.html` on its page part,
/// which is stripped. A `#fragment` is carried along untouched.
pub fn resolve_destination(target: &str) -> String {
    let (page, fragment) = split_fragment(target.trim());
    let page = page.strip_suffix(".html").unwrap_or(page);

    match fragment {
        Some(fragment) => format!("{page}#{fragment}"),
        None => page.to_string(),
    }
}

/// The page part of a destination, without any `#fragment`.
pub fn link_target(destination: &str) -> &str {
    split_fragment(destination).0
}

fn split_fragment(target: &str) -> (&str, Option<&str>) {
    match target.split_once('#') {
        Some((page, fragment)) => (page, Some(fragment)),
        None => (target, None),
    }
}

/// Resolves wikilink destinations and reports each linked page to a recorder.
pub struct WikiLinkResolver<'a> {
    record_destination: Option<&'a mut dyn FnMut(&str)>,
}

impl<'a> WikiLinkResolver<'a> {
    pub fn new() -> Self {
        Self {
            record_destination: None,
        }
    }

    pub fn recording(record_destination: &'a mut dyn FnMut(&str)) -> Self {
        Self {
            record_destination: Some(record_destination),
        }
    }

    pub fn resolve(&mut self, target: &str) -> String {
        let destination = resolve_destination(target);

        // `[[#section]]` points into the current page and is not an edge
        let page = link_target(&destination);
        if !page.is_empty() {
            if let Some(record) = self.record_destination.as_mut() {
                record(page);
            }
        }

        destination
    }
}

impl Default for WikiLinkResolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_html_suffix() {
        assert_eq!(resolve_destination("Foo.html"), "Foo");
        assert_eq!(resolve_destination("Foo"), "Foo");
        assert_eq!(resolve_destination("Foo.html#Bar"), "Foo#Bar");
    }

    #[test]
    fn test_only_strips_suffix() {
        assert_eq!(resolve_destination("Foo.htmlx"), "Foo.htmlx");
        assert_eq!(resolve_destination("a.html.b"), "a.html.b");
    }

    #[test]
    fn test_records_in_order_of_resolution() {
        let mut recorded = Vec::new();
        let mut record = |dest: &str| recorded.push(dest.to_string());
        let mut resolver = WikiLinkResolver::recording(&mut record);

        assert_eq!(resolver.resolve("Beta.html"), "Beta");
        assert_eq!(resolver.resolve("Alpha#intro"), "Alpha#intro");
        assert_eq!(resolver.resolve("#local"), "#local");
        assert_eq!(resolver.resolve("Beta"), "Beta");
        drop(resolver);

        assert_eq!(recorded, vec!["Beta", "Alpha", "Beta"]);
    }

    #[test]
    fn test_resolves_without_recorder() {
        let mut resolver = WikiLinkResolver::new();
        assert_eq!(resolver.resolve("Page.html"), "Page");
    }
}

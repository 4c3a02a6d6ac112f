use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

use crate::page::Page;

pub const PAGE_TEMPLATE: &str = "page.html";
pub const LINK_LISTING_TEMPLATE: &str = "link_listing.html";

const PAGE_TEMPLATE_CONTENT: &str = r#"<!DOCTYPE html>
<html>
	<head>
		<title>{{ page.title }}</title>
		<link rel="stylesheet" href="/assets/css/main.css">
		<link rel="icon" type="image/svg+xml" href="/favicon.svg">
	</head>
	<body>
		<nav>
			<ul>
			{% for title in all_page_titles %}
				<li><a href="/{{ title | urlencode }}">{{ title }}</a></li>
			{% endfor %}
			</ul>
		</nav>
		<main>
			<h1>{{ page.title }}</h1>

			{% if page.redirect %}
			<p>↳ <a href="/{{ page.redirect | urlencode }}">{{ page.redirect }}</a></p>
			{% endif %}

			{% if page.categories %}
			<p>
			{% for category in page.categories %}
				{% set category_page = "$Category:" ~ category %}
				<a href="/{{ category_page | urlencode }}">{{ category }}</a>
			{% endfor %}
			</p>
			{% endif %}

			{% if page.date %}
			<p>{{ page.date }}</p>
			{% endif %}

			{% if page.youtube_id %}
			<iframe
			  width="100%"
			  height="600px"
			  src="https://www.youtube.com/embed/{{ page.youtube_id | urlencode }}"
			  frameborder="0"
			  allow="accelerometer; autoplay; encrypted-media; gyroscope; picture-in-picture"
			  allowfullscreen></iframe>
			{% endif %}

			{{ content | safe }}

			{% if page.backlinks %}
			<section>
				<h2>Backlinks</h2>
				<ul>
				{% for backlink in page.backlinks %}
					<li><a href="/{{ backlink | urlencode }}">{{ backlink }}</a></li>
				{% endfor %}
				</ul>
			</section>
			{% endif %}
		</main>
	</body>
</html>"#;

const LINK_LISTING_TEMPLATE_CONTENT: &str = r#"<ul>
{% for link in links %}
	<li><a href="/{{ link | urlencode }}">{{ link }}</a></li>
{% endfor %}
</ul>"#;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    Tera(#[from] tera::Error),
}

/// What the page template sees of a page.
#[derive(Debug, Serialize)]
struct PageView<'a> {
    title: &'a str,
    categories: &'a [String],
    date: Option<String>,
    redirect: Option<&'a str>,
    youtube_id: Option<&'a str>,
    backlinks: &'a [String],
}

impl<'a> From<&'a Page> for PageView<'a> {
    fn from(page: &'a Page) -> Self {
        Self {
            title: &page.title,
            categories: &page.meta.categories,
            date: page.meta.display_date(),
            redirect: page.meta.redirect.as_deref(),
            youtube_id: page.meta.youtube_id.as_deref(),
            backlinks: &page.backlinks,
        }
    }
}

/// Parsed templates, built once and shared by whoever renders pages.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// The built-in page and link listing templates.
    pub fn builtin() -> Result<Self, TemplateError> {
        Ok(Self {
            tera: builtin_tera()?,
        })
    }

    /// Templates from `theme_dir`, with the built-ins filling in any the
    /// theme does not define.
    pub fn with_theme<P: AsRef<Path>>(theme_dir: P) -> Result<Self, TemplateError> {
        let glob = theme_dir.as_ref().join("**").join("*.html");
        let mut tera = Tera::new(&glob.to_string_lossy())?;
        tera.extend(&builtin_tera()?)?;

        Ok(Self { tera })
    }

    pub fn render_page(&self, page: &Page, all_page_titles: &[String]) -> Result<String, TemplateError> {
        let mut context = Context::new();
        context.insert("page", &PageView::from(page));
        context.insert("content", &page.content);
        context.insert("all_page_titles", all_page_titles);

        Ok(self.tera.render(PAGE_TEMPLATE, &context)?)
    }

    /// Renders a page that is not part of the wiki, such as an error.
    /// `content` is inserted as HTML without escaping.
    pub fn render_message(
        &self,
        title: &str,
        content: &str,
        all_page_titles: &[String],
    ) -> Result<String, TemplateError> {
        self.render_page(&Page::synthesized(title, Vec::new(), content.to_string()), all_page_titles)
    }

    pub fn render_link_listing(&self, links: &[String]) -> Result<String, TemplateError> {
        let mut context = Context::new();
        context.insert("links", links);

        Ok(self.tera.render(LINK_LISTING_TEMPLATE, &context)?)
    }
}

fn builtin_tera() -> Result<Tera, TemplateError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (PAGE_TEMPLATE, PAGE_TEMPLATE_CONTENT),
        (LINK_LISTING_TEMPLATE, LINK_LISTING_TEMPLATE_CONTENT),
    ])?;
    Ok(tera)
}

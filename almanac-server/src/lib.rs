use std::path::PathBuf;
use std::sync::Arc;

use almanac_core::output::{FAVICON_SVG, MAIN_CSS};
use almanac_core::{Page, PageGraph, TemplateError, Wiki};
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, error, info, warn};

const NOT_FOUND_TITLE: &str = "Not Found";
const NOT_FOUND_CONTENT: &str = "<p>Looks like this page doesn't exist yet</p>";
const ERROR_TITLE: &str = "An error occurred";

/// Where stylesheets and other static files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assets {
    /// The stylesheet and favicon compiled into the binary
    Bundled,
    /// Files under this directory, looked up before any page
    Directory(PathBuf),
}

/// Configuration for the wiki server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to, e.g. `127.0.0.1:8080`
    pub addr: String,
    /// Auto-open browser
    pub open: bool,
    pub assets: Assets,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            open: false,
            assets: Assets::Bundled,
        }
    }
}

/// Serves a wiki over HTTP, rediscovering the content directory on every
/// request so edits show up on reload.
pub struct Server {
    config: ServerConfig,
    wiki: Arc<Wiki>,
}

impl Server {
    pub fn new(config: ServerConfig, wiki: Arc<Wiki>) -> Self {
        Self { config, wiki }
    }

    pub fn router(&self) -> Router {
        let pages = Router::new()
            .route("/", get(serve_root))
            // Titles may contain `/`, so the whole remaining path is the title
            .route("/{*page}", get(serve_page))
            .with_state(Arc::clone(&self.wiki));

        let app = match &self.config.assets {
            Assets::Bundled => Router::new()
                .route("/assets/css/main.css", get(main_css))
                .route("/favicon.svg", get(favicon))
                .merge(pages),
            Assets::Directory(dir) => Router::new().fallback_service(
                ServeDir::new(dir)
                    .append_index_html_on_directories(false)
                    .fallback(pages),
            ),
        };

        app.layer(TraceLayer::new_for_http())
    }

    pub async fn run(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.config.addr)
            .await
            .with_context(|| format!("Failed to bind to {}", self.config.addr))?;
        let addr = listener.local_addr()?;

        info!(
            addr = %addr,
            content_dir = %self.wiki.content_dir().display(),
            "Serving wiki"
        );

        // Open browser if requested
        if self.config.open
            && let Err(e) = open::that(format!("http://{addr}"))
        {
            warn!(error = %e, "Failed to open browser");
        }

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn serve_root(State(wiki): State<Arc<Wiki>>) -> Response {
    serve(wiki, None).await
}

async fn serve_page(State(wiki): State<Arc<Wiki>>, Path(title): Path<String>) -> Response {
    serve(wiki, Some(title)).await
}

async fn serve(wiki: Arc<Wiki>, title: Option<String>) -> Response {
    let graph = match discover(&wiki).await {
        Ok(graph) => graph,
        Err(message) => {
            error!(error = %message, "Failed to serve page");
            let content = format!("<p>{}</p>", html_escape::encode_text(&message));
            return render(
                StatusCode::INTERNAL_SERVER_ERROR,
                wiki.templates().render_message(ERROR_TITLE, &content, &[]),
            );
        }
    };

    let all_page_titles = graph.all_page_titles();

    let page: Option<&Page> = match &title {
        None => graph
            .find_root_page()
            .inspect_err(|e| warn!(error = %e, "Cannot serve root page"))
            .ok(),
        Some(title) => graph.get(title),
    };

    match page {
        Some(page) => render(StatusCode::OK, wiki.templates().render_page(page, &all_page_titles)),
        None => {
            debug!(title = title.as_deref().unwrap_or("/"), "Page not found");
            render(
                StatusCode::NOT_FOUND,
                wiki.templates()
                    .render_message(NOT_FOUND_TITLE, NOT_FOUND_CONTENT, &all_page_titles),
            )
        }
    }
}

/// Runs discovery off the async workers, since parsing may wait on mention
/// lookups.
async fn discover(wiki: &Arc<Wiki>) -> Result<PageGraph, String> {
    let wiki = Arc::clone(wiki);
    match tokio::task::spawn_blocking(move || wiki.discover()).await {
        Ok(Ok(graph)) => Ok(graph),
        Ok(Err(e)) => Err(format!("error discovering pages: {e}")),
        Err(e) => Err(format!("discovery task failed: {e}")),
    }
}

fn render(status: StatusCode, html: Result<String, TemplateError>) -> Response {
    match html {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, ERROR_TITLE).into_response()
        }
    }
}

async fn main_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], MAIN_CSS)
}

async fn favicon() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/svg+xml")], FAVICON_SVG)
}

use std::sync::Arc;

use almanac_core::Wiki;
use almanac_server::Server;
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::warn;

use crate::config::AlmanacConfig;

pub fn make_subcommand() -> Command {
    Command::new("serve")
        .about("Serve the wiki over HTTP, rendering pages on request")
        .arg(
            Arg::new("addr")
                .short('a')
                .long("addr")
                .value_name("ADDR")
                .help("Address to bind to, e.g. 127.0.0.1:8080"),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .help("Open browser automatically")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("use-bundled-assets")
                .long("use-bundled-assets")
                .value_name("BOOL")
                .value_parser(["true", "false"])
                .help("Serve the built-in stylesheet and favicon instead of content.static_dir"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    // Load cascading configuration
    let config = AlmanacConfig::load(args)?;

    if !config.server.use_bundled_assets && config.content.static_dir.is_none() {
        warn!("Bundled assets disabled but no static_dir configured, using bundled assets");
    }

    // The mention resolver owns a blocking HTTP client, which has to be
    // created outside the async runtime.
    let wiki = Wiki::from_config(&config.wiki_config()).context("Failed to load templates")?;
    let server = Server::new(config.server_config(), Arc::new(wiki));

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(server.run())
}

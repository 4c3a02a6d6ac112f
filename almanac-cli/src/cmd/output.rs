use std::path::Path;

use almanac_core::{Wiki, output_all_pages};
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

use crate::config::AlmanacConfig;

pub fn make_subcommand() -> Command {
    Command::new("output")
        .about("Render every page to static HTML files")
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for the generated site; replaced on every run"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    // Load cascading configuration
    let config = AlmanacConfig::load(args)?;
    let content = &config.content;

    let wiki = Wiki::from_config(&config.wiki_config()).context("Failed to load templates")?;
    let graph = wiki.discover().context("Failed to discover pages")?;

    output_all_pages(
        &graph,
        wiki.templates(),
        Path::new(&content.output_dir),
        content.static_dir.as_deref().map(Path::new),
    )
    .with_context(|| format!("Failed to write site to {}", content.output_dir))?;

    Ok(())
}

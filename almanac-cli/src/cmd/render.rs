use std::io::{self, Write};
use std::path::PathBuf;

use almanac_core::{Page, Wiki};
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command, value_parser};

use crate::config::AlmanacConfig;

pub fn make_subcommand() -> Command {
    Command::new("render")
        .about("Print the rendered body and outgoing links of a single file")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Markdown file to render")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = AlmanacConfig::load(args)?;
    let file = args
        .get_one::<PathBuf>("file")
        .context("No file given")?;

    let wiki = Wiki::from_config(&config.wiki_config()).context("Failed to load templates")?;
    let page = wiki
        .parse_page(file)
        .with_context(|| format!("Failed to render {}", file.display()))?;

    write_page(&page, &mut io::stdout().lock())?;
    Ok(())
}

fn write_page(page: &Page, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", page.content.trim_end())?;
    writeln!(out)?;
    writeln!(out, "Links:")?;
    for link in &page.links_to {
        writeln!(out, "- {link}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_page() {
        let page = Page::synthesized(
            "Alpha",
            vec!["Beta".into(), "Gamma".into()],
            "<p>body</p>\n".into(),
        );

        let mut out = Vec::new();
        write_page(&page, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<p>body</p>\n\nLinks:\n- Beta\n- Gamma\n"
        );
    }

    #[test]
    fn test_file_is_required() {
        assert!(make_subcommand().try_get_matches_from(["render"]).is_err());
    }
}

use almanac_core::config::{Config as WikiConfig, ContentConfig, DiscordConfig};
use almanac_server::{Assets, ServerConfig};
use anyhow::Result;
use clap::ArgMatches;
use clap::parser::ValueSource;
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "./almanac.toml";

/// Complete configuration that merges CLI args, env vars, config files, and defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AlmanacConfig {
    pub server: ServerSection,
    pub content: ContentConfig,
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerSection {
    /// Address for the HTTP server
    pub addr: String,
    /// Open browser automatically
    pub open: bool,
    /// Serve the stylesheet and favicon compiled into the binary instead of `content.static_dir`
    pub use_bundled_assets: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            open: false,
            use_bundled_assets: true,
        }
    }
}

impl AlmanacConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (ALMANAC_*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let config_file = args
            .try_get_one::<String>("config")
            .unwrap_or(None)
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        // A file named on the command line has to exist; the default one is optional
        let config_required = matches!(args.value_source("config"), Some(ValueSource::CommandLine));

        let mut builder = ConfigBuilder::builder()
            // 1. Start with defaults
            .add_source(ConfigBuilder::try_from(&Self::default())?)
            // 2. Add configuration file if it exists
            .add_source(File::from(PathBuf::from(&config_file)).required(config_required))
            // 3. Add environment variables with ALMANAC_ prefix
            .add_source(
                Environment::with_prefix("ALMANAC")
                    .prefix_separator("_")
                    .separator("__"), // Use double underscore for nested keys
            );

        // 4. Override with CLI arguments that are defined for this command
        for (arg, key) in [
            ("content-dir", "content.dir"),
            ("output", "content.output_dir"),
            ("addr", "server.addr"),
            ("use-bundled-assets", "server.use_bundled_assets"),
        ] {
            if let Some(value) = args.try_get_one::<String>(arg).unwrap_or(None) {
                builder = builder.set_override(key, value.as_str())?;
            }
        }
        if args.try_get_one::<bool>("open").unwrap_or(None) == Some(&true) {
            builder = builder.set_override("server.open", true)?;
        }

        let config: AlmanacConfig = builder.build()?.try_deserialize()?;

        Ok(config)
    }

    /// The part of the configuration almanac-core works from
    pub fn wiki_config(&self) -> WikiConfig {
        WikiConfig {
            content: self.content.clone(),
            discord: self.discord.clone(),
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        let assets = match (&self.content.static_dir, self.server.use_bundled_assets) {
            (Some(dir), false) => Assets::Directory(PathBuf::from(dir)),
            _ => Assets::Bundled,
        };

        ServerConfig {
            addr: self.server.addr.clone(),
            open: self.server.open,
            assets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, ArgAction, Command};
    use tempfile::TempDir;

    fn app() -> Command {
        Command::new("test")
            .arg(Arg::new("content-dir").long("content-dir").value_name("DIR"))
            .arg(Arg::new("config").long("config").value_name("FILE"))
            .arg(Arg::new("addr").long("addr").value_name("ADDR"))
            .arg(Arg::new("use-bundled-assets").long("use-bundled-assets").value_name("BOOL"))
            .arg(Arg::new("open").long("open").action(ArgAction::SetTrue))
    }

    #[test]
    fn test_default_config() {
        let config = AlmanacConfig::default();
        assert_eq!(config.content.dir, "./content");
        assert_eq!(config.content.output_dir, "./output");
        assert_eq!(config.server.addr, "127.0.0.1:8080");
        assert!(config.server.use_bundled_assets);
        assert_eq!(config.discord.cache_ttl_days, 7);
    }

    #[test]
    fn test_cli_args_override() {
        let matches = app()
            .try_get_matches_from(vec![
                "test",
                "--content-dir", "/custom/content",
                "--addr", "0.0.0.0:9000",
                "--open",
            ])
            .unwrap();

        let config = AlmanacConfig::load(&matches).unwrap();
        assert_eq!(config.content.dir, "/custom/content");
        assert_eq!(config.server.addr, "0.0.0.0:9000");
        assert!(config.server.open);
        // Should still have defaults for non-overridden values
        assert_eq!(config.content.output_dir, "./output");
    }

    #[test]
    fn test_config_file_then_cli() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("almanac.toml");
        std::fs::write(
            &path,
            r#"
            [content]
            dir = "from-file"
            static_dir = "public"

            [server]
            addr = "127.0.0.1:4000"

            [discord]
            cache_ttl_days = 30
            "#,
        )
        .unwrap();

        let matches = app()
            .try_get_matches_from(vec![
                "test",
                "--config", path.to_str().unwrap(),
                "--addr", "127.0.0.1:5000",
                "--use-bundled-assets", "false",
            ])
            .unwrap();

        let config = AlmanacConfig::load(&matches).unwrap();
        assert_eq!(config.content.dir, "from-file");
        assert_eq!(config.server.addr, "127.0.0.1:5000");
        assert_eq!(config.discord.cache_ttl_days, 30);
        assert!(!config.server.use_bundled_assets);
        assert_eq!(
            config.server_config().assets,
            Assets::Directory(PathBuf::from("public"))
        );
    }

    #[test]
    fn test_missing_explicit_config_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        let matches = app()
            .try_get_matches_from(vec!["test", "--config", missing.to_str().unwrap()])
            .unwrap();

        assert!(AlmanacConfig::load(&matches).is_err());
    }

    #[test]
    fn test_bundled_assets_without_static_dir() {
        let config = AlmanacConfig {
            server: ServerSection {
                use_bundled_assets: false,
                ..ServerSection::default()
            },
            ..AlmanacConfig::default()
        };
        assert_eq!(config.server_config().assets, Assets::Bundled);
    }
}

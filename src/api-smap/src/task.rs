//! The `sitemap-task` operational commands.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use core_smap::{BuildConfig, BuildCoordinator, BuildReport, OutputFormat, OutputTarget, Result};

#[derive(Parser, Debug)]
#[command(name = "sitemap-task")]
#[command(about = "Generate or clear the site's sitemaps", long_about = None)]
pub struct TaskCli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the sitemaps, writing files unless --update-cache is given.
    Generate(GenerateArgs),
    /// Drop every cached sitemap. The next request rebuilds them.
    Clear,
}

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Refresh the cache served over HTTP instead of writing files.
    #[arg(long)]
    pub update_cache: bool,
    /// Output format: xml or text.
    #[arg(long, value_parser = parse_format)]
    pub format: Option<OutputFormat>,
    /// Indent plaintext output by page depth.
    #[arg(long, overrides_with = "no_indent")]
    pub indent: bool,
    #[arg(long, overrides_with = "indent")]
    pub no_indent: bool,
    /// Comma-separated content types to leave out, added to SITEMAP_EXCLUDE_TYPES.
    #[arg(long, value_delimiter = ',')]
    pub exclude_types: Vec<String>,
    /// Write one sitemap per locale plus an index.
    #[arg(long)]
    pub per_locale: bool,
    /// Output file in single-sitemap mode, relative to the output directory. Defaults to stdout.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

fn parse_format(s: &str) -> std::result::Result<OutputFormat, String> {
    s.parse::<OutputFormat>().map_err(|e| e.to_string())
}

impl GenerateArgs {
    /// Overrides the environment's configuration with the command-line flags.
    pub fn apply(&self, mut config: BuildConfig, output_dir: PathBuf) -> BuildConfig {
        if let Some(format) = self.format {
            config.format = format;
        }
        if self.indent {
            config.indent = true;
        } else if self.no_indent {
            config.indent = false;
        }
        config.exclude_types.extend(
            self.exclude_types
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        );
        if self.per_locale {
            config.per_locale = true;
        }
        config.target = if self.update_cache {
            OutputTarget::Cache
        } else {
            OutputTarget::Files {
                output_dir,
                file: self.file.clone(),
            }
        };
        config.resolved()
    }
}

/// Runs one command. `generate` returns its build report, `clear` returns `None`.
pub async fn execute(
    command: &Command,
    coordinator: &BuildCoordinator,
    config: BuildConfig,
    output_dir: PathBuf,
) -> Result<Option<BuildReport>> {
    match command {
        Command::Generate(args) => {
            let config = args.apply(config, output_dir);
            tracing::info!(
                "Generating {} sitemap{} into {}",
                config.format,
                if config.per_locale { "s per locale" } else { "" },
                match &config.target {
                    OutputTarget::Cache => "the cache".to_string(),
                    OutputTarget::Files { output_dir, .. } => output_dir.display().to_string(),
                }
            );
            coordinator.build(&config).await.map(Some)
        }
        Command::Clear => {
            coordinator.clear_cache().await?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_smap::{CACHE_NAMESPACE, Document, LocalBuildLock, MemoryCache, MemoryContentRepository};
    use std::sync::Arc;

    fn parse(args: &[&str]) -> TaskCli {
        TaskCli::try_parse_from(std::iter::once("sitemap-task").chain(args.iter().copied())).unwrap()
    }

    fn generate_args(args: &[&str]) -> GenerateArgs {
        match parse(args).command {
            Command::Generate(args) => args,
            Command::Clear => panic!("expected generate"),
        }
    }

    #[test]
    fn test_parse_generate_flags() {
        let args = generate_args(&[
            "generate",
            "--format",
            "text",
            "--indent",
            "--exclude-types",
            "product,event",
            "--file",
            "map.txt",
        ]);
        assert_eq!(args.format, Some(OutputFormat::Text));
        assert!(args.indent);
        assert_eq!(args.exclude_types, vec!["product".to_string(), "event".to_string()]);
        assert_eq!(args.file, Some(PathBuf::from("map.txt")));
        assert!(!args.update_cache);
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        let result = TaskCli::try_parse_from(["sitemap-task", "generate", "--format", "json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_clear() {
        assert!(matches!(parse(&["clear"]).command, Command::Clear));
    }

    #[test]
    fn test_flags_override_environment() {
        let env_config = BuildConfig::builder().indent(true).exclude_type("product").build();
        let args = generate_args(&["generate", "--no-indent", "--exclude-types", "event", "--per-locale"]);

        let config = args.apply(env_config, PathBuf::from("public"));
        assert!(!config.indent);
        assert_eq!(config.exclude_types, vec!["product".to_string(), "event".to_string()]);
        assert!(config.per_locale);
        assert_eq!(
            config.target,
            OutputTarget::Files {
                output_dir: PathBuf::from("public"),
                file: None
            }
        );
    }

    #[test]
    fn test_update_cache_targets_cache() {
        let args = generate_args(&["generate", "--update-cache", "--format", "text", "--per-locale"]);
        let config = args.apply(BuildConfig::default(), PathBuf::from("public"));
        assert_eq!(config.target, OutputTarget::Cache);
        assert!(!config.per_locale);
    }

    #[tokio::test]
    async fn test_generate_then_clear() {
        let cache = Arc::new(MemoryCache::new());
        let repository = MemoryContentRepository::new().with_page("en", Document::page("home", "/", 0, 0));
        let coordinator = BuildCoordinator::new(Arc::new(repository), cache.clone(), Arc::new(LocalBuildLock::new()));

        let generate = parse(&["generate", "--update-cache"]).command;
        let report = execute(&generate, &coordinator, BuildConfig::default(), PathBuf::from("public"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.records, 1);
        assert_eq!(cache.keys(CACHE_NAMESPACE).await, vec!["sitemap.xml".to_string()]);

        let clear = parse(&["clear"]).command;
        assert!(
            execute(&clear, &coordinator, BuildConfig::default(), PathBuf::from("public"))
                .await
                .unwrap()
                .is_none()
        );
        assert!(cache.keys(CACHE_NAMESPACE).await.is_empty());
    }
}

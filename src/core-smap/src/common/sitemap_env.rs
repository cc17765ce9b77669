//! Build configuration from `SITEMAP_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::{BuildConfig, DEFAULT_CACHE_LIFETIME, DEFAULT_LOCALE, DEFAULT_PIECES_PER_BATCH, OutputFormat};
use crate::errors::{Error, Result};

/// Directory that file output is rooted at when SITEMAP_OUTPUT_DIR is unset.
pub const DEFAULT_OUTPUT_DIR: &str = "public";

/// True for "1", "true", "yes" or "y" in any case.
pub fn is_truthy(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "1" || v == "true" || v == "yes" || v == "y"
}

/// Reads the sitemap build configuration from the process environment.
/// The output target is left at the cache; commands that write files set it themselves.
pub fn get_build_config() -> Result<BuildConfig> {
    build_config_from(|name| std::env::var(name).ok())
}

/// Root of file output, from SITEMAP_OUTPUT_DIR.
pub fn get_output_dir() -> PathBuf {
    std::env::var("SITEMAP_OUTPUT_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

/// Same as [`get_build_config`] with an arbitrary variable source.
pub fn build_config_from<F>(lookup: F) -> Result<BuildConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let flag = |name: &str| var(name).map(|v| is_truthy(&v)).unwrap_or(false);

    let format = match var("SITEMAP_FORMAT") {
        Some(f) => f.parse::<OutputFormat>()?,
        None => OutputFormat::default(),
    };
    let exclude_types: Vec<String> = var("SITEMAP_EXCLUDE_TYPES")
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let base_url = var("SITEMAP_BASE_URL").or_else(|| var("BASE_URL"));

    let mut builder = BuildConfig::builder()
        .format(format)
        .indent(flag("SITEMAP_INDENT"))
        .exclude_types(exclude_types)
        .per_locale(flag("SITEMAP_PER_LOCALE"))
        .path_prefix(&var("SITEMAP_PREFIX").unwrap_or_default())
        .pieces_per_batch(number(
            "SITEMAP_PIECES_PER_BATCH",
            var("SITEMAP_PIECES_PER_BATCH"),
            DEFAULT_PIECES_PER_BATCH,
        )?)
        .cache_lifetime(Duration::from_secs(number(
            "SITEMAP_CACHE_LIFETIME_S",
            var("SITEMAP_CACHE_LIFETIME_S"),
            DEFAULT_CACHE_LIFETIME.as_secs(),
        )?))
        .default_locale(&var("SITEMAP_DEFAULT_LOCALE").unwrap_or_else(|| DEFAULT_LOCALE.to_string()))
        .localized(flag("SITEMAP_LOCALIZED"));
    if let Some(base_url) = base_url {
        builder = builder.base_url(&base_url);
    }

    Ok(builder.build())
}

fn number<T: FromStr>(name: &str, value: Option<String>, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| Error::Configuration(format!("{} must be a valid number, got '{}': {}", name, v, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> Result<BuildConfig> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        build_config_from(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_is_truthy() {
        for v in ["1", "true", "TRUE", "yes", "Y", " y "] {
            assert!(is_truthy(v), "{}", v);
        }
        for v in ["0", "false", "no", "", "on"] {
            assert!(!is_truthy(v), "{}", v);
        }
    }

    #[test]
    fn test_defaults() {
        let config = from_vars(&[]).unwrap();
        assert_eq!(config, BuildConfig::default());
    }

    #[test]
    fn test_all_variables() {
        let config = from_vars(&[
            ("SITEMAP_FORMAT", "xml"),
            ("SITEMAP_EXCLUDE_TYPES", "product, event,,"),
            ("SITEMAP_PER_LOCALE", "yes"),
            ("SITEMAP_BASE_URL", "https://example.com/"),
            ("SITEMAP_PREFIX", "/site"),
            ("SITEMAP_PIECES_PER_BATCH", "25"),
            ("SITEMAP_CACHE_LIFETIME_S", "60"),
            ("SITEMAP_LOCALIZED", "1"),
            ("SITEMAP_DEFAULT_LOCALE", "fr"),
        ])
        .unwrap();

        assert_eq!(config.exclude_types, vec!["product".to_string(), "event".to_string()]);
        assert!(config.per_locale);
        assert_eq!(config.base_url.as_deref(), Some("https://example.com"));
        assert_eq!(config.path_prefix, "/site");
        assert_eq!(config.pieces_per_batch, 25);
        assert_eq!(config.cache_lifetime, Duration::from_secs(60));
        assert!(config.localized);
        assert_eq!(config.default_locale, "fr");
    }

    #[test]
    fn test_base_url_fallback() {
        let config = from_vars(&[("BASE_URL", "https://fallback.example")]).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://fallback.example"));

        let config = from_vars(&[
            ("BASE_URL", "https://fallback.example"),
            ("SITEMAP_BASE_URL", "https://sitemap.example"),
        ])
        .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://sitemap.example"));
    }

    #[test]
    fn test_text_format_disables_per_locale() {
        let config = from_vars(&[("SITEMAP_FORMAT", "text"), ("SITEMAP_PER_LOCALE", "true"), ("SITEMAP_INDENT", "y")]).unwrap();
        assert_eq!(config.format, OutputFormat::Text);
        assert!(config.indent);
        assert!(!config.per_locale);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(from_vars(&[("SITEMAP_FORMAT", "json")]), Err(Error::Configuration(_))));
        assert!(matches!(
            from_vars(&[("SITEMAP_PIECES_PER_BATCH", "many")]),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            from_vars(&[("SITEMAP_CACHE_LIFETIME_S", "-1")]),
            Err(Error::Configuration(_))
        ));
    }
}

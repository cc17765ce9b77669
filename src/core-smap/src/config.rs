//! Configuration options for one sitemap build.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{Error, Result};

/// Default number of collection items fetched per page.
pub const DEFAULT_PIECES_PER_BATCH: usize = 100;

/// Default cache lifetime: one hour.
pub const DEFAULT_CACHE_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Locale used when the site is not localized.
pub const DEFAULT_LOCALE: &str = "en";

/// Serialized output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Xml,
    Text,
}

impl OutputFormat {
    /// File extension for artifacts in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Text => "txt",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "xml" => Ok(Self::Xml),
            "text" | "txt" => Ok(Self::Text),
            other => Err(Error::Configuration(format!(
                "Unknown sitemap format '{}': expected 'xml' or 'text'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xml => write!(f, "xml"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// Where published artifacts go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputTarget {
    /// Replace the cached artifacts served over HTTP.
    #[default]
    Cache,
    /// Write files under `output_dir`. In single-file mode, `file` names the output
    /// (relative paths resolve against `output_dir`); `None` means standard output.
    Files { output_dir: PathBuf, file: Option<PathBuf> },
}

/// Immutable configuration for one build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub format: OutputFormat,
    /// Indent plaintext lines by tree depth.
    pub indent: bool,
    /// Content types never emitted, whether pages or collection items.
    pub exclude_types: Vec<String>,
    /// One artifact per locale plus an index, instead of a single artifact.
    pub per_locale: bool,
    /// Absolute site URL with no trailing slash. Required for per-locale output.
    pub base_url: Option<String>,
    /// Mount prefix of the site, prepended to index locations.
    pub path_prefix: String,
    pub pieces_per_batch: usize,
    pub cache_lifetime: Duration,
    pub default_locale: String,
    /// Ask the content repository for its active locales instead of using the default one.
    pub localized: bool,
    pub target: OutputTarget,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Xml,
            indent: false,
            exclude_types: Vec::new(),
            per_locale: false,
            base_url: None,
            path_prefix: String::new(),
            pieces_per_batch: DEFAULT_PIECES_PER_BATCH,
            cache_lifetime: DEFAULT_CACHE_LIFETIME,
            default_locale: DEFAULT_LOCALE.to_string(),
            localized: false,
            target: OutputTarget::Cache,
        }
    }
}

impl BuildConfig {
    /// Creates a new builder for BuildConfig.
    pub fn builder() -> BuildConfigBuilder {
        BuildConfigBuilder::default()
    }

    /// Applies the rules that tie options together: plaintext is always a single flat report.
    pub fn resolved(mut self) -> Self {
        if self.format == OutputFormat::Text {
            self.per_locale = false;
        }
        if let Some(base_url) = &self.base_url {
            let trimmed = base_url.trim().trim_end_matches('/').to_string();
            self.base_url = if trimmed.is_empty() { None } else { Some(trimmed) };
        }
        self
    }

    /// Checks preconditions that must hold before any I/O happens.
    pub fn validate(&self) -> Result<()> {
        if self.pieces_per_batch == 0 {
            return Err(Error::Configuration("pieces per batch must be positive".to_string()));
        }
        match &self.base_url {
            Some(base_url) => {
                url::Url::parse(base_url)
                    .map_err(|e| Error::Configuration(format!("Invalid base URL '{}': {}", base_url, e)))?;
                Ok(())
            }
            None if self.per_locale => Err(Error::Configuration(
                "You must specify a base URL to use sitemap indexes (per-locale mode). \
                 Example: https://mycompany.com (note there is NO trailing slash)"
                    .to_string(),
            )),
            None => Ok(()),
        }
    }

    /// Cache key checked by the read path to tell "never built" from "does not exist".
    pub fn sentinel_name(&self) -> String {
        if self.per_locale {
            crate::publish::INDEX_ARTIFACT.to_string()
        } else {
            crate::publish::single_artifact_name(self.format)
        }
    }

    pub fn is_excluded(&self, type_name: &str) -> bool {
        self.exclude_types.iter().any(|t| t == type_name)
    }
}

/// Builder for BuildConfig.
#[derive(Debug, Clone, Default)]
pub struct BuildConfigBuilder {
    format: Option<OutputFormat>,
    indent: bool,
    exclude_types: Vec<String>,
    per_locale: bool,
    base_url: Option<String>,
    path_prefix: Option<String>,
    pieces_per_batch: Option<usize>,
    cache_lifetime: Option<Duration>,
    default_locale: Option<String>,
    localized: bool,
    target: Option<OutputTarget>,
}

impl BuildConfigBuilder {
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Adds a content type to exclude.
    pub fn exclude_type(mut self, type_name: &str) -> Self {
        self.exclude_types.push(type_name.to_string());
        self
    }

    /// Adds multiple content types to exclude.
    pub fn exclude_types(mut self, type_names: Vec<String>) -> Self {
        self.exclude_types.extend(type_names);
        self
    }

    pub fn per_locale(mut self, per_locale: bool) -> Self {
        self.per_locale = per_locale;
        self
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    pub fn path_prefix(mut self, path_prefix: &str) -> Self {
        self.path_prefix = Some(path_prefix.to_string());
        self
    }

    pub fn pieces_per_batch(mut self, pieces_per_batch: usize) -> Self {
        self.pieces_per_batch = Some(pieces_per_batch);
        self
    }

    pub fn cache_lifetime(mut self, cache_lifetime: Duration) -> Self {
        self.cache_lifetime = Some(cache_lifetime);
        self
    }

    pub fn default_locale(mut self, locale: &str) -> Self {
        self.default_locale = Some(locale.to_string());
        self
    }

    pub fn localized(mut self, localized: bool) -> Self {
        self.localized = localized;
        self
    }

    pub fn target(mut self, target: OutputTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Builds the BuildConfig with its cross-option rules applied.
    pub fn build(self) -> BuildConfig {
        BuildConfig {
            format: self.format.unwrap_or_default(),
            indent: self.indent,
            exclude_types: self.exclude_types,
            per_locale: self.per_locale,
            base_url: self.base_url,
            path_prefix: self.path_prefix.unwrap_or_default(),
            pieces_per_batch: self.pieces_per_batch.unwrap_or(DEFAULT_PIECES_PER_BATCH),
            cache_lifetime: self.cache_lifetime.unwrap_or(DEFAULT_CACHE_LIFETIME),
            default_locale: self.default_locale.unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            localized: self.localized,
            target: self.target.unwrap_or_default(),
        }
        .resolved()
    }
}

//! Lays out serialized sitemaps as named artifacts and hands them to their destination.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;

use crate::collab::{CacheRecord, CacheStore};
use crate::config::{OutputFormat, OutputTarget};
use crate::context::BuildContext;
use crate::entry::LocaleMap;
use crate::errors::{Error, Result};
use crate::serialize::{serialize, sitemap_index_document, urlset_document};

/// Cache namespace holding every artifact of this engine.
pub const CACHE_NAMESPACE: &str = "sitemap";

/// Name of the sitemap index produced in per-locale mode.
pub const INDEX_ARTIFACT: &str = "sitemaps/index.xml";

/// Path understood as "write to standard output".
pub const STDOUT_PATH: &str = "/dev/stdout";

/// A finished output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub data: Vec<u8>,
}

impl Artifact {
    fn new(name: String, data: String) -> Self {
        Self {
            name,
            data: data.into_bytes(),
        }
    }
}

pub fn single_artifact_name(format: OutputFormat) -> String {
    format!("sitemap.{}", format.extension())
}

pub fn locale_artifact_name(locale: &str, format: OutputFormat) -> String {
    format!("sitemaps/{}.{}", locale, format.extension())
}

/// Serializes the map into its artifacts without touching any destination.
///
/// Single-output mode yields one artifact with every locale's records, in map order.
/// Per-locale mode yields one artifact per locale followed by the index.
///
/// # Errors
///
/// Returns a configuration error when per-locale output is requested without a base URL.
pub fn render(map: &LocaleMap, context: &BuildContext) -> Result<Vec<Artifact>> {
    let config = &context.config;

    if !config.per_locale {
        let body: String = map
            .buckets()
            .iter()
            .map(|bucket| serialize(&bucket.records, config.format))
            .collect();
        let document = match config.format {
            OutputFormat::Xml => urlset_document(&body),
            OutputFormat::Text => body,
        };
        return Ok(vec![Artifact::new(single_artifact_name(config.format), document)]);
    }

    let base_url = config.base_url.as_deref().ok_or_else(|| {
        Error::Configuration("A base URL is required to build a sitemap index".to_string())
    })?;
    let lastmod = context.generated_at.to_rfc3339_opts(SecondsFormat::Millis, true);

    let mut artifacts = Vec::with_capacity(map.buckets().len() + 1);
    let mut index = Vec::with_capacity(map.buckets().len());
    for bucket in map.buckets() {
        let name = locale_artifact_name(&bucket.locale, config.format);
        let body = serialize(&bucket.records, config.format);
        index.push((format!("{}{}/{}", base_url, config.path_prefix, name), lastmod.clone()));
        artifacts.push(Artifact::new(name, urlset_document(&body)));
    }
    artifacts.push(Artifact::new(INDEX_ARTIFACT.to_string(), sitemap_index_document(&index)));

    Ok(artifacts)
}

/// Renders the map and writes the artifacts to the configured target.
///
/// The cache target is cleared first and then repopulated one artifact at a time; a failure
/// midway leaves the cache partially empty, which the read path treats as a cold cache.
pub async fn publish(map: &LocaleMap, context: &BuildContext, cache: &dyn CacheStore) -> Result<Vec<Artifact>> {
    let artifacts = render(map, context)?;

    match &context.config.target {
        OutputTarget::Cache => write_to_cache(&artifacts, context, cache).await?,
        OutputTarget::Files { output_dir, file } => {
            write_to_files(&artifacts, output_dir, file.as_deref(), context.config.per_locale).await?
        }
    }

    tracing::info!(
        "Published {} sitemap artifact(s): {}",
        artifacts.len(),
        artifacts.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ")
    );
    Ok(artifacts)
}

async fn write_to_cache(artifacts: &[Artifact], context: &BuildContext, cache: &dyn CacheStore) -> Result<()> {
    cache.clear(CACHE_NAMESPACE).await?;
    for artifact in artifacts {
        let record = CacheRecord {
            key: artifact.name.clone(),
            data: artifact.data.clone(),
            created_at: context.generated_at,
        };
        cache
            .set(CACHE_NAMESPACE, &artifact.name, record, context.config.cache_lifetime)
            .await?;
        tracing::debug!("Cached {} ({} bytes)", artifact.name, artifact.data.len());
    }
    Ok(())
}

enum FileDestination {
    Stdout,
    Path(PathBuf),
}

fn file_destination(path: PathBuf) -> FileDestination {
    if path == Path::new(STDOUT_PATH) {
        FileDestination::Stdout
    } else {
        FileDestination::Path(path)
    }
}

/// One write of the whole artifact to fd 1, flushed immediately.
fn write_stdout(data: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(data)?;
    stdout.flush()
}

async fn write_to_files(artifacts: &[Artifact], output_dir: &Path, file: Option<&Path>, per_locale: bool) -> Result<()> {
    for artifact in artifacts {
        let destination = if per_locale {
            file_destination(output_dir.join(&artifact.name))
        } else {
            match file {
                Some(file) => file_destination(output_dir.join(file)),
                None => FileDestination::Stdout,
            }
        };

        match destination {
            FileDestination::Stdout => write_stdout(&artifact.data)?,
            FileDestination::Path(path) => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, &artifact.data).await?;
                tracing::debug!("Wrote {} ({} bytes)", path.display(), artifact.data.len());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::MemoryCache;
    use crate::config::BuildConfig;
    use crate::entry::{ChangeFrequency, Entry, Record};
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn entry(locale: &str, url: &str) -> Record {
        Record::Url(Entry {
            locale: locale.to_string(),
            url: url.to_string(),
            priority: 1.0,
            change_frequency: ChangeFrequency::Daily,
            group_key: None,
            alternates: Vec::new(),
            depth: 0,
        })
    }

    fn map() -> LocaleMap {
        let mut map = LocaleMap::new();
        map.extend("en", [entry("en", "/")]);
        map.extend("fr", [entry("fr", "/fr/")]);
        map
    }

    fn context(config: BuildConfig) -> BuildContext {
        BuildContext::at(config, Utc.with_ymd_and_hms(2026, 10, 16, 8, 30, 0).unwrap())
    }

    fn text(artifact: &Artifact) -> String {
        String::from_utf8(artifact.data.clone()).unwrap()
    }

    #[test]
    fn test_single_output_concatenates_locales_in_order() {
        let artifacts = render(&map(), &context(BuildConfig::default())).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name, "sitemap.xml");

        let xml = text(&artifacts[0]);
        assert_eq!(xml.matches("<urlset").count(), 1);
        assert!(xml.find("<loc>/</loc>").unwrap() < xml.find("<loc>/fr/</loc>").unwrap());
    }

    #[test]
    fn test_text_output_has_no_envelope() {
        let mut map = LocaleMap::new();
        map.extend("en", [Record::Line("/\n".to_string()), Record::Line("  /a\n".to_string())]);
        let config = BuildConfig::builder().format(OutputFormat::Text).build();

        let artifacts = render(&map, &context(config)).unwrap();
        assert_eq!(artifacts[0].name, "sitemap.txt");
        assert_eq!(text(&artifacts[0]), "/\n  /a\n");
    }

    #[test]
    fn test_per_locale_output_with_index() {
        let config = BuildConfig::builder()
            .per_locale(true)
            .base_url("https://example.com")
            .path_prefix("/site")
            .build();

        let artifacts = render(&map(), &context(config)).unwrap();
        let names: Vec<&str> = artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["sitemaps/en.xml", "sitemaps/fr.xml", "sitemaps/index.xml"]);

        let index = text(&artifacts[2]);
        assert!(index.contains("<loc>https://example.com/site/sitemaps/en.xml</loc>"));
        assert!(index.contains("<loc>https://example.com/site/sitemaps/fr.xml</loc>"));
        assert!(index.contains("<lastmod>2026-10-16T08:30:00.000Z</lastmod>"));
        assert!(!text(&artifacts[0]).contains("/fr/"));
    }

    #[test]
    fn test_per_locale_without_base_url_fails() {
        let mut config = BuildConfig::builder().per_locale(true).build();
        config.base_url = None;
        assert!(matches!(render(&map(), &context(config)), Err(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn test_publish_to_cache_replaces_previous_artifacts() {
        let cache = MemoryCache::new();
        let stale = CacheRecord {
            key: "sitemaps/old.xml".to_string(),
            data: b"old".to_vec(),
            created_at: Utc::now(),
        };
        cache
            .set(CACHE_NAMESPACE, "sitemaps/old.xml", stale, Duration::from_secs(60))
            .await
            .unwrap();

        let ctx = context(BuildConfig::default());
        publish(&map(), &ctx, &cache).await.unwrap();

        assert_eq!(cache.keys(CACHE_NAMESPACE).await, vec!["sitemap.xml".to_string()]);
        let record = cache.get(CACHE_NAMESPACE, "sitemap.xml").await.unwrap().unwrap();
        assert_eq!(record.created_at, ctx.generated_at);
    }

    #[tokio::test]
    async fn test_publish_to_files_creates_directories() {
        let dir = std::env::temp_dir().join(format!("core-smap-publish-{}", uuid::Uuid::new_v4()));
        let config = BuildConfig::builder()
            .per_locale(true)
            .base_url("https://example.com")
            .target(OutputTarget::Files {
                output_dir: dir.clone(),
                file: None,
            })
            .build();

        publish(&map(), &context(config), &MemoryCache::new()).await.unwrap();

        assert!(dir.join("sitemaps/en.xml").is_file());
        assert!(dir.join("sitemaps/fr.xml").is_file());
        let index = std::fs::read_to_string(dir.join("sitemaps/index.xml")).unwrap();
        assert!(index.contains("<sitemapindex"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_publish_single_file_to_named_path() {
        let dir = std::env::temp_dir().join(format!("core-smap-single-{}", uuid::Uuid::new_v4()));
        let config = BuildConfig::builder()
            .target(OutputTarget::Files {
                output_dir: dir.clone(),
                file: Some(PathBuf::from("nested/map.xml")),
            })
            .build();

        let cache = MemoryCache::new();
        publish(&map(), &context(config), &cache).await.unwrap();

        let xml = std::fs::read_to_string(dir.join("nested/map.xml")).unwrap();
        assert!(xml.contains("<loc>/fr/</loc>"));
        assert_eq!(cache.set_count(), 0);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}

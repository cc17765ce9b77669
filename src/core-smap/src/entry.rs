//! Sitemap data model: source documents, harvested entries and the per-locale map.

use chrono::NaiveDate;

/// How often crawlers are told a URL changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeFrequency {
    Always,
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl std::fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A page or content item as exposed by the content repository.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Content type tag (page type or collection type).
    pub type_name: String,
    /// Display URL. Documents without one have no sitemap meaning.
    pub url: Option<String>,
    /// Tree depth for pages. Ignored for collection items, which get a synthetic depth.
    pub level: u32,
    /// Sibling rank among pages sharing a parent.
    pub rank: i32,
    /// Shared by every locale variant of the same content.
    pub group_key: Option<String>,
    /// Replaces the computed priority when present.
    pub priority_override: Option<f64>,
    /// Start date of time-bound content (events and the like).
    pub start_date: Option<NaiveDate>,
}

impl Document {
    pub fn page(type_name: &str, url: &str, level: u32, rank: i32) -> Self {
        Self {
            type_name: type_name.to_string(),
            url: Some(url.to_string()),
            level,
            rank,
            ..Default::default()
        }
    }

    pub fn item(type_name: &str, url: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            url: Some(url.to_string()),
            ..Default::default()
        }
    }

    pub fn with_group_key(mut self, group_key: &str) -> Self {
        self.group_key = Some(group_key.to_string());
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority_override = Some(priority);
        self
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }
}

/// An alternate-language link: the same content published under another locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternate {
    pub locale: String,
    pub url: String,
}

/// One sitemap record.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub locale: String,
    pub url: String,
    pub priority: f64,
    pub change_frequency: ChangeFrequency,
    /// Bookkeeping for the cross-linker; always `None` once cross-linking has run.
    pub group_key: Option<String>,
    pub alternates: Vec<Alternate>,
    pub depth: u32,
}

/// A harvested line of output for one locale.
///
/// Structured entries are produced for XML; plaintext reports carry ready-made lines
/// and skip priority, change frequency and alternates altogether.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Url(Entry),
    Line(String),
}

impl Record {
    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            Record::Url(entry) => Some(entry),
            Record::Line(_) => None,
        }
    }
}

/// Records for one locale, in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleBucket {
    pub locale: String,
    pub records: Vec<Record>,
}

/// Locale → ordered records. Locales keep the order in which they were inserted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocaleMap {
    buckets: Vec<LocaleBucket>,
}

impl LocaleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends records to a locale's bucket, creating the bucket on first use.
    pub fn extend(&mut self, locale: &str, records: impl IntoIterator<Item = Record>) {
        match self.buckets.iter_mut().find(|b| b.locale == locale) {
            Some(bucket) => bucket.records.extend(records),
            None => self.buckets.push(LocaleBucket {
                locale: locale.to_string(),
                records: records.into_iter().collect(),
            }),
        }
    }

    pub fn get(&self, locale: &str) -> Option<&[Record]> {
        self.buckets
            .iter()
            .find(|b| b.locale == locale)
            .map(|b| b.records.as_slice())
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.locale.as_str())
    }

    pub fn buckets(&self) -> &[LocaleBucket] {
        &self.buckets
    }

    pub fn buckets_mut(&mut self) -> &mut [LocaleBucket] {
        &mut self.buckets
    }

    /// Every structured entry across all locales, in locale order then record order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.buckets
            .iter()
            .flat_map(|b| b.records.iter())
            .filter_map(Record::as_entry)
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

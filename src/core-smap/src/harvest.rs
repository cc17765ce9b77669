//! Walks the page tree and every sitemap-eligible content collection of one locale.

use chrono::NaiveDate;

use crate::collab::ContentRepository;
use crate::config::OutputFormat;
use crate::context::BuildContext;
use crate::entry::{ChangeFrequency, Document, Entry, Record};
use crate::errors::Result;

/// Synthetic tree depth given to collection items, ranking them below top-level pages.
pub const ITEM_DEPTH: u32 = 3;

pub const MIN_PRIORITY: f64 = 0.1;
pub const MAX_PRIORITY: f64 = 1.0;

/// Priority from tree depth: 1.0 at the root, minus 0.1 per level, never below 0.1.
pub fn depth_priority(depth: u32) -> f64 {
    if depth < 10 {
        f64::from(10 - depth) / 10.0
    } else {
        MIN_PRIORITY
    }
}

/// Depth of a collection item. Upcoming content is more interesting than past content.
pub fn item_depth(start_date: Option<NaiveDate>, today: NaiveDate) -> u32 {
    match start_date {
        Some(start) if start > today => ITEM_DEPTH - 1,
        Some(_) => ITEM_DEPTH + 1,
        None => ITEM_DEPTH,
    }
}

/// Final priority of a document at `depth`, honoring its explicit override.
pub fn priority(document: &Document, depth: u32) -> f64 {
    match document.priority_override {
        Some(p) if (MIN_PRIORITY..=MAX_PRIORITY).contains(&p) => p,
        Some(p) => {
            tracing::warn!(
                "Priority override {} on '{}' is outside [{}, {}], clamping",
                p,
                document.url.as_deref().unwrap_or_default(),
                MIN_PRIORITY,
                MAX_PRIORITY
            );
            if p.is_nan() { MIN_PRIORITY } else { p.clamp(MIN_PRIORITY, MAX_PRIORITY) }
        }
        None => depth_priority(depth),
    }
}

/// Harvests every record of one locale: pages first (parents before children, siblings in
/// authored order), then collection items in registry order.
///
/// # Errors
///
/// Returns an error if any repository read fails.
pub async fn harvest(repository: &dyn ContentRepository, locale: &str, context: &BuildContext) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    harvest_pages(repository, locale, context, &mut records).await?;
    harvest_collections(repository, locale, context, &mut records).await?;
    tracing::debug!("[locale: {}] Harvested {} records", locale, records.len());
    Ok(records)
}

async fn harvest_pages(
    repository: &dyn ContentRepository,
    locale: &str,
    context: &BuildContext,
    records: &mut Vec<Record>,
) -> Result<()> {
    let mut pages = repository.list_pages(locale).await?;
    // stable: equal (level, rank) pairs keep repository order
    pages.sort_by_key(|p| (p.level, p.rank));

    records.extend(pages.iter().filter_map(|page| output(page, page.level, locale, context)));
    Ok(())
}

async fn harvest_collections(
    repository: &dyn ContentRepository,
    locale: &str,
    context: &BuildContext,
    records: &mut Vec<Record>,
) -> Result<()> {
    let batch_size = context.config.pieces_per_batch;

    for type_name in repository.collections().await? {
        if context.config.is_excluded(&type_name) {
            tracing::debug!("[locale: {}] Skipping excluded collection '{}'", locale, type_name);
            continue;
        }

        let mut offset = 0;
        loop {
            let batch = repository.list_items(locale, &type_name, offset, batch_size).await?;
            let fetched = batch.len();

            records.extend(batch.iter().filter_map(|item| {
                let depth = item_depth(item.start_date, context.today);
                output(item, depth, locale, context)
            }));

            if fetched < batch_size {
                break;
            }
            offset += fetched;
        }
        tracing::debug!("[locale: {}] Collection '{}' exhausted at offset {}", locale, type_name, offset);
    }
    Ok(())
}

/// Turns a document into its sitemap record, or nothing if it is excluded or has no URL.
fn output(document: &Document, depth: u32, locale: &str, context: &BuildContext) -> Option<Record> {
    if context.config.is_excluded(&document.type_name) {
        return None;
    }
    let url = document.url.as_deref().filter(|u| !u.is_empty())?;

    let record = match context.config.format {
        OutputFormat::Text => {
            let indent = if context.config.indent {
                "  ".repeat(depth as usize)
            } else {
                String::new()
            };
            Record::Line(format!("{}{}\n", indent, url))
        }
        OutputFormat::Xml => Record::Url(Entry {
            locale: locale.to_string(),
            url: url.to_string(),
            priority: priority(document, depth),
            change_frequency: ChangeFrequency::Daily,
            group_key: document.group_key.clone().filter(|k| !k.is_empty()),
            alternates: Vec::new(),
            depth,
        }),
    };
    Some(record)
}

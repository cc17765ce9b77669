use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_smap::{CacheRecord, Document};

/// A node of the page tree.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::pages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Page {
    pub id: Uuid,
    pub type_name: String,
    pub url: Option<String>,
    pub locale: String,
    /// Depth in the page tree; the home page is 0.
    pub level: i32,
    /// Position among siblings.
    pub rank: i32,
    pub group_key: Option<String>,
    pub sitemap_priority: Option<f64>,
    pub published: bool,
}

impl From<Page> for Document {
    fn from(page: Page) -> Self {
        Document {
            type_name: page.type_name,
            url: page.url,
            level: u32::try_from(page.level).unwrap_or_default(),
            rank: page.rank,
            group_key: page.group_key,
            priority_override: page.sitemap_priority,
            start_date: None,
        }
    }
}

/// An item of a typed content collection.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::pieces)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Piece {
    pub id: Uuid,
    pub type_name: String,
    pub url: Option<String>,
    pub locale: String,
    pub group_key: Option<String>,
    pub sitemap_priority: Option<f64>,
    /// Start of time-bound content such as events.
    pub start_date: Option<NaiveDate>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Piece> for Document {
    fn from(piece: Piece) -> Self {
        Document {
            type_name: piece.type_name,
            url: piece.url,
            level: 0,
            rank: 0,
            group_key: piece.group_key,
            priority_override: piece.sitemap_priority,
            start_date: piece.start_date,
        }
    }
}

/// Registry entry of a content collection.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::content_collections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ContentCollection {
    pub type_name: String,
    /// Whether items of this collection belong in the sitemap.
    pub sitemap: bool,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::locales)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Locale {
    pub name: String,
    pub private: bool,
    pub draft: bool,
    pub position: i32,
}

/// A cached sitemap artifact.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::sitemap_cache)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CacheEntry {
    pub namespace: String,
    pub key: String,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<CacheEntry> for CacheRecord {
    fn from(entry: CacheEntry) -> Self {
        CacheRecord {
            key: entry.key,
            data: entry.data,
            created_at: entry.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(level: i32) -> Page {
        Page {
            id: Uuid::new_v4(),
            type_name: "default-page".to_string(),
            url: Some("/about".to_string()),
            locale: "en".to_string(),
            level,
            rank: 2,
            group_key: Some("about".to_string()),
            sitemap_priority: Some(0.4),
            published: true,
        }
    }

    #[test]
    fn test_page_to_document() {
        let document = Document::from(page(1));
        assert_eq!(document.type_name, "default-page");
        assert_eq!(document.url.as_deref(), Some("/about"));
        assert_eq!(document.level, 1);
        assert_eq!(document.rank, 2);
        assert_eq!(document.group_key.as_deref(), Some("about"));
        assert_eq!(document.priority_override, Some(0.4));
        assert_eq!(document.start_date, None);
    }

    #[test]
    fn test_negative_level_is_root() {
        assert_eq!(Document::from(page(-3)).level, 0);
    }

    #[test]
    fn test_piece_to_document() {
        let start = NaiveDate::from_ymd_opt(2027, 5, 1).unwrap();
        let piece = Piece {
            id: Uuid::new_v4(),
            type_name: "event".to_string(),
            url: None,
            locale: "fr".to_string(),
            group_key: None,
            sitemap_priority: None,
            start_date: Some(start),
            published: true,
            created_at: Utc::now(),
        };
        let document = Document::from(piece);
        assert_eq!(document.type_name, "event");
        assert_eq!(document.url, None);
        assert_eq!(document.start_date, Some(start));
    }
}

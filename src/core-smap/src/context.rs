use chrono::{DateTime, NaiveDate, Utc};

use crate::config::BuildConfig;

/// Everything one build needs to know, fixed when the build starts and passed explicitly
/// through harvesting, cross-linking and publishing.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub config: BuildConfig,
    /// Date against which start dates of time-bound content are judged.
    pub today: NaiveDate,
    /// Timestamp stamped on cached artifacts and the sitemap index.
    pub generated_at: DateTime<Utc>,
}

impl BuildContext {
    pub fn new(config: BuildConfig) -> Self {
        let generated_at = Utc::now();
        Self {
            config,
            today: generated_at.date_naive(),
            generated_at,
        }
    }

    pub fn at(config: BuildConfig, generated_at: DateTime<Utc>) -> Self {
        Self {
            config,
            today: generated_at.date_naive(),
            generated_at,
        }
    }
}

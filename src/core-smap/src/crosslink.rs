//! Alternate-language (hreflang) links between locale variants of the same content.

use std::collections::{HashMap, HashSet};

use crate::entry::{Alternate, LocaleMap, Record};

/// Attaches alternates to every entry that shares its group key with entries of other
/// locales, then strips the group keys.
///
/// Grouping runs over all locales of the map. Each grouped entry receives one alternate per
/// other locale of its group: the first member of that locale in discovery order (locale
/// order, then record order). Entries without a group key get no alternates. A group of one
/// yields an empty list.
pub fn cross_link(mut map: LocaleMap) -> LocaleMap {
    let mut groups: HashMap<String, Vec<Alternate>> = HashMap::new();

    for entry in map.entries() {
        if let Some(key) = &entry.group_key {
            groups.entry(key.clone()).or_default().push(Alternate {
                locale: entry.locale.clone(),
                url: entry.url.clone(),
            });
        }
    }

    for bucket in map.buckets_mut() {
        for record in bucket.records.iter_mut() {
            let Record::Url(entry) = record else {
                continue;
            };
            if let Some(key) = entry.group_key.take()
                && let Some(members) = groups.get(&key)
            {
                let mut seen = HashSet::new();
                entry.alternates = members
                    .iter()
                    .filter(|member| member.locale != entry.locale && seen.insert(member.locale.as_str()))
                    .cloned()
                    .collect();
            }
        }
    }

    tracing::debug!("Cross-linked {} content groups", groups.len());
    map
}

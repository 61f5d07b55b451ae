//! Bulk import classification
//!
//! Pure parts of bulk reconciliation: intra-payload deduplication, the
//! create/update split against the keys that already exist, and the four-way
//! outcome report.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Split `items` into first occurrences and repeated natural keys.
///
/// The first item seen for a key wins; every later item with the same key is
/// returned in the second list, in input order.
pub fn dedup_first_seen<T, F>(items: Vec<T>, key: F) -> (Vec<T>, Vec<T>)
where
    F: Fn(&T) -> &str,
{
    let mut seen = FxHashSet::default();
    let mut unique = Vec::with_capacity(items.len());
    let mut duplicates = Vec::new();

    for item in items {
        if seen.insert(key(&item).to_owned()) {
            unique.push(item);
        } else {
            duplicates.push(item);
        }
    }

    (unique, duplicates)
}

/// Unique items split by whether their natural key already exists.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkPlan<T> {
    /// Keys not found in the store.
    pub create: Vec<T>,

    /// Keys found live in the store.
    pub update: Vec<T>,
}

impl<T> BulkPlan<T> {
    /// Classify deduplicated items against the set of existing keys.
    pub fn classify<F>(unique: Vec<T>, existing: &FxHashSet<String>, key: F) -> Self
    where
        F: Fn(&T) -> &str,
    {
        let (update, create) = unique
            .into_iter()
            .partition(|item| existing.contains(key(item)));

        Self { create, update }
    }
}

/// Outcome of a bulk import, by natural key.
///
/// The four lists are disjoint and together hold one entry per input item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImport {
    /// Newly inserted.
    pub created: Vec<String>,

    /// Existing records overwritten.
    pub updated: Vec<String>,

    /// Existing records whose update could not be applied.
    pub update_failed: Vec<String>,

    /// Repeated keys within the payload.
    pub payload_duplicate: Vec<String>,
}

impl BulkImport {
    /// Number of input items accounted for.
    pub fn total(&self) -> usize {
        self.created.len() + self.updated.len() + self.update_failed.len() + self.payload_duplicate.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key<'a>(item: &'a (&'static str, u32)) -> &'a str {
        item.0
    }

    #[test]
    fn first_seen_wins() {
        let (unique, duplicates) =
            dedup_first_seen(vec![("X", 1), ("X", 2), ("Y", 3), ("X", 4)], key);

        assert_eq!(unique, vec![("X", 1), ("Y", 3)]);
        assert_eq!(duplicates, vec![("X", 2), ("X", 4)]);
    }

    #[test]
    fn empty_payload_is_empty_plan() {
        let (unique, duplicates) = dedup_first_seen(Vec::<(&str, u32)>::new(), key);
        let plan = BulkPlan::classify(unique, &FxHashSet::default(), key);

        assert!(duplicates.is_empty());
        assert!(plan.create.is_empty() && plan.update.is_empty());
    }

    #[test]
    fn classify_splits_on_existing_keys() {
        let existing: FxHashSet<String> = ["Y".to_string()].into_iter().collect();

        let plan = BulkPlan::classify(vec![("X", 1), ("Y", 2), ("Z", 3)], &existing, key);

        assert_eq!(plan.create, vec![("X", 1), ("Z", 3)]);
        assert_eq!(plan.update, vec![("Y", 2)]);
    }

    #[test]
    fn report_serializes_with_camel_case_keys() -> testresult::TestResult {
        let report = BulkImport {
            created: vec!["X".to_string()],
            updated: vec!["Y".to_string()],
            update_failed: Vec::new(),
            payload_duplicate: vec!["X".to_string()],
        };

        let value = serde_json::to_value(&report)?;

        assert_eq!(
            value,
            serde_json::json!({
                "created": ["X"],
                "updated": ["Y"],
                "updateFailed": [],
                "payloadDuplicate": ["X"],
            })
        );
        assert_eq!(report.total(), 3);

        Ok(())
    }
}

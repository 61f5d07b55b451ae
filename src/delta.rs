//! Delta feed
//!
//! Pull clients keep a watermark and ask for everything created, updated or
//! deleted since it. The two halves of the answer are disjoint: a record that
//! is deleted shows up only in `removed`, even if it was also created or
//! updated inside the same window.

use std::str::FromStr;

use jiff::{Timestamp, civil::DateTime, tz::TimeZone};
use serde::{Deserialize, Serialize};

use crate::{
    query::{Filters, PageInfo, Paging},
    records::{ActivityRecord, DeleteActivityRecord},
    validation::ValidationError,
};

/// Which halves of the feed to compute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaAction {
    /// Both `new` and `removed`.
    #[default]
    All,

    /// Only `new`.
    New,

    /// Only `removed`.
    Remove,
}

impl DeltaAction {
    /// Whether the created-or-updated query runs.
    pub fn includes_new(self) -> bool {
        matches!(self, Self::All | Self::New)
    }

    /// Whether the deleted query runs.
    pub fn includes_removed(self) -> bool {
        matches!(self, Self::All | Self::Remove)
    }
}

impl FromStr for DeltaAction {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "new" => Ok(Self::New),
            "remove" | "removed" => Ok(Self::Remove),
            _ => Err(ValidationError::UnknownAction(value.to_string())),
        }
    }
}

/// A delta pull request.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaQuery {
    /// Caller's watermark.
    pub since: Timestamp,

    /// Halves to compute.
    pub action: DeltaAction,

    /// Exact-match payload filters.
    pub filters: Filters,

    /// Requested window.
    pub paging: Paging,
}

/// Records changed since a watermark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaFeed<T> {
    /// Live records created or updated since the watermark.
    pub new: Vec<ActivityRecord<T>>,

    /// Records soft-deleted since the watermark.
    pub removed: Vec<DeleteActivityRecord<T>>,
}

impl<T> Default for DeltaFeed<T> {
    fn default() -> Self {
        Self {
            new: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<T> DeltaFeed<T> {
    /// Whether neither half has entries.
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.removed.is_empty()
    }

    /// Largest timestamp observed in this feed, suitable as the next `since`.
    pub fn watermark(&self) -> Option<Timestamp> {
        let new = self.new.iter().map(|record| record.audit.last_activity());
        let removed = self.removed.iter().map(|record| record.deleted_at);

        new.chain(removed).max()
    }
}

/// One page of a delta feed.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaPage<T> {
    /// Feed entries.
    pub feed: DeltaFeed<T>,

    /// Paging metadata for whichever half has more rows.
    pub page_info: PageInfo,
}

/// Parse a caller supplied watermark.
///
/// Accepts RFC 3339 instants (`2024-05-01T10:15:00Z`) and the minute-precision
/// civil form `2024-05-01T10:15`, read as UTC.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidWatermark`] when neither form matches.
pub fn parse_watermark(value: &str) -> Result<Timestamp, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::InvalidWatermark(value.to_string()));
    }

    if let Ok(timestamp) = trimmed.parse::<Timestamp>() {
        return Ok(timestamp);
    }

    trimmed
        .parse::<DateTime>()
        .and_then(|civil| civil.to_zoned(TimeZone::UTC))
        .map(|zoned| zoned.timestamp())
        .map_err(|_error| ValidationError::InvalidWatermark(value.to_string()))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        records::{Audit, Record},
        uuids::{GuidFixed, ShopUuid},
    };

    use super::*;

    #[test]
    fn action_parses_case_insensitively() -> TestResult {
        assert_eq!("".parse::<DeltaAction>()?, DeltaAction::All);
        assert_eq!("NEW".parse::<DeltaAction>()?, DeltaAction::New);
        assert_eq!("remove".parse::<DeltaAction>()?, DeltaAction::Remove);
        assert!("upsert".parse::<DeltaAction>().is_err());

        Ok(())
    }

    #[test]
    fn action_selects_halves() {
        assert!(DeltaAction::All.includes_new() && DeltaAction::All.includes_removed());
        assert!(DeltaAction::New.includes_new() && !DeltaAction::New.includes_removed());
        assert!(!DeltaAction::Remove.includes_new() && DeltaAction::Remove.includes_removed());
    }

    #[test]
    fn parses_rfc3339_and_minute_precision() -> TestResult {
        let exact = parse_watermark("2024-05-01T10:15:30Z")?;
        let minute = parse_watermark(" 2024-05-01T10:15 ")?;

        assert_eq!(exact, "2024-05-01T10:15:30Z".parse::<Timestamp>()?);
        assert_eq!(minute, "2024-05-01T10:15:00Z".parse::<Timestamp>()?);

        Ok(())
    }

    #[test]
    fn rejects_garbage_watermarks() {
        assert_eq!(
            parse_watermark(""),
            Err(ValidationError::InvalidWatermark(String::new()))
        );
        assert!(parse_watermark("yesterday").is_err());
    }

    #[test]
    fn watermark_is_latest_observed_timestamp() -> TestResult {
        let shop = ShopUuid::new();
        let created: Timestamp = "2024-01-01T00:00:00Z".parse()?;
        let updated: Timestamp = "2024-01-03T00:00:00Z".parse()?;
        let deleted: Timestamp = "2024-01-02T00:00:00Z".parse()?;

        let mut audit = Audit::created(created, "alice");
        audit.updated_at = Some(updated);

        let feed = DeltaFeed::<String> {
            new: vec![Record {
                shop,
                guid: GuidFixed::new(),
                data: "a".to_string(),
                audit,
            }],
            removed: vec![DeleteActivityRecord {
                shop,
                guid: GuidFixed::new(),
                deleted_at: deleted,
                deleted_by: "bob".to_string(),
            }],
        };

        assert_eq!(feed.watermark(), Some(updated));
        assert_eq!(DeltaFeed::<String>::default().watermark(), None);

        Ok(())
    }
}

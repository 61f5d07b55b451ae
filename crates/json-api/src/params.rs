//! Query parameter parsing shared by list and delta endpoints.

use salvo::prelude::StatusError;
use serde_json::Value;

use shopsync::{
    delta::{DeltaAction, DeltaQuery, parse_watermark},
    query::{Filters, Page, Paging, SearchQuery, Step},
};

use crate::extensions::*;

/// `key:value,key:value` exact-match filters. Pairs without a key are ignored.
pub(crate) fn filters(value: Option<String>) -> Filters {
    let mut filters = Filters::new();

    for pair in value.as_deref().unwrap_or_default().split(',') {
        let Some((key, value)) = pair.split_once(':') else {
            continue;
        };

        let key = key.trim();

        if key.is_empty() {
            continue;
        }

        filters.insert(key.to_string(), Value::String(value.trim().to_string()));
    }

    filters
}

pub(crate) fn search(q: Option<String>, filter: Option<String>) -> SearchQuery {
    SearchQuery {
        q,
        filters: filters(filter),
    }
}

pub(crate) fn page(page: Option<u64>, limit: Option<u64>) -> Paging {
    Paging::Page(Page::new(page, limit))
}

pub(crate) fn step(offset: Option<u64>, limit: Option<u64>) -> Paging {
    Paging::Step(Step::new(offset, limit))
}

/// Delta request from raw `lastUpdate`, `action` and `filter` parameters.
pub(crate) fn delta(
    last_update: Option<String>,
    action: Option<String>,
    filter: Option<String>,
    paging: Paging,
) -> Result<DeltaQuery, StatusError> {
    let since = parse_watermark(last_update.as_deref().unwrap_or_default())
        .or_400("lastUpdate format invalid")?;

    let action = action
        .as_deref()
        .unwrap_or_default()
        .parse::<DeltaAction>()
        .or_400("action must be one of all, new, remove")?;

    Ok(DeltaQuery {
        since,
        action,
        filters: filters(filter),
        paging,
    })
}

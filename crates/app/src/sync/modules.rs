//! Module registry and the master-sync aggregate.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use futures::future::try_join_all;
use mockall::automock;
use rustc_hash::FxHashSet;
use serde_json::Value;

use shopsync::{delta::DeltaQuery, query::PageInfo, records::Entity, uuids::ShopUuid};

use crate::{
    store::{ActivityFinder, DocumentFinder, DocumentWriter},
    sync::{ModuleRecordsService, RecordsService, RecordsServiceError},
};

/// Delta feed of one module with its payload already encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDelta {
    pub feed: Value,
    pub page_info: PageInfo,
}

/// A module taking part in the master-sync aggregate.
#[automock]
#[async_trait]
pub trait ModuleFeed: Send + Sync {
    /// Module name, as used on topics and markers.
    fn module(&self) -> &'static str;

    async fn delta_json(
        &self,
        shop: ShopUuid,
        query: DeltaQuery,
    ) -> Result<ModuleDelta, RecordsServiceError>;
}

#[async_trait]
impl<T, S> ModuleFeed for ModuleRecordsService<T, S>
where
    T: Entity,
    S: DocumentWriter<T> + DocumentFinder<T> + ActivityFinder<T> + 'static,
{
    fn module(&self) -> &'static str {
        T::MODULE
    }

    async fn delta_json(
        &self,
        shop: ShopUuid,
        query: DeltaQuery,
    ) -> Result<ModuleDelta, RecordsServiceError> {
        let page = self.delta(shop, query).await?;

        Ok(ModuleDelta {
            feed: serde_json::to_value(&page.feed)?,
            page_info: page.page_info,
        })
    }
}

/// Which modules a master-sync request covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSelection {
    All,
    Only(FxHashSet<String>),
}

impl ModuleSelection {
    /// Parse a comma separated, case-insensitive module list. Empty or `all` selects everything.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let names: FxHashSet<String> = value
            .split(',')
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();

        if names.is_empty() || names.contains("all") {
            return Self::All;
        }

        Self::Only(names)
    }

    #[must_use]
    pub fn includes(&self, module: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(&module.to_lowercase()),
        }
    }
}

/// Every module's delta, keyed by lowercased module name.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterSyncFeed {
    pub modules: BTreeMap<String, Value>,

    /// Paging metadata of the module with the most matching rows.
    pub page_info: Option<PageInfo>,
}

#[derive(Clone, Default)]
pub struct ModuleRegistry {
    feeds: Vec<Arc<dyn ModuleFeed>>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.feeds.iter().map(|feed| feed.module()))
            .finish()
    }
}

impl ModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, feed: Arc<dyn ModuleFeed>) -> Self {
        self.feeds.push(feed);
        self
    }

    #[must_use]
    pub fn modules(&self) -> Vec<&'static str> {
        self.feeds.iter().map(|feed| feed.module()).collect()
    }

    /// Run the delta feed of every selected module with the same query.
    ///
    /// # Errors
    ///
    /// Returns the first module error.
    pub async fn delta(
        &self,
        shop: ShopUuid,
        selection: &ModuleSelection,
        query: &DeltaQuery,
    ) -> Result<MasterSyncFeed, RecordsServiceError> {
        let selected = self
            .feeds
            .iter()
            .filter(|feed| selection.includes(feed.module()));

        let results = try_join_all(selected.map(|feed| async move {
            let delta = feed.delta_json(shop, query.clone()).await?;

            Ok::<_, RecordsServiceError>((feed.module().to_lowercase(), delta))
        }))
        .await?;

        let page_info = results
            .iter()
            .map(|(_, delta)| delta.page_info)
            .max_by_key(PageInfo::total);

        Ok(MasterSyncFeed {
            modules: results
                .into_iter()
                .map(|(module, delta)| (module, delta.feed))
                .collect(),
            page_info,
        })
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use serde_json::json;
    use testresult::TestResult;

    use shopsync::{
        delta::DeltaAction,
        query::{Filters, Page, Pagination, Paging},
    };

    use super::*;

    fn feed(module: &'static str, total: u64) -> MockModuleFeed {
        let mut feed = MockModuleFeed::new();

        feed.expect_module().return_const(module);
        feed.expect_delta_json().returning(move |_, query| {
            Ok(ModuleDelta {
                feed: json!({ "new": [], "removed": [] }),
                page_info: query.paging.describe(total),
            })
        });

        feed
    }

    fn query() -> DeltaQuery {
        DeltaQuery {
            since: Timestamp::UNIX_EPOCH,
            action: DeltaAction::All,
            filters: Filters::default(),
            paging: Paging::Page(Page::default()),
        }
    }

    #[test]
    fn selection_is_case_insensitive_and_defaults_to_all() {
        assert_eq!(ModuleSelection::parse(""), ModuleSelection::All);
        assert_eq!(ModuleSelection::parse("member, ALL"), ModuleSelection::All);

        let selection = ModuleSelection::parse("SaleChannel, member");

        assert!(selection.includes("saleChannel"));
        assert!(selection.includes("member"));
        assert!(!selection.includes("shopPrinter"));
    }

    #[tokio::test]
    async fn aggregate_keys_by_module_and_pages_by_the_largest_total() -> TestResult {
        let registry = ModuleRegistry::new()
            .with(Arc::new(feed("saleChannel", 3)))
            .with(Arc::new(feed("member", 12)));

        let aggregate = registry
            .delta(ShopUuid::new(), &ModuleSelection::All, &query())
            .await?;

        assert_eq!(
            aggregate.modules.keys().collect::<Vec<_>>(),
            vec!["member", "salechannel"]
        );
        assert!(matches!(
            aggregate.page_info,
            Some(PageInfo::Page(Pagination { total: 12, .. }))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn unselected_modules_are_not_queried() -> TestResult {
        let mut skipped = MockModuleFeed::new();
        skipped.expect_module().return_const("member");
        skipped.expect_delta_json().never();

        let registry = ModuleRegistry::new()
            .with(Arc::new(feed("saleChannel", 1)))
            .with(Arc::new(skipped));

        let aggregate = registry
            .delta(
                ShopUuid::new(),
                &ModuleSelection::parse("salechannel"),
                &query(),
            )
            .await?;

        assert_eq!(aggregate.modules.len(), 1);

        Ok(())
    }
}

//! In-memory store doubles for service tests that do not need Postgres.

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use jiff::Timestamp;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shopsync::{
    query::{Filters, SearchQuery, Window},
    records::{Audit, DeleteActivityRecord, DocumentUpdate, Entity, NewDocument, Record},
    uuids::{GuidFixed, ShopUuid},
};

use crate::store::{ActivityFinder, DocumentFinder, DocumentWriter, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub code: String,
    pub name: String,
}

impl Entity for Channel {
    const MODULE: &'static str = "channel";
    const SEARCH_FIELDS: &'static [&'static str] = &["name"];

    fn natural_key(&self) -> &str {
        &self.code
    }
}

pub fn channel(code: &str) -> Channel {
    Channel {
        code: code.to_string(),
        name: format!("Channel {code}"),
    }
}

pub fn named(code: &str, name: &str) -> Channel {
    Channel {
        code: code.to_string(),
        name: name.to_string(),
    }
}

/// Vec-backed store with the same visibility rules as the Postgres one.
///
/// Failure hooks let tests reproduce concurrent writers and partial failures.
pub struct MemoryStore<T> {
    records: Mutex<Vec<Record<T>>>,
    failing_updates: Mutex<FxHashSet<String>>,
    vanishing_keys: Mutex<FxHashSet<String>>,
    racing_creates: Mutex<VecDeque<(ShopUuid, T)>>,
    create_many_calls: Mutex<usize>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            failing_updates: Mutex::new(FxHashSet::default()),
            vanishing_keys: Mutex::new(FxHashSet::default()),
            racing_creates: Mutex::new(VecDeque::new()),
            create_many_calls: Mutex::new(0),
        }
    }
}

impl<T: Entity> MemoryStore<T> {
    /// Seed a live record created at `at`.
    pub fn insert_at(&self, shop: ShopUuid, data: T, at: Timestamp) -> Record<T> {
        let record = Record {
            shop,
            guid: GuidFixed::new(),
            data,
            audit: Audit::created(at, "seed"),
        };

        self.records.lock().expect("records lock").push(record.clone());

        record
    }

    /// Soft-delete a seeded record at `at`.
    pub fn delete_at(&self, shop: ShopUuid, guid: GuidFixed<T>, at: Timestamp) {
        let mut records = self.records.lock().expect("records lock");

        if let Some(record) = records
            .iter_mut()
            .find(|record| record.shop == shop && record.guid == guid)
        {
            record.audit.deleted_at = Some(at);
            record.audit.deleted_by = Some("seed".to_string());
        }
    }

    /// Every record ever written, deleted ones included.
    pub fn all(&self) -> Vec<Record<T>> {
        self.records.lock().expect("records lock").clone()
    }

    /// Live records of `shop`.
    pub fn live(&self, shop: ShopUuid) -> Vec<Record<T>> {
        self.all()
            .into_iter()
            .filter(|record| record.shop == shop && record.audit.is_live())
            .collect()
    }

    /// Updates of `key` fail with a storage error.
    pub fn fail_updates_for(&self, key: &str) {
        self.failing_updates
            .lock()
            .expect("hook lock")
            .insert(key.to_string());
    }

    /// Single-key lookups of `key` see nothing, as if it was deleted after a batch lookup.
    pub fn vanish_on_lookup(&self, key: &str) {
        self.vanishing_keys
            .lock()
            .expect("hook lock")
            .insert(key.to_string());
    }

    /// A later batch insert finds `data` already written by another writer.
    ///
    /// Each batch insert consumes one queued race, in order.
    pub fn race_next_create(&self, shop: ShopUuid, data: T) {
        self.racing_creates
            .lock()
            .expect("hook lock")
            .push_back((shop, data));
    }

    pub fn create_many_calls(&self) -> usize {
        *self.create_many_calls.lock().expect("counter lock")
    }

    fn live_key_taken(records: &[Record<T>], shop: ShopUuid, key: &str) -> bool {
        records
            .iter()
            .any(|record| record.shop == shop && record.audit.is_live() && record.natural_key() == key)
    }

    fn to_record(shop: ShopUuid, document: NewDocument<T>) -> Record<T> {
        Record {
            shop,
            guid: document.guid,
            data: document.data,
            audit: Audit::created(document.created_at, document.created_by),
        }
    }
}

fn window<T: Clone>(rows: &[T], window: Window) -> Vec<T> {
    let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);

    rows.iter().skip(offset).take(limit).cloned().collect()
}

fn matches_filters<T: Entity>(data: &T, filters: &Filters) -> bool {
    let Ok(Value::Object(body)) = serde_json::to_value(data) else {
        return false;
    };

    filters
        .iter()
        .all(|(field, expected)| body.get(field) == Some(expected))
}

fn matches_text<T: Entity>(data: &T, query: &SearchQuery) -> bool {
    let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        return true;
    };

    let needle = q.to_lowercase();

    if data.natural_key().to_lowercase().contains(&needle) {
        return true;
    }

    let Ok(Value::Object(body)) = serde_json::to_value(data) else {
        return false;
    };

    T::SEARCH_FIELDS.iter().any(|field| {
        body.get(*field)
            .and_then(Value::as_str)
            .is_some_and(|value| value.to_lowercase().contains(&needle))
    })
}

#[async_trait]
impl<T: Entity> DocumentWriter<T> for MemoryStore<T> {
    async fn create(
        &self,
        shop: ShopUuid,
        document: NewDocument<T>,
    ) -> Result<Record<T>, StoreError> {
        let mut records = self.records.lock().expect("records lock");

        if Self::live_key_taken(&records, shop, document.data.natural_key()) {
            return Err(StoreError::DuplicateKey);
        }

        let record = Self::to_record(shop, document);
        records.push(record.clone());

        Ok(record)
    }

    async fn create_many(
        &self,
        shop: ShopUuid,
        documents: Vec<NewDocument<T>>,
    ) -> Result<Vec<Record<T>>, StoreError> {
        *self.create_many_calls.lock().expect("counter lock") += 1;

        let mut records = self.records.lock().expect("records lock");

        if let Some((racing_shop, data)) = self.racing_creates.lock().expect("hook lock").pop_front() {
            records.push(Record {
                shop: racing_shop,
                guid: GuidFixed::new(),
                data,
                audit: Audit::created(Timestamp::now(), "other-writer"),
            });
        }

        let mut batch_keys = FxHashSet::default();

        for document in &documents {
            let key = document.data.natural_key();

            if Self::live_key_taken(&records, shop, key) || !batch_keys.insert(key.to_string()) {
                return Err(StoreError::DuplicateKey);
            }
        }

        let created: Vec<Record<T>> = documents
            .into_iter()
            .map(|document| Self::to_record(shop, document))
            .collect();

        records.extend(created.iter().cloned());

        Ok(created)
    }

    async fn update(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<T>,
        update: DocumentUpdate<T>,
    ) -> Result<Record<T>, StoreError> {
        if self
            .failing_updates
            .lock()
            .expect("hook lock")
            .contains(update.data.natural_key())
        {
            return Err(StoreError::Sql(sqlx::Error::PoolTimedOut));
        }

        let mut records = self.records.lock().expect("records lock");

        let conflict = records.iter().any(|record| {
            record.shop == shop
                && record.guid != guid
                && record.audit.is_live()
                && record.natural_key() == update.data.natural_key()
        });

        if conflict {
            return Err(StoreError::DuplicateKey);
        }

        let record = records
            .iter_mut()
            .find(|record| record.shop == shop && record.guid == guid && record.audit.is_live())
            .ok_or(StoreError::NotFound)?;

        record.data = update.data;
        record.audit.updated_at = Some(update.updated_at);
        record.audit.updated_by = Some(update.updated_by);

        Ok(record.clone())
    }

    async fn soft_delete(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<T>,
        actor: &str,
        at: Timestamp,
    ) -> Result<Record<T>, StoreError> {
        let mut records = self.records.lock().expect("records lock");

        let record = records
            .iter_mut()
            .find(|record| record.shop == shop && record.guid == guid && record.audit.is_live())
            .ok_or(StoreError::NotFound)?;

        record.audit.deleted_at = Some(at);
        record.audit.deleted_by = Some(actor.to_string());

        Ok(record.clone())
    }

    async fn soft_delete_many(
        &self,
        shop: ShopUuid,
        guids: &[GuidFixed<T>],
        actor: &str,
        at: Timestamp,
    ) -> Result<Vec<Record<T>>, StoreError> {
        let mut records = self.records.lock().expect("records lock");
        let mut deleted = Vec::new();

        for record in records.iter_mut().filter(|record| {
            record.shop == shop && record.audit.is_live() && guids.contains(&record.guid)
        }) {
            record.audit.deleted_at = Some(at);
            record.audit.deleted_by = Some(actor.to_string());
            deleted.push(record.clone());
        }

        Ok(deleted)
    }
}

#[async_trait]
impl<T: Entity> DocumentFinder<T> for MemoryStore<T> {
    async fn find_by_guid(
        &self,
        shop: ShopUuid,
        guid: GuidFixed<T>,
    ) -> Result<Option<Record<T>>, StoreError> {
        Ok(self.live(shop).into_iter().find(|record| record.guid == guid))
    }

    async fn find_by_natural_key(
        &self,
        shop: ShopUuid,
        key: &str,
    ) -> Result<Option<Record<T>>, StoreError> {
        if self.vanishing_keys.lock().expect("hook lock").contains(key) {
            return Ok(None);
        }

        Ok(self
            .live(shop)
            .into_iter()
            .find(|record| record.natural_key() == key))
    }

    async fn find_by_natural_keys(
        &self,
        shop: ShopUuid,
        keys: &[String],
    ) -> Result<Vec<Record<T>>, StoreError> {
        Ok(self
            .live(shop)
            .into_iter()
            .filter(|record| keys.iter().any(|key| key == record.natural_key()))
            .collect())
    }

    async fn search(
        &self,
        shop: ShopUuid,
        query: &SearchQuery,
        page: Window,
    ) -> Result<(Vec<Record<T>>, u64), StoreError> {
        let mut rows: Vec<Record<T>> = self
            .live(shop)
            .into_iter()
            .filter(|record| matches_filters(&record.data, &query.filters))
            .filter(|record| matches_text(&record.data, query))
            .collect();

        rows.sort_by(|left, right| left.natural_key().cmp(right.natural_key()));

        Ok((window(&rows, page), rows.len() as u64))
    }
}

#[async_trait]
impl<T: Entity> ActivityFinder<T> for MemoryStore<T> {
    async fn find_activity_since(
        &self,
        shop: ShopUuid,
        since: Timestamp,
        filters: &Filters,
        page: Window,
    ) -> Result<(Vec<Record<T>>, u64), StoreError> {
        let mut rows: Vec<Record<T>> = self
            .live(shop)
            .into_iter()
            .filter(|record| {
                record.audit.created_at >= since
                    || record.audit.updated_at.is_some_and(|at| at >= since)
            })
            .filter(|record| matches_filters(&record.data, filters))
            .collect();

        rows.sort_by_key(|record| record.audit.last_activity());

        Ok((window(&rows, page), rows.len() as u64))
    }

    async fn find_deleted_since(
        &self,
        shop: ShopUuid,
        since: Timestamp,
        filters: &Filters,
        page: Window,
    ) -> Result<(Vec<DeleteActivityRecord<T>>, u64), StoreError> {
        let mut rows: Vec<DeleteActivityRecord<T>> = self
            .all()
            .into_iter()
            .filter(|record| record.shop == shop)
            .filter(|record| matches_filters(&record.data, filters))
            .filter_map(|record| {
                let deleted_at = record.audit.deleted_at.filter(|at| *at >= since)?;

                Some(DeleteActivityRecord {
                    shop: record.shop,
                    guid: record.guid,
                    deleted_at,
                    deleted_by: record.audit.deleted_by.unwrap_or_default(),
                })
            })
            .collect();

        rows.sort_by_key(|record| record.deleted_at);

        Ok((window(&rows, page), rows.len() as u64))
    }
}

//! Projection rows and the dirty-check.
//!
//! A projection row is the relational mirror of a record. Rows expose their
//! columns in a fixed order so that [`dirty_check`] can compare an incoming
//! row with the stored one field by field, skipping the identity columns.

use std::{cmp::Ordering, fmt::Debug};

use jiff::Timestamp;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::{
    records::{Entity, Record},
    uuids::{GuidFixed, ShopUuid},
};

/// A typed column value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// Non-null UUID.
    Uuid(Uuid),

    /// Nullable text.
    Text(Option<String>),

    /// Nullable 64-bit integer.
    Integer(Option<i64>),

    /// Nullable double precision float.
    Float(Option<f64>),

    /// Nullable boolean.
    Boolean(Option<bool>),

    /// Nullable instant.
    Timestamp(Option<Timestamp>),
}

impl ColumnValue {
    /// Value equality used by the dirty-check.
    ///
    /// Floats compare by total order so a stored `NaN` matches an incoming `NaN`.
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(Some(left)), Self::Float(Some(right))) => {
                left.total_cmp(right) == Ordering::Equal
            }
            _ => self == other,
        }
    }
}

/// A named column value.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: &'static str,

    /// Column value.
    pub value: ColumnValue,
}

impl Column {
    /// Build a column.
    pub fn new(name: &'static str, value: ColumnValue) -> Self {
        Self { name, value }
    }
}

/// Columns whose incoming value differs from the stored one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: SmallVec<[Column; 8]>,
}

impl ChangeSet {
    /// Whether no column changed.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changed columns.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Changed columns with their incoming values.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.changes.iter()
    }

    /// Names of the changed columns.
    pub fn names(&self) -> Vec<&'static str> {
        self.changes.iter().map(|column| column.name).collect()
    }
}

/// Relational mirror of an [`Entity`].
pub trait ProjectionRow: Clone + Debug + Send + Sync + 'static {
    /// Entity this row mirrors.
    type Source: Entity;

    /// Table holding the rows.
    const TABLE: &'static str;

    /// Key and tenant columns, never compared or updated.
    const IDENTITY_COLUMNS: &'static [&'static str] = &["shop_id", "guid_fixed"];

    /// Pure mapping from a record snapshot.
    fn project(record: &Record<Self::Source>) -> Self;

    /// Owning shop.
    fn shop(&self) -> ShopUuid;

    /// Identifier of the mirrored record.
    fn guid(&self) -> GuidFixed<Self::Source>;

    /// Snapshot version the row was built from.
    fn version(&self) -> Timestamp;

    /// Every column, identity columns included, in a stable order.
    fn columns(&self) -> Vec<Column>;
}

/// Compare `incoming` with `stored` column by column.
///
/// Identity columns are skipped. The returned set holds the incoming value of
/// every other column that differs; an empty set means no write is needed.
pub fn dirty_check<R: ProjectionRow>(incoming: &R, stored: &R) -> ChangeSet {
    let stored = stored.columns();

    let changes = incoming
        .columns()
        .into_iter()
        .filter(|column| !R::IDENTITY_COLUMNS.contains(&column.name))
        .filter(|column| {
            stored
                .iter()
                .find(|existing| existing.name == column.name)
                .is_none_or(|existing| !existing.value.same_as(&column.value))
        })
        .collect();

    ChangeSet { changes }
}

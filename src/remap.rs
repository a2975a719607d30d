//! RemapTable: the old→new specialization used while cloning a graph.

use crate::addr::Identity;
use crate::config::{ConfigError, TableConfig};
use crate::ptr_table::{PtrTable, TableStats};
use core::fmt;

/// One recorded correspondence between an original and its copy.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Remap<T> {
    pub oldval: T,
    pub newval: T,
}

/// Records where each original object's copy lives, keyed by the original's
/// identity.
///
/// A cloning pass stores `(old, new)` for every object it copies, then looks
/// up `old` while rewriting references so shared and cyclic structure is
/// reproduced instead of copied twice.
pub struct RemapTable<T> {
    table: PtrTable<T, T>,
}

impl<T> RemapTable<T>
where
    T: Identity,
{
    pub fn new() -> Self {
        Self {
            table: PtrTable::new(),
        }
    }

    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            table: PtrTable::with_config(config)?,
        })
    }

    /// The copy recorded for `oldval`, if it has been cloned already.
    pub fn fetch(&self, oldval: T) -> Option<T> {
        self.table.fetch(oldval).copied()
    }

    /// Record `newval` as the copy of `oldval`, returning any earlier copy.
    pub fn store(&mut self, oldval: T, newval: T) -> Option<T> {
        self.table.store(oldval, newval)
    }

    pub fn contains(&self, oldval: T) -> bool {
        self.table.contains_key(oldval)
    }

    pub fn grow(&mut self) {
        self.table.grow()
    }

    pub fn clear(&mut self) {
        self.table.clear()
    }

    /// Clear and release the table in `slot`; a `None` slot is left alone.
    pub fn destroy(slot: &mut Option<Self>) {
        if let Some(remap) = slot.take() {
            PtrTable::destroy(&mut Some(remap.table));
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn stats(&self) -> TableStats {
        self.table.stats()
    }

    /// Every recorded correspondence, each exactly once.
    pub fn iter(&self) -> impl Iterator<Item = Remap<T>> + '_ {
        self.table.iter().map(|(&oldval, &newval)| Remap { oldval, newval })
    }

    /// Fold another pass's correspondences into this one.
    pub fn absorb(&mut self, other: RemapTable<T>) {
        self.table.absorb(other.table)
    }

    /// Borrow the underlying key/value table.
    pub fn as_table(&self) -> &PtrTable<T, T> {
        &self.table
    }
}

impl<T> Default for RemapTable<T>
where
    T: Identity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<PtrTable<T, T>> for RemapTable<T>
where
    T: Identity,
{
    fn from(table: PtrTable<T, T>) -> Self {
        Self { table }
    }
}

impl<T> Extend<Remap<T>> for RemapTable<T>
where
    T: Identity,
{
    fn extend<I: IntoIterator<Item = Remap<T>>>(&mut self, iter: I) {
        for r in iter {
            self.store(r.oldval, r.newval);
        }
    }
}

impl<T> fmt::Debug for RemapTable<T>
where
    T: Identity,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemapTable")
            .field("items", &self.len())
            .field("buckets", &self.capacity())
            .finish()
    }
}

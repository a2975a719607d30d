//! PtrTable: public identity table over the chained structural layer.

use crate::addr::Identity;
use crate::chain_table::{self, ChainTable, Probe};
use crate::config::{ConfigError, GrowPolicy, TableConfig};
use core::fmt;
use core::mem;

/// A table mapping keys, compared by address identity, to values.
///
/// Buckets are selected from the key address with its alignment bits
/// removed. New keys are linked at the head of their bucket chain. When the
/// item count exceeds the bucket mask the bucket array doubles, subject to
/// the table's [`GrowPolicy`].
///
/// ```
/// use ptr_table::{Addr, PtrTable};
///
/// let mut t: PtrTable<Addr, Addr> = PtrTable::new();
/// let old = Addr::new(0x1000);
/// t.store(old, Addr::new(0x8000));
/// assert_eq!(t.fetch(old), Some(&Addr::new(0x8000)));
/// assert_eq!(t.fetch(Addr::new(0x1008)), None);
/// ```
pub struct PtrTable<K, V> {
    chains: ChainTable<K, V>,
    policy: GrowPolicy,
}

/// Snapshot of a table's occupancy.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TableStats {
    pub buckets: usize,
    pub items: usize,
    pub occupied_buckets: usize,
    pub longest_chain: usize,
}

impl TableStats {
    /// Items per bucket.
    pub fn load_factor(&self) -> f64 {
        self.items as f64 / self.buckets as f64
    }
}

impl<K, V> PtrTable<K, V>
where
    K: Identity,
{
    /// An empty table with 512 buckets that grows on collisions.
    pub fn new() -> Self {
        Self::from_valid_config(TableConfig::new())
    }

    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: TableConfig) -> Self {
        Self {
            chains: ChainTable::with_buckets(config.initial_buckets()),
            policy: config.policy(),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.len() == 0
    }

    /// Number of buckets; always a power of two.
    pub fn capacity(&self) -> usize {
        self.chains.buckets()
    }

    /// Bucket mask, `capacity() - 1`.
    pub fn mask(&self) -> usize {
        self.chains.mask()
    }

    pub fn grow_policy(&self) -> GrowPolicy {
        self.policy
    }

    /// Value stored for the entry whose key has `key`'s address.
    pub fn fetch(&self, key: K) -> Option<&V> {
        let h = self.chains.find(&key)?;
        self.chains.handle_value(h)
    }

    pub fn fetch_mut(&mut self, key: K) -> Option<&mut V> {
        let h = self.chains.find(&key)?;
        self.chains.handle_value_mut(h)
    }

    pub fn contains_key(&self, key: K) -> bool {
        self.chains.find(&key).is_some()
    }

    /// Map `key` to `value`.
    ///
    /// An existing entry for the same address is overwritten in place and
    /// its previous value returned; the item count and bucket array are left
    /// alone. Otherwise a new entry is linked at the head of its bucket chain
    /// and the grow policy is consulted.
    pub fn store(&mut self, key: K, value: V) -> Option<V> {
        match self.chains.probe(&key) {
            Probe::Found(h) => self
                .chains
                .handle_value_mut(h)
                .map(|slot| mem::replace(slot, value)),
            Probe::Vacant(slot) => {
                self.chains.link_front(slot, key, value);
                if self.needs_grow(slot.occupied()) {
                    self.grow();
                }
                None
            }
        }
    }

    fn needs_grow(&self, bucket_was_occupied: bool) -> bool {
        let over = self.chains.len() > self.chains.mask();
        match self.policy {
            GrowPolicy::OnCollision => bucket_was_occupied && over,
            GrowPolicy::OnInsert => over,
        }
    }

    /// Double the bucket array, splitting each chain in place on the newly
    /// significant hash bit.
    pub fn grow(&mut self) {
        let from = self.chains.buckets();
        self.chains.split_grow();
        log::debug!(
            "ptr table grew from {} to {} buckets ({} items)",
            from,
            self.chains.buckets(),
            self.chains.len()
        );
    }

    /// Drop every entry. The bucket count is kept.
    pub fn clear(&mut self) {
        if self.is_empty() {
            return;
        }
        log::trace!(
            "clearing ptr table: {} items in {} buckets",
            self.chains.len(),
            self.chains.buckets()
        );
        self.chains.clear();
    }

    /// Clear and release the table held in `slot`, leaving `None`.
    ///
    /// An empty slot is left untouched, so cleanup paths may call this
    /// unconditionally.
    pub fn destroy(slot: &mut Option<Self>) {
        if let Some(mut table) = slot.take() {
            log::trace!("destroying ptr table with {} items", table.len());
            table.clear();
        }
    }

    /// Move every entry of `other` into this table. Where both hold the same
    /// address, the value from `other` wins.
    pub fn absorb(&mut self, other: PtrTable<K, V>) {
        for (k, v) in other.chains.into_entries() {
            self.store(k, v);
        }
    }

    /// Entries in bucket order. Each live entry is visited exactly once.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.chains.iter(),
        }
    }

    /// Mutable access to every value, in unspecified order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.chains.iter_mut().map(|(_, v)| v)
    }

    pub fn stats(&self) -> TableStats {
        let mut occupied_buckets = 0;
        let mut longest_chain = 0;
        for b in 0..self.chains.buckets() {
            let n = self.chains.chain_len(b);
            if n > 0 {
                occupied_buckets += 1;
            }
            longest_chain = longest_chain.max(n);
        }
        TableStats {
            buckets: self.chains.buckets(),
            items: self.chains.len(),
            occupied_buckets,
            longest_chain,
        }
    }

    #[cfg(test)]
    pub(crate) fn chains(&self) -> &ChainTable<K, V> {
        &self.chains
    }
}

impl<K, V> Default for PtrTable<K, V>
where
    K: Identity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Extend<(K, V)> for PtrTable<K, V>
where
    K: Identity,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.store(k, v);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for PtrTable<K, V>
where
    K: Identity,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut t = PtrTable::new();
        t.extend(iter);
        t
    }
}

impl<K, V> fmt::Debug for PtrTable<K, V>
where
    K: Identity + fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over a `PtrTable` in bucket/chain order.
pub struct Iter<'a, K, V> {
    inner: chain_table::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> IntoIterator for &'a PtrTable<K, V>
where
    K: Identity,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

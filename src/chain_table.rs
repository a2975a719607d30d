//! ChainTable: structural layer with bucket chains over slotmap storage and a
//! debug reentrancy guard.
//!
//! Buckets hold the head of a singly-linked chain. Nodes live in a `SlotMap`
//! and link to each other by slot key, so relinking during grow moves keys
//! around without touching or reallocating the nodes themselves.

use crate::addr::{identity_hash, Identity};
use crate::reentrancy::DebugReentrancy;
use slotmap::{DefaultKey, SlotMap};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Handle(DefaultKey);

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    addr: usize,
    hash: usize,
    next: Option<DefaultKey>,
}

/// Result of walking the chain a key hashes to.
#[derive(Debug)]
pub(crate) enum Probe {
    Found(Handle),
    Vacant(Vacancy),
}

/// Where a missing key would be linked, and whether that chain was occupied.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Vacancy {
    bucket: usize,
    addr: usize,
    hash: usize,
    occupied: bool,
}

impl Vacancy {
    pub(crate) fn occupied(&self) -> bool {
        self.occupied
    }
}

pub(crate) struct ChainTable<K, V> {
    heads: Vec<Option<DefaultKey>>,
    mask: usize,
    nodes: SlotMap<DefaultKey, Node<K, V>>,
    reentrancy: DebugReentrancy,
}

impl<K, V> ChainTable<K, V>
where
    K: Identity,
{
    /// `buckets` must be a non-zero power of two.
    pub(crate) fn with_buckets(buckets: usize) -> Self {
        debug_assert!(buckets.is_power_of_two());
        Self {
            heads: vec![None; buckets],
            mask: buckets - 1,
            nodes: SlotMap::with_key(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn mask(&self) -> usize {
        self.mask
    }

    pub(crate) fn buckets(&self) -> usize {
        self.heads.len()
    }

    pub(crate) fn probe(&self, key: &K) -> Probe {
        let _g = self.reentrancy.enter();
        let addr = key.addr();
        let hash = identity_hash(addr);
        let bucket = hash & self.mask;
        let mut occupied = false;
        let mut cur = self.heads[bucket];
        while let Some(k) = cur {
            let node = &self.nodes[k];
            if node.addr == addr {
                return Probe::Found(Handle(k));
            }
            occupied = true;
            cur = node.next;
        }
        Probe::Vacant(Vacancy {
            bucket,
            addr,
            hash,
            occupied,
        })
    }

    pub(crate) fn find(&self, key: &K) -> Option<Handle> {
        match self.probe(key) {
            Probe::Found(h) => Some(h),
            Probe::Vacant(_) => None,
        }
    }

    /// Link a new node at the head of the chain described by `slot`.
    ///
    /// `slot` must come from a `probe` with no mutation in between.
    pub(crate) fn link_front(&mut self, slot: Vacancy, key: K, value: V) -> Handle {
        let _g = self.reentrancy.enter();
        let next = self.heads[slot.bucket];
        let k = self.nodes.insert(Node {
            key,
            value,
            addr: slot.addr,
            hash: slot.hash,
            next,
        });
        self.heads[slot.bucket] = Some(k);
        Handle(k)
    }

    /// Double the bucket array and split every chain on the new mask bit.
    ///
    /// Entry `e` in old bucket `i` stays in `i` when `e.hash & old_len == 0`
    /// and moves to `i + old_len` otherwise. Moved entries are prepended, so
    /// the moved sub-chain comes out reversed; the staying sub-chain keeps
    /// its order.
    pub(crate) fn split_grow(&mut self) {
        let _g = self.reentrancy.enter();
        let old_len = self.heads.len();
        let new_len = old_len
            .checked_mul(2)
            .expect("bucket count overflow while growing ptr table");
        self.heads.resize(new_len, None);
        self.mask = new_len - 1;

        for i in 0..old_len {
            let mut prev: Option<DefaultKey> = None;
            let mut cur = self.heads[i];
            while let Some(k) = cur {
                let node = &self.nodes[k];
                let next = node.next;
                if node.hash & old_len != 0 {
                    match prev {
                        Some(p) => self.nodes[p].next = next,
                        None => self.heads[i] = next,
                    }
                    self.nodes[k].next = self.heads[i + old_len];
                    self.heads[i + old_len] = Some(k);
                } else {
                    prev = Some(k);
                }
                cur = next;
            }
        }
    }

    /// Drop every node and empty every bucket. The bucket count is kept.
    pub(crate) fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.heads.fill(None);
        self.nodes.clear();
    }

    #[cfg(test)]
    pub(crate) fn handle_key(&self, h: Handle) -> Option<&K> {
        self.nodes.get(h.0).map(|n| &n.key)
    }

    pub(crate) fn handle_value(&self, h: Handle) -> Option<&V> {
        self.nodes.get(h.0).map(|n| &n.value)
    }

    pub(crate) fn handle_value_mut(&mut self, h: Handle) -> Option<&mut V> {
        self.nodes.get_mut(h.0).map(|n| &mut n.value)
    }

    pub(crate) fn chain_len(&self, bucket: usize) -> usize {
        let mut n = 0;
        let mut cur = self.heads[bucket];
        while let Some(k) = cur {
            n += 1;
            cur = self.nodes[k].next;
        }
        n
    }

    /// Entries in bucket order, each chain from its head.
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            table: self,
            bucket: 0,
            cur: None,
        }
    }

    /// Entries in storage order.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.nodes.values_mut().map(|n| (&n.key, &mut n.value))
    }

    /// Consume the table, yielding owned entries in storage order.
    pub(crate) fn into_entries(self) -> impl Iterator<Item = (K, V)> {
        self.nodes.into_iter().map(|(_, n)| (n.key, n.value))
    }

    /// Panics unless the bucket count is a power of two, every node sits on
    /// the chain its hash selects, and every node is reachable exactly once.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert!(self.heads.len().is_power_of_two());
        assert_eq!(self.mask, self.heads.len() - 1);
        let mut reachable = 0;
        for (i, head) in self.heads.iter().enumerate() {
            let mut cur = *head;
            while let Some(k) = cur {
                let node = &self.nodes[k];
                assert_eq!(node.hash & self.mask, i, "node linked into wrong bucket");
                assert_eq!(node.hash, identity_hash(node.addr));
                reachable += 1;
                assert!(reachable <= self.nodes.len(), "chain cycle detected");
                cur = node.next;
            }
        }
        assert_eq!(reachable, self.nodes.len());
    }

    #[cfg(test)]
    pub(crate) fn chain_addrs(&self, bucket: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut cur = self.heads[bucket];
        while let Some(k) = cur {
            out.push(self.nodes[k].addr);
            cur = self.nodes[k].next;
        }
        out
    }
}

/// Iterator over a `ChainTable` in bucket/chain order.
pub(crate) struct Iter<'a, K, V> {
    table: &'a ChainTable<K, V>,
    bucket: usize,
    cur: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.cur {
                let node = &self.table.nodes[k];
                self.cur = node.next;
                return Some((&node.key, &node.value));
            }
            if self.bucket >= self.table.heads.len() {
                return None;
            }
            self.cur = self.table.heads[self.bucket];
            self.bucket += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.table.nodes.len()))
    }
}

#![cfg(test)]

// Property tests for PtrTable kept inside the crate so they can check the
// structural invariant of the chain layer after every step.

use crate::addr::{identity_hash, Addr, ALIGN_SHIFT};
use crate::config::{GrowPolicy, TableConfig};
use crate::ptr_table::PtrTable;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

#[derive(Clone, Debug)]
enum Op {
    Store(usize, u32),
    Fetch(usize),
    Grow,
    Clear,
    Iterate,
}

// Keys are drawn from a pool of slot numbers. `spread` scales the slot into
// an address: spread 1 gives dense aligned addresses, large spreads pile keys
// into few buckets.
fn addr_of(slot: usize, spread: usize) -> Addr {
    Addr::new((slot * spread) << ALIGN_SHIFT)
}

fn arb_ops(pool: usize) -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        8 => (0..pool, any::<u32>()).prop_map(|(k, v)| Op::Store(k, v)),
        4 => (0..pool).prop_map(Op::Fetch),
        1 => Just(Op::Grow),
        1 => Just(Op::Clear),
        1 => Just(Op::Iterate),
    ];
    proptest::collection::vec(op, 1..200)
}

fn arb_policy() -> impl Strategy<Value = GrowPolicy> {
    prop_oneof![Just(GrowPolicy::OnCollision), Just(GrowPolicy::OnInsert)]
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `fetch` agrees with the model for every key, across grows.
// - Overwrites leave `len` unchanged; `len` equals the model's size.
// - Bucket count stays a power of two, never shrinks (not even on clear),
//   and every entry sits in the bucket `hash & mask` selects.
// - `iter` yields each live entry exactly once.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(
        buckets_log2 in 0u32..6,
        spread in prop_oneof![Just(1usize), Just(3), Just(64), Just(1024)],
        policy in arb_policy(),
        ops in arb_ops(96),
    ) {
        let cfg = TableConfig::new().buckets(1 << buckets_log2).grow_policy(policy);
        let mut sut: PtrTable<Addr, u32> = PtrTable::with_config(cfg).unwrap();
        let mut model: HashMap<Addr, u32> = HashMap::new();
        let mut last_capacity = sut.capacity();

        for op in ops {
            match op {
                Op::Store(k, v) => {
                    let key = addr_of(k, spread);
                    let prev = sut.store(key, v);
                    prop_assert_eq!(prev, model.insert(key, v));
                }
                Op::Fetch(k) => {
                    let key = addr_of(k, spread);
                    prop_assert_eq!(sut.fetch(key), model.get(&key));
                    prop_assert_eq!(sut.contains_key(key), model.contains_key(&key));
                }
                Op::Grow => {
                    let before = sut.capacity();
                    sut.grow();
                    prop_assert_eq!(sut.capacity(), before * 2);
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
                Op::Iterate => {
                    let seen: Vec<Addr> = sut.iter().map(|(k, _)| *k).collect();
                    let unique: BTreeSet<Addr> = seen.iter().copied().collect();
                    prop_assert_eq!(seen.len(), unique.len());
                    let expected: BTreeSet<Addr> = model.keys().copied().collect();
                    prop_assert_eq!(unique, expected);
                    for (k, v) in sut.iter() {
                        prop_assert_eq!(Some(v), model.get(k));
                    }
                }
            }

            sut.chains().assert_invariants();
            prop_assert!(sut.capacity() >= last_capacity, "table never shrinks");
            last_capacity = sut.capacity();
            prop_assert_eq!(sut.mask() + 1, sut.capacity());
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
        }

        for (k, v) in &model {
            prop_assert_eq!(sut.fetch(*k), Some(v));
        }
    }
}

// Property: the grow trigger follows the configured policy exactly.
// - OnInsert: after every store, `len <= mask`.
// - OnCollision: a grow happens on a store iff the key was new, its bucket
//   already held an entry, and the count then exceeded the mask.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_grow_trigger(
        keys in proptest::collection::vec(0usize..4096, 1..400),
        policy in arb_policy(),
    ) {
        let cfg = TableConfig::new().buckets(8).grow_policy(policy);
        let mut sut: PtrTable<Addr, usize> = PtrTable::with_config(cfg).unwrap();

        for (i, k) in keys.into_iter().enumerate() {
            let key = addr_of(k, 1);
            let was_new = !sut.contains_key(key);
            let bucket = identity_hash(key.get()) & sut.mask();
            let occupied = sut.chains().chain_len(bucket) > 0;
            let before = sut.capacity();
            sut.store(key, i);
            let grew = sut.capacity() != before;

            match policy {
                GrowPolicy::OnInsert => prop_assert!(sut.len() <= sut.mask()),
                GrowPolicy::OnCollision => {
                    let mask_before = before - 1;
                    let expect = was_new && occupied && sut.len() > mask_before;
                    prop_assert_eq!(grew, expect);
                }
            }
            prop_assert_eq!(sut.fetch(key), Some(&i));
        }
        sut.chains().assert_invariants();
    }
}

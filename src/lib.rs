//! ptr-table: a single-threaded table keyed by address identity, built to
//! track old-address → new-address correspondences while an object graph is
//! deep-copied.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: map an address to a value by identity (pointer equality), with
//!   O(1) average fetch/store, growing the bucket array as it fills without
//!   rehashing from scratch.
//! - Layers:
//!   - ChainTable<K, V>: structural layer. A power-of-two array of bucket
//!     heads, each the start of a singly-linked chain; nodes live in a
//!     `SlotMap` and link by slot key. Includes a debug-only reentrancy
//!     guard.
//!   - PtrTable<K, V>: public key → value table: construct, fetch, store,
//!     grow, clear, destroy.
//!   - RemapTable<T>: the old → new specialization (`oldval`/`newval`) a
//!     cloning pass uses.
//!
//! Hashing
//! - Keys implement `Identity` and report an address; the table never
//!   dereferences it. The hash is the address shifted right by the
//!   allocation alignment (3 bits on 64-bit pointer targets, 2 otherwise),
//!   masked by `capacity - 1`. This is only a good hash for aligned
//!   allocation addresses.
//! - Each node stores its hash at insertion; grow never recomputes it.
//!
//! Store and grow
//! - A store for an address already present overwrites the value in place
//!   and returns the old one; nothing else changes.
//! - A new key is prepended to its chain. With the default
//!   `GrowPolicy::OnCollision`, the table doubles only if that chain was
//!   non-empty and the item count now exceeds the mask; stores into empty
//!   buckets defer growth to the next collision. `GrowPolicy::OnInsert`
//!   checks the count after every new key.
//! - Grow doubles the bucket array and splits each old chain `i` on the one
//!   new mask bit: entries with the bit clear stay in `i`, the rest are
//!   relinked onto `i + old_len`. Nodes are never reallocated.
//!
//! Constraints
//! - Single-threaded: the guard's `Cell` makes tables `!Sync`. A table is
//!   `Send` when its keys and values are, so workers may each own one and
//!   merge with `absorb`.
//! - No shrinking; `clear` keeps the bucket count.
//! - No single-entry removal: entries end with `clear`/`destroy`/drop.
//! - Allocation failure aborts through the global allocator.
//!
//! Reentrancy policy
//! - The structural layer enters its guard at the start of probe, link,
//!   split and clear. User code runs inside those sections only through
//!   `Identity::addr` on the query key and `Drop` of values on clear; in
//!   debug builds, reaching back into the same table from there panics.

mod addr;
mod chain_table;
pub mod config;
mod ptr_table;
mod ptr_table_proptest;
mod reentrancy;
mod remap;

// Public surface
pub use addr::{identity_hash, Addr, Identity, ALIGN_SHIFT};
pub use config::{ConfigError, GrowPolicy, TableConfig, DEFAULT_BUCKETS};
pub use ptr_table::{Iter, PtrTable, TableStats};
pub use remap::{Remap, RemapTable};

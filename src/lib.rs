//! spellmap: a separate-chaining string map, a growable array, and a
//! frequency-weighted spelling ranker built from the two.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep each layer small enough to reason about on its own.
//! - Layers:
//!   - DynamicArray<T>: contiguous sequence with positional insert/remove,
//!     linear/binary search and in-place sort. Capacity doubles from a
//!     floor of four.
//!   - ChainedTable<V, S>: string-keyed map with a fixed bucket array and
//!     singly linked chains. Entries live in a generational slot arena;
//!     buckets and `next` links store arena keys, so unlinking is index
//!     relinking and stale handles never resolve.
//!   - Ranker: scores every corpus word against a query by edit distance
//!     and keeps a bounded leaderboard (a DynamicArray) with an optional
//!     early stop.
//!
//! Constraints
//! - Single-threaded: cleanup callbacks are boxed `FnMut` closures, which
//!   keeps both containers `!Send`/`!Sync`.
//! - No rehashing: the bucket count chosen at construction is final.
//! - Keys are compared byte-for-byte, case-sensitively.
//!
//! Cleanup callbacks
//! - Both containers accept an optional callback that takes ownership of
//!   every value they let go of: superseded on overwrite, removed, or still
//!   present at `clear`/drop. `take` hands a value back to the caller
//!   instead and skips the callback.
//!
//! Traversal
//! - ChainedTable visits buckets in index order and each chain head to
//!   tail; new keys are appended at the tail. Visitors receive shared or
//!   exclusive element borrows only, so they cannot restructure the
//!   container mid-traversal.
//!
//! Ranking state
//! - Visit counters, the early-stop flag and the leaderboard live in a
//!   per-query scan value. Leaderboards borrow words from the corpus table
//!   and cannot outlive it.
//!
//! Notes and non-goals
//! - No persistence, no Unicode-aware tokenization (ASCII folding only).

pub mod chained_table;
mod chained_table_proptest;
pub mod corpus;
pub mod distance;
pub mod djb2;
pub mod dynamic_array;
pub mod ranking;

/// Callback that receives ownership of values a container releases.
pub type Cleanup<T> = Box<dyn FnMut(T)>;

// Public surface
pub use chained_table::{ChainedTable, Handle, TableError, DEFAULT_BUCKETS};
pub use corpus::CorpusError;
pub use distance::{bounded_edit_distance, edit_distance};
pub use djb2::Djb2State;
pub use dynamic_array::{ArrayError, DynamicArray, SearchOutcome};
pub use ranking::{Candidate, Correction, Frequency, Leaderboard, Ranker, RankerConfig};

//! An indexed ordered set for Rust.
//!
//! This crate provides [`OSTreapSet`], an ordered set of unique keys that
//! supports the usual `BTreeSet`-style operations *plus* O(log n) positional
//! (order-statistic) queries:
//!
//! - [`get_by_rank`](OSTreapSet::get_by_rank) - Get the element at a given sorted position
//! - [`rank_of`](OSTreapSet::rank_of) - Get the sorted position of an element
//! - Indexing by [`Rank`] - e.g., `set[Rank(0)]` for the smallest element
//!
//! # Example
//!
//! ```
//! use ostreap::{OSTreapSet, Rank};
//!
//! let mut points = OSTreapSet::new();
//! points.insert(300);
//! points.insert(100);
//! points.insert(200);
//!
//! // Standard ordered-set operations work as expected
//! assert!(points.contains(&200));
//! assert_eq!(points.len(), 3);
//!
//! // Order-statistic operations (O(log n))
//! assert_eq!(points.get_by_rank(1), Some(&200));
//! assert_eq!(points.rank_of(&300), Some(2));
//! assert_eq!(points[Rank(0)], 100);
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **O(log n) rank operations** - Positional access and rank lookup via subtree
//!   size annotations, without full traversal
//! - **Stable cursors** - Every element keeps its arena slot for its whole
//!   lifetime, so [cursors](OSTreapSet::lower_bound) and live iterators
//!   survive unrelated inserts and removals
//! - **Pluggable randomness** - Balancing priorities come from a caller-supplied
//!   [`PriorityRng`]; the default [`XorShiftRng`] is deterministic, so tree shapes
//!   are reproducible
//!
//! # Implementation
//!
//! The set is a treap: a binary search tree on keys that is simultaneously a
//! max-heap on per-node random priorities, which keeps the expected height
//! logarithmic regardless of insertion order. Each node additionally tracks the
//! size of its subtree, enabling rank queries, and a parent back-link, enabling
//! cheap in-order navigation. Nodes live in a slot arena and are addressed by
//! stable handles; restructuring relinks nodes but never moves one to another
//! slot.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod order_statistic;
mod raw;
mod rng;

pub mod model;
pub mod ostreap_set;

pub use order_statistic::Rank;
pub use ostreap_set::OSTreapSet;
pub use rng::{PriorityRng, XorShiftRng};

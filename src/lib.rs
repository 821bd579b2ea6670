//! # fingerseq
//!
//! Persistent (immutable) sequences backed by finger trees.
//!
//! ## Overview
//!
//! This library provides a general-purpose persistent sequence with
//! amortized O(1) access at both ends and logarithmic random access,
//! split, and concatenation, in two flavors:
//!
//! - [`persistent::PersistentSeq`]: the strict finger tree — every
//!   subtree is built eagerly and size annotations are always valid.
//! - [`persistent::LazySeq`]: a structurally identical sequence whose
//!   spine references are deferred, memoized computation cells — work is
//!   paid only when a consuming operation descends through it.
//!
//! All operations return new values; previously returned sequences are
//! never modified. Unaffected subtrees are shared by reference, which is
//! what makes `split_at` and `concat` cheap.
//!
//! ## Feature Flags
//!
//! - `arc`: use `Arc` instead of `Rc` for structural sharing, making
//!   `PersistentSeq` safe to share across threads
//! - `serde`: `Serialize`/`Deserialize` implementations for both
//!   sequence types
//!
//! ## Example
//!
//! ```rust
//! use fingerseq::prelude::*;
//!
//! let seq: PersistentSeq<i32> = (0..100).collect();
//! let (left, right) = seq.split_at(40);
//!
//! assert_eq!(left.len(), 40);
//! assert_eq!(right.front(), Some(&40));
//! assert_eq!(left.concat(&right), seq);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Note: Disabling redundant_closure_for_method_calls due to clippy 0.1.92 panic bug
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types.
///
/// # Usage
///
/// ```rust
/// use fingerseq::prelude::*;
/// ```
pub mod prelude {
    pub use crate::control::*;
    pub use crate::persistent::*;
}

pub mod control;

pub mod persistent;

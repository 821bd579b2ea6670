//! Persistent (immutable) sequences.
//!
//! This module provides two sequence types built on the same finger-tree
//! structure:
//!
//! - [`PersistentSeq`]: strict finger-tree sequence
//! - [`LazySeq`]: finger-tree sequence with a deferred, memoized spine
//!
//! # Structural Sharing
//!
//! Every operation returns a new sequence; the original remains valid and
//! unchanged. Subtrees that are not touched by an operation are shared by
//! reference, never copied, which keeps `cons`/`snoc` amortized O(1) and
//! `split_at`/`concat` logarithmic.
//!
//! # Examples
//!
//! ## `PersistentSeq`
//!
//! ```rust
//! use fingerseq::persistent::PersistentSeq;
//!
//! let seq = PersistentSeq::new().snoc(1).snoc(2).snoc(3);
//! assert_eq!(seq.get(0), Some(&1));
//!
//! // Structural sharing: the original sequence is preserved
//! let extended = seq.snoc(4);
//! assert_eq!(seq.len(), 3);      // Original unchanged
//! assert_eq!(extended.len(), 4); // New sequence
//! ```
//!
//! ## `LazySeq`
//!
//! ```rust
//! use fingerseq::persistent::LazySeq;
//!
//! let first: LazySeq<i32> = (0..100).collect();
//! let second: LazySeq<i32> = (100..200).collect();
//!
//! // The inner tree of the concatenation is a suspended cell; nothing
//! // below the top level is built until an operation descends into it.
//! let joined = first.concat(&second);
//! assert_eq!(joined.len(), 200);       // Never forces
//! assert_eq!(joined.get(150), Some(150)); // Forces only the lookup path
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod lazy_seq;
mod seq;

pub use lazy_seq::LazySeq;
pub use lazy_seq::LazySeqIntoIterator;
pub use seq::PersistentSeq;
pub use seq::PersistentSeqIntoIterator;
pub use seq::PersistentSeqIterator;

// =============================================================================
// Tests
// =============================================================================

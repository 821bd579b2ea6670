//! Control structures for deferred evaluation.
//!
//! This module provides [`Lazy`], a memoized deferred-computation cell:
//! the value is computed on first access and cached for every later
//! access. The lazy sequence spine in [`crate::persistent`] is built out
//! of reference-counted `Lazy` cells, so that all sequences sharing a
//! suspended subtree also share the single memoized result.
//!
//! # Examples
//!
//! ```rust
//! use fingerseq::control::Lazy;
//!
//! let cell = Lazy::new(|| {
//!     println!("Computing...");
//!     42
//! });
//! // Nothing has been computed yet.
//!
//! let value = cell.force();
//! // "Computing..." was printed exactly once.
//! assert_eq!(*value, 42);
//!
//! let again = cell.force();
//! // The cached value is reused; the closure does not run again.
//! assert_eq!(*again, 42);
//! ```

mod lazy;

pub use lazy::{Lazy, LazyState};

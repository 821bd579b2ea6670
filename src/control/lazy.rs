//! Deferred, memoized computation cells.
//!
//! [`Lazy<T, F>`] holds either a not-yet-run thunk or the value the thunk
//! produced. The first call to [`Lazy::force`] runs the thunk and caches
//! the result; every later call returns the cached value. A cell
//! transitions at most once from deferred to ready, which is what makes
//! it safe to share between any number of owners of the same structure.
//!
//! # Thread Safety
//!
//! This type is NOT thread-safe: the transition is guarded by a
//! `RefCell`, not a lock. Values containing `Lazy` cells are therefore
//! neither `Send` nor `Sync`.

use std::cell::{Ref, RefCell};
use std::fmt;

/// The internal state of a [`Lazy`] cell.
#[derive(Debug)]
pub enum LazyState<T, F> {
    /// The thunk has not run yet.
    Deferred(F),
    /// The thunk has run; the result is cached here.
    Ready(T),
    /// The thunk panicked. The cell is unusable.
    Poisoned,
}

/// A deferred computation that is evaluated at most once.
///
/// `Lazy<T, F>` stores a thunk of type `F` until the value is first
/// requested via [`force`](Lazy::force), then stores the computed `T` for
/// the rest of its lifetime.
///
/// # Panics
///
/// If the thunk panics, the cell becomes poisoned and every later
/// `force` panics as well, rather than observing partial state.
///
/// # Examples
///
/// ```rust
/// use fingerseq::control::Lazy;
/// use std::cell::Cell;
///
/// let runs = Cell::new(0);
/// let cell = Lazy::new(|| {
///     runs.set(runs.get() + 1);
///     "expensive"
/// });
///
/// assert_eq!(runs.get(), 0);
/// assert_eq!(*cell.force(), "expensive");
/// assert_eq!(*cell.force(), "expensive");
/// assert_eq!(runs.get(), 1);
/// ```
pub struct Lazy<T, F = fn() -> T> {
    state: RefCell<LazyState<T, F>>,
}

impl<T, F: FnOnce() -> T> Lazy<T, F> {
    /// Creates a cell that will run `thunk` on first access.
    #[inline]
    pub const fn new(thunk: F) -> Self {
        Self {
            state: RefCell::new(LazyState::Deferred(thunk)),
        }
    }

    /// Forces the cell, returning a reference to the (possibly freshly
    /// computed) value.
    ///
    /// # Panics
    ///
    /// Panics if the thunk panicked during a previous or the current
    /// call.
    pub fn force(&self) -> Ref<'_, T> {
        // Check with a short borrow first so the thunk does not run while
        // the state is borrowed.
        let deferred = {
            let state = self.state.borrow();
            match &*state {
                LazyState::Ready(_) => false,
                LazyState::Deferred(_) => true,
                LazyState::Poisoned => panic!("Lazy cell has been poisoned"),
            }
        };

        if deferred {
            self.evaluate();
        }

        Ref::map(self.state.borrow(), |state| match state {
            LazyState::Ready(value) => value,
            _ => unreachable!("Lazy cell must be ready after evaluation"),
        })
    }

    /// Runs the thunk and stores the result.
    ///
    /// The state is parked at `Poisoned` while the thunk runs, so a
    /// panicking thunk leaves the cell poisoned instead of half-built.
    fn evaluate(&self) {
        let mut state = self.state.borrow_mut();

        match &*state {
            LazyState::Ready(_) => return,
            LazyState::Poisoned => panic!("Lazy cell has been poisoned"),
            LazyState::Deferred(_) => {}
        }

        let LazyState::Deferred(thunk) = std::mem::replace(&mut *state, LazyState::Poisoned)
        else {
            unreachable!()
        };

        let value = thunk();
        *state = LazyState::Ready(value);
    }

    /// Consumes the cell and returns the value, running the thunk if it
    /// has not run yet. Returns `None` if the cell is poisoned.
    pub fn into_inner(self) -> Option<T> {
        match self.state.into_inner() {
            LazyState::Ready(value) => Some(value),
            LazyState::Deferred(thunk) => Some(thunk()),
            LazyState::Poisoned => None,
        }
    }
}

impl<T, F> Lazy<T, F> {
    /// Creates a cell that is already forced.
    ///
    /// Useful when a subtree is known eagerly but has to live in a
    /// position that expects a cell. Unlike [`Lazy::new`], this works for
    /// any thunk type, including boxed closures that cannot be conjured
    /// out of thin air.
    #[inline]
    pub const fn ready(value: T) -> Self {
        Self {
            state: RefCell::new(LazyState::Ready(value)),
        }
    }

    /// Returns a reference to the value without forcing. `None` if the
    /// cell has not been forced yet or is poisoned.
    pub fn try_get(&self) -> Option<Ref<'_, T>> {
        let state = self.state.borrow();
        if matches!(&*state, LazyState::Ready(_)) {
            Some(Ref::map(state, |state| match state {
                LazyState::Ready(value) => value,
                _ => unreachable!(),
            }))
        } else {
            None
        }
    }

    /// Returns whether the cell has been forced.
    #[inline]
    pub fn is_forced(&self) -> bool {
        matches!(&*self.state.borrow(), LazyState::Ready(_))
    }

    /// Returns whether the thunk panicked.
    #[inline]
    pub fn is_poisoned(&self) -> bool {
        matches!(&*self.state.borrow(), LazyState::Poisoned)
    }
}

impl<T: fmt::Debug, F> fmt::Debug for Lazy<T, F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.borrow() {
            LazyState::Ready(value) => formatter.debug_tuple("Lazy").field(value).finish(),
            LazyState::Deferred(_) => formatter.debug_tuple("Lazy").field(&"<deferred>").finish(),
            LazyState::Poisoned => formatter.debug_tuple("Lazy").field(&"<poisoned>").finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;

    #[rstest]
    fn test_new_does_not_run_thunk() {
        let ran = Cell::new(false);
        let cell = Lazy::new(|| ran.set(true));
        assert!(!cell.is_forced());
        assert!(!ran.get());
    }

    #[rstest]
    fn test_force_computes_and_caches() {
        let runs = Cell::new(0);
        let cell = Lazy::new(|| {
            runs.set(runs.get() + 1);
            7
        });

        assert_eq!(*cell.force(), 7);
        assert_eq!(*cell.force(), 7);
        assert_eq!(runs.get(), 1);
        assert!(cell.is_forced());
    }

    #[rstest]
    fn test_ready_is_already_forced() {
        let cell: Lazy<i32> = Lazy::ready(42);
        assert!(cell.is_forced());
        assert_eq!(*cell.force(), 42);
    }

    #[rstest]
    fn test_ready_works_with_boxed_thunk_type() {
        // The lazy spine stores boxed thunks; `ready` must not require
        // constructing one.
        let cell: Lazy<i32, Box<dyn FnOnce() -> i32>> = Lazy::ready(5);
        assert_eq!(cell.try_get().as_deref(), Some(&5));
    }

    #[rstest]
    fn test_try_get_before_and_after_force() {
        let cell = Lazy::new(|| 1);
        assert!(cell.try_get().is_none());
        let _ = cell.force();
        assert_eq!(cell.try_get().as_deref(), Some(&1));
    }

    #[rstest]
    fn test_into_inner_runs_deferred_thunk() {
        let cell = Lazy::new(|| 3);
        assert_eq!(cell.into_inner(), Some(3));
    }

    #[rstest]
    fn test_panicking_thunk_poisons() {
        let cell: Lazy<i32, fn() -> i32> = Lazy::new(|| panic!("boom"));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cell.force()));
        assert!(result.is_err());
        assert!(cell.is_poisoned());
    }
}

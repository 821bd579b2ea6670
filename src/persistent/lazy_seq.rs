//! Persistent sequence with a deferred, memoized spine.
//!
//! `LazySeq` has the same finger-tree shape as
//! [`PersistentSeq`](super::PersistentSeq), but every inner-tree
//! reference of a `Deep` node is a [`Lazy`] cell: the subtree one rank up
//! is not built until an operation descends through it, and once built it
//! is cached for every sequence sharing that cell.
//!
//! # Deferred Cost
//!
//! Construction-side operations (`cons`, `snoc`, `concat`, `insert_at`)
//! wrap their recursive spine work in suspended cells instead of
//! performing it. Consumption-side operations (`get`, `uncons`,
//! `split_at`, `to_strict`) force exactly the cells on their descent path
//! and no others. Total work over any operation sequence matches the
//! strict structure; the benefit is that work for branches nobody ever
//! reaches is never paid. A pipeline of many `concat`/`cons` calls
//! followed by a single `get` builds only one spine path.
//!
//! Size annotations stay strict: `len` is O(1) and never forces a cell.
//!
//! # Element Access
//!
//! Forcing mutates the shared cell behind the scenes, so `get` cannot
//! hand out a borrow into the structure the way the strict sequence
//! does; it returns a clone instead. Elements are stored behind
//! reference counters, so cloning a shared payload stays cheap. The two
//! ends live in strict digits, which is why `front`/`back` still return
//! references.
//!
//! # Thread Safety
//!
//! The cells are `RefCell`-based, so `LazySeq` is never `Send` or
//! `Sync`, regardless of the `arc` feature. Callers who need to share a
//! sequence across threads convert to the strict representation first.
//!
//! # Examples
//!
//! ```rust
//! use fingerseq::persistent::LazySeq;
//!
//! let front: LazySeq<i32> = (0..1000).collect();
//! let back: LazySeq<i32> = (1000..2000).collect();
//!
//! // The joined spine is a suspended cell.
//! let joined = front.concat(&back);
//! assert_eq!(joined.len(), 2000);
//!
//! // Only the path to index 1500 is built.
//! assert_eq!(joined.get(1500), Some(1500));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;

use crate::control::Lazy;

use super::ReferenceCounter;
use super::seq::{Digit, FingerTree, Node, NodeBuffer, PersistentSeq, regroup};

/// Suspended computation of a spine subtree.
type SpineThunk<T> = Box<dyn FnOnce() -> LazyTree<T>>;

/// A shared, memoized spine cell. Cloning shares the cell, so every
/// sequence referencing the same suspended subtree also shares the one
/// result of forcing it.
type SpineCell<T> = ReferenceCounter<Lazy<LazyTree<T>, SpineThunk<T>>>;

fn settled<T>(tree: LazyTree<T>) -> SpineCell<T> {
    ReferenceCounter::new(Lazy::ready(tree))
}

fn suspend<T: 'static>(thunk: impl FnOnce() -> LazyTree<T> + 'static) -> SpineCell<T> {
    ReferenceCounter::new(Lazy::new(Box::new(thunk)))
}

fn force_spine<T>(cell: &SpineCell<T>) -> LazyTree<T> {
    cell.force().clone()
}

// =============================================================================
// LazyTree
// =============================================================================

/// The tree shape of [`super::seq::FingerTree`], with the spine behind a
/// memoized cell. Digits and nodes are shared with the strict module;
/// only the recursive position differs.
pub(super) enum LazyTree<T> {
    Empty,
    Single(Node<T>),
    Deep {
        size: usize,
        left: Digit<T>,
        spine: SpineCell<T>,
        right: Digit<T>,
    },
}

impl<T> Clone for LazyTree<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Single(node) => Self::Single(node.clone()),
            Self::Deep {
                size,
                left,
                spine,
                right,
            } => Self::Deep {
                size: *size,
                left: left.clone(),
                spine: spine.clone(),
                right: right.clone(),
            },
        }
    }
}

impl<T> LazyTree<T> {
    pub(super) const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub(super) const fn size(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(node) => node.size(),
            Self::Deep { size, .. } => *size,
        }
    }

    pub(super) fn front(&self) -> Option<&T> {
        match self {
            Self::Empty => None,
            Self::Single(node) => Some(node.first_element()),
            Self::Deep { left, .. } => Some(left.head().first_element()),
        }
    }

    pub(super) fn back(&self) -> Option<&T> {
        match self {
            Self::Empty => None,
            Self::Single(node) => Some(node.last_element()),
            Self::Deep { right, .. } => Some(right.last().last_element()),
        }
    }

    pub(super) fn pop_front(&self) -> Option<(Node<T>, Self)> {
        match self {
            Self::Empty => None,
            Self::Single(node) => Some((node.clone(), Self::Empty)),
            Self::Deep {
                size,
                left,
                spine,
                right,
            } => {
                let (rest, removed) = left.pop_front();
                let spine_size = size - left.size() - right.size();
                let tree = rest.map_or_else(
                    || deep_left(None, spine, spine_size, right),
                    |new_left| Self::Deep {
                        size: size - removed.size(),
                        left: new_left,
                        spine: spine.clone(),
                        right: right.clone(),
                    },
                );
                Some((removed, tree))
            }
        }
    }

    pub(super) fn pop_back(&self) -> Option<(Self, Node<T>)> {
        match self {
            Self::Empty => None,
            Self::Single(node) => Some((Self::Empty, node.clone())),
            Self::Deep {
                size,
                left,
                spine,
                right,
            } => {
                let (rest, removed) = right.pop_back();
                let spine_size = size - left.size() - right.size();
                let tree = rest.map_or_else(
                    || deep_right(left, spine, spine_size, None),
                    |new_right| Self::Deep {
                        size: size - removed.size(),
                        left: left.clone(),
                        spine: spine.clone(),
                        right: new_right,
                    },
                );
                Some((tree, removed))
            }
        }
    }

    /// Positional lookup, forcing only the spine cells on the descent
    /// path. Returns a shared handle because the forced subtree lives
    /// inside the cell, not in `self`.
    pub(super) fn get(&self, index: usize) -> Option<ReferenceCounter<T>> {
        match self {
            Self::Empty => None,
            Self::Single(node) => node.get_shared(index),
            Self::Deep {
                size,
                left,
                spine,
                right,
            } => {
                if index >= *size {
                    return None;
                }
                let left_size = left.size();
                if index < left_size {
                    return left.get_shared(index);
                }
                let index = index - left_size;
                let spine_size = size - left_size - right.size();
                if index < spine_size {
                    force_spine(spine).get(index)
                } else {
                    right.get_shared(index - spine_size)
                }
            }
        }
    }

    /// Splits around the node containing `index`; forces the spine cells
    /// on the split path. `index` must satisfy `index < self.size()`.
    pub(super) fn split(&self, index: usize) -> (Self, Node<T>, Self) {
        match self {
            Self::Empty => unreachable!("split descended into an empty tree"),
            Self::Single(node) => (Self::Empty, node.clone(), Self::Empty),
            Self::Deep {
                size,
                left,
                spine,
                right,
            } => {
                let left_size = left.size();
                let spine_size = size - left_size - right.size();
                if index < left_size {
                    let (before, hit, after) = left.split(index);
                    return (
                        before.map_or(Self::Empty, |digit| collapse_digit(&digit, true)),
                        hit,
                        deep_left(after, spine, spine_size, right),
                    );
                }
                let index = index - left_size;
                if index < spine_size {
                    let forced = force_spine(spine);
                    let (spine_before, node, spine_after) = forced.split(index);
                    let (before, hit, after) = node.to_digit().split(index - spine_before.size());
                    let before_size = spine_before.size();
                    let after_size = spine_after.size();
                    return (
                        deep_right(left, &settled(spine_before), before_size, before),
                        hit,
                        deep_left(after, &settled(spine_after), after_size, right),
                    );
                }
                let index = index - spine_size;
                let (before, hit, after) = right.split(index);
                (
                    deep_right(left, spine, spine_size, before),
                    hit,
                    after.map_or(Self::Empty, |digit| collapse_digit(&digit, false)),
                )
            }
        }
    }
}

impl<T: 'static> LazyTree<T> {
    pub(super) fn push_front(&self, node: Node<T>) -> Self {
        match self {
            Self::Empty => Self::Single(node),
            Self::Single(existing) => Self::Deep {
                size: node.size() + existing.size(),
                left: Digit::One(node),
                spine: settled(Self::Empty),
                right: Digit::One(existing.clone()),
            },
            Self::Deep {
                size,
                left,
                spine,
                right,
            } => {
                let new_size = size + node.size();
                left.prepend(node.clone()).map_or_else(
                    || {
                        let Digit::Four(first, second, third, fourth) = left else {
                            unreachable!("prepend returned None but the digit is not Four")
                        };
                        let overflow =
                            Node::branch3(second.clone(), third.clone(), fourth.clone());
                        let inner = spine.clone();
                        Self::Deep {
                            size: new_size,
                            left: Digit::Two(node, first.clone()),
                            spine: suspend(move || force_spine(&inner).push_front(overflow)),
                            right: right.clone(),
                        }
                    },
                    |new_left| Self::Deep {
                        size: new_size,
                        left: new_left,
                        spine: spine.clone(),
                        right: right.clone(),
                    },
                )
            }
        }
    }

    pub(super) fn push_back(&self, node: Node<T>) -> Self {
        match self {
            Self::Empty => Self::Single(node),
            Self::Single(existing) => Self::Deep {
                size: existing.size() + node.size(),
                left: Digit::One(existing.clone()),
                spine: settled(Self::Empty),
                right: Digit::One(node),
            },
            Self::Deep {
                size,
                left,
                spine,
                right,
            } => {
                let new_size = size + node.size();
                right.append(node.clone()).map_or_else(
                    || {
                        let Digit::Four(first, second, third, fourth) = right else {
                            unreachable!("append returned None but the digit is not Four")
                        };
                        let overflow = Node::branch3(first.clone(), second.clone(), third.clone());
                        let inner = spine.clone();
                        Self::Deep {
                            size: new_size,
                            left: left.clone(),
                            spine: suspend(move || force_spine(&inner).push_back(overflow)),
                            right: Digit::Two(fourth.clone(), node),
                        }
                    },
                    |new_right| Self::Deep {
                        size: new_size,
                        left: left.clone(),
                        spine: spine.clone(),
                        right: new_right,
                    },
                )
            }
        }
    }
}

/// Rebuilds a `Deep` tree whose left digit may have vanished.
///
/// `spine_size` is the element count beneath the spine cell, tracked
/// strictly by the caller. A zero-sized spine is known to be empty
/// without forcing it.
fn deep_left<T>(
    left: Option<Digit<T>>,
    spine: &SpineCell<T>,
    spine_size: usize,
    right: &Digit<T>,
) -> LazyTree<T> {
    match left {
        Some(digit) => LazyTree::Deep {
            size: digit.size() + spine_size + right.size(),
            left: digit,
            spine: spine.clone(),
            right: right.clone(),
        },
        None if spine_size == 0 => collapse_digit(right, true),
        None => {
            let Some((node, rest)) = force_spine(spine).pop_front() else {
                unreachable!("a spine with a nonzero size measure was empty")
            };
            LazyTree::Deep {
                size: node.size() + rest.size() + right.size(),
                left: node.to_digit(),
                spine: settled(rest),
                right: right.clone(),
            }
        }
    }
}

/// Mirror of [`deep_left`] for a vanished right digit.
fn deep_right<T>(
    left: &Digit<T>,
    spine: &SpineCell<T>,
    spine_size: usize,
    right: Option<Digit<T>>,
) -> LazyTree<T> {
    match right {
        Some(digit) => LazyTree::Deep {
            size: left.size() + spine_size + digit.size(),
            left: left.clone(),
            spine: spine.clone(),
            right: digit,
        },
        None if spine_size == 0 => collapse_digit(left, false),
        None => {
            let Some((rest, node)) = force_spine(spine).pop_back() else {
                unreachable!("a spine with a nonzero size measure was empty")
            };
            LazyTree::Deep {
                size: left.size() + rest.size() + node.size(),
                left: left.clone(),
                spine: settled(rest),
                right: node.to_digit(),
            }
        }
    }
}

/// Turns a lone digit into a well-formed tree; see the strict
/// counterpart for the `wide_left` convention.
fn collapse_digit<T>(digit: &Digit<T>, wide_left: bool) -> LazyTree<T> {
    let refs = digit.node_refs();
    match refs.as_slice() {
        [first] => LazyTree::Single((*first).clone()),
        [first, second] => LazyTree::Deep {
            size: digit.size(),
            left: Digit::One((*first).clone()),
            spine: settled(LazyTree::Empty),
            right: Digit::One((*second).clone()),
        },
        [first, second, third] if wide_left => LazyTree::Deep {
            size: digit.size(),
            left: Digit::Two((*first).clone(), (*second).clone()),
            spine: settled(LazyTree::Empty),
            right: Digit::One((*third).clone()),
        },
        [first, second, third] => LazyTree::Deep {
            size: digit.size(),
            left: Digit::One((*first).clone()),
            spine: settled(LazyTree::Empty),
            right: Digit::Two((*second).clone(), (*third).clone()),
        },
        [first, second, third, fourth] if wide_left => LazyTree::Deep {
            size: digit.size(),
            left: Digit::Three((*first).clone(), (*second).clone(), (*third).clone()),
            spine: settled(LazyTree::Empty),
            right: Digit::One((*fourth).clone()),
        },
        [first, second, third, fourth] => LazyTree::Deep {
            size: digit.size(),
            left: Digit::One((*first).clone()),
            spine: settled(LazyTree::Empty),
            right: Digit::Three((*second).clone(), (*third).clone(), (*fourth).clone()),
        },
        _ => unreachable!("a digit holds between one and four nodes"),
    }
}

// =============================================================================
// Concatenation
// =============================================================================

/// Concatenates `first ++ middle ++ second`. The recursive inner
/// concatenation is suspended: until something descends into the result,
/// only the top level exists.
fn app3<T: 'static>(first: &LazyTree<T>, middle: NodeBuffer<T>, second: &LazyTree<T>) -> LazyTree<T> {
    match (first, second) {
        (LazyTree::Empty, _) => prepend_nodes(middle, second),
        (_, LazyTree::Empty) => append_nodes(first, middle),
        (LazyTree::Single(node), _) => prepend_nodes(middle, second).push_front(node.clone()),
        (_, LazyTree::Single(node)) => append_nodes(first, middle).push_back(node.clone()),
        (
            LazyTree::Deep {
                size: first_size,
                left: first_left,
                spine: first_spine,
                right: first_right,
            },
            LazyTree::Deep {
                size: second_size,
                left: second_left,
                spine: second_spine,
                right: second_right,
            },
        ) => {
            let middle_size: usize = middle.iter().map(Node::size).sum();
            let mut boundary = NodeBuffer::new();
            boundary.extend(first_right.node_refs().into_iter().cloned());
            boundary.extend(middle);
            boundary.extend(second_left.node_refs().into_iter().cloned());
            let regrouped = regroup(boundary);
            let inner_first = first_spine.clone();
            let inner_second = second_spine.clone();
            LazyTree::Deep {
                size: first_size + middle_size + second_size,
                left: first_left.clone(),
                spine: suspend(move || {
                    app3(
                        &force_spine(&inner_first),
                        regrouped,
                        &force_spine(&inner_second),
                    )
                }),
                right: second_right.clone(),
            }
        }
    }
}

fn prepend_nodes<T: 'static>(nodes: NodeBuffer<T>, tree: &LazyTree<T>) -> LazyTree<T> {
    nodes
        .into_iter()
        .rev()
        .fold(tree.clone(), |tree, node| tree.push_front(node))
}

fn append_nodes<T: 'static>(tree: &LazyTree<T>, nodes: NodeBuffer<T>) -> LazyTree<T> {
    nodes
        .into_iter()
        .fold(tree.clone(), |tree, node| tree.push_back(node))
}

// =============================================================================
// Conversions
// =============================================================================

/// Wraps a strict tree lazily: each level's spine converts on demand.
fn lazy_tree<T: 'static>(tree: &FingerTree<T>) -> LazyTree<T> {
    match tree {
        FingerTree::Empty => LazyTree::Empty,
        FingerTree::Single(node) => LazyTree::Single(node.clone()),
        FingerTree::Deep {
            size,
            left,
            spine,
            right,
        } => {
            let inner = spine.clone();
            LazyTree::Deep {
                size: *size,
                left: left.clone(),
                spine: suspend(move || lazy_tree(inner.as_ref())),
                right: right.clone(),
            }
        }
    }
}

/// Forces the whole structure into a strict tree.
fn strict_tree<T>(tree: &LazyTree<T>) -> FingerTree<T> {
    match tree {
        LazyTree::Empty => FingerTree::Empty,
        LazyTree::Single(node) => FingerTree::Single(node.clone()),
        LazyTree::Deep {
            size,
            left,
            spine,
            right,
        } => FingerTree::Deep {
            size: *size,
            left: left.clone(),
            spine: ReferenceCounter::new(strict_tree(&force_spine(spine))),
            right: right.clone(),
        },
    }
}

// =============================================================================
// LazySeq
// =============================================================================

/// A persistent sequence whose spine is built on demand.
///
/// Same operation set and same total-work bounds as
/// [`PersistentSeq`](super::PersistentSeq); the difference is *when* the
/// work happens. Chains of structural operations stay cheap until a
/// consuming operation descends into the parts it actually needs.
///
/// Element types must be `'static` for every operation that suspends
/// work, since thunks may outlive the borrow they were created under.
///
/// # Examples
///
/// ```rust
/// use fingerseq::persistent::LazySeq;
///
/// let seq = LazySeq::new().snoc(1).snoc(2).snoc(3);
/// assert_eq!(seq.front(), Some(&1));
/// assert_eq!(seq.get(2), Some(3));
/// assert_eq!(seq.len(), 3);
/// ```
pub struct LazySeq<T> {
    pub(super) tree: LazyTree<T>,
}

impl<T> Clone for LazySeq<T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<T> LazySeq<T> {
    /// Creates a new empty sequence.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tree: LazyTree::Empty,
        }
    }

    /// Creates a sequence containing a single element.
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self {
            tree: LazyTree::Single(Node::leaf(element)),
        }
    }

    /// Returns `true` if the sequence contains no elements. Never
    /// forces.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements. O(1); never forces.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns a reference to the first element, if any. Never forces:
    /// the ends live in strict digits.
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.tree.front()
    }

    /// Returns a reference to the last element, if any. Never forces.
    #[inline]
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.tree.back()
    }
}

impl<T: 'static> LazySeq<T> {
    /// Prepends an element. Amortized O(1); a digit overflow suspends
    /// the push one rank down instead of performing it.
    #[must_use]
    pub fn cons(&self, element: T) -> Self {
        Self {
            tree: self.tree.push_front(Node::leaf(element)),
        }
    }

    /// Appends an element. Amortized O(1); see [`cons`](Self::cons).
    #[must_use]
    pub fn snoc(&self, element: T) -> Self {
        Self {
            tree: self.tree.push_back(Node::leaf(element)),
        }
    }

    /// Removes the first element, returning it together with the rest of
    /// the sequence. `None` on an empty sequence. Forces at most the
    /// cell holding the next left digit.
    #[must_use]
    pub fn uncons(&self) -> Option<(T, Self)>
    where
        T: Clone,
    {
        self.tree.pop_front().map(|(node, tree)| {
            let element = node.first_element().clone();
            (element, Self { tree })
        })
    }

    /// Removes the last element, returning the rest of the sequence
    /// together with it. `None` on an empty sequence.
    #[must_use]
    pub fn unsnoc(&self) -> Option<(Self, T)>
    where
        T: Clone,
    {
        self.tree.pop_back().map(|(tree, node)| {
            let element = node.last_element().clone();
            (Self { tree }, element)
        })
    }

    /// Returns the element at `index`, or `None` when out of range.
    /// O(log n); forces only the cells on the descent path.
    ///
    /// Returns a clone: the forced subtree lives inside a shared cell,
    /// so no borrow into it can be handed out.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.tree
            .get(index)
            .map(|element| element.as_ref().clone())
    }

    /// Alias for [`get`](Self::get).
    #[inline]
    #[must_use]
    pub fn lookup(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.get(index)
    }

    /// Splits into the elements strictly before `index` and the elements
    /// from `index` onward. Out-of-range indices are clamped. O(log n);
    /// forces the cells on the split path, leaving everything else
    /// suspended.
    #[must_use]
    pub fn split_at(&self, index: usize) -> (Self, Self) {
        if index == 0 {
            return (Self::new(), self.clone());
        }
        if index >= self.len() {
            return (self.clone(), Self::new());
        }
        let (before, hit, after) = self.tree.split(index);
        (
            Self { tree: before },
            Self {
                tree: after.push_front(hit),
            },
        )
    }

    /// Concatenates this sequence with another. O(log min(n, m)) at the
    /// top; the recursive joins are suspended until needed.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        Self {
            tree: app3(&self.tree, NodeBuffer::new(), &other.tree),
        }
    }

    /// Alias for [`concat`](Self::concat).
    #[inline]
    #[must_use]
    pub fn append(&self, other: &Self) -> Self {
        self.concat(other)
    }

    /// Inserts an element so that it ends up at `index`. Out-of-range
    /// indices are clamped to the nearest end. O(log n).
    #[must_use]
    pub fn insert_at(&self, index: usize, element: T) -> Self {
        let (left, right) = self.split_at(index.min(self.len()));
        left.snoc(element).concat(&right)
    }

    /// Removes the element at `index`. `None` when out of range.
    /// Linear rebuild, forcing the whole structure.
    #[must_use]
    pub fn delete_at(&self, index: usize) -> Option<Self>
    where
        T: Clone,
    {
        if index >= self.len() {
            return None;
        }
        let mut rebuilt = Self::new();
        for (position, element) in self.iter().enumerate() {
            if position != index {
                rebuilt = rebuilt.snoc(element);
            }
        }
        Some(rebuilt)
    }

    /// Replaces the element at `index`. `None` when out of range.
    /// Linear rebuild.
    #[must_use]
    pub fn update(&self, index: usize, element: T) -> Option<Self>
    where
        T: Clone,
    {
        self.adjust(index, |_| element)
    }

    /// Applies `function` to the element at `index`, replacing it with
    /// the result. `None` when out of range. Linear rebuild.
    #[must_use]
    pub fn adjust<F>(&self, index: usize, function: F) -> Option<Self>
    where
        T: Clone,
        F: FnOnce(&T) -> T,
    {
        if index >= self.len() {
            return None;
        }
        let mut function = Some(function);
        let mut rebuilt = Self::new();
        for (position, element) in self.iter().enumerate() {
            let replacement = if position == index {
                let function = function
                    .take()
                    .unwrap_or_else(|| unreachable!("adjust visited its index twice"));
                function(&element)
            } else {
                element
            };
            rebuilt = rebuilt.snoc(replacement);
        }
        Some(rebuilt)
    }

    /// Creates a sequence from a slice, preserving order.
    #[must_use]
    pub fn from_slice(slice: &[T]) -> Self
    where
        T: Clone,
    {
        slice.iter().cloned().collect()
    }

    /// Creates an iterator over the elements, front to back. Yields
    /// clones, for the same reason [`get`](Self::get) does.
    #[must_use]
    pub fn iter(&self) -> LazySeqIntoIterator<T>
    where
        T: Clone,
    {
        LazySeqIntoIterator { seq: self.clone() }
    }

    /// Wraps a strict sequence without copying it. The conversion itself
    /// is deferred: each level's spine converts the first time something
    /// descends into it.
    #[must_use]
    pub fn from_strict(seq: &PersistentSeq<T>) -> Self {
        Self {
            tree: lazy_tree(&seq.tree),
        }
    }

    /// Forces the whole structure and returns it as a strict sequence.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fingerseq::persistent::{LazySeq, PersistentSeq};
    ///
    /// let strict: PersistentSeq<i32> = (0..10).collect();
    /// let lazy = LazySeq::from_strict(&strict);
    /// assert_eq!(lazy.get(5), Some(5));
    /// assert_eq!(lazy.to_strict(), strict);
    /// ```
    #[must_use]
    pub fn to_strict(&self) -> PersistentSeq<T> {
        PersistentSeq {
            tree: strict_tree(&self.tree),
        }
    }
}

impl<T: 'static> PersistentSeq<T> {
    /// Wraps this sequence in the lazy representation without copying
    /// it; the inverse of [`LazySeq::to_strict`].
    #[must_use]
    pub fn to_lazy(&self) -> LazySeq<T> {
        LazySeq::from_strict(self)
    }
}

impl<T> Default for LazySeq<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq + 'static> PartialEq for LazySeq<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Clone + Eq + 'static> Eq for LazySeq<T> {}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for LazySeq<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Clone + Hash + 'static> Hash for LazySeq<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for element in self.iter() {
            element.hash(state);
        }
    }
}

impl<T: 'static> FromIterator<T> for LazySeq<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut seq = Self::new();
        for element in iter {
            seq = seq.snoc(element);
        }
        seq
    }
}

impl<T: Clone + 'static> IntoIterator for LazySeq<T> {
    type Item = T;
    type IntoIter = LazySeqIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        LazySeqIntoIterator { seq: self }
    }
}

impl<T: Clone + 'static> IntoIterator for &LazySeq<T> {
    type Item = T;
    type IntoIter = LazySeqIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: 'static> From<PersistentSeq<T>> for LazySeq<T> {
    fn from(seq: PersistentSeq<T>) -> Self {
        Self::from_strict(&seq)
    }
}

impl<T: 'static> From<LazySeq<T>> for PersistentSeq<T> {
    fn from(seq: LazySeq<T>) -> Self {
        seq.to_strict()
    }
}

/// Consuming iterator over a [`LazySeq`], driven by `uncons`; forces
/// cells as the walk reaches them.
pub struct LazySeqIntoIterator<T> {
    seq: LazySeq<T>,
}

impl<T: Clone + 'static> Iterator for LazySeqIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let (element, rest) = self.seq.uncons()?;
        self.seq = rest;
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.seq.len(), Some(self.seq.len()))
    }
}

impl<T: Clone + 'static> ExactSizeIterator for LazySeqIntoIterator<T> {}

// =============================================================================
// Serde
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize + Clone + 'static> serde::Serialize for LazySeq<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for element in self.iter() {
            seq.serialize_element(&element)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct LazySeqVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<T> LazySeqVisitor<T> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for LazySeqVisitor<T>
where
    T: serde::Deserialize<'de> + 'static,
{
    type Value = LazySeq<T>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut elements = LazySeq::new();
        while let Some(element) = seq.next_element()? {
            elements = elements.snoc(element);
        }
        Ok(elements)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for LazySeq<T>
where
    T: serde::Deserialize<'de> + 'static,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(LazySeqVisitor::new())
    }
}

// =============================================================================
// Thread-safety assertions
// =============================================================================

// The cells are RefCell-based in every configuration.
static_assertions::assert_not_impl_any!(LazySeq<i32>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lazy_of(range: std::ops::Range<i32>) -> LazySeq<i32> {
        range.collect()
    }

    fn outer_spine(seq: &LazySeq<i32>) -> &SpineCell<i32> {
        match &seq.tree {
            LazyTree::Deep { spine, .. } => spine,
            _ => panic!("expected a deep tree"),
        }
    }

    mod basics {
        use super::*;

        #[rstest]
        fn test_new_is_empty() {
            let seq: LazySeq<i32> = LazySeq::new();
            assert!(seq.is_empty());
            assert_eq!(seq.len(), 0);
            assert_eq!(seq.front(), None);
            assert!(seq.uncons().is_none());
        }

        #[rstest]
        fn test_cons_and_get() {
            let seq = LazySeq::new().cons(3).cons(2).cons(1);
            assert_eq!(seq.len(), 3);
            assert_eq!(seq.get(0), Some(1));
            assert_eq!(seq.get(1), Some(2));
            assert_eq!(seq.get(2), Some(3));
            assert_eq!(seq.get(3), None);
        }

        #[rstest]
        fn test_structural_sharing_preserves_original() {
            let original = lazy_of(0..10);
            let extended = original.snoc(10);
            assert_eq!(original.len(), 10);
            assert_eq!(extended.len(), 11);
            assert_eq!(extended.get(10), Some(10));
        }

        #[rstest]
        fn test_drain_front_matches_order() {
            let mut seq = lazy_of(0..200);
            for expected in 0..200 {
                let (element, rest) = seq.uncons().unwrap();
                assert_eq!(element, expected);
                seq = rest;
            }
            assert!(seq.is_empty());
        }

        #[rstest]
        fn test_drain_back_matches_order() {
            let mut seq = lazy_of(0..200);
            for expected in (0..200).rev() {
                let (rest, element) = seq.unsnoc().unwrap();
                assert_eq!(element, expected);
                seq = rest;
            }
            assert!(seq.is_empty());
        }
    }

    mod forcing_discipline {
        use super::*;

        #[rstest]
        fn test_cons_overflow_leaves_spine_suspended() {
            let seq = (0..40).fold(LazySeq::new(), |seq, value| seq.cons(value));
            assert!(!outer_spine(&seq).is_forced());

            // Lengths and ends are strict; still nothing forced.
            assert_eq!(seq.len(), 40);
            assert_eq!(seq.front(), Some(&39));
            assert!(!outer_spine(&seq).is_forced());

            // A lookup into the middle forces the path.
            assert_eq!(seq.get(20), Some(19));
            assert!(outer_spine(&seq).is_forced());
        }

        #[rstest]
        fn test_concat_leaves_inner_join_suspended() {
            let first = lazy_of(0..100);
            let second = lazy_of(100..200);
            let joined = first.concat(&second);

            assert!(!outer_spine(&joined).is_forced());
            assert_eq!(joined.len(), 200);
            assert!(!outer_spine(&joined).is_forced());

            assert_eq!(joined.get(150), Some(150));
            assert!(outer_spine(&joined).is_forced());
        }

        #[rstest]
        fn test_forcing_is_shared_between_clones() {
            let seq = lazy_of(0..100);
            let alias = seq.clone();

            assert!(!outer_spine(&seq).is_forced());
            let _ = alias.get(50);
            // The alias forced the shared cell; the original sees it.
            assert!(outer_spine(&seq).is_forced());
        }

        #[rstest]
        fn test_from_strict_defers_conversion() {
            let strict: PersistentSeq<i32> = (0..100).collect();
            let lazy = strict.to_lazy();
            assert!(!outer_spine(&lazy).is_forced());
            assert_eq!(lazy.get(50), Some(50));
            assert!(outer_spine(&lazy).is_forced());
        }
    }

    mod structural_operations {
        use super::*;

        #[rstest]
        fn test_split_at_every_position_rejoins() {
            let seq = lazy_of(0..48);
            for index in 0..=48 {
                let (left, right) = seq.split_at(index);
                assert_eq!(left.len(), index);
                assert_eq!(right.len(), 48 - index);
                assert_eq!(left.concat(&right), seq);
            }
        }

        #[rstest]
        fn test_split_at_clamps() {
            let seq = lazy_of(0..5);
            let (left, right) = seq.split_at(99);
            assert_eq!(left, seq);
            assert!(right.is_empty());
        }

        #[rstest]
        fn test_concat_boundary_element() {
            let first = lazy_of(0..5);
            let second = lazy_of(5..12);
            let joined = first.concat(&second);
            assert_eq!(joined.len(), 12);
            assert_eq!(joined.get(5), second.get(0));
        }

        #[rstest]
        fn test_insert_and_point_edits() {
            let seq = lazy_of(0..6);
            let inserted = seq.insert_at(3, 99);
            assert_eq!(inserted.get(3), Some(99));
            assert_eq!(inserted.len(), 7);

            let deleted = inserted.delete_at(3).unwrap();
            assert_eq!(deleted, seq);

            let updated = seq.update(2, 42).unwrap();
            assert_eq!(updated.get(2), Some(42));
            assert!(seq.update(6, 0).is_none());

            let adjusted = seq.adjust(1, |value| value * 10).unwrap();
            assert_eq!(adjusted.get(1), Some(10));
        }
    }

    mod strict_equivalence {
        use super::*;

        #[rstest]
        fn test_round_trip_through_strict() {
            let strict: PersistentSeq<i32> = (0..300).collect();
            let lazy = strict.to_lazy();
            assert_eq!(lazy.to_strict(), strict);
        }

        #[rstest]
        fn test_same_results_after_mixed_operations() {
            let strict: PersistentSeq<i32> = (0..64).collect();
            let lazy: LazySeq<i32> = (0..64).collect();

            let (strict_left, strict_right) = strict.split_at(20);
            let (lazy_left, lazy_right) = lazy.split_at(20);
            let strict_result = strict_right.concat(&strict_left).cons(-1).snoc(64);
            let lazy_result = lazy_right.concat(&lazy_left).cons(-1).snoc(64);

            assert_eq!(strict_result.len(), lazy_result.len());
            for index in 0..strict_result.len() {
                assert_eq!(strict_result.get(index).copied(), lazy_result.get(index));
            }
        }

        #[rstest]
        fn test_iter_matches_strict_iter() {
            let strict: PersistentSeq<i32> = (0..100).collect();
            let lazy = strict.to_lazy();
            let strict_elements: Vec<i32> = strict.iter().copied().collect();
            let lazy_elements: Vec<i32> = lazy.iter().collect();
            assert_eq!(strict_elements, lazy_elements);
        }
    }
}

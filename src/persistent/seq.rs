//! Persistent (immutable) sequence backed by a finger tree.
//!
//! This module provides a persistent sequence based on Finger Trees,
//! as described in Hinze & Paterson's "Finger Trees: A Simple
//! General-purpose Data Structure" (2006).
//!
//! # Overview
//!
//! `PersistentSeq` is a finger-tree sequence that provides:
//!
//! - O(1) `front`, `back`, `len` and `is_empty`
//! - amortized O(1) `cons`/`snoc` and `uncons`/`unsnoc`
//! - O(log n) `get` by index
//! - O(log n) `split_at` and `insert_at`
//! - O(log min(n, m)) concatenation
//!
//! All operations return new sequences without modifying the original,
//! and structural sharing ensures memory efficiency.
//!
//! # Finger Tree Structure
//!
//! A finger tree consists of:
//! - Empty: an empty tree
//! - Single: a tree with a single node
//! - Deep: a tree with left/right "fingers" (Digits) and an inner tree
//!   one rank up
//!
//! The "fingers" provide O(1) access to both ends of the structure; the
//! cached size annotation on every `Deep` and branch node is what makes
//! positional descent logarithmic.
//!
//! # Implementation Note
//!
//! The classical formulation nests the element type (`FingerTree<Node<T>>`
//! inside `FingerTree<T>`), which Rust's monomorphizer cannot expand.
//! Instead, a single `Node<T>` type carries the rank recursion at the
//! value level: a node is either a rank-0 `Leaf` or a branch over
//! reference-counted children one rank down. Digits and trees are
//! homogeneous over `Node<T>`; the uniform-rank invariant is maintained
//! by construction.
//!
//! # Examples
//!
//! ```rust
//! use fingerseq::persistent::PersistentSeq;
//!
//! let seq = PersistentSeq::new()
//!     .snoc(1)
//!     .snoc(2)
//!     .snoc(3);
//!
//! assert_eq!(seq.front(), Some(&1));
//! assert_eq!(seq.back(), Some(&3));
//! assert_eq!(seq.len(), 3);
//!
//! // Structural sharing: the original sequence is preserved
//! let extended = seq.snoc(4);
//! assert_eq!(seq.len(), 3);      // Original unchanged
//! assert_eq!(extended.len(), 4); // New sequence
//! ```
//!
//! # References
//!
//! - Okasaki, "Purely Functional Data Structures" (1998)
//! - Hinze & Paterson, "Finger Trees: A Simple General-purpose Data Structure" (2006)

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;

use arrayvec::ArrayVec;
use smallvec::SmallVec;

use super::ReferenceCounter;

// =============================================================================
// Node
// =============================================================================

/// A rank-tagged tree node.
///
/// `Leaf` holds one element at rank 0. `Node2`/`Node3` hold two or three
/// children of the rank below, plus the cached element count beneath
/// them. Children are reference-counted so cloning a node is O(1) and
/// subtrees are shared, never copied.
pub(super) enum Node<T> {
    Leaf(ReferenceCounter<T>),
    Node2 {
        size: usize,
        first: ReferenceCounter<Node<T>>,
        second: ReferenceCounter<Node<T>>,
    },
    Node3 {
        size: usize,
        first: ReferenceCounter<Node<T>>,
        second: ReferenceCounter<Node<T>>,
        third: ReferenceCounter<Node<T>>,
    },
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Leaf(value) => Self::Leaf(value.clone()),
            Self::Node2 {
                size,
                first,
                second,
            } => Self::Node2 {
                size: *size,
                first: first.clone(),
                second: second.clone(),
            },
            Self::Node3 {
                size,
                first,
                second,
                third,
            } => Self::Node3 {
                size: *size,
                first: first.clone(),
                second: second.clone(),
                third: third.clone(),
            },
        }
    }
}

impl<T> Node<T> {
    pub(super) fn leaf(element: T) -> Self {
        Self::Leaf(ReferenceCounter::new(element))
    }

    pub(super) fn branch2(first: Self, second: Self) -> Self {
        Self::Node2 {
            size: first.size() + second.size(),
            first: ReferenceCounter::new(first),
            second: ReferenceCounter::new(second),
        }
    }

    pub(super) fn branch3(first: Self, second: Self, third: Self) -> Self {
        Self::Node3 {
            size: first.size() + second.size() + third.size(),
            first: ReferenceCounter::new(first),
            second: ReferenceCounter::new(second),
            third: ReferenceCounter::new(third),
        }
    }

    /// Number of elements beneath this node.
    pub(super) const fn size(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Node2 { size, .. } | Self::Node3 { size, .. } => *size,
        }
    }

    /// Leftmost element beneath this node.
    pub(super) fn first_element(&self) -> &T {
        match self {
            Self::Leaf(value) => value.as_ref(),
            Self::Node2 { first, .. } | Self::Node3 { first, .. } => first.first_element(),
        }
    }

    /// Rightmost element beneath this node.
    pub(super) fn last_element(&self) -> &T {
        match self {
            Self::Leaf(value) => value.as_ref(),
            Self::Node2 { second, .. } => second.last_element(),
            Self::Node3 { third, .. } => third.last_element(),
        }
    }

    /// Positional descent guided by the cached child sizes.
    pub(super) fn get(&self, index: usize) -> Option<&T> {
        match self {
            Self::Leaf(value) => (index == 0).then_some(value.as_ref()),
            Self::Node2 { first, second, .. } => {
                let first_size = first.size();
                if index < first_size {
                    first.get(index)
                } else {
                    second.get(index - first_size)
                }
            }
            Self::Node3 {
                first,
                second,
                third,
                ..
            } => {
                let first_size = first.size();
                if index < first_size {
                    return first.get(index);
                }
                let index = index - first_size;
                let second_size = second.size();
                if index < second_size {
                    second.get(index)
                } else {
                    third.get(index - second_size)
                }
            }
        }
    }

    /// Like [`Node::get`] but returns a shared handle to the element, for
    /// callers that cannot hand out borrows (the lazy spine).
    pub(super) fn get_shared(&self, index: usize) -> Option<ReferenceCounter<T>> {
        match self {
            Self::Leaf(value) => (index == 0).then(|| value.clone()),
            Self::Node2 { first, second, .. } => {
                let first_size = first.size();
                if index < first_size {
                    first.get_shared(index)
                } else {
                    second.get_shared(index - first_size)
                }
            }
            Self::Node3 {
                first,
                second,
                third,
                ..
            } => {
                let first_size = first.size();
                if index < first_size {
                    return first.get_shared(index);
                }
                let index = index - first_size;
                let second_size = second.size();
                if index < second_size {
                    second.get_shared(index)
                } else {
                    third.get_shared(index - second_size)
                }
            }
        }
    }

    /// Explodes a branch node into a digit of its children.
    ///
    /// Used when a digit underflows and a node is pulled up out of the
    /// inner tree. Leaves never sit in an inner tree, so exploding one is
    /// a construction bug.
    pub(super) fn to_digit(&self) -> Digit<T> {
        match self {
            Self::Leaf(_) => unreachable!("a leaf node cannot be exploded into a digit"),
            Self::Node2 { first, second, .. } => {
                Digit::Two(first.as_ref().clone(), second.as_ref().clone())
            }
            Self::Node3 {
                first,
                second,
                third,
                ..
            } => Digit::Three(
                first.as_ref().clone(),
                second.as_ref().clone(),
                third.as_ref().clone(),
            ),
        }
    }
}

// =============================================================================
// Digit
// =============================================================================

/// A "finger": 1 to 4 nodes of a single rank at the boundary of a tree.
pub(super) enum Digit<T> {
    One(Node<T>),
    Two(Node<T>, Node<T>),
    Three(Node<T>, Node<T>, Node<T>),
    Four(Node<T>, Node<T>, Node<T>, Node<T>),
}

impl<T> Clone for Digit<T> {
    fn clone(&self) -> Self {
        match self {
            Self::One(first) => Self::One(first.clone()),
            Self::Two(first, second) => Self::Two(first.clone(), second.clone()),
            Self::Three(first, second, third) => {
                Self::Three(first.clone(), second.clone(), third.clone())
            }
            Self::Four(first, second, third, fourth) => {
                Self::Four(first.clone(), second.clone(), third.clone(), fourth.clone())
            }
        }
    }
}

impl<T> Digit<T> {
    /// Total element count beneath the digit.
    pub(super) const fn size(&self) -> usize {
        match self {
            Self::One(first) => first.size(),
            Self::Two(first, second) => first.size() + second.size(),
            Self::Three(first, second, third) => first.size() + second.size() + third.size(),
            Self::Four(first, second, third, fourth) => {
                first.size() + second.size() + third.size() + fourth.size()
            }
        }
    }

    pub(super) const fn head(&self) -> &Node<T> {
        match self {
            Self::One(first)
            | Self::Two(first, _)
            | Self::Three(first, _, _)
            | Self::Four(first, _, _, _) => first,
        }
    }

    pub(super) const fn last(&self) -> &Node<T> {
        match self {
            Self::One(first) => first,
            Self::Two(_, second) => second,
            Self::Three(_, _, third) => third,
            Self::Four(_, _, _, fourth) => fourth,
        }
    }

    /// Adds a node at the front; `None` when the digit is already full.
    pub(super) fn prepend(&self, node: Node<T>) -> Option<Self> {
        match self {
            Self::One(first) => Some(Self::Two(node, first.clone())),
            Self::Two(first, second) => Some(Self::Three(node, first.clone(), second.clone())),
            Self::Three(first, second, third) => Some(Self::Four(
                node,
                first.clone(),
                second.clone(),
                third.clone(),
            )),
            Self::Four(..) => None,
        }
    }

    /// Adds a node at the back; `None` when the digit is already full.
    pub(super) fn append(&self, node: Node<T>) -> Option<Self> {
        match self {
            Self::One(first) => Some(Self::Two(first.clone(), node)),
            Self::Two(first, second) => Some(Self::Three(first.clone(), second.clone(), node)),
            Self::Three(first, second, third) => Some(Self::Four(
                first.clone(),
                second.clone(),
                third.clone(),
                node,
            )),
            Self::Four(..) => None,
        }
    }

    /// Removes the front node; the digit part is `None` when it was the
    /// only one.
    pub(super) fn pop_front(&self) -> (Option<Self>, Node<T>) {
        match self {
            Self::One(first) => (None, first.clone()),
            Self::Two(first, second) => (Some(Self::One(second.clone())), first.clone()),
            Self::Three(first, second, third) => (
                Some(Self::Two(second.clone(), third.clone())),
                first.clone(),
            ),
            Self::Four(first, second, third, fourth) => (
                Some(Self::Three(second.clone(), third.clone(), fourth.clone())),
                first.clone(),
            ),
        }
    }

    /// Removes the back node; the digit part is `None` when it was the
    /// only one.
    pub(super) fn pop_back(&self) -> (Option<Self>, Node<T>) {
        match self {
            Self::One(first) => (None, first.clone()),
            Self::Two(first, second) => (Some(Self::One(first.clone())), second.clone()),
            Self::Three(first, second, third) => (
                Some(Self::Two(first.clone(), second.clone())),
                third.clone(),
            ),
            Self::Four(first, second, third, fourth) => (
                Some(Self::Three(first.clone(), second.clone(), third.clone())),
                fourth.clone(),
            ),
        }
    }

    /// References to the nodes, front to back.
    pub(super) fn node_refs(&self) -> ArrayVec<&Node<T>, 4> {
        let mut refs = ArrayVec::new();
        match self {
            Self::One(first) => {
                refs.push(first);
            }
            Self::Two(first, second) => {
                refs.push(first);
                refs.push(second);
            }
            Self::Three(first, second, third) => {
                refs.push(first);
                refs.push(second);
                refs.push(third);
            }
            Self::Four(first, second, third, fourth) => {
                refs.push(first);
                refs.push(second);
                refs.push(third);
                refs.push(fourth);
            }
        }
        refs
    }

    /// Rebuilds a digit from a slice of at most four nodes.
    pub(super) fn from_nodes(nodes: &[Node<T>]) -> Option<Self> {
        match nodes {
            [] => None,
            [first] => Some(Self::One(first.clone())),
            [first, second] => Some(Self::Two(first.clone(), second.clone())),
            [first, second, third] => {
                Some(Self::Three(first.clone(), second.clone(), third.clone()))
            }
            [first, second, third, fourth] => Some(Self::Four(
                first.clone(),
                second.clone(),
                third.clone(),
                fourth.clone(),
            )),
            _ => unreachable!("a digit cannot hold more than four nodes"),
        }
    }

    /// Positional descent through the digit's nodes.
    pub(super) fn get(&self, index: usize) -> Option<&T> {
        let mut index = index;
        for node in self.node_refs() {
            let node_size = node.size();
            if index < node_size {
                return node.get(index);
            }
            index -= node_size;
        }
        None
    }

    /// Like [`Digit::get`] but returns a shared handle.
    pub(super) fn get_shared(&self, index: usize) -> Option<ReferenceCounter<T>> {
        let mut index = index;
        for node in self.node_refs() {
            let node_size = node.size();
            if index < node_size {
                return node.get_shared(index);
            }
            index -= node_size;
        }
        None
    }

    /// Splits the digit around the node containing `index`.
    ///
    /// Returns the nodes strictly before, the hit node, and the nodes
    /// strictly after. `index` must fall inside the digit.
    pub(super) fn split(&self, index: usize) -> (Option<Self>, Node<T>, Option<Self>) {
        let refs = self.node_refs();
        let mut offset = 0;
        for (position, node) in refs.iter().enumerate() {
            let node_size = node.size();
            if index < offset + node_size {
                let owned: ArrayVec<Node<T>, 4> = refs.iter().map(|node| (*node).clone()).collect();
                let before = Self::from_nodes(&owned[..position]);
                let after = Self::from_nodes(&owned[position + 1..]);
                return (before, (*node).clone(), after);
            }
            offset += node_size;
        }
        unreachable!("split index does not fall inside the digit")
    }
}

// =============================================================================
// FingerTree
// =============================================================================

/// The recursive tree shape. The `spine` of a `Deep` tree holds nodes one
/// rank above the digits, so each nesting level deepens the 2-3 branches
/// hanging off the fingers.
pub(super) enum FingerTree<T> {
    Empty,
    Single(Node<T>),
    Deep {
        size: usize,
        left: Digit<T>,
        spine: ReferenceCounter<FingerTree<T>>,
        right: Digit<T>,
    },
}

impl<T> Clone for FingerTree<T> {
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

impl<T> FingerTree<T> {
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

    pub(super) fn push_front(&self, node: Node<T>) -> Self {
        match self {
            Self::Empty => Self::Single(node),
            Self::Single(existing) => Self::Deep {
                size: node.size() + existing.size(),
                left: Digit::One(node),
                spine: ReferenceCounter::new(Self::Empty),
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
                        Self::Deep {
                            size: new_size,
                            left: Digit::Two(node, first.clone()),
                            spine: ReferenceCounter::new(spine.push_front(overflow)),
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
                spine: ReferenceCounter::new(Self::Empty),
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
                        Self::Deep {
                            size: new_size,
                            left: left.clone(),
                            spine: ReferenceCounter::new(spine.push_back(overflow)),
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
                let tree = rest.map_or_else(
                    || deep_left(None, spine, right),
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
                let tree = rest.map_or_else(
                    || deep_right(left, spine, None),
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

    pub(super) fn get(&self, index: usize) -> Option<&T> {
        match self {
            Self::Empty => None,
            Self::Single(node) => node.get(index),
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
                    return left.get(index);
                }
                let index = index - left_size;
                let spine_size = spine.size();
                if index < spine_size {
                    spine.get(index)
                } else {
                    right.get(index - spine_size)
                }
            }
        }
    }

    /// Splits the tree around the node containing `index`.
    ///
    /// Returns everything strictly before that node, the node itself, and
    /// everything strictly after. `index` must satisfy
    /// `index < self.size()`; the caller handles clamping.
    pub(super) fn split(&self, index: usize) -> (Self, Node<T>, Self) {
        match self {
            Self::Empty => unreachable!("split descended into an empty tree"),
            Self::Single(node) => (Self::Empty, node.clone(), Self::Empty),
            Self::Deep {
                left, spine, right, ..
            } => {
                let left_size = left.size();
                if index < left_size {
                    let (before, hit, after) = left.split(index);
                    return (
                        before.map_or(Self::Empty, |digit| collapse_digit(&digit, true)),
                        hit,
                        deep_left(after, spine, right),
                    );
                }
                let index = index - left_size;
                let spine_size = spine.size();
                if index < spine_size {
                    let (spine_before, node, spine_after) = spine.split(index);
                    let (before, hit, after) = node.to_digit().split(index - spine_before.size());
                    return (
                        deep_right(left, &ReferenceCounter::new(spine_before), before),
                        hit,
                        deep_left(after, &ReferenceCounter::new(spine_after), right),
                    );
                }
                let index = index - spine_size;
                let (before, hit, after) = right.split(index);
                (
                    deep_right(left, spine, before),
                    hit,
                    after.map_or(Self::Empty, |digit| collapse_digit(&digit, false)),
                )
            }
        }
    }
}

/// Rebuilds a `Deep` tree whose left digit may have vanished.
///
/// Pulls a node up out of the spine when needed; when the spine is empty
/// too, the tree degenerates to the right digit alone.
fn deep_left<T>(
    left: Option<Digit<T>>,
    spine: &ReferenceCounter<FingerTree<T>>,
    right: &Digit<T>,
) -> FingerTree<T> {
    left.map_or_else(
        || {
            spine.pop_front().map_or_else(
                || collapse_digit(right, true),
                |(node, rest)| FingerTree::Deep {
                    size: node.size() + rest.size() + right.size(),
                    left: node.to_digit(),
                    spine: ReferenceCounter::new(rest),
                    right: right.clone(),
                },
            )
        },
        |digit| FingerTree::Deep {
            size: digit.size() + spine.size() + right.size(),
            left: digit,
            spine: spine.clone(),
            right: right.clone(),
        },
    )
}

/// Mirror of [`deep_left`] for a vanished right digit.
fn deep_right<T>(
    left: &Digit<T>,
    spine: &ReferenceCounter<FingerTree<T>>,
    right: Option<Digit<T>>,
) -> FingerTree<T> {
    right.map_or_else(
        || {
            spine.pop_back().map_or_else(
                || collapse_digit(left, false),
                |(rest, node)| FingerTree::Deep {
                    size: left.size() + rest.size() + node.size(),
                    left: left.clone(),
                    spine: ReferenceCounter::new(rest),
                    right: node.to_digit(),
                },
            )
        },
        |digit| FingerTree::Deep {
            size: left.size() + spine.size() + digit.size(),
            left: left.clone(),
            spine: spine.clone(),
            right: digit,
        },
    )
}

/// Turns a lone digit into a well-formed tree.
///
/// `wide_left` selects which side keeps the surplus when the digit has
/// three or four nodes: a vanished left side keeps all but the last node
/// on the left, a vanished right side keeps all but the first on the
/// right.
fn collapse_digit<T>(digit: &Digit<T>, wide_left: bool) -> FingerTree<T> {
    let refs = digit.node_refs();
    match refs.as_slice() {
        [first] => FingerTree::Single((*first).clone()),
        [first, second] => FingerTree::Deep {
            size: digit.size(),
            left: Digit::One((*first).clone()),
            spine: ReferenceCounter::new(FingerTree::Empty),
            right: Digit::One((*second).clone()),
        },
        [first, second, third] if wide_left => FingerTree::Deep {
            size: digit.size(),
            left: Digit::Two((*first).clone(), (*second).clone()),
            spine: ReferenceCounter::new(FingerTree::Empty),
            right: Digit::One((*third).clone()),
        },
        [first, second, third] => FingerTree::Deep {
            size: digit.size(),
            left: Digit::One((*first).clone()),
            spine: ReferenceCounter::new(FingerTree::Empty),
            right: Digit::Two((*second).clone(), (*third).clone()),
        },
        [first, second, third, fourth] if wide_left => FingerTree::Deep {
            size: digit.size(),
            left: Digit::Three((*first).clone(), (*second).clone(), (*third).clone()),
            spine: ReferenceCounter::new(FingerTree::Empty),
            right: Digit::One((*fourth).clone()),
        },
        [first, second, third, fourth] => FingerTree::Deep {
            size: digit.size(),
            left: Digit::One((*first).clone()),
            spine: ReferenceCounter::new(FingerTree::Empty),
            right: Digit::Three((*second).clone(), (*third).clone(), (*fourth).clone()),
        },
        _ => unreachable!("a digit holds between one and four nodes"),
    }
}

// =============================================================================
// Concatenation
// =============================================================================

/// Scratch buffer for the boundary nodes of a concatenation. Two digits
/// plus a carried middle never exceed twelve nodes.
pub(super) type NodeBuffer<T> = SmallVec<[Node<T>; 12]>;

/// Concatenates `first ++ middle ++ second`, where `middle` carries the
/// regrouped boundary nodes of the enclosing rank.
pub(super) fn app3<T>(
    first: &FingerTree<T>,
    middle: NodeBuffer<T>,
    second: &FingerTree<T>,
) -> FingerTree<T> {
    match (first, second) {
        (FingerTree::Empty, _) => prepend_nodes(middle, second),
        (_, FingerTree::Empty) => append_nodes(first, middle),
        (FingerTree::Single(node), _) => prepend_nodes(middle, second).push_front(node.clone()),
        (_, FingerTree::Single(node)) => append_nodes(first, middle).push_back(node.clone()),
        (
            FingerTree::Deep {
                size: first_size,
                left: first_left,
                spine: first_spine,
                right: first_right,
            },
            FingerTree::Deep {
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
            let spine = app3(
                first_spine.as_ref(),
                regroup(boundary),
                second_spine.as_ref(),
            );
            FingerTree::Deep {
                size: first_size + middle_size + second_size,
                left: first_left.clone(),
                spine: ReferenceCounter::new(spine),
                right: second_right.clone(),
            }
        }
    }
}

fn prepend_nodes<T>(nodes: NodeBuffer<T>, tree: &FingerTree<T>) -> FingerTree<T> {
    nodes
        .into_iter()
        .rev()
        .fold(tree.clone(), |tree, node| tree.push_front(node))
}

fn append_nodes<T>(tree: &FingerTree<T>, nodes: NodeBuffer<T>) -> FingerTree<T> {
    nodes
        .into_iter()
        .fold(tree.clone(), |tree, node| tree.push_back(node))
}

/// Regroups a run of 2 to 12 same-rank nodes into branch nodes one rank
/// up, each holding exactly two or three children.
///
/// Greedy: runs of three are taken while more than four remain, then the
/// tail is closed with `2`, `3`, or `2+2`. A remainder of one cannot
/// occur for any input in range.
pub(super) fn regroup<T>(nodes: NodeBuffer<T>) -> NodeBuffer<T> {
    let mut remaining = nodes.len();
    let mut iter = nodes.into_iter();
    let mut next =
        move || iter.next().unwrap_or_else(|| unreachable!("regroup ran past its buffer"));
    let mut grouped = NodeBuffer::new();
    while remaining > 0 {
        match remaining {
            1 => unreachable!("concatenation regrouping produced a run of one"),
            2 => {
                grouped.push(Node::branch2(next(), next()));
                remaining = 0;
            }
            3 => {
                grouped.push(Node::branch3(next(), next(), next()));
                remaining = 0;
            }
            4 => {
                grouped.push(Node::branch2(next(), next()));
                grouped.push(Node::branch2(next(), next()));
                remaining = 0;
            }
            _ => {
                grouped.push(Node::branch3(next(), next(), next()));
                remaining -= 3;
            }
        }
    }
    grouped
}

// =============================================================================
// PersistentSeq
// =============================================================================

/// A persistent (immutable) sequence.
///
/// Implemented as a size-annotated finger tree: both ends are reachable
/// in constant time through the digits, and the cached sizes turn
/// indexing, splitting, and concatenation into logarithmic descents.
///
/// # Time Complexity
///
/// | Operation   | Complexity |
/// |-------------|------------|
/// | `new`       | O(1)       |
/// | `singleton` | O(1)       |
/// | `cons`      | amortized O(1) |
/// | `snoc`      | amortized O(1) |
/// | `uncons`    | amortized O(1) |
/// | `unsnoc`    | amortized O(1) |
/// | `front`     | O(1)       |
/// | `back`      | O(1)       |
/// | `len`       | O(1)       |
/// | `get`       | O(log n)   |
/// | `split_at`  | O(log n)   |
/// | `insert_at` | O(log n)   |
/// | `concat`    | O(log min(n, m)) |
/// | `delete_at` | O(n)       |
/// | `update`    | O(n)       |
///
/// `delete_at`, `update`, and `adjust` are deliberate linear rebuilds: a
/// persistent structure has no in-place single-element mutation, and the
/// asymmetry with the logarithmic operations is part of the contract.
///
/// # Examples
///
/// ```rust
/// use fingerseq::persistent::PersistentSeq;
///
/// let seq = PersistentSeq::singleton(42);
/// assert_eq!(seq.front(), Some(&42));
/// assert_eq!(seq.len(), 1);
/// ```
pub struct PersistentSeq<T> {
    pub(super) tree: FingerTree<T>,
}

impl<T> Clone for PersistentSeq<T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<T> PersistentSeq<T> {
    /// Creates a new empty sequence.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tree: FingerTree::Empty,
        }
    }

    /// Creates a sequence containing a single element.
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self {
            tree: FingerTree::Single(Node::leaf(element)),
        }
    }

    /// Returns `true` if the sequence contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the sequence.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns a reference to the first element, if any.
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.tree.front()
    }

    /// Returns a reference to the last element, if any.
    #[inline]
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.tree.back()
    }

    /// Prepends an element. Amortized O(1).
    #[must_use]
    pub fn cons(&self, element: T) -> Self {
        Self {
            tree: self.tree.push_front(Node::leaf(element)),
        }
    }

    /// Appends an element. Amortized O(1).
    #[must_use]
    pub fn snoc(&self, element: T) -> Self {
        Self {
            tree: self.tree.push_back(Node::leaf(element)),
        }
    }

    /// Removes the first element, returning it together with the rest of
    /// the sequence. `None` on an empty sequence.
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
    /// O(log n).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.tree.get(index)
    }

    /// Alias for [`get`](Self::get).
    #[inline]
    #[must_use]
    pub fn lookup(&self, index: usize) -> Option<&T> {
        self.get(index)
    }

    /// Splits into the elements strictly before `index` and the elements
    /// from `index` onward. Out-of-range indices are clamped, so
    /// `split_at(0)` is `(empty, all)` and `split_at(len)` is
    /// `(all, empty)`. O(log n).
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

    /// Concatenates this sequence with another. O(log min(n, m)).
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
    ///
    /// Linear rebuild: every element before and after the index is folded
    /// into a fresh sequence.
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
                rebuilt = rebuilt.snoc(element.clone());
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
                function(element)
            } else {
                element.clone()
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

    /// Creates an iterator over references to the elements, front to
    /// back.
    #[must_use]
    pub const fn iter(&self) -> PersistentSeqIterator<'_, T> {
        PersistentSeqIterator {
            seq: self,
            front_index: 0,
            back_index: self.tree.size(),
        }
    }
}

impl<T> Default for PersistentSeq<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> PartialEq for PersistentSeq<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for PersistentSeq<T> {}

impl<T: fmt::Debug> fmt::Debug for PersistentSeq<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Hash> Hash for PersistentSeq<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T> FromIterator<T> for PersistentSeq<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut seq = Self::new();
        for element in iter {
            seq = seq.snoc(element);
        }
        seq
    }
}

impl<T: Clone> IntoIterator for PersistentSeq<T> {
    type Item = T;
    type IntoIter = PersistentSeqIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        PersistentSeqIntoIterator { seq: self }
    }
}

impl<'a, T> IntoIterator for &'a PersistentSeq<T> {
    type Item = &'a T;
    type IntoIter = PersistentSeqIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing iterator over a [`PersistentSeq`].
///
/// Each step is a fresh O(log n) positional descent, trading per-step
/// cost for a structure-independent cursor that can walk both ends.
pub struct PersistentSeqIterator<'a, T> {
    seq: &'a PersistentSeq<T>,
    front_index: usize,
    back_index: usize,
}

impl<'a, T> Iterator for PersistentSeqIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front_index >= self.back_index {
            return None;
        }
        let result = self.seq.tree.get(self.front_index);
        self.front_index += 1;
        result
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back_index - self.front_index;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for PersistentSeqIterator<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front_index >= self.back_index {
            return None;
        }
        self.back_index -= 1;
        self.seq.tree.get(self.back_index)
    }
}

impl<T> ExactSizeIterator for PersistentSeqIterator<'_, T> {}

/// Consuming iterator over a [`PersistentSeq`], driven by `uncons`.
pub struct PersistentSeqIntoIterator<T> {
    seq: PersistentSeq<T>,
}

impl<T: Clone> Iterator for PersistentSeqIntoIterator<T> {
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

impl<T: Clone> ExactSizeIterator for PersistentSeqIntoIterator<T> {}

// =============================================================================
// Serde
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for PersistentSeq<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for element in self {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct PersistentSeqVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<T> PersistentSeqVisitor<T> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for PersistentSeqVisitor<T>
where
    T: serde::Deserialize<'de>,
{
    type Value = PersistentSeq<T>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut elements = PersistentSeq::new();
        while let Some(element) = seq.next_element()? {
            elements = elements.snoc(element);
        }
        Ok(elements)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for PersistentSeq<T>
where
    T: serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(PersistentSeqVisitor::new())
    }
}

// =============================================================================
// Thread-safety assertions
// =============================================================================

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentSeq<i32>: Send, Sync);
#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(PersistentSeq<i32>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================

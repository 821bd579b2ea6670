//! Unit tests for `LazySeq`.
//!
//! The deferred spine is an implementation detail, so these tests pin the
//! public contract: identical observable behavior to the strict
//! sequence, cheap non-forcing queries, and correct interop conversions.

use fingerseq::persistent::{LazySeq, PersistentSeq};
use rstest::rstest;

// =============================================================================
// Construction
// =============================================================================

#[rstest]
fn test_new_creates_empty_seq() {
    let seq: LazySeq<i32> = LazySeq::new();
    assert!(seq.is_empty());
    assert_eq!(seq.len(), 0);
    assert_eq!(seq.front(), None);
    assert_eq!(seq.back(), None);
}

#[rstest]
fn test_singleton_holds_one_element() {
    let seq = LazySeq::singleton(42);
    assert_eq!(seq.len(), 1);
    assert_eq!(seq.front(), Some(&42));
    assert_eq!(seq.get(0), Some(42));
}

// =============================================================================
// The three-element scenario
// =============================================================================

#[rstest]
fn test_cons_three_elements_scenario() {
    let seq = LazySeq::new().cons(3).cons(2).cons(1);

    assert_eq!(seq.len(), 3);
    assert_eq!(seq.lookup(0), Some(1));
    assert_eq!(seq.lookup(1), Some(2));
    assert_eq!(seq.lookup(2), Some(3));

    let (left, right) = seq.split_at(1);
    assert_eq!(left.iter().collect::<Vec<i32>>(), vec![1]);
    assert_eq!(right.iter().collect::<Vec<i32>>(), vec![2, 3]);

    assert_eq!(left.append(&right), seq);
}

// =============================================================================
// The five-plus-seven scenario
// =============================================================================

#[rstest]
fn test_append_five_and_seven() {
    let first: LazySeq<i32> = (0..5).collect();
    let second: LazySeq<i32> = (100..107).collect();

    let joined = first.append(&second);
    assert_eq!(joined.len(), 12);
    assert_eq!(joined.get(5), second.get(0));
}

// =============================================================================
// Deferred pipelines
// =============================================================================

#[rstest]
fn test_chained_concats_then_single_lookup() {
    // Many structural operations, one consuming one: the pipeline stays
    // correct no matter how little of it is ever forced.
    let mut joined = LazySeq::new();
    for chunk in 0..16 {
        let chunk_seq: LazySeq<i32> = (chunk * 100..chunk * 100 + 100).collect();
        joined = joined.concat(&chunk_seq);
    }
    assert_eq!(joined.len(), 1600);
    assert_eq!(joined.get(1234), Some(1234));
}

#[rstest]
fn test_len_and_ends_before_any_descent() {
    let first: LazySeq<i32> = (0..500).collect();
    let second: LazySeq<i32> = (500..1000).collect();
    let joined = first.concat(&second);

    // All three are strict reads off the top level.
    assert_eq!(joined.len(), 1000);
    assert_eq!(joined.front(), Some(&0));
    assert_eq!(joined.back(), Some(&999));
}

// =============================================================================
// End access
// =============================================================================

#[rstest]
fn test_uncons_walks_front_to_back() {
    let seq: LazySeq<i32> = (0..25).collect();
    let mut current = seq;
    let mut seen = Vec::new();
    while let Some((element, rest)) = current.uncons() {
        seen.push(element);
        current = rest;
    }
    assert_eq!(seen, (0..25).collect::<Vec<i32>>());
}

#[rstest]
fn test_unsnoc_walks_back_to_front() {
    let seq: LazySeq<i32> = (0..25).collect();
    let mut current = seq;
    let mut seen = Vec::new();
    while let Some((rest, element)) = current.unsnoc() {
        seen.push(element);
        current = rest;
    }
    assert_eq!(seen, (0..25).rev().collect::<Vec<i32>>());
}

// =============================================================================
// Clamping and absence
// =============================================================================

#[rstest]
fn test_get_out_of_range_is_absent() {
    let seq: LazySeq<i32> = (0..10).collect();
    assert_eq!(seq.get(10), None);
    assert_eq!(seq.get(usize::MAX), None);
}

#[rstest]
fn test_split_at_clamps() {
    let seq: LazySeq<i32> = (0..10).collect();

    let (left, right) = seq.split_at(0);
    assert!(left.is_empty());
    assert_eq!(right, seq);

    let (left, right) = seq.split_at(9999);
    assert_eq!(left, seq);
    assert!(right.is_empty());
}

#[rstest]
fn test_point_edit_absence() {
    let seq: LazySeq<i32> = (0..3).collect();
    assert!(seq.delete_at(3).is_none());
    assert!(seq.update(3, 0).is_none());
    assert!(seq.adjust(3, |value| *value).is_none());
}

// =============================================================================
// Interop with the strict representation
// =============================================================================

#[rstest]
fn test_round_trip_conversions() {
    let strict: PersistentSeq<i32> = (0..123).collect();

    let lazy = strict.to_lazy();
    assert_eq!(lazy.len(), strict.len());
    assert_eq!(lazy.to_strict(), strict);

    let lazy_again: LazySeq<i32> = strict.clone().into();
    let strict_again: PersistentSeq<i32> = lazy_again.into();
    assert_eq!(strict_again, strict);
}

#[rstest]
fn test_lazy_operations_after_conversion() {
    let strict: PersistentSeq<i32> = (0..64).collect();
    let lazy = strict.to_lazy();

    let (left, right) = lazy.split_at(32);
    let swapped = right.concat(&left);

    assert_eq!(swapped.get(0), Some(32));
    assert_eq!(swapped.get(32), Some(0));
    assert_eq!(swapped.len(), 64);
}

// =============================================================================
// Observable equality with the strict sequence
// =============================================================================

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
#[case(13)]
#[case(64)]
#[case(257)]
fn test_matches_strict_for_every_size(#[case] size: i32) {
    let strict: PersistentSeq<i32> = (0..size).collect();
    let lazy: LazySeq<i32> = (0..size).collect();

    assert_eq!(strict.len(), lazy.len());
    for index in 0..usize::try_from(size).unwrap() {
        assert_eq!(strict.get(index).copied(), lazy.get(index));
    }
    assert_eq!(strict.front(), lazy.front());
    assert_eq!(strict.back(), lazy.back());
}

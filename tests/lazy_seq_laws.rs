//! Property-based equivalence tests between `LazySeq` and
//! `PersistentSeq`.
//!
//! The lazy structure's correctness is defined by equivalence to the
//! strict structure under forcing: any sequence of operations applied to
//! both representations must produce observably equal results.

use fingerseq::persistent::{LazySeq, PersistentSeq};
use proptest::prelude::*;

// =============================================================================
// Operation model
// =============================================================================

/// One structural operation, applied identically to both representations.
#[derive(Debug, Clone)]
enum Operation {
    Cons(i32),
    Snoc(i32),
    Uncons,
    Unsnoc,
    SplitKeepLeft(usize),
    SplitKeepRight(usize),
    ConcatRange(i32, u8),
    InsertAt(usize, i32),
    DeleteAt(usize),
    Update(usize, i32),
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        any::<i32>().prop_map(Operation::Cons),
        any::<i32>().prop_map(Operation::Snoc),
        Just(Operation::Uncons),
        Just(Operation::Unsnoc),
        (0usize..64).prop_map(Operation::SplitKeepLeft),
        (0usize..64).prop_map(Operation::SplitKeepRight),
        (any::<i32>(), 0u8..16).prop_map(|(start, count)| Operation::ConcatRange(start, count)),
        ((0usize..64), any::<i32>()).prop_map(|(index, element)| Operation::InsertAt(index, element)),
        (0usize..64).prop_map(Operation::DeleteAt),
        ((0usize..64), any::<i32>()).prop_map(|(index, element)| Operation::Update(index, element)),
    ]
}

fn apply_strict(seq: PersistentSeq<i32>, operation: &Operation) -> PersistentSeq<i32> {
    match operation {
        Operation::Cons(element) => seq.cons(*element),
        Operation::Snoc(element) => seq.snoc(*element),
        Operation::Uncons => seq.uncons().map_or(seq, |(_, rest)| rest),
        Operation::Unsnoc => seq.unsnoc().map_or(seq, |(rest, _)| rest),
        Operation::SplitKeepLeft(index) => seq.split_at(*index).0,
        Operation::SplitKeepRight(index) => seq.split_at(*index).1,
        Operation::ConcatRange(start, count) => {
            let other: PersistentSeq<i32> = (*start..start.saturating_add(i32::from(*count))).collect();
            seq.concat(&other)
        }
        Operation::InsertAt(index, element) => seq.insert_at(*index, *element),
        Operation::DeleteAt(index) => seq.delete_at(*index).unwrap_or(seq),
        Operation::Update(index, element) => seq.update(*index, *element).unwrap_or(seq),
    }
}

fn apply_lazy(seq: LazySeq<i32>, operation: &Operation) -> LazySeq<i32> {
    match operation {
        Operation::Cons(element) => seq.cons(*element),
        Operation::Snoc(element) => seq.snoc(*element),
        Operation::Uncons => seq.uncons().map_or(seq, |(_, rest)| rest),
        Operation::Unsnoc => seq.unsnoc().map_or(seq, |(rest, _)| rest),
        Operation::SplitKeepLeft(index) => seq.split_at(*index).0,
        Operation::SplitKeepRight(index) => seq.split_at(*index).1,
        Operation::ConcatRange(start, count) => {
            let other: LazySeq<i32> = (*start..start.saturating_add(i32::from(*count))).collect();
            seq.concat(&other)
        }
        Operation::InsertAt(index, element) => seq.insert_at(*index, *element),
        Operation::DeleteAt(index) => seq.delete_at(*index).unwrap_or(seq),
        Operation::Update(index, element) => seq.update(*index, *element).unwrap_or(seq),
    }
}

fn strict_to_vec(seq: &PersistentSeq<i32>) -> Vec<i32> {
    seq.iter().copied().collect()
}

fn lazy_to_vec(seq: &LazySeq<i32>) -> Vec<i32> {
    seq.iter().collect()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_operation_sequences_agree(
        seed in prop::collection::vec(any::<i32>(), 0..32),
        operations in prop::collection::vec(operation_strategy(), 0..24)
    ) {
        let mut strict: PersistentSeq<i32> = seed.clone().into_iter().collect();
        let mut lazy: LazySeq<i32> = seed.into_iter().collect();

        for operation in &operations {
            strict = apply_strict(strict, operation);
            lazy = apply_lazy(lazy, operation);
            prop_assert_eq!(strict.len(), lazy.len());
        }

        prop_assert_eq!(strict_to_vec(&strict), lazy_to_vec(&lazy));
    }

    #[test]
    fn prop_forcing_fully_equals_strict(
        seed in prop::collection::vec(any::<i32>(), 0..48),
        operations in prop::collection::vec(operation_strategy(), 0..12)
    ) {
        let mut strict: PersistentSeq<i32> = seed.clone().into_iter().collect();
        let mut lazy: LazySeq<i32> = seed.into_iter().collect();

        for operation in &operations {
            strict = apply_strict(strict, operation);
            lazy = apply_lazy(lazy, operation);
        }

        // to_strict forces every suspended cell; the result must be the
        // tree the strict pipeline built, observably.
        prop_assert_eq!(lazy.to_strict(), strict);
    }

    #[test]
    fn prop_conversion_round_trip(seed in prop::collection::vec(any::<i32>(), 0..64)) {
        let strict: PersistentSeq<i32> = seed.into_iter().collect();
        let lazy = strict.to_lazy();
        prop_assert_eq!(lazy.to_strict(), strict);
    }

    #[test]
    fn prop_lazy_get_matches_strict_get(
        seed in prop::collection::vec(any::<i32>(), 0..64),
        index in 0usize..80
    ) {
        let strict: PersistentSeq<i32> = seed.clone().into_iter().collect();
        let lazy: LazySeq<i32> = seed.into_iter().collect();
        prop_assert_eq!(strict.get(index).copied(), lazy.get(index));
    }

    #[test]
    fn prop_lazy_split_append_inverse(
        seed in prop::collection::vec(any::<i32>(), 0..64),
        index in 0usize..80
    ) {
        let lazy: LazySeq<i32> = seed.clone().into_iter().collect();
        let (left, right) = lazy.split_at(index);
        prop_assert_eq!(lazy_to_vec(&left.concat(&right)), seed);
    }

    #[test]
    fn prop_lazy_append_associativity(
        first in prop::collection::vec(any::<i32>(), 0..24),
        second in prop::collection::vec(any::<i32>(), 0..24),
        third in prop::collection::vec(any::<i32>(), 0..24)
    ) {
        let a: LazySeq<i32> = first.into_iter().collect();
        let b: LazySeq<i32> = second.into_iter().collect();
        let c: LazySeq<i32> = third.into_iter().collect();
        let left = a.append(&b).append(&c);
        let right = a.append(&b.append(&c));
        prop_assert_eq!(left, right);
    }
}

use std::collections::BTreeSet;

use proptest::prelude::*;
use ostreap::OSTreapSet;

// ─── Bounds ──────────────────────────────────────────────────────────────────

#[test]
fn lower_bound_ranks_on_odd_keys() {
    let set = OSTreapSet::from([1, 3, 5, 7]);

    // Probing every value between and around the keys.
    let expected = [0, 0, 1, 1, 2, 2, 3, 3, 4];
    for (probe, &rank) in (0..=8).zip(&expected) {
        assert_eq!(set.lower_bound(&probe).rank(), rank, "lower_bound({probe})");
    }

    // Rank 4 is the end position.
    assert!(set.lower_bound(&8).get().is_none());
}

#[test]
fn count_alternates_on_odd_keys() {
    let set = OSTreapSet::from([1, 3, 5, 7]);

    let expected = [0, 1, 0, 1, 0, 1, 0, 1, 0];
    for (probe, &count) in (0..=8).zip(&expected) {
        assert_eq!(set.count(&probe), count, "count({probe})");
    }
}

#[test]
fn upper_bound_is_strict() {
    let set = OSTreapSet::from([10, 20, 30]);

    assert_eq!(set.upper_bound(&9).get(), Some(&10));
    assert_eq!(set.upper_bound(&10).get(), Some(&20));
    assert_eq!(set.upper_bound(&30).get(), None);
    assert_eq!(set.upper_bound(&30).rank(), 3);
}

#[test]
fn equal_range_brackets_the_value() {
    let set = OSTreapSet::from([10, 20, 30]);

    let (low, high) = set.equal_range(&20);
    assert_eq!(low.get(), Some(&20));
    assert_eq!(high.get(), Some(&30));
    assert_eq!(high.rank() - low.rank(), 1);

    // An absent value yields an empty bracket at the insertion point.
    let (low, high) = set.equal_range(&25);
    assert_eq!(low, high);
    assert_eq!(low.rank(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// lower_bound/upper_bound/find agree with the sorted vector's
    /// partition points for arbitrary probes.
    #[test]
    fn bounds_match_partition_points(
        values in proptest::collection::vec(-200i64..200, 1..500),
        probes in proptest::collection::vec(-210i64..210, 100),
    ) {
        let set: OSTreapSet<i64> = values.iter().copied().collect();
        let sorted: Vec<i64> = set.iter().copied().collect();

        for probe in probes {
            let lower = sorted.partition_point(|&v| v < probe);
            let upper = sorted.partition_point(|&v| v <= probe);

            prop_assert_eq!(set.lower_bound(&probe).rank(), lower);
            prop_assert_eq!(set.upper_bound(&probe).rank(), upper);
            match sorted.binary_search(&probe) {
                Ok(at) => prop_assert_eq!(set.find(&probe).rank(), at),
                Err(_) => prop_assert!(set.find(&probe).get().is_none()),
            }
        }
    }
}

// ─── Cursor movement ─────────────────────────────────────────────────────────

#[test]
fn cursor_walks_both_directions() {
    let set = OSTreapSet::from([10, 20, 30]);

    let mut cursor = set.cursor_at_rank(0);
    assert_eq!(cursor.get(), Some(&10));

    cursor.move_next();
    assert_eq!(cursor.get(), Some(&20));
    assert_eq!(cursor.rank(), 1);

    cursor.move_prev();
    assert_eq!(cursor.get(), Some(&10));

    // Falling off the front lands at the end position.
    cursor.move_prev();
    assert_eq!(cursor.get(), None);
    assert_eq!(cursor.rank(), 3);
}

#[test]
fn end_position_absorbs_movement() {
    let set = OSTreapSet::from([10, 20, 30]);

    let mut cursor = set.upper_bound(&30);
    assert_eq!(cursor.get(), None);

    cursor.move_next();
    assert_eq!(cursor.get(), None);
    cursor.move_prev();
    assert_eq!(cursor.get(), None);
    assert_eq!(cursor.rank(), set.len());
}

#[test]
fn cursors_compare_by_position() {
    let set = OSTreapSet::from([10, 20, 30]);

    assert_eq!(set.find(&20), set.cursor_at_rank(1));
    assert_ne!(set.find(&20), set.find(&30));
    assert_eq!(set.find(&99), set.upper_bound(&30));
}

// ─── Cursor-based mutation ───────────────────────────────────────────────────

#[test]
fn remove_current_advances_to_successor() {
    let mut set = OSTreapSet::from([1, 3, 5, 7, 9]);

    let mut cursor = set.lower_bound_mut(&3);
    assert_eq!(cursor.remove_current(), Some(3));
    assert_eq!(cursor.get(), Some(&5));
    assert_eq!(cursor.remove_current(), Some(5));
    assert_eq!(cursor.remove_current(), Some(7));
    assert_eq!(cursor.remove_current(), Some(9));
    assert_eq!(cursor.remove_current(), None);

    assert!(set.iter().eq([1].iter()));
}

#[test]
fn hinted_insert_ignores_a_wrong_hint() {
    let mut set = OSTreapSet::from([10, 30, 50]);

    // The hint points at the wrong end of the set on purpose.
    let mut cursor = set.cursor_at_rank_mut(2);
    assert!(cursor.insert(20));
    assert_eq!(cursor.get(), Some(&20));
    assert_eq!(cursor.rank(), 1);

    assert!(set.iter().eq([10, 20, 30, 50].iter()));
}

#[test]
fn hinted_insert_lands_on_collision() {
    let mut set = OSTreapSet::from([10, 30, 50]);

    let mut cursor = set.cursor_at_rank_mut(0);
    assert!(!cursor.insert(30));
    assert_eq!(cursor.get(), Some(&30));
    assert_eq!(cursor.rank(), 1);
    assert_eq!(set.len(), 3);
}

// ─── Stability ───────────────────────────────────────────────────────────────

#[test]
fn cursor_navigates_through_interleaved_inserts() {
    let mut set: OSTreapSet<i32> = (0..100).step_by(10).collect();

    let mut cursor = set.lower_bound_mut(&50);
    assert_eq!(cursor.get(), Some(&50));

    // Each insert rebalances the tree; the cursor follows the inserted
    // element and stays navigable throughout.
    for value in 0..100 {
        if value % 10 != 0 {
            cursor.insert(value);
        }
    }
    assert_eq!(cursor.get(), Some(&99));
    cursor.move_prev();
    assert_eq!(cursor.get(), Some(&98));

    assert_eq!(set.len(), 100);
}

#[test]
fn shared_cursors_survive_inserts_elsewhere() {
    let mut set = OSTreapSet::from([10, 20, 30]);

    // Take positions, then mutate through a fresh borrow.
    let rank_before = set.find(&20).rank();
    set.insert(15);
    set.insert(25);
    let cursor = set.find(&20);

    assert_eq!(cursor.get(), Some(&20));
    assert_eq!(rank_before, 1);
    assert_eq!(cursor.rank(), 2);
}

// ─── Randomized walk against a vector model ──────────────────────────────────

#[derive(Debug, Clone)]
enum CursorOp {
    MoveNext,
    MovePrev,
    RemoveCurrent,
    Insert(i16),
}

fn cursor_op_strategy() -> impl Strategy<Value = CursorOp> {
    prop_oneof![
        3 => Just(CursorOp::MoveNext),
        3 => Just(CursorOp::MovePrev),
        2 => Just(CursorOp::RemoveCurrent),
        2 => any::<i16>().prop_map(CursorOp::Insert),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Drives a mutable cursor and a (sorted Vec, index) model in lockstep.
    #[test]
    fn cursor_matches_vec_model(
        values in proptest::collection::vec(any::<i16>(), 0..50),
        ops in proptest::collection::vec(cursor_op_strategy(), 0..500),
    ) {
        let mut model: Vec<i16> = {
            let unique: BTreeSet<i16> = values.iter().copied().collect();
            unique.into_iter().collect()
        };
        let mut set: OSTreapSet<i16> = model.iter().copied().collect();

        // `index == model.len()` is the end position.
        let mut index = 0usize.min(model.len());
        let mut cursor = set.cursor_at_rank_mut(0);

        for op in ops {
            match op {
                CursorOp::MoveNext => {
                    if index < model.len() {
                        index += 1;
                    }
                    cursor.move_next();
                }
                CursorOp::MovePrev => {
                    if index < model.len() {
                        index = if index == 0 { model.len() } else { index - 1 };
                    }
                    cursor.move_prev();
                }
                CursorOp::RemoveCurrent => {
                    let expected = if index < model.len() {
                        Some(model.remove(index))
                    } else {
                        None
                    };
                    prop_assert_eq!(cursor.remove_current(), expected);
                }
                CursorOp::Insert(value) => {
                    let fresh = match model.binary_search(&value) {
                        Ok(at) => {
                            index = at;
                            false
                        }
                        Err(at) => {
                            model.insert(at, value);
                            index = at;
                            true
                        }
                    };
                    prop_assert_eq!(cursor.insert(value), fresh);
                }
            }

            prop_assert_eq!(cursor.get(), model.get(index), "cursor at index {}", index);
            prop_assert_eq!(cursor.rank(), index);
        }
    }
}

use crate::{Command, Treap};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

const INF: i64 = 1_000_000;

#[derive(Debug, Clone, Copy)]
enum Op {
    Insert(i64),
    Remove(i64),
}

// A narrow key range forces plenty of duplicates and removals that hit
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (-50i64..50).prop_map(Op::Insert),
        2 => (-50i64..50).prop_map(Op::Remove),
    ]
}

fn command_strategy() -> impl Strategy<Value = Command> {
    (1i64..=6, -60i64..60).prop_map(|(opcode, value)| {
        Command::from_pair(opcode, value).expect("opcodes 1..=6 are valid")
    })
}

fn build(seed: u64, ops: &[Op]) -> (Treap<i64>, BTreeMap<i64, usize>) {
    let mut treap = Treap::with_rng(-INF, INF, StdRng::seed_from_u64(seed)).unwrap();
    let mut model = BTreeMap::new();
    for op in ops {
        match *op {
            Op::Insert(key) => {
                treap.insert(key);
                *model.entry(key).or_insert(0) += 1;
            }
            Op::Remove(key) => {
                let expected = match model.get_mut(&key) {
                    Some(count) if *count > 1 => {
                        *count -= 1;
                        true
                    }
                    Some(_) => {
                        model.remove(&key);
                        true
                    }
                    None => false,
                };
                assert_eq!(treap.remove(&key), expected);
            }
        }
    }
    (treap, model)
}

fn flatten(model: &BTreeMap<i64, usize>) -> Vec<i64> {
    model
        .iter()
        .flat_map(|(&key, &count)| std::iter::repeat(key).take(count))
        .collect()
}

proptest! {
    #[test]
    fn invariants_hold_after_every_operation(seed in any::<u64>(), ops in prop::collection::vec(op_strategy(), 0..300)) {
        let mut treap = Treap::with_rng(-INF, INF, StdRng::seed_from_u64(seed)).unwrap();
        for op in ops {
            match op {
                Op::Insert(key) => treap.insert(key),
                Op::Remove(key) => {
                    treap.remove(&key);
                }
            }
            prop_assert_eq!(treap.check_invariants(), Ok(()));
        }
    }

    #[test]
    fn matches_multiset_model(seed in any::<u64>(), ops in prop::collection::vec(op_strategy(), 0..300)) {
        let (treap, model) = build(seed, &ops);
        let elements = flatten(&model);

        prop_assert_eq!(treap.iter().collect::<Vec<_>>(), elements.clone());
        prop_assert_eq!(treap.len(), elements.len());
        for key in -55i64..55 {
            let smaller = elements.iter().filter(|&&e| e < key).count();
            prop_assert_eq!(treap.rank_by_value(&key) - 1, smaller);
            prop_assert_eq!(treap.count(&key), model.get(&key).copied().unwrap_or(0));
            let prev = model.range(..key).next_back().map_or(-INF, |(&k, _)| k);
            prop_assert_eq!(treap.find_prev(&key), prev);
            let next = model.range(key + 1..).next().map_or(INF, |(&k, _)| k);
            prop_assert_eq!(treap.find_next(&key), next);
        }
        for (i, &key) in elements.iter().enumerate() {
            prop_assert_eq!(treap.value_by_rank(i + 2), key);
        }
        prop_assert_eq!(treap.value_by_rank(elements.len() + 3), INF);
    }

    #[test]
    fn rank_then_select_recovers_present_keys(seed in any::<u64>(), ops in prop::collection::vec(op_strategy(), 1..200)) {
        let (treap, model) = build(seed, &ops);
        for &key in model.keys() {
            prop_assert_eq!(treap.value_by_rank(treap.rank_by_value(&key) + 1), key);
        }
    }

    #[test]
    fn insert_then_remove_restores_multiset(seed in any::<u64>(), ops in prop::collection::vec(op_strategy(), 0..200), key in -60i64..60) {
        let (mut treap, _) = build(seed, &ops);
        let before = treap.iter().collect::<Vec<_>>();

        treap.insert(key);
        prop_assert!(treap.remove(&key));
        prop_assert_eq!(treap.iter().collect::<Vec<_>>(), before);
        prop_assert_eq!(treap.check_invariants(), Ok(()));
    }

    #[test]
    fn removing_absent_key_is_a_noop(seed in any::<u64>(), ops in prop::collection::vec(op_strategy(), 0..200), key in -50i64..50) {
        let (mut treap, _) = build(seed, &ops);
        while treap.remove(&key) {}
        let before = format!("{treap:?}");

        prop_assert!(!treap.remove(&key));
        prop_assert_eq!(format!("{treap:?}"), before);
    }

    #[test]
    fn allocation_is_bounded_by_distinct_inserts(seed in any::<u64>(), ops in prop::collection::vec(op_strategy(), 0..300)) {
        let (treap, _) = build(seed, &ops);
        let mut live = BTreeMap::new();
        let mut created = 0;
        for op in &ops {
            match *op {
                Op::Insert(key) => {
                    let count = live.entry(key).or_insert(0usize);
                    if *count == 0 {
                        created += 1;
                    }
                    *count += 1;
                }
                Op::Remove(key) => {
                    if let Some(count) = live.get_mut(&key) {
                        *count = count.saturating_sub(1);
                    }
                }
            }
        }
        prop_assert_eq!(treap.allocated_nodes(), created + 2);
    }

    #[test]
    fn commands_agree_with_direct_calls(seed in any::<u64>(), commands in prop::collection::vec(command_strategy(), 0..200)) {
        let mut input = format!("{}\n", commands.len());
        let mut reference = Treap::with_rng(-INF, INF, StdRng::seed_from_u64(seed)).unwrap();
        let mut expected = String::new();
        for command in &commands {
            let (opcode, value) = match *command {
                Command::Insert(x) => (1, x),
                Command::Remove(x) => (2, x),
                Command::Rank(x) => (3, x),
                Command::Select(x) => (4, x),
                Command::Prev(x) => (5, x),
                Command::Next(x) => (6, x),
            };
            input.push_str(&format!("{opcode} {value}\n"));
            if let Some(answer) = command.apply(&mut reference) {
                expected.push_str(&format!("{answer}\n"));
            }
        }

        let mut treap = Treap::with_rng(-INF, INF, StdRng::seed_from_u64(seed)).unwrap();
        let mut output = Vec::new();
        let executed = crate::run(input.as_bytes(), &mut output, &mut treap).unwrap();
        prop_assert_eq!(executed, commands.len());
        prop_assert_eq!(String::from_utf8(output).unwrap(), expected);
    }
}

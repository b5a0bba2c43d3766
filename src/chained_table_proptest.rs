#![cfg(test)]

// Property tests for ChainedTable kept inside the crate so they can reach
// per-bucket chain inspection alongside the public API.

use crate::chained_table::{ChainedTable, Handle, TableError};
use core::hash::{BuildHasher, Hasher};
use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    PutEmpty(i32),
    Remove(usize),
    Take(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{1,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            1 => any::<i32>().prop_map(OpI::PutEmpty),
            1 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::Take),
            1 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drives one scenario against a std HashMap model. Cleanup calls are
// recorded and compared against the values the model says were released.
fn run_scenario<S: BuildHasher>(
    sut: ChainedTable<i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let released = Rc::new(RefCell::new(Vec::new()));
    let sink = released.clone();
    let mut sut = sut.on_cleanup(move |v| sink.borrow_mut().push(v));
    let mut model: HashMap<String, i32> = HashMap::new();
    let mut expected_released: Vec<i32> = Vec::new();
    let mut live: HashMap<String, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();

    for op in ops {
        match op {
            OpI::Put(i, v) => {
                let k = &pool[i];
                let h = sut.put(k, v).expect("pool keys are non-empty");
                match model.insert(k.clone(), v) {
                    Some(old) => {
                        expected_released.push(old);
                        prop_assert_eq!(live.get(k), Some(&h), "overwrite keeps the entry");
                    }
                    None => {
                        prop_assert!(live.insert(k.clone(), h).is_none());
                    }
                }
            }
            OpI::PutEmpty(v) => {
                prop_assert_eq!(sut.put("", v), Err(TableError::EmptyKey));
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                let removed = sut.remove(k);
                match model.remove(k) {
                    Some(old) => {
                        prop_assert!(removed);
                        expected_released.push(old);
                        stale.push(live.remove(k).expect("tracked live handle"));
                    }
                    None => prop_assert!(!removed),
                }
                prop_assert!(sut.get(k).is_none());
            }
            OpI::Take(i) => {
                let k = &pool[i];
                let taken = sut.take(k);
                prop_assert_eq!(taken.clone().map(|(_, v)| v), model.remove(k));
                if let Some((tk, _)) = taken {
                    prop_assert_eq!(&tk, k);
                    stale.push(live.remove(k).expect("tracked live handle"));
                }
            }
            OpI::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k), model.get(k));
                prop_assert_eq!(sut.find(k), live.get(k).copied());
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(&s), model.contains_key(&s));
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                if let Some(v) = sut.get_mut(k) {
                    *v = v.wrapping_add(d);
                    let mv = model.get_mut(k).expect("model agrees on presence");
                    *mv = mv.wrapping_add(d);
                } else {
                    prop_assert!(!model.contains_key(k));
                }
            }
            OpI::Iterate => {
                let mut visits = 0;
                let mut seen = BTreeSet::new();
                sut.for_each(|k, v| {
                    visits += 1;
                    seen.insert((k.to_string(), *v));
                });
                let expected: BTreeSet<_> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(visits, model.len(), "each entry visited once");
                prop_assert_eq!(seen, expected);
            }
        }

        // Post-conditions after each op
        for &h in &stale {
            prop_assert!(h.value(&sut).is_none());
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        let chained: usize = (0..sut.bucket_count()).map(|b| sut.chain(b).count()).sum();
        prop_assert_eq!(chained, sut.len(), "count equals reachable entries");
        for b in 0..sut.bucket_count() {
            for (k, _) in sut.chain(b) {
                prop_assert_eq!(sut.bucket_index(k), b, "entry sits in its hash bucket");
            }
        }
    }

    let mut still_live: Vec<i32> = model.into_values().collect();
    drop(sut);
    expected_released.append(&mut still_live);
    expected_released.sort_unstable();
    let mut got = released.borrow().clone();
    got.sort_unstable();
    prop_assert_eq!(got, expected_released, "cleanup runs once per released value");
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `put` overwrites in place; the count tracks distinct live keys.
// - `remove`/`take` unlink the entry; stale handles never resolve.
// - traversal visits each live entry exactly once.
// - every entry is reachable from the bucket its key hashes to.
// - cleanup receives exactly the superseded, removed and remaining values.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(ChainedTable::with_buckets(7), &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress chain relinking.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior. Every key shares bucket 0, so removals exercise
// head, middle and tail unlinking.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(ChainedTable::with_hasher(5, ConstBuildHasher), &pool, ops)?;
    }
}

// Property: chain order is insertion order of the keys still present.
proptest! {
    #[test]
    fn prop_chain_is_insertion_ordered(
        keys in proptest::collection::vec("[a-z]{1,4}", 1..30),
        removals in proptest::collection::vec(any::<prop::sample::Index>(), 0..10)
    ) {
        let mut sut: ChainedTable<(), ConstBuildHasher> =
            ChainedTable::with_hasher(1, ConstBuildHasher);
        let mut order: Vec<String> = Vec::new();
        for k in &keys {
            sut.put(k, ()).unwrap();
            if !order.contains(k) {
                order.push(k.clone());
            }
        }
        for ix in removals {
            if order.is_empty() {
                break;
            }
            let k = order.remove(ix.index(order.len()));
            prop_assert!(sut.remove(&k));
        }
        let chain: Vec<String> = sut.chain(0).map(|(k, _)| k.to_string()).collect();
        prop_assert_eq!(chain, order);
    }
}

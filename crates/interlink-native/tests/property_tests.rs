//! Model-based property tests for the owner handle table.

use std::sync::Arc;

use interlink_native::{HandleTable, Lookup, NativeError, OwnerHandle};
use proptest::prelude::*;

const CAPACITY: usize = 8;

#[derive(Debug)]
struct Owner(u32);

#[derive(Debug, Clone)]
enum Op {
    Insert,
    Remove(usize),
    Release(usize),
    Purge,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Insert),
        2 => any::<usize>().prop_map(Op::Remove),
        1 => any::<usize>().prop_map(Op::Release),
        1 => Just(Op::Purge),
    ]
}

struct Live {
    handle: OwnerHandle,
    id: u32,
    owner: Option<Arc<Owner>>,
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_table_matches_model(ops in prop::collection::vec(op(), 1..96)) {
        let mut table = HandleTable::with_capacity(CAPACITY);
        let mut live: Vec<Live> = Vec::new();
        let mut retired: Vec<OwnerHandle> = Vec::new();
        let mut next_id = 0u32;

        for op in ops {
            match op {
                Op::Insert => {
                    next_id = next_id.wrapping_add(1);
                    let owner = Arc::new(Owner(next_id));
                    match table.insert(&owner) {
                        Ok(handle) => live.push(Live { handle, id: next_id, owner: Some(owner) }),
                        Err(err) => {
                            prop_assert_eq!(err, NativeError::table_full(CAPACITY));
                            prop_assert_eq!(live.len(), CAPACITY);
                        }
                    }
                }
                Op::Remove(pick) if !live.is_empty() => {
                    let entry = live.remove(pick % live.len());
                    prop_assert!(table.remove(entry.handle));
                    prop_assert!(!table.remove(entry.handle));
                    retired.push(entry.handle);
                }
                Op::Release(pick) if !live.is_empty() => {
                    let len = live.len();
                    if let Some(entry) = live.get_mut(pick % len) {
                        entry.owner = None;
                    }
                }
                Op::Purge => {
                    let (released, kept): (Vec<Live>, Vec<Live>) =
                        live.drain(..).partition(|entry| entry.owner.is_none());
                    prop_assert_eq!(table.purge_released(), released.len());
                    retired.extend(released.iter().map(|entry| entry.handle));
                    live = kept;
                }
                Op::Remove(_) | Op::Release(_) => {}
            }

            prop_assert_eq!(table.len(), live.len());
            for entry in &live {
                match (table.get::<Owner>(entry.handle), &entry.owner) {
                    (Lookup::Found(found), Some(_)) => {
                        prop_assert_eq!(found.0, entry.id);
                    }
                    (Lookup::Released, None) => {}
                    (other, owner) => {
                        return Err(TestCaseError::fail(format!(
                            "handle {} resolved to {other:?}, owner alive: {}",
                            entry.handle,
                            owner.is_some()
                        )));
                    }
                }
            }
            for handle in &retired {
                prop_assert!(matches!(table.get::<Owner>(*handle), Lookup::Unknown));
                prop_assert!(!table.contains(*handle));
            }
        }
    }

    #[test]
    fn test_live_handles_are_distinct_contexts(count in 1usize..=CAPACITY) {
        let mut table = HandleTable::with_capacity(CAPACITY);
        let owners: Vec<_> = (0..count)
            .map(|n| Arc::new(Owner(u32::try_from(n).unwrap_or(0))))
            .collect();
        let mut contexts = Vec::new();
        for owner in &owners {
            let handle = table.insert(owner).map_err(|err| TestCaseError::fail(err.to_string()))?;
            let context = handle.as_context();
            prop_assert!(!context.is_null());
            prop_assert_eq!(OwnerHandle::from_context(context), Some(handle));
            contexts.push(context.addr());
        }
        contexts.sort_unstable();
        contexts.dedup();
        prop_assert_eq!(contexts.len(), count);
    }
}

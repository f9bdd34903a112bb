// tests/property/consistency_test.rs

//! Property-based tests for store consistency
//! Random operation sequences must leave the store agreeing with a plain map.

use crate::test_helpers::init_tracing;
use memorydb::core::Command;
use memorydb::core::commands::Outcome;
use memorydb::core::protocol::Reply;
use memorydb::core::storage::Store;
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Op {
    Set(String, String),
    Get(String),
    Delete(String),
}

fn key_strategy() -> impl Strategy<Value = String> {
    // A small alphabet so operations collide on the same keys.
    "[a-cA-C]{1,2}"
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (key_strategy(), "[a-zA-Z0-9]{1,8}").prop_map(|(k, v)| Op::Set(k, v)),
        key_strategy().prop_map(Op::Get),
        key_strategy().prop_map(Op::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        max_shrink_iters: 500,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_store_matches_model(ops in prop::collection::vec(op_strategy(), 1..100)) {
        init_tracing();
        let store = Store::new();
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                Op::Set(k, v) => {
                    let line = format!("set {k} {v}");
                    prop_assert_eq!(Command::parse(&line).execute(&store), Outcome::Reply(Reply::Ok));
                    model.insert(k.to_lowercase(), v);
                }
                Op::Get(k) => {
                    let expected = match model.get(&k.to_lowercase()) {
                        Some(v) => Reply::Value(v.clone()),
                        None => Reply::NotFound(k.to_lowercase()),
                    };
                    let line = format!("get {k}");
                    prop_assert_eq!(Command::parse(&line).execute(&store), Outcome::Reply(expected));
                }
                Op::Delete(k) => {
                    let line = format!("delete {k}");
                    prop_assert_eq!(Command::parse(&line).execute(&store), Outcome::Reply(Reply::Ok));
                    model.remove(&k.to_lowercase());
                }
            }
        }

        let mut keys = store.keys();
        keys.sort();
        let mut expected_keys: Vec<String> = model.keys().cloned().collect();
        expected_keys.sort();
        prop_assert_eq!(keys, expected_keys);
    }

    #[test]
    fn test_concurrent_distinct_writers_lose_nothing(
        writers in 2usize..8,
        per_writer in 1usize..50,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let store = std::sync::Arc::new(Store::new());
            let mut handles = Vec::new();
            for w in 0..writers {
                let store = store.clone();
                handles.push(tokio::spawn(async move {
                    for i in 0..per_writer {
                        store.set(&format!("w{w}_{i}"), format!("{i}"));
                    }
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }
            assert_eq!(store.len(), writers * per_writer);
            assert_eq!(store.dirty_count(), (writers * per_writer) as u64);
        });
    }
}

//! Property-based tests for structural merge.
//!
//! These tests use proptest to generate arbitrary value trees and verify that
//! the merge invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::merge::merge;
    use crate::object::Values;
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-z0-9 ]{0,8}".prop_map(Value::String),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-e]{1,2}", inner, 0..5)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn tree() -> impl Strategy<Value = Values> {
        prop::collection::btree_map("[a-e]{1,2}", value(), 0..6)
            .prop_map(|m| m.into_iter().collect::<Map<String, Value>>())
    }

    proptest! {
        /// Property: merging with an empty or absent overlay yields a copy of the base
        #[test]
        fn merge_with_empty_overlay_is_identity(base in tree()) {
            prop_assert_eq!(&merge(Some(&base), None), &base);
            prop_assert_eq!(&merge(Some(&base), Some(&Map::new())), &base);
        }

        /// Property: merge is deterministic and leaves its inputs untouched
        #[test]
        fn merge_is_deterministic_and_pure(base in tree(), overlay in tree()) {
            let base_before = base.clone();
            let overlay_before = overlay.clone();

            let first = merge(Some(&base), Some(&overlay));
            let second = merge(Some(&base), Some(&overlay));

            prop_assert_eq!(first, second);
            prop_assert_eq!(base, base_before);
            prop_assert_eq!(overlay, overlay_before);
        }

        /// Property: every top-level overlay key whose value is not a mapping wins outright
        #[test]
        fn merge_overlay_non_mapping_wins(base in tree(), overlay in tree()) {
            let result = merge(Some(&base), Some(&overlay));
            for (key, value) in &overlay {
                if !value.is_object() {
                    prop_assert_eq!(result.get(key), Some(value));
                }
            }
        }

        /// Property: keys only present in the base survive unchanged
        #[test]
        fn merge_preserves_base_only_keys(base in tree(), overlay in tree()) {
            let result = merge(Some(&base), Some(&overlay));
            for (key, value) in &base {
                if !overlay.contains_key(key) {
                    prop_assert_eq!(result.get(key), Some(value));
                }
            }
        }

        /// Property: merging a tree onto itself returns the same tree
        #[test]
        fn merge_self_is_idempotent(base in tree()) {
            prop_assert_eq!(&merge(Some(&base), Some(&base)), &base);
        }
    }
}

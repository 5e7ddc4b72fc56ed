//! Property tests for propagation and store invariants.
//!
//! These validate the structural guarantees: propagation reaches every
//! text leaf and only text leaves, shape is never altered, identity
//! tracking never taints fresh equal-content values, and clearing is
//! exactly as selective as advertised.

use std::convert::Infallible;

use proptest::prelude::*;
use taintflow::{Args, Engine, Value, VulnKind};

fn arb_text() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{0,24}").unwrap()
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Bytes),
        arb_text().prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Seq),
            prop::collection::btree_map("[a-k]{1,4}", inner, 0..4).prop_map(Value::Record),
        ]
    })
}

fn text_leaf_count(value: &Value) -> usize {
    match value {
        Value::Text(_) => 1,
        Value::Seq(items) => items.iter().map(text_leaf_count).sum(),
        Value::Record(entries) => entries.values().map(text_leaf_count).sum(),
        _ => 0,
    }
}

fn builtin_kinds() -> Vec<VulnKind> {
    vec![
        VulnKind::XSS,
        VulnKind::SQL_INJECTION,
        VulnKind::OS_INJECTION,
        VulnKind::INTERPRETER_INJECTION,
    ]
}

proptest! {
    /// Property: marking taints exactly the text leaves, for exactly the
    /// requested kinds, and the store holds one entry per distinct leaf.
    #[test]
    fn proptest_mark_reaches_all_and_only_text_leaves(value in arb_value()) {
        let engine = Engine::new();
        engine.mark(&value, &[VulnKind::XSS]);

        let leaves = text_leaf_count(&value);
        prop_assert_eq!(engine.tracked(VulnKind::XSS), leaves);
        prop_assert_eq!(engine.tainted(&value), leaves > 0);
        prop_assert_eq!(engine.tracked(VulnKind::SQL_INJECTION), 0);
    }

    /// Property: a source wrapper returns the value with its shape
    /// intact — same variant, same lengths, same keys, same content.
    #[test]
    fn proptest_source_preserves_shape(value in arb_value()) {
        let engine = Engine::new();
        let expected = value.clone();
        let source = engine.untrusted(move |_: &Args| Ok::<_, Infallible>(value.clone()));

        let result = source.call(&Args::new()).unwrap();
        prop_assert_eq!(result, expected);
    }

    /// Property: identity tracking — a fresh allocation with the same
    /// content as a tainted value is never itself tainted.
    #[test]
    fn proptest_fresh_equal_content_is_untainted(content in arb_text()) {
        let engine = Engine::new();
        let original = Value::from(content.clone());
        engine.mark_all(&original);

        let fresh = Value::from(content);
        prop_assert!(engine.tainted(&original));
        prop_assert!(!engine.tainted(&fresh));
    }

    /// Property: clearing one kind removes it everywhere under the value
    /// and leaves every other kind's membership untouched.
    #[test]
    fn proptest_clear_is_selective(value in arb_value(), cleared_index in 0usize..4) {
        let engine = Engine::new();
        let kinds = builtin_kinds();
        engine.mark(&value, &kinds);

        let cleared = kinds[cleared_index];
        engine.clear(&value, cleared);

        let leaves = text_leaf_count(&value);
        for kind in kinds {
            let expected = if kind == cleared { 0 } else { leaves };
            prop_assert_eq!(engine.tracked(kind), expected);
        }
        prop_assert!(!engine.is_tainted(&value, cleared));
    }

    /// Property: marking twice changes nothing over marking once.
    #[test]
    fn proptest_mark_is_idempotent(value in arb_value()) {
        let engine = Engine::new();
        engine.mark(&value, &[VulnKind::OS_INJECTION]);
        let once = engine.tracked(VulnKind::OS_INJECTION);

        engine.mark(&value, &[VulnKind::OS_INJECTION]);
        prop_assert_eq!(engine.tracked(VulnKind::OS_INJECTION), once);
    }

    /// Property: a sink in monitoring mode never alters the result of a
    /// clean call, whatever the argument shape.
    #[test]
    fn proptest_clean_sink_calls_are_transparent(value in arb_value()) {
        let engine = Engine::new();
        let sink = engine.sink(|args: &Args| {
            Ok::<_, Infallible>(args.positional[0].clone())
        });

        let result = sink.call(&Args::from_positional(vec![value.clone()])).unwrap();
        prop_assert_eq!(result, value);
    }
}

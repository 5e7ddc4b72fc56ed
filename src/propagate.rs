//! Structural taint propagation.
//!
//! One depth-unbounded traversal serves marking (sources), clearing
//! (cleaners) and scanning (sinks). Only [`Text`] leaves participate;
//! numeric, boolean and binary scalars pass through untouched, and
//! composites are recursed into but never stored themselves. A per-walk
//! visited set skips leaves already handled, so shared allocations are
//! touched once per walk.

use std::collections::{BTreeSet, HashSet};

use crate::kind::VulnKind;
use crate::store::TaintStore;
use crate::value::{Args, Text, Value, ValueId};

/// What one walk does to each text leaf it reaches.
pub(crate) enum Mode<'a> {
    /// Add membership for every listed kind.
    Mark(&'a [VulnKind]),
    /// Remove membership for exactly one kind.
    Clear(VulnKind),
}

/// Applies `mode` to every text leaf reachable from `value`.
///
/// The value itself is never modified; only store membership changes.
pub(crate) fn apply(store: &mut TaintStore, value: &Value, mode: &Mode<'_>) {
    let mut seen = HashSet::new();
    walk(store, value, mode, &mut seen);
}

fn walk(store: &mut TaintStore, value: &Value, mode: &Mode<'_>, seen: &mut HashSet<ValueId>) {
    match value {
        Value::Text(text) => {
            if !seen.insert(text.id()) {
                return;
            }
            match mode {
                Mode::Mark(kinds) => store.mark(text, kinds),
                Mode::Clear(kind) => store.clear(text, *kind),
            }
        }
        Value::Seq(items) => {
            for item in items {
                walk(store, item, mode, seen);
            }
        }
        Value::Record(entries) => {
            for item in entries.values() {
                walk(store, item, mode, seen);
            }
        }
        // Non-textual leaves never enter the store.
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Bytes(_) => {}
    }
}

/// Finds the first text leaf under `value` tainted with any kind in
/// `kinds`, in depth-first order. Returns the matching kind (first of
/// `kinds` that applies to that leaf) and the leaf itself.
pub(crate) fn find_tainted<'v>(
    store: &TaintStore,
    value: &'v Value,
    kinds: &[VulnKind],
) -> Option<(VulnKind, &'v Text)> {
    match value {
        Value::Text(text) => kinds
            .iter()
            .copied()
            .find(|&kind| store.is_tainted(text, kind))
            .map(|kind| (kind, text)),
        Value::Seq(items) => items
            .iter()
            .find_map(|item| find_tainted(store, item, kinds)),
        Value::Record(entries) => entries
            .values()
            .find_map(|item| find_tainted(store, item, kinds)),
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Bytes(_) => None,
    }
}

/// Scans a full argument list: positional arguments in call order, then
/// keyword arguments in key order.
pub(crate) fn scan_args<'a>(
    store: &TaintStore,
    args: &'a Args,
    kinds: &[VulnKind],
) -> Option<(VulnKind, &'a Text)> {
    args.positional
        .iter()
        .chain(args.keywords.values())
        .find_map(|value| find_tainted(store, value, kinds))
}

/// Union of the taint kinds of every text leaf under `value`.
pub(crate) fn taint_union(store: &TaintStore, value: &Value) -> BTreeSet<VulnKind> {
    let mut kinds = BTreeSet::new();
    collect(store, value, &mut kinds);
    kinds
}

fn collect(store: &TaintStore, value: &Value, kinds: &mut BTreeSet<VulnKind>) {
    match value {
        Value::Text(text) => kinds.extend(store.taints_of(text)),
        Value::Seq(items) => {
            for item in items {
                collect(store, item, kinds);
            }
        }
        Value::Record(entries) => {
            for item in entries.values() {
                collect(store, item, kinds);
            }
        }
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Bytes(_) => {}
    }
}

use std::collections::{BTreeSet, HashMap};
use std::sync::Weak;

use crate::kind::VulnKind;
use crate::value::{Text, ValueId};

/// The process-wide repository of tainted value identities.
///
/// Maps each vulnerability kind to the set of text allocations currently
/// considered tainted with that kind. Membership is monotonic: an entry
/// stays until an explicit `clear` for that kind or a full `reset`.
///
/// Entries key on allocation identity but carry a `Weak` handle so the
/// store never extends a value's lifetime, and so an identity whose
/// allocation has been freed (and possibly reused by a fresh, untainted
/// value) stops testing as tainted. Dead entries are swept whenever the
/// same kind is marked again.
#[derive(Debug, Default)]
pub(crate) struct TaintStore {
    by_kind: HashMap<VulnKind, HashMap<ValueId, Weak<str>>>,
}

fn live(entry: &Weak<str>) -> bool {
    entry.strong_count() > 0
}

impl TaintStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records `text` as tainted for every kind in `kinds`. Idempotent.
    pub(crate) fn mark(&mut self, text: &Text, kinds: &[VulnKind]) {
        for &kind in kinds {
            let entries = self.by_kind.entry(kind).or_default();
            entries.retain(|_, weak| live(weak));
            entries.insert(text.id(), text.weak());
        }
    }

    /// Removes `text` from one kind only. A miss is a no-op.
    pub(crate) fn clear(&mut self, text: &Text, kind: VulnKind) {
        if let Some(entries) = self.by_kind.get_mut(&kind) {
            entries.remove(&text.id());
        }
    }

    pub(crate) fn is_tainted(&self, text: &Text, kind: VulnKind) -> bool {
        self.by_kind
            .get(&kind)
            .and_then(|entries| entries.get(&text.id()))
            .is_some_and(live)
    }

    /// Every kind for which `text` is currently tainted.
    pub(crate) fn taints_of(&self, text: &Text) -> BTreeSet<VulnKind> {
        let id = text.id();
        self.by_kind
            .iter()
            .filter(|(_, entries)| entries.get(&id).is_some_and(live))
            .map(|(&kind, _)| kind)
            .collect()
    }

    /// Number of distinct live tainted identities recorded for `kind`.
    pub(crate) fn tracked(&self, kind: VulnKind) -> usize {
        self.by_kind
            .get(&kind)
            .map_or(0, |entries| entries.values().filter(|w| live(w)).count())
    }

    /// Forgets everything. For test isolation; production runs rely on
    /// process exit.
    pub(crate) fn reset(&mut self) {
        self.by_kind.clear();
    }
}

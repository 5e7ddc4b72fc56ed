use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cleaner::Cleaner;
use crate::error::{ConfigError, ConfigErrorKind};
use crate::kind::{KindRegistry, VulnKind};
use crate::propagate::{self, Mode};
use crate::report::{default_reached, ReachedHandler, Violation};
use crate::sink::Sink;
use crate::source::{ArgSource, ArgSpec, Source};
use crate::store::TaintStore;
use crate::value::Value;

/// The taint-tracking context: store, kind registry and enforce flag.
///
/// One `Engine` replaces the process-wide globals a dynamic taint
/// tracker traditionally keeps. The instrumentation layer creates it at
/// startup wiring, hands clones to every wrapper (clones share state),
/// and tests isolate runs with [`Engine::reset`] instead of process
/// restarts.
///
/// The store is guarded by a mutex, so wrappers may be invoked from
/// multiple threads; interception itself stays synchronous and inline.
///
/// # Examples
///
/// ```
/// use taintflow::{Args, Engine, Value, VulnKind};
///
/// let engine = Engine::new();
///
/// let read_param = engine.untrusted(|_: &Args| {
///     Ok::<_, std::convert::Infallible>(Value::from("1 OR 1=1"))
/// });
/// let param = read_param.call(&Args::new()).unwrap();
///
/// assert!(engine.tainted(&param));
/// assert!(engine.is_tainted(&param, VulnKind::SQL_INJECTION));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Engine {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    store: Mutex<TaintStore>,
    registry: Mutex<KindRegistry>,
    enforce: AtomicBool,
}

impl Engine {
    /// Creates an engine with an empty store, the built-in kinds, and
    /// enforcement off.
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, TaintStore> {
        self.inner
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn registry(&self) -> MutexGuard<'_, KindRegistry> {
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ---- store operations ----

    /// Marks every text leaf under `value` as tainted for `kinds`.
    ///
    /// Structural and idempotent; non-textual leaves are skipped and the
    /// value itself is not modified.
    pub fn mark(&self, value: &Value, kinds: &[VulnKind]) {
        propagate::apply(&mut self.store(), value, &Mode::Mark(kinds));
        tracing::debug!(kinds = ?kinds, "marked value tree as tainted");
    }

    /// Marks every text leaf under `value` for every registered kind.
    pub fn mark_all(&self, value: &Value) {
        let kinds = self.kinds();
        self.mark(value, &kinds);
    }

    /// Clears taint of exactly one kind from every text leaf under
    /// `value`. Taint for other kinds is untouched.
    pub fn clear(&self, value: &Value, kind: VulnKind) {
        propagate::apply(&mut self.store(), value, &Mode::Clear(kind));
        tracing::debug!(kind = ?kind, "cleared one taint kind from value tree");
    }

    /// Whether any text leaf under `value` is tainted with `kind`.
    pub fn is_tainted(&self, value: &Value, kind: VulnKind) -> bool {
        propagate::find_tainted(&self.store(), value, &[kind]).is_some()
    }

    /// Whether any text leaf under `value` is tainted with any kind.
    pub fn tainted(&self, value: &Value) -> bool {
        let kinds = self.kinds();
        propagate::find_tainted(&self.store(), value, &kinds).is_some()
    }

    /// Union of the taint kinds across every text leaf under `value`.
    pub fn any_taint(&self, value: &Value) -> BTreeSet<VulnKind> {
        propagate::taint_union(&self.store(), value)
    }

    /// Number of distinct values currently tainted with `kind`, for
    /// tests and diagnostics.
    pub fn tracked(&self, kind: VulnKind) -> usize {
        self.store().tracked(kind)
    }

    /// Empties the store and switches enforcement off.
    ///
    /// Registered kinds survive; kinds are never removed within a
    /// process run.
    pub fn reset(&self) {
        self.store().reset();
        self.inner.enforce.store(false, Ordering::Relaxed);
    }

    pub(crate) fn with_store<R>(&self, f: impl FnOnce(&TaintStore) -> R) -> R {
        f(&self.store())
    }

    // ---- kind registry ----

    /// Registers a vulnerability kind, returning its stable identifier.
    ///
    /// Registering a name that already exists returns the existing kind.
    pub fn register_kind(&self, name: &str) -> VulnKind {
        self.registry().register(name)
    }

    /// Every registered kind, in declaration order.
    pub fn kinds(&self) -> Vec<VulnKind> {
        self.registry().kinds()
    }

    /// The registered name of `kind`, if it exists.
    pub fn kind_name(&self, kind: VulnKind) -> Option<String> {
        self.registry().name(kind).map(str::to_string)
    }

    pub(crate) fn validate_kinds(&self, kinds: &[VulnKind]) -> Result<(), ConfigError> {
        let registry = self.registry();
        for &kind in kinds {
            if !registry.contains(kind) {
                return Err(ConfigError::new(
                    ConfigErrorKind::UnknownKind,
                    format!("kind index {} is not registered", kind.index()),
                ));
            }
        }
        Ok(())
    }

    // ---- enforcement policy ----

    /// Switches suppression of violating sink calls on or off.
    ///
    /// Off (the default), a sink reports the violation and still runs
    /// the underlying operation. On, the operation is suppressed and the
    /// sink call evaluates to the reached handler's return value.
    pub fn set_enforce(&self, on: bool) {
        self.inner.enforce.store(on, Ordering::Relaxed);
    }

    /// Whether violating sink calls are currently suppressed.
    pub fn enforce(&self) -> bool {
        self.inner.enforce.load(Ordering::Relaxed)
    }

    // ---- wrapper constructors ----

    /// Wraps a producer of untrusted data.
    ///
    /// The returned wrapper calls `f`, marks every text leaf of the
    /// result with every registered kind, and returns the result.
    pub fn untrusted<F>(&self, f: F) -> Source<F> {
        Source::new(self.clone(), f)
    }

    /// Wraps a callback that receives untrusted data in selected
    /// arguments, for inversion-of-control frameworks that push values
    /// into code the host did not invoke directly.
    ///
    /// The wrapper marks each selected argument with every registered
    /// kind before calling `f`; the return value passes through with no
    /// taint applied.
    ///
    /// # Errors
    ///
    /// Fails at wrap time if `spec` lists a position or keyword twice.
    pub fn untrusted_args<F>(&self, spec: ArgSpec, f: F) -> Result<ArgSource<F>, ConfigError> {
        spec.validate()?;
        Ok(ArgSource::new(self.clone(), spec, f))
    }

    /// Wraps a sanitizing function for one vulnerability kind.
    ///
    /// The returned wrapper calls `f`, then clears exactly `kind` from
    /// every text leaf of the result. A cleaner for one kind never
    /// touches taint of another.
    ///
    /// # Errors
    ///
    /// Fails at wrap time if `kind` is not registered.
    pub fn cleaner<F>(&self, kind: VulnKind, f: F) -> Result<Cleaner<F>, ConfigError> {
        self.validate_kinds(&[kind])?;
        Ok(Cleaner::new(self.clone(), kind, f))
    }

    /// Wraps a sensitive operation, checking every call for taint of any
    /// registered kind.
    ///
    /// This is the conservative default; use [`Engine::sink_for`] to
    /// restrict detection to specific kinds.
    pub fn sink<F>(&self, f: F) -> Sink<F> {
        Sink::new(self.clone(), None, default_reached_handler(), f)
    }

    /// Wraps a sensitive operation, checking every call for taint of the
    /// given kinds only.
    ///
    /// # Errors
    ///
    /// Fails at wrap time if any kind is not registered.
    pub fn sink_for<F>(
        &self,
        kinds: impl IntoIterator<Item = VulnKind>,
        f: F,
    ) -> Result<Sink<F>, ConfigError> {
        let kinds: Vec<VulnKind> = kinds.into_iter().collect();
        self.validate_kinds(&kinds)?;
        Ok(Sink::new(self.clone(), Some(kinds), default_reached_handler(), f))
    }
}

fn default_reached_handler() -> ReachedHandler {
    Arc::new(|violation: &Violation| default_reached(violation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Args;
    use std::convert::Infallible;

    #[test]
    fn clones_share_state() {
        let engine = Engine::new();
        let alias = engine.clone();
        let value = Value::from("shared");

        engine.mark(&value, &[VulnKind::XSS]);

        assert!(alias.is_tainted(&value, VulnKind::XSS));
        alias.reset();
        assert!(!engine.tainted(&value));
    }

    #[test]
    fn any_taint_reports_union() {
        let engine = Engine::new();
        let value = Value::from("v");

        engine.mark(&value, &[VulnKind::XSS, VulnKind::OS_INJECTION]);

        let kinds: Vec<_> = engine.any_taint(&value).into_iter().collect();
        assert_eq!(kinds, vec![VulnKind::XSS, VulnKind::OS_INJECTION]);
    }

    #[test]
    fn registered_kinds_are_covered_by_mark_all() {
        let engine = Engine::new();
        let custom = engine.register_kind("ldap-injection");
        let value = Value::from("v");

        engine.mark_all(&value);

        assert!(engine.is_tainted(&value, custom));
        assert!(engine.is_tainted(&value, VulnKind::XSS));
    }

    #[test]
    fn reset_turns_enforcement_off() {
        let engine = Engine::new();
        engine.set_enforce(true);
        assert!(engine.enforce());

        engine.reset();
        assert!(!engine.enforce());
    }

    #[test]
    fn validate_kinds_rejects_foreign_kind() {
        let engine = Engine::new();
        let other = Engine::new();
        let foreign = other.register_kind("template-injection");

        // Same index exists here only if this engine registered it too.
        let error = engine.cleaner(foreign, |_: &Args| Ok::<_, Infallible>(Value::Null));
        assert!(error.is_err());
        assert_eq!(
            error.unwrap_err().kind(),
            crate::error::ConfigErrorKind::UnknownKind
        );
    }
}

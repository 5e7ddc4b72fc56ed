use std::panic::Location;
use std::sync::Arc;
use std::time::SystemTime;

use crate::engine::Engine;
use crate::kind::VulnKind;
use crate::propagate;
use crate::report::{CallSite, ReachedHandler, Violation};
use crate::value::{Args, Value};

/// A wrapped sensitive operation.
///
/// Built by [`Engine::sink`] (checks every registered kind) or
/// [`Engine::sink_for`] (checks a fixed selection). Every call scans all
/// positional and keyword arguments for tainted text leaves before the
/// operation runs. A clean call goes straight through with no side
/// effects; a tainted one becomes a [`Violation`] handed to the reached
/// handler, and the engine's enforce flag decides whether the operation
/// still runs.
///
/// # Examples
///
/// ```
/// use taintflow::{Args, Engine, Value, VulnKind};
///
/// let engine = Engine::new();
/// let run_query = engine
///     .sink_for([VulnKind::SQL_INJECTION], |_args: &Args| {
///         // ... execute against the database ...
///         Ok::<_, std::convert::Infallible>(Value::Int(0))
///     })
///     .unwrap();
///
/// // Clean arguments pass through untouched.
/// let rows = run_query.call(&Args::new().arg("SELECT 1")).unwrap();
/// assert_eq!(rows, Value::Int(0));
/// ```
pub struct Sink<F> {
    engine: Engine,
    /// `None` means "every kind registered at call time".
    kinds: Option<Vec<VulnKind>>,
    reached: ReachedHandler,
    inner: F,
}

impl<F> Sink<F> {
    pub(crate) fn new(
        engine: Engine,
        kinds: Option<Vec<VulnKind>>,
        reached: ReachedHandler,
        inner: F,
    ) -> Self {
        Self {
            engine,
            kinds,
            reached,
            inner,
        }
    }

    /// Replaces the violation handler.
    ///
    /// The handler is called once per violating invocation. Its return
    /// value stands in for the suppressed operation when the engine is
    /// enforcing; otherwise it runs purely for its reporting effect.
    pub fn on_reached(
        mut self,
        handler: impl Fn(&Violation) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.reached = Arc::new(handler);
        self
    }

    /// Checks the arguments and, policy permitting, invokes the wrapped
    /// operation.
    ///
    /// # Errors
    ///
    /// Whatever the wrapped operation returns propagates unchanged. A
    /// suppressed call never produces the operation's error, only the
    /// handler's value.
    #[track_caller]
    pub fn call<E>(&self, args: &Args) -> Result<Value, E>
    where
        F: Fn(&Args) -> Result<Value, E>,
    {
        let location = Location::caller();
        let kinds = match &self.kinds {
            Some(kinds) => kinds.clone(),
            None => self.engine.kinds(),
        };

        let hit = self.engine.with_store(|store| {
            propagate::scan_args(store, args, &kinds).map(|(kind, text)| (kind, text.clone()))
        });

        let Some((kind, value)) = hit else {
            return (self.inner)(args);
        };

        let violation = Violation {
            kind,
            kind_name: self
                .engine
                .kind_name(kind)
                .unwrap_or_else(|| format!("kind-{}", kind.index())),
            value,
            site: CallSite::capture(location),
            at: SystemTime::now(),
        };

        if self.engine.enforce() {
            // Suppress the operation; the handler's value stands in.
            Ok((self.reached)(&violation))
        } else {
            (self.reached)(&violation);
            (self.inner)(args)
        }
    }
}

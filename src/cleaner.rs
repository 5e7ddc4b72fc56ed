use crate::engine::Engine;
use crate::kind::VulnKind;
use crate::value::{Args, Value};

/// A wrapped sanitizing function for one vulnerability kind.
///
/// Built by [`Engine::cleaner`]. Calling it runs the inner function,
/// then clears exactly one kind of taint from every text leaf of the
/// result. Other kinds stay: escaping HTML says nothing about the value
/// being safe for a SQL query.
///
/// # Examples
///
/// ```
/// use taintflow::{Args, Engine, Value, VulnKind};
///
/// let engine = Engine::new();
/// let escape = engine
///     .cleaner(VulnKind::XSS, |args: &Args| {
///         let raw = args.positional[0].as_str().unwrap_or_default();
///         Ok::<_, std::convert::Infallible>(Value::from(raw.replace('<', "&lt;")))
///     })
///     .unwrap();
///
/// let input = Value::from("<script>");
/// engine.mark(&input, &[VulnKind::XSS, VulnKind::SQL_INJECTION]);
///
/// let escaped = escape.call(&Args::from_positional(vec![input])).unwrap();
/// assert!(!engine.is_tainted(&escaped, VulnKind::XSS));
/// ```
pub struct Cleaner<F> {
    engine: Engine,
    kind: VulnKind,
    inner: F,
}

impl<F> std::fmt::Debug for Cleaner<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cleaner")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<F> Cleaner<F> {
    pub(crate) fn new(engine: Engine, kind: VulnKind, inner: F) -> Self {
        Self { engine, kind, inner }
    }

    /// The kind this cleaner removes.
    pub fn kind(&self) -> VulnKind {
        self.kind
    }

    /// Invokes the wrapped function and clears its kind from the result.
    ///
    /// # Errors
    ///
    /// Whatever the wrapped function returns propagates unchanged; a
    /// failed call clears nothing.
    pub fn call<E>(&self, args: &Args) -> Result<Value, E>
    where
        F: Fn(&Args) -> Result<Value, E>,
    {
        let result = (self.inner)(args)?;
        self.engine.clear(&result, self.kind);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    /// A cleaner that returns its input unchanged, the common shape for
    /// sanitizers that mutate state elsewhere or validate in place.
    fn passthrough(args: &Args) -> Result<Value, Infallible> {
        Ok(args.positional[0].clone())
    }

    #[test]
    fn clears_its_kind_only() {
        let engine = Engine::new();
        let cleaner = engine.cleaner(VulnKind::XSS, passthrough).unwrap();

        let value = Value::from("<img onerror=...>");
        engine.mark(&value, &[VulnKind::XSS, VulnKind::SQL_INJECTION]);

        let cleaned = cleaner
            .call(&Args::from_positional(vec![value.clone()]))
            .unwrap();

        assert!(!engine.is_tainted(&cleaned, VulnKind::XSS));
        assert!(engine.is_tainted(&cleaned, VulnKind::SQL_INJECTION));
        assert_eq!(
            engine.any_taint(&cleaned).into_iter().collect::<Vec<_>>(),
            vec![VulnKind::SQL_INJECTION]
        );
    }

    #[test]
    fn clears_recursively_through_composites() {
        let engine = Engine::new();
        let cleaner = engine.cleaner(VulnKind::OS_INJECTION, passthrough).unwrap();

        let seq = Value::Seq(vec![Value::from("a"), Value::from("b")]);
        engine.mark(&seq, &[VulnKind::OS_INJECTION]);

        let cleaned = cleaner.call(&Args::from_positional(vec![seq])).unwrap();
        assert!(!engine.tainted(&cleaned));
    }

    #[test]
    fn unknown_kind_fails_at_wrap_time() {
        let engine = Engine::new();
        let bogus = Engine::new().register_kind("made-up");
        // "made-up" got index 4, which this engine never registered.
        let result = engine.cleaner(bogus, passthrough);
        assert!(result.is_err());
    }

    #[test]
    fn inner_error_propagates_and_taint_stays() {
        let engine = Engine::new();
        let cleaner = engine
            .cleaner(VulnKind::XSS, |_: &Args| Err::<Value, &str>("bad input"))
            .unwrap();

        let value = Value::from("v");
        engine.mark(&value, &[VulnKind::XSS]);

        assert_eq!(
            cleaner.call(&Args::from_positional(vec![value.clone()])),
            Err("bad input")
        );
        assert!(engine.is_tainted(&value, VulnKind::XSS));
    }
}

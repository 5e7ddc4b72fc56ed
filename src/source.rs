use crate::engine::Engine;
use crate::error::{ConfigError, ConfigErrorKind};
use crate::value::{Args, Value};

/// A wrapped producer of untrusted data.
///
/// Built by [`Engine::untrusted`]. Calling it runs the inner function,
/// then marks every text leaf of the result with every kind currently
/// registered, so data entering through this boundary is suspect for all
/// of them until a cleaner says otherwise.
///
/// # Examples
///
/// ```
/// use taintflow::{Args, Engine, Value};
///
/// let engine = Engine::new();
/// let read_header = engine.untrusted(|args: &Args| {
///     let name = args.positional[0].as_str().unwrap_or_default();
///     Ok::<_, std::convert::Infallible>(Value::from(format!("value-of-{name}")))
/// });
///
/// let header = read_header.call(&Args::new().arg("referer")).unwrap();
/// assert!(engine.tainted(&header));
/// ```
pub struct Source<F> {
    engine: Engine,
    inner: F,
}

impl<F> Source<F> {
    pub(crate) fn new(engine: Engine, inner: F) -> Self {
        Self { engine, inner }
    }

    /// Invokes the wrapped function and taints its result.
    ///
    /// # Errors
    ///
    /// Whatever the wrapped function returns propagates unchanged; no
    /// taint is applied to a failed call.
    pub fn call<E>(&self, args: &Args) -> Result<Value, E>
    where
        F: Fn(&Args) -> Result<Value, E>,
    {
        let result = (self.inner)(args)?;
        self.engine.mark_all(&result);
        Ok(result)
    }
}

/// Which arguments of a callback carry untrusted data.
///
/// # Examples
///
/// ```
/// use taintflow::ArgSpec;
///
/// let spec = ArgSpec::new().positions([0, 2]).keywords(["body"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArgSpec {
    positions: Vec<usize>,
    keywords: Vec<String>,
}

impl ArgSpec {
    /// Creates an empty selection (the wrapper then taints nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects positional argument indices.
    pub fn positions(mut self, positions: impl IntoIterator<Item = usize>) -> Self {
        self.positions.extend(positions);
        self
    }

    /// Selects keyword argument names.
    pub fn keywords<S: Into<String>>(mut self, keywords: impl IntoIterator<Item = S>) -> Self {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for (index, position) in self.positions.iter().enumerate() {
            if self.positions[..index].contains(position) {
                return Err(ConfigError::new(
                    ConfigErrorKind::DuplicatePosition,
                    format!("position {} listed more than once", position),
                ));
            }
        }
        for (index, keyword) in self.keywords.iter().enumerate() {
            if self.keywords[..index].contains(keyword) {
                return Err(ConfigError::new(
                    ConfigErrorKind::DuplicateKeyword,
                    format!("keyword {:?} listed more than once", keyword),
                ));
            }
        }
        Ok(())
    }
}

/// A wrapped callback whose selected arguments become tainted.
///
/// Built by [`Engine::untrusted_args`] for inversion-of-control
/// frameworks that push untrusted values into a callback the host did
/// not invoke directly. Marking happens before the inner call, against
/// the argument values themselves, so any alias the caller retains tests
/// tainted afterwards. The return value passes through untouched.
///
/// Selected positions or keywords missing from an actual call are
/// skipped; callback arity is the framework's business, not ours.
pub struct ArgSource<F> {
    engine: Engine,
    spec: ArgSpec,
    inner: F,
}

impl<F> ArgSource<F> {
    pub(crate) fn new(engine: Engine, spec: ArgSpec, inner: F) -> Self {
        Self { engine, spec, inner }
    }

    /// Taints the selected arguments, then invokes the wrapped function.
    ///
    /// # Errors
    ///
    /// Whatever the wrapped function returns propagates unchanged. The
    /// arguments stay tainted even when the call fails; they did enter
    /// the program.
    pub fn call<E>(&self, args: &Args) -> Result<Value, E>
    where
        F: Fn(&Args) -> Result<Value, E>,
    {
        for &position in &self.spec.positions {
            if let Some(value) = args.positional.get(position) {
                self.engine.mark_all(value);
            }
        }
        for keyword in &self.spec.keywords {
            if let Some(value) = args.keywords.get(keyword) {
                self.engine.mark_all(value);
            }
        }
        (self.inner)(args)
    }
}

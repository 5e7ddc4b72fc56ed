use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, Weak};

/// Identity of one tracked text allocation.
///
/// Two `Text` values share a `ValueId` iff they are clones of the same
/// allocation. Equal content in a fresh allocation gets a fresh id,
/// which is what keeps identity-based tracking from over-tainting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ValueId(usize);

/// A taint-capable textual scalar.
///
/// `Text` boxes a string in a shared allocation so that taint can be
/// tracked per allocation rather than per content. Every observable
/// string operation — comparison, ordering, hashing, formatting, use as
/// a map key — works on the content, so instrumented code cannot tell a
/// `Text` apart from the string it wraps. Whether the value is tainted
/// lives in the [`Engine`](crate::Engine)'s store, keyed by allocation
/// identity, never in the value itself.
///
/// Clones share the allocation, so taint follows a value through copies:
///
/// ```
/// use taintflow::{Engine, Value, VulnKind};
///
/// let engine = Engine::new();
/// let password = Value::from("' OR '1'='1");
/// let copy = password.clone();
///
/// engine.mark(&password, &[VulnKind::SQL_INJECTION]);
/// assert!(engine.is_tainted(&copy, VulnKind::SQL_INJECTION));
///
/// // A fresh value with equal content is NOT tainted.
/// let fresh = Value::from("' OR '1'='1");
/// assert!(!engine.tainted(&fresh));
/// ```
#[derive(Clone)]
pub struct Text(Arc<str>);

impl Text {
    /// Wraps a string in a fresh taint-trackable allocation.
    pub fn new(content: impl Into<Arc<str>>) -> Self {
        Self(content.into())
    }

    /// Returns the text content.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Allocation identity, the key under which taint is recorded.
    pub(crate) fn id(&self) -> ValueId {
        ValueId(Arc::as_ptr(&self.0) as *const u8 as usize)
    }

    /// Liveness handle for the store: lets a store entry detect that the
    /// last host reference dropped, without extending the value's life.
    pub(crate) fn weak(&self) -> Weak<str> {
        Arc::downgrade(&self.0)
    }
}

impl Deref for Text {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Text {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Text {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Text {}

impl PartialEq<str> for Text {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Text {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialOrd for Text {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Text {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for Text {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must agree with Borrow<str> for map-key lookups.
        self.as_str().hash(state);
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl From<&str> for Text {
    fn from(content: &str) -> Self {
        Text::new(content)
    }
}

impl From<String> for Text {
    fn from(content: String) -> Self {
        Text::new(content)
    }
}

/// A dynamically typed value flowing through instrumented calls.
///
/// Taint tracking is defined only for [`Text`] leaves. Numeric, boolean
/// and binary scalars pass through every taint operation untouched; this
/// is a deliberate limitation of the engine, not an oversight — only
/// textual data participates in the injection classes it detects.
/// Composites (`Seq`, `Record`) are never tainted as a whole; taint is
/// only ever recorded on their text leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// A boolean scalar. Never tainted.
    Bool(bool),
    /// An integer scalar. Never tainted.
    Int(i64),
    /// A floating-point scalar. Never tainted.
    Float(f64),
    /// A binary blob. Never tainted.
    Bytes(Vec<u8>),
    /// A textual scalar, the only taint-capable leaf.
    Text(Text),
    /// An ordered sequence of values.
    Seq(Vec<Value>),
    /// A key-value record.
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the text leaf if this value is textual.
    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the string content if this value is textual.
    pub fn as_str(&self) -> Option<&str> {
        self.as_text().map(Text::as_str)
    }
}

impl From<Text> for Value {
    fn from(text: Text) -> Self {
        Value::Text(text)
    }
}

impl From<&str> for Value {
    fn from(content: &str) -> Self {
        Value::Text(Text::new(content))
    }
}

impl From<String> for Value {
    fn from(content: String) -> Self {
        Value::Text(Text::new(content))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Record(entries)
    }
}

/// Arguments for one invocation of a wrapped host function.
///
/// Mirrors the positional-plus-keyword calling convention of the hosts
/// this engine instruments. Sinks scan both parts; argument sources mark
/// selected entries of either part.
///
/// # Examples
///
/// ```
/// use taintflow::{Args, Value};
///
/// let args = Args::new()
///     .arg("SELECT * FROM users")
///     .keyword("timeout", Value::Int(30));
/// assert_eq!(args.positional.len(), 1);
/// assert!(args.keywords.contains_key("timeout"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    /// Positional arguments, in call order.
    pub positional: Vec<Value>,
    /// Keyword arguments, by parameter name.
    pub keywords: BTreeMap<String, Value>,
}

impl Args {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an argument list from positional values only.
    pub fn from_positional(positional: Vec<Value>) -> Self {
        Self {
            positional,
            keywords: BTreeMap::new(),
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument.
    pub fn keyword(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.keywords.insert(name.to_string(), value.into());
        self
    }
}

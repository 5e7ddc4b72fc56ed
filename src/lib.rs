//! Runtime taint tracking for injection vulnerability detection.
//!
//! This crate observes, at runtime, whether a value that originated from
//! an untrusted source ever reaches a sensitive operation without
//! passing through a recognized sanitizer. It detects the classic
//! injection classes — cross-site scripting, SQL injection, OS command
//! injection, interpreter injection — without the instrumented program's
//! own logic being aware of it.
//!
//! # Core Types
//!
//! - [`Engine`]: the taint context — store, kind registry, enforce flag
//! - [`Value`] / [`Text`]: the dynamic value model; only text leaves
//!   can carry taint
//! - [`Source`] / [`ArgSource`]: wrappers that taint data entering the
//!   program
//! - [`Cleaner`]: wrapper that removes one kind of taint
//! - [`Sink`]: wrapper that checks every call of a sensitive operation
//! - [`Violation`]: a tainted value detected at a sink
//!
//! # Examples
//!
//! ```
//! use taintflow::{Args, Engine, Value, VulnKind};
//!
//! let engine = Engine::new();
//!
//! // Source: everything this function produces is untrusted.
//! let read_param = engine.untrusted(|_: &Args| {
//!     Ok::<_, std::convert::Infallible>(Value::from("aString"))
//! });
//!
//! // Sink: a query runner that must never see SQL-injection taint.
//! let run_query = engine
//!     .sink_for([VulnKind::SQL_INJECTION], |_: &Args| {
//!         Ok::<_, std::convert::Infallible>(Value::Int(1))
//!     })
//!     .unwrap();
//!
//! let param = read_param.call(&Args::new()).unwrap();
//! assert!(engine.tainted(&param));
//!
//! // Monitoring mode (default): reports the violation, still runs.
//! let rows = run_query.call(&Args::new().arg(param)).unwrap();
//! assert_eq!(rows, Value::Int(1));
//! ```
//!
//! # Limitations
//!
//! Taint is tracked for textual scalars only; numeric, boolean and
//! binary values pass through untouched. Tracking is by value identity
//! (clones share taint, equal-content fresh values do not), follows
//! explicit data flow only, and stays within one process.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cleaner;
mod engine;
mod error;
mod kind;
mod propagate;
mod report;
mod sink;
mod source;
mod store;
mod value;

pub use cleaner::Cleaner;
pub use engine::Engine;
pub use error::{ConfigError, ConfigErrorKind};
pub use kind::VulnKind;
pub use report::{default_reached, CallSite, ReachedHandler, Violation};
pub use sink::Sink;
pub use source::{ArgSource, ArgSpec, Source};
pub use value::{Args, Text, Value};

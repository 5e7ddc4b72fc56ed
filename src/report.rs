use std::fmt;
use std::fs;
use std::panic::Location;
use std::sync::Arc;
use std::time::SystemTime;

use crate::kind::VulnKind;
use crate::value::{Text, Value};

/// The source location of a sink invocation, for diagnostics only.
///
/// Captured at the moment a violation is detected. The excerpt is a
/// best-effort read of the source file around the offending line; it is
/// `None` when the file is not readable at runtime (installed binaries,
/// stripped build roots).
#[derive(Debug, Clone)]
pub struct CallSite {
    /// Source file of the sink call.
    pub file: &'static str,
    /// Line number of the sink call.
    pub line: u32,
    /// A short window of source text around the line, if available.
    pub excerpt: Option<String>,
}

impl CallSite {
    pub(crate) fn capture(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            excerpt: source_excerpt(location.file(), location.line()),
        }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One line of context on either side of the sink call.
fn source_excerpt(file: &str, line: u32) -> Option<String> {
    let source = fs::read_to_string(file).ok()?;
    let line = line as usize;
    let first = line.saturating_sub(2);

    let window: Vec<String> = source
        .lines()
        .enumerate()
        .skip(first)
        .take_while(|(index, _)| *index < line + 1)
        .map(|(index, content)| {
            let marker = if index + 1 == line { ">" } else { " " };
            format!("{} {:>4} | {}", marker, index + 1, content)
        })
        .collect();

    if window.is_empty() {
        None
    } else {
        Some(window.join("\n"))
    }
}

/// A tainted value reaching a sensitive sink.
///
/// Built by a [`Sink`](crate::Sink) when its scan finds a tainted leaf,
/// handed to the reached handler, and never stored by the engine. What
/// happens next — report and continue, or report and suppress — was
/// already decided by the engine's enforce flag before the handler runs.
#[derive(Debug, Clone)]
pub struct Violation {
    /// The matched vulnerability kind.
    pub kind: VulnKind,
    /// The registered name of the matched kind.
    pub kind_name: String,
    /// The offending text leaf.
    pub value: Text,
    /// Where the sink was invoked.
    pub site: CallSite,
    /// When the violation was detected.
    pub at: SystemTime,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} taint reached a sensitive sink at {}: {:?}",
            self.kind_name, self.site, self.value
        )?;
        if let Some(excerpt) = &self.site.excerpt {
            write!(f, "\n{}", excerpt)?;
        }
        Ok(())
    }
}

/// Handler invoked when a tainted value reaches a sink.
///
/// Its return value is what the sink call evaluates to when the engine
/// is enforcing (the real operation is suppressed); when not enforcing
/// it is invoked purely for its reporting side effect.
pub type ReachedHandler = Arc<dyn Fn(&Violation) -> Value + Send + Sync>;

/// The default reached handler: reports through `tracing` and yields
/// [`Value::Null`] for suppressed calls.
///
/// Performs no taint-store mutation and makes no control-flow decision
/// of its own.
pub fn default_reached(violation: &Violation) -> Value {
    tracing::warn!(
        kind = %violation.kind_name,
        site = %violation.site,
        "{}",
        violation
    );
    Value::Null
}

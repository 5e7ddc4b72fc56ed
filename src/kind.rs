/// Identifier for a category of injection vulnerability.
///
/// A `VulnKind` is a stable index into the process-wide kind registry.
/// Kinds are assigned in declaration order and are never renumbered or
/// removed within a process run, so a `VulnKind` captured early stays
/// valid for the lifetime of its [`Engine`](crate::Engine).
///
/// The four built-in kinds are available as associated constants; hosts
/// may register additional kinds through
/// [`Engine::register_kind`](crate::Engine::register_kind).
///
/// # Examples
///
/// ```
/// use taintflow::VulnKind;
///
/// assert_ne!(VulnKind::XSS, VulnKind::SQL_INJECTION);
/// assert_eq!(VulnKind::XSS.index(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VulnKind(u32);

impl VulnKind {
    /// Cross-site scripting.
    pub const XSS: VulnKind = VulnKind(0);
    /// SQL injection.
    pub const SQL_INJECTION: VulnKind = VulnKind(1);
    /// OS command injection.
    pub const OS_INJECTION: VulnKind = VulnKind(2);
    /// Interpreter/code injection (e.g. into an embedded evaluator).
    pub const INTERPRETER_INJECTION: VulnKind = VulnKind(3);

    /// Returns the registry index of this kind.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        VulnKind(index as u32)
    }
}

/// Registry of known vulnerability kinds, seeded with the built-ins.
///
/// Append-only: registering a name that already exists returns the
/// existing kind instead of creating a duplicate.
#[derive(Debug)]
pub(crate) struct KindRegistry {
    names: Vec<String>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        KindRegistry::new()
    }
}

impl KindRegistry {
    pub(crate) fn new() -> Self {
        Self {
            names: vec![
                "xss".to_string(),
                "sql-injection".to_string(),
                "os-injection".to_string(),
                "interpreter-injection".to_string(),
            ],
        }
    }

    pub(crate) fn register(&mut self, name: &str) -> VulnKind {
        if let Some(index) = self.names.iter().position(|n| n == name) {
            return VulnKind::from_index(index);
        }
        self.names.push(name.to_string());
        VulnKind::from_index(self.names.len() - 1)
    }

    pub(crate) fn contains(&self, kind: VulnKind) -> bool {
        kind.index() < self.names.len()
    }

    pub(crate) fn name(&self, kind: VulnKind) -> Option<&str> {
        self.names.get(kind.index()).map(String::as_str)
    }

    pub(crate) fn kinds(&self) -> Vec<VulnKind> {
        (0..self.names.len()).map(VulnKind::from_index).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_kinds_have_stable_indices() {
        let registry = KindRegistry::new();
        assert_eq!(registry.name(VulnKind::XSS), Some("xss"));
        assert_eq!(registry.name(VulnKind::SQL_INJECTION), Some("sql-injection"));
        assert_eq!(registry.name(VulnKind::OS_INJECTION), Some("os-injection"));
        assert_eq!(
            registry.name(VulnKind::INTERPRETER_INJECTION),
            Some("interpreter-injection")
        );
    }

    #[test]
    fn register_appends_in_declaration_order() {
        let mut registry = KindRegistry::new();
        let ldap = registry.register("ldap-injection");
        let xpath = registry.register("xpath-injection");

        assert_eq!(ldap.index(), 4);
        assert_eq!(xpath.index(), 5);
        assert_eq!(registry.kinds().len(), 6);
    }

    #[test]
    fn register_existing_name_returns_existing_kind() {
        let mut registry = KindRegistry::new();
        let first = registry.register("ldap-injection");
        let second = registry.register("ldap-injection");

        assert_eq!(first, second);
        assert_eq!(registry.register("xss"), VulnKind::XSS);
        assert_eq!(registry.kinds().len(), 5);
    }

    #[test]
    fn contains_rejects_out_of_range_kinds() {
        let registry = KindRegistry::new();
        assert!(registry.contains(VulnKind::INTERPRETER_INJECTION));
        assert!(!registry.contains(VulnKind::from_index(99)));
    }
}

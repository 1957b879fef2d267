use std::collections::HashMap;

use crate::channel::MethodError;
use crate::value::Value;

/// Outcome of one handler invocation.
pub type MethodResult = Result<Value, MethodError>;

/// A single method implementation. Handlers run synchronously on the
/// dispatching thread; any blocking work is the handler's own business.
/// `Sync` because the registry map is shared across threads even though
/// delivery to one channel is serialized by the host.
pub type MethodFn = Box<dyn Fn(&Value) -> MethodResult + Send + Sync>;

/// Finite method set for one channel, resolved at registration time.
///
/// Replaces stringly-typed if/else dispatch with a lookup table built
/// once: the supported-method set is fixed when the table is handed to
/// the messenger. Handlers needing mutable state bring their own
/// interior mutability.
#[derive(Default)]
pub struct MethodTable {
    entries: HashMap<String, MethodFn>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one method. Re-adding a name replaces the previous entry;
    /// the table is built in one place before registration, so a clash
    /// is a local bug, not a runtime condition.
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> MethodResult + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Box::new(f));
        self
    }

    pub fn supports(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the named method; `None` when the name is not in the set.
    pub(crate) fn invoke(&self, name: &str, arguments: &Value) -> Option<MethodResult> {
        self.entries.get(name).map(|f| f(arguments))
    }
}

impl std::fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.method_names().collect();
        names.sort_unstable();
        f.debug_struct("MethodTable").field("methods", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_table() -> MethodTable {
        MethodTable::new()
            .method("echo", |args| Ok(args.clone()))
            .method("fail", |_| Err(MethodError::new("nope", "always fails")))
    }

    #[test]
    fn test_supports() {
        let t = echo_table();
        assert!(t.supports("echo"));
        assert!(t.supports("fail"));
        assert!(!t.supports("getPlatformVersion"));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_invoke() {
        let t = echo_table();
        let args = Value::from("ping");
        assert_eq!(t.invoke("echo", &args), Some(Ok(Value::from("ping"))));
        assert!(matches!(t.invoke("fail", &args), Some(Err(e)) if e.code == "nope"));
        assert_eq!(t.invoke("unknownThing", &args), None);
    }

    #[test]
    fn test_rebind_replaces() {
        let t = MethodTable::new()
            .method("m", |_| Ok(Value::I32(1)))
            .method("m", |_| Ok(Value::I32(2)));
        assert_eq!(t.len(), 1);
        assert_eq!(t.invoke("m", &Value::Null), Some(Ok(Value::I32(2))));
    }
}

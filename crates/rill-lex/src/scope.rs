//! Scope rules and fully-qualified naming (§4.2.3).

use crate::error::LexErrorKind;
use crate::token::Scope;

/// Tracks which module (and, inside a function body, which function) the
/// lexer is currently inside, so every declaration can be turned into its
/// fully-qualified symbol-table key on the spot.
#[derive(Clone, Debug)]
pub struct ScopeTracker {
    module: String,
    function: Option<String>,
}

impl ScopeTracker {
    pub fn new(module: impl Into<String>) -> Self {
        ScopeTracker {
            module: module.into(),
            function: None,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn enter_function(&mut self, name: impl Into<String>) {
        self.function = Some(name.into());
    }

    pub fn exit_function(&mut self) {
        self.function = None;
    }

    pub fn in_function(&self) -> bool {
        self.function.is_some()
    }

    /// Validate a declaration's (scope, name) pair against §4.2.3's rules
    /// and, if valid, produce its fully-qualified symbol-table key.
    pub fn qualify(&self, scope: Scope, name: &str) -> Result<String, LexErrorKind> {
        match scope {
            Scope::Local => {
                if !self.in_function() {
                    return Err(LexErrorKind::WrongScopeDeclaration(name.to_string()));
                }
                if name.contains('.') {
                    return Err(LexErrorKind::ForbiddenDottedName(name.to_string()));
                }
                let function = self.function.as_deref().unwrap_or("");
                Ok(format!("Local.{}.{}.{}", self.module, function, name))
            }
            Scope::Script => {
                if name.contains('.') {
                    return Err(LexErrorKind::ForbiddenDottedName(name.to_string()));
                }
                Ok(format!("Script.{}.{}", self.module, name))
            }
            Scope::Global => {
                if let Some((first_segment, _)) = name.split_once('.') {
                    if first_segment != self.module {
                        return Err(LexErrorKind::ForbiddenDottedName(name.to_string()));
                    }
                    Ok(format!("Global.{}", name))
                } else {
                    Ok(format!("Global.{}.{}", self.module, name))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_requires_function_context() {
        let tracker = ScopeTracker::new("main");
        assert!(tracker.qualify(Scope::Local, "x").is_err());
    }

    #[test]
    fn local_name_inside_function_is_qualified() {
        let mut tracker = ScopeTracker::new("main");
        tracker.enter_function("doStuff");
        assert_eq!(
            tracker.qualify(Scope::Local, "x").unwrap(),
            "Local.main.doStuff.x"
        );
    }

    #[test]
    fn script_name_rejects_dots() {
        let tracker = ScopeTracker::new("main");
        assert!(tracker.qualify(Scope::Script, "a.b").is_err());
    }

    #[test]
    fn global_dotted_name_must_start_with_declaring_module() {
        let tracker = ScopeTracker::new("main");
        assert_eq!(
            tracker.qualify(Scope::Global, "main.counter").unwrap(),
            "Global.main.counter"
        );
        assert!(tracker.qualify(Scope::Global, "other.counter").is_err());
    }

    #[test]
    fn global_undotted_name_is_qualified_under_module() {
        let tracker = ScopeTracker::new("main");
        assert_eq!(
            tracker.qualify(Scope::Global, "counter").unwrap(),
            "Global.main.counter"
        );
    }
}

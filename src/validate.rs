#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// INVARIANT CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const INV_UNRESOLVED_VARIABLE: &str = "CSS-ERR-VAR-001";
pub const INV_UNBALANCED_BLOCK: &str = "CSS-ERR-BLOCK-001";
pub const INV_NESTING_DEPTH: &str = "CSS-ERR-BLOCK-002";
pub const INV_UNRESOLVED_MIXIN: &str = "CSS-ERR-MIXIN-001";
pub const INV_RECURSIVE_MIXIN: &str = "CSS-ERR-MIXIN-002";
pub const INV_FRAGMENT_ARITY: &str = "CSS-ERR-TEMPLATE-001";

// ═══════════════════════════════════════════════════════════════════════════════
// GUARANTEES
// ═══════════════════════════════════════════════════════════════════════════════

fn get_guarantee(code: &str) -> &'static str {
    match code {
        INV_UNRESOLVED_VARIABLE => {
            "Every variable reference resolves through the scope chain of the rule that uses it."
        }
        INV_UNBALANCED_BLOCK => "Every opened block is closed before the end of the stylesheet.",
        INV_NESTING_DEPTH => "Rule, media and mixin bodies nest at most a fixed number of levels deep.",
        INV_UNRESOLVED_MIXIN => "Every @include names a mixin visible from the including rule.",
        INV_RECURSIVE_MIXIN => "Mixin expansion always terminates.",
        INV_FRAGMENT_ARITY => "A template has exactly one more fragment than interpolated values.",
        _ => "Unknown invariant.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE LOCATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// 1-based position inside the compiled source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub const fn start() -> Self {
        Self { line: 1, column: 1 }
    }

    /// Position of the character following `ch` when `ch` sits at `self`.
    pub fn advance(self, ch: char) -> Self {
        if ch == '\n' {
            Self {
                line: self.line + 1,
                column: 1,
            }
        } else {
            Self {
                line: self.line,
                column: self.column + 1,
            }
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// What went wrong, independent of where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ErrorKind {
    UnresolvedVariable { name: String },
    UnbalancedBlock,
    NestingTooDeep { limit: usize },
    UnresolvedMixin { name: String },
    RecursiveMixin { name: String },
    FragmentArity { fragments: usize, values: usize },
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnresolvedVariable { .. } => INV_UNRESOLVED_VARIABLE,
            ErrorKind::UnbalancedBlock => INV_UNBALANCED_BLOCK,
            ErrorKind::NestingTooDeep { .. } => INV_NESTING_DEPTH,
            ErrorKind::UnresolvedMixin { .. } => INV_UNRESOLVED_MIXIN,
            ErrorKind::RecursiveMixin { .. } => INV_RECURSIVE_MIXIN,
            ErrorKind::FragmentArity { .. } => INV_FRAGMENT_ARITY,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ErrorKind::UnresolvedVariable { .. }
            | ErrorKind::UnresolvedMixin { .. }
            | ErrorKind::RecursiveMixin { .. } => "SCOPE_RESOLUTION_FAILURE",
            ErrorKind::UnbalancedBlock | ErrorKind::NestingTooDeep { .. } => "SYNTAX_ERROR",
            ErrorKind::FragmentArity { .. } => "TEMPLATE_CONTRACT_VIOLATION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerError {
    pub kind: ErrorKind,
    pub code: String,
    pub error_type: String,
    pub message: String,
    pub guarantee: String,
    pub line: u32,
    pub column: u32,
    pub context: Option<String>,
    pub hints: Vec<String>,
}

impl CompilerError {
    pub fn new(kind: ErrorKind, message: &str, location: SourceLocation) -> Self {
        Self::with_details(kind, message, location, None, vec![])
    }

    pub fn with_details(
        kind: ErrorKind,
        message: &str,
        location: SourceLocation,
        context: Option<String>,
        hints: Vec<String>,
    ) -> Self {
        let code = kind.code();
        CompilerError {
            code: code.to_string(),
            error_type: kind.error_type().to_string(),
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            line: location.line,
            column: location.column,
            context,
            hints,
            kind,
        }
    }

    pub fn unresolved_variable(name: &str, location: SourceLocation) -> Self {
        Self::with_details(
            ErrorKind::UnresolvedVariable {
                name: name.to_string(),
            },
            &format!("Variable ${} not defined", name),
            location,
            None,
            vec![format!(
                "Declare `${}: <value>;` in this rule or an enclosing one, or mark an inner declaration with `!global`.",
                name
            )],
        )
    }

    pub fn unbalanced_block(location: SourceLocation, context: Option<String>) -> Self {
        Self::with_details(
            ErrorKind::UnbalancedBlock,
            "Unbalanced braces in stylesheet",
            location,
            context,
            vec!["Check that every `{` has a matching `}`.".to_string()],
        )
    }

    pub fn nesting_too_deep(limit: usize, location: SourceLocation) -> Self {
        Self::with_details(
            ErrorKind::NestingTooDeep { limit },
            &format!("Blocks nested more than {} levels deep", limit),
            location,
            None,
            vec!["Flatten the stylesheet or split it into several rules.".to_string()],
        )
    }

    pub fn unresolved_mixin(name: &str, location: SourceLocation) -> Self {
        Self::new(
            ErrorKind::UnresolvedMixin {
                name: name.to_string(),
            },
            &format!("Mixin '{}' is not defined in this scope", name),
            location,
        )
    }

    pub fn recursive_mixin(name: &str, location: SourceLocation, chain: &[String]) -> Self {
        Self::with_details(
            ErrorKind::RecursiveMixin {
                name: name.to_string(),
            },
            &format!("Recursive @include of mixin '{}'", name),
            location,
            Some(chain.join(" -> ")),
            vec![],
        )
    }

    pub fn fragment_arity(fragments: usize, values: usize) -> Self {
        Self::new(
            ErrorKind::FragmentArity { fragments, values },
            &format!(
                "Expected {} template fragments for {} values, got {}",
                values + 1,
                values,
                fragments
            ),
            SourceLocation::start(),
        )
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
        }
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} at {}",
            self.code,
            self.message,
            self.location()
        )?;
        if let Some(context) = &self.context {
            write!(f, " ({})", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompilerError {}

/// Check the fragment/value contract of a tagged template.
pub fn validate_fragments<T>(fragments: &[&str], values: &[T]) -> Result<(), CompilerError> {
    if fragments.len() == values.len() + 1 {
        Ok(())
    } else {
        Err(CompilerError::fragment_arity(fragments.len(), values.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_carries_code_and_guarantee() {
        let err = CompilerError::unresolved_variable("missing", SourceLocation { line: 3, column: 7 });
        assert_eq!(err.code, INV_UNRESOLVED_VARIABLE);
        assert_eq!(err.error_type, "SCOPE_RESOLUTION_FAILURE");
        assert!(err.guarantee.contains("scope chain"));
        assert_eq!(
            err.kind,
            ErrorKind::UnresolvedVariable {
                name: "missing".to_string()
            }
        );
        assert_eq!(err.to_string(), "[CSS-ERR-VAR-001] Variable $missing not defined at 3:7");
    }

    #[test]
    fn test_location_advance() {
        let loc = SourceLocation::start().advance('a').advance('\n').advance('b');
        assert_eq!(loc, SourceLocation { line: 2, column: 2 });
    }

    #[test]
    fn test_validate_fragments() {
        assert!(validate_fragments(&["a", "b"], &[1]).is_ok());
        let err = validate_fragments(&["a"], &[1]).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::FragmentArity {
                fragments: 1,
                values: 1
            }
        );
    }

    #[test]
    fn test_nesting_error_code() {
        let err = CompilerError::nesting_too_deep(64, SourceLocation { line: 1, column: 9 });
        assert_eq!(err.code, INV_NESTING_DEPTH);
        assert_eq!(err.kind, ErrorKind::NestingTooDeep { limit: 64 });
        assert_eq!(
            err.to_string(),
            "[CSS-ERR-BLOCK-002] Blocks nested more than 64 levels deep at 1:9"
        );
    }

    #[test]
    fn test_error_serializes_kind_tag() {
        let err = CompilerError::unbalanced_block(SourceLocation::start(), None);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"]["kind"], "unbalanced-block");
        assert_eq!(json["code"], INV_UNBALANCED_BLOCK);
        assert_eq!(json["errorType"], "SYNTAX_ERROR");
    }
}

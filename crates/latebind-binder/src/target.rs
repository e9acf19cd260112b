//! Resolution results: success, ambiguity, and the failure taxonomy.
//!
//! Every outcome is data. The resolver never panics or throws on a failed
//! bind; it returns a `BindingTarget` carrying enough structure for a host
//! to render its own error message.

use std::fmt;

use latebind_common::{NarrowingLevel, TypeId, TypeTable};

use crate::arguments::ArgumentsError;
use crate::binding::{ArgumentBinding, BindFailure};
use crate::candidate::MethodCandidate;

/// One argument's conversion attempt against one candidate. `failed` marks
/// the first position that broke the candidate; later positions are
/// reported unchecked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionResult {
    pub from: TypeId,
    pub to: TypeId,
    pub failed: bool,
}

/// Why one candidate dropped out.
#[derive(Clone, Debug, PartialEq)]
pub enum CallFailureReason {
    /// Some argument was not convertible to its bound parameter at any
    /// attempted narrowing level.
    ConversionFailure { conversions: Vec<ConversionResult> },
    /// A keyword argument matched no parameter.
    UnassignableKeyword { name: String },
    /// A keyword argument collided with a positional or repeated keyword.
    DuplicateKeyword { name: String },
    /// Generic type inference produced no consistent instantiation.
    TypeInference,
}

impl From<BindFailure> for CallFailureReason {
    fn from(f: BindFailure) -> Self {
        match f {
            BindFailure::UnboundKeyword { name } => CallFailureReason::UnassignableKeyword { name },
            BindFailure::DuplicateKeyword { name } => CallFailureReason::DuplicateKeyword { name },
        }
    }
}

/// Per-candidate diagnostic retained when resolution fails.
#[derive(Clone, Debug, PartialEq)]
pub struct CallFailure {
    pub signature_name: String,
    pub arity: usize,
    pub reason: CallFailureReason,
}

/// Terminal output of one resolution call.
#[derive(Clone, Debug)]
pub enum BindingTarget {
    /// A unique best candidate was found.
    Success {
        candidate: MethodCandidate,
        binding: ArgumentBinding,
        level: NarrowingLevel,
        /// The argument types the match was decided against, in slot order.
        restricted_types: Vec<Option<TypeId>>,
    },
    /// Several candidates survived filtering and none dominates.
    AmbiguousMatch { candidates: Vec<MethodCandidate> },
    /// No candidate accepts this many arguments.
    IncorrectArgumentCount { expected: Vec<usize>, actual: usize },
    /// Candidates existed at this arity but all failed; one record each.
    CallFailure { failures: Vec<CallFailure> },
    /// The actual arguments themselves were malformed.
    InvalidArguments { error: ArgumentsError },
    /// The candidate set was empty from the start.
    NoCallableMethod,
}

impl BindingTarget {
    pub fn is_success(&self) -> bool {
        matches!(self, BindingTarget::Success { .. })
    }

    /// Stable tag for the outcome kind.
    pub fn kind(&self) -> &'static str {
        match self {
            BindingTarget::Success { .. } => "success",
            BindingTarget::AmbiguousMatch { .. } => "ambiguous-match",
            BindingTarget::IncorrectArgumentCount { .. } => "incorrect-argument-count",
            BindingTarget::CallFailure { .. } => "call-failure",
            BindingTarget::InvalidArguments { .. } => "invalid-arguments",
            BindingTarget::NoCallableMethod => "no-callable-method",
        }
    }

    /// The winning candidate, if resolution succeeded.
    pub fn candidate(&self) -> Option<&MethodCandidate> {
        match self {
            BindingTarget::Success { candidate, .. } => Some(candidate),
            _ => None,
        }
    }

    /// Render a host-facing message; `table` supplies type names.
    pub fn display<'a>(&'a self, table: &'a TypeTable) -> TargetDisplay<'a> {
        TargetDisplay { target: self, table }
    }
}

impl From<ArgumentsError> for BindingTarget {
    fn from(error: ArgumentsError) -> Self {
        BindingTarget::InvalidArguments { error }
    }
}

/// `Display` adapter carrying the type table needed to name types.
pub struct TargetDisplay<'a> {
    target: &'a BindingTarget,
    table: &'a TypeTable,
}

impl fmt::Display for TargetDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            BindingTarget::Success { candidate, level, .. } => write!(
                f,
                "resolved to {} (narrowing {:?})",
                candidate.signature.name, level
            ),
            BindingTarget::AmbiguousMatch { candidates } => {
                write!(f, "ambiguous call; {} candidates remain:", candidates.len())?;
                for c in candidates {
                    let params: Vec<String> =
                        c.params.iter().map(|p| self.table.display(p.ty)).collect();
                    write!(f, " {}({})", c.signature.name, params.join(", "))?;
                }
                Ok(())
            }
            BindingTarget::IncorrectArgumentCount { expected, actual } => {
                let expected: Vec<String> = expected.iter().map(usize::to_string).collect();
                write!(
                    f,
                    "wrong number of arguments: got {actual}, accepted counts are {}",
                    expected.join(", ")
                )
            }
            BindingTarget::CallFailure { failures } => {
                write!(f, "no overload matched:")?;
                for fail in failures {
                    write!(f, " [{}/{}: ", fail.signature_name, fail.arity)?;
                    match &fail.reason {
                        CallFailureReason::ConversionFailure { conversions } => {
                            match conversions.iter().find(|c| c.failed) {
                                Some(c) => write!(
                                    f,
                                    "cannot convert {} to {}",
                                    self.table.display(c.from),
                                    self.table.display(c.to)
                                )?,
                                None => write!(f, "conversion failure")?,
                            }
                        }
                        CallFailureReason::UnassignableKeyword { name } => {
                            write!(f, "unknown keyword '{name}'")?;
                        }
                        CallFailureReason::DuplicateKeyword { name } => {
                            write!(f, "duplicate keyword '{name}'")?;
                        }
                        CallFailureReason::TypeInference => {
                            write!(f, "could not infer generic arguments")?;
                        }
                    }
                    write!(f, "]")?;
                }
                Ok(())
            }
            BindingTarget::InvalidArguments { error } => {
                write!(f, "invalid arguments: {error:?}")
            }
            BindingTarget::NoCallableMethod => write!(f, "no callable method"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_failures_map_to_reasons() {
        let unbound = BindFailure::UnboundKeyword { name: "x".into() };
        assert_eq!(
            CallFailureReason::from(unbound),
            CallFailureReason::UnassignableKeyword { name: "x".into() }
        );
    }

    #[test]
    fn count_mismatch_renders_expected_counts() {
        let table = TypeTable::new();
        let target = BindingTarget::IncorrectArgumentCount { expected: vec![2, 3], actual: 5 };
        let text = target.display(&table).to_string();
        assert!(text.contains("got 5"));
        assert!(text.contains("2, 3"));
    }
}

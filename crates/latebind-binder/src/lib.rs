//! Call-site overload resolution and call binding.
//!
//! Given a list of candidate signatures and one call's actual arguments
//! (positional, named, splatted), the resolver reproduces static
//! overload-resolution semantics at call time:
//!
//! - candidate-set construction (defaults, by-ref reduction, variadic
//!   expansion) partitioned by arity
//! - named-argument permutation onto parameter slots
//! - convertibility filtering across graded narrowing levels
//! - generic type inference for open candidates
//! - two-stage tie-breaking among survivors
//!
//! The outcome is a [`BindingTarget`]: a directly materializable success or
//! a structured failure. Conversions are delegated to the host through the
//! `ConversionOracle` trait from `latebind-common`.

mod arguments;
mod binding;
mod builders;
mod cache;
mod candidate;
mod candidate_set;
mod infer;
mod plan;
mod resolve;
mod signature;
mod target;

pub use arguments::{ActualArguments, ArgumentsError};
pub use binding::{bind_named_arguments, slot_types, ArgumentBinding, BindFailure};
pub use builders::{priority, ArgBuilder, ReturnBuilder};
pub use cache::CandidateCache;
pub use candidate::{expand_variadic, make_candidates, MethodCandidate};
pub use candidate_set::CandidateSets;
pub use infer::{infer_candidate, InferenceError};
pub use plan::{InvocationPlan, PlanError};
pub use resolve::{OverloadResolver, ResolverOptions};
pub use signature::{
    ConstraintFlags, GenericParam, ParamFlags, ParameterDescriptor, Signature,
};
pub use target::{
    BindingTarget, CallFailure, CallFailureReason, ConversionResult, TargetDisplay,
};

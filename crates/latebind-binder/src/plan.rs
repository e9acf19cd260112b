//! Materializing a successful binding into an invocation.
//!
//! The resolver's output is declarative; this module exercises it. An
//! `InvocationPlan` runs the winning candidate's builders to produce the
//! formal argument slots, hands the mutable slots to a callee, and packs the
//! visible result through the return builder. Asking for a plan from a
//! non-success target is the one caller-misuse fault in the API, surfaced
//! as an error value rather than a panic.

use latebind_common::{ConversionOracle, ConvertError, Value};

use crate::arguments::ActualArguments;
use crate::builders::{ArgBuilder, ReturnBuilder};
use crate::candidate::MethodCandidate;
use crate::target::BindingTarget;

#[derive(Clone, Debug, PartialEq)]
pub enum PlanError {
    /// The binding target was not a success; `kind` names what it was.
    NotBindable { kind: &'static str },
    /// A builder could not materialize its value.
    Convert(ConvertError),
}

/// Ordered per-parameter value producers plus return packing for one
/// resolved call.
#[derive(Debug)]
pub struct InvocationPlan {
    candidate: MethodCandidate,
}

impl InvocationPlan {
    pub fn from_target(target: &BindingTarget) -> Result<Self, PlanError> {
        match target {
            BindingTarget::Success { candidate, .. } => Ok(InvocationPlan {
                candidate: candidate.clone(),
            }),
            other => Err(PlanError::NotBindable { kind: other.kind() }),
        }
    }

    /// Formal parameter count of the underlying callable.
    pub fn formal_count(&self) -> usize {
        self.candidate.builders.len()
    }

    pub fn builders(&self) -> &[ArgBuilder] {
        &self.candidate.builders
    }

    pub fn return_builder(&self) -> &ReturnBuilder {
        &self.candidate.return_builder
    }

    /// Build the formal argument values without invoking anything.
    pub fn materialize_arguments(
        &self,
        args: &ActualArguments,
        oracle: &dyn ConversionOracle,
    ) -> Result<Vec<Value>, PlanError> {
        let mut consumed = vec![false; args.slot_count()];
        let mut slots = Vec::with_capacity(self.candidate.builders.len());
        // Declaration order; collectors are trailing, so every named slot a
        // declared parameter claims is marked before a params-dict sweeps
        // the leftovers.
        for builder in &self.candidate.builders {
            slots.push(
                builder
                    .produce(args, oracle, &mut consumed)
                    .map_err(PlanError::Convert)?,
            );
        }
        Ok(slots)
    }

    /// Materialize arguments, run the callee against the mutable slots (so
    /// by-ref writes are observable), and pack the visible result.
    pub fn invoke<F>(
        &self,
        args: &ActualArguments,
        oracle: &dyn ConversionOracle,
        callee: F,
    ) -> Result<Value, PlanError>
    where
        F: FnOnce(&mut [Value]) -> Value,
    {
        let mut slots = self.materialize_arguments(args, oracle)?;
        let ret = callee(&mut slots);
        Ok(self.candidate.return_builder.pack(ret, &slots))
    }
}

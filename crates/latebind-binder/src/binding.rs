//! Named-argument binding: mapping keyword arguments onto parameter slots.

use latebind_common::TypeId;

use crate::arguments::ActualArguments;
use crate::signature::ParameterDescriptor;

/// How one candidate's parameter slots are fed from the actual arguments.
///
/// Positional arguments fill the first `positional_count` slots in order.
/// For named argument `i`, `permutation[i]` is the offset past
/// `positional_count` of the slot it fills; `None` marks a name absorbed by
/// a params-dictionary rather than a declared parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgumentBinding {
    positional_count: usize,
    permutation: Vec<Option<usize>>,
}

impl ArgumentBinding {
    /// Positional-only binding (identity mapping).
    pub fn positional(count: usize) -> Self {
        ArgumentBinding {
            positional_count: count,
            permutation: Vec::new(),
        }
    }

    pub fn positional_count(&self) -> usize {
        self.positional_count
    }

    pub fn named_count(&self) -> usize {
        self.permutation.len()
    }

    /// Parameter slot fed by logical argument slot `arg`. `None` for a
    /// dictionary-absorbed named argument.
    pub fn argument_to_parameter(&self, arg: usize) -> Option<usize> {
        if arg < self.positional_count {
            Some(arg)
        } else {
            self.permutation[arg - self.positional_count].map(|p| self.positional_count + p)
        }
    }

    /// Inverse direction: the logical argument slot feeding parameter slot
    /// `param`, if any.
    pub fn parameter_to_argument(&self, param: usize) -> Option<usize> {
        if param < self.positional_count {
            return Some(param);
        }
        let offset = param - self.positional_count;
        self.permutation
            .iter()
            .position(|&p| p == Some(offset))
            .map(|i| self.positional_count + i)
    }

    /// Whether parameter slot `param` is filled by a named argument.
    pub fn is_named_filled(&self, param: usize) -> bool {
        param >= self.positional_count
            && self
                .permutation
                .contains(&Some(param - self.positional_count))
    }

    /// Named argument indices no declared parameter claims.
    pub fn absorbed_named(&self) -> impl Iterator<Item = usize> + '_ {
        self.permutation
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_none())
            .map(|(i, _)| i)
    }

    /// Every one of the first `slots` parameter slots is fed by some
    /// argument.
    pub fn covers(&self, slots: usize) -> bool {
        (self.positional_count..slots).all(|s| self.is_named_filled(s))
    }
}

/// A name that could not be bound, kept as data for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindFailure {
    /// No parameter of that name exists on the candidate.
    UnboundKeyword { name: String },
    /// The name targets a parameter already filled positionally or by
    /// another keyword.
    DuplicateKeyword { name: String },
}

/// Match the call's named arguments against a candidate's per-slot parameter
/// list. Params-collection parameters are invisible to name lookup; with
/// `absorb_unmatched` set (candidate carries a params-dictionary), names
/// matching no parameter become `None` entries instead of failures.
///
/// The first violation is returned; the candidate is excluded but the
/// failure is retained by the resolver for diagnostics.
pub fn bind_named_arguments(
    params: &[ParameterDescriptor],
    args: &ActualArguments,
    absorb_unmatched: bool,
) -> Result<ArgumentBinding, BindFailure> {
    let positional_count = args.positional_count();
    if args.named_count() == 0 {
        return Ok(ArgumentBinding::positional(positional_count));
    }
    let mut permutation = Vec::with_capacity(args.named_count());
    let mut taken = vec![false; params.len().saturating_sub(positional_count)];
    for i in 0..args.named_count() {
        let name = args.name(i);
        let slot = params
            .iter()
            .position(|p| !p.is_params_collector() && p.name == name);
        let Some(slot) = slot else {
            if absorb_unmatched {
                permutation.push(None);
                continue;
            }
            return Err(BindFailure::UnboundKeyword { name: name.to_string() });
        };
        if slot < positional_count {
            return Err(BindFailure::DuplicateKeyword { name: name.to_string() });
        }
        let offset = slot - positional_count;
        if taken[offset] {
            return Err(BindFailure::DuplicateKeyword { name: name.to_string() });
        }
        taken[offset] = true;
        permutation.push(Some(offset));
    }
    Ok(ArgumentBinding {
        positional_count,
        permutation,
    })
}

/// The static type of the argument feeding each parameter slot, in slot
/// order, resolved through the permutation. `None` for slots fed by no
/// argument (default-filled or out-only).
pub fn slot_types(
    binding: &ArgumentBinding,
    args: &ActualArguments,
    slots: usize,
) -> Vec<Option<TypeId>> {
    (0..slots)
        .map(|slot| {
            binding
                .parameter_to_argument(slot)
                .and_then(|arg| args.slot_type(arg))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use latebind_common::Value;

    fn params(names: &[&str]) -> Vec<ParameterDescriptor> {
        names
            .iter()
            .map(|n| ParameterDescriptor::new(n, TypeId::I64))
            .collect()
    }

    fn call(positional: usize, named: &[&str]) -> ActualArguments {
        let pos = (0..positional).map(|_| (TypeId::I64, Value::I64(0))).collect();
        let named = named
            .iter()
            .map(|n| (n.to_string(), TypeId::I64, Value::I64(0)))
            .collect();
        ActualArguments::new(pos, named).unwrap()
    }

    #[test]
    fn positional_only_is_identity() {
        let binding = bind_named_arguments(&params(&["a", "b"]), &call(2, &[]), false).unwrap();
        assert_eq!(binding.argument_to_parameter(0), Some(0));
        assert_eq!(binding.argument_to_parameter(1), Some(1));
        assert_eq!(binding.named_count(), 0);
        assert!(binding.covers(2));
    }

    #[test]
    fn names_permute_to_declared_slots() {
        // f(0, c: _, b: _) against f(a, b, c).
        let binding =
            bind_named_arguments(&params(&["a", "b", "c"]), &call(1, &["c", "b"]), false).unwrap();
        assert_eq!(binding.argument_to_parameter(1), Some(2));
        assert_eq!(binding.argument_to_parameter(2), Some(1));
        assert_eq!(binding.parameter_to_argument(2), Some(1));
        assert!(binding.is_named_filled(1));
        assert!(!binding.is_named_filled(0));
        assert!(binding.covers(3));
    }

    #[test]
    fn unknown_name_is_unbound() {
        let err = bind_named_arguments(&params(&["a"]), &call(0, &["zz"]), false).unwrap_err();
        assert_eq!(err, BindFailure::UnboundKeyword { name: "zz".into() });
    }

    #[test]
    fn dict_candidates_absorb_unknown_names() {
        let binding = bind_named_arguments(&params(&["a"]), &call(1, &["zz"]), true).unwrap();
        assert_eq!(binding.argument_to_parameter(1), None);
        assert_eq!(binding.absorbed_named().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn positional_collision_is_duplicate() {
        let err = bind_named_arguments(&params(&["a", "b"]), &call(1, &["a"]), false).unwrap_err();
        assert_eq!(err, BindFailure::DuplicateKeyword { name: "a".into() });
    }

    #[test]
    fn repeated_name_is_duplicate() {
        let err = bind_named_arguments(&params(&["a", "b"]), &call(0, &["b", "b"]), false).unwrap_err();
        assert_eq!(err, BindFailure::DuplicateKeyword { name: "b".into() });
    }

    #[test]
    fn uncovered_slots_are_detected() {
        // Two parameters, one positional argument, no names: slot 1 unfed.
        let binding = bind_named_arguments(&params(&["a", "b"]), &call(1, &[]), false).unwrap();
        assert!(!binding.covers(2));
    }
}

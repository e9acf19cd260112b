//! The overload resolver: candidate selection, tiered filtering,
//! tie-breaking, and binding-target production.

use std::sync::Arc;

use latebind_common::{ConversionOracle, NarrowingLevel, TypeId, TypeTable};
use tracing::{debug, trace};

use crate::arguments::ActualArguments;
use crate::binding::{bind_named_arguments, slot_types, ArgumentBinding};
use crate::candidate::MethodCandidate;
use crate::candidate_set::CandidateSets;
use crate::signature::{ParameterDescriptor, Signature};
use crate::target::{BindingTarget, CallFailure, CallFailureReason, ConversionResult};

/// Per-call resolver configuration.
#[derive(Clone, Debug)]
pub struct ResolverOptions {
    pub min_level: NarrowingLevel,
    pub max_level: NarrowingLevel,
    /// Call-site name; exact signature-name matches win final tie-breaks.
    pub call_name: Option<String>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverOptions {
            min_level: NarrowingLevel::None,
            max_level: NarrowingLevel::All,
            call_name: None,
        }
    }
}

/// A candidate that survived named-argument binding.
struct Applicable {
    candidate: MethodCandidate,
    binding: ArgumentBinding,
    /// Candidate started as an open generic definition; remembered for
    /// tie-breaking after instantiation closes the signature.
    was_open: bool,
}

/// Pairwise candidate ordering.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Preference {
    First,
    Second,
    Equivalent,
    Ambiguous,
}

impl Preference {
    #[cfg(test)]
    fn flip(self) -> Preference {
        match self {
            Preference::First => Preference::Second,
            Preference::Second => Preference::First,
            other => other,
        }
    }
}

/// Synchronous, per-call overload resolution over a shared type table and
/// conversion oracle. The resolver holds no mutable state; one instance can
/// serve concurrent calls.
pub struct OverloadResolver<'a> {
    table: &'a TypeTable,
    oracle: &'a dyn ConversionOracle,
    options: ResolverOptions,
}

impl<'a> OverloadResolver<'a> {
    pub fn new(table: &'a TypeTable, oracle: &'a dyn ConversionOracle) -> Self {
        OverloadResolver {
            table,
            oracle,
            options: ResolverOptions::default(),
        }
    }

    pub fn with_options(
        table: &'a TypeTable,
        oracle: &'a dyn ConversionOracle,
        options: ResolverOptions,
    ) -> Self {
        OverloadResolver { table, oracle, options }
    }

    /// Resolve against a signature list, building candidate sets on the fly.
    /// Hosts resolving the same signature list repeatedly should build (or
    /// cache) `CandidateSets` once and use `resolve_with_sets`.
    pub fn resolve(&self, signatures: &[Arc<Signature>], args: &ActualArguments) -> BindingTarget {
        let sets = CandidateSets::build(signatures, self.table);
        self.resolve_with_sets(&sets, args)
    }

    pub fn resolve_with_sets(&self, sets: &CandidateSets, args: &ActualArguments) -> BindingTarget {
        if sets.is_empty() {
            return BindingTarget::NoCallableMethod;
        }
        let candidates = sets.candidates_for(args, self.table);
        if candidates.is_empty() {
            return BindingTarget::IncorrectArgumentCount {
                expected: sets.expected_arities(),
                actual: args.visible_count(),
            };
        }
        debug!(
            arity = args.visible_count(),
            candidates = candidates.len(),
            "resolving call"
        );

        let mut failures = Vec::new();
        let mut main = Vec::new();
        let mut fallback = Vec::new();
        for cand in candidates {
            let absorb = cand.is_expanded && cand.has_params_dict;
            match bind_named_arguments(&cand.params, args, absorb) {
                Ok(binding) => {
                    if !binding.covers(cand.params.len()) {
                        continue;
                    }
                    let was_open = cand.is_open(self.table);
                    let bound = cand.bound(&binding);
                    let app = Applicable { candidate: bound, binding, was_open };
                    if app.candidate.is_dict_only_variadic() {
                        fallback.push(app);
                    } else {
                        main.push(app);
                    }
                }
                Err(fail) => failures.push(CallFailure {
                    signature_name: cand.signature.name.clone(),
                    arity: cand.arity(),
                    reason: fail.into(),
                }),
            }
        }
        // Dictionary-only candidates are a fallback tier.
        let applicable = if main.is_empty() { fallback } else { main };
        if applicable.is_empty() {
            return if failures.is_empty() {
                BindingTarget::IncorrectArgumentCount {
                    expected: sets.expected_arities(),
                    actual: args.visible_count(),
                }
            } else {
                BindingTarget::CallFailure { failures }
            };
        }

        let mut last_failures = Vec::new();
        for level in self.options.min_level.through(self.options.max_level) {
            let mut level_failures = failures.clone();
            let mut survivors: Vec<Applicable> = Vec::new();
            for app in &applicable {
                match self.filter_candidate(app, args, level) {
                    Ok(filtered) => survivors.push(filtered),
                    Err(failure) => level_failures.push(failure),
                }
            }
            trace!(?level, survivors = survivors.len(), "filtered narrowing level");
            if survivors.len() > 1 && args.collapsed_count() > 0 {
                survivors.retain(|app| self.collapsed_elements_convert(app, args, level));
            }
            if survivors.is_empty() {
                last_failures = level_failures;
                continue;
            }
            if survivors.len() == 1 {
                if let Some(winner) = survivors.pop() {
                    return self.success(winner, args, level);
                }
            }
            if let Some(best) = self.find_best(&survivors, args) {
                let winner = survivors.swap_remove(best);
                return self.success(winner, args, level);
            }
            debug!(?level, "no dominating candidate");
            return BindingTarget::AmbiguousMatch {
                candidates: survivors.into_iter().map(|a| a.candidate).collect(),
            };
        }
        if last_failures.is_empty() {
            BindingTarget::NoCallableMethod
        } else {
            BindingTarget::CallFailure { failures: last_failures }
        }
    }

    fn success(&self, app: Applicable, args: &ActualArguments, level: NarrowingLevel) -> BindingTarget {
        debug!(signature = %app.candidate.signature.name, ?level, "resolved");
        let restricted_types = slot_types(&app.binding, args, app.candidate.params.len());
        BindingTarget::Success {
            candidate: app.candidate,
            binding: app.binding,
            level,
            restricted_types,
        }
    }

    /// Check one applicable candidate at one narrowing level, running
    /// generic inference first when the candidate is still open.
    fn filter_candidate(
        &self,
        app: &Applicable,
        args: &ActualArguments,
        level: NarrowingLevel,
    ) -> Result<Applicable, CallFailure> {
        let failure = |reason| CallFailure {
            signature_name: app.candidate.signature.name.clone(),
            arity: app.candidate.arity(),
            reason,
        };
        let candidate = if app.was_open && app.candidate.is_open(self.table) {
            match crate::infer::infer_candidate(
                &app.candidate,
                &app.binding,
                args,
                self.table,
                self.oracle,
            ) {
                Ok(closed) => closed,
                Err(err) => {
                    trace!(signature = %app.candidate.signature.name, ?err, "inference failed");
                    return Err(failure(CallFailureReason::TypeInference));
                }
            }
        } else {
            app.candidate.clone()
        };

        let mut conversions = Vec::with_capacity(candidate.params.len());
        for slot in 0..candidate.params.len() {
            let Some(arg) = app.binding.parameter_to_argument(slot) else {
                continue;
            };
            let Some((from, value)) = args.slot(arg) else {
                continue;
            };
            let param = candidate.param_for_slot(slot);
            let ok = self.oracle.can_convert(
                from,
                Some(&value),
                param.ty,
                param.prohibits_null(),
                level,
            );
            conversions.push(ConversionResult { from, to: param.ty, failed: !ok });
            if !ok {
                return Err(failure(CallFailureReason::ConversionFailure { conversions }));
            }
        }
        Ok(Applicable {
            candidate,
            binding: app.binding.clone(),
            was_open: app.was_open,
        })
    }

    /// Collapsed spread items are not individually visible as argument
    /// slots in the non-expanded candidates; validate them against the
    /// variadic element type directly.
    fn collapsed_elements_convert(
        &self,
        app: &Applicable,
        args: &ActualArguments,
        level: NarrowingLevel,
    ) -> bool {
        let Some(element) = app.candidate.variadic_element else {
            return true;
        };
        for offset in 0..args.collapsed_count() {
            let Some((from, value)) = args.collapsed_item(offset) else {
                return false;
            };
            if !self.oracle.can_convert(from, Some(&value), element, false, level) {
                return false;
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Tie-breaking
    // ------------------------------------------------------------------

    /// Index of the candidate preferred over every other survivor, if one
    /// exists.
    fn find_best(&self, survivors: &[Applicable], args: &ActualArguments) -> Option<usize> {
        'outer: for i in 0..survivors.len() {
            for j in 0..survivors.len() {
                if i != j && self.compare(&survivors[i], &survivors[j], args) != Preference::First {
                    continue 'outer;
                }
            }
            return Some(i);
        }
        None
    }

    /// Two-stage pairwise comparison (per-parameter, then whole-candidate).
    fn compare(&self, a: &Applicable, b: &Applicable, args: &ActualArguments) -> Preference {
        let mut first = 0usize;
        let mut second = 0usize;
        for arg in 0..args.slot_count() {
            let (Some(pa), Some(pb)) = (
                a.binding.argument_to_parameter(arg),
                b.binding.argument_to_parameter(arg),
            ) else {
                continue;
            };
            let (Some(pa), Some(pb)) =
                (a.candidate.params.get(pa), b.candidate.params.get(pb))
            else {
                continue;
            };
            let Some(arg_ty) = args.slot_type(arg) else {
                continue;
            };
            match self.better_parameter(arg_ty, pa, pb) {
                Preference::First => first += 1,
                Preference::Second => second += 1,
                Preference::Equivalent | Preference::Ambiguous => {}
            }
        }
        match (first > 0, second > 0) {
            (true, true) => Preference::Ambiguous,
            (true, false) => Preference::First,
            (false, true) => Preference::Second,
            (false, false) => self.better_candidate(a, b),
        }
    }

    /// Stage one: which parameter is the better target for this argument.
    fn better_parameter(
        &self,
        arg_ty: TypeId,
        pa: &ParameterDescriptor,
        pb: &ParameterDescriptor,
    ) -> Preference {
        if pa.equivalent(pb) {
            return Preference::Equivalent;
        }
        match self.oracle.prefer_conversion(arg_ty, pa.ty, pb.ty) {
            latebind_common::Preferred::First => return Preference::First,
            latebind_common::Preferred::Second => return Preference::Second,
            latebind_common::Preferred::Neither => {}
        }
        // Mutual convertibility: the type that converts to the other is the
        // more specific target.
        let a_to_b = self.oracle.can_convert(pa.ty, None, pb.ty, false, NarrowingLevel::All);
        let b_to_a = self.oracle.can_convert(pb.ty, None, pa.ty, false, NarrowingLevel::All);
        if a_to_b != b_to_a {
            return if a_to_b { Preference::First } else { Preference::Second };
        }
        if let Some(pref) = self.canonical_numeric_preference(pa.ty, pb.ty) {
            return pref;
        }
        // Last resort: the parameter reachable from the argument at a lower
        // narrowing level wins.
        match (self.reach_level(arg_ty, pa), self.reach_level(arg_ty, pb)) {
            (Some(la), Some(lb)) if la < lb => Preference::First,
            (Some(la), Some(lb)) if lb < la => Preference::Second,
            (Some(_), None) => Preference::First,
            (None, Some(_)) => Preference::Second,
            _ => Preference::Equivalent,
        }
    }

    /// Canonical widening preferences among numeric targets: integer over
    /// float, narrower over wider, signed over unsigned at equal width.
    fn canonical_numeric_preference(&self, t1: TypeId, t2: TypeId) -> Option<Preference> {
        let k1 = self.table.intrinsic_kind(t1)?;
        let k2 = self.table.intrinsic_kind(t2)?;
        if !k1.is_numeric() || !k2.is_numeric() || k1 == k2 {
            return None;
        }
        if k1.is_integer() != k2.is_integer() {
            return Some(if k1.is_integer() { Preference::First } else { Preference::Second });
        }
        if k1.bit_width() != k2.bit_width() {
            return Some(if k1.bit_width() < k2.bit_width() {
                Preference::First
            } else {
                Preference::Second
            });
        }
        if k1.is_signed_integer() != k2.is_signed_integer() {
            return Some(if k1.is_signed_integer() {
                Preference::First
            } else {
                Preference::Second
            });
        }
        None
    }

    fn reach_level(&self, from: TypeId, to: &ParameterDescriptor) -> Option<NarrowingLevel> {
        NarrowingLevel::ALL_LEVELS
            .into_iter()
            .find(|&level| {
                self.oracle
                    .can_convert(from, None, to.ty, to.prohibits_null(), level)
            })
    }

    /// Stage two: whole-candidate preferences, used only when every
    /// parameter position is equivalent.
    fn better_candidate(&self, a: &Applicable, b: &Applicable) -> Preference {
        let sa = &a.candidate.signature;
        let sb = &b.candidate.signature;
        if sa.is_special != sb.is_special {
            return if sb.is_special { Preference::First } else { Preference::Second };
        }
        if a.was_open != b.was_open {
            return if b.was_open { Preference::First } else { Preference::Second };
        }
        let (oa, ob) = (a.candidate.packed_out_count(), b.candidate.packed_out_count());
        if oa != ob {
            return if oa < ob { Preference::First } else { Preference::Second };
        }
        let (pa, pb) = (a.candidate.max_builder_priority(), b.candidate.max_builder_priority());
        if pa != pb {
            return if pa < pb { Preference::First } else { Preference::Second };
        }
        let (ca, cb) = (
            a.candidate.builders_at_priority(pa),
            b.candidate.builders_at_priority(pb),
        );
        if ca != cb {
            return if ca < cb { Preference::First } else { Preference::Second };
        }
        if let Some(name) = &self.options.call_name {
            let (ma, mb) = (&sa.name == name, &sb.name == name);
            if ma != mb {
                return if ma { Preference::First } else { Preference::Second };
            }
        }
        Preference::Equivalent
    }
}

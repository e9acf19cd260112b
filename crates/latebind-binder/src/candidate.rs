//! Method candidates: signatures elaborated against a concrete argument
//! shape.
//!
//! One signature fans out into several candidates: the full form, one
//! default-filled form per trailing-optional suffix, a by-ref-reduced form
//! when by-reference parameters exist, and (for variadic signatures)
//! params-extended forms synthesized per call shape.

use std::sync::Arc;

use latebind_common::{TypeId, TypeTable};
use tracing::trace;

use crate::binding::ArgumentBinding;
use crate::builders::{ArgBuilder, ReturnBuilder};
use crate::signature::{ParameterDescriptor, Signature};

use crate::arguments::ActualArguments;

/// One concrete binding target: a signature plus its elaborated per-slot
/// parameter list and construction strategy. Immutable once built; cheap to
/// clone and safe to share read-only across concurrent resolutions.
#[derive(Clone, Debug)]
pub struct MethodCandidate {
    pub signature: Arc<Signature>,
    /// One descriptor per consumable argument slot (hidden prefix first).
    /// Shorter than the signature's formal list when defaults fill a suffix
    /// or out-only parameters were reduced away; longer when a params array
    /// was expanded.
    pub params: Vec<ParameterDescriptor>,
    /// One builder per formal parameter of the underlying signature.
    pub builders: Vec<ArgBuilder>,
    pub return_builder: ReturnBuilder,
    /// Index into `builders` of the params-array collector, if present.
    pub params_array_index: Option<usize>,
    /// Element type of the params array, if present.
    pub variadic_element: Option<TypeId>,
    pub has_params_dict: bool,
    /// True for params-extended candidates synthesized against one arity.
    pub is_expanded: bool,
}

impl MethodCandidate {
    /// Visible arity: consumable slots minus hidden ones.
    pub fn arity(&self) -> usize {
        self.params.len() - self.params.iter().filter(|p| p.is_hidden()).count()
    }

    pub fn param_for_slot(&self, slot: usize) -> &ParameterDescriptor {
        &self.params[slot]
    }

    /// Candidate still mentions open generic parameters.
    pub fn is_open(&self, table: &TypeTable) -> bool {
        self.signature.is_generic_definition()
            && (self.params.iter().any(|p| table.is_open(p.ty))
                || table.is_open(self.signature.return_type))
    }

    /// Exposes a params-dictionary and nothing that consumes positionally
    /// beyond declared parameters; such candidates are a fallback tier.
    pub fn is_dict_only_variadic(&self) -> bool {
        self.has_params_dict && self.params_array_index.is_none() && self.is_expanded
    }

    pub fn packed_out_count(&self) -> usize {
        self.return_builder.packed_count()
    }

    pub fn max_builder_priority(&self) -> u8 {
        self.builders.iter().map(ArgBuilder::priority).max().unwrap_or(0)
    }

    pub fn builders_at_priority(&self, priority: u8) -> usize {
        self.builders
            .iter()
            .filter(|b| b.priority() == priority)
            .count()
    }

    /// Clone with keyword-redirect builders wrapped around every slot the
    /// binding fills by name. The returned candidate's builders read named
    /// arguments from their actual positions.
    pub fn bound(&self, binding: &ArgumentBinding) -> MethodCandidate {
        if binding.named_count() == 0 {
            return self.clone();
        }
        let mut out = self.clone();
        for slot in binding.positional_count()..self.params.len() {
            let Some(arg) = binding.parameter_to_argument(slot) else {
                continue;
            };
            if arg < binding.positional_count() {
                continue;
            }
            if let Some(i) = out.builder_for_slot(slot) {
                let inner = Box::new(out.builders[i].clone());
                out.builders[i] = ArgBuilder::Keyword { inner, actual_index: arg };
            }
        }
        out
    }

    /// Index into `builders` of the builder consuming parameter slot `slot`.
    fn builder_for_slot(&self, slot: usize) -> Option<usize> {
        self.builders.iter().position(|b| match b {
            ArgBuilder::Simple { index, .. } => *index == slot,
            ArgBuilder::ByRef { index: Some(i), .. } => *i == slot,
            ArgBuilder::Keyword { .. }
            | ArgBuilder::Default { .. }
            | ArgBuilder::ParamsArray { .. }
            | ArgBuilder::ParamsDict { .. }
            | ArgBuilder::ByRef { index: None, .. } => false,
        })
    }
}

fn collector_info(
    sig: &Signature,
    table: &TypeTable,
) -> (Option<usize>, Option<TypeId>, bool) {
    let pa = sig.params.iter().position(ParameterDescriptor::is_params_array);
    let element = pa.and_then(|i| table.element_type(sig.params[i].ty));
    let dict = sig.params.iter().any(|p| p.is_params_dict());
    (pa, element, dict)
}

/// The full candidate: every formal parameter consumes one slot, the
/// params collector (if any) taken as a plain argument of its declared
/// (array/map) type.
fn full_candidate(sig: &Arc<Signature>, table: &TypeTable) -> MethodCandidate {
    let (pa, element, dict) = collector_info(sig, table);
    let builders = sig
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| ArgBuilder::Simple { param: p.clone(), index: i })
        .collect();
    MethodCandidate {
        signature: Arc::clone(sig),
        params: sig.params.clone(),
        builders,
        return_builder: ReturnBuilder::Plain,
        params_array_index: pa,
        variadic_element: element,
        has_params_dict: dict,
        is_expanded: false,
    }
}

/// One default-filled candidate: the last `filled` optional parameters take
/// their declared defaults instead of consuming arguments.
fn default_filled_candidate(
    sig: &Arc<Signature>,
    table: &TypeTable,
    filled: usize,
) -> MethodCandidate {
    let keep = sig.params.len() - filled;
    let builders = sig
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if i < keep {
                ArgBuilder::Simple { param: p.clone(), index: i }
            } else {
                ArgBuilder::Default { param: p.clone() }
            }
        })
        .collect();
    let (pa, element, dict) = collector_info(sig, table);
    MethodCandidate {
        signature: Arc::clone(sig),
        params: sig.params[..keep].to_vec(),
        builders,
        return_builder: ReturnBuilder::Plain,
        params_array_index: pa.filter(|&i| i < keep),
        variadic_element: element,
        has_params_dict: dict,
        is_expanded: false,
    }
}

/// The by-ref-reduced candidate: out-only parameters vanish from the slot
/// list, in-out parameters take their inner type, and all by-ref values are
/// packed behind the return value.
fn by_ref_reduced_candidate(sig: &Arc<Signature>, table: &TypeTable) -> MethodCandidate {
    let mut params = Vec::new();
    let mut builders = Vec::new();
    let mut packed = Vec::new();
    let mut slot = 0usize;
    for (formal, p) in sig.params.iter().enumerate() {
        if p.is_out() && !p.is_by_ref() {
            packed.push(formal);
            builders.push(ArgBuilder::ByRef {
                param: p.clone(),
                inner_ty: table.by_ref_inner(p.ty).unwrap_or(p.ty),
                index: None,
            });
            continue;
        }
        if p.is_by_ref() {
            let inner = table.by_ref_inner(p.ty).unwrap_or(p.ty);
            let mut reduced = p.clone();
            reduced.ty = inner;
            reduced.flags.remove(crate::signature::ParamFlags::BY_REF);
            packed.push(formal);
            builders.push(ArgBuilder::ByRef { param: p.clone(), inner_ty: inner, index: Some(slot) });
            params.push(reduced);
            slot += 1;
            continue;
        }
        builders.push(ArgBuilder::Simple { param: p.clone(), index: slot });
        params.push(p.clone());
        slot += 1;
    }
    let (_, element, dict) = collector_info(sig, table);
    MethodCandidate {
        signature: Arc::clone(sig),
        params,
        builders,
        return_builder: ReturnBuilder::ByRefPack { slots: packed },
        params_array_index: None,
        variadic_element: element,
        has_params_dict: dict,
        is_expanded: false,
    }
}

/// Elaborate one signature into its non-expanded candidates.
pub fn make_candidates(sig: &Arc<Signature>, table: &TypeTable) -> Vec<MethodCandidate> {
    let mut out = vec![full_candidate(sig, table)];
    for filled in 1..=sig.trailing_optional_count() {
        out.push(default_filled_candidate(sig, table, filled));
    }
    if sig.params.iter().any(|p| p.is_by_ref() || p.is_out()) {
        out.push(by_ref_reduced_candidate(sig, table));
    }
    trace!(signature = %sig.name, candidates = out.len(), "elaborated signature");
    out
}

/// Params-extend a variadic signature against one concrete call shape.
///
/// Returns `None` when the shape is incompatible: too few positional
/// arguments for the fixed parameters' minimum, positional overflow without
/// a params array, or leftover named arguments with no params-dictionary to
/// receive them.
pub fn expand_variadic(
    sig: &Arc<Signature>,
    args: &ActualArguments,
    table: &TypeTable,
) -> Option<MethodCandidate> {
    let (pa, element, has_dict) = collector_info(sig, table);
    if pa.is_none() && !has_dict {
        return None;
    }
    let fixed: Vec<&ParameterDescriptor> = sig
        .params
        .iter()
        .filter(|p| !p.is_params_collector())
        .collect();
    let positional = args.positional_count();
    let extra = positional.saturating_sub(fixed.len());
    if extra > 0 && pa.is_none() {
        return None;
    }
    // Named arguments either fill trailing fixed parameters or fall to the
    // dictionary; every fixed slot must end up fed.
    let unfilled_fixed = fixed.len().saturating_sub(positional);
    let matched_named = args
        .names()
        .iter()
        .filter(|name| fixed.iter().any(|p| &&p.name == name))
        .count();
    if matched_named < unfilled_fixed {
        return None;
    }
    let absorbed = args.named_count() - matched_named;
    if absorbed > 0 && !has_dict {
        return None;
    }

    let mut params: Vec<ParameterDescriptor> = fixed.iter().map(|p| (*p).clone()).collect();
    if extra > 0 {
        let collector = &sig.params[pa?];
        let element = element?;
        let mut elem_param = ParameterDescriptor::new(&collector.name, element);
        if collector
            .flags
            .contains(crate::signature::ParamFlags::PROHIBIT_NULL_ITEMS)
        {
            elem_param.flags |= crate::signature::ParamFlags::PROHIBIT_NULL;
        }
        params.extend(std::iter::repeat_n(elem_param, extra));
    }

    let mut builders = Vec::with_capacity(sig.params.len());
    let mut slot = 0usize;
    for p in &sig.params {
        if p.is_params_array() {
            builders.push(ArgBuilder::ParamsArray {
                param: p.clone(),
                element: element?,
                start: fixed.len(),
                count: extra,
            });
        } else if p.is_params_dict() {
            builders.push(ArgBuilder::ParamsDict { param: p.clone() });
        } else {
            builders.push(ArgBuilder::Simple { param: p.clone(), index: slot });
            slot += 1;
        }
    }
    trace!(
        signature = %sig.name,
        extra,
        absorbed,
        "params-extended candidate"
    );
    Some(MethodCandidate {
        signature: Arc::clone(sig),
        params,
        builders,
        return_builder: ReturnBuilder::Plain,
        params_array_index: pa,
        variadic_element: element,
        has_params_dict: has_dict,
        is_expanded: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::ParamFlags;
    use latebind_common::Value;

    fn p(name: &str, ty: TypeId) -> ParameterDescriptor {
        ParameterDescriptor::new(name, ty)
    }

    fn call(n: usize) -> ActualArguments {
        let pos = (0..n).map(|_| (TypeId::I64, Value::I64(0))).collect();
        ActualArguments::new(pos, vec![]).unwrap()
    }

    #[test]
    fn optional_suffix_fans_out() {
        let sig = Signature::new(
            "f",
            vec![
                p("a", TypeId::I32),
                p("b", TypeId::I32).with_default(Value::I64(5)),
                p("c", TypeId::I32).with_default(Value::I64(6)),
            ],
            TypeId::VOID,
        )
        .into_arc();
        let table = TypeTable::new();
        let cands = make_candidates(&sig, &table);
        let arities: Vec<usize> = cands.iter().map(MethodCandidate::arity).collect();
        assert_eq!(arities, vec![3, 2, 1]);
        // The two-arity form fills `c` from its default.
        let two = &cands[1];
        assert!(matches!(two.builders[2], ArgBuilder::Default { .. }));
        assert!(matches!(two.builders[1], ArgBuilder::Simple { index: 1, .. }));
    }

    #[test]
    fn by_ref_reduction_packs_outs() {
        let table = TypeTable::new();
        let ref_i32 = table.by_ref(TypeId::I32);
        let sig = Signature::new(
            "f",
            vec![
                p("a", TypeId::I64),
                p("o", ref_i32).with_flags(ParamFlags::OUT),
                p("r", ref_i32).with_flags(ParamFlags::BY_REF),
            ],
            TypeId::BOOL,
        )
        .into_arc();
        let cands = make_candidates(&sig, &table);
        let reduced = cands.last().unwrap();
        // Out slot vanishes; the in-out slot takes the inner type.
        assert_eq!(reduced.arity(), 2);
        assert_eq!(reduced.params[1].ty, TypeId::I32);
        assert_eq!(reduced.packed_out_count(), 2);
        assert_eq!(reduced.return_builder, ReturnBuilder::ByRefPack { slots: vec![1, 2] });
    }

    #[test]
    fn expansion_matches_call_shape() {
        let table = TypeTable::new();
        let rest = p("rest", table.array(TypeId::I64)).with_flags(ParamFlags::PARAMS_ARRAY);
        let sig = Signature::new("f", vec![p("a", TypeId::I64), rest], TypeId::VOID).into_arc();
        let cand = expand_variadic(&sig, &call(4), &table).unwrap();
        assert_eq!(cand.arity(), 4);
        assert!(cand.is_expanded);
        assert_eq!(cand.params[1].ty, TypeId::I64);
        assert!(matches!(
            cand.builders[1],
            ArgBuilder::ParamsArray { start: 1, count: 3, .. }
        ));
        // Empty expansion is allowed.
        let empty = expand_variadic(&sig, &call(1), &table).unwrap();
        assert_eq!(empty.arity(), 1);
        assert!(matches!(empty.builders[1], ArgBuilder::ParamsArray { count: 0, .. }));
    }

    #[test]
    fn expansion_rejects_incompatible_shapes() {
        let table = TypeTable::new();
        let rest = p("rest", table.array(TypeId::I64)).with_flags(ParamFlags::PARAMS_ARRAY);
        let sig = Signature::new(
            "f",
            vec![p("a", TypeId::I64), p("b", TypeId::I64), rest],
            TypeId::VOID,
        )
        .into_arc();
        // One positional argument cannot feed two fixed parameters.
        assert!(expand_variadic(&sig, &call(1), &table).is_none());
        // Named argument with no dictionary to receive it.
        let named = ActualArguments::new(
            vec![(TypeId::I64, Value::I64(0)), (TypeId::I64, Value::I64(0))],
            vec![("zz".into(), TypeId::I64, Value::I64(0))],
        )
        .unwrap();
        assert!(expand_variadic(&sig, &named, &table).is_none());
    }

    #[test]
    fn keyword_wrapping_tracks_binding() {
        let table = TypeTable::new();
        let sig = Signature::new(
            "f",
            vec![p("a", TypeId::I64), p("b", TypeId::I64)],
            TypeId::VOID,
        )
        .into_arc();
        let cand = full_candidate(&sig, &table);
        let args = ActualArguments::new(
            vec![(TypeId::I64, Value::I64(1))],
            vec![("b".into(), TypeId::I64, Value::I64(2))],
        )
        .unwrap();
        let binding = crate::binding::bind_named_arguments(&cand.params, &args, false).unwrap();
        let bound = cand.bound(&binding);
        assert!(matches!(bound.builders[0], ArgBuilder::Simple { .. }));
        assert!(matches!(bound.builders[1], ArgBuilder::Keyword { actual_index: 1, .. }));
    }
}

//! Generic type inference.
//!
//! When a candidate's signature is an open generic definition, direct
//! convertibility filtering is skipped: the resolver first infers a concrete
//! type for every generic parameter from the actual arguments, instantiates
//! the signature, re-targets the builders, and only then filters the closed
//! result like any other candidate.
//!
//! Inference works over an explicit substitution map; nothing shared is
//! mutated, and a failed step returns a structured error rather than a
//! sentinel.

use std::sync::Arc;

use latebind_common::{ConversionOracle, NarrowingLevel, TypeData, TypeId, TypeTable};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;

use crate::arguments::ActualArguments;
use crate::binding::ArgumentBinding;
use crate::candidate::MethodCandidate;
use crate::signature::{ConstraintFlags, Signature};

/// Why inference gave up on a candidate. Collapsed to the single
/// `TypeInference` failure reason in the binding target; the detail exists
/// for tracing and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InferenceError {
    /// No argument mentions this generic parameter.
    NoContribution { index: u16 },
    /// Two input sites contributed incompatible types.
    Conflict { index: u16, first: TypeId, second: TypeId },
    /// The merged type violates the parameter's declared constraints.
    ConstraintViolated { index: u16, inferred: TypeId },
    /// A builder could not be cloned against its instantiated parameter.
    RetargetFailed { formal: usize },
}

type Substitution = FxHashMap<u16, TypeId>;

/// Replace every generic parameter mentioned in `ty` using `subst`.
/// `None` when an unresolved parameter remains.
fn substitute(ty: TypeId, subst: &Substitution, table: &TypeTable) -> Option<TypeId> {
    if !table.is_open(ty) {
        return Some(ty);
    }
    match table.lookup(ty) {
        TypeData::GenericParam { index, .. } => subst.get(&index).copied(),
        TypeData::Array(elem) => Some(table.array(substitute(elem, subst, table)?)),
        TypeData::ByRef(inner) => Some(table.by_ref(substitute(inner, subst, table)?)),
        TypeData::Delegate(shape) => {
            let params = shape
                .params
                .iter()
                .map(|&p| substitute(p, subst, table))
                .collect::<Option<Vec<_>>>()?;
            Some(table.delegate(params, substitute(shape.ret, subst, table)?))
        }
        TypeData::Constructed { def, args } => {
            let args = args
                .iter()
                .map(|&a| substitute(a, subst, table))
                .collect::<Option<Vec<_>>>()?;
            Some(table.constructed(def, args))
        }
        TypeData::Intrinsic(_) => Some(ty),
    }
}

/// Walk one declared parameter shape against one argument type, recording
/// every type an open parameter position receives.
fn collect_sites(
    param_ty: TypeId,
    arg_ty: TypeId,
    table: &TypeTable,
    sites: &mut FxHashMap<u16, SmallVec<[TypeId; 2]>>,
) {
    match table.lookup(param_ty) {
        TypeData::GenericParam { index, .. } => {
            // Null carries no type information.
            if arg_ty != TypeId::NULL {
                sites.entry(index).or_default().push(arg_ty);
            }
        }
        TypeData::Array(elem) => {
            if let Some(arg_elem) = table.element_type(arg_ty) {
                collect_sites(elem, arg_elem, table, sites);
            }
        }
        TypeData::ByRef(inner) => {
            let arg_inner = table.by_ref_inner(arg_ty).unwrap_or(arg_ty);
            collect_sites(inner, arg_inner, table, sites);
        }
        TypeData::Delegate(shape) => {
            if let TypeData::Delegate(arg_shape) = table.lookup(arg_ty) {
                if arg_shape.params.len() == shape.params.len() {
                    for (&p, &a) in shape.params.iter().zip(&arg_shape.params) {
                        collect_sites(p, a, table, sites);
                    }
                    collect_sites(shape.ret, arg_shape.ret, table, sites);
                }
            }
        }
        TypeData::Constructed { def, args } => {
            // Find the matching instantiation on the argument type itself or
            // anywhere up its base walk.
            let mut pending = vec![arg_ty];
            while let Some(ty) = pending.pop() {
                if let TypeData::Constructed { def: arg_def, args: arg_args } = table.lookup(ty) {
                    if arg_def == def && arg_args.len() == args.len() {
                        for (&p, &a) in args.iter().zip(&arg_args) {
                            collect_sites(p, a, table, sites);
                        }
                        return;
                    }
                    pending.extend(table.def_bases(arg_def));
                }
            }
        }
        TypeData::Intrinsic(_) => {}
    }
}

/// Generic parameter indices mentioned in a constraint type.
fn mentioned_params(ty: TypeId, table: &TypeTable, out: &mut Vec<u16>) {
    match table.lookup(ty) {
        TypeData::GenericParam { index, .. } => out.push(index),
        TypeData::Array(elem) => mentioned_params(elem, table, out),
        TypeData::ByRef(inner) => mentioned_params(inner, table, out),
        TypeData::Delegate(shape) => {
            for &p in &shape.params {
                mentioned_params(p, table, out);
            }
            mentioned_params(shape.ret, table, out);
        }
        TypeData::Constructed { args, .. } => {
            for &a in &args {
                mentioned_params(a, table, out);
            }
        }
        TypeData::Intrinsic(_) => {}
    }
}

/// Order parameters so that any parameter appearing in another's constraint
/// list is resolved before its dependent. Cycles fall back to index order.
fn dependency_order(sig: &Signature, table: &TypeTable) -> Vec<u16> {
    let n = sig.generics.len();
    let deps: Vec<Vec<u16>> = sig
        .generics
        .iter()
        .map(|g| {
            let mut d = Vec::new();
            for &iface in &g.interfaces {
                mentioned_params(iface, table, &mut d);
            }
            d
        })
        .collect();
    let mut order = Vec::with_capacity(n);
    let mut placed = vec![false; n];
    loop {
        let mut progressed = false;
        for i in 0..n {
            if placed[i] {
                continue;
            }
            if deps[i].iter().all(|&d| placed[d as usize] || d as usize == i) {
                order.push(i as u16);
                placed[i] = true;
                progressed = true;
            }
        }
        if order.len() == n {
            return order;
        }
        if !progressed {
            for i in 0..n {
                if !placed[i] {
                    order.push(i as u16);
                }
            }
            return order;
        }
    }
}

/// Value types can be constructed; so can reference definitions that declare
/// a parameterless constructor.
fn satisfies_flags(ty: TypeId, flags: ConstraintFlags, table: &TypeTable) -> bool {
    let reference = table.is_reference_like(ty) || ty == TypeId::OBJECT;
    if flags.contains(ConstraintFlags::REFERENCE_TYPE) && !reference {
        return false;
    }
    if flags.contains(ConstraintFlags::VALUE_TYPE) && reference {
        return false;
    }
    if flags.contains(ConstraintFlags::DEFAULT_CTOR) {
        let constructible = match table.lookup(ty) {
            TypeData::Intrinsic(kind) => kind.is_numeric()
                || matches!(kind, latebind_common::IntrinsicKind::Bool | latebind_common::IntrinsicKind::Char),
            TypeData::Constructed { def, .. } => table.def_has_default_ctor(def),
            _ => false,
        };
        if !constructible {
            return false;
        }
    }
    true
}

/// Infer concrete generic arguments for an open candidate and return the
/// instantiated, re-targeted candidate.
pub fn infer_candidate(
    candidate: &MethodCandidate,
    binding: &ArgumentBinding,
    args: &ActualArguments,
    table: &TypeTable,
    oracle: &dyn ConversionOracle,
) -> Result<MethodCandidate, InferenceError> {
    let sig = &candidate.signature;
    let mut sites: FxHashMap<u16, SmallVec<[TypeId; 2]>> = FxHashMap::default();
    for slot in 0..candidate.params.len() {
        let Some(arg) = binding.parameter_to_argument(slot) else {
            continue;
        };
        let Some(arg_ty) = args.slot_type(arg) else {
            continue;
        };
        collect_sites(candidate.params[slot].ty, arg_ty, table, &mut sites);
    }

    let mut subst = Substitution::default();
    for index in dependency_order(sig, table) {
        let contributions = sites
            .get(&index)
            .filter(|c| !c.is_empty())
            .ok_or(InferenceError::NoContribution { index })?;
        // Most specific common type: the one every other contribution
        // converts to under lossless conversions.
        let mut best = contributions[0];
        for &c in &contributions[1..] {
            if c == best || oracle.can_convert(c, None, best, false, NarrowingLevel::One) {
                continue;
            }
            if oracle.can_convert(best, None, c, false, NarrowingLevel::One) {
                best = c;
            } else {
                return Err(InferenceError::Conflict { index, first: best, second: c });
            }
        }

        let constraint = &sig.generics[index as usize];
        if !satisfies_flags(best, constraint.flags, table) {
            return Err(InferenceError::ConstraintViolated { index, inferred: best });
        }
        for &iface in &constraint.interfaces {
            let Some(closed) = substitute(iface, &subst, table) else {
                // Unresolvable dependency (cycle); treat as unsatisfied.
                return Err(InferenceError::ConstraintViolated { index, inferred: best });
            };
            if !oracle.can_convert(best, None, closed, false, NarrowingLevel::None) {
                return Err(InferenceError::ConstraintViolated { index, inferred: best });
            }
        }
        trace!(index, inferred = %table.display(best), "inferred generic argument");
        subst.insert(index, best);
    }

    instantiate(candidate, &subst, table)
}

/// Apply a complete substitution: close the signature, the per-slot
/// parameter list, and every builder.
fn instantiate(
    candidate: &MethodCandidate,
    subst: &Substitution,
    table: &TypeTable,
) -> Result<MethodCandidate, InferenceError> {
    let sig = &candidate.signature;
    let close = |ty: TypeId, formal: usize| {
        substitute(ty, subst, table).ok_or(InferenceError::RetargetFailed { formal })
    };

    let mut closed_formals = Vec::with_capacity(sig.params.len());
    for (i, p) in sig.params.iter().enumerate() {
        let mut closed = p.clone();
        closed.ty = close(p.ty, i)?;
        closed_formals.push(closed);
    }
    let closed_sig = Arc::new(Signature {
        name: sig.name.clone(),
        params: closed_formals,
        return_type: substitute(sig.return_type, subst, table)
            .ok_or(InferenceError::RetargetFailed { formal: usize::MAX })?,
        is_static: sig.is_static,
        generics: Vec::new(),
        is_special: sig.is_special,
    });

    let mut params = Vec::with_capacity(candidate.params.len());
    for (i, p) in candidate.params.iter().enumerate() {
        let mut closed = p.clone();
        closed.ty = close(p.ty, i)?;
        params.push(closed);
    }

    let mut builders = Vec::with_capacity(candidate.builders.len());
    for (formal, b) in candidate.builders.iter().enumerate() {
        let mut closed = b.parameter().clone();
        closed.ty = close(closed.ty, formal)?;
        let retargeted = b
            .retarget(closed, table)
            .ok_or(InferenceError::RetargetFailed { formal })?;
        builders.push(retargeted);
    }

    let variadic_element = match candidate.variadic_element {
        Some(e) => Some(substitute(e, subst, table).ok_or(InferenceError::RetargetFailed {
            formal: usize::MAX,
        })?),
        None => None,
    };

    Ok(MethodCandidate {
        signature: closed_sig,
        params,
        builders,
        return_builder: candidate.return_builder.clone(),
        params_array_index: candidate.params_array_index,
        variadic_element,
        has_params_dict: candidate.has_params_dict,
        is_expanded: candidate.is_expanded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::bind_named_arguments;
    use crate::candidate::make_candidates;
    use crate::signature::{GenericParam, ParameterDescriptor};
    use latebind_common::{TableOracle, Value};

    fn infer_one(
        sig: Arc<Signature>,
        args: &ActualArguments,
        table: &TypeTable,
    ) -> Result<MethodCandidate, InferenceError> {
        let oracle = TableOracle::new(table);
        let cand = make_candidates(&sig, table).remove(0);
        let binding = bind_named_arguments(&cand.params, args, false).unwrap();
        infer_candidate(&cand, &binding, args, table, &oracle)
    }

    #[test]
    fn bare_parameter_takes_argument_type() {
        let table = TypeTable::new();
        let t = table.generic_param(0, "T");
        let sig = Signature::new("id", vec![ParameterDescriptor::new("x", t)], t)
            .with_generics(vec![GenericParam::unconstrained("T")])
            .into_arc();
        let args =
            ActualArguments::new(vec![(TypeId::STR, Value::Str("s".into()))], vec![]).unwrap();
        let closed = infer_one(sig, &args, &table).unwrap();
        assert_eq!(closed.params[0].ty, TypeId::STR);
        assert_eq!(closed.signature.return_type, TypeId::STR);
        assert!(closed.signature.generics.is_empty());
    }

    #[test]
    fn nested_shapes_contribute() {
        let table = TypeTable::new();
        let t = table.generic_param(0, "T");
        let sig = Signature::new(
            "first",
            vec![ParameterDescriptor::new("xs", table.array(t))],
            t,
        )
        .with_generics(vec![GenericParam::unconstrained("T")])
        .into_arc();
        let arr = table.array(TypeId::I32);
        let args = ActualArguments::new(vec![(arr, Value::List(vec![]))], vec![]).unwrap();
        let closed = infer_one(sig, &args, &table).unwrap();
        assert_eq!(closed.params[0].ty, table.array(TypeId::I32));
        assert_eq!(closed.signature.return_type, TypeId::I32);
    }

    #[test]
    fn sites_merge_to_common_type() {
        let table = TypeTable::new();
        let t = table.generic_param(0, "T");
        let sig = Signature::new(
            "max",
            vec![
                ParameterDescriptor::new("a", t),
                ParameterDescriptor::new("b", t),
            ],
            t,
        )
        .with_generics(vec![GenericParam::unconstrained("T")])
        .into_arc();
        // i32 widens to i64: common type is i64.
        let args = ActualArguments::new(
            vec![(TypeId::I32, Value::I64(1)), (TypeId::I64, Value::I64(2))],
            vec![],
        )
        .unwrap();
        let closed = infer_one(sig, &args, &table).unwrap();
        assert_eq!(closed.params[0].ty, TypeId::I64);
    }

    #[test]
    fn incompatible_sites_conflict() {
        let table = TypeTable::new();
        let t = table.generic_param(0, "T");
        let sig = Signature::new(
            "pair",
            vec![
                ParameterDescriptor::new("a", t),
                ParameterDescriptor::new("b", t),
            ],
            TypeId::VOID,
        )
        .with_generics(vec![GenericParam::unconstrained("T")])
        .into_arc();
        let args = ActualArguments::new(
            vec![(TypeId::STR, Value::Str("s".into())), (TypeId::BOOL, Value::Bool(true))],
            vec![],
        )
        .unwrap();
        assert!(matches!(
            infer_one(sig, &args, &table),
            Err(InferenceError::Conflict { .. })
        ));
    }

    #[test]
    fn constraints_are_enforced() {
        let table = TypeTable::new();
        let t = table.generic_param(0, "T");
        let constrained = GenericParam {
            name: "T".into(),
            flags: ConstraintFlags::REFERENCE_TYPE,
            interfaces: vec![],
        };
        let sig = Signature::new("f", vec![ParameterDescriptor::new("x", t)], TypeId::VOID)
            .with_generics(vec![constrained])
            .into_arc();
        let args = ActualArguments::new(vec![(TypeId::I32, Value::I64(1))], vec![]).unwrap();
        assert!(matches!(
            infer_one(sig, &args, &table),
            Err(InferenceError::ConstraintViolated { .. })
        ));
    }

    #[test]
    fn interface_constraint_uses_earlier_inference() {
        let table = TypeTable::new();
        let animal = table.add_def("Animal", 0, vec![]);
        let animal_ty = table.constructed(animal, vec![]);
        let cat = table.add_def("Cat", 0, vec![animal_ty]);
        let cat_ty = table.constructed(cat, vec![]);
        let t = table.generic_param(0, "T");
        let u = table.generic_param(1, "U");
        // U must convert to T; T inferred first from the argument order.
        let generics = vec![
            GenericParam::unconstrained("T"),
            GenericParam { name: "U".into(), flags: ConstraintFlags::empty(), interfaces: vec![t] },
        ];
        let sig = Signature::new(
            "feed",
            vec![ParameterDescriptor::new("a", t), ParameterDescriptor::new("b", u)],
            TypeId::VOID,
        )
        .with_generics(generics)
        .into_arc();
        let ok = ActualArguments::new(
            vec![(animal_ty, Value::I64(0)), (cat_ty, Value::I64(0))],
            vec![],
        )
        .unwrap();
        assert!(infer_one(Arc::clone(&sig), &ok, &table).is_ok());
        let bad = ActualArguments::new(
            vec![(cat_ty, Value::I64(0)), (TypeId::STR, Value::Str("x".into()))],
            vec![],
        )
        .unwrap();
        assert!(matches!(
            infer_one(sig, &bad, &table),
            Err(InferenceError::ConstraintViolated { .. })
        ));
    }

    #[test]
    fn missing_contribution_fails() {
        let table = TypeTable::new();
        let t = table.generic_param(0, "T");
        let sig = Signature::new(
            "f",
            vec![ParameterDescriptor::new("x", TypeId::I32)],
            t,
        )
        .with_generics(vec![GenericParam::unconstrained("T")])
        .into_arc();
        let args = ActualArguments::new(vec![(TypeId::I32, Value::I64(1))], vec![]).unwrap();
        assert!(matches!(
            infer_one(sig, &args, &table),
            Err(InferenceError::NoContribution { index: 0 })
        ));
    }
}

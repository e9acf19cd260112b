#![allow(dead_code)]

use std::sync::Arc;

use latebind_binder::{ActualArguments, ParameterDescriptor, Signature};
use latebind_common::{TypeId, Value};

pub fn p(name: &str, ty: TypeId) -> ParameterDescriptor {
    ParameterDescriptor::new(name, ty)
}

pub fn sig(name: &str, params: Vec<ParameterDescriptor>, ret: TypeId) -> Arc<Signature> {
    Signature::new(name, params, ret).into_arc()
}

/// Positional call with explicit argument types.
pub fn call(positional: Vec<(TypeId, Value)>) -> ActualArguments {
    ActualArguments::new(positional, vec![]).expect("well-formed arguments")
}

/// Positional call of i64 values.
pub fn ints(vals: &[i64]) -> ActualArguments {
    call(vals.iter().map(|&v| (TypeId::I64, Value::I64(v))).collect())
}

pub fn named(
    positional: Vec<(TypeId, Value)>,
    named: Vec<(&str, TypeId, Value)>,
) -> ActualArguments {
    let named = named
        .into_iter()
        .map(|(n, t, v)| (n.to_string(), t, v))
        .collect();
    ActualArguments::new(positional, named).expect("well-formed arguments")
}

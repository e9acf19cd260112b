//! Argument and return construction strategies.
//!
//! One `ArgBuilder` per formal parameter of a candidate; each knows how to
//! produce that parameter's runtime value from the actual arguments. The set
//! is closed: new kinds are new variants, dispatch is exhaustive matching.
//! Builders never mutate `ActualArguments`; bookkeeping about which logical
//! argument slots have been claimed flows through the caller-owned
//! `consumed` marker buffer.

use latebind_common::{ConversionOracle, ConvertError, TypeId, TypeTable, Value};

use crate::arguments::ActualArguments;
use crate::signature::ParameterDescriptor;

/// Ordering tiers; candidates relying only on low tiers win whole-candidate
/// tie-breaks.
pub mod priority {
    pub const SIMPLE: u8 = 0;
    pub const DEFAULT: u8 = 1;
    pub const KEYWORD: u8 = 2;
    pub const PARAMS: u8 = 3;
    pub const BY_REF: u8 = 4;
}

/// Strategy producing one formal parameter's value.
#[derive(Clone, Debug)]
pub enum ArgBuilder {
    /// Pass the argument in one logical slot, converted to the parameter
    /// type.
    Simple {
        param: ParameterDescriptor,
        index: usize,
    },
    /// Fill an unsupplied optional parameter from its declared default.
    Default { param: ParameterDescriptor },
    /// Redirect a named argument into the wrapped builder's parameter.
    Keyword {
        inner: Box<ArgBuilder>,
        actual_index: usize,
    },
    /// Collect a run of trailing positional slots into the params array.
    ParamsArray {
        param: ParameterDescriptor,
        element: TypeId,
        start: usize,
        count: usize,
    },
    /// Absorb every named argument nothing else claimed.
    ParamsDict { param: ParameterDescriptor },
    /// A by-reference slot. `index` is the feeding slot for in-out
    /// parameters; `None` for output-only slots, which start from null and
    /// get their value written by the callee.
    ByRef {
        param: ParameterDescriptor,
        inner_ty: TypeId,
        index: Option<usize>,
    },
}

impl ArgBuilder {
    pub fn priority(&self) -> u8 {
        match self {
            ArgBuilder::Simple { .. } => priority::SIMPLE,
            ArgBuilder::Default { .. } => priority::DEFAULT,
            ArgBuilder::Keyword { .. } => priority::KEYWORD,
            ArgBuilder::ParamsArray { .. } | ArgBuilder::ParamsDict { .. } => priority::PARAMS,
            ArgBuilder::ByRef { .. } => priority::BY_REF,
        }
    }

    /// Logical argument slots this builder claims. `None` means "all
    /// remaining named arguments" (params-dict).
    pub fn consumed_count(&self) -> Option<usize> {
        match self {
            ArgBuilder::Simple { .. } | ArgBuilder::Keyword { .. } => Some(1),
            ArgBuilder::Default { .. } => Some(0),
            ArgBuilder::ParamsArray { count, .. } => Some(*count),
            ArgBuilder::ParamsDict { .. } => None,
            ArgBuilder::ByRef { index, .. } => Some(usize::from(index.is_some())),
        }
    }

    pub fn parameter(&self) -> &ParameterDescriptor {
        match self {
            ArgBuilder::Simple { param, .. }
            | ArgBuilder::Default { param }
            | ArgBuilder::ParamsArray { param, .. }
            | ArgBuilder::ParamsDict { param }
            | ArgBuilder::ByRef { param, .. } => param,
            ArgBuilder::Keyword { inner, .. } => inner.parameter(),
        }
    }

    /// The type arguments are converted to when this builder runs.
    fn target_type(&self) -> TypeId {
        match self {
            ArgBuilder::ByRef { inner_ty, .. } => *inner_ty,
            ArgBuilder::Keyword { inner, .. } => inner.target_type(),
            other => other.parameter().ty,
        }
    }

    /// Produce the value to pass for this formal parameter, marking every
    /// slot it claims in `consumed`.
    pub fn produce(
        &self,
        args: &ActualArguments,
        oracle: &dyn ConversionOracle,
        consumed: &mut [bool],
    ) -> Result<Value, ConvertError> {
        match self {
            ArgBuilder::Simple { param, index } => {
                consumed[*index] = true;
                let (_, value) = args.slot(*index).ok_or(ConvertError {
                    value_kind: "missing",
                    to: param.ty,
                })?;
                oracle.convert(&value, self.target_type())
            }
            ArgBuilder::Default { param } => {
                Ok(param.default.clone().unwrap_or(Value::Null))
            }
            ArgBuilder::Keyword { inner, actual_index } => {
                consumed[*actual_index] = true;
                let (_, value) = args.slot(*actual_index).ok_or(ConvertError {
                    value_kind: "missing",
                    to: inner.parameter().ty,
                })?;
                oracle.convert(&value, inner.target_type())
            }
            ArgBuilder::ParamsArray { param, element, start, count } => {
                let mut items = Vec::with_capacity(*count);
                for slot in *start..*start + *count {
                    consumed[slot] = true;
                    let (_, value) = args.slot(slot).ok_or(ConvertError {
                        value_kind: "missing",
                        to: *element,
                    })?;
                    if value.is_null()
                        && param.flags.contains(crate::signature::ParamFlags::PROHIBIT_NULL_ITEMS)
                    {
                        return Err(ConvertError { value_kind: "null", to: *element });
                    }
                    items.push(oracle.convert(&value, *element)?);
                }
                Ok(Value::List(items))
            }
            ArgBuilder::ParamsDict { .. } => {
                let mut entries = Vec::new();
                let base = args.positional_count();
                for i in 0..args.named_count() {
                    let slot = base + i;
                    if consumed[slot] {
                        continue;
                    }
                    consumed[slot] = true;
                    if let Some((_, value)) = args.slot(slot) {
                        entries.push((args.name(i).to_string(), value));
                    }
                }
                Ok(Value::Map(entries))
            }
            ArgBuilder::ByRef { inner_ty, index, .. } => match index {
                Some(slot) => {
                    consumed[*slot] = true;
                    let (_, value) = args.slot(*slot).ok_or(ConvertError {
                        value_kind: "missing",
                        to: *inner_ty,
                    })?;
                    oracle.convert(&value, *inner_ty)
                }
                // Output-only temporary; the callee overwrites it.
                None => Ok(Value::Null),
            },
        }
    }

    /// Clone this builder against a parameter whose type has been
    /// instantiated by generic inference. `None` when the new parameter's
    /// shape no longer fits the builder kind.
    pub fn retarget(&self, param: ParameterDescriptor, table: &TypeTable) -> Option<ArgBuilder> {
        match self {
            ArgBuilder::Simple { index, .. } => Some(ArgBuilder::Simple { param, index: *index }),
            ArgBuilder::Default { .. } => {
                param.default.is_some().then(|| ArgBuilder::Default { param })
            }
            ArgBuilder::Keyword { inner, actual_index } => Some(ArgBuilder::Keyword {
                inner: Box::new(inner.retarget(param, table)?),
                actual_index: *actual_index,
            }),
            ArgBuilder::ParamsArray { start, count, .. } => {
                let element = table.element_type(param.ty)?;
                Some(ArgBuilder::ParamsArray { param, element, start: *start, count: *count })
            }
            ArgBuilder::ParamsDict { .. } => Some(ArgBuilder::ParamsDict { param }),
            ArgBuilder::ByRef { index, .. } => {
                let inner_ty = table.by_ref_inner(param.ty).unwrap_or(param.ty);
                Some(ArgBuilder::ByRef { param, inner_ty, index: *index })
            }
        }
    }
}

/// Assembles the call's visible result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnBuilder {
    /// The callee's return value, unchanged.
    Plain,
    /// Pack the return value together with by-ref/out slot values: the
    /// genuine return value first, then each listed formal slot's final
    /// value in declaration order.
    ByRefPack { slots: Vec<usize> },
}

impl ReturnBuilder {
    pub fn packed_count(&self) -> usize {
        match self {
            ReturnBuilder::Plain => 0,
            ReturnBuilder::ByRefPack { slots } => slots.len(),
        }
    }

    /// Compose the callee's return value with the post-call state of the
    /// formal argument slots.
    pub fn pack(&self, ret: Value, arg_slots: &[Value]) -> Value {
        match self {
            ReturnBuilder::Plain => ret,
            ReturnBuilder::ByRefPack { slots } => {
                let mut packed = Vec::with_capacity(1 + slots.len());
                packed.push(ret);
                for &slot in slots {
                    packed.push(arg_slots[slot].clone());
                }
                Value::List(packed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latebind_common::{TableOracle, VecSpread};
    use std::sync::Arc;

    fn args_123() -> ActualArguments {
        ActualArguments::new(
            vec![
                (TypeId::I64, Value::I64(1)),
                (TypeId::I64, Value::I64(2)),
                (TypeId::I64, Value::I64(3)),
            ],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn simple_consumes_its_slot() {
        let table = TypeTable::new();
        let oracle = TableOracle::new(&table);
        let args = args_123();
        let mut consumed = vec![false; args.slot_count()];
        let b = ArgBuilder::Simple {
            param: ParameterDescriptor::new("a", TypeId::F64),
            index: 1,
        };
        let v = b.produce(&args, &oracle, &mut consumed).unwrap();
        assert_eq!(v, Value::F64(2.0));
        assert_eq!(consumed, vec![false, true, false]);
    }

    #[test]
    fn params_array_collects_a_run() {
        let table = TypeTable::new();
        let oracle = TableOracle::new(&table);
        let args = args_123();
        let mut consumed = vec![false; args.slot_count()];
        let b = ArgBuilder::ParamsArray {
            param: ParameterDescriptor::new("rest", table.array(TypeId::I64)),
            element: TypeId::I64,
            start: 1,
            count: 2,
        };
        let v = b.produce(&args, &oracle, &mut consumed).unwrap();
        assert_eq!(v, Value::List(vec![Value::I64(2), Value::I64(3)]));
        assert_eq!(consumed, vec![false, true, true]);
    }

    #[test]
    fn params_array_reaches_collapsed_spread() {
        let table = TypeTable::new();
        let oracle = TableOracle::new(&table);
        let spread = Arc::new(VecSpread::new(vec![
            (TypeId::I64, Value::I64(8)),
            (TypeId::I64, Value::I64(9)),
        ]));
        let args = ActualArguments::with_spread(
            vec![(TypeId::I64, Value::I64(1))],
            spread,
            0,
            vec![],
        )
        .unwrap();
        let mut consumed = vec![false; args.slot_count()];
        let b = ArgBuilder::ParamsArray {
            param: ParameterDescriptor::new("rest", table.array(TypeId::I64)),
            element: TypeId::I64,
            start: 1,
            count: 2,
        };
        let v = b.produce(&args, &oracle, &mut consumed).unwrap();
        assert_eq!(v, Value::List(vec![Value::I64(8), Value::I64(9)]));
    }

    #[test]
    fn params_dict_takes_leftover_named() {
        let table = TypeTable::new();
        let oracle = TableOracle::new(&table);
        let args = ActualArguments::new(
            vec![],
            vec![
                ("a".into(), TypeId::I64, Value::I64(1)),
                ("b".into(), TypeId::I64, Value::I64(2)),
            ],
        )
        .unwrap();
        let mut consumed = vec![false; args.slot_count()];
        consumed[0] = true; // "a" already claimed elsewhere
        let b = ArgBuilder::ParamsDict {
            param: ParameterDescriptor::new("kw", TypeId::OBJECT),
        };
        let v = b.produce(&args, &oracle, &mut consumed).unwrap();
        assert_eq!(v, Value::Map(vec![("b".into(), Value::I64(2))]));
    }

    #[test]
    fn byref_pack_puts_return_first() {
        let rb = ReturnBuilder::ByRefPack { slots: vec![2, 0] };
        let slots = vec![Value::I64(10), Value::I64(11), Value::I64(12)];
        assert_eq!(
            rb.pack(Value::Bool(true), &slots),
            Value::List(vec![Value::Bool(true), Value::I64(12), Value::I64(10)])
        );
    }

    #[test]
    fn priorities_are_ordered() {
        let p = ParameterDescriptor::new("x", TypeId::I64);
        let simple = ArgBuilder::Simple { param: p.clone(), index: 0 };
        let kw = ArgBuilder::Keyword { inner: Box::new(simple.clone()), actual_index: 0 };
        let default = ArgBuilder::Default { param: p.clone() };
        assert!(simple.priority() < default.priority());
        assert!(default.priority() < kw.priority());
        assert!(kw.priority() < priority::PARAMS);
        assert!(priority::PARAMS < priority::BY_REF);
    }
}

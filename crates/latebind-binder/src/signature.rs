//! Parameter descriptors and callable signatures.
//!
//! A `Signature` is the read-only view of one callable supplied by whatever
//! discovers overloads (reflection layer, host object model). The resolver
//! never mutates it; candidates elaborated from it carry their own descriptor
//! lists.

use std::sync::Arc;

use bitflags::bitflags;
use latebind_common::{TypeId, Value};

bitflags! {
    /// Semantic flags on one formal parameter.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
    pub struct ParamFlags: u16 {
        /// Null arguments are rejected regardless of the parameter type.
        const PROHIBIT_NULL = 1 << 0;
        /// Elements of a params collection must not be null.
        const PROHIBIT_NULL_ITEMS = 1 << 1;
        /// Trailing params-array collector.
        const PARAMS_ARRAY = 1 << 2;
        /// Trailing params-dictionary collector for leftover named arguments.
        const PARAMS_DICT = 1 << 3;
        /// Filled by the call-site machinery (e.g. an instance slot), not
        /// counted toward the visible arity.
        const HIDDEN = 1 << 4;
        /// In-out by-reference slot.
        const BY_REF = 1 << 5;
        /// Output-only by-reference slot; consumes no argument when reduced.
        const OUT = 1 << 6;
        /// Has a default value; may be dropped from shorter candidates.
        const OPTIONAL = 1 << 7;
    }
}

/// Semantic view of one formal parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDescriptor {
    pub ty: TypeId,
    pub name: String,
    pub flags: ParamFlags,
    /// Present iff `OPTIONAL` is set.
    pub default: Option<Value>,
}

impl ParameterDescriptor {
    pub fn new(name: &str, ty: TypeId) -> Self {
        ParameterDescriptor {
            ty,
            name: name.to_string(),
            flags: ParamFlags::empty(),
            default: None,
        }
    }

    pub fn with_flags(mut self, flags: ParamFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.flags |= ParamFlags::OPTIONAL;
        self.default = Some(value);
        self
    }

    /// Same target type and the same null treatment. Structural; descriptors
    /// from different signatures can be equivalent without sharing identity.
    pub fn equivalent(&self, other: &ParameterDescriptor) -> bool {
        self.ty == other.ty
            && self.flags.contains(ParamFlags::PROHIBIT_NULL)
                == other.flags.contains(ParamFlags::PROHIBIT_NULL)
    }

    pub fn prohibits_null(&self) -> bool {
        self.flags.contains(ParamFlags::PROHIBIT_NULL)
    }

    pub fn is_params_array(&self) -> bool {
        self.flags.contains(ParamFlags::PARAMS_ARRAY)
    }

    pub fn is_params_dict(&self) -> bool {
        self.flags.contains(ParamFlags::PARAMS_DICT)
    }

    pub fn is_params_collector(&self) -> bool {
        self.is_params_array() || self.is_params_dict()
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.contains(ParamFlags::HIDDEN)
    }

    pub fn is_by_ref(&self) -> bool {
        self.flags.contains(ParamFlags::BY_REF)
    }

    pub fn is_out(&self) -> bool {
        self.flags.contains(ParamFlags::OUT)
    }

    pub fn is_optional(&self) -> bool {
        self.flags.contains(ParamFlags::OPTIONAL)
    }
}

bitflags! {
    /// Kind constraints on one generic parameter.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
    pub struct ConstraintFlags: u8 {
        const REFERENCE_TYPE = 1 << 0;
        const VALUE_TYPE = 1 << 1;
        const DEFAULT_CTOR = 1 << 2;
    }
}

/// One generic parameter of a signature with its constraints. Interface
/// constraints may mention other generic parameters of the same signature;
/// inference resolves those dependencies in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenericParam {
    pub name: String,
    pub flags: ConstraintFlags,
    pub interfaces: Vec<TypeId>,
}

impl GenericParam {
    pub fn unconstrained(name: &str) -> Self {
        GenericParam {
            name: name.to_string(),
            ..GenericParam::default()
        }
    }
}

/// Static description of one callable overload.
#[derive(Clone, Debug)]
pub struct Signature {
    pub name: String,
    pub params: Vec<ParameterDescriptor>,
    pub return_type: TypeId,
    pub is_static: bool,
    /// Generic parameters of an open definition; empty for closed callables.
    pub generics: Vec<GenericParam>,
    /// Explicit-interface / compiler-special member; penalized in
    /// tie-breaking, never outright rejected.
    pub is_special: bool,
}

impl Signature {
    pub fn new(name: &str, params: Vec<ParameterDescriptor>, return_type: TypeId) -> Self {
        Signature {
            name: name.to_string(),
            params,
            return_type,
            is_static: true,
            generics: Vec::new(),
            is_special: false,
        }
    }

    pub fn with_generics(mut self, generics: Vec<GenericParam>) -> Self {
        self.generics = generics;
        self
    }

    pub fn with_special(mut self) -> Self {
        self.is_special = true;
        self
    }

    pub fn into_arc(self) -> Arc<Signature> {
        Arc::new(self)
    }

    pub fn generic_arity(&self) -> usize {
        self.generics.len()
    }

    pub fn is_generic_definition(&self) -> bool {
        !self.generics.is_empty()
    }

    /// Trailing params-array/params-dict collector present.
    pub fn is_variadic(&self) -> bool {
        self.params.iter().any(ParameterDescriptor::is_params_collector)
    }

    pub fn hidden_count(&self) -> usize {
        self.params.iter().filter(|p| p.is_hidden()).count()
    }

    /// Number of trailing optional parameters eligible for default filling.
    pub fn trailing_optional_count(&self) -> usize {
        self.params
            .iter()
            .rev()
            .take_while(|p| p.is_optional())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalence_ignores_name_and_optionality() {
        let a = ParameterDescriptor::new("x", TypeId::I32).with_default(Value::I64(1));
        let b = ParameterDescriptor::new("y", TypeId::I32);
        assert!(a.equivalent(&b));
        let c = ParameterDescriptor::new("x", TypeId::I32).with_flags(ParamFlags::PROHIBIT_NULL);
        assert!(!a.equivalent(&c));
    }

    #[test]
    fn trailing_optionals_stop_at_required() {
        let sig = Signature::new(
            "f",
            vec![
                ParameterDescriptor::new("a", TypeId::I32).with_default(Value::I64(0)),
                ParameterDescriptor::new("b", TypeId::I32),
                ParameterDescriptor::new("c", TypeId::I32).with_default(Value::I64(1)),
                ParameterDescriptor::new("d", TypeId::I32).with_default(Value::I64(2)),
            ],
            TypeId::VOID,
        );
        assert_eq!(sig.trailing_optional_count(), 2);
        assert!(!sig.is_variadic());
    }
}

//! The conversion oracle consulted by the resolver.
//!
//! The binder never decides convertibility itself: every "can this argument
//! fill that parameter" question goes through `ConversionOracle`, so hosts
//! can plug in their platform's real conversion rules. `TableOracle` is the
//! built-in implementation used by the test suites and by hosts whose
//! conversion semantics are the ordinary numeric-widening kind.

use crate::narrow::NarrowingLevel;
use crate::table::TypeTable;
use crate::types::{IntrinsicKind, TypeData, TypeId};
use crate::value::Value;

/// Outcome of the pairwise conversion-preference hook.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Preferred {
    First,
    Second,
    Neither,
}

/// A value could not be materialized at the requested type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertError {
    pub value_kind: &'static str,
    pub to: TypeId,
}

/// Conversion queries the resolver delegates to its host.
///
/// Implementations must be monotonic in the narrowing level: a conversion
/// admitted at level `L` must be admitted at every level above `L`. The
/// resolver's escalation loop and the "monotonic narrowing" property both
/// depend on it.
pub trait ConversionOracle: Send + Sync {
    /// Whether `from` (optionally with its concrete runtime value) can fill
    /// a parameter of type `to` at the given level. `prohibit_null` is the
    /// parameter's null-prohibition flag.
    fn can_convert(
        &self,
        from: TypeId,
        from_value: Option<&Value>,
        to: TypeId,
        prohibit_null: bool,
        level: NarrowingLevel,
    ) -> bool;

    /// Caller-pluggable tie-break hook: which of two parameter types is the
    /// better target for an argument of type `arg`. Only consulted after
    /// structural equivalence has failed to decide.
    fn prefer_conversion(&self, _arg: TypeId, _t1: TypeId, _t2: TypeId) -> Preferred {
        Preferred::Neither
    }

    /// Materialize `value` at `to`. Called by argument builders once a
    /// winning candidate is being turned into an invocation.
    fn convert(&self, value: &Value, to: TypeId) -> Result<Value, ConvertError>;
}

/// Table-driven oracle over a `TypeTable`.
///
/// Tier contents, from strict to permissive:
///
/// - `None`: identity, upcast to `object`, constructed-type base walks,
///   null into non-prohibiting reference-like targets.
/// - `One`: lossless numeric widening (including integer literals that
///   provably fit the target).
/// - `Two`: numeric narrowing within the same signedness class.
/// - `Three`: cross-sign integer and float/integer conversions.
/// - `All`: char/integer, char-to-string, and bool/integer coercions.
pub struct TableOracle<'t> {
    table: &'t TypeTable,
}

impl<'t> TableOracle<'t> {
    pub fn new(table: &'t TypeTable) -> Self {
        TableOracle { table }
    }

    /// Lossless widening from `from` to `to`.
    fn widens_to(from: IntrinsicKind, to: IntrinsicKind) -> bool {
        use IntrinsicKind::*;
        if from == to {
            return true;
        }
        match (from, to) {
            // Signed to wider signed.
            (I8, I16 | I32 | I64) | (I16, I32 | I64) | (I32, I64) => true,
            // Unsigned to wider unsigned.
            (U8, U16 | U32 | U64) | (U16, U32 | U64) | (U32, U64) => true,
            // Unsigned to strictly wider signed.
            (U8, I16 | I32 | I64) | (U16, I32 | I64) | (U32, I64) => true,
            // Small integers fit in either float; 64-bit floats hold any
            // 32-bit integer exactly.
            (I8 | I16 | U8 | U16, F32 | F64) => true,
            (I32 | U32, F64) => true,
            (F32, F64) => true,
            _ => false,
        }
    }

    /// Narrowing within one signedness class (admitted at `Two`).
    fn narrows_same_class(from: IntrinsicKind, to: IntrinsicKind) -> bool {
        (from.is_signed_integer() && to.is_signed_integer()
            || (from.is_integer() && !from.is_signed_integer())
                && (to.is_integer() && !to.is_signed_integer())
            || from.is_float() && to.is_float())
            && from.bit_width() > to.bit_width()
    }

    /// Whether a concrete integer literal fits the target type's range.
    fn literal_fits(value: &Value, to: IntrinsicKind) -> bool {
        use IntrinsicKind::*;
        let (magnitude, negative) = match value {
            Value::I64(v) => (v.unsigned_abs(), *v < 0),
            Value::U64(v) => (*v, false),
            _ => return false,
        };
        match to {
            I8 => in_signed_range(magnitude, negative, i8::MAX as u64, i8::MIN as i64),
            I16 => in_signed_range(magnitude, negative, i16::MAX as u64, i16::MIN as i64),
            I32 => in_signed_range(magnitude, negative, i32::MAX as u64, i32::MIN as i64),
            I64 => in_signed_range(magnitude, negative, i64::MAX as u64, i64::MIN),
            U8 => !negative && magnitude <= u8::MAX as u64,
            U16 => !negative && magnitude <= u16::MAX as u64,
            U32 => !negative && magnitude <= u32::MAX as u64,
            U64 => !negative,
            _ => false,
        }
    }

    fn constructed_converts(&self, from: TypeId, to: TypeId) -> bool {
        let TypeData::Constructed { def, .. } = self.table.lookup(from) else {
            return false;
        };
        // Transitive base walk.
        let mut pending = self.table.def_bases(def);
        while let Some(base) = pending.pop() {
            if base == to {
                return true;
            }
            if let TypeData::Constructed { def: base_def, .. } = self.table.lookup(base) {
                pending.extend(self.table.def_bases(base_def));
            }
        }
        false
    }
}

fn in_signed_range(magnitude: u64, negative: bool, max: u64, min: i64) -> bool {
    if negative {
        magnitude <= min.unsigned_abs()
    } else {
        magnitude <= max
    }
}

impl ConversionOracle for TableOracle<'_> {
    fn can_convert(
        &self,
        from: TypeId,
        from_value: Option<&Value>,
        to: TypeId,
        prohibit_null: bool,
        level: NarrowingLevel,
    ) -> bool {
        // Null argument: convertible to any non-prohibiting reference-like
        // target, nothing else.
        let from_is_null = from == TypeId::NULL || from_value.is_some_and(Value::is_null);
        if from_is_null {
            return !prohibit_null && (self.table.is_reference_like(to) || to == TypeId::OBJECT);
        }

        if from == to {
            return true;
        }

        // Everything boxes/upcasts to object.
        if to == TypeId::OBJECT {
            return true;
        }

        // Open generic targets are handled by type inference, not here.
        if self.table.is_open(to) || self.table.is_open(from) {
            return false;
        }

        if self.constructed_converts(from, to) {
            return true;
        }

        let (Some(fk), Some(tk)) = (
            self.table.intrinsic_kind(from),
            self.table.intrinsic_kind(to),
        ) else {
            return false;
        };

        if level >= NarrowingLevel::One && fk.is_numeric() && tk.is_numeric() {
            if Self::widens_to(fk, tk) {
                return true;
            }
            // A literal that provably fits its target is not a lossy
            // conversion, whatever the declared widths say.
            if tk.is_integer() && from_value.is_some_and(|v| Self::literal_fits(v, tk)) {
                return true;
            }
        }

        if level >= NarrowingLevel::Two && Self::narrows_same_class(fk, tk) {
            return true;
        }

        if level >= NarrowingLevel::Three && fk.is_numeric() && tk.is_numeric() {
            return true;
        }

        if level >= NarrowingLevel::All {
            match (fk, tk) {
                (IntrinsicKind::Char, IntrinsicKind::Str) => return true,
                (IntrinsicKind::Char, k) if k.is_integer() => return true,
                (k, IntrinsicKind::Char) if k.is_integer() => return true,
                (IntrinsicKind::Bool, k) if k.is_integer() => return true,
                (k, IntrinsicKind::Bool) if k.is_integer() => return true,
                _ => {}
            }
        }

        false
    }

    fn prefer_conversion(&self, _arg: TypeId, t1: TypeId, t2: TypeId) -> Preferred {
        let (Some(k1), Some(k2)) = (
            self.table.intrinsic_kind(t1),
            self.table.intrinsic_kind(t2),
        ) else {
            return Preferred::Neither;
        };
        if !k1.is_numeric() || !k2.is_numeric() || k1 == k2 {
            return Preferred::Neither;
        }
        // Integer targets beat float targets for an integral argument;
        // narrower beats wider; signed beats unsigned at equal width.
        if k1.is_integer() != k2.is_integer() {
            return if k1.is_integer() {
                Preferred::First
            } else {
                Preferred::Second
            };
        }
        if k1.bit_width() != k2.bit_width() {
            return if k1.bit_width() < k2.bit_width() {
                Preferred::First
            } else {
                Preferred::Second
            };
        }
        if k1.is_signed_integer() != k2.is_signed_integer() {
            return if k1.is_signed_integer() {
                Preferred::First
            } else {
                Preferred::Second
            };
        }
        Preferred::Neither
    }

    fn convert(&self, value: &Value, to: TypeId) -> Result<Value, ConvertError> {
        if to == TypeId::OBJECT {
            return Ok(value.clone());
        }
        let err = || ConvertError {
            value_kind: value.kind(),
            to,
        };
        let Some(kind) = self.table.intrinsic_kind(to) else {
            // Structured targets (arrays, constructed types, delegates)
            // take the value as-is; the resolver already vetted the types.
            return Ok(value.clone());
        };
        use IntrinsicKind::*;
        let converted = match (value, kind) {
            (Value::Null, _) => Value::Null,
            (Value::Bool(b), Bool) => Value::Bool(*b),
            (Value::Bool(b), k) if k.is_integer() => Value::I64(i64::from(*b)),
            (Value::I64(v), k) if k.is_integer() => {
                if k.is_signed_integer() {
                    Value::I64(*v)
                } else {
                    Value::U64(u64::try_from(*v).map_err(|_| err())?)
                }
            }
            (Value::I64(v), k) if k.is_float() => Value::F64(*v as f64),
            (Value::U64(v), k) if k.is_integer() => {
                if k.is_signed_integer() {
                    Value::I64(i64::try_from(*v).map_err(|_| err())?)
                } else {
                    Value::U64(*v)
                }
            }
            (Value::U64(v), k) if k.is_float() => Value::F64(*v as f64),
            (Value::F64(v), k) if k.is_float() => Value::F64(*v),
            (Value::F64(v), k) if k.is_integer() => Value::I64(*v as i64),
            (Value::I64(v), Bool) => Value::Bool(*v != 0),
            (Value::Char(c), Str) => Value::Str(c.to_string()),
            (Value::Char(c), k) if k.is_integer() => Value::I64(i64::from(u32::from(*c))),
            (Value::Char(c), Char) => Value::Char(*c),
            (Value::Str(s), Str) => Value::Str(s.clone()),
            _ => return Err(err()),
        };
        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oracle(table: &TypeTable) -> TableOracle<'_> {
        TableOracle::new(table)
    }

    #[test]
    fn identity_converts_at_every_level() {
        let table = TypeTable::new();
        let o = oracle(&table);
        for level in NarrowingLevel::ALL_LEVELS {
            assert!(o.can_convert(TypeId::I32, None, TypeId::I32, false, level));
        }
    }

    #[test]
    fn widening_needs_level_one() {
        let table = TypeTable::new();
        let o = oracle(&table);
        assert!(!o.can_convert(TypeId::I32, None, TypeId::I64, false, NarrowingLevel::None));
        assert!(o.can_convert(TypeId::I32, None, TypeId::I64, false, NarrowingLevel::One));
        assert!(o.can_convert(TypeId::U8, None, TypeId::I16, false, NarrowingLevel::One));
        assert!(o.can_convert(TypeId::F32, None, TypeId::F64, false, NarrowingLevel::One));
    }

    #[test]
    fn narrowing_tiers_are_graded() {
        let table = TypeTable::new();
        let o = oracle(&table);
        // Same-class narrowing: level two.
        assert!(!o.can_convert(TypeId::I64, None, TypeId::I32, false, NarrowingLevel::One));
        assert!(o.can_convert(TypeId::I64, None, TypeId::I32, false, NarrowingLevel::Two));
        // Cross-domain: level three.
        assert!(!o.can_convert(TypeId::F64, None, TypeId::I32, false, NarrowingLevel::Two));
        assert!(o.can_convert(TypeId::F64, None, TypeId::I32, false, NarrowingLevel::Three));
        // Char/bool coercions: only at All.
        assert!(!o.can_convert(TypeId::CHAR, None, TypeId::STR, false, NarrowingLevel::Three));
        assert!(o.can_convert(TypeId::CHAR, None, TypeId::STR, false, NarrowingLevel::All));
    }

    #[test]
    fn monotonic_in_level() {
        let table = TypeTable::new();
        let o = oracle(&table);
        let pairs = [
            (TypeId::I32, TypeId::I64),
            (TypeId::I64, TypeId::I8),
            (TypeId::F64, TypeId::U32),
            (TypeId::BOOL, TypeId::I32),
            (TypeId::STR, TypeId::OBJECT),
        ];
        for (from, to) in pairs {
            let mut seen = false;
            for level in NarrowingLevel::ALL_LEVELS {
                let ok = o.can_convert(from, None, to, false, level);
                assert!(!seen || ok, "conversion lost when escalating to {level:?}");
                seen |= ok;
            }
        }
    }

    #[test]
    fn literal_fit_admits_narrowing_early() {
        let table = TypeTable::new();
        let o = oracle(&table);
        let small = Value::I64(5);
        let big = Value::I64(100_000);
        assert!(o.can_convert(TypeId::I64, Some(&small), TypeId::I8, false, NarrowingLevel::One));
        assert!(!o.can_convert(TypeId::I64, Some(&big), TypeId::I8, false, NarrowingLevel::One));
    }

    #[test]
    fn null_respects_prohibition() {
        let table = TypeTable::new();
        let o = oracle(&table);
        let null = Value::Null;
        assert!(o.can_convert(TypeId::NULL, Some(&null), TypeId::STR, false, NarrowingLevel::None));
        assert!(!o.can_convert(TypeId::NULL, Some(&null), TypeId::STR, true, NarrowingLevel::None));
        // Value types never take null.
        assert!(!o.can_convert(TypeId::NULL, Some(&null), TypeId::I32, false, NarrowingLevel::All));
    }

    #[test]
    fn base_walk_converts_constructed_types() {
        let table = TypeTable::new();
        let animal = table.add_def("Animal", 0, vec![]);
        let animal_ty = table.constructed(animal, vec![]);
        let cat = table.add_def("Cat", 0, vec![animal_ty]);
        let cat_ty = table.constructed(cat, vec![]);
        let o = oracle(&table);
        assert!(o.can_convert(cat_ty, None, animal_ty, false, NarrowingLevel::None));
        assert!(!o.can_convert(animal_ty, None, cat_ty, false, NarrowingLevel::All));
    }

    #[test]
    fn numeric_preference_is_antisymmetric() {
        let table = TypeTable::new();
        let o = oracle(&table);
        assert_eq!(
            o.prefer_conversion(TypeId::I64, TypeId::I32, TypeId::I64),
            Preferred::First
        );
        assert_eq!(
            o.prefer_conversion(TypeId::I64, TypeId::I64, TypeId::I32),
            Preferred::Second
        );
        assert_eq!(
            o.prefer_conversion(TypeId::I64, TypeId::I32, TypeId::F64),
            Preferred::First
        );
        assert_eq!(
            o.prefer_conversion(TypeId::I64, TypeId::STR, TypeId::I32),
            Preferred::Neither
        );
    }

    #[test]
    fn convert_materializes_numerics() {
        let table = TypeTable::new();
        let o = oracle(&table);
        assert_eq!(o.convert(&Value::I64(3), TypeId::F64), Ok(Value::F64(3.0)));
        assert_eq!(o.convert(&Value::Bool(true), TypeId::I32), Ok(Value::I64(1)));
        assert_eq!(
            o.convert(&Value::Char('x'), TypeId::STR),
            Ok(Value::Str("x".to_string()))
        );
        assert!(o.convert(&Value::Str("no".into()), TypeId::I32).is_err());
    }
}

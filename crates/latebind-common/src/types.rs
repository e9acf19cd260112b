//! Structural type representation.
//!
//! Types are plain data interned by the `TypeTable`; a `TypeId` is a stable
//! handle into that table. The universe is deliberately small: the binder
//! only needs enough structure to express parameter shapes (arrays, by-ref
//! slots, delegates, constructed generics) and to walk those shapes during
//! generic inference.

/// Handle to an interned type. Equality is identity in the owning table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Handle to a registered nominal definition (class/interface-like).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DefId(pub u32);

/// Built-in leaf types. Interned at fixed positions by `TypeTable::new`,
/// so `TypeId::OBJECT` and friends are valid in every table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntrinsicKind {
    Void,
    Null,
    Bool,
    Char,
    Str,
    Object,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl IntrinsicKind {
    pub const ALL: [IntrinsicKind; 16] = [
        IntrinsicKind::Void,
        IntrinsicKind::Null,
        IntrinsicKind::Bool,
        IntrinsicKind::Char,
        IntrinsicKind::Str,
        IntrinsicKind::Object,
        IntrinsicKind::I8,
        IntrinsicKind::I16,
        IntrinsicKind::I32,
        IntrinsicKind::I64,
        IntrinsicKind::U8,
        IntrinsicKind::U16,
        IntrinsicKind::U32,
        IntrinsicKind::U64,
        IntrinsicKind::F32,
        IntrinsicKind::F64,
    ];

    /// Signed or unsigned integer.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            IntrinsicKind::I8
                | IntrinsicKind::I16
                | IntrinsicKind::I32
                | IntrinsicKind::I64
                | IntrinsicKind::U8
                | IntrinsicKind::U16
                | IntrinsicKind::U32
                | IntrinsicKind::U64
        )
    }

    pub fn is_signed_integer(self) -> bool {
        matches!(
            self,
            IntrinsicKind::I8 | IntrinsicKind::I16 | IntrinsicKind::I32 | IntrinsicKind::I64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, IntrinsicKind::F32 | IntrinsicKind::F64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Bit width used by the widening tables. Zero for non-numerics.
    pub fn bit_width(self) -> u32 {
        match self {
            IntrinsicKind::I8 | IntrinsicKind::U8 => 8,
            IntrinsicKind::I16 | IntrinsicKind::U16 => 16,
            IntrinsicKind::I32 | IntrinsicKind::U32 | IntrinsicKind::F32 => 32,
            IntrinsicKind::I64 | IntrinsicKind::U64 | IntrinsicKind::F64 => 64,
            _ => 0,
        }
    }
}

impl TypeId {
    pub const VOID: TypeId = TypeId(0);
    pub const NULL: TypeId = TypeId(1);
    pub const BOOL: TypeId = TypeId(2);
    pub const CHAR: TypeId = TypeId(3);
    pub const STR: TypeId = TypeId(4);
    pub const OBJECT: TypeId = TypeId(5);
    pub const I8: TypeId = TypeId(6);
    pub const I16: TypeId = TypeId(7);
    pub const I32: TypeId = TypeId(8);
    pub const I64: TypeId = TypeId(9);
    pub const U8: TypeId = TypeId(10);
    pub const U16: TypeId = TypeId(11);
    pub const U32: TypeId = TypeId(12);
    pub const U64: TypeId = TypeId(13);
    pub const F32: TypeId = TypeId(14);
    pub const F64: TypeId = TypeId(15);
}

/// Signature shape of a delegate (first-class callable) type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DelegateShape {
    pub params: Vec<TypeId>,
    pub ret: TypeId,
}

/// Structural key for one type. Interning deduplicates identical keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Intrinsic(IntrinsicKind),
    /// Homogeneous sequence with a fixed element type.
    Array(TypeId),
    /// A by-reference slot around an inner type. Appears only in parameter
    /// positions; arguments bound to it carry the same shape.
    ByRef(TypeId),
    Delegate(DelegateShape),
    /// An open generic parameter of the signature currently being bound.
    /// `index` is its position in the owning signature's generic list.
    GenericParam { index: u16, name: String },
    /// Instantiation of a nominal definition. Non-generic nominals are
    /// `Constructed` with an empty argument list.
    Constructed { def: DefId, args: Vec<TypeId> },
}

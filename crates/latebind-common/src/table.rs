//! Type interning for structural deduplication.
//!
//! The table converts `TypeData` keys into lightweight `TypeId` handles:
//!
//! - O(1) type equality (compare `TypeId` values)
//! - each unique structure stored once
//! - safe shared read access across threads (one coarse lock; the binder
//!   never holds it across a resolution step)

use std::sync::RwLock;

use rustc_hash::FxHashMap;

use crate::types::{DefId, DelegateShape, IntrinsicKind, TypeData, TypeId};

struct DefData {
    name: String,
    arity: u16,
    bases: Vec<TypeId>,
    has_default_ctor: bool,
}

struct TableInner {
    types: Vec<TypeData>,
    map: FxHashMap<TypeData, TypeId>,
    defs: Vec<DefData>,
}

/// Interning table shared by a host and every resolver consulting it.
pub struct TypeTable {
    inner: RwLock<TableInner>,
}

impl TypeTable {
    /// Create a table with all intrinsics pre-interned at their fixed
    /// `TypeId` constants.
    pub fn new() -> Self {
        let mut types = Vec::with_capacity(IntrinsicKind::ALL.len());
        let mut map = FxHashMap::default();
        for kind in IntrinsicKind::ALL {
            let id = TypeId(types.len() as u32);
            let data = TypeData::Intrinsic(kind);
            map.insert(data.clone(), id);
            types.push(data);
        }
        TypeTable {
            inner: RwLock::new(TableInner {
                types,
                map,
                defs: Vec::new(),
            }),
        }
    }

    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(&id) = self.inner.read().unwrap().map.get(&data) {
            return id;
        }
        let mut inner = self.inner.write().unwrap();
        // Re-check under the write lock; another thread may have won.
        if let Some(&id) = inner.map.get(&data) {
            return id;
        }
        let id = TypeId(inner.types.len() as u32);
        inner.types.push(data.clone());
        inner.map.insert(data, id);
        id
    }

    /// Retrieve the structure behind a handle. Panics on a handle from a
    /// different table; ids are never forged by the binder.
    pub fn lookup(&self, id: TypeId) -> TypeData {
        self.inner.read().unwrap().types[id.0 as usize].clone()
    }

    pub fn array(&self, element: TypeId) -> TypeId {
        self.intern(TypeData::Array(element))
    }

    pub fn by_ref(&self, inner: TypeId) -> TypeId {
        self.intern(TypeData::ByRef(inner))
    }

    pub fn delegate(&self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern(TypeData::Delegate(DelegateShape { params, ret }))
    }

    pub fn generic_param(&self, index: u16, name: &str) -> TypeId {
        self.intern(TypeData::GenericParam {
            index,
            name: name.to_string(),
        })
    }

    pub fn constructed(&self, def: DefId, args: Vec<TypeId>) -> TypeId {
        self.intern(TypeData::Constructed { def, args })
    }

    /// Register a nominal definition. `bases` are types the definition is
    /// implicitly convertible to (base classes / implemented interfaces).
    pub fn add_def(&self, name: &str, arity: u16, bases: Vec<TypeId>) -> DefId {
        self.add_def_full(name, arity, bases, true)
    }

    pub fn add_def_full(
        &self,
        name: &str,
        arity: u16,
        bases: Vec<TypeId>,
        has_default_ctor: bool,
    ) -> DefId {
        let mut inner = self.inner.write().unwrap();
        let id = DefId(inner.defs.len() as u32);
        inner.defs.push(DefData {
            name: name.to_string(),
            arity,
            bases,
            has_default_ctor,
        });
        id
    }

    pub fn def_name(&self, def: DefId) -> String {
        self.inner.read().unwrap().defs[def.0 as usize].name.clone()
    }

    pub fn def_arity(&self, def: DefId) -> u16 {
        self.inner.read().unwrap().defs[def.0 as usize].arity
    }

    pub fn def_bases(&self, def: DefId) -> Vec<TypeId> {
        self.inner.read().unwrap().defs[def.0 as usize].bases.clone()
    }

    pub fn def_has_default_ctor(&self, def: DefId) -> bool {
        self.inner.read().unwrap().defs[def.0 as usize].has_default_ctor
    }

    // ------------------------------------------------------------------
    // Structural queries
    // ------------------------------------------------------------------

    pub fn intrinsic_kind(&self, id: TypeId) -> Option<IntrinsicKind> {
        match self.lookup(id) {
            TypeData::Intrinsic(kind) => Some(kind),
            _ => None,
        }
    }

    /// Element type of an array type.
    pub fn element_type(&self, id: TypeId) -> Option<TypeId> {
        match self.lookup(id) {
            TypeData::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Inner type of a by-ref slot.
    pub fn by_ref_inner(&self, id: TypeId) -> Option<TypeId> {
        match self.lookup(id) {
            TypeData::ByRef(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        self.intrinsic_kind(id).is_some_and(IntrinsicKind::is_numeric)
    }

    /// Reference-like types accept null unless the parameter prohibits it.
    pub fn is_reference_like(&self, id: TypeId) -> bool {
        match self.lookup(id) {
            TypeData::Intrinsic(kind) => {
                matches!(kind, IntrinsicKind::Object | IntrinsicKind::Str | IntrinsicKind::Null)
            }
            TypeData::Array(_) | TypeData::Delegate(_) | TypeData::Constructed { .. } => true,
            TypeData::ByRef(_) | TypeData::GenericParam { .. } => false,
        }
    }

    /// Whether the type mentions any open generic parameter.
    pub fn is_open(&self, id: TypeId) -> bool {
        match self.lookup(id) {
            TypeData::GenericParam { .. } => true,
            TypeData::Intrinsic(_) => false,
            TypeData::Array(elem) => self.is_open(elem),
            TypeData::ByRef(inner) => self.is_open(inner),
            TypeData::Delegate(shape) => {
                self.is_open(shape.ret) || shape.params.iter().any(|&p| self.is_open(p))
            }
            TypeData::Constructed { args, .. } => args.iter().any(|&a| self.is_open(a)),
        }
    }

    /// Human-readable rendering for diagnostics.
    pub fn display(&self, id: TypeId) -> String {
        match self.lookup(id) {
            TypeData::Intrinsic(kind) => format!("{kind:?}").to_lowercase(),
            TypeData::Array(elem) => format!("{}[]", self.display(elem)),
            TypeData::ByRef(inner) => format!("ref {}", self.display(inner)),
            TypeData::Delegate(shape) => {
                let params: Vec<String> = shape.params.iter().map(|&p| self.display(p)).collect();
                format!("({}) -> {}", params.join(", "), self.display(shape.ret))
            }
            TypeData::GenericParam { name, .. } => name,
            TypeData::Constructed { def, args } => {
                let name = self.def_name(def);
                if args.is_empty() {
                    name
                } else {
                    let args: Vec<String> = args.iter().map(|&a| self.display(a)).collect();
                    format!("{}<{}>", name, args.join(", "))
                }
            }
        }
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        TypeTable::new()
    }
}

//! Runtime value model and spread-sequence access.

use crate::types::TypeId;

/// A runtime value flowing through argument builders. The binder itself
/// only constructs lists and maps (for params collectors) and performs
/// oracle-driven conversions; hosts with richer object models carry their
/// handles through the type table and a custom oracle.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Char(char),
    Str(String),
    List(Vec<Value>),
    Map(Vec<(String, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short tag for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I64(_) => "int",
            Value::U64(_) => "uint",
            Value::F64(_) => "float",
            Value::Char(_) => "char",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

/// By-index access to a splatted argument sequence.
///
/// The resolver reasons about the sequence's length without enumerating it;
/// only element-wise convertibility checks and final materialization touch
/// individual items.
pub trait SpreadItems: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The item at `index`, as (static type, value). `None` past the end.
    fn item(&self, index: usize) -> Option<(TypeId, Value)>;
}

/// Spread sequence backed by an in-memory vector.
pub struct VecSpread {
    items: Vec<(TypeId, Value)>,
}

impl VecSpread {
    pub fn new(items: Vec<(TypeId, Value)>) -> Self {
        VecSpread { items }
    }
}

impl SpreadItems for VecSpread {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn item(&self, index: usize) -> Option<(TypeId, Value)> {
        self.items.get(index).cloned()
    }
}

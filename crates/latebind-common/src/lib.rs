//! Shared vocabulary for the latebind call binder.
//!
//! This crate holds everything the binder and its hosts must agree on:
//!
//! - **Interned types**: structural `TypeData` deduplicated into `TypeId`
//!   handles by a `TypeTable`, so type equality is an integer comparison.
//! - **Runtime values**: the `Value` model arguments are supplied in, plus
//!   `SpreadItems`, the by-index view over a splatted argument sequence.
//! - **Narrowing levels**: the ordered strictness tiers that grade which
//!   implicit conversions are admissible during matching.
//! - **The conversion oracle**: the trait the binder consults for every
//!   convertibility question, together with `TableOracle`, a table-driven
//!   default implementation suitable for tests and simple hosts.
//!
//! Nothing in this crate performs overload resolution; it is pure data and
//! pure relations over data.

mod narrow;
mod oracle;
mod table;
mod types;
mod value;

pub use narrow::NarrowingLevel;
pub use oracle::{ConversionOracle, ConvertError, Preferred, TableOracle};
pub use table::TypeTable;
pub use types::{DefId, DelegateShape, IntrinsicKind, TypeData, TypeId};
pub use value::{SpreadItems, Value, VecSpread};

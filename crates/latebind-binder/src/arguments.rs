//! The call site's actual arguments.
//!
//! `ActualArguments` is built once per resolution call and immutable after.
//! Positional arguments may come partly from a splatted sequence: a leading
//! run of spread items is expanded into individually visible positions and
//! the remainder stays "collapsed" behind a marker, reachable by index
//! through `SpreadItems` without eager enumeration.

use std::sync::Arc;

use latebind_common::{SpreadItems, TypeId, Value};

/// Actual-argument construction failed before resolution could start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgumentsError {
    /// Requested more expanded spread items than the sequence holds.
    SpreadTooShort { requested: usize, len: usize },
    /// More hidden arguments than positional arguments exist.
    HiddenExceedsPositional { hidden: usize, positional: usize },
}

/// Positional, named, and spread arguments of one call.
pub struct ActualArguments {
    positional: Vec<(TypeId, Value)>,
    named: Vec<(TypeId, Value)>,
    names: Vec<String>,
    spread: Option<Arc<dyn SpreadItems>>,
    /// Spread items individually expanded into `positional`.
    expanded: usize,
    hidden_count: usize,
    collapsed_count: usize,
    first_spread_index: Option<usize>,
    spread_marker_index: Option<usize>,
}

impl std::fmt::Debug for ActualArguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActualArguments")
            .field("positional", &self.positional)
            .field("named", &self.named)
            .field("names", &self.names)
            .field("spread", &self.spread.as_ref().map(|s| s.len()))
            .field("expanded", &self.expanded)
            .field("hidden_count", &self.hidden_count)
            .field("collapsed_count", &self.collapsed_count)
            .field("first_spread_index", &self.first_spread_index)
            .field("spread_marker_index", &self.spread_marker_index)
            .finish()
    }
}

impl ActualArguments {
    /// Plain positional plus named arguments, no spread.
    pub fn new(
        positional: Vec<(TypeId, Value)>,
        named: Vec<(String, TypeId, Value)>,
    ) -> Result<Self, ArgumentsError> {
        Self::build(positional, None, 0, named, 0)
    }

    /// As `new`, with `hidden` leading positional arguments that fill hidden
    /// parameter slots and do not count toward the visible arity.
    pub fn with_hidden(
        positional: Vec<(TypeId, Value)>,
        hidden: usize,
        named: Vec<(String, TypeId, Value)>,
    ) -> Result<Self, ArgumentsError> {
        Self::build(positional, None, 0, named, hidden)
    }

    /// Positional arguments followed by a splatted sequence. The first
    /// `expanded` spread items become individually visible positions; the
    /// rest stay collapsed behind a marker.
    pub fn with_spread(
        positional: Vec<(TypeId, Value)>,
        spread: Arc<dyn SpreadItems>,
        expanded: usize,
        named: Vec<(String, TypeId, Value)>,
    ) -> Result<Self, ArgumentsError> {
        Self::build(positional, Some(spread), expanded, named, 0)
    }

    fn build(
        mut positional: Vec<(TypeId, Value)>,
        spread: Option<Arc<dyn SpreadItems>>,
        expanded: usize,
        named: Vec<(String, TypeId, Value)>,
        hidden: usize,
    ) -> Result<Self, ArgumentsError> {
        if hidden > positional.len() {
            return Err(ArgumentsError::HiddenExceedsPositional {
                hidden,
                positional: positional.len(),
            });
        }
        let mut collapsed_count = 0;
        let mut first_spread_index = None;
        let mut spread_marker_index = None;
        if let Some(seq) = &spread {
            if expanded > seq.len() {
                return Err(ArgumentsError::SpreadTooShort {
                    requested: expanded,
                    len: seq.len(),
                });
            }
            first_spread_index = Some(positional.len());
            for i in 0..expanded {
                // In-range by the check above.
                if let Some(item) = seq.item(i) {
                    positional.push(item);
                }
            }
            collapsed_count = seq.len() - expanded;
            if collapsed_count > 0 {
                spread_marker_index = Some(positional.len());
            }
        }
        let (names, named) = named
            .into_iter()
            .map(|(name, ty, value)| (name, (ty, value)))
            .unzip();
        Ok(ActualArguments {
            positional,
            named,
            names,
            spread,
            expanded,
            hidden_count: hidden,
            collapsed_count,
            first_spread_index,
            spread_marker_index,
        })
    }

    /// Arity seen by candidate selection: every positional slot (collapsed
    /// included) plus named arguments, minus hidden slots.
    pub fn visible_count(&self) -> usize {
        self.positional.len() + self.named.len() + self.collapsed_count - self.hidden_count
    }

    /// Logical positional slots, collapsed items included.
    pub fn positional_count(&self) -> usize {
        self.positional.len() + self.collapsed_count
    }

    /// Total logical slots (positional then named); the length builders
    /// expect of the consumed marker buffer.
    pub fn slot_count(&self) -> usize {
        self.positional_count() + self.named.len()
    }

    pub fn named_count(&self) -> usize {
        self.named.len()
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden_count
    }

    pub fn collapsed_count(&self) -> usize {
        self.collapsed_count
    }

    pub fn first_spread_index(&self) -> Option<usize> {
        self.first_spread_index
    }

    pub fn spread_marker_index(&self) -> Option<usize> {
        self.spread_marker_index
    }

    pub fn name(&self, i: usize) -> &str {
        &self.names[i]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The argument in logical slot `i`: positional slots first (reaching
    /// into the collapsed spread tail where needed), then named ones.
    pub fn slot(&self, i: usize) -> Option<(TypeId, Value)> {
        if i < self.positional.len() {
            return Some(self.positional[i].clone());
        }
        let past = i - self.positional.len();
        if past < self.collapsed_count {
            let seq = self.spread.as_ref()?;
            return seq.item(self.expanded + past);
        }
        self.named.get(past - self.collapsed_count).cloned()
    }

    pub fn slot_type(&self, i: usize) -> Option<TypeId> {
        self.slot(i).map(|(ty, _)| ty)
    }

    /// A still-collapsed spread item, by offset within the collapsed tail.
    pub fn collapsed_item(&self, offset: usize) -> Option<(TypeId, Value)> {
        if offset >= self.collapsed_count {
            return None;
        }
        self.spread.as_ref()?.item(self.expanded + offset)
    }
}

//! Graded conversion strictness.

/// Ordered strictness tiers controlling which implicit conversions are
/// admissible while matching arguments against a candidate.
///
/// Each level strictly permits a superset of the conversions of the level
/// before it; the resolver relies on that monotonicity when it escalates
/// from a failed tier to the next one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum NarrowingLevel {
    /// Only identity, reference widening, and boxing-like conversions.
    #[default]
    None,
    One,
    Two,
    Three,
    /// Every conversion the oracle knows about.
    All,
}

impl NarrowingLevel {
    pub const ALL_LEVELS: [NarrowingLevel; 5] = [
        NarrowingLevel::None,
        NarrowingLevel::One,
        NarrowingLevel::Two,
        NarrowingLevel::Three,
        NarrowingLevel::All,
    ];

    /// The next more permissive level, if any.
    pub fn next(self) -> Option<NarrowingLevel> {
        match self {
            NarrowingLevel::None => Some(NarrowingLevel::One),
            NarrowingLevel::One => Some(NarrowingLevel::Two),
            NarrowingLevel::Two => Some(NarrowingLevel::Three),
            NarrowingLevel::Three => Some(NarrowingLevel::All),
            NarrowingLevel::All => None,
        }
    }

    /// Iterate levels from `self` through `max`, inclusive.
    pub fn through(self, max: NarrowingLevel) -> impl Iterator<Item = NarrowingLevel> {
        NarrowingLevel::ALL_LEVELS
            .into_iter()
            .filter(move |&l| l >= self && l <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_totally_ordered() {
        assert!(NarrowingLevel::None < NarrowingLevel::One);
        assert!(NarrowingLevel::One < NarrowingLevel::Two);
        assert!(NarrowingLevel::Two < NarrowingLevel::Three);
        assert!(NarrowingLevel::Three < NarrowingLevel::All);
    }

    #[test]
    fn through_is_inclusive() {
        let levels: Vec<_> = NarrowingLevel::None.through(NarrowingLevel::Two).collect();
        assert_eq!(
            levels,
            vec![NarrowingLevel::None, NarrowingLevel::One, NarrowingLevel::Two]
        );
        let single: Vec<_> = NarrowingLevel::All.through(NarrowingLevel::All).collect();
        assert_eq!(single, vec![NarrowingLevel::All]);
    }
}

//! Defines the `Condition` enum, the three-valued outcome of evaluating a
//! threshold rule (or a whole rule set) on one day of observations.

use std::fmt;

/// The outcome of a rule for one day.
///
/// `Unknown` is produced whenever the underlying reading is missing, or when a
/// persistence window contains an unknown day or does not yet have enough
/// history. It is never collapsed into `False`.
///
/// # Examples
///
/// ```
/// use blastdt::Condition;
///
/// assert_eq!(Condition::from(Some(true)), Condition::True);
/// assert_eq!(Condition::from(None), Condition::Unknown);
/// assert_eq!(Condition::True.and(Condition::Unknown), Condition::Unknown);
/// assert_eq!(Condition::True.and(Condition::False), Condition::False);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// The condition holds.
    True,
    /// The condition was evaluated on known data and does not hold.
    False,
    /// The condition could not be evaluated.
    Unknown,
}

impl Condition {
    /// Three-valued conjunction where `Unknown` dominates.
    ///
    /// Unlike Kleene logic, `False AND Unknown` is `Unknown`: a day is only
    /// reported as "not at risk" when every input to the decision was known.
    pub fn and(self, other: Condition) -> Condition {
        match (self, other) {
            (Condition::Unknown, _) | (_, Condition::Unknown) => Condition::Unknown,
            (Condition::True, Condition::True) => Condition::True,
            _ => Condition::False,
        }
    }

    /// Folds [`Condition::and`] over all items. An empty input is `True`.
    pub fn all<I>(conditions: I) -> Condition
    where
        I: IntoIterator<Item = Condition>,
    {
        conditions
            .into_iter()
            .fold(Condition::True, Condition::and)
    }

    pub fn is_known(self) -> bool {
        self != Condition::Unknown
    }

    /// Converts back into an optional boolean, `None` meaning unknown.
    pub fn as_option(self) -> Option<bool> {
        match self {
            Condition::True => Some(true),
            Condition::False => Some(false),
            Condition::Unknown => None,
        }
    }
}

impl From<Option<bool>> for Condition {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Condition::True,
            Some(false) => Condition::False,
            None => Condition::Unknown,
        }
    }
}

impl From<bool> for Condition {
    fn from(value: bool) -> Self {
        Condition::from(Some(value))
    }
}

/// Formats the condition the way it is written to CSV: `true`, `false`, or an
/// empty string for unknown.
impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::True => write!(f, "true"),
            Condition::False => write!(f, "false"),
            Condition::Unknown => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_truth_table() {
        use Condition::*;
        assert_eq!(True.and(True), True);
        assert_eq!(True.and(False), False);
        assert_eq!(False.and(True), False);
        assert_eq!(False.and(False), False);
        assert_eq!(True.and(Unknown), Unknown);
        assert_eq!(Unknown.and(True), Unknown);
        // Missing data must not be hidden behind a known `False`.
        assert_eq!(False.and(Unknown), Unknown);
        assert_eq!(Unknown.and(False), Unknown);
    }

    #[test]
    fn test_all_folds() {
        use Condition::*;
        assert_eq!(Condition::all([]), True);
        assert_eq!(Condition::all([True, True, True]), True);
        assert_eq!(Condition::all([True, False, True]), False);
        assert_eq!(Condition::all([False, Unknown]), Unknown);
    }

    #[test]
    fn test_display_and_option() {
        assert_eq!(Condition::True.to_string(), "true");
        assert_eq!(Condition::False.to_string(), "false");
        assert_eq!(Condition::Unknown.to_string(), "");
        assert_eq!(Condition::Unknown.as_option(), None);
        assert!(!Condition::Unknown.is_known());
        assert!(Condition::False.is_known());
    }
}

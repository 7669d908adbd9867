//! Range bound operators for `RangeIterator` and `TreeNavigator::range_bounds`.

use crate::innodb::field_decode::FieldValue;

/// A comparison operator used to delimit one side of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Strictly greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Strictly less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// No bound. Must be paired with an empty key.
    Nop,
}

impl Operator {
    /// Whether this operator admits equality at the boundary key itself.
    pub fn is_inclusive(self) -> bool {
        matches!(self, Operator::Gte | Operator::Lte)
    }
}

/// One side of a range: an operator paired with a composite key.
///
/// An empty `key` must be paired with [`Operator::Nop`] and represents "no
/// bound on this side".
#[derive(Debug, Clone)]
pub struct Bound {
    /// The comparison operator for this bound.
    pub op: Operator,
    /// The composite key values to compare against. Empty iff `op == Nop`.
    pub key: Vec<FieldValue>,
}

impl Bound {
    /// Construct an unbounded side (`NOP`, empty key).
    pub fn unbounded() -> Self {
        Bound {
            op: Operator::Nop,
            key: Vec::new(),
        }
    }

    /// Construct a bound with the given operator and key.
    ///
    /// # Panics
    ///
    /// Panics if `op == Nop` and `key` is non-empty, or vice versa — callers
    /// should validate at the API boundary instead of relying on this.
    pub fn new(op: Operator, key: Vec<FieldValue>) -> Self {
        debug_assert_eq!(
            op == Operator::Nop,
            key.is_empty(),
            "NOP must be paired with an empty key"
        );
        Bound { op, key }
    }

    /// Whether this bound is the unbounded (`NOP`) side.
    pub fn is_unbounded(&self) -> bool {
        matches!(self.op, Operator::Nop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_is_nop_with_empty_key() {
        let b = Bound::unbounded();
        assert!(b.is_unbounded());
        assert!(b.key.is_empty());
    }

    #[test]
    fn test_inclusive_operators() {
        assert!(Operator::Gte.is_inclusive());
        assert!(Operator::Lte.is_inclusive());
        assert!(!Operator::Gt.is_inclusive());
        assert!(!Operator::Lt.is_inclusive());
        assert!(!Operator::Nop.is_inclusive());
    }

    #[test]
    fn test_bound_new_with_key() {
        let b = Bound::new(Operator::Gt, vec![FieldValue::Int(5)]);
        assert_eq!(b.op, Operator::Gt);
        assert!(!b.is_unbounded());
    }
}

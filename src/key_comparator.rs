//! Composite primary-key comparison.

use std::cmp::Ordering;

use crate::innodb::field_decode::FieldValue;

/// Lexicographic comparison across composite keys, matching InnoDB's own
/// memcmp-style ordering of decoded values.
pub trait KeyComparator {
    /// Compare two composite keys, returning an `Ordering`. Shorter keys
    /// compare as a prefix of longer ones (as `range_bounds` needs when
    /// comparing a partial key against a full composite PK).
    fn compare(&self, a: &[FieldValue], b: &[FieldValue]) -> Ordering;
}

/// The default `KeyComparator`: compares composite keys column-by-column in
/// order, stopping at the first non-equal pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicographicComparator;

impl KeyComparator for LexicographicComparator {
    fn compare(&self, a: &[FieldValue], b: &[FieldValue]) -> Ordering {
        for (av, bv) in a.iter().zip(b.iter()) {
            let ord = compare_value(av, bv);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.len().cmp(&b.len())
    }
}

fn compare_value(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
        (FieldValue::Null, _) => Ordering::Less,
        (_, FieldValue::Null) => Ordering::Greater,

        (FieldValue::Int(x), FieldValue::Int(y)) => x.cmp(y),
        (FieldValue::Uint(x), FieldValue::Uint(y)) => x.cmp(y),
        (FieldValue::Int(x), FieldValue::Uint(y)) => (*x as i128).cmp(&(*y as i128)),
        (FieldValue::Uint(x), FieldValue::Int(y)) => (*x as i128).cmp(&(*y as i128)),

        (FieldValue::Float(x), FieldValue::Float(y)) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (FieldValue::Double(x), FieldValue::Double(y)) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (FieldValue::Float(x), FieldValue::Double(y)) => {
            (*x as f64).partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (FieldValue::Double(x), FieldValue::Float(y)) => {
            x.partial_cmp(&(*y as f64)).unwrap_or(Ordering::Equal)
        }

        (FieldValue::Str(x), FieldValue::Str(y)) => x.cmp(y),
        (FieldValue::Hex(x), FieldValue::Hex(y)) => x.cmp(y),
        (FieldValue::Str(x), FieldValue::Hex(y)) => x.cmp(y),
        (FieldValue::Hex(x), FieldValue::Str(y)) => x.cmp(y),

        // Cross-family numeric comparisons (rare: mixed int/float composite keys).
        (a, b) => as_f64(a)
            .zip(as_f64(b))
            .map(|(x, y)| x.partial_cmp(&y).unwrap_or(Ordering::Equal))
            .unwrap_or(Ordering::Equal),
    }
}

fn as_f64(v: &FieldValue) -> Option<f64> {
    match v {
        FieldValue::Int(x) => Some(*x as f64),
        FieldValue::Uint(x) => Some(*x as f64),
        FieldValue::Float(x) => Some(*x as f64),
        FieldValue::Double(x) => Some(*x),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_ordering() {
        let cmp = LexicographicComparator;
        assert_eq!(
            cmp.compare(&[FieldValue::Int(1)], &[FieldValue::Int(2)]),
            Ordering::Less
        );
        assert_eq!(
            cmp.compare(&[FieldValue::Int(5)], &[FieldValue::Int(5)]),
            Ordering::Equal
        );
    }

    #[test]
    fn test_composite_key_ordering() {
        let cmp = LexicographicComparator;
        let a = [FieldValue::Int(5), FieldValue::Int(1)];
        let b = [FieldValue::Int(5), FieldValue::Int(2)];
        assert_eq!(cmp.compare(&a, &b), Ordering::Less);

        let c = [FieldValue::Int(4), FieldValue::Int(999)];
        assert_eq!(cmp.compare(&c, &a), Ordering::Less);
    }

    #[test]
    fn test_null_sorts_first() {
        let cmp = LexicographicComparator;
        assert_eq!(
            cmp.compare(&[FieldValue::Null], &[FieldValue::Int(0)]),
            Ordering::Less
        );
    }

    #[test]
    fn test_string_ordering() {
        let cmp = LexicographicComparator;
        assert_eq!(
            cmp.compare(
                &[FieldValue::Str("abc".into())],
                &[FieldValue::Str("abd".into())]
            ),
            Ordering::Less
        );
    }

    #[test]
    fn test_prefix_key_shorter_is_less() {
        let cmp = LexicographicComparator;
        let a = [FieldValue::Int(5)];
        let b = [FieldValue::Int(5), FieldValue::Int(1)];
        assert_eq!(cmp.compare(&a, &b), Ordering::Less);
    }
}

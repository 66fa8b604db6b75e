//! Clock valuations, clock constraints, and the Alur-Dill region abstraction (C1).

use std::fmt;

use num_rational::Ratio;

use crate::error::Error;

/// A non-negative rational clock value.
pub type ClockValue = Ratio<i64>;

/// The index of an Alur-Dill region for a given maximal constant `K`.
///
/// Even indices are integer points, odd indices are open fractional
/// intervals, and `2K+1` is the saturated "beyond-K" region.
pub type RegionIndex = u32;

/// A comparison operator used in a clock constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComparisonOp {
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `>=`
    GreaterEq,
    /// `>`
    Greater,
}

impl ComparisonOp {
    /// Evaluate `v op k`.
    pub fn satisfied_by(self, v: ClockValue, k: i64) -> bool {
        let k = ClockValue::from_integer(k);
        match self {
            Self::Less => v < k,
            Self::LessEq => v <= k,
            Self::Eq => v == k,
            Self::NotEq => v != k,
            Self::GreaterEq => v >= k,
            Self::Greater => v > k,
        }
    }

    /// Parse a comparator from its textual spelling, as used by the text format (§6).
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "<" => Ok(Self::Less),
            "<=" => Ok(Self::LessEq),
            "=" | "==" => Ok(Self::Eq),
            "!=" => Ok(Self::NotEq),
            ">=" => Ok(Self::GreaterEq),
            ">" => Ok(Self::Greater),
            other => Err(Error::InvalidClockComparator(other.to_string())),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::GreaterEq => ">=",
            Self::Greater => ">",
        };
        write!(f, "{}", s)
    }
}

/// An atomic clock constraint `(op, k)`, satisfied by a clock value `v` iff `v op k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockConstraint {
    op: ComparisonOp,
    value: i64,
}

impl ClockConstraint {
    /// Construct a new clock constraint. `value` must be non-negative.
    pub fn new(op: ComparisonOp, value: i64) -> Self {
        assert!(value >= 0, "clock constraints only compare to non-negative integers");
        Self { op, value }
    }

    /// Whether this constraint is satisfied by the given clock value.
    pub fn is_satisfied(&self, v: ClockValue) -> bool {
        self.op.satisfied_by(v, self.value)
    }

    /// The comparison operator of this constraint.
    pub fn op(&self) -> ComparisonOp {
        self.op
    }

    /// The integer endpoint of this constraint.
    pub fn value(&self) -> i64 {
        self.value
    }
}

impl fmt::Display for ClockConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.value)
    }
}

/// Compute the Alur-Dill region index of a clock value for a given maximal constant `K`.
pub fn region_index(v: ClockValue, k: u32) -> RegionIndex {
    let k_val = ClockValue::from_integer(k as i64);
    if v > k_val {
        return 2 * k + 1;
    }
    let floor = v.floor().to_integer();
    if v.is_integer() {
        2 * (floor as RegionIndex)
    } else {
        2 * (floor as RegionIndex) + 1
    }
}

/// Whether a region index is the saturated "beyond-K" region.
pub fn is_maxed(index: RegionIndex, k: u32) -> bool {
    index == 2 * k + 1
}

/// Which side(s) of a region's defining interval to emit constraints for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundType {
    /// Only the lower-bound constraint.
    Lower,
    /// Only the upper-bound constraint.
    Upper,
    /// Both bounds (used when lower and upper coincide, i.e. a single time point or an exact
    /// region interval).
    Both,
}

/// Compute the minimal set of clock constraints characterizing the given region index,
/// for a clock whose maximal region index is `max_region_index = 2K+1` (C1, §4.1).
pub fn constraints_from_region(
    index: RegionIndex,
    max_region_index: RegionIndex,
    bound_type: BoundType,
) -> Vec<ClockConstraint> {
    if index == max_region_index {
        return vec![ClockConstraint::new(ComparisonOp::Greater, (max_region_index / 2) as i64)];
    }
    if index % 2 == 0 {
        let n = (index / 2) as i64;
        match bound_type {
            BoundType::Both => vec![ClockConstraint::new(ComparisonOp::Eq, n)],
            BoundType::Lower => vec![ClockConstraint::new(ComparisonOp::GreaterEq, n)],
            BoundType::Upper => vec![ClockConstraint::new(ComparisonOp::LessEq, n)],
        }
    } else {
        let n = (index / 2) as i64;
        match bound_type {
            BoundType::Both => vec![
                ClockConstraint::new(ComparisonOp::Greater, n),
                ClockConstraint::new(ComparisonOp::Less, n + 1),
            ],
            BoundType::Lower => vec![ClockConstraint::new(ComparisonOp::Greater, n)],
            BoundType::Upper => vec![ClockConstraint::new(ComparisonOp::Less, n + 1)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(n: i64, d: i64) -> ClockValue {
        Ratio::new(n, d)
    }

    #[test]
    fn region_mapping_integer() {
        assert_eq!(region_index(v(0, 1), 3), 0);
        assert_eq!(region_index(v(2, 1), 3), 4);
        assert_eq!(region_index(v(3, 1), 3), 6);
    }

    #[test]
    fn region_mapping_fractional() {
        assert_eq!(region_index(v(5, 2), 3), 5); // 2.5 -> 2*2+1
        assert_eq!(region_index(v(1, 2), 3), 1);
    }

    #[test]
    fn region_mapping_saturated() {
        assert_eq!(region_index(v(7, 2), 3), 7); // 3.5 > 3 -> 2*3+1
        assert_eq!(region_index(v(100, 1), 3), 7);
    }

    #[test]
    fn constraints_even_both() {
        let cs = constraints_from_region(4, 7, BoundType::Both);
        assert_eq!(cs, vec![ClockConstraint::new(ComparisonOp::Eq, 2)]);
    }

    #[test]
    fn constraints_odd_both() {
        let cs = constraints_from_region(5, 7, BoundType::Both);
        assert_eq!(
            cs,
            vec![
                ClockConstraint::new(ComparisonOp::Greater, 2),
                ClockConstraint::new(ComparisonOp::Less, 3)
            ]
        );
    }

    #[test]
    fn constraints_saturated() {
        let cs = constraints_from_region(7, 7, BoundType::Both);
        assert_eq!(cs, vec![ClockConstraint::new(ComparisonOp::Greater, 3)]);
    }
}

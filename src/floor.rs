//! # Floor model
//!
//! Floors are indexed by a contiguous range of integers where negative values are
//! basement levels (`B1`, `B2`, ...) and positive values are above-ground levels
//! (`F1`, `F2`, ...). Index `0` does not exist, so stepping up from `B1` lands on `F1`.
//!
//! ## Key types
//! - [`Floor`]: A single valid floor index. Never `0`.
//! - [`FloorRange`]: An inclusive range of floors a car may serve.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FloorError;

/// A floor index. Negative values are below ground, positive above. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Floor(i32);

impl Floor {
    /// Creates a floor from its integer index.
    ///
    /// ## Returns
    /// - `Err(FloorError::Zero)` if `index == 0`
    pub fn new(index: i32) -> Result<Self, FloorError> {
        if index == 0 {
            return Err(FloorError::Zero);
        }
        Ok(Floor(index))
    }

    /// Above-ground floor `F<n>`. Panics for `n == 0`.
    pub const fn above(n: u32) -> Floor {
        assert!(n > 0, "F0 does not exist");
        Floor(n as i32)
    }

    /// Basement floor `B<n>`. Panics for `n == 0`.
    pub const fn basement(n: u32) -> Floor {
        assert!(n > 0, "B0 does not exist");
        Floor(-(n as i32))
    }

    /// Rebuilds a floor from an index previously produced by [`Floor::index`].
    pub(crate) fn from_stored(index: i32) -> Floor {
        debug_assert_ne!(index, 0);
        Floor(index)
    }

    /// Raw integer index of the floor.
    pub fn index(self) -> i32 {
        self.0
    }

    /// The floor directly above, skipping the missing zero.
    pub fn up(self) -> Floor {
        match self.0 {
            -1 => Floor(1),
            i => Floor(i + 1),
        }
    }

    /// The floor directly below, skipping the missing zero.
    pub fn down(self) -> Floor {
        match self.0 {
            1 => Floor(-1),
            i => Floor(i - 1),
        }
    }

    /// Number of floor-to-floor hops between two floors.
    ///
    /// `B1 -> F1` is a single hop.
    pub fn distance(self, other: Floor) -> u32 {
        let raw = self.0.abs_diff(other.0);
        if (self.0 < 0) != (other.0 < 0) {
            raw - 1
        } else {
            raw
        }
    }

    /// Signed hop count from `self` to `other` (positive when `other` is above).
    pub fn offset_to(self, other: Floor) -> i32 {
        let hops = self.distance(other) as i32;
        if other > self { hops } else { -hops }
    }
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "B{}", self.0.unsigned_abs())
        } else {
            write!(f, "F{}", self.0)
        }
    }
}

impl FromStr for Floor {
    type Err = FloorError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let malformed = || FloorError::Malformed(label.to_string());
        let (sign, digits) = match label.split_at_checked(1) {
            Some(("B", rest)) => (-1, rest),
            Some(("F", rest)) => (1, rest),
            _ => return Err(malformed()),
        };
        let n: i32 = digits.parse().map_err(|_| malformed())?;
        if n <= 0 {
            return Err(malformed());
        }
        Floor::new(sign * n)
    }
}

impl TryFrom<String> for Floor {
    type Error = FloorError;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        label.parse()
    }
}

impl From<Floor> for String {
    fn from(floor: Floor) -> Self {
        floor.to_string()
    }
}

/// Inclusive range of floors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorRange {
    /// Lowest reachable floor
    pub min: Floor,
    /// Highest reachable floor
    pub max: Floor,
}

impl FloorRange {
    /// Creates a range. `min` must not be above `max`.
    pub fn new(min: Floor, max: Floor) -> Result<Self, FloorError> {
        if min > max {
            return Err(FloorError::EmptyRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// True if `floor` lies inside the range.
    pub fn contains(&self, floor: Floor) -> bool {
        self.min <= floor && floor <= self.max
    }

    /// Clamps `floor` into the range.
    pub fn clamp(&self, floor: Floor) -> Floor {
        floor.clamp(self.min, self.max)
    }

    /// Iterates over every floor in the range, bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = Floor> {
        let max = self.max;
        std::iter::successors(Some(self.min), move |f| (*f < max).then(|| f.up()))
    }

    /// Number of floors in the range.
    pub fn len(&self) -> usize {
        self.min.distance(self.max) as usize + 1
    }
}

impl fmt::Display for FloorRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn fl(i: i32) -> Floor {
        Floor::new(i).unwrap()
    }

    #[test]
    fn zero_is_rejected() {
        assert_eq!(Floor::new(0), Err(FloorError::Zero));
    }

    #[test]
    fn stepping_skips_zero() {
        assert_eq!(fl(-1).up(), fl(1));
        assert_eq!(fl(1).down(), fl(-1));
        assert_eq!(fl(3).up(), fl(4));
        assert_eq!(fl(-3).down(), fl(-4));
    }

    #[test]
    fn distance_counts_hops_across_ground() {
        assert_eq!(fl(-1).distance(fl(1)), 1);
        assert_eq!(fl(-4).distance(fl(7)), 10);
        assert_eq!(fl(5).distance(fl(2)), 3);
        assert_eq!(fl(2).offset_to(fl(-2)), -3);
    }

    #[test]
    fn labels_round_trip() {
        assert_eq!(fl(-2).to_string(), "B2");
        assert_eq!(fl(7).to_string(), "F7");
        assert_eq!("B4".parse::<Floor>(), Ok(fl(-4)));
        assert_eq!("F1".parse::<Floor>(), Ok(fl(1)));
        assert!("F0".parse::<Floor>().is_err());
        assert!("X3".parse::<Floor>().is_err());
        assert!("".parse::<Floor>().is_err());
    }

    #[test]
    fn range_iterates_without_zero() {
        let range = FloorRange::new(fl(-2), fl(2)).unwrap();
        let floors: Vec<i32> = range.iter().map(Floor::index).collect();
        assert_eq!(floors, vec![-2, -1, 1, 2]);
        assert_eq!(range.len(), 4);
        assert!(range.contains(fl(-1)));
        assert!(!range.contains(fl(3)));
        assert_eq!(range.clamp(fl(5)), fl(2));
    }
}

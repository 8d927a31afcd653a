//! Integer strides relating a tile's pixel grid to the finest grid of the mosaic.

use crate::MosaicError;
use anyhow::Result;
use std::fmt;

/// A pair of strictly positive strides `(x, y)`.
///
/// `(1, 1)` is the finest resolution. A tile with subsampling `(4, 4)` has one pixel for
/// every 4×4 block of the finest grid. Values are stored as `u16`, which is plenty for
/// overview pyramids and keeps [`Tile`](crate::Tile) small.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subsampling {
	pub x: u16,
	pub y: u16,
}

/// Result of [`Subsampling::floor_for`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubsamplingFloor {
	/// The target is finer than this subsampling on at least one axis.
	None,
	/// The target is already a multiple of this subsampling.
	Unchanged,
	/// The largest multiple of this subsampling that does not exceed the target.
	Changed(Subsampling),
}

impl SubsamplingFloor {
	/// The subsampling a caller ends up with, given the `target` that produced this floor.
	pub fn resolve(self, target: Subsampling) -> Option<Subsampling> {
		match self {
			SubsamplingFloor::None => None,
			SubsamplingFloor::Unchanged => Some(target),
			SubsamplingFloor::Changed(s) => Some(s),
		}
	}

	pub fn is_unchanged(self) -> bool {
		self == SubsamplingFloor::Unchanged
	}
}

impl Subsampling {
	/// The finest subsampling.
	pub const ONE: Subsampling = Subsampling { x: 1, y: 1 };

	/// Creates a subsampling, rejecting zero strides.
	pub fn new(x: u16, y: u16) -> Result<Subsampling> {
		if x == 0 || y == 0 {
			return Err(MosaicError::InvalidLayout(format!("subsampling ({x},{y}) must be strictly positive")).into());
		}
		Ok(Subsampling { x, y })
	}

	/// Creates a subsampling from wider integers, rejecting zero and values above `u16::MAX`.
	pub fn from_u32(x: u32, y: u32) -> Result<Subsampling> {
		let narrow = |v: u32| {
			u16::try_from(v)
				.map_err(|_| MosaicError::InvalidLayout(format!("subsampling {v} exceeds {}", u16::MAX)))
		};
		Subsampling::new(narrow(x)?, narrow(y)?)
	}

	/// Same stride on both axes.
	pub fn square(s: u16) -> Result<Subsampling> {
		Subsampling::new(s, s)
	}

	/// `x * y`, the number of finest pixels behind one pixel at this subsampling.
	pub fn area(&self) -> u32 {
		u32::from(self.x) * u32::from(self.y)
	}

	/// `true` if both components are less than or equal to `other`'s.
	pub fn componentwise_le(&self, other: &Subsampling) -> bool {
		self.x <= other.x && self.y <= other.y
	}

	/// `true` if `self` is a multiple of `divisor` on both axes.
	pub fn is_multiple_of(&self, divisor: &Subsampling) -> bool {
		self.x % divisor.x == 0 && self.y % divisor.y == 0
	}

	/// Componentwise maximum.
	pub fn componentwise_max(&self, other: &Subsampling) -> Subsampling {
		Subsampling {
			x: self.x.max(other.x),
			y: self.y.max(other.y),
		}
	}

	/// Componentwise minimum.
	pub fn componentwise_min(&self, other: &Subsampling) -> Subsampling {
		Subsampling {
			x: self.x.min(other.x),
			y: self.y.min(other.y),
		}
	}

	/// Componentwise integer division, used to turn an absolute subsampling into the stride
	/// inside a tile of subsampling `divisor`.
	///
	/// # Panics
	///
	/// Panics if `self` is not a multiple of `divisor`; composing reads from a subsampling
	/// that a tile cannot serve is a logic error.
	pub fn divided_by(&self, divisor: &Subsampling) -> Subsampling {
		assert!(
			self.is_multiple_of(divisor),
			"subsampling {self} is not a multiple of {divisor}"
		);
		Subsampling {
			x: self.x / divisor.x,
			y: self.y / divisor.y,
		}
	}

	/// The coarsest subsampling not above `target` that this subsampling can serve exactly:
	/// `target` rounded down to a multiple of `self` on each axis.
	pub fn floor_for(&self, target: Subsampling) -> SubsamplingFloor {
		let x = (target.x / self.x) * self.x;
		let y = (target.y / self.y) * self.y;
		if x == 0 || y == 0 {
			SubsamplingFloor::None
		} else if x == target.x && y == target.y {
			SubsamplingFloor::Unchanged
		} else {
			SubsamplingFloor::Changed(Subsampling { x, y })
		}
	}
}

impl Default for Subsampling {
	fn default() -> Self {
		Subsampling::ONE
	}
}

impl fmt::Debug for Subsampling {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "({},{})", self.x, self.y)
	}
}

impl fmt::Display for Subsampling {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn s(x: u16, y: u16) -> Subsampling {
		Subsampling::new(x, y).unwrap()
	}

	#[test]
	fn zero_is_rejected_as_invalid_layout() {
		let err = Subsampling::new(0, 3).unwrap_err();
		assert!(matches!(
			err.downcast_ref::<MosaicError>(),
			Some(MosaicError::InvalidLayout(_))
		));
		assert!(Subsampling::from_u32(70_000, 1).is_err());
		assert_eq!(Subsampling::from_u32(3, 5).unwrap(), s(3, 5));
	}

	#[rstest]
	#[case::same(s(2, 2), s(2, 2), SubsamplingFloor::Unchanged)]
	#[case::multiple(s(2, 2), s(6, 4), SubsamplingFloor::Unchanged)]
	#[case::finest_serves_all(s(1, 1), s(7, 3), SubsamplingFloor::Unchanged)]
	#[case::rounded_down(s(2, 2), s(3, 5), SubsamplingFloor::Changed(s(2, 4)))]
	#[case::one_axis(s(4, 1), s(9, 3), SubsamplingFloor::Changed(s(8, 3)))]
	#[case::too_coarse(s(4, 4), s(2, 8), SubsamplingFloor::None)]
	#[case::too_coarse_y(s(1, 3), s(5, 2), SubsamplingFloor::None)]
	fn floor_cases(#[case] own: Subsampling, #[case] target: Subsampling, #[case] expected: SubsamplingFloor) {
		let floor = own.floor_for(target);
		assert_eq!(floor, expected);
		if let Some(resolved) = floor.resolve(target) {
			assert!(resolved.is_multiple_of(&own));
			assert!(resolved.componentwise_le(&target));
		}
	}

	#[test]
	fn componentwise_helpers() {
		assert_eq!(s(2, 8).componentwise_max(&s(4, 1)), s(4, 8));
		assert_eq!(s(2, 8).componentwise_min(&s(4, 1)), s(2, 1));
		assert_eq!(s(6, 4).divided_by(&s(2, 2)), s(3, 2));
		assert!(s(1, 2).componentwise_le(&s(1, 3)));
		assert!(!s(2, 2).componentwise_le(&s(3, 1)));
		assert_eq!(s(3, 4).area(), 12);
	}

	#[test]
	#[should_panic(expected = "is not a multiple")]
	fn divided_by_panics_on_misaligned_input() {
		let _ = s(3, 3).divided_by(&s(2, 2));
	}
}

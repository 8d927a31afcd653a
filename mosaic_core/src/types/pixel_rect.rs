//! This module defines [`PixelRect`], an axis-aligned rectangle of pixels.
//!
//! Rectangles are half-open: a rectangle covers the columns `x..x + width` and the rows
//! `y..y + height`. Coordinates may be negative (a mosaic grid does not have to start at the
//! origin), sizes never are. A rectangle with a zero width or height is empty.

use super::Subsampling;
use anyhow::{Result, ensure};
use std::fmt;

/// An axis-aligned, half-open rectangle on a pixel grid.
///
/// The fields are public for cheap reads; code that builds rectangles from untrusted
/// values should go through [`PixelRect::new`], which rejects negative sizes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PixelRect {
	/// Minimum column (inclusive).
	pub x: i64,
	/// Minimum row (inclusive).
	pub y: i64,
	/// Number of columns, never negative.
	pub width: i64,
	/// Number of rows, never negative.
	pub height: i64,
}

impl PixelRect {
	// -------------------------------------------------------------------------
	// Constructors
	// -------------------------------------------------------------------------

	/// Creates a rectangle from its origin and size.
	///
	/// # Errors
	///
	/// Fails if `width` or `height` is negative.
	pub fn new(x: i64, y: i64, width: i64, height: i64) -> Result<PixelRect> {
		ensure!(width >= 0, "width ({width}) must be >= 0");
		ensure!(height >= 0, "height ({height}) must be >= 0");
		Ok(PixelRect { x, y, width, height })
	}

	/// Creates a rectangle from its minimum corner (inclusive) and maximum corner (exclusive).
	///
	/// Inverted corners produce an empty rectangle anchored at the minimum corner.
	pub fn from_corners(x_min: i64, y_min: i64, x_max: i64, y_max: i64) -> PixelRect {
		PixelRect {
			x: x_min,
			y: y_min,
			width: (x_max - x_min).max(0),
			height: (y_max - y_min).max(0),
		}
	}

	/// Creates a rectangle with its origin at `(0, 0)`.
	pub fn from_size(width: u32, height: u32) -> PixelRect {
		PixelRect {
			x: 0,
			y: 0,
			width: i64::from(width),
			height: i64::from(height),
		}
	}

	/// An empty rectangle at the origin.
	pub fn empty() -> PixelRect {
		PixelRect::default()
	}

	// -------------------------------------------------------------------------
	// Basic queries
	// -------------------------------------------------------------------------

	/// Exclusive maximum column.
	pub fn max_x(&self) -> i64 {
		self.x + self.width
	}

	/// Exclusive maximum row.
	pub fn max_y(&self) -> i64 {
		self.y + self.height
	}

	/// `true` if the rectangle covers no pixel.
	pub fn is_empty(&self) -> bool {
		self.width <= 0 || self.height <= 0
	}

	/// Number of pixels covered.
	pub fn area(&self) -> i64 {
		if self.is_empty() { 0 } else { self.width * self.height }
	}

	/// Width and height as `u32`, saturating at `u32::MAX`.
	pub fn size_u32(&self) -> (u32, u32) {
		let clamp = |v: i64| v.clamp(0, i64::from(u32::MAX)) as u32;
		(clamp(self.width), clamp(self.height))
	}

	// -------------------------------------------------------------------------
	// Relations
	// -------------------------------------------------------------------------

	/// `true` if both rectangles share at least one pixel.
	pub fn intersects(&self, other: &PixelRect) -> bool {
		!self.is_empty()
			&& !other.is_empty()
			&& self.x < other.max_x()
			&& other.x < self.max_x()
			&& self.y < other.max_y()
			&& other.y < self.max_y()
	}

	/// `true` if every pixel of `other` is inside `self`.
	///
	/// An empty `other` is contained in everything.
	pub fn contains_rect(&self, other: &PixelRect) -> bool {
		if other.is_empty() {
			return true;
		}
		!self.is_empty()
			&& other.x >= self.x
			&& other.y >= self.y
			&& other.max_x() <= self.max_x()
			&& other.max_y() <= self.max_y()
	}

	// -------------------------------------------------------------------------
	// Combinations
	// -------------------------------------------------------------------------

	/// The pixels covered by both rectangles; empty if they do not intersect.
	pub fn intersection(&self, other: &PixelRect) -> PixelRect {
		PixelRect::from_corners(
			self.x.max(other.x),
			self.y.max(other.y),
			self.max_x().min(other.max_x()),
			self.max_y().min(other.max_y()),
		)
	}

	/// The smallest rectangle covering both rectangles. Empty rectangles are ignored.
	pub fn union(&self, other: &PixelRect) -> PixelRect {
		if self.is_empty() {
			return *other;
		}
		if other.is_empty() {
			return *self;
		}
		PixelRect::from_corners(
			self.x.min(other.x),
			self.y.min(other.y),
			self.max_x().max(other.max_x()),
			self.max_y().max(other.max_y()),
		)
	}

	/// Multiplies origin and size by the subsampling, turning a rectangle in a subsampled
	/// grid into the same rectangle in the finest grid.
	pub fn scaled(&self, subsampling: Subsampling) -> PixelRect {
		let sx = i64::from(subsampling.x);
		let sy = i64::from(subsampling.y);
		PixelRect {
			x: self.x * sx,
			y: self.y * sy,
			width: self.width * sx,
			height: self.height * sy,
		}
	}

	/// Returns the parts of `self` not covered by `other`, as at most four disjoint rectangles.
	///
	/// The pieces are a top band, a bottom band, and the left and right remainders of the
	/// middle band.
	pub fn subtract(&self, other: &PixelRect) -> Vec<PixelRect> {
		if self.is_empty() {
			return Vec::new();
		}
		if !self.intersects(other) {
			return vec![*self];
		}
		let cut = self.intersection(other);
		let pieces = [
			PixelRect::from_corners(self.x, self.y, self.max_x(), cut.y),
			PixelRect::from_corners(self.x, cut.max_y(), self.max_x(), self.max_y()),
			PixelRect::from_corners(self.x, cut.y, cut.x, cut.max_y()),
			PixelRect::from_corners(cut.max_x(), cut.y, self.max_x(), cut.max_y()),
		];
		pieces.into_iter().filter(|r| !r.is_empty()).collect()
	}

	/// `true` if the union of `covers` contains every pixel of `self`.
	pub fn is_covered_by<'a, I>(&self, covers: I) -> bool
	where
		I: IntoIterator<Item = &'a PixelRect>,
	{
		let mut remaining = vec![*self];
		for cover in covers {
			remaining = remaining.iter().flat_map(|r| r.subtract(cover)).collect();
			if remaining.is_empty() {
				return true;
			}
		}
		remaining.iter().all(PixelRect::is_empty)
	}
}

impl fmt::Debug for PixelRect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{},{},{},{}]", self.x, self.y, self.width, self.height)
	}
}

impl fmt::Display for PixelRect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

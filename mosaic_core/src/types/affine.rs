//! Two-dimensional affine transforms mapping grid coordinates to world coordinates.

use std::fmt;

/// An affine transform `(x, y) → (scale_x·x + shear_x·y + translate_x, shear_y·x + scale_y·y + translate_y)`.
///
/// The field order follows the usual `[m00, m10, m01, m11, m02, m12]` matrix layout.
#[derive(Clone, Copy, PartialEq)]
pub struct AffineTransform {
	pub scale_x: f64,
	pub shear_y: f64,
	pub shear_x: f64,
	pub scale_y: f64,
	pub translate_x: f64,
	pub translate_y: f64,
}

impl AffineTransform {
	pub const IDENTITY: AffineTransform = AffineTransform {
		scale_x: 1.0,
		shear_y: 0.0,
		shear_x: 0.0,
		scale_y: 1.0,
		translate_x: 0.0,
		translate_y: 0.0,
	};

	pub fn new(scale_x: f64, shear_y: f64, shear_x: f64, scale_y: f64, translate_x: f64, translate_y: f64) -> Self {
		AffineTransform {
			scale_x,
			shear_y,
			shear_x,
			scale_y,
			translate_x,
			translate_y,
		}
	}

	/// A pure scale followed by a translation, the common case for north-up rasters.
	pub fn scale_translate(scale_x: f64, scale_y: f64, translate_x: f64, translate_y: f64) -> Self {
		AffineTransform::new(scale_x, 0.0, 0.0, scale_y, translate_x, translate_y)
	}

	/// `true` if the transform has no shear or rotation terms.
	pub fn is_axis_aligned(&self) -> bool {
		self.shear_x == 0.0 && self.shear_y == 0.0
	}

	/// Applies the transform to a point.
	pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
		(
			self.scale_x * x + self.shear_x * y + self.translate_x,
			self.shear_y * x + self.scale_y * y + self.translate_y,
		)
	}

	/// Returns `self ∘ other`: the transform that applies `other` first, then `self`.
	pub fn concatenate(&self, other: &AffineTransform) -> AffineTransform {
		AffineTransform {
			scale_x: self.scale_x * other.scale_x + self.shear_x * other.shear_y,
			shear_y: self.shear_y * other.scale_x + self.scale_y * other.shear_y,
			shear_x: self.scale_x * other.shear_x + self.shear_x * other.scale_y,
			scale_y: self.shear_y * other.shear_x + self.scale_y * other.scale_y,
			translate_x: self.scale_x * other.translate_x + self.shear_x * other.translate_y + self.translate_x,
			translate_y: self.shear_y * other.translate_x + self.scale_y * other.translate_y + self.translate_y,
		}
	}

	/// The transform of a grid whose pixels are `sx × sy` pixels of this one.
	pub fn subsampled(&self, sx: f64, sy: f64) -> AffineTransform {
		self.concatenate(&AffineTransform::scale_translate(sx, sy, 0.0, 0.0))
	}
}

impl Default for AffineTransform {
	fn default() -> Self {
		AffineTransform::IDENTITY
	}
}

impl fmt::Debug for AffineTransform {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Affine[{}, {}, {}, {}, {}, {}]",
			self.scale_x, self.shear_y, self.shear_x, self.scale_y, self.translate_x, self.translate_y
		)
	}
}

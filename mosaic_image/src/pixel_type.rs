//! Pixel layouts a [`PixelBuffer`](crate::PixelBuffer) can have.

use anyhow::{Result, bail};
use image::{ColorType, DynamicImage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel layout and sample type of a pixel buffer.
///
/// Each variant maps to exactly one [`DynamicImage`] variant, so two buffers with the same
/// `PixelType` can be copied into each other without conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelType {
	L8,
	La8,
	Rgb8,
	Rgba8,
	L16,
	La16,
	Rgb16,
	Rgba16,
	#[serde(rename = "rgb32f")]
	Rgb32F,
	#[serde(rename = "rgba32f")]
	Rgba32F,
}

impl PixelType {
	pub const ALL: [PixelType; 10] = [
		PixelType::L8,
		PixelType::La8,
		PixelType::Rgb8,
		PixelType::Rgba8,
		PixelType::L16,
		PixelType::La16,
		PixelType::Rgb16,
		PixelType::Rgba16,
		PixelType::Rgb32F,
		PixelType::Rgba32F,
	];

	/// Returns the pixel type of an existing buffer.
	pub fn of(image: &DynamicImage) -> Result<PixelType> {
		PixelType::try_from(image.color())
	}

	pub fn color_type(self) -> ColorType {
		match self {
			PixelType::L8 => ColorType::L8,
			PixelType::La8 => ColorType::La8,
			PixelType::Rgb8 => ColorType::Rgb8,
			PixelType::Rgba8 => ColorType::Rgba8,
			PixelType::L16 => ColorType::L16,
			PixelType::La16 => ColorType::La16,
			PixelType::Rgb16 => ColorType::Rgb16,
			PixelType::Rgba16 => ColorType::Rgba16,
			PixelType::Rgb32F => ColorType::Rgb32F,
			PixelType::Rgba32F => ColorType::Rgba32F,
		}
	}

	pub fn has_alpha(self) -> bool {
		self.color_type().has_alpha()
	}

	pub fn has_color(self) -> bool {
		self.color_type().has_color()
	}

	pub fn channel_count(self) -> u8 {
		self.color_type().channel_count()
	}

	/// Bits of a single channel value: 8, 16 or 32.
	pub fn bits_per_value(self) -> u16 {
		self.color_type().bits_per_pixel() / u16::from(self.channel_count())
	}

	/// The smallest pixel type able to hold every channel of `self` and `other`.
	///
	/// Color wins over grey, alpha is kept if either side has it, and the deeper sample type
	/// wins. Grey float buffers do not exist, so any float input yields an RGB float type.
	pub fn widened(self, other: PixelType) -> PixelType {
		use PixelType::*;
		let color = self.has_color() || other.has_color();
		let alpha = self.has_alpha() || other.has_alpha();
		match (self.bits_per_value().max(other.bits_per_value()), color, alpha) {
			(32, _, false) => Rgb32F,
			(32, _, true) => Rgba32F,
			(16, false, false) => L16,
			(16, false, true) => La16,
			(16, true, false) => Rgb16,
			(16, true, true) => Rgba16,
			(_, false, false) => L8,
			(_, false, true) => La8,
			(_, true, false) => Rgb8,
			(_, true, true) => Rgba8,
		}
	}

	/// Types this one converts to without losing channels or depth, `self` first.
	pub fn lossless_targets(self) -> Vec<PixelType> {
		let mut targets = vec![self];
		targets.extend(
			PixelType::ALL
				.into_iter()
				.filter(|&other| other != self && self.widened(other) == other),
		);
		targets
	}
}

impl TryFrom<ColorType> for PixelType {
	type Error = anyhow::Error;

	fn try_from(color: ColorType) -> Result<Self> {
		Ok(match color {
			ColorType::L8 => PixelType::L8,
			ColorType::La8 => PixelType::La8,
			ColorType::Rgb8 => PixelType::Rgb8,
			ColorType::Rgba8 => PixelType::Rgba8,
			ColorType::L16 => PixelType::L16,
			ColorType::La16 => PixelType::La16,
			ColorType::Rgb16 => PixelType::Rgb16,
			ColorType::Rgba16 => PixelType::Rgba16,
			ColorType::Rgb32F => PixelType::Rgb32F,
			ColorType::Rgba32F => PixelType::Rgba32F,
			other => bail!("unsupported color type {other:?}"),
		})
	}
}

impl fmt::Display for PixelType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

/// The common pixel type of a set of tiles, or `None` for an empty set.
pub fn common_pixel_type<I>(types: I) -> Option<PixelType>
where
	I: IntoIterator<Item = PixelType>,
{
	types.into_iter().reduce(PixelType::widened)
}

//! Buffer operations the mosaic reader composes results with.
//!
//! All operations work on the native sample type of the buffer. Copies between buffers
//! require identical pixel types; conversions are explicit through
//! [`converted_to`](PixelBufferTraitOperation::converted_to).

use super::info::PixelBufferTraitInfo;
use crate::PixelType;
use anyhow::{Result, bail, ensure};
use image::{DynamicImage, ImageBuffer, Pixel, imageops::replace};
use mosaic_core::PixelRect;
use mosaic_derive::context;

pub trait PixelBufferTraitOperation: PixelBufferTraitInfo + Sized {
	/// Allocates a zero-filled buffer.
	fn new_blank(width: u32, height: u32, pixel_type: PixelType) -> Self;

	/// Returns a copy converted to `pixel_type`. Missing alpha becomes opaque, missing color
	/// channels are derived from luminance, sample depth is rescaled.
	fn converted_to(&self, pixel_type: PixelType) -> Self;

	/// Like [`converted_to`](Self::converted_to), but returns `self` untouched when it already
	/// has the requested type.
	fn into_pixel_type(self, pixel_type: PixelType) -> Result<Self>;

	/// Copies `source` into `self` with its top-left corner at `(x, y)`. Pixels falling
	/// outside `self` are dropped.
	///
	/// Both buffers must have the same pixel type.
	fn blit(&mut self, source: &Self, x: i64, y: i64) -> Result<()>;

	/// Picks every `stride_x`-th column and `stride_y`-th row of `region`, starting at its
	/// top-left pixel. The result is `ceil(width / stride_x)` × `ceil(height / stride_y)`.
	///
	/// `region` must lie inside the buffer.
	fn sample(&self, region: PixelRect, stride_x: u32, stride_y: u32) -> Result<Self>;
}

/// Applies `$body` to the typed buffer inside a `DynamicImage` and wraps the result again.
macro_rules! map_buffer {
	($image:expr, $buffer:ident => $body:expr) => {
		match $image {
			DynamicImage::ImageLuma8($buffer) => DynamicImage::from($body),
			DynamicImage::ImageLumaA8($buffer) => DynamicImage::from($body),
			DynamicImage::ImageRgb8($buffer) => DynamicImage::from($body),
			DynamicImage::ImageRgba8($buffer) => DynamicImage::from($body),
			DynamicImage::ImageLuma16($buffer) => DynamicImage::from($body),
			DynamicImage::ImageLumaA16($buffer) => DynamicImage::from($body),
			DynamicImage::ImageRgb16($buffer) => DynamicImage::from($body),
			DynamicImage::ImageRgba16($buffer) => DynamicImage::from($body),
			DynamicImage::ImageRgb32F($buffer) => DynamicImage::from($body),
			DynamicImage::ImageRgba32F($buffer) => DynamicImage::from($body),
			other => bail!("unsupported color type {:?}", other.color()),
		}
	};
}

fn sample_buffer<P: Pixel>(
	source: &ImageBuffer<P, Vec<P::Subpixel>>,
	region: (u32, u32, u32, u32),
	stride: (u32, u32),
) -> ImageBuffer<P, Vec<P::Subpixel>> {
	let (x0, y0, width, height) = region;
	let (sx, sy) = stride;
	ImageBuffer::from_fn(width.div_ceil(sx), height.div_ceil(sy), |i, j| {
		*source.get_pixel(x0 + i * sx, y0 + j * sy)
	})
}

impl PixelBufferTraitOperation for DynamicImage {
	fn new_blank(width: u32, height: u32, pixel_type: PixelType) -> DynamicImage {
		DynamicImage::new(width, height, pixel_type.color_type())
	}

	fn converted_to(&self, pixel_type: PixelType) -> DynamicImage {
		match pixel_type {
			PixelType::L8 => DynamicImage::from(self.to_luma8()),
			PixelType::La8 => DynamicImage::from(self.to_luma_alpha8()),
			PixelType::Rgb8 => DynamicImage::from(self.to_rgb8()),
			PixelType::Rgba8 => DynamicImage::from(self.to_rgba8()),
			PixelType::L16 => DynamicImage::from(self.to_luma16()),
			PixelType::La16 => DynamicImage::from(self.to_luma_alpha16()),
			PixelType::Rgb16 => DynamicImage::from(self.to_rgb16()),
			PixelType::Rgba16 => DynamicImage::from(self.to_rgba16()),
			PixelType::Rgb32F => DynamicImage::from(self.to_rgb32f()),
			PixelType::Rgba32F => DynamicImage::from(self.to_rgba32f()),
		}
	}

	fn into_pixel_type(self, pixel_type: PixelType) -> Result<DynamicImage> {
		Ok(if self.pixel_type()? == pixel_type {
			self
		} else {
			self.converted_to(pixel_type)
		})
	}

	#[context("blitting {}x{} {:?} buffer at ({},{}) into {}x{} {:?} buffer", source.width(), source.height(), source.color(), x, y, self.width(), self.height(), self.color())]
	fn blit(&mut self, source: &DynamicImage, x: i64, y: i64) -> Result<()> {
		use DynamicImage::*;
		self.ensure_pixel_type(source.pixel_type()?)?;
		match (&mut *self, source) {
			(ImageLuma8(dst), ImageLuma8(src)) => replace(dst, src, x, y),
			(ImageLumaA8(dst), ImageLumaA8(src)) => replace(dst, src, x, y),
			(ImageRgb8(dst), ImageRgb8(src)) => replace(dst, src, x, y),
			(ImageRgba8(dst), ImageRgba8(src)) => replace(dst, src, x, y),
			(ImageLuma16(dst), ImageLuma16(src)) => replace(dst, src, x, y),
			(ImageLumaA16(dst), ImageLumaA16(src)) => replace(dst, src, x, y),
			(ImageRgb16(dst), ImageRgb16(src)) => replace(dst, src, x, y),
			(ImageRgba16(dst), ImageRgba16(src)) => replace(dst, src, x, y),
			(ImageRgb32F(dst), ImageRgb32F(src)) => replace(dst, src, x, y),
			(ImageRgba32F(dst), ImageRgba32F(src)) => replace(dst, src, x, y),
			_ => bail!("unsupported color type {:?}", source.color()),
		}
		Ok(())
	}

	#[context("sampling {} with stride ({},{}) from {}x{} buffer", region, stride_x, stride_y, self.width(), self.height())]
	fn sample(&self, region: PixelRect, stride_x: u32, stride_y: u32) -> Result<DynamicImage> {
		ensure!(stride_x > 0 && stride_y > 0, "stride must be strictly positive");
		ensure!(
			PixelRect::from_size(self.width(), self.height()).contains_rect(&region),
			"region lies outside the buffer"
		);
		let (width, height) = region.size_u32();
		if stride_x == 1 && stride_y == 1 && width == self.width() && height == self.height() {
			return Ok(self.clone());
		}
		let area = (region.x as u32, region.y as u32, width, height);
		let stride = (stride_x, stride_y);
		Ok(map_buffer!(self, buffer => sample_buffer(buffer, area, stride)))
	}
}

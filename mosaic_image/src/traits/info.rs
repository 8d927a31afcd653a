use crate::PixelType;
use anyhow::{Result, ensure};
use image::DynamicImage;

/// Read-only helpers on pixel buffers.
pub trait PixelBufferTraitInfo {
	/// The pixel type of the buffer. Fails for color types the mosaic does not handle.
	fn pixel_type(&self) -> Result<PixelType>;

	/// Ensures the buffer has the given pixel type.
	fn ensure_pixel_type(&self, expected: PixelType) -> Result<()>;
}

impl PixelBufferTraitInfo for DynamicImage {
	fn pixel_type(&self) -> Result<PixelType> {
		PixelType::of(self)
	}

	fn ensure_pixel_type(&self, expected: PixelType) -> Result<()> {
		let actual = self.pixel_type()?;
		ensure!(
			actual == expected,
			"pixel type mismatch: buffer is {actual}, expected {expected}"
		);
		Ok(())
	}
}

//! Reading and writing image files through the `image` crate.

use crate::PixelType;
use anyhow::Result;
use image::{DynamicImage, ImageDecoder, ImageReader};
use mosaic_derive::context;
use std::path::Path;

/// Reads width, height and pixel type from the file header without decoding pixels.
#[context("Failed to probe image file {:?}", path)]
pub fn probe_image(path: &Path) -> Result<(u32, u32, PixelType)> {
	let decoder = ImageReader::open(path)?.with_guessed_format()?.into_decoder()?;
	let (width, height) = decoder.dimensions();
	Ok((width, height, PixelType::try_from(decoder.color_type())?))
}

/// Decodes a whole image file.
#[context("Failed to decode image file {:?}", path)]
pub fn load_image(path: &Path) -> Result<DynamicImage> {
	Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
}

/// Encodes an image, choosing the format from the file extension.
#[context("Failed to write image file {:?}", path)]
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
	image.save(path)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::PixelBufferTraitTest;
	use pretty_assertions::assert_eq;

	#[test]
	fn png_round_trip() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("tile.png");
		let image = DynamicImage::new_test_rgb(12, 7, 3);
		save_image(&image, &path).unwrap();
		assert_eq!(probe_image(&path).unwrap(), (12, 7, PixelType::Rgb8));
		assert_eq!(load_image(&path).unwrap(), image);
	}

	#[test]
	fn missing_file_names_path() {
		let err = load_image(Path::new("/nonexistent/tile.png")).unwrap_err();
		assert_eq!(err.to_string(), "Failed to decode image file \"/nonexistent/tile.png\"");
	}
}

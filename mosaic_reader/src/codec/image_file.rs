use super::{CodecHandle, CodecProvider, CodecRead};
use anyhow::{Context, Result, ensure};
use log::trace;
use mosaic_core::TileInput;
use mosaic_image::{PixelBuffer, PixelBufferTraitOperation, PixelType, load_image, probe_image};
use std::path::PathBuf;

/// Reads PNG, JPEG and TIFF files through the `image` crate.
///
/// Opening a handle only reads the file header. The pixels are decoded on the first read
/// and kept for the lifetime of the handle.
#[derive(Debug, Default)]
pub struct ImageFileProvider;

impl ImageFileProvider {
	pub const ID: &'static str = "image";
}

impl CodecProvider for ImageFileProvider {
	fn id(&self) -> &str {
		Self::ID
	}

	fn open(&self, input: &TileInput) -> Result<Box<dyn CodecHandle>> {
		let path = input
			.as_path()
			.with_context(|| format!("the image provider reads local files only, not {input}"))?;
		let (width, height, pixel_type) = probe_image(path)?;
		trace!("opened {path:?}: {width}x{height} {pixel_type}");
		Ok(Box::new(ImageFileHandle {
			path: path.to_path_buf(),
			size: (width, height),
			pixel_type,
			image: None,
		}))
	}
}

struct ImageFileHandle {
	path: PathBuf,
	size: (u32, u32),
	pixel_type: PixelType,
	image: Option<PixelBuffer>,
}

impl ImageFileHandle {
	fn check_index(&self, index: u32) -> Result<()> {
		ensure!(index == 0, "{:?} holds a single image, index {index} does not exist", self.path);
		Ok(())
	}

	fn decoded(&mut self) -> Result<&PixelBuffer> {
		let image = match self.image.take() {
			Some(image) => image,
			None => {
				trace!("decoding {:?}", self.path);
				load_image(&self.path)?
			}
		};
		Ok(self.image.insert(image))
	}
}

impl CodecHandle for ImageFileHandle {
	fn image_size(&mut self, index: u32) -> Result<(u32, u32)> {
		self.check_index(index)?;
		Ok(self.size)
	}

	fn pixel_type(&mut self, index: u32) -> Result<PixelType> {
		self.check_index(index)?;
		Ok(self.pixel_type)
	}

	fn supported_pixel_types(&mut self, index: u32) -> Result<Vec<PixelType>> {
		Ok(self.pixel_type(index)?.lossless_targets())
	}

	fn read(
		&mut self,
		index: u32,
		request: &CodecRead,
		_destination: Option<&mut PixelBuffer>,
	) -> Result<Option<PixelBuffer>> {
		self.check_index(index)?;
		let stride = request.stride;
		let block = self
			.decoded()?
			.sample(request.source_region, u32::from(stride.x), u32::from(stride.y))?;
		Ok(Some(block))
	}
}

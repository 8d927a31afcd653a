use super::{AbortFlag, CodecAbort, CodecHandle, CodecProvider, CodecRead};
use anyhow::{Context, Result, bail, ensure};
use mosaic_core::{MosaicError, TileInput};
use mosaic_image::{PixelBuffer, PixelBufferTraitInfo, PixelBufferTraitOperation, PixelType};
use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};

/// Serves decoded buffers registered under a name, for [`TileInput::Named`] inputs.
#[derive(Debug, Default)]
pub struct MemoryProvider {
	images: RwLock<BTreeMap<String, Arc<PixelBuffer>>>,
}

impl MemoryProvider {
	pub const ID: &'static str = "memory";

	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `image` as `name`, replacing an earlier image of that name. Handles already
	/// open keep the old image.
	pub fn insert(&self, name: &str, image: PixelBuffer) {
		self.images.write().insert(name.to_string(), Arc::new(image));
	}

	pub fn remove(&self, name: &str) -> bool {
		self.images.write().remove(name).is_some()
	}

	pub fn len(&self) -> usize {
		self.images.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.images.read().is_empty()
	}
}

impl CodecProvider for MemoryProvider {
	fn id(&self) -> &str {
		Self::ID
	}

	fn open(&self, input: &TileInput) -> Result<Box<dyn CodecHandle>> {
		let TileInput::Named(name) = input else {
			bail!("the memory provider serves named inputs only, not {input}");
		};
		let image = self
			.images
			.read()
			.get(name)
			.cloned()
			.with_context(|| format!("no image registered as '{name}'"))?;
		Ok(Box::new(MemoryHandle {
			name: name.clone(),
			image,
			abort: Arc::new(AbortFlag::default()),
		}))
	}
}

struct MemoryHandle {
	name: String,
	image: Arc<PixelBuffer>,
	abort: Arc<AbortFlag>,
}

impl MemoryHandle {
	fn check_index(&self, index: u32) -> Result<()> {
		ensure!(index == 0, "image '{}' has no index {index}", self.name);
		Ok(())
	}
}

impl CodecHandle for MemoryHandle {
	fn image_size(&mut self, index: u32) -> Result<(u32, u32)> {
		self.check_index(index)?;
		Ok((self.image.width(), self.image.height()))
	}

	fn pixel_type(&mut self, index: u32) -> Result<PixelType> {
		self.check_index(index)?;
		self.image.pixel_type()
	}

	fn supported_pixel_types(&mut self, index: u32) -> Result<Vec<PixelType>> {
		Ok(self.pixel_type(index)?.lossless_targets())
	}

	fn accepts_destination(&self) -> bool {
		true
	}

	fn read(
		&mut self,
		index: u32,
		request: &CodecRead,
		destination: Option<&mut PixelBuffer>,
	) -> Result<Option<PixelBuffer>> {
		self.check_index(index)?;
		if self.abort.is_raised() {
			self.abort.reset();
			return Err(MosaicError::Aborted.into());
		}
		let stride = request.stride;
		let block = self
			.image
			.sample(request.source_region, u32::from(stride.x), u32::from(stride.y))?;
		match destination {
			Some(destination) => {
				let block = block.into_pixel_type(destination.pixel_type()?)?;
				let (x, y) = request.destination_offset;
				destination.blit(&block, i64::from(x), i64::from(y))?;
				Ok(None)
			}
			None => Ok(Some(block)),
		}
	}

	fn abort_signal(&self) -> Option<Arc<dyn CodecAbort>> {
		Some(self.abort.clone())
	}
}

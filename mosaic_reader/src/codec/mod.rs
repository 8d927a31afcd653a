//! Contracts between the reader and the codecs that decode tile inputs.
//!
//! A [`CodecProvider`] is registered once per format under a string id and opens
//! [`CodecHandle`]s for individual inputs. Handles are stateful, used by one reader at a
//! time and pooled between reads; closing a handle is dropping it.

mod image_file;
mod memory;

pub use image_file::ImageFileProvider;
pub use memory::MemoryProvider;

use anyhow::Result;
use mosaic_core::{PixelRect, Subsampling, TileInput};
use mosaic_image::{PixelBuffer, PixelType};
use std::{
	fmt::Debug,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};

pub trait CodecProvider: Debug + Send + Sync {
	/// The id tiles and descriptors refer to this provider by.
	fn id(&self) -> &str;

	fn open(&self, input: &TileInput) -> Result<Box<dyn CodecHandle>>;
}

/// One sub-region read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecRead {
	/// Region in the image's own pixels.
	pub source_region: PixelRect,
	/// Every `stride`-th column and row of `source_region` is read, starting with the first.
	pub stride: Subsampling,
	/// Where the first read pixel lands in the destination buffer.
	pub destination_offset: (u32, u32),
}

impl CodecRead {
	/// Size of the pixel block the read produces.
	pub fn output_size(&self) -> (u32, u32) {
		let (width, height) = self.source_region.size_u32();
		(
			width.div_ceil(u32::from(self.stride.x)),
			height.div_ceil(u32::from(self.stride.y)),
		)
	}
}

pub trait CodecHandle: Send {
	fn image_size(&mut self, index: u32) -> Result<(u32, u32)>;

	/// The type the image decodes to without conversion.
	fn pixel_type(&mut self, index: u32) -> Result<PixelType>;

	/// Types the codec can deliver, natural type first.
	fn supported_pixel_types(&mut self, index: u32) -> Result<Vec<PixelType>>;

	/// `true` if [`read`](Self::read) can write into a caller's buffer.
	fn accepts_destination(&self) -> bool {
		false
	}

	/// Reads `request`. With a destination (only passed when
	/// [`accepts_destination`](Self::accepts_destination) is `true`) the pixels are converted
	/// to the destination's type, written at `request.destination_offset` and `None` is
	/// returned. Otherwise the pixels are returned in the image's natural type.
	fn read(
		&mut self,
		index: u32,
		request: &CodecRead,
		destination: Option<&mut PixelBuffer>,
	) -> Result<Option<PixelBuffer>>;

	/// A signal another thread can raise to stop a running read of this handle.
	fn abort_signal(&self) -> Option<Arc<dyn CodecAbort>> {
		None
	}
}

pub trait CodecAbort: Send + Sync {
	fn abort(&self);

	/// Clears an abort that arrived after the read it was meant for. Called before every read.
	fn reset(&self) {}
}

/// A [`CodecAbort`] backed by an atomic flag, for codecs that poll between steps.
#[derive(Debug, Default)]
pub struct AbortFlag(AtomicBool);

impl AbortFlag {
	pub fn is_raised(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}
}

impl CodecAbort for AbortFlag {
	fn abort(&self) {
		self.0.store(true, Ordering::Release);
	}

	fn reset(&self) {
		self.0.store(false, Ordering::Release);
	}
}

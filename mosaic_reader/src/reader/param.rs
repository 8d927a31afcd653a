use mosaic_core::{PixelRect, Subsampling};
use mosaic_image::{PixelBuffer, PixelType};
use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

/// Cancels a running read at the next tile boundary. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::Release);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}
}

/// Where a read currently is. Every read starts at `ResolvingParams` and ends in one of
/// `Done`, `Aborted` or `Failed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadState {
	#[default]
	Idle,
	ResolvingParams,
	QueryingTiles,
	Delegating,
	Compositing,
	Done,
	Aborted,
	Failed,
}

impl ReadState {
	pub fn is_final(self) -> bool {
		matches!(self, ReadState::Done | ReadState::Aborted | ReadState::Failed)
	}
}

/// A read request. The reader writes the effective subsampling back into it.
#[derive(Debug, Default)]
pub struct ReadParam {
	/// Region in finest mosaic pixels, the whole mosaic if `None`.
	pub source_region: Option<PixelRect>,
	pub subsampling: Subsampling,
	/// Whether the subsampling may be lowered when it cannot be served. Falls back to the
	/// reader's configuration.
	pub subsampling_change_allowed: Option<bool>,
	/// Return no image instead of a blank one when no tile intersects the region.
	pub null_for_empty: bool,
	/// A buffer to compose into. It must have the size of the result.
	pub destination: Option<PixelBuffer>,
	/// Pixel type of the result, overriding the reader's policy.
	pub destination_type: Option<PixelType>,
}

impl ReadParam {
	pub fn new(region: PixelRect, subsampling: Subsampling) -> Self {
		ReadParam {
			source_region: Some(region),
			subsampling,
			..Default::default()
		}
	}

	pub fn with_subsampling_change(mut self, allowed: bool) -> Self {
		self.subsampling_change_allowed = Some(allowed);
		self
	}

	pub fn with_null_for_empty(mut self) -> Self {
		self.null_for_empty = true;
		self
	}

	pub fn with_destination(mut self, destination: PixelBuffer) -> Self {
		self.destination = Some(destination);
		self
	}

	pub fn with_destination_type(mut self, pixel_type: PixelType) -> Self {
		self.destination_type = Some(pixel_type);
		self
	}
}

#[derive(Debug)]
pub struct ReadResult {
	/// `None` only for empty reads with [`ReadParam::null_for_empty`].
	pub image: Option<PixelBuffer>,
	/// The subsampling actually used.
	pub subsampling: Subsampling,
	/// The requested region clamped to the mosaic.
	pub region: PixelRect,
	/// `true` if a single tile's codec produced the image directly.
	pub delegated: bool,
	/// Number of tiles the image was composed from.
	pub tiles: usize,
}

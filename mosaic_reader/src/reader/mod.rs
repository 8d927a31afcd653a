//! Turns a tile query into one pixel buffer.
//!
//! [`MosaicImageReader::read`] runs a small state machine per call:
//!
//! ```text
//! ResolvingParams → QueryingTiles → Delegating | Compositing → Done | Aborted | Failed
//! ```
//!
//! Tiles are fetched one after another on the caller's thread. Cancellation is checked
//! before every tile; a cancelled or failed read never returns a partial image.

mod builder;
mod param;
mod plan;

pub use builder::ReaderBuilder;
pub use param::*;
pub use plan::*;

use crate::{CodecAbort, CodecRead, ImageTypePolicy, PooledHandle, ReaderConfig, ResourcePool};
use anyhow::{Context, Result, ensure};
use arc_swap::ArcSwapOption;
use log::{debug, trace, warn};
use mosaic_core::{MosaicError, PixelRect, Subsampling, Tile};
use mosaic_image::{PixelBuffer, PixelBufferTraitOperation, PixelType, common_pixel_type};
use mosaic_index::TileManager;
use parking_lot::Mutex;
use std::sync::Arc;

/// The codec read currently running, for [`MosaicImageReader::abort`].
struct InFlight {
	tile: String,
	signal: Arc<dyn CodecAbort>,
}

pub struct MosaicImageReader {
	manager: Box<dyn TileManager>,
	config: ReaderConfig,
	pool: Arc<ResourcePool>,
	state: Mutex<ReadState>,
	running: ArcSwapOption<CancellationToken>,
	in_flight: ArcSwapOption<InFlight>,
}

impl MosaicImageReader {
	pub fn builder(manager: Box<dyn TileManager>) -> ReaderBuilder {
		ReaderBuilder::new(manager)
	}

	fn from_parts(manager: Box<dyn TileManager>, config: ReaderConfig, pool: Arc<ResourcePool>) -> Self {
		MosaicImageReader {
			manager,
			config,
			pool,
			state: Mutex::new(ReadState::Idle),
			running: ArcSwapOption::empty(),
			in_flight: ArcSwapOption::empty(),
		}
	}

	pub fn manager(&self) -> &dyn TileManager {
		self.manager.as_ref()
	}

	pub fn config(&self) -> &ReaderConfig {
		&self.config
	}

	pub fn pool(&self) -> &Arc<ResourcePool> {
		&self.pool
	}

	/// State of the current read, or the final state of the last one.
	pub fn last_state(&self) -> ReadState {
		*self.state.lock()
	}

	pub fn read(&self, param: &mut ReadParam) -> Result<ReadResult> {
		self.read_with_cancel(param, &CancellationToken::new())
	}

	/// Reads `param`, stopping at the next tile once `cancel` is cancelled.
	///
	/// # Errors
	///
	/// [`MosaicError::Aborted`] after cancellation, [`MosaicError::TileRead`] if a codec
	/// fails. Both discard everything read so far.
	pub fn read_with_cancel(&self, param: &mut ReadParam, cancel: &CancellationToken) -> Result<ReadResult> {
		self.running.store(Some(Arc::new(cancel.clone())));
		let result = self.run(param, cancel);
		self.running.store(None);
		self.in_flight.store(None);

		let state = match &result {
			Ok(_) => ReadState::Done,
			Err(err) if matches!(MosaicError::find(err), Some(MosaicError::Aborted)) => ReadState::Aborted,
			Err(_) => ReadState::Failed,
		};
		self.set_state(state);
		result
	}

	/// Cancels the running read and asks the codec handle currently reading to stop.
	/// Safe to call from any thread; does nothing if no read is running.
	pub fn abort(&self) {
		if let Some(token) = self.running.load_full() {
			token.cancel();
		}
		if let Some(in_flight) = self.in_flight.load_full() {
			debug!("aborting read of {}", in_flight.tile);
			in_flight.signal.abort();
		}
	}

	fn set_state(&self, state: ReadState) {
		trace!("read state {state:?}");
		*self.state.lock() = state;
	}

	fn run(&self, param: &mut ReadParam, cancel: &CancellationToken) -> Result<ReadResult> {
		self.set_state(ReadState::ResolvingParams);
		let extent = self.manager.region();
		let requested = param.source_region.unwrap_or(extent);
		let region = requested.intersection(&extent);
		let allow_change = param
			.subsampling_change_allowed
			.unwrap_or(self.config.subsampling_change_allowed);

		self.set_state(ReadState::QueryingTiles);
		let mut subsampling = param.subsampling;
		let tiles = if region.is_empty() {
			Vec::new()
		} else {
			self.manager.query(&region, &mut subsampling, allow_change)
		};
		if subsampling != param.subsampling {
			debug!("subsampling changed from {} to {subsampling}", param.subsampling);
			param.subsampling = subsampling;
		}
		debug!("reading {region} at {subsampling} from {} tiles", tiles.len());

		let mut result = ReadResult {
			image: None,
			subsampling,
			region,
			delegated: false,
			tiles: tiles.len(),
		};

		if tiles.is_empty() {
			if !param.null_for_empty {
				let image = match param.destination.take() {
					Some(destination) => destination,
					None => {
						// Transparent, at the size the caller asked for.
						let (width, height) = destination_size(&requested, subsampling);
						PixelBuffer::new_blank(width, height, self.fallback_type(param))
					}
				};
				result.image = Some(image);
			}
			return Ok(result);
		}

		if let Some(image) = self.delegate(param, &tiles, &region, subsampling)? {
			result.image = Some(image);
			result.delegated = true;
			return Ok(result);
		}

		result.image = Some(self.compose(param, &tiles, &region, subsampling, cancel)?);
		Ok(result)
	}

	/// Pixel type of a blank result.
	fn fallback_type(&self, param: &ReadParam) -> PixelType {
		match (param.destination_type, self.config.image_type_policy) {
			(Some(pixel_type), _) | (None, ImageTypePolicy::Fixed(pixel_type)) => pixel_type,
			_ => PixelType::Rgba8,
		}
	}

	fn checkout(&self, tile: &Tile) -> Result<PooledHandle<'_>> {
		self.pool.checkout(tile).map_err(|source| {
			MosaicError::TileRead {
				tile: tile.to_string(),
				source: source.into(),
			}
			.into()
		})
	}

	/// Reads straight from the codec if a single tile covers the region and its natural
	/// type is acceptable. Returns `None` if the read has to be composed.
	fn delegate(
		&self,
		param: &ReadParam,
		tiles: &[Arc<Tile>],
		region: &PixelRect,
		subsampling: Subsampling,
	) -> Result<Option<PixelBuffer>> {
		let [tile] = tiles else {
			return Ok(None);
		};
		if !self.config.allow_delegation
			|| param.destination.is_some()
			|| !tile.absolute_region().contains_rect(region)
		{
			return Ok(None);
		}
		let Some(request) = plan_tile_read(tile, region, subsampling) else {
			return Ok(None);
		};

		let mut handle = self.checkout(tile)?;
		let natural = handle.pixel_type(tile.index())?;
		let wanted = param.destination_type.or(match self.config.image_type_policy {
			ImageTypePolicy::Fixed(pixel_type) => Some(pixel_type),
			_ => None,
		});
		if wanted.is_some_and(|wanted| wanted != natural) {
			trace!("not delegating to {tile}: it delivers {natural}, not {wanted:?}");
			return Ok(None);
		}

		self.set_state(ReadState::Delegating);
		trace!("delegating {region} to {tile}");
		let image = self.read_tile(handle, tile, &request, None)?;
		image.context("codec returned no pixels").map(Some)
	}

	fn compose(
		&self,
		param: &mut ReadParam,
		tiles: &[Arc<Tile>],
		region: &PixelRect,
		subsampling: Subsampling,
		cancel: &CancellationToken,
	) -> Result<PixelBuffer> {
		self.set_state(ReadState::Compositing);
		let (width, height) = destination_size(region, subsampling);
		let mut image = match param.destination.take() {
			Some(destination) => {
				ensure!(
					(destination.width(), destination.height()) == (width, height),
					"destination is {}x{}, the read needs {width}x{height}",
					destination.width(),
					destination.height()
				);
				destination
			}
			None => {
				let pixel_type = match param.destination_type {
					Some(pixel_type) => pixel_type,
					None => self.choose_pixel_type(tiles)?,
				};
				PixelBuffer::new_blank(width, height, pixel_type)
			}
		};
		let pixel_type = PixelType::of(&image)?;

		for tile in tiles {
			if cancel.is_cancelled() {
				debug!("read of {region} cancelled");
				return Err(MosaicError::Aborted.into());
			}
			let Some(request) = plan_tile_read(tile, region, subsampling) else {
				trace!("{tile} has no pixel on the destination grid");
				continue;
			};
			trace!("reading {:?} of {tile}", request);

			let handle = self.checkout(tile)?;
			if handle.accepts_destination() {
				self.read_tile(handle, tile, &request, Some(&mut image))?;
			} else {
				let block = self
					.read_tile(handle, tile, &request, None)?
					.context("codec returned no pixels")?
					.into_pixel_type(pixel_type)?;
				let (x, y) = request.destination_offset;
				image.blit(&block, i64::from(x), i64::from(y))?;
			}
		}
		if cancel.is_cancelled() {
			return Err(MosaicError::Aborted.into());
		}
		Ok(image)
	}

	/// Runs one codec read with the handle published for [`abort`](Self::abort). A failed
	/// handle is discarded instead of returned to the pool.
	fn read_tile(
		&self,
		mut handle: PooledHandle<'_>,
		tile: &Tile,
		request: &CodecRead,
		destination: Option<&mut PixelBuffer>,
	) -> Result<Option<PixelBuffer>> {
		if let Some(signal) = handle.abort_signal() {
			signal.reset();
			self.in_flight.store(Some(Arc::new(InFlight {
				tile: tile.to_string(),
				signal,
			})));
		}
		let outcome = handle.read(tile.index(), request, destination);
		self.in_flight.store(None);

		match outcome {
			Ok(block) => Ok(block),
			Err(source) => {
				warn!("discarding handle of {tile} after failed read: {source}");
				handle.discard();
				if self.running.load_full().is_some_and(|token| token.is_cancelled()) {
					return Err(MosaicError::Aborted.into());
				}
				Err(MosaicError::TileRead {
					tile: tile.to_string(),
					source: source.into(),
				}
				.into())
			}
		}
	}

	/// Picks the type of a composed image according to the configured policy.
	fn choose_pixel_type(&self, tiles: &[Arc<Tile>]) -> Result<PixelType> {
		match self.config.image_type_policy {
			ImageTypePolicy::Fixed(pixel_type) => Ok(pixel_type),
			ImageTypePolicy::SupportedByOne => {
				let tile = &tiles[0];
				self.checkout(tile)?.pixel_type(tile.index())
			}
			ImageTypePolicy::SupportedByAll => {
				let mut natural = Vec::with_capacity(tiles.len());
				let mut common: Option<Vec<PixelType>> = None;
				for tile in tiles {
					let mut handle = self.checkout(tile)?;
					natural.push(handle.pixel_type(tile.index())?);
					let supported = handle.supported_pixel_types(tile.index())?;
					common = Some(match common {
						None => supported,
						Some(types) => types.into_iter().filter(|t| supported.contains(t)).collect(),
					});
				}
				match common.and_then(|types| types.first().copied()) {
					Some(pixel_type) => Ok(pixel_type),
					None => {
						let widened = common_pixel_type(natural).context("no tiles to choose a pixel type for")?;
						debug!("tiles share no pixel type, converting all to {widened}");
						Ok(widened)
					}
				}
			}
		}
	}
}

impl std::fmt::Debug for MosaicImageReader {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MosaicImageReader")
			.field("manager", &self.manager)
			.field("config", &self.config)
			.field("pool", &self.pool)
			.field("state", &self.last_state())
			.finish()
	}
}

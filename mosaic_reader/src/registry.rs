//! `ProviderRegistry` maps provider ids to the codecs that open tile inputs.
//!
//! Tiles and descriptors name their codec by id only. The registry resolves that id when a
//! descriptor is loaded and whenever the reader opens a tile; an id nobody registered fails
//! with [`MosaicError::UnknownProvider`].
//!
//! # Example
//!
//! ```rust
//! use mosaic_reader::*;
//! use std::sync::Arc;
//!
//! let mut registry = ProviderRegistry::default();
//! registry.register(Arc::new(MemoryProvider::new()));
//! assert_eq!(registry.ids(), vec!["image", "memory"]);
//! ```

use crate::{CodecHandle, CodecProvider, ImageFileProvider};
use anyhow::Result;
use mosaic_core::{MosaicError, Tile};
use mosaic_derive::context;
use std::{collections::HashMap, fmt, sync::Arc};

#[derive(Clone)]
pub struct ProviderRegistry {
	providers: HashMap<String, Arc<dyn CodecProvider>>,
}

impl ProviderRegistry {
	/// A registry without any provider.
	pub fn new_empty() -> Self {
		Self {
			providers: HashMap::new(),
		}
	}

	/// Registers `provider` under its [`id`](CodecProvider::id), replacing an earlier
	/// provider with the same id.
	pub fn register(&mut self, provider: Arc<dyn CodecProvider>) {
		self.providers.insert(provider.id().to_string(), provider);
	}

	pub fn get(&self, id: &str) -> Result<Arc<dyn CodecProvider>> {
		self
			.providers
			.get(id)
			.cloned()
			.ok_or_else(|| MosaicError::UnknownProvider(id.to_string()).into())
	}

	pub fn contains(&self, id: &str) -> bool {
		self.providers.contains_key(id)
	}

	/// Registered ids, sorted.
	pub fn ids(&self) -> Vec<String> {
		let mut ids: Vec<String> = self.providers.keys().cloned().collect();
		ids.sort();
		ids
	}

	/// Opens a new codec handle for `tile`.
	#[context("Failed to open {}", tile)]
	pub fn open(&self, tile: &Tile) -> Result<Box<dyn CodecHandle>> {
		self.get(tile.provider())?.open(tile.input())
	}
}

impl Default for ProviderRegistry {
	fn default() -> Self {
		let mut registry = Self::new_empty();
		registry.register(Arc::new(ImageFileProvider));
		registry
	}
}

impl fmt::Debug for ProviderRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProviderRegistry").field("providers", &self.ids()).finish()
	}
}

//! Builder for [`MosaicImageReader`].

use super::MosaicImageReader;
use crate::{ProviderRegistry, ReaderConfig, ResourcePool};
use anyhow::Result;
use mosaic_core::MosaicError;
use mosaic_index::TileManager;
use std::sync::Arc;

/// Builder for a [`MosaicImageReader`].
///
/// # Examples
///
/// ```no_run
/// use mosaic_reader::*;
/// use std::{path::Path, sync::Arc};
///
/// # fn main() -> anyhow::Result<()> {
/// let memory = Arc::new(MemoryProvider::new());
/// let manager = open_manager(Path::new("mosaic/TileManager.yaml"), &ProviderRegistry::default())?;
/// let reader = MosaicImageReader::builder(manager)
///     .config(ReaderConfig::from_path(Path::new("reader.yml"))?)
///     .customize_registry(move |registry| registry.register(memory))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ReaderBuilder {
	manager: Box<dyn TileManager>,
	config: Option<ReaderConfig>,
	registry: Option<ProviderRegistry>,
	pool: Option<Arc<ResourcePool>>,
	#[allow(clippy::type_complexity)]
	registry_customizer: Option<Box<dyn FnOnce(&mut ProviderRegistry)>>,
}

impl ReaderBuilder {
	pub(super) fn new(manager: Box<dyn TileManager>) -> Self {
		Self {
			manager,
			config: None,
			registry: None,
			pool: None,
			registry_customizer: None,
		}
	}

	pub fn config(mut self, config: ReaderConfig) -> Self {
		self.config = Some(config);
		self
	}

	/// Providers to open tiles with. Defaults to [`ProviderRegistry::default`].
	pub fn registry(mut self, registry: ProviderRegistry) -> Self {
		self.registry = Some(registry);
		self
	}

	/// Shares an existing pool, e.g. between readers of the same mosaic. Registry settings
	/// of this builder are ignored then.
	pub fn pool(mut self, pool: Arc<ResourcePool>) -> Self {
		self.pool = Some(pool);
		self
	}

	/// Called with the registry before the pool is created.
	pub fn customize_registry<F>(mut self, customizer: F) -> Self
	where
		F: FnOnce(&mut ProviderRegistry) + 'static,
	{
		self.registry_customizer = Some(Box::new(customizer));
		self
	}

	/// Builds the reader.
	///
	/// # Errors
	///
	/// Fails with [`MosaicError::UnknownProvider`] if a tile uses a provider the registry lacks.
	pub fn build(self) -> Result<MosaicImageReader> {
		let config = self.config.unwrap_or_default();
		let pool = match self.pool {
			Some(pool) => pool,
			None => {
				let mut registry = self.registry.unwrap_or_default();
				if let Some(customizer) = self.registry_customizer {
					customizer(&mut registry);
				}
				Arc::new(ResourcePool::new(registry, config.max_idle_handles_per_input))
			}
		};
		if let Some(missing) = self
			.manager
			.providers()
			.iter()
			.find(|id| !pool.registry().contains(id))
		{
			return Err(MosaicError::UnknownProvider(missing.clone()).into());
		}
		Ok(MosaicImageReader::from_parts(self.manager, config, pool))
	}
}

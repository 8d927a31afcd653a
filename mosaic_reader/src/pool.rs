//! Codec handles kept open between reads.
//!
//! Handles are expensive to open and stateful, so the reader checks one out per tile read
//! and checks it back in right after. A handle is never shared: while checked out it
//! belongs to exactly one [`PooledHandle`].

use crate::{CodecHandle, ProviderRegistry};
use anyhow::Result;
use dashmap::DashMap;
use log::trace;
use mosaic_core::{Tile, TileInput};
use parking_lot::Mutex;
use std::{
	fmt,
	ops::{Deref, DerefMut},
	sync::atomic::{AtomicUsize, Ordering},
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct HandleKey {
	provider: String,
	input: TileInput,
}

impl HandleKey {
	fn of(tile: &Tile) -> Self {
		HandleKey {
			provider: tile.provider().to_string(),
			input: tile.input().clone(),
		}
	}
}

/// Counters since the pool was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
	/// Handles opened through the registry.
	pub opened: usize,
	/// Check-outs served by an idle handle.
	pub reused: usize,
	/// Handles closed because they failed or the idle list was full.
	pub discarded: usize,
	/// Handles currently idle.
	pub idle: usize,
}

pub struct ResourcePool {
	registry: ProviderRegistry,
	idle: DashMap<HandleKey, Mutex<Vec<Box<dyn CodecHandle>>>>,
	max_idle_per_input: usize,
	opened: AtomicUsize,
	reused: AtomicUsize,
	discarded: AtomicUsize,
}

impl ResourcePool {
	/// Keeps at most `max_idle_per_input` idle handles per provider and input.
	pub fn new(registry: ProviderRegistry, max_idle_per_input: usize) -> Self {
		ResourcePool {
			registry,
			idle: DashMap::new(),
			max_idle_per_input,
			opened: AtomicUsize::new(0),
			reused: AtomicUsize::new(0),
			discarded: AtomicUsize::new(0),
		}
	}

	pub fn registry(&self) -> &ProviderRegistry {
		&self.registry
	}

	/// Returns an idle handle for the tile's input or opens a new one.
	pub fn checkout(&self, tile: &Tile) -> Result<PooledHandle<'_>> {
		let key = HandleKey::of(tile);
		let idle = self.idle.get(&key).and_then(|entry| entry.lock().pop());
		let handle = match idle {
			Some(handle) => {
				self.reused.fetch_add(1, Ordering::Relaxed);
				trace!("reusing handle for {}", key.input);
				handle
			}
			None => {
				let handle = self.registry.open(tile)?;
				self.opened.fetch_add(1, Ordering::Relaxed);
				trace!("opened handle for {}", key.input);
				handle
			}
		};
		Ok(PooledHandle {
			pool: self,
			key,
			handle: Some(handle),
			keep: true,
		})
	}

	fn check_in(&self, key: HandleKey, handle: Box<dyn CodecHandle>) {
		let entry = self.idle.entry(key.clone()).or_default();
		let mut idle = entry.lock();
		if idle.len() < self.max_idle_per_input {
			trace!("checked in handle for {}", key.input);
			idle.push(handle);
		} else {
			trace!("closing surplus handle for {}", key.input);
			self.discarded.fetch_add(1, Ordering::Relaxed);
		}
	}

	pub fn stats(&self) -> PoolStats {
		PoolStats {
			opened: self.opened.load(Ordering::Relaxed),
			reused: self.reused.load(Ordering::Relaxed),
			discarded: self.discarded.load(Ordering::Relaxed),
			idle: self.idle.iter().map(|entry| entry.lock().len()).sum(),
		}
	}

	/// Closes all idle handles.
	pub fn clear(&self) {
		self.idle.clear();
	}
}

impl fmt::Debug for ResourcePool {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResourcePool")
			.field("registry", &self.registry)
			.field("max_idle_per_input", &self.max_idle_per_input)
			.field("stats", &self.stats())
			.finish()
	}
}

/// A checked-out handle. It returns to the pool when dropped, unless it was discarded.
pub struct PooledHandle<'a> {
	pool: &'a ResourcePool,
	key: HandleKey,
	handle: Option<Box<dyn CodecHandle>>,
	keep: bool,
}

impl PooledHandle<'_> {
	/// Closes the handle instead of returning it, e.g. after a failed read.
	pub fn discard(mut self) {
		self.keep = false;
	}
}

impl Deref for PooledHandle<'_> {
	type Target = dyn CodecHandle;

	fn deref(&self) -> &Self::Target {
		self.handle.as_deref().expect("pooled handle is present until dropped")
	}
}

impl DerefMut for PooledHandle<'_> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		self.handle.as_deref_mut().expect("pooled handle is present until dropped")
	}
}

impl Drop for PooledHandle<'_> {
	fn drop(&mut self) {
		let Some(handle) = self.handle.take() else {
			return;
		};
		if self.keep {
			self.pool.check_in(self.key.clone(), handle);
		} else {
			trace!("discarding handle for {}", self.key.input);
			self.pool.discarded.fetch_add(1, Ordering::Relaxed);
		}
	}
}

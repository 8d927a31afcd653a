//! Error kinds callers need to tell apart.
//!
//! Everything else travels as a plain `anyhow::Error`. These variants are wrapped in
//! `anyhow::Error` as well and can be recovered with `error.downcast_ref::<MosaicError>()`,
//! also after context has been attached.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MosaicError {
	/// A descriptor or a tile names a codec provider that is not registered.
	#[error("unknown provider '{0}'")]
	UnknownProvider(String),

	/// The tiles do not have the shape a component requires.
	#[error("invalid tile layout: {0}")]
	InvalidLayout(String),

	/// The read was cancelled before it completed.
	#[error("read aborted")]
	Aborted,

	/// A codec failed while reading one tile; the whole read is abandoned.
	#[error("failed to read tile {tile}")]
	TileRead {
		tile: String,
		#[source]
		source: Box<dyn std::error::Error + Send + Sync + 'static>,
	},
}

impl MosaicError {
	/// Finds a `MosaicError` anywhere in the chain of `error`.
	pub fn find(error: &anyhow::Error) -> Option<&MosaicError> {
		error.chain().find_map(|cause| cause.downcast_ref::<MosaicError>())
	}
}

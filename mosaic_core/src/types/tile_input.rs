use std::{
	fmt,
	path::{Path, PathBuf},
};

/// Where a tile's pixels live, as understood by its codec provider.
///
/// The ordering (paths, then URLs, then names, each compared by value) is what
/// [`Tile`](crate::Tile) uses to group reads of the same input together.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TileInput {
	/// A local file.
	Path(PathBuf),
	/// A remote resource.
	Url(String),
	/// An opaque key, e.g. a buffer registered with an in-memory provider.
	Named(String),
}

impl TileInput {
	/// Returns the path for file inputs.
	pub fn as_path(&self) -> Option<&Path> {
		match self {
			TileInput::Path(path) => Some(path),
			_ => None,
		}
	}

	/// Resolves a relative file path against `base`; other inputs are returned unchanged.
	pub fn resolved_against(self, base: &Path) -> TileInput {
		match self {
			TileInput::Path(path) if path.is_relative() => TileInput::Path(base.join(path)),
			other => other,
		}
	}

	/// Parses the textual form used in descriptors: `http(s)://…` is a URL, `name:…` a named
	/// input, everything else a file path.
	pub fn parse(text: &str) -> TileInput {
		if text.starts_with("http://") || text.starts_with("https://") {
			TileInput::Url(text.to_string())
		} else if let Some(name) = text.strip_prefix("name:") {
			TileInput::Named(name.to_string())
		} else {
			TileInput::Path(PathBuf::from(text))
		}
	}
}

impl From<&Path> for TileInput {
	fn from(path: &Path) -> Self {
		TileInput::Path(path.to_path_buf())
	}
}

impl From<PathBuf> for TileInput {
	fn from(path: PathBuf) -> Self {
		TileInput::Path(path)
	}
}

impl fmt::Display for TileInput {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TileInput::Path(path) => write!(f, "{}", path.display()),
			TileInput::Url(url) => write!(f, "{url}"),
			TileInput::Named(name) => write!(f, "name:{name}"),
		}
	}
}

impl fmt::Debug for TileInput {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TileInput({self})")
	}
}

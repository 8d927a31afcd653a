//! Reader settings, loadable from YAML.
//!
//! ```yaml
//! image_type_policy:
//!   fixed: rgba8
//! allow_delegation: false
//! max_idle_handles_per_input: 4
//! subsampling_change_allowed: true
//! ```

use anyhow::Result;
use mosaic_derive::context;
use mosaic_image::PixelType;
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::Path,
};

/// How the reader chooses the pixel type of a composed image.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImageTypePolicy {
	/// A type every tile of the read can deliver.
	#[default]
	SupportedByAll,
	/// The natural type of the first tile.
	SupportedByOne,
	/// Always this type.
	Fixed(PixelType),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
	/// Written as `supported_by_all`, `supported_by_one` or `{ fixed: <type> }`.
	#[serde(with = "serde_yaml_ng::with::singleton_map")]
	pub image_type_policy: ImageTypePolicy,

	/// Lets a read covered by a single tile go straight to that tile's codec.
	pub allow_delegation: bool,

	pub max_idle_handles_per_input: usize,

	/// Used for requests that do not say whether their subsampling may be lowered.
	pub subsampling_change_allowed: bool,
}

impl Default for ReaderConfig {
	fn default() -> Self {
		ReaderConfig {
			image_type_policy: ImageTypePolicy::default(),
			allow_delegation: true,
			max_idle_handles_per_input: 2,
			subsampling_change_allowed: false,
		}
	}
}

impl ReaderConfig {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	#[context("Failed to read reader config {:?}", path)]
	pub fn from_path(path: &Path) -> Result<Self> {
		Self::from_reader(BufReader::new(File::open(path)?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[test]
	fn empty_config_is_default() {
		assert_eq!(ReaderConfig::from_string("").unwrap(), ReaderConfig::default());
		assert_eq!(ReaderConfig::from_string("{}").unwrap(), ReaderConfig::default());
	}

	#[test]
	fn full_config() {
		let config = ReaderConfig::from_string(
			"image_type_policy:\n  fixed: rgba8\nallow_delegation: false\nmax_idle_handles_per_input: 4\nsubsampling_change_allowed: true\n",
		)
		.unwrap();
		assert_eq!(
			config,
			ReaderConfig {
				image_type_policy: ImageTypePolicy::Fixed(PixelType::Rgba8),
				allow_delegation: false,
				max_idle_handles_per_input: 4,
				subsampling_change_allowed: true,
			}
		);
	}

	#[rstest]
	#[case::all("supported_by_all", ImageTypePolicy::SupportedByAll)]
	#[case::one("supported_by_one", ImageTypePolicy::SupportedByOne)]
	#[case::fixed("{ fixed: l16 }", ImageTypePolicy::Fixed(PixelType::L16))]
	#[case::fixed_block("\n  fixed: rgb8", ImageTypePolicy::Fixed(PixelType::Rgb8))]
	fn policies(#[case] yaml: &str, #[case] expected: ImageTypePolicy) {
		let config = ReaderConfig::from_string(&format!("image_type_policy: {yaml}")).unwrap();
		assert_eq!(config.image_type_policy, expected);
	}

	#[test]
	fn unknown_fields_are_rejected() {
		assert!(ReaderConfig::from_string("allow_delegations: true").is_err());
		assert!(ReaderConfig::from_string("image_type_policy: fixed").is_err());
	}

	#[test]
	fn from_path() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("reader.yml");
		std::fs::write(&path, "max_idle_handles_per_input: 0\n").unwrap();
		assert_eq!(ReaderConfig::from_path(&path).unwrap().max_idle_handles_per_input, 0);
		assert!(ReaderConfig::from_path(&dir.path().join("missing.yml")).is_err());
	}
}

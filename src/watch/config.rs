use crate::error::{DetectError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The two orthogonal switches of a watch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchOptions {
	/// Report elements already in the document at registration
	pub include_existing: bool,
	/// End the watch after the first reported element
	pub stop_after_first: bool,
}

impl WatchOptions {
	pub fn new(include_existing: bool, stop_after_first: bool) -> Self {
		Self {
			include_existing,
			stop_after_first,
		}
	}
}

/// Named presets over [`WatchOptions`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectMode {
	/// Only elements that appear after registration
	#[default]
	New,
	/// The first element that appears after registration
	FirstNew,
	/// Existing elements, then every element that appears later
	ExistingAndNew,
	/// The first existing element, or else the first one to appear
	FirstExistingOrNew,
}

impl DetectMode {
	pub const ALL: [DetectMode; 4] = [
		DetectMode::New,
		DetectMode::FirstNew,
		DetectMode::ExistingAndNew,
		DetectMode::FirstExistingOrNew,
	];

	pub fn options(self) -> WatchOptions {
		match self {
			DetectMode::New => WatchOptions::new(false, false),
			DetectMode::FirstNew => WatchOptions::new(false, true),
			DetectMode::ExistingAndNew => WatchOptions::new(true, false),
			DetectMode::FirstExistingOrNew => WatchOptions::new(true, true),
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			DetectMode::New => "new",
			DetectMode::FirstNew => "first-new",
			DetectMode::ExistingAndNew => "existing-and-new",
			DetectMode::FirstExistingOrNew => "first-existing-or-new",
		}
	}
}

impl From<DetectMode> for WatchOptions {
	fn from(mode: DetectMode) -> Self {
		mode.options()
	}
}

impl fmt::Display for DetectMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for DetectMode {
	type Err = DetectError;

	fn from_str(s: &str) -> Result<Self> {
		DetectMode::ALL
			.into_iter()
			.find(|mode| mode.as_str() == s)
			.ok_or_else(|| {
				DetectError::configuration_error(
					"mode",
					&format!(
						"unknown mode {s:?}, expected one of: new, first-new, existing-and-new, first-existing-or-new"
					),
				)
			})
	}
}

/// Configuration for a selector watch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
	pub watch_id: Uuid,
	pub selector: String,
	pub options: WatchOptions,
}

impl WatchConfig {
	pub fn new(selector: &str, mode: DetectMode) -> Self {
		Self {
			watch_id: Uuid::new_v4(),
			selector: selector.to_string(),
			options: mode.options(),
		}
	}

	pub fn with_options(mut self, options: WatchOptions) -> Self {
		self.options = options;
		self
	}

	/// Validate the configuration and return errors if invalid
	pub fn validate(&self) -> Result<()> {
		if self.selector.trim().is_empty() {
			return Err(DetectError::configuration_error(
				"selector",
				"must not be empty",
			));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_mode_presets() {
		assert_eq!(DetectMode::New.options(), WatchOptions::new(false, false));
		assert_eq!(DetectMode::FirstNew.options(), WatchOptions::new(false, true));
		assert_eq!(DetectMode::ExistingAndNew.options(), WatchOptions::new(true, false));
		assert_eq!(DetectMode::FirstExistingOrNew.options(), WatchOptions::new(true, true));
		assert_eq!(WatchOptions::default(), DetectMode::default().into());
	}

	#[test]
	fn test_mode_parsing() {
		for mode in DetectMode::ALL {
			assert_eq!(mode.to_string().parse::<DetectMode>().unwrap(), mode);
		}

		let error = "sometimes".parse::<DetectMode>().unwrap_err();
		assert!(error.is_configuration_error());
		assert!(error.to_string().contains("sometimes"));
	}

	#[test]
	fn test_mode_serde_matches_display() {
		for mode in DetectMode::ALL {
			let json = serde_json::to_string(&mode).unwrap();
			assert_eq!(json, format!("\"{mode}\""));
		}
	}

	#[test]
	fn test_config_validation() {
		let config = WatchConfig::new("div.red", DetectMode::ExistingAndNew);
		assert!(config.validate().is_ok());
		assert!(config.options.include_existing);

		let empty = WatchConfig::new("  ", DetectMode::New);
		assert!(empty.validate().is_err());

		let custom = WatchConfig::new("p", DetectMode::New).with_options(WatchOptions::new(true, true));
		assert_eq!(custom.options, DetectMode::FirstExistingOrNew.options());
	}
}

use crate::dom::DomError;
use crate::selector::SelectorError;
use thiserror::Error;

/// Top-level error type
///
/// Module-specific errors are defined in their respective modules:
/// - Tree errors: `crate::dom::DomError`
/// - Selector errors: `crate::selector::SelectorError`
#[derive(Error, Debug)]
pub enum DetectError {
	#[error("Document error: {0}")]
	Dom(#[from] DomError),

	#[error("Selector error: {0}")]
	Selector(#[from] SelectorError),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON serialization error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Configuration error: {parameter} - {reason}")]
	ConfigurationError { parameter: String, reason: String },

	#[error("Scenario error: {context} - {reason}")]
	ScenarioError { context: String, reason: String },
}

impl DetectError {
	/// Get error category for logging
	pub fn category(&self) -> &'static str {
		match self {
			DetectError::Dom(err) => err.category(),
			DetectError::Selector(_) => "selector",
			DetectError::Io(_) => "io",
			DetectError::Json(_) => "serialization",
			DetectError::ConfigurationError { .. } => "configuration",
			DetectError::ScenarioError { .. } => "scenario",
		}
	}

	/// Check if this error is related to configuration issues
	pub fn is_configuration_error(&self) -> bool {
		matches!(
			self,
			DetectError::ConfigurationError { .. } | DetectError::Selector(_)
		)
	}

	/// Create a configuration error
	pub fn configuration_error(parameter: &str, reason: &str) -> Self {
		DetectError::ConfigurationError {
			parameter: parameter.to_string(),
			reason: reason.to_string(),
		}
	}

	/// Create a scenario error
	pub fn scenario_error(context: &str, reason: &str) -> Self {
		DetectError::ScenarioError {
			context: context.to_string(),
			reason: reason.to_string(),
		}
	}
}

pub type Result<T> = std::result::Result<T, DetectError>;

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::NodeId;
	use std::io;

	#[test]
	fn test_error_variants() {
		let io_error = DetectError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
		let config_error = DetectError::configuration_error("selector", "must not be empty");

		assert!(io_error.to_string().contains("IO error"));
		assert!(config_error.to_string().contains("selector"));
		assert!(config_error.to_string().contains("must not be empty"));
	}

	#[test]
	fn test_from_conversions() {
		let selector_err: DetectError = SelectorError::Empty.into();
		match selector_err {
			DetectError::Selector(SelectorError::Empty) => (),
			other => panic!("Expected selector error variant, got {other:?}"),
		}

		let dom_err: DetectError = DomError::NotAnElement { node: NodeId(4) }.into();
		assert_eq!(dom_err.category(), "node_type");
	}

	#[test]
	fn test_error_categorization() {
		let config_error = DetectError::configuration_error("mode", "unknown");
		assert!(config_error.is_configuration_error());
		assert_eq!(config_error.category(), "configuration");

		let selector_error = DetectError::from(SelectorError::Empty);
		assert!(selector_error.is_configuration_error());

		let scenario_error = DetectError::scenario_error("batch 1", "no such node");
		assert!(!scenario_error.is_configuration_error());
		assert_eq!(scenario_error.category(), "scenario");
	}
}

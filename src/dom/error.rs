//! Document tree specific error types

use crate::dom::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
	#[error("Unknown node: {node}")]
	UnknownNode { node: NodeId },

	#[error("Hierarchy request error: cannot insert {child} into {parent} - {reason}")]
	HierarchyRequest {
		parent: NodeId,
		child: NodeId,
		reason: String,
	},

	#[error("Node {child} is not a child of {parent}")]
	NotFound { parent: NodeId, child: NodeId },

	#[error("Node {node} is not an element")]
	NotAnElement { node: NodeId },

	#[error("Node {node} is not a text node")]
	NotText { node: NodeId },

	#[error("Invalid character in name: {name:?}")]
	InvalidCharacter { name: String },

	#[error("Invalid observe options: {reason}")]
	InvalidObserveOptions { reason: String },
}

impl DomError {
	/// Get error category for logging
	pub fn category(&self) -> &'static str {
		match self {
			DomError::UnknownNode { .. } => "unknown_node",
			DomError::HierarchyRequest { .. } => "hierarchy",
			DomError::NotFound { .. } => "not_found",
			DomError::NotAnElement { .. } | DomError::NotText { .. } => "node_type",
			DomError::InvalidCharacter { .. } => "invalid_character",
			DomError::InvalidObserveOptions { .. } => "observe_options",
		}
	}

	pub(crate) fn hierarchy(parent: NodeId, child: NodeId, reason: &str) -> Self {
		DomError::HierarchyRequest {
			parent,
			child,
			reason: reason.to_string(),
		}
	}

	pub(crate) fn invalid_options(reason: &str) -> Self {
		DomError::InvalidObserveOptions { reason: reason.to_string() }
	}
}

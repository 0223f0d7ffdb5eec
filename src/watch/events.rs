use crate::dom::{Document, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One reported element, as sent through [`watch_channel`](crate::watch_channel)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
	pub watch_id: Uuid,
	pub node: NodeId,
	pub tag: String,
	/// The element's `id` attribute at detection time
	pub element_id: Option<String>,
	/// 1-based position of this detection within its watch
	pub sequence: u64,
	pub timestamp: DateTime<Utc>,
}

impl Detection {
	pub fn new(watch_id: Uuid, document: &Document, node: NodeId, sequence: u64) -> Self {
		Self {
			watch_id,
			node,
			tag: document.tag_name(node).unwrap_or_default().to_string(),
			element_id: document.attribute(node, "id").map(str::to_string),
			sequence,
			timestamp: Utc::now(),
		}
	}

	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string(self)
	}
}

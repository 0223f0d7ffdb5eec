//! JSON scenarios: an initial tree, a set of watches and batches of tree
//! operations, replayed against a fresh [`Document`].
//!
//! Operations address nodes by target string:
//! - `"document"` is the document node
//! - `"$name"` is a node created with `"label": "name"` (attached or not)
//! - anything else is a selector, resolved to the first connected match
//!
//! ```json
//! {
//!   "document": [{ "tag": "div", "attributes": { "class": "red", "id": "A" }, "label": "a" }],
//!   "watches": [{ "name": "reds", "selector": ".red", "mode": "existing-and-new" }],
//!   "batches": [
//!     [{ "op": "append", "parent": "#A", "node": { "tag": "div", "attributes": { "class": "red" } } }],
//!     [{ "op": "remove", "target": "$a" }]
//!   ]
//! }
//! ```

use crate::dom::{Document, NodeId};
use crate::error::{DetectError, Result};
use crate::selector::Selector;
use crate::watch::{start, DetectMode, Detection, WatchConfig, WatchHandle};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
	Text {
		text: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		label: Option<String>,
	},
	Element {
		tag: String,
		#[serde(default)]
		attributes: BTreeMap<String, String>,
		#[serde(default)]
		children: Vec<NodeSpec>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		label: Option<String>,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSpec {
	pub name: String,
	pub selector: String,
	#[serde(default)]
	pub mode: DetectMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
	Append { parent: String, node: NodeSpec },
	InsertBefore { parent: String, before: String, node: NodeSpec },
	/// Insert an existing (typically removed) node again
	Move { target: String, parent: String },
	Remove { target: String },
	SetAttribute { target: String, name: String, value: String },
	RemoveAttribute { target: String, name: String },
	ToggleClass { target: String, class: String },
	SetText { target: String, text: String },
	Cancel { watch: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
	#[serde(default)]
	pub document: Vec<NodeSpec>,
	#[serde(default)]
	pub watches: Vec<WatchSpec>,
	#[serde(default)]
	pub batches: Vec<Vec<Operation>>,
}

/// A detection together with the watch and phase it happened in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDetection {
	pub watch: String,
	/// 1-based batch number, `None` for the initial scan
	pub batch: Option<usize>,
	#[serde(flatten)]
	pub detection: Detection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
	pub batches: usize,
	pub detections: Vec<ReplayDetection>,
}

impl ReplayReport {
	pub fn for_watch<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ReplayDetection> + 'a {
		self.detections.iter().filter(move |d| d.watch == name)
	}
}

impl Scenario {
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	pub fn load(path: &Path) -> Result<Self> {
		let json = std::fs::read_to_string(path)?;
		Self::from_json(&json)
	}

	pub fn run(&self) -> Result<ReplayReport> {
		let mut replay = Replay::new();
		for spec in &self.document {
			let root = replay.document.root();
			replay.build(root, spec)?;
		}

		for spec in &self.watches {
			replay.add_watch(spec)?;
		}

		for (index, batch) in self.batches.iter().enumerate() {
			let number = index + 1;
			replay.phase.set(Some(number));
			for operation in batch {
				replay.apply(number, operation)?;
			}
			let delivered = replay.document.deliver_mutations();
			debug!("Batch {} applied {} operations, {} deliveries", number, batch.len(), delivered);
		}

		let detections = replay.detections.borrow().clone();
		info!(
			"Replayed {} batches with {} detections",
			self.batches.len(),
			detections.len()
		);
		Ok(ReplayReport {
			batches: self.batches.len(),
			detections,
		})
	}
}

struct Replay {
	document: Document,
	labels: HashMap<String, NodeId>,
	watches: HashMap<String, WatchHandle>,
	phase: Rc<Cell<Option<usize>>>,
	detections: Rc<RefCell<Vec<ReplayDetection>>>,
}

impl Replay {
	fn new() -> Self {
		Self {
			document: Document::new(),
			labels: HashMap::new(),
			watches: HashMap::new(),
			phase: Rc::default(),
			detections: Rc::default(),
		}
	}

	fn add_watch(&mut self, spec: &WatchSpec) -> Result<()> {
		if self.watches.contains_key(&spec.name) {
			return Err(DetectError::scenario_error(
				&format!("watch {}", spec.name),
				"duplicate watch name",
			));
		}

		let config = WatchConfig::new(&spec.selector, spec.mode);
		let watch_id = config.watch_id;
		let name = spec.name.clone();
		let phase = Rc::clone(&self.phase);
		let detections = Rc::clone(&self.detections);
		let mut sequence = 0;

		let handle = start(&mut self.document, &config, move |document: &mut Document, node: NodeId| {
			sequence += 1;
			detections.borrow_mut().push(ReplayDetection {
				watch: name.clone(),
				batch: phase.get(),
				detection: Detection::new(watch_id, document, node, sequence),
			});
		})?;
		self.watches.insert(spec.name.clone(), handle);
		Ok(())
	}

	/// Create the nodes described by `spec` and append them under `parent`
	fn build(&mut self, parent: NodeId, spec: &NodeSpec) -> Result<NodeId> {
		let node = self.create(spec)?;
		self.document.append_child(parent, node)?;
		Ok(node)
	}

	/// Create the nodes described by `spec` as a detached subtree
	fn create(&mut self, spec: &NodeSpec) -> Result<NodeId> {
		let (node, label) = match spec {
			NodeSpec::Text { text, label } => (self.document.create_text(text), label),
			NodeSpec::Element {
				tag,
				attributes,
				children,
				label,
			} => {
				let node = self.document.create_element_with(
					tag,
					attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())),
				)?;
				for child in children {
					self.build(node, child)?;
				}
				(node, label)
			}
		};
		if let Some(label) = label {
			self.labels.insert(label.clone(), node);
		}
		Ok(node)
	}

	fn resolve(&self, batch: usize, target: &str) -> Result<NodeId> {
		if target == "document" {
			return Ok(self.document.root());
		}
		if let Some(label) = target.strip_prefix('$') {
			return self.labels.get(label).copied().ok_or_else(|| {
				DetectError::scenario_error(&format!("batch {batch}"), &format!("unknown label {label:?}"))
			});
		}
		let selector = Selector::parse(target)?;
		self.document.query_selector(&selector).ok_or_else(|| {
			DetectError::scenario_error(&format!("batch {batch}"), &format!("no node matches {target:?}"))
		})
	}

	fn apply(&mut self, batch: usize, operation: &Operation) -> Result<()> {
		match operation {
			Operation::Append { parent, node } => {
				let parent = self.resolve(batch, parent)?;
				let node = self.create(node)?;
				self.document.append_child(parent, node)?;
			}
			Operation::InsertBefore { parent, before, node } => {
				let parent = self.resolve(batch, parent)?;
				let before = self.resolve(batch, before)?;
				let node = self.create(node)?;
				self.document.insert_before(parent, node, Some(before))?;
			}
			Operation::Move { target, parent } => {
				let target = self.resolve(batch, target)?;
				let parent = self.resolve(batch, parent)?;
				self.document.append_child(parent, target)?;
			}
			Operation::Remove { target } => {
				let target = self.resolve(batch, target)?;
				self.document.remove(target)?;
			}
			Operation::SetAttribute { target, name, value } => {
				let target = self.resolve(batch, target)?;
				self.document.set_attribute(target, name, value)?;
			}
			Operation::RemoveAttribute { target, name } => {
				let target = self.resolve(batch, target)?;
				self.document.remove_attribute(target, name)?;
			}
			Operation::ToggleClass { target, class } => {
				let target = self.resolve(batch, target)?;
				self.document.toggle_class(target, class)?;
			}
			Operation::SetText { target, text } => {
				let target = self.resolve(batch, target)?;
				self.document.set_text(target, text)?;
			}
			Operation::Cancel { watch } => {
				let handle = self.watches.get(watch).ok_or_else(|| {
					DetectError::scenario_error(&format!("batch {batch}"), &format!("unknown watch {watch:?}"))
				})?;
				handle.cancel(&mut self.document);
			}
		}
		Ok(())
	}
}

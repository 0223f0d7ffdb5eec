//! Mutation records and the observer registry behind
//! [`Document::observe`](crate::dom::Document::observe).
//!
//! Records are queued per observer as the tree changes and handed over as one
//! [`ChangeBatch`] per observer when the host calls
//! [`Document::deliver_mutations`](crate::dom::Document::deliver_mutations).

use crate::dom::{Document, DomError, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
	ChildList,
	Attributes,
	CharacterData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
	pub kind: MutationKind,
	pub target: NodeId,
	pub added_nodes: Vec<NodeId>,
	pub removed_nodes: Vec<NodeId>,
	pub previous_sibling: Option<NodeId>,
	pub next_sibling: Option<NodeId>,
	pub attribute_name: Option<String>,
	pub old_value: Option<String>,
}

impl MutationRecord {
	pub(crate) fn child_list(
		target: NodeId, added_nodes: Vec<NodeId>, removed_nodes: Vec<NodeId>,
		previous_sibling: Option<NodeId>, next_sibling: Option<NodeId>,
	) -> Self {
		debug_assert!(!(added_nodes.is_empty() && removed_nodes.is_empty()));
		Self {
			kind: MutationKind::ChildList,
			target,
			added_nodes,
			removed_nodes,
			previous_sibling,
			next_sibling,
			attribute_name: None,
			old_value: None,
		}
	}

	pub(crate) fn attributes(target: NodeId, name: &str, old_value: Option<String>) -> Self {
		Self {
			kind: MutationKind::Attributes,
			target,
			added_nodes: Vec::new(),
			removed_nodes: Vec::new(),
			previous_sibling: None,
			next_sibling: None,
			attribute_name: Some(name.to_string()),
			old_value,
		}
	}

	pub(crate) fn character_data(target: NodeId, old_value: String) -> Self {
		Self {
			kind: MutationKind::CharacterData,
			target,
			added_nodes: Vec::new(),
			removed_nodes: Vec::new(),
			previous_sibling: None,
			next_sibling: None,
			attribute_name: None,
			old_value: Some(old_value),
		}
	}
}

/// Records delivered together to one observer, in the order they were queued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
	records: Vec<MutationRecord>,
}

impl ChangeBatch {
	pub fn new(records: Vec<MutationRecord>) -> Self {
		Self { records }
	}

	pub fn records(&self) -> &[MutationRecord] {
		&self.records
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, MutationRecord> {
		self.records.iter()
	}
}

impl IntoIterator for ChangeBatch {
	type Item = MutationRecord;
	type IntoIter = std::vec::IntoIter<MutationRecord>;

	fn into_iter(self) -> Self::IntoIter {
		self.records.into_iter()
	}
}

impl<'a> IntoIterator for &'a ChangeBatch {
	type Item = &'a MutationRecord;
	type IntoIter = std::slice::Iter<'a, MutationRecord>;

	fn into_iter(self) -> Self::IntoIter {
		self.records.iter()
	}
}

/// Which changes an observer is interested in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObserveOptions {
	pub child_list: bool,
	pub attributes: bool,
	pub character_data: bool,
	/// Also observe every descendant of the target
	pub subtree: bool,
	pub attribute_old_value: bool,
	pub character_data_old_value: bool,
	/// Only report attribute changes for these names
	pub attribute_filter: Option<Vec<String>>,
}

impl ObserveOptions {
	/// Structural and attribute changes anywhere below the target, no text changes
	pub fn subtree_changes() -> Self {
		Self {
			child_list: true,
			attributes: true,
			subtree: true,
			..Default::default()
		}
	}

	/// Fill in implied flags and reject option sets that observe nothing
	pub fn normalized(mut self) -> Result<Self, DomError> {
		if self.attribute_old_value || self.attribute_filter.is_some() {
			self.attributes = true;
		}
		if self.character_data_old_value {
			self.character_data = true;
		}
		if !(self.child_list || self.attributes || self.character_data) {
			return Err(DomError::invalid_options(
				"one of child_list, attributes or character_data must be set",
			));
		}
		Ok(self)
	}

	fn accepts(&self, record: &MutationRecord) -> bool {
		match record.kind {
			MutationKind::ChildList => self.child_list,
			MutationKind::CharacterData => self.character_data,
			MutationKind::Attributes => {
				if !self.attributes {
					return false;
				}
				match (&self.attribute_filter, &record.attribute_name) {
					(Some(filter), Some(name)) => filter.iter().any(|f| f == name),
					_ => true,
				}
			}
		}
	}

	fn wants_old_value(&self, kind: MutationKind) -> bool {
		match kind {
			MutationKind::Attributes => self.attribute_old_value,
			MutationKind::CharacterData => self.character_data_old_value,
			MutationKind::ChildList => false,
		}
	}
}

/// Receives change batches from a [`Document`].
///
/// The observer gets mutable access to the document; mutations it makes are
/// queued and delivered in a later batch, never the one being processed.
pub trait MutationObserver {
	fn on_mutations(&mut self, document: &mut Document, batch: ChangeBatch);
}

impl<F> MutationObserver for F
where F: FnMut(&mut Document, ChangeBatch)
{
	fn on_mutations(&mut self, document: &mut Document, batch: ChangeBatch) {
		self(document, batch)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "observer-{}", self.0)
	}
}

struct ObserverEntry {
	target: NodeId,
	options: ObserveOptions,
	queue: Vec<MutationRecord>,
	/// Nodes removed from the observed subtree since the last delivery.
	/// Changes below them are still reported until then.
	transient: Vec<NodeId>,
	/// `None` while the observer is being notified
	callback: Option<Box<dyn MutationObserver>>,
}

impl ObserverEntry {
	fn is_interested(&self, ancestors: &[NodeId]) -> bool {
		ancestors.iter().enumerate().any(|(depth, node)| {
			(*node == self.target && (depth == 0 || self.options.subtree))
				|| (self.options.subtree && self.transient.contains(node))
		})
	}
}

/// Registered observers keyed by creation order
#[derive(Default)]
pub(crate) struct ObserverRegistry {
	next_id: u64,
	entries: BTreeMap<ObserverId, ObserverEntry>,
}

impl ObserverRegistry {
	pub(crate) fn register(
		&mut self, target: NodeId, options: ObserveOptions, callback: Box<dyn MutationObserver>,
	) -> ObserverId {
		let id = ObserverId(self.next_id);
		self.next_id += 1;
		self.entries.insert(
			id,
			ObserverEntry {
				target,
				options,
				queue: Vec::new(),
				transient: Vec::new(),
				callback: Some(callback),
			},
		);
		id
	}

	pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
		self.entries.remove(&id).is_some()
	}

	pub(crate) fn contains(&self, id: ObserverId) -> bool {
		self.entries.contains_key(&id)
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.len()
	}

	/// Queue `record` for every observer registered on one of `ancestors`
	/// (the target first, then its ancestors up to the root), or watching a
	/// subtree one of them was removed from since that observer's last delivery.
	pub(crate) fn queue(&mut self, record: &MutationRecord, ancestors: &[NodeId]) {
		for entry in self.entries.values_mut() {
			if !entry.is_interested(ancestors) {
				continue;
			}
			if entry.options.subtree {
				for removed in &record.removed_nodes {
					if !entry.transient.contains(removed) {
						entry.transient.push(*removed);
					}
				}
			}
			if !entry.options.accepts(record) {
				continue;
			}

			let mut record = record.clone();
			if !entry.options.wants_old_value(record.kind) {
				record.old_value = None;
			}
			entry.queue.push(record);
		}
	}

	pub(crate) fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
		self.entries
			.get_mut(&id)
			.map(|entry| std::mem::take(&mut entry.queue))
			.unwrap_or_default()
	}

	pub(crate) fn has_pending(&self) -> bool {
		self.entries.values().any(|entry| !entry.queue.is_empty())
	}

	/// Observers with queued records that are not currently being notified
	pub(crate) fn ready(&self) -> Vec<ObserverId> {
		self.entries
			.iter()
			.filter(|(_, entry)| !entry.queue.is_empty() && entry.callback.is_some())
			.map(|(id, _)| *id)
			.collect()
	}

	pub(crate) fn checkout(
		&mut self, id: ObserverId,
	) -> Option<(Vec<MutationRecord>, Box<dyn MutationObserver>)> {
		let entry = self.entries.get_mut(&id)?;
		if entry.queue.is_empty() {
			return None;
		}
		let callback = entry.callback.take()?;
		entry.transient.clear();
		Some((std::mem::take(&mut entry.queue), callback))
	}

	/// Hand the callback back; dropped if the observer disconnected meanwhile
	pub(crate) fn checkin(&mut self, id: ObserverId, callback: Box<dyn MutationObserver>) {
		if let Some(entry) = self.entries.get_mut(&id) {
			entry.callback = Some(callback);
		}
	}
}

impl fmt::Debug for ObserverRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObserverRegistry")
			.field("observers", &self.entries.len())
			.field("next_id", &self.next_id)
			.finish()
	}
}

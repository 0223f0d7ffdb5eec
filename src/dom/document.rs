use crate::dom::mutation::{
	ChangeBatch, MutationObserver, MutationRecord, ObserveOptions, ObserverId, ObserverRegistry,
};
use crate::dom::{DomError, ElementData, Node, NodeId, NodeKind};
use crate::selector::Selector;
use tracing::{debug, trace};

/// An arena-backed document tree.
///
/// Nodes are created detached and live as long as the document; removing a
/// node from the tree only unlinks it, so its [`NodeId`] stays valid and the
/// node can be inserted again.
#[derive(Debug)]
pub struct Document {
	nodes: Vec<Node>,
	root: NodeId,
	observers: ObserverRegistry,
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl Document {
	pub fn new() -> Self {
		Self {
			nodes: vec![Node::new(NodeKind::Document)],
			root: NodeId(0),
			observers: ObserverRegistry::default(),
		}
	}

	pub fn root(&self) -> NodeId {
		self.root
	}

	/// Total number of nodes ever created, attached or not
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn get(&self, id: NodeId) -> Option<&Node> {
		self.nodes.get(id.0)
	}

	pub fn node(&self, id: NodeId) -> Result<&Node, DomError> {
		self.nodes.get(id.0).ok_or(DomError::UnknownNode { node: id })
	}

	fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
		self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode { node: id })
	}

	fn push(&mut self, kind: NodeKind) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(Node::new(kind));
		id
	}

	// Creation

	pub fn create_element(&mut self, tag: &str) -> Result<NodeId, DomError> {
		validate_name(tag)?;
		Ok(self.push(NodeKind::Element(ElementData::new(tag))))
	}

	pub fn create_element_with<'a, I>(&mut self, tag: &str, attributes: I) -> Result<NodeId, DomError>
	where I: IntoIterator<Item = (&'a str, &'a str)> {
		validate_name(tag)?;
		let mut element = ElementData::new(tag);
		for (name, value) in attributes {
			validate_name(name)?;
			element.set_attribute(name, value);
		}
		Ok(self.push(NodeKind::Element(element)))
	}

	pub fn create_text(&mut self, data: &str) -> NodeId {
		self.push(NodeKind::Text(data.to_string()))
	}

	// Queries

	pub fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.get(id).and_then(|node| node.parent)
	}

	pub fn children(&self, id: NodeId) -> &[NodeId] {
		self.get(id).map(|node| node.children.as_slice()).unwrap_or_default()
	}

	pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
		self.children(id).first().copied()
	}

	fn sibling_at(&self, id: NodeId, offset: isize) -> Option<NodeId> {
		let siblings = self.children(self.parent(id)?);
		let index = siblings.iter().position(|child| *child == id)?;
		let target = index.checked_add_signed(offset)?;
		siblings.get(target).copied()
	}

	pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
		self.sibling_at(id, 1)
	}

	pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
		self.sibling_at(id, -1)
	}

	pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
		let mut cursor = self.previous_sibling(id);
		while let Some(sibling) = cursor {
			if self.is_element(sibling) {
				return Some(sibling);
			}
			cursor = self.previous_sibling(sibling);
		}
		None
	}

	pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
		let mut cursor = self.next_sibling(id);
		while let Some(sibling) = cursor {
			if self.is_element(sibling) {
				return Some(sibling);
			}
			cursor = self.next_sibling(sibling);
		}
		None
	}

	pub fn is_element(&self, id: NodeId) -> bool {
		self.get(id).is_some_and(Node::is_element)
	}

	pub fn element(&self, id: NodeId) -> Option<&ElementData> {
		self.get(id).and_then(Node::as_element)
	}

	pub fn tag_name(&self, id: NodeId) -> Option<&str> {
		self.element(id).map(|element| element.tag.as_str())
	}

	pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
		self.element(id).and_then(|element| element.attribute(name))
	}

	pub fn has_class(&self, id: NodeId, class_name: &str) -> bool {
		self.element(id).is_some_and(|element| element.has_class(class_name))
	}

	/// Whether `node` is `ancestor` or one of its descendants
	pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
		let mut cursor = Some(node);
		while let Some(current) = cursor {
			if current == ancestor {
				return true;
			}
			cursor = self.parent(current);
		}
		false
	}

	pub fn is_connected(&self, id: NodeId) -> bool {
		self.contains(self.root, id)
	}

	/// `id` followed by its parent, grandparent and so on
	pub fn inclusive_ancestors(&self, id: NodeId) -> Vec<NodeId> {
		let mut chain = Vec::new();
		let mut cursor = self.get(id).map(|_| id);
		while let Some(current) = cursor {
			chain.push(current);
			cursor = self.parent(current);
		}
		chain
	}

	/// `id` and all of its descendants in pre-order
	pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
		let stack = if self.get(id).is_some() { vec![id] } else { Vec::new() };
		Descendants { document: self, stack }
	}

	/// Every connected element in document order
	pub fn elements(&self) -> Vec<NodeId> {
		self.descendants(self.root)
			.filter(|id| self.is_element(*id))
			.collect()
	}

	pub fn text_content(&self, id: NodeId) -> String {
		self.descendants(id)
			.filter_map(|node| match self.get(node).map(Node::kind) {
				Some(NodeKind::Text(data)) => Some(data.as_str()),
				_ => None,
			})
			.collect()
	}

	pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
		selector.matches(self, id)
	}

	pub fn query_selector_all(&self, selector: &Selector) -> Vec<NodeId> {
		self.descendants(self.root)
			.filter(|id| selector.matches(self, *id))
			.collect()
	}

	pub fn query_selector(&self, selector: &Selector) -> Option<NodeId> {
		self.descendants(self.root).find(|id| selector.matches(self, *id))
	}

	// Tree mutation

	pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
		self.insert_before(parent, child, None)
	}

	/// Insert `child` into `parent` before `reference`, or at the end.
	///
	/// A child that is already in a tree is removed from its old parent first,
	/// which produces its own record.
	pub fn insert_before(
		&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>,
	) -> Result<NodeId, DomError> {
		self.ensure_insertion_valid(parent, child)?;
		if let Some(reference) = reference {
			if self.parent(reference) != Some(parent) {
				return Err(DomError::NotFound { parent, child: reference });
			}
		}

		// Inserting before itself means inserting before its next sibling
		let reference = match reference {
			Some(reference) if reference == child => self.next_sibling(child),
			other => other,
		};

		if self.parent(child).is_some() {
			self.detach(child)?;
		}

		let children = &mut self.node_mut(parent)?.children;
		let index = match reference {
			Some(reference) => children
				.iter()
				.position(|node| *node == reference)
				.ok_or(DomError::NotFound { parent, child: reference })?,
			None => children.len(),
		};
		children.insert(index, child);
		self.node_mut(child)?.parent = Some(parent);

		let previous_sibling = self.previous_sibling(child);
		let next_sibling = self.next_sibling(child);
		trace!("Inserted {} into {}", child, parent);
		self.queue_record(MutationRecord::child_list(
			parent,
			vec![child],
			Vec::new(),
			previous_sibling,
			next_sibling,
		));
		Ok(child)
	}

	pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
		self.node(parent)?;
		self.node(child)?;
		if self.parent(child) != Some(parent) {
			return Err(DomError::NotFound { parent, child });
		}
		self.detach(child)?;
		Ok(child)
	}

	/// Unlink `id` from its parent; a detached node is left alone
	pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
		self.node(id)?;
		if self.parent(id).is_some() {
			self.detach(id)?;
		}
		Ok(())
	}

	/// Replace `old` with `new` in one record
	pub fn replace_child(
		&mut self, parent: NodeId, new: NodeId, old: NodeId,
	) -> Result<NodeId, DomError> {
		self.ensure_insertion_valid(parent, new)?;
		if self.parent(old) != Some(parent) {
			return Err(DomError::NotFound { parent, child: old });
		}
		if new == old {
			return Ok(old);
		}

		if self.parent(new).is_some() {
			self.detach(new)?;
		}

		let previous_sibling = self.previous_sibling(old);
		let next_sibling = self.next_sibling(old);
		let children = &mut self.node_mut(parent)?.children;
		let index = children
			.iter()
			.position(|node| *node == old)
			.ok_or(DomError::NotFound { parent, child: old })?;
		children[index] = new;
		self.node_mut(old)?.parent = None;
		self.node_mut(new)?.parent = Some(parent);

		self.queue_record(MutationRecord::child_list(
			parent,
			vec![new],
			vec![old],
			previous_sibling,
			next_sibling,
		));
		Ok(old)
	}

	/// Set an attribute. A record is queued even if the value is unchanged.
	pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
		validate_name(name)?;
		let element = self
			.node_mut(id)?
			.as_element_mut()
			.ok_or(DomError::NotAnElement { node: id })?;
		let old_value = element.set_attribute(name, value);
		self.queue_record(MutationRecord::attributes(id, name, old_value));
		Ok(())
	}

	/// Remove an attribute, returning whether it was present
	pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool, DomError> {
		let element = self
			.node_mut(id)?
			.as_element_mut()
			.ok_or(DomError::NotAnElement { node: id })?;
		match element.remove_attribute(name) {
			Some(old_value) => {
				self.queue_record(MutationRecord::attributes(id, name, Some(old_value)));
				Ok(true)
			}
			None => Ok(false),
		}
	}

	/// Toggle a class token, returning whether the class is now present
	pub fn toggle_class(&mut self, id: NodeId, class_name: &str) -> Result<bool, DomError> {
		validate_name(class_name)?;
		let element = self.element(id).ok_or(DomError::NotAnElement { node: id })?;
		let present = element.has_class(class_name);
		let mut classes: Vec<&str> = element.classes().filter(|c| *c != class_name).collect();
		if !present {
			classes.push(class_name);
		}
		let value = classes.join(" ");
		self.set_attribute(id, "class", &value)?;
		Ok(!present)
	}

	pub fn set_text(&mut self, id: NodeId, data: &str) -> Result<(), DomError> {
		let old_value = match &mut self.node_mut(id)?.kind {
			NodeKind::Text(text) => std::mem::replace(text, data.to_string()),
			_ => return Err(DomError::NotText { node: id }),
		};
		self.queue_record(MutationRecord::character_data(id, old_value));
		Ok(())
	}

	fn ensure_insertion_valid(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
		let parent_node = self.node(parent)?;
		let child_node = self.node(child)?;
		if matches!(parent_node.kind, NodeKind::Text(_)) {
			return Err(DomError::hierarchy(parent, child, "text nodes cannot have children"));
		}
		if matches!(child_node.kind, NodeKind::Document) {
			return Err(DomError::hierarchy(parent, child, "the document cannot be inserted"));
		}
		if self.contains(child, parent) {
			return Err(DomError::hierarchy(parent, child, "node is an inclusive ancestor of parent"));
		}
		Ok(())
	}

	fn detach(&mut self, child: NodeId) -> Result<(), DomError> {
		let Some(parent) = self.parent(child) else {
			return Ok(());
		};
		let previous_sibling = self.previous_sibling(child);
		let next_sibling = self.next_sibling(child);

		self.node_mut(parent)?.children.retain(|node| *node != child);
		self.node_mut(child)?.parent = None;

		trace!("Removed {} from {}", child, parent);
		self.queue_record(MutationRecord::child_list(
			parent,
			Vec::new(),
			vec![child],
			previous_sibling,
			next_sibling,
		));
		Ok(())
	}

	fn queue_record(&mut self, record: MutationRecord) {
		if self.observers.is_empty() {
			return;
		}
		let ancestors = self.inclusive_ancestors(record.target);
		self.observers.queue(&record, &ancestors);
	}

	// Observation

	/// Register `observer` for changes on `target` (and its subtree if asked).
	pub fn observe<O>(
		&mut self, target: NodeId, options: ObserveOptions, observer: O,
	) -> Result<ObserverId, DomError>
	where O: MutationObserver + 'static {
		self.node(target)?;
		let options = options.normalized()?;
		let id = self.observers.register(target, options, Box::new(observer));
		debug!("Registered {} on {}", id, target);
		Ok(id)
	}

	/// Stop delivering to `id` and drop its queued records.
	///
	/// Safe to call from inside the observer's own callback.
	pub fn disconnect(&mut self, id: ObserverId) -> bool {
		let removed = self.observers.remove(id);
		if removed {
			debug!("Disconnected {}", id);
		}
		removed
	}

	pub fn is_observing(&self, id: ObserverId) -> bool {
		self.observers.contains(id)
	}

	pub fn observer_count(&self) -> usize {
		self.observers.len()
	}

	/// Drain the records queued for `id` without delivering them
	pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
		self.observers.take_records(id)
	}

	pub fn has_pending_mutations(&self) -> bool {
		self.observers.has_pending()
	}

	/// Deliver queued records, one batch per observer, until none remain.
	///
	/// Observers run in registration order. Records queued by an observer
	/// callback are delivered in a later round of the same call. Returns the
	/// number of batches delivered.
	pub fn deliver_mutations(&mut self) -> usize {
		let mut delivered = 0;
		loop {
			let ready = self.observers.ready();
			if ready.is_empty() {
				break;
			}
			for id in ready {
				let Some((records, mut callback)) = self.observers.checkout(id) else {
					continue;
				};
				debug!("Delivering {} mutation records to {}", records.len(), id);
				callback.on_mutations(self, ChangeBatch::new(records));
				self.observers.checkin(id, callback);
				delivered += 1;
			}
		}
		delivered
	}
}

/// Pre-order walk over a node and its descendants
#[derive(Debug)]
pub struct Descendants<'a> {
	document: &'a Document,
	stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
	type Item = NodeId;

	fn next(&mut self) -> Option<NodeId> {
		let current = self.stack.pop()?;
		self.stack
			.extend(self.document.children(current).iter().rev().copied());
		Some(current)
	}
}

fn validate_name(name: &str) -> Result<(), DomError> {
	let invalid = name.is_empty()
		|| name
			.chars()
			.any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '/' | '='));
	if invalid {
		return Err(DomError::InvalidCharacter { name: name.to_string() });
	}
	Ok(())
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a node inside a [`Document`](crate::dom::Document) arena.
///
/// Ids are never reused, so two equal ids always refer to the same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
	pub fn index(self) -> usize {
		self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	pub name: String,
	pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementData {
	/// Lowercased tag name
	pub tag: String,
	/// Attributes in insertion order
	pub attributes: Vec<Attribute>,
}

impl ElementData {
	pub fn new(tag: &str) -> Self {
		Self {
			tag: tag.to_ascii_lowercase(),
			attributes: Vec::new(),
		}
	}

	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|attr| attr.name == name)
			.map(|attr| attr.value.as_str())
	}

	/// Whitespace-separated tokens of the `class` attribute
	pub fn classes(&self) -> impl Iterator<Item = &str> {
		self.attribute("class")
			.unwrap_or_default()
			.split_ascii_whitespace()
	}

	pub fn has_class(&self, class_name: &str) -> bool {
		self.classes().any(|class| class == class_name)
	}

	/// Set an attribute, returning the previous value if there was one
	pub(crate) fn set_attribute(&mut self, name: &str, value: &str) -> Option<String> {
		match self.attributes.iter_mut().find(|attr| attr.name == name) {
			Some(attr) => Some(std::mem::replace(&mut attr.value, value.to_string())),
			None => {
				self.attributes.push(Attribute {
					name: name.to_string(),
					value: value.to_string(),
				});
				None
			}
		}
	}

	pub(crate) fn remove_attribute(&mut self, name: &str) -> Option<String> {
		let index = self.attributes.iter().position(|attr| attr.name == name)?;
		Some(self.attributes.remove(index).value)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
	Document,
	Element(ElementData),
	Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
	pub(crate) parent: Option<NodeId>,
	pub(crate) children: Vec<NodeId>,
	pub(crate) kind: NodeKind,
}

impl Node {
	pub(crate) fn new(kind: NodeKind) -> Self {
		Self {
			parent: None,
			children: Vec::new(),
			kind,
		}
	}

	pub fn kind(&self) -> &NodeKind {
		&self.kind
	}

	pub fn parent(&self) -> Option<NodeId> {
		self.parent
	}

	pub fn children(&self) -> &[NodeId] {
		&self.children
	}

	pub fn is_element(&self) -> bool {
		matches!(self.kind, NodeKind::Element(_))
	}

	pub fn as_element(&self) -> Option<&ElementData> {
		match &self.kind {
			NodeKind::Element(element) => Some(element),
			_ => None,
		}
	}

	pub(crate) fn as_element_mut(&mut self) -> Option<&mut ElementData> {
		match &mut self.kind {
			NodeKind::Element(element) => Some(element),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_element_tag_is_lowercased() {
		let element = ElementData::new("DIV");
		assert_eq!(element.tag, "div");
	}

	#[test]
	fn test_set_attribute_returns_previous_value() {
		let mut element = ElementData::new("div");
		assert_eq!(element.set_attribute("class", "red"), None);
		assert_eq!(element.set_attribute("class", "blue"), Some("red".to_string()));
		assert_eq!(element.attribute("class"), Some("blue"));
		assert_eq!(element.attributes.len(), 1);
	}

	#[test]
	fn test_class_tokens() {
		let mut element = ElementData::new("div");
		element.set_attribute("class", "  red\tbig  ");
		assert!(element.has_class("red"));
		assert!(element.has_class("big"));
		assert!(!element.has_class("re"));

		assert_eq!(element.remove_attribute("class"), Some("  red\tbig  ".to_string()));
		assert!(!element.has_class("red"));
	}
}

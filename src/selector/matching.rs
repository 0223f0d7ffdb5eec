//! Matching parsed selectors against document elements, right to left

use crate::dom::{Document, NodeId, NodeKind};
use crate::selector::parser::{
	AttributeOperator, AttributeSelector, Combinator, ComplexSelector, CompoundSelector,
	PseudoClass,
};

impl ComplexSelector {
	pub(crate) fn matches(&self, document: &Document, node: NodeId) -> bool {
		match self.parts.len() {
			0 => false,
			len => self.matches_part(document, node, len - 1),
		}
	}

	fn matches_part(&self, document: &Document, node: NodeId, index: usize) -> bool {
		let part = &self.parts[index];
		if !part.compound.matches(document, node) {
			return false;
		}
		let Some(combinator) = part.combinator else {
			return true;
		};

		match combinator {
			Combinator::Child => document
				.parent(node)
				.is_some_and(|parent| self.matches_part(document, parent, index - 1)),
			Combinator::Descendant => {
				let mut cursor = document.parent(node);
				while let Some(ancestor) = cursor {
					if self.matches_part(document, ancestor, index - 1) {
						return true;
					}
					cursor = document.parent(ancestor);
				}
				false
			}
			Combinator::NextSibling => document
				.previous_element_sibling(node)
				.is_some_and(|sibling| self.matches_part(document, sibling, index - 1)),
			Combinator::SubsequentSibling => {
				let mut cursor = document.previous_element_sibling(node);
				while let Some(sibling) = cursor {
					if self.matches_part(document, sibling, index - 1) {
						return true;
					}
					cursor = document.previous_element_sibling(sibling);
				}
				false
			}
		}
	}
}

impl CompoundSelector {
	fn matches(&self, document: &Document, node: NodeId) -> bool {
		let Some(element) = document.element(node) else {
			return false;
		};

		if let Some(tag) = &self.tag {
			if element.tag != *tag {
				return false;
			}
		}

		self.ids
			.iter()
			.all(|id| element.attribute("id") == Some(id.as_str()))
			&& self.classes.iter().all(|class| element.has_class(class))
			&& self
				.attributes
				.iter()
				.all(|attr| attr.matches(element.attribute(&attr.name)))
			&& self
				.pseudo_classes
				.iter()
				.all(|pseudo| pseudo.matches(document, node))
	}
}

impl AttributeSelector {
	fn matches(&self, actual: Option<&str>) -> bool {
		let Some(actual) = actual else {
			return false;
		};
		let expected = self.value.as_str();
		match self.operator {
			AttributeOperator::Exists => true,
			AttributeOperator::Equals => actual == expected,
			AttributeOperator::Includes => {
				!expected.is_empty() && actual.split_ascii_whitespace().any(|token| token == expected)
			}
			AttributeOperator::DashMatch => {
				actual == expected
					|| actual
						.strip_prefix(expected)
						.is_some_and(|rest| rest.starts_with('-'))
			}
			AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(expected),
			AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(expected),
			AttributeOperator::Substring => !expected.is_empty() && actual.contains(expected),
		}
	}
}

impl PseudoClass {
	fn matches(&self, document: &Document, node: NodeId) -> bool {
		match self {
			PseudoClass::FirstChild => document.previous_element_sibling(node).is_none(),
			PseudoClass::LastChild => document.next_element_sibling(node).is_none(),
			PseudoClass::OnlyChild => {
				document.previous_element_sibling(node).is_none()
					&& document.next_element_sibling(node).is_none()
			}
			PseudoClass::Empty => document.children(node).iter().all(|child| {
				matches!(
					document.get(*child).map(|n| n.kind()),
					Some(NodeKind::Text(data)) if data.is_empty()
				)
			}),
			PseudoClass::Not(inner) => !inner.iter().any(|complex| complex.matches(document, node)),
		}
	}
}

//! CSS-style selectors and the predicate abstraction watches are built on
//!
//! Supported: type, universal, `#id`, `.class`, attribute selectors
//! (`[a]`, `=`, `~=`, `|=`, `^=`, `$=`, `*=`), `:first-child`, `:last-child`,
//! `:only-child`, `:empty`, `:not(...)`, the four combinators and `,` groups.

pub mod error;
mod matching;
mod parser;

pub use error::SelectorError;

use crate::dom::{Document, NodeId};
use parser::ComplexSelector;
use std::fmt;
use std::str::FromStr;

/// A parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
	source: String,
	groups: Vec<ComplexSelector>,
}

impl Selector {
	pub fn parse(source: &str) -> Result<Self, SelectorError> {
		let groups = parser::parse_selector_list(source)?;
		Ok(Self {
			source: source.trim().to_string(),
			groups,
		})
	}

	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// Whether `node` is an element matched by any selector in the list
	pub fn matches(&self, document: &Document, node: NodeId) -> bool {
		self.groups
			.iter()
			.any(|complex| complex.matches(document, node))
	}
}

impl FromStr for Selector {
	type Err = SelectorError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl fmt::Display for Selector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.source)
	}
}

/// Decides whether an element is of interest to a watch.
///
/// Implemented for [`Selector`] and for any `Fn(&Document, NodeId) -> bool`.
pub trait ElementPredicate {
	fn matches(&self, document: &Document, element: NodeId) -> bool;

	/// Short description used in log output
	fn describe(&self) -> String {
		"<predicate>".to_string()
	}
}

impl ElementPredicate for Selector {
	fn matches(&self, document: &Document, element: NodeId) -> bool {
		Selector::matches(self, document, element)
	}

	fn describe(&self) -> String {
		self.source.clone()
	}
}

impl<F> ElementPredicate for F
where F: Fn(&Document, NodeId) -> bool
{
	fn matches(&self, document: &Document, element: NodeId) -> bool {
		self(document, element)
	}
}

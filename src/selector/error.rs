//! Selector parsing errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
	#[error("Empty selector")]
	Empty,

	#[error("Unexpected character {found:?} at position {position} in selector {selector:?}")]
	UnexpectedCharacter {
		selector: String,
		position: usize,
		found: char,
	},

	#[error("Unexpected end of selector {selector:?}")]
	UnexpectedEnd { selector: String },

	#[error("Unsupported pseudo-class :{name} in selector {selector:?}")]
	UnsupportedPseudoClass { selector: String, name: String },
}

impl SelectorError {
	/// The selector source text the error refers to, if any
	pub fn selector(&self) -> Option<&str> {
		match self {
			SelectorError::Empty => None,
			SelectorError::UnexpectedCharacter { selector, .. }
			| SelectorError::UnexpectedEnd { selector }
			| SelectorError::UnsupportedPseudoClass { selector, .. } => Some(selector),
		}
	}
}

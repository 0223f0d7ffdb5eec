//! Recursive-descent parser for the supported CSS subset

use crate::selector::error::SelectorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
	/// `a b`
	Descendant,
	/// `a > b`
	Child,
	/// `a + b`
	NextSibling,
	/// `a ~ b`
	SubsequentSibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttributeOperator {
	Exists,
	Equals,
	/// `~=`
	Includes,
	/// `|=`
	DashMatch,
	/// `^=`
	Prefix,
	/// `$=`
	Suffix,
	/// `*=`
	Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttributeSelector {
	pub name: String,
	pub operator: AttributeOperator,
	pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PseudoClass {
	FirstChild,
	LastChild,
	OnlyChild,
	Empty,
	Not(Vec<ComplexSelector>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CompoundSelector {
	pub tag: Option<String>,
	pub universal: bool,
	pub ids: Vec<String>,
	pub classes: Vec<String>,
	pub attributes: Vec<AttributeSelector>,
	pub pseudo_classes: Vec<PseudoClass>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ComplexPart {
	/// Relation to the part on the left; `None` for the leftmost part
	pub combinator: Option<Combinator>,
	pub compound: CompoundSelector,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ComplexSelector {
	pub parts: Vec<ComplexPart>,
}

/// Parse a comma-separated selector list
pub(crate) fn parse_selector_list(source: &str) -> Result<Vec<ComplexSelector>, SelectorError> {
	if source.trim().is_empty() {
		return Err(SelectorError::Empty);
	}
	let mut parser = Parser::new(source);
	parser.parse_list(false)
}

fn is_ident_char(c: char) -> bool {
	c.is_alphanumeric() || c == '_' || c == '-'
}

struct Parser<'a> {
	source: &'a str,
	chars: Vec<char>,
	pos: usize,
}

impl<'a> Parser<'a> {
	fn new(source: &'a str) -> Self {
		Self {
			source,
			chars: source.chars().collect(),
			pos: 0,
		}
	}

	fn peek(&self) -> Option<char> {
		self.chars.get(self.pos).copied()
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.pos += 1;
		Some(c)
	}

	/// Returns whether any whitespace was consumed
	fn skip_whitespace(&mut self) -> bool {
		let start = self.pos;
		while self.peek().is_some_and(char::is_whitespace) {
			self.pos += 1;
		}
		self.pos > start
	}

	fn error_here(&self) -> SelectorError {
		match self.peek() {
			Some(found) => SelectorError::UnexpectedCharacter {
				selector: self.source.to_string(),
				position: self.pos,
				found,
			},
			None => SelectorError::UnexpectedEnd { selector: self.source.to_string() },
		}
	}

	fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
		if self.peek() == Some(expected) {
			self.pos += 1;
			Ok(())
		} else {
			Err(self.error_here())
		}
	}

	fn parse_list(&mut self, nested: bool) -> Result<Vec<ComplexSelector>, SelectorError> {
		let mut list = Vec::new();
		loop {
			self.skip_whitespace();
			list.push(self.parse_complex()?);
			self.skip_whitespace();
			match self.peek() {
				Some(',') => {
					self.pos += 1;
				}
				Some(')') if nested => return Ok(list),
				None if !nested => return Ok(list),
				_ => return Err(self.error_here()),
			}
		}
	}

	fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
		let mut parts = vec![ComplexPart {
			combinator: None,
			compound: self.parse_compound()?,
		}];

		loop {
			let had_whitespace = self.skip_whitespace();
			let combinator = match self.peek() {
				Some('>') => Combinator::Child,
				Some('+') => Combinator::NextSibling,
				Some('~') => Combinator::SubsequentSibling,
				Some(',') | Some(')') | None => break,
				Some(_) if had_whitespace => Combinator::Descendant,
				Some(_) => return Err(self.error_here()),
			};
			if combinator != Combinator::Descendant {
				self.pos += 1;
				self.skip_whitespace();
			}
			parts.push(ComplexPart {
				combinator: Some(combinator),
				compound: self.parse_compound()?,
			});
		}

		Ok(ComplexSelector { parts })
	}

	fn parse_compound(&mut self) -> Result<CompoundSelector, SelectorError> {
		let mut compound = CompoundSelector::default();
		let mut empty = true;

		match self.peek() {
			Some('*') => {
				self.pos += 1;
				compound.universal = true;
				empty = false;
			}
			Some(c) if is_ident_char(c) => {
				compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
				empty = false;
			}
			_ => {}
		}

		loop {
			match self.peek() {
				Some('#') => {
					self.pos += 1;
					compound.ids.push(self.parse_ident()?);
				}
				Some('.') => {
					self.pos += 1;
					compound.classes.push(self.parse_ident()?);
				}
				Some('[') => compound.attributes.push(self.parse_attribute()?),
				Some(':') => compound.pseudo_classes.push(self.parse_pseudo_class()?),
				_ => break,
			}
			empty = false;
		}

		if empty {
			return Err(self.error_here());
		}
		Ok(compound)
	}

	fn parse_ident(&mut self) -> Result<String, SelectorError> {
		let start = self.pos;
		while self.peek().is_some_and(is_ident_char) {
			self.pos += 1;
		}
		if self.pos == start {
			return Err(self.error_here());
		}
		Ok(self.chars[start..self.pos].iter().collect())
	}

	fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
		self.expect('[')?;
		self.skip_whitespace();
		let name = self.parse_ident()?.to_ascii_lowercase();
		self.skip_whitespace();

		let operator = match self.peek() {
			Some(']') => {
				self.pos += 1;
				return Ok(AttributeSelector {
					name,
					operator: AttributeOperator::Exists,
					value: String::new(),
				});
			}
			Some('=') => AttributeOperator::Equals,
			Some('~') => AttributeOperator::Includes,
			Some('|') => AttributeOperator::DashMatch,
			Some('^') => AttributeOperator::Prefix,
			Some('$') => AttributeOperator::Suffix,
			Some('*') => AttributeOperator::Substring,
			_ => return Err(self.error_here()),
		};
		self.pos += 1;
		if operator != AttributeOperator::Equals {
			self.expect('=')?;
		}

		self.skip_whitespace();
		let value = self.parse_attribute_value()?;
		self.skip_whitespace();
		self.expect(']')?;

		Ok(AttributeSelector { name, operator, value })
	}

	fn parse_attribute_value(&mut self) -> Result<String, SelectorError> {
		let quote = match self.peek() {
			Some(q @ ('"' | '\'')) => q,
			_ => return self.parse_ident(),
		};
		self.pos += 1;

		let mut value = String::new();
		loop {
			match self.bump() {
				Some(c) if c == quote => return Ok(value),
				Some('\\') => match self.bump() {
					Some(escaped) => value.push(escaped),
					None => return Err(self.error_here()),
				},
				Some(c) => value.push(c),
				None => return Err(self.error_here()),
			}
		}
	}

	fn parse_pseudo_class(&mut self) -> Result<PseudoClass, SelectorError> {
		self.expect(':')?;
		let name = self.parse_ident()?.to_ascii_lowercase();
		match name.as_str() {
			"first-child" => Ok(PseudoClass::FirstChild),
			"last-child" => Ok(PseudoClass::LastChild),
			"only-child" => Ok(PseudoClass::OnlyChild),
			"empty" => Ok(PseudoClass::Empty),
			"not" => {
				self.expect('(')?;
				let inner = self.parse_list(true)?;
				self.expect(')')?;
				Ok(PseudoClass::Not(inner))
			}
			_ => Err(SelectorError::UnsupportedPseudoClass {
				selector: self.source.to_string(),
				name,
			}),
		}
	}
}

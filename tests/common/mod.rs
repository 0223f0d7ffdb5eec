//! Common test utilities for the element-watcher library

#![allow(dead_code)]

use element_watcher::{Document, NodeId};
use std::cell::RefCell;
use std::rc::Rc;

pub type Seen = Rc<RefCell<Vec<NodeId>>>;

/// A callback that records every reported node, and the list it records into
pub fn recorder() -> (Seen, impl FnMut(&mut Document, NodeId) + 'static) {
	let seen: Seen = Rc::default();
	let sink = Rc::clone(&seen);
	(seen, move |_: &mut Document, node: NodeId| sink.borrow_mut().push(node))
}

/// Create a detached `div.red` with the given id
pub fn red_div(doc: &mut Document, id: &str) -> NodeId {
	doc.create_element_with("div", [("class", "red"), ("id", id)])
		.expect("Failed to create element")
}

/// Create an element and append it under `parent`
pub fn append(doc: &mut Document, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
	let node = doc
		.create_element_with(tag, attributes.iter().copied())
		.expect("Failed to create element");
	doc.append_child(parent, node).expect("Failed to append element");
	node
}

/// The `id` attributes of the recorded nodes
pub fn ids(doc: &Document, seen: &Seen) -> Vec<String> {
	seen.borrow()
		.iter()
		.map(|node| doc.attribute(*node, "id").unwrap_or_default().to_string())
		.collect()
}

/// A small fixture: `main > (section#s1 > p.note#n1, section#s2 > p#n2)`
pub fn sample_document() -> Document {
	let mut doc = Document::new();
	let root = doc.root();
	let main = append(&mut doc, root, "main", &[]);
	let s1 = append(&mut doc, main, "section", &[("id", "s1")]);
	append(&mut doc, s1, "p", &[("class", "note"), ("id", "n1")]);
	let s2 = append(&mut doc, main, "section", &[("id", "s2")]);
	append(&mut doc, s2, "p", &[("id", "n2")]);
	doc
}

//! The four preset entry points over [`watch`]
//!
//! ```
//! use element_watcher::{detect_new_elements, Document};
//!
//! let mut doc = Document::new();
//! let handle = detect_new_elements(&mut doc, "div.red", |doc, element| {
//! 	println!("Another div with class red: {:?}", doc.attribute(element, "id"));
//! })
//! .unwrap();
//!
//! let div = doc.create_element_with("div", [("class", "red"), ("id", "B")]).unwrap();
//! doc.append_child(doc.root(), div).unwrap();
//! doc.deliver_mutations();
//! assert_eq!(handle.notified(), 1);
//! ```

use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::selector::Selector;
use crate::watch::{watch, DetectMode, WatchHandle};

fn detect<C>(document: &mut Document, selector: &str, mode: DetectMode, callback: C) -> Result<WatchHandle>
where C: FnMut(&mut Document, NodeId) + 'static {
	let selector = Selector::parse(selector)?;
	watch(document, selector, mode.options(), callback)
}

/// Report elements matching `selector` as they are added or modified
pub fn detect_new_elements<C>(document: &mut Document, selector: &str, callback: C) -> Result<WatchHandle>
where C: FnMut(&mut Document, NodeId) + 'static {
	detect(document, selector, DetectMode::New, callback)
}

/// Like [`detect_new_elements`], but stop after the first element
pub fn detect_first_new_element<C>(
	document: &mut Document, selector: &str, callback: C,
) -> Result<WatchHandle>
where C: FnMut(&mut Document, NodeId) + 'static {
	detect(document, selector, DetectMode::FirstNew, callback)
}

/// Report existing matching elements now, then new ones as they appear
pub fn detect_elements<C>(document: &mut Document, selector: &str, callback: C) -> Result<WatchHandle>
where C: FnMut(&mut Document, NodeId) + 'static {
	detect(document, selector, DetectMode::ExistingAndNew, callback)
}

/// Report the first existing matching element, or else the first new one
pub fn detect_first_element<C>(document: &mut Document, selector: &str, callback: C) -> Result<WatchHandle>
where C: FnMut(&mut Document, NodeId) + 'static {
	detect(document, selector, DetectMode::FirstExistingOrNew, callback)
}

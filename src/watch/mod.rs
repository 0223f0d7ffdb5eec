//! The watch engine: report each element matching a predicate once per stay
//! in the document
//!
//! # Module Organization
//!
//! - [`config`] - Watch options, presets and configuration
//! - [`events`] - Detection records for channel consumers
//! - [`handle`] - The handle returned for every watch
//! - `engine` - Initial scan and per-batch reconciliation

pub mod config;
mod engine;
pub mod events;
pub mod handle;

pub use config::{DetectMode, WatchConfig, WatchOptions};
pub use events::Detection;
pub use handle::WatchHandle;

use crate::dom::{Document, NodeId, ObserveOptions};
use crate::error::Result;
use crate::selector::{ElementPredicate, Selector};
use engine::{EngineObserver, WatchEngine, WatchState};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Watch `document` for elements matching `predicate`.
///
/// With `include_existing` the callback runs synchronously for matching
/// elements already present, in document order, before this returns. Later
/// matches are reported from [`Document::deliver_mutations`]. The callback
/// is never invoked twice for an element until that element leaves the tree.
pub fn watch<P, C>(
	document: &mut Document, predicate: P, options: WatchOptions, callback: C,
) -> Result<WatchHandle>
where
	P: ElementPredicate + 'static,
	C: FnMut(&mut Document, NodeId) + 'static,
{
	watch_with_id(document, Uuid::new_v4(), predicate, options, callback)
}

/// Start a watch described by `config`; the selector is parsed here
pub fn start<C>(document: &mut Document, config: &WatchConfig, callback: C) -> Result<WatchHandle>
where C: FnMut(&mut Document, NodeId) + 'static {
	config.validate()?;
	let selector = Selector::parse(&config.selector)?;
	watch_with_id(document, config.watch_id, selector, config.options, callback)
}

/// Start a watch whose detections are sent through a channel
pub fn watch_channel(
	document: &mut Document, config: &WatchConfig,
) -> Result<(WatchHandle, mpsc::UnboundedReceiver<Detection>)> {
	let (tx, rx) = mpsc::unbounded_channel();
	let watch_id = config.watch_id;
	let mut sequence = 0;

	let handle = start(document, config, move |document: &mut Document, node: NodeId| {
		sequence += 1;
		let detection = Detection::new(watch_id, document, node, sequence);
		if let Err(e) = tx.send(detection) {
			warn!("Failed to send detection for watch {}: {}", watch_id, e);
		}
	})?;

	Ok((handle, rx))
}

fn watch_with_id<P, C>(
	document: &mut Document, watch_id: Uuid, predicate: P, options: WatchOptions, callback: C,
) -> Result<WatchHandle>
where
	P: ElementPredicate + 'static,
	C: FnMut(&mut Document, NodeId) + 'static,
{
	let state = Rc::new(WatchState::new(watch_id));
	info!(
		"Starting watch {} for {} (include_existing: {}, stop_after_first: {})",
		watch_id,
		predicate.describe(),
		options.include_existing,
		options.stop_after_first
	);

	let engine = Rc::new(RefCell::new(WatchEngine::new(
		predicate,
		callback,
		options,
		Rc::clone(&state),
	)));
	let backlog: Rc<RefCell<VecDeque<_>>> = Rc::default();

	// Subscribe before scanning so mutations made by scan callbacks are seen
	let observer = document.observe(
		document.root(),
		ObserveOptions::subtree_changes(),
		EngineObserver {
			engine: Rc::clone(&engine),
			backlog: Rc::clone(&backlog),
		},
	)?;
	state.attach(observer);

	if options.include_existing {
		let mut engine = engine.borrow_mut();
		engine.initial_scan(document);
		engine.drain(document, &backlog);
	}

	Ok(WatchHandle::new(state))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_invalid_selector_is_returned() {
		let mut doc = Document::new();
		let config = WatchConfig::new("div >", DetectMode::New);
		let result = start(&mut doc, &config, |_: &mut Document, _: NodeId| {});

		assert!(matches!(result, Err(crate::DetectError::Selector(_))));
		assert_eq!(doc.observer_count(), 0);
	}

	#[test]
	fn test_handle_carries_config_id() {
		let mut doc = Document::new();
		let config = WatchConfig::new("p", DetectMode::New);
		let handle = start(&mut doc, &config, |_: &mut Document, _: NodeId| {}).unwrap();

		assert_eq!(handle.id(), config.watch_id);
		assert!(handle.is_active());
		assert!(handle.subscription().is_some());
	}

	#[test]
	fn test_first_existing_match_never_subscribes_for_long() {
		let mut doc = Document::new();
		let root = doc.root();
		let p = doc.create_element("p").unwrap();
		doc.append_child(root, p).unwrap();

		let config = WatchConfig::new("p", DetectMode::FirstExistingOrNew);
		let handle = start(&mut doc, &config, |_: &mut Document, _: NodeId| {}).unwrap();

		assert!(!handle.is_active());
		assert_eq!(handle.notified(), 1);
		assert_eq!(doc.observer_count(), 0);
	}

	#[test]
	fn test_scan_callback_mutations_are_observed() {
		let mut doc = Document::new();
		let root = doc.root();
		let seed = doc.create_element_with("div", [("class", "red")]).unwrap();
		doc.append_child(root, seed).unwrap();

		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = Rc::clone(&seen);
		let handle = watch(
			&mut doc,
			Selector::parse(".red").unwrap(),
			DetectMode::ExistingAndNew.options(),
			move |doc: &mut Document, node: NodeId| {
				sink.borrow_mut().push(node);
				// Each match spawns one more, up to three
				if sink.borrow().len() < 3 {
					let next = doc.create_element_with("div", [("class", "red")]).unwrap();
					doc.append_child(node, next).unwrap();
				}
			},
		)
		.unwrap();

		assert_eq!(seen.borrow().len(), 1);
		doc.deliver_mutations();
		assert_eq!(seen.borrow().len(), 3);
		assert_eq!(handle.notified(), 3);
	}

	#[test]
	fn test_nested_delivery_during_scan_is_deferred() {
		let mut doc = Document::new();
		let root = doc.root();
		for _ in 0..2 {
			let red = doc.create_element_with("div", [("class", "red")]).unwrap();
			doc.append_child(root, red).unwrap();
		}

		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = Rc::clone(&seen);
		watch(
			&mut doc,
			Selector::parse(".red").unwrap(),
			DetectMode::ExistingAndNew.options(),
			move |doc: &mut Document, node: NodeId| {
				sink.borrow_mut().push(node);
				if sink.borrow().len() == 1 {
					let late = doc.create_element_with("p", [("class", "red")]).unwrap();
					doc.append_child(doc.root(), late).unwrap();
					doc.deliver_mutations();
				}
			},
		)
		.unwrap();

		// Both existing divs first, then the paragraph added by the callback
		let seen = seen.borrow();
		assert_eq!(seen.len(), 3);
		assert_eq!(doc.tag_name(seen[2]), Some("p"));
	}
}

use crate::dom::{ChangeBatch, Document, MutationKind, MutationObserver, NodeId, ObserverId};
use crate::selector::ElementPredicate;
use crate::watch::config::WatchOptions;
use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;
use tracing::{debug, trace};
use uuid::Uuid;

/// State shared between a running engine and its [`WatchHandle`](crate::WatchHandle)
#[derive(Debug)]
pub(crate) struct WatchState {
	pub(crate) id: Uuid,
	active: Cell<bool>,
	observer: Cell<Option<ObserverId>>,
	notified: Cell<u64>,
}

impl WatchState {
	pub(crate) fn new(id: Uuid) -> Self {
		Self {
			id,
			active: Cell::new(true),
			observer: Cell::new(None),
			notified: Cell::new(0),
		}
	}

	pub(crate) fn is_active(&self) -> bool {
		self.active.get()
	}

	pub(crate) fn notified(&self) -> u64 {
		self.notified.get()
	}

	pub(crate) fn subscription(&self) -> Option<ObserverId> {
		self.observer.get()
	}

	pub(crate) fn attach(&self, observer: ObserverId) {
		self.observer.set(Some(observer));
	}

	/// Tear the watch down; returns whether it was still active.
	/// Irreversible.
	pub(crate) fn deactivate(&self, document: &mut Document) -> bool {
		let was_active = self.active.replace(false);
		if let Some(observer) = self.observer.take() {
			document.disconnect(observer);
		}
		was_active
	}
}

/// Reconciles change batches against a predicate and the set of elements
/// already reported.
///
/// The matched set holds elements reported during their current stay in the
/// tree: removing an element (or an ancestor) makes it eligible again.
pub(crate) struct WatchEngine<P, C> {
	predicate: P,
	callback: C,
	options: WatchOptions,
	matched: HashSet<NodeId>,
	state: Rc<WatchState>,
}

impl<P, C> WatchEngine<P, C>
where
	P: ElementPredicate,
	C: FnMut(&mut Document, NodeId),
{
	pub(crate) fn new(predicate: P, callback: C, options: WatchOptions, state: Rc<WatchState>) -> Self {
		Self {
			predicate,
			callback,
			options,
			matched: HashSet::new(),
			state,
		}
	}

	/// Report every element currently in the document, in document order
	pub(crate) fn initial_scan(&mut self, document: &mut Document) {
		let elements = document.elements();
		debug!(
			"Watch {} scanning {} existing elements",
			self.state.id,
			elements.len()
		);
		for element in elements {
			if !self.check(document, element) {
				break;
			}
		}
	}

	/// Process deferred batches in arrival order
	pub(crate) fn drain(&mut self, document: &mut Document, backlog: &RefCell<VecDeque<ChangeBatch>>) {
		loop {
			let Some(batch) = backlog.borrow_mut().pop_front() else {
				break;
			};
			self.reconcile(document, batch);
		}
	}

	pub(crate) fn reconcile(&mut self, document: &mut Document, batch: ChangeBatch) {
		if !self.state.is_active() {
			return;
		}
		trace!("Watch {} reconciling {} records", self.state.id, batch.len());

		for record in batch {
			match record.kind {
				MutationKind::ChildList => {
					for removed in &record.removed_nodes {
						self.forget_subtree(document, *removed);
					}
					for added in &record.added_nodes {
						if !self.check_subtree(document, *added) {
							return;
						}
					}
				}
				MutationKind::Attributes => {
					if !self.check(document, record.target) {
						return;
					}
				}
				MutationKind::CharacterData => {}
			}
		}
	}

	/// Drop `root` and everything below it from the matched set
	fn forget_subtree(&mut self, document: &Document, root: NodeId) {
		if !document.is_element(root) {
			return;
		}
		let before = self.matched.len();
		self.matched.retain(|node| !document.contains(root, *node));
		let forgotten = before - self.matched.len();
		if forgotten > 0 {
			trace!("Watch {} forgot {} elements under {}", self.state.id, forgotten, root);
		}
	}

	/// Check `root` and its element descendants in pre-order.
	///
	/// The subtree is captured before any callback runs, so callbacks that
	/// reshape it do not change which nodes get checked here.
	fn check_subtree(&mut self, document: &mut Document, root: NodeId) -> bool {
		if !document.is_element(root) {
			return true;
		}
		let nodes: Vec<NodeId> = document.descendants(root).collect();
		for node in nodes {
			if !self.check(document, node) {
				return false;
			}
		}
		true
	}

	/// Returns whether the watch is still active afterwards
	fn check(&mut self, document: &mut Document, node: NodeId) -> bool {
		if !self.state.is_active() {
			return false;
		}
		if !document.is_element(node)
			|| self.matched.contains(&node)
			|| !self.predicate.matches(document, node)
		{
			return true;
		}

		self.matched.insert(node);
		self.state.notified.set(self.state.notified.get() + 1);
		debug!("Watch {} matched {}", self.state.id, node);
		(self.callback)(document, node);

		if self.options.stop_after_first && self.state.deactivate(document) {
			debug!("Watch {} stopped after first match", self.state.id);
		}
		self.state.is_active()
	}
}

/// Adapter registered with the document.
///
/// Batches that arrive while the engine is busy (a callback delivering
/// mutations during the initial scan) wait in the backlog and are processed
/// once the engine is free.
pub(crate) struct EngineObserver<P, C> {
	pub(crate) engine: Rc<RefCell<WatchEngine<P, C>>>,
	pub(crate) backlog: Rc<RefCell<VecDeque<ChangeBatch>>>,
}

impl<P, C> MutationObserver for EngineObserver<P, C>
where
	P: ElementPredicate,
	C: FnMut(&mut Document, NodeId),
{
	fn on_mutations(&mut self, document: &mut Document, batch: ChangeBatch) {
		self.backlog.borrow_mut().push_back(batch);
		match self.engine.try_borrow_mut() {
			Ok(mut engine) => engine.drain(document, &self.backlog),
			Err(_) => trace!("Watch engine busy, deferring batch"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::MutationRecord;
	use crate::selector::Selector;

	type Seen = Rc<RefCell<Vec<NodeId>>>;

	fn engine(
		selector: &str, options: WatchOptions,
	) -> (WatchEngine<Selector, impl FnMut(&mut Document, NodeId)>, Seen, Rc<WatchState>) {
		let seen: Seen = Rc::default();
		let sink = Rc::clone(&seen);
		let state = Rc::new(WatchState::new(Uuid::new_v4()));
		let engine = WatchEngine::new(
			Selector::parse(selector).unwrap(),
			move |_: &mut Document, node: NodeId| sink.borrow_mut().push(node),
			options,
			Rc::clone(&state),
		);
		(engine, seen, state)
	}

	fn red_div(doc: &mut Document) -> NodeId {
		doc.create_element_with("div", [("class", "red")]).unwrap()
	}

	#[test]
	fn test_initial_scan_in_document_order() {
		let mut doc = Document::new();
		let root = doc.root();
		let a = red_div(&mut doc);
		let b = red_div(&mut doc);
		let plain = doc.create_element("div").unwrap();
		doc.append_child(root, a).unwrap();
		doc.append_child(root, plain).unwrap();
		doc.append_child(a, b).unwrap();

		let (mut engine, seen, state) = engine(".red", WatchOptions::new(true, false));
		engine.initial_scan(&mut doc);

		assert_eq!(*seen.borrow(), vec![a, b]);
		assert_eq!(state.notified(), 2);
	}

	#[test]
	fn test_added_subtree_checked_in_pre_order() {
		let mut doc = Document::new();
		let outer = red_div(&mut doc);
		let plain = doc.create_element("div").unwrap();
		let inner = red_div(&mut doc);
		doc.append_child(outer, plain).unwrap();
		doc.append_child(plain, inner).unwrap();

		let (mut engine, seen, _) = engine(".red", WatchOptions::default());
		let record = MutationRecord::child_list(doc.root(), vec![outer], vec![], None, None);
		engine.reconcile(&mut doc, ChangeBatch::new(vec![record]));

		assert_eq!(*seen.borrow(), vec![outer, inner]);
	}

	#[test]
	fn test_matched_elements_not_reported_twice() {
		let mut doc = Document::new();
		let element = red_div(&mut doc);
		let (mut engine, seen, _) = engine(".red", WatchOptions::default());

		let records = vec![
			MutationRecord::child_list(doc.root(), vec![element], vec![], None, None),
			MutationRecord::attributes(element, "class", None),
			MutationRecord::attributes(element, "title", None),
		];
		engine.reconcile(&mut doc, ChangeBatch::new(records));
		engine.reconcile(
			&mut doc,
			ChangeBatch::new(vec![MutationRecord::attributes(element, "class", None)]),
		);

		assert_eq!(*seen.borrow(), vec![element]);
	}

	#[test]
	fn test_removal_forgets_descendants() {
		let mut doc = Document::new();
		let outer = red_div(&mut doc);
		let inner = red_div(&mut doc);
		doc.append_child(outer, inner).unwrap();
		let (mut engine, seen, _) = engine(".red", WatchOptions::default());

		let added = MutationRecord::child_list(doc.root(), vec![outer], vec![], None, None);
		let removed = MutationRecord::child_list(doc.root(), vec![], vec![outer], None, None);
		engine.reconcile(&mut doc, ChangeBatch::new(vec![added.clone()]));
		engine.reconcile(&mut doc, ChangeBatch::new(vec![removed, added]));

		assert_eq!(*seen.borrow(), vec![outer, inner, outer, inner]);
	}

	#[test]
	fn test_text_nodes_ignored() {
		let mut doc = Document::new();
		let text = doc.create_text("red");
		let (mut engine, seen, state) = engine("*", WatchOptions::default());
		let record = MutationRecord::child_list(doc.root(), vec![text], vec![text], None, None);
		engine.reconcile(&mut doc, ChangeBatch::new(vec![record]));

		assert!(seen.borrow().is_empty());
		assert_eq!(state.notified(), 0);
	}

	#[test]
	fn test_stop_after_first_ends_batch() {
		let mut doc = Document::new();
		let first = red_div(&mut doc);
		let second = red_div(&mut doc);
		let (mut engine, seen, state) = engine(".red", WatchOptions::new(false, true));

		let records = vec![
			MutationRecord::child_list(doc.root(), vec![first], vec![], None, None),
			MutationRecord::child_list(doc.root(), vec![second], vec![], None, None),
		];
		engine.reconcile(&mut doc, ChangeBatch::new(records));
		assert_eq!(*seen.borrow(), vec![first]);
		assert!(!state.is_active());

		// Inactive engines ignore later batches
		let late = MutationRecord::attributes(second, "class", None);
		engine.reconcile(&mut doc, ChangeBatch::new(vec![late]));
		assert_eq!(state.notified(), 1);
	}
}

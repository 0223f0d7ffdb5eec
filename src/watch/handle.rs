use crate::dom::{Document, ObserverId};
use crate::watch::engine::WatchState;
use std::rc::Rc;
use tracing::info;
use uuid::Uuid;

/// Handle to a registered watch.
///
/// Dropping the handle does not end the watch; call [`WatchHandle::cancel`].
#[derive(Debug, Clone)]
pub struct WatchHandle {
	state: Rc<WatchState>,
}

impl WatchHandle {
	pub(crate) fn new(state: Rc<WatchState>) -> Self {
		Self { state }
	}

	pub fn id(&self) -> Uuid {
		self.state.id
	}

	/// False once the watch was cancelled or stopped after its first match
	pub fn is_active(&self) -> bool {
		self.state.is_active()
	}

	/// Number of times the callback has been invoked
	pub fn notified(&self) -> u64 {
		self.state.notified()
	}

	/// The document subscription backing this watch, while it is active
	pub fn subscription(&self) -> Option<ObserverId> {
		self.state.subscription()
	}

	/// Stop the watch and release its subscription.
	///
	/// Returns whether the watch was still active. May be called from inside
	/// the watch's own callback; no further elements are reported after it.
	pub fn cancel(&self, document: &mut Document) -> bool {
		let was_active = self.state.deactivate(document);
		if was_active {
			info!("Watch {} cancelled after {} matches", self.id(), self.notified());
		}
		was_active
	}
}

pub mod detect;
pub mod dom;
mod error;
pub mod scenario;
pub mod selector;
pub mod watch;

pub use detect::{detect_elements, detect_first_element, detect_first_new_element, detect_new_elements};
pub use dom::{ChangeBatch, Document, DomError, MutationKind, MutationRecord, NodeId, ObserveOptions};
pub use error::{DetectError, Result};
pub use scenario::{ReplayDetection, ReplayReport, Scenario};
pub use selector::{ElementPredicate, Selector, SelectorError};
pub use watch::{start, watch, watch_channel, DetectMode, Detection, WatchConfig, WatchHandle, WatchOptions};

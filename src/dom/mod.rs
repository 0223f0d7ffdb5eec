//! In-memory document tree with DOM-style mutation observation
//!
//! # Module Organization
//!
//! - [`node`] - Node identity and per-node data
//! - [`document`] - The arena-backed tree and its mutation operations
//! - [`mutation`] - Mutation records, observe options and observer delivery
//! - [`error`] - Tree specific error types

pub mod document;
pub mod error;
pub mod mutation;
pub mod node;

pub use document::{Descendants, Document};
pub use error::DomError;
pub use mutation::{
	ChangeBatch, MutationKind, MutationObserver, MutationRecord, ObserveOptions, ObserverId,
};
pub use node::{Attribute, ElementData, Node, NodeId, NodeKind};

//! Core types for editing Asset Administration Shell environments.
//!
//! This crate provides the in-memory document model, the per-kind
//! identifiable stores, reference traversal and resolution, consistency
//! checks, change notifications, id generation and the shared error,
//! configuration and logging setup used by the editing engines.

pub mod config;
pub mod consistency;
pub mod environment;
pub mod error;
pub mod idgen;
pub mod logging;
pub mod model;
pub mod notify;
pub mod resolve;
pub mod store;
pub mod traverse;

pub use config::EditorConfig;
pub use consistency::{ConsistencyReport, DanglingReference};
pub use environment::{Environment, IdentifiableRef};
pub use error::{AasxError, Result};
pub use notify::{ChangeEvent, ChangeKind, ChangeNotifier, ChangeTarget};
pub use resolve::Resolved;
pub use store::{IdentifiableStore, SideInfo, StubLevel};
pub use traverse::{ReferenceBearing, ReferenceSite};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::EditorConfig;
    pub use crate::environment::Environment;
    pub use crate::error::{AasxError, Result};
    pub use crate::model::*;
    pub use crate::notify::{ChangeEvent, ChangeKind, ChangeNotifier};
    pub use crate::store::{IdentifiableStore, SideInfo, StubLevel};
    pub use crate::traverse::{ReferenceBearing, ReferenceSite};
}

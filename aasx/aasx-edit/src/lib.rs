//! Editing engines for Asset Administration Shell environments.
//!
//! - [`rename`]: identifier and idShort renames with reference rewriting
//! - [`clone`]: cloning identifiables within and across environments
//! - [`clipboard`]: the session copy/paste buffer
//! - [`delete`]: deletes with optional shell reference cascade
//! - [`package`]: supplementary files of an AASX package
//! - [`remote`]: mirroring deletes and renames onto repositories
//! - [`session`]: sequencing of edits, notifications and remote calls

pub mod clipboard;
pub mod clone;
pub mod delete;
pub mod package;
pub mod remote;
pub mod rename;
pub mod session;

pub use clipboard::{CopyPasteBuffer, ElementOrigin, ElementPaste, IdentifiablePaste};
pub use clone::{CloneEngine, CloneOptions, CloneReport, SupplementaryFile};
pub use delete::DeleteOutcome;
pub use package::{
    DirectoryPackageStore, MemoryPackageStore, PackagePath, PackagePathError,
    SupplementaryFileStore,
};
pub use remote::{
    AlwaysConfirm, ConfirmDestructiveOp, FetchReport, MirrorOperation, MirrorOutcome,
    MirrorRequest, NeverConfirm, RemoteAssistant, RemotePage, RemoteRepository, RemoteStub,
};
pub use rename::{ElementRenameOutcome, RenameOutcome};
pub use session::{EditSession, Mirrored};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clone::{CloneEngine, CloneOptions};
    pub use crate::package::{PackagePath, SupplementaryFileStore};
    pub use crate::remote::{ConfirmDestructiveOp, MirrorOutcome, RemoteAssistant, RemoteRepository};
    pub use crate::session::EditSession;
    pub use aasx_core::prelude::*;
}

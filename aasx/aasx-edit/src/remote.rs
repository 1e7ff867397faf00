//! Mirroring local deletes and renames onto remote repositories.
//!
//! Identifiables fetched from a repository carry a [`SideInfo`] with the
//! endpoint they came from. After such an entry is deleted or renamed
//! locally, the assistant offers to repeat the operation remotely. Mirroring
//! is best effort: the local change is already applied and is never rolled
//! back, a failed call is logged and reported as [`MirrorOutcome::Failed`].

use aasx_core::config::RemoteConfig;
use aasx_core::environment::Environment;
use aasx_core::error::{AasxError, Result};
use aasx_core::model::{
    AssetAdministrationShell, ConceptDescription, Identifiable, IdentifiableHandle,
    IdentifiableKind, Key, Submodel,
};
use aasx_core::store::{SideInfo, StubLevel};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The operation proposed for a remote entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MirrorOperation {
    Delete,
    Rename { new_id: String },
}

/// Everything a confirmation prompt needs to describe the remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRequest {
    pub kind: IdentifiableKind,
    pub id: String,
    pub endpoint: String,
    pub operation: MirrorOperation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// No remote counterpart, or mirroring is disabled
    NotApplicable,
    Declined,
    Mirrored { endpoint: String },
    Cancelled,
    Failed { error: String },
}

impl MirrorOutcome {
    pub fn is_mirrored(&self) -> bool {
        matches!(self, Self::Mirrored { .. })
    }
}

/// One identifier listed by a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStub {
    pub id: String,
    pub id_short: Option<String>,
    /// Endpoint addressing this entry; defaults to the queried base
    pub endpoint: Option<String>,
}

impl RemoteStub {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            id_short: None,
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePage {
    pub stubs: Vec<RemoteStub>,
    pub next_cursor: Option<String>,
}

/// Access to an AAS repository or registry.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// Delete the entries addressed by `keys` below `base`.
    async fn delete_identifiables(&self, base: &str, keys: &[Key]) -> Result<()>;

    /// Rename `old_id` to `new_id`; returns the endpoint of the renamed entry.
    async fn rename_identifiable(&self, base: &str, old_id: &str, new_id: &str) -> Result<String>;

    /// List one page of identifiers of `kind`.
    async fn fetch_page(
        &self,
        base: &str,
        kind: IdentifiableKind,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<RemotePage>;
}

/// Asks the user before a destructive remote call.
pub trait ConfirmDestructiveOp: Send + Sync {
    fn confirm(&self, request: &MirrorRequest) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl ConfirmDestructiveOp for AlwaysConfirm {
    fn confirm(&self, _request: &MirrorRequest) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl ConfirmDestructiveOp for NeverConfirm {
    fn confirm(&self, _request: &MirrorRequest) -> bool {
        false
    }
}

/// Result of pulling one page of stubs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub added: Vec<IdentifiableHandle>,
    pub skipped: Vec<IdentifiableHandle>,
    pub next_cursor: Option<String>,
}

pub struct RemoteAssistant {
    repository: Arc<dyn RemoteRepository>,
    confirm: Arc<dyn ConfirmDestructiveOp>,
    config: RemoteConfig,
}

impl std::fmt::Debug for RemoteAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteAssistant")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RemoteAssistant {
    pub fn new(
        repository: Arc<dyn RemoteRepository>,
        confirm: Arc<dyn ConfirmDestructiveOp>,
        config: RemoteConfig,
    ) -> Self {
        Self {
            repository,
            confirm,
            config,
        }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Offer to delete the remote counterpart of an entry that was deleted
    /// locally. `side_info` is the bookkeeping the entry had before removal.
    pub async fn mirror_delete(
        &self,
        side_info: &SideInfo,
        kind: IdentifiableKind,
        cancel: &CancellationToken,
    ) -> MirrorOutcome {
        if !self.config.offer_mirror_delete {
            return MirrorOutcome::NotApplicable;
        }
        let Some(endpoint) = mirror_endpoint(side_info) else {
            return MirrorOutcome::NotApplicable;
        };

        let request = MirrorRequest {
            kind,
            id: side_info.id.clone(),
            endpoint: endpoint.clone(),
            operation: MirrorOperation::Delete,
        };
        if !self.confirm.confirm(&request) {
            warn!("Remote delete of {} {} declined", kind, side_info.id);
            return MirrorOutcome::Declined;
        }

        let keys = [Key::new(kind.key_type(), side_info.id.clone())];
        let call = self.repository.delete_identifiables(&endpoint, &keys);
        match self.run("remote delete", cancel, call).await {
            Ok(()) => {
                info!("Deleted {} {} at {}", kind, side_info.id, endpoint);
                MirrorOutcome::Mirrored { endpoint }
            }
            Err(e) => failed(&request, e),
        }
    }

    /// Offer to rename the remote counterpart of an entry renamed locally
    /// from `old_id` to `new_id`. On success the entry's side info points at
    /// the endpoint returned by the repository.
    pub async fn mirror_rename(
        &self,
        env: &mut Environment,
        kind: IdentifiableKind,
        old_id: &str,
        new_id: &str,
        cancel: &CancellationToken,
    ) -> MirrorOutcome {
        if !self.config.offer_mirror_rename || old_id == new_id {
            return MirrorOutcome::NotApplicable;
        }
        let handle = IdentifiableHandle::new(kind, new_id);
        let Some(endpoint) = env.side_info(&handle).and_then(mirror_endpoint) else {
            return MirrorOutcome::NotApplicable;
        };

        let request = MirrorRequest {
            kind,
            id: old_id.to_string(),
            endpoint: endpoint.clone(),
            operation: MirrorOperation::Rename {
                new_id: new_id.to_string(),
            },
        };
        if !self.confirm.confirm(&request) {
            warn!("Remote rename of {} {} declined", kind, old_id);
            return MirrorOutcome::Declined;
        }

        let call = self.repository.rename_identifiable(&endpoint, old_id, new_id);
        match self.run("remote rename", cancel, call).await {
            Ok(renamed_endpoint) => {
                if let Some(info) = env.side_info_mut(&handle) {
                    info.queried_endpoint = Some(renamed_endpoint.clone());
                    info.designated_endpoint = Some(renamed_endpoint.clone());
                }
                info!("Renamed {} {} to {} at {}", kind, old_id, new_id, renamed_endpoint);
                MirrorOutcome::Mirrored {
                    endpoint: renamed_endpoint,
                }
            }
            Err(e) => failed(&request, e),
        }
    }

    /// Pull one page of id-only stubs of `kind` from `base` into `env`.
    /// Identifiers already present are skipped.
    pub async fn fetch_stubs(
        &self,
        env: &mut Environment,
        base: &str,
        kind: IdentifiableKind,
        cursor: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<FetchReport> {
        let call = self
            .repository
            .fetch_page(base, kind, cursor.map(str::to_string), self.config.page_size);
        let page = self.run("fetch stubs", cancel, call).await.inspect_err(|e| {
            error!("Fetching {} stubs from {} failed: {}", kind, base, e);
        })?;

        let mut report = match kind {
            IdentifiableKind::Shell => add_stubs::<AssetAdministrationShell>(env, base, page.stubs),
            IdentifiableKind::Submodel => add_stubs::<Submodel>(env, base, page.stubs),
            IdentifiableKind::ConceptDescription => {
                add_stubs::<ConceptDescription>(env, base, page.stubs)
            }
        };
        report.next_cursor = page.next_cursor;

        info!(
            "Fetched {} {} stubs from {} ({} skipped)",
            report.added.len(),
            kind,
            base,
            report.skipped.len()
        );
        Ok(report)
    }

    async fn run<T, F>(&self, what: &str, cancel: &CancellationToken, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let timeout = self.config.timeout();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AasxError::cancelled(what)),
            result = tokio::time::timeout(timeout, call) => match result {
                Ok(result) => result,
                Err(_) => Err(AasxError::timeout(format!("{} after {:?}", what, timeout))),
            },
        }
    }
}

fn mirror_endpoint(side_info: &SideInfo) -> Option<String> {
    if !side_info.is_remote_mirrored() {
        return None;
    }
    side_info.endpoint().map(str::to_string)
}

fn failed(request: &MirrorRequest, e: AasxError) -> MirrorOutcome {
    if e.is_cancelled() {
        warn!("Mirroring {:?} of {} cancelled", request.operation, request.id);
        return MirrorOutcome::Cancelled;
    }
    error!(
        "Mirroring {:?} of {} {} at {} failed: {}",
        request.operation, request.kind, request.id, request.endpoint, e
    );
    MirrorOutcome::Failed {
        error: e.to_string(),
    }
}

fn add_stubs<T: Identifiable>(env: &mut Environment, base: &str, stubs: Vec<RemoteStub>) -> FetchReport {
    let mut report = FetchReport::default();
    let store = T::store_mut(env);
    for stub in stubs {
        let handle = IdentifiableHandle::new(T::KIND, stub.id.clone());
        if stub.id.trim().is_empty() || store.contains(&stub.id) {
            debug!("Skipping stub {}", handle);
            report.skipped.push(handle);
            continue;
        }
        if let Err(e) = store.add(T::stub(stub.id.clone())) {
            warn!("Could not add stub {}: {}", handle, e);
            report.skipped.push(handle);
            continue;
        }
        let mut info = SideInfo::new(stub.id, StubLevel::IdOnly)
            .with_endpoint(stub.endpoint.unwrap_or_else(|| base.to_string()));
        info.id_short = stub.id_short;
        store.set_side_info(info);
        report.added.push(handle);
    }
    report
}

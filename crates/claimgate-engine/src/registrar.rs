//! # Resource Registrar — Downstream Interface
//!
//! The engine never creates sub-resources itself. It asks a `Registrar`,
//! which owns the naming registry, and consults it for the parent's owner,
//! delegation approvals, and the parent's expiry.
//!
//! `InMemoryRegistrar` is a complete in-process implementation used by the
//! tests and the CLI simulation. It can be told to fail its next `create`
//! so the engine's rollback path can be exercised.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use claimgate_core::{DomainId, HolderId, Label, ResourceId};

/// Parameters for creating one sub-resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    /// Parent resource.
    pub parent: DomainId,
    /// Label of the new sub-resource.
    pub label: Label,
    /// Account that will own the new sub-resource.
    pub holder: HolderId,
    /// Resolver to assign.
    pub resolver: HolderId,
    /// Record TTL.
    pub ttl: u64,
    /// Permission bits to burn.
    pub permission_bits: u32,
    /// Expiry, Unix seconds.
    pub expiry: u64,
}

/// Errors reported by a registrar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrarError {
    /// The parent resource is not registered.
    #[error("unknown parent resource {0}")]
    UnknownParent(DomainId),

    /// The sub-resource already exists.
    #[error("resource {0} already exists")]
    AlreadyExists(ResourceId),

    /// The registry could not be reached or refused the call.
    #[error("registrar unavailable: {0}")]
    Unavailable(String),
}

/// The naming registry the engine creates sub-resources in.
///
/// Implementations must not assume the engine holds any lock while calling
/// them; a `create` implementation may call back into the engine.
pub trait Registrar: Send + Sync {
    /// Create `request.label` under `request.parent`.
    fn create(&self, request: &CreateRequest) -> Result<ResourceId, RegistrarError>;

    /// The current owner of `parent`.
    fn owner_of(&self, parent: &DomainId) -> Result<HolderId, RegistrarError>;

    /// Whether `owner` has approved `operator` to act on their resources.
    fn is_delegate(&self, owner: &HolderId, operator: &HolderId) -> Result<bool, RegistrarError>;

    /// The expiry of `parent`, Unix seconds.
    fn expiry_of(&self, parent: &DomainId) -> Result<u64, RegistrarError>;
}

/// A sub-resource created by [`InMemoryRegistrar`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResource {
    /// Derived identifier.
    pub id: ResourceId,
    /// The creation parameters.
    pub request: CreateRequest,
}

#[derive(Debug, Clone, Copy)]
struct ParentRecord {
    owner: HolderId,
    expiry: u64,
}

#[derive(Debug, Default)]
struct Inner {
    parents: HashMap<DomainId, ParentRecord>,
    delegates: HashSet<(HolderId, HolderId)>,
    created: HashMap<ResourceId, CreatedResource>,
    fail_next_create: Option<String>,
}

/// In-process registrar backed by hash maps.
#[derive(Debug, Default)]
pub struct InMemoryRegistrar {
    inner: Mutex<Inner>,
}

impl InMemoryRegistrar {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) a parent resource.
    pub fn register_parent(&self, parent: DomainId, owner: HolderId, expiry: u64) {
        self.inner
            .lock()
            .parents
            .insert(parent, ParentRecord { owner, expiry });
    }

    /// Record that `owner` approves `operator`.
    pub fn approve(&self, owner: HolderId, operator: HolderId) {
        self.inner.lock().delegates.insert((owner, operator));
    }

    /// Withdraw an approval.
    pub fn revoke(&self, owner: HolderId, operator: HolderId) {
        self.inner.lock().delegates.remove(&(owner, operator));
    }

    /// Make the next `create` call fail with `Unavailable(reason)`.
    pub fn fail_next_create(&self, reason: impl Into<String>) {
        self.inner.lock().fail_next_create = Some(reason.into());
    }

    /// Look up a created sub-resource.
    pub fn created(&self, id: &ResourceId) -> Option<CreatedResource> {
        self.inner.lock().created.get(id).cloned()
    }

    /// Number of sub-resources created.
    pub fn created_count(&self) -> usize {
        self.inner.lock().created.len()
    }
}

impl Registrar for InMemoryRegistrar {
    fn create(&self, request: &CreateRequest) -> Result<ResourceId, RegistrarError> {
        let mut inner = self.inner.lock();
        if let Some(reason) = inner.fail_next_create.take() {
            return Err(RegistrarError::Unavailable(reason));
        }
        if !inner.parents.contains_key(&request.parent) {
            return Err(RegistrarError::UnknownParent(request.parent));
        }
        let id = ResourceId::derive(&request.parent, &request.label);
        if inner.created.contains_key(&id) {
            return Err(RegistrarError::AlreadyExists(id));
        }
        inner.created.insert(
            id,
            CreatedResource {
                id,
                request: request.clone(),
            },
        );
        Ok(id)
    }

    fn owner_of(&self, parent: &DomainId) -> Result<HolderId, RegistrarError> {
        self.inner
            .lock()
            .parents
            .get(parent)
            .map(|p| p.owner)
            .ok_or(RegistrarError::UnknownParent(*parent))
    }

    fn is_delegate(&self, owner: &HolderId, operator: &HolderId) -> Result<bool, RegistrarError> {
        Ok(self.inner.lock().delegates.contains(&(*owner, *operator)))
    }

    fn expiry_of(&self, parent: &DomainId) -> Result<u64, RegistrarError> {
        self.inner
            .lock()
            .parents
            .get(parent)
            .map(|p| p.expiry)
            .ok_or(RegistrarError::UnknownParent(*parent))
    }
}

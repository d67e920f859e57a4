//! The transport port.
//!
//! [`Transport`] performs exactly one logical API operation per call and
//! reports failures as [`TransportError`] with whatever response metadata was
//! available. It does no error mapping, name resolution or fan-out; those
//! belong to [`crate::Client`].
//!
//! Mutating methods take the [`Version`] to present to the server explicitly.
//! Deciding where that version comes from is the client's job.

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    Cluster, Namespace, NamespaceId, NamespaceSpec, Node, NodeId, TransportError, User, UserId,
    UserSpec, Version, Volume, VolumeId, VolumeSpec,
};

/// A single-operation StorageOS API transport.
///
/// Implementations must be safe to share between concurrently running tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Logs in and stores the obtained credential so every later call on this
    /// transport carries it.
    async fn authenticate(&self, username: &str, password: &str) -> Result<User, TransportError>;

    async fn get_cluster(&self) -> Result<Cluster, TransportError>;

    async fn get_node(&self, id: &NodeId) -> Result<Node, TransportError>;
    async fn list_nodes(&self) -> Result<Vec<Node>, TransportError>;

    async fn get_namespace(&self, id: &NamespaceId) -> Result<Namespace, TransportError>;
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, TransportError>;

    async fn get_user(&self, id: &UserId) -> Result<User, TransportError>;
    async fn list_users(&self) -> Result<Vec<User>, TransportError>;

    async fn get_volume(
        &self,
        namespace: &NamespaceId,
        id: &VolumeId,
    ) -> Result<Volume, TransportError>;

    /// Lists every volume in `namespace` visible to the caller.
    async fn list_volumes(&self, namespace: &NamespaceId) -> Result<Vec<Volume>, TransportError>;

    /// Creates a volume. `async_max` bounds how long the server may take to
    /// finish provisioning asynchronously; `None` waits synchronously.
    async fn create_volume(
        &self,
        namespace: &NamespaceId,
        spec: &VolumeSpec,
        async_max: Option<Duration>,
    ) -> Result<Volume, TransportError>;

    async fn create_namespace(&self, spec: &NamespaceSpec) -> Result<Namespace, TransportError>;

    async fn create_user(&self, spec: &UserSpec) -> Result<User, TransportError>;

    async fn delete_volume(
        &self,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: &Version,
        async_max: Option<Duration>,
    ) -> Result<(), TransportError>;

    async fn detach_volume(
        &self,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: &Version,
    ) -> Result<(), TransportError>;

    /// Changes the replica count of a volume, returning its updated state.
    async fn set_replicas(
        &self,
        namespace: &NamespaceId,
        id: &VolumeId,
        replicas: u64,
        version: &Version,
    ) -> Result<Volume, TransportError>;

    async fn delete_namespace(
        &self,
        id: &NamespaceId,
        version: &Version,
    ) -> Result<(), TransportError>;

    async fn delete_user(&self, id: &UserId, version: &Version) -> Result<(), TransportError>;
}

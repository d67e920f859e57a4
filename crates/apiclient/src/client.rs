//! The public client facade.
//!
//! [`Client`] composes a [`Transport`], the error taxonomy and the
//! [`ScopedAggregator`] into resource-oriented operations. It holds no state
//! beyond its configuration: every call re-fetches what it needs.
//!
//! ## Deadlines and cancellation
//!
//! Every operation runs under [`ClientConfig::command_timeout`] and the
//! client's [`CancellationToken`]. When the deadline elapses the operation
//! returns [`ApiError::DeadlineExceeded`] and any tasks it spawned are aborted.
//!
//! ## Version-guarded mutations
//!
//! Mutations take a [`VersionConstraint`]:
//!
//! - [`VersionConstraint::Conditional`] sends the caller's version as is.
//! - [`VersionConstraint::Unconditional`] reads the resource once to learn its
//!   current version, then sends that. The server's CAS check still applies,
//!   so two racing unconditional callers can still see
//!   [`ApiError::StaleWrite`].
//!
//! Nothing here retries. Handling `StaleWrite` is the caller's policy.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::filter::{filter_by_ids, filter_by_names, find_by_name};
use crate::{
    map_transport_error, ApiError, Cluster, HasVersion, Namespace, NamespaceId, NamespaceSpec, Node,
    NodeId, ScopedAggregator, Transport, TransportError, UnauthorisedScopePolicy, User, UserId,
    UserSpec, Version, Volume, VolumeId, VolumeSpec,
};

// ---------------------------------------------------------------------------
// Configuration and parameters
// ---------------------------------------------------------------------------

/// Behaviour shared by every call made through a [`Client`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Deadline applied to each operation. `None` waits indefinitely.
    pub command_timeout: Option<Duration>,
    /// Outcome when every namespace in an aggregation denies access.
    pub unauthorised_scopes: UnauthorisedScopePolicy,
}

/// Which version a mutation presents to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VersionConstraint {
    /// Read the resource first and use its current version.
    #[default]
    Unconditional,
    /// Use this version; the server rejects it if stale.
    Conditional(Version),
}

impl From<Option<Version>> for VersionConstraint {
    fn from(version: Option<Version>) -> Self {
        match version {
            Some(v) => Self::Conditional(v),
            None => Self::Unconditional,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteVolumeParams {
    pub version: VersionConstraint,
    /// Lets the server finish the deletion asynchronously within this bound.
    pub async_max: Option<Duration>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Typed StorageOS API client.
///
/// Cloning is cheap; clones share the transport and cancellation token.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that cancels every in-flight and future call on this client.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns a clone of this client with a different per-operation deadline.
    pub fn with_timeout(&self, timeout: Option<Duration>) -> Self {
        let mut client = self.clone();
        client.config.command_timeout = timeout;
        client
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Authentication and cluster
    // -----------------------------------------------------------------------

    /// Logs in; every later call through this client's transport carries the
    /// obtained credential.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, ApiError> {
        self.run("authenticate", async {
            self.transport
                .authenticate(username, password)
                .await
                .map_err(map_transport_error)
        })
        .await
    }

    #[instrument(skip_all)]
    pub async fn get_cluster(&self) -> Result<Cluster, ApiError> {
        self.run("get cluster", async {
            self.transport
                .get_cluster()
                .await
                .map_err(map_transport_error)
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    #[instrument(skip_all, fields(node = %id))]
    pub async fn get_node(&self, id: &NodeId) -> Result<Node, ApiError> {
        self.run("get node", async {
            self.transport
                .get_node(id)
                .await
                .map_err(map_transport_error)
        })
        .await
    }

    /// Looks a node up by name. Costs a full node listing.
    #[instrument(skip_all, fields(name = %name))]
    pub async fn get_node_by_name(&self, name: &str) -> Result<Node, ApiError> {
        self.run("get node by name", async {
            find_by_name(self.transport.list_nodes().await?, name)
        })
        .await
    }

    /// Lists nodes, restricted to `ids` when any are given.
    #[instrument(skip_all, fields(requested = ids.len()))]
    pub async fn get_nodes(&self, ids: &[NodeId]) -> Result<Vec<Node>, ApiError> {
        self.run("list nodes", async {
            filter_by_ids(self.transport.list_nodes().await?, ids)
        })
        .await
    }

    #[instrument(skip_all, fields(requested = names.len()))]
    pub async fn get_nodes_by_name<S: AsRef<str> + Sync>(
        &self,
        names: &[S],
    ) -> Result<Vec<Node>, ApiError> {
        self.run("list nodes", async {
            filter_by_names(self.transport.list_nodes().await?, names)
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Namespaces
    // -----------------------------------------------------------------------

    #[instrument(skip_all, fields(namespace = %id))]
    pub async fn get_namespace(&self, id: &NamespaceId) -> Result<Namespace, ApiError> {
        self.run("get namespace", async {
            self.transport
                .get_namespace(id)
                .await
                .map_err(map_transport_error)
        })
        .await
    }

    /// Looks a namespace up by name. Costs a full namespace listing.
    #[instrument(skip_all, fields(name = %name))]
    pub async fn get_namespace_by_name(&self, name: &str) -> Result<Namespace, ApiError> {
        self.run("get namespace by name", async {
            find_by_name(self.transport.list_namespaces().await?, name)
        })
        .await
    }

    #[instrument(skip_all, fields(requested = ids.len()))]
    pub async fn get_namespaces(&self, ids: &[NamespaceId]) -> Result<Vec<Namespace>, ApiError> {
        self.run("list namespaces", async {
            filter_by_ids(self.transport.list_namespaces().await?, ids)
        })
        .await
    }

    #[instrument(skip_all, fields(requested = names.len()))]
    pub async fn get_namespaces_by_name<S: AsRef<str> + Sync>(
        &self,
        names: &[S],
    ) -> Result<Vec<Namespace>, ApiError> {
        self.run("list namespaces", async {
            filter_by_names(self.transport.list_namespaces().await?, names)
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    #[instrument(skip_all, fields(user = %id))]
    pub async fn get_user(&self, id: &UserId) -> Result<User, ApiError> {
        self.run("get user", async {
            self.transport
                .get_user(id)
                .await
                .map_err(map_transport_error)
        })
        .await
    }

    /// Looks a user up by username. Costs a full user listing.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn get_user_by_name(&self, username: &str) -> Result<User, ApiError> {
        self.run("get user by name", async {
            find_by_name(self.transport.list_users().await?, username)
        })
        .await
    }

    #[instrument(skip_all, fields(requested = ids.len()))]
    pub async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, ApiError> {
        self.run("list users", async {
            filter_by_ids(self.transport.list_users().await?, ids)
        })
        .await
    }

    #[instrument(skip_all, fields(requested = usernames.len()))]
    pub async fn get_users_by_name<S: AsRef<str> + Sync>(
        &self,
        usernames: &[S],
    ) -> Result<Vec<User>, ApiError> {
        self.run("list users", async {
            filter_by_names(self.transport.list_users().await?, usernames)
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Volumes
    // -----------------------------------------------------------------------

    #[instrument(skip_all, fields(namespace = %namespace, volume = %id))]
    pub async fn get_volume(
        &self,
        namespace: &NamespaceId,
        id: &VolumeId,
    ) -> Result<Volume, ApiError> {
        self.run("get volume", async {
            self.transport
                .get_volume(namespace, id)
                .await
                .map_err(map_transport_error)
        })
        .await
    }

    /// Looks a volume up by name within `namespace`.
    ///
    /// The API is keyed by identifier, so this lists every volume in the
    /// namespace and scans for the name. Prefer [`Client::get_volume`] when the
    /// identifier is known.
    #[instrument(skip_all, fields(namespace = %namespace, name = %name))]
    pub async fn get_volume_by_name(
        &self,
        namespace: &NamespaceId,
        name: &str,
    ) -> Result<Volume, ApiError> {
        self.run("get volume by name", async {
            find_by_name(self.transport.list_volumes(namespace).await?, name)
        })
        .await
    }

    /// Lists volumes in `namespace`, restricted to `ids` when any are given.
    #[instrument(skip_all, fields(namespace = %namespace, requested = ids.len()))]
    pub async fn get_namespace_volumes(
        &self,
        namespace: &NamespaceId,
        ids: &[VolumeId],
    ) -> Result<Vec<Volume>, ApiError> {
        self.run("list volumes", async {
            filter_by_ids(self.transport.list_volumes(namespace).await?, ids)
        })
        .await
    }

    #[instrument(skip_all, fields(namespace = %namespace, requested = names.len()))]
    pub async fn get_namespace_volumes_by_name<S: AsRef<str> + Sync>(
        &self,
        namespace: &NamespaceId,
        names: &[S],
    ) -> Result<Vec<Volume>, ApiError> {
        self.run("list volumes", async {
            filter_by_names(self.transport.list_volumes(namespace).await?, names)
        })
        .await
    }

    /// Lists volumes in every namespace visible to the authenticated user,
    /// restricted to `ids` when any are given.
    ///
    /// Namespaces the user may not list are skipped (see
    /// [`UnauthorisedScopePolicy`]). Without `ids` the result is unordered;
    /// with them it follows the order of `ids`, and an id found in no visible
    /// namespace fails with [`ApiError::NotFound`].
    #[instrument(skip_all, fields(requested = ids.len()))]
    pub async fn get_all_volumes(&self, ids: &[VolumeId]) -> Result<Vec<Volume>, ApiError> {
        self.run("list volumes in all namespaces", async {
            filter_by_ids(self.aggregate_volumes().await?, ids)
        })
        .await
    }

    /// Like [`Client::get_all_volumes`], matching volume names instead.
    ///
    /// A name held by volumes in two namespaces is ambiguous.
    #[instrument(skip_all, fields(requested = names.len()))]
    pub async fn get_all_volumes_by_name<S: AsRef<str> + Sync>(
        &self,
        names: &[S],
    ) -> Result<Vec<Volume>, ApiError> {
        self.run("list volumes in all namespaces", async {
            filter_by_names(self.aggregate_volumes().await?, names)
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    #[instrument(skip_all, fields(namespace = %namespace, name = %spec.name))]
    pub async fn create_volume(
        &self,
        namespace: &NamespaceId,
        spec: &VolumeSpec,
        async_max: Option<Duration>,
    ) -> Result<Volume, ApiError> {
        self.run("create volume", async {
            self.transport
                .create_volume(namespace, spec, async_max)
                .await
                .map_err(map_transport_error)
        })
        .await
    }

    #[instrument(skip_all, fields(name = %spec.name))]
    pub async fn create_namespace(&self, spec: &NamespaceSpec) -> Result<Namespace, ApiError> {
        self.run("create namespace", async {
            self.transport
                .create_namespace(spec)
                .await
                .map_err(map_transport_error)
        })
        .await
    }

    #[instrument(skip_all, fields(username = %spec.username))]
    pub async fn create_user(&self, spec: &UserSpec) -> Result<User, ApiError> {
        self.run("create user", async {
            self.transport
                .create_user(spec)
                .await
                .map_err(map_transport_error)
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Version-guarded mutations
    // -----------------------------------------------------------------------

    #[instrument(skip_all, fields(namespace = %namespace, volume = %id))]
    pub async fn delete_volume(
        &self,
        namespace: &NamespaceId,
        id: &VolumeId,
        params: DeleteVolumeParams,
    ) -> Result<(), ApiError> {
        let DeleteVolumeParams { version, async_max } = params;

        self.run("delete volume", async {
            self.guarded(
                version,
                || async move { version_of(self.transport.get_volume(namespace, id).await) },
                |version| async move {
                    self.transport
                        .delete_volume(namespace, id, &version, async_max)
                        .await
                },
            )
            .await
        })
        .await
    }

    #[instrument(skip_all, fields(namespace = %namespace, volume = %id))]
    pub async fn detach_volume(
        &self,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: VersionConstraint,
    ) -> Result<(), ApiError> {
        self.run("detach volume", async {
            self.guarded(
                version,
                || async move { version_of(self.transport.get_volume(namespace, id).await) },
                |version| async move { self.transport.detach_volume(namespace, id, &version).await },
            )
            .await
        })
        .await
    }

    /// Sets the number of replicas kept for a volume.
    #[instrument(skip_all, fields(namespace = %namespace, volume = %id, replicas = replicas))]
    pub async fn set_replicas(
        &self,
        namespace: &NamespaceId,
        id: &VolumeId,
        replicas: u64,
        version: VersionConstraint,
    ) -> Result<Volume, ApiError> {
        self.run("set replicas", async {
            self.guarded(
                version,
                || async move { version_of(self.transport.get_volume(namespace, id).await) },
                |version| async move {
                    self.transport
                        .set_replicas(namespace, id, replicas, &version)
                        .await
                },
            )
            .await
        })
        .await
    }

    #[instrument(skip_all, fields(namespace = %id))]
    pub async fn delete_namespace(
        &self,
        id: &NamespaceId,
        version: VersionConstraint,
    ) -> Result<(), ApiError> {
        self.run("delete namespace", async {
            self.guarded(
                version,
                || async move { version_of(self.transport.get_namespace(id).await) },
                |version| async move { self.transport.delete_namespace(id, &version).await },
            )
            .await
        })
        .await
    }

    #[instrument(skip_all, fields(user = %id))]
    pub async fn delete_user(&self, id: &UserId, version: VersionConstraint) -> Result<(), ApiError> {
        self.run("delete user", async {
            self.guarded(
                version,
                || async move { version_of(self.transport.get_user(id).await) },
                |version| async move { self.transport.delete_user(id, &version).await },
            )
            .await
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn aggregate_volumes(&self) -> Result<Vec<Volume>, ApiError> {
        let aggregation = self
            .aggregator()
            .collect_all(|transport, namespace| async move {
                transport.list_volumes(&namespace).await
            })
            .await?;

        if !aggregation.denied.is_empty() {
            debug!(denied = aggregation.denied.len(), "namespaces skipped");
        }
        Ok(aggregation.items)
    }

    fn aggregator(&self) -> ScopedAggregator<dyn Transport> {
        ScopedAggregator::new(
            Arc::clone(&self.transport),
            self.config.unauthorised_scopes,
            self.cancel.clone(),
        )
    }

    /// Applies a mutation under the version CAS protocol.
    ///
    /// `read` is awaited at most once, and only for an unconditional request.
    async fn guarded<T, Read, ReadFut, Apply, ApplyFut>(
        &self,
        constraint: VersionConstraint,
        read: Read,
        apply: Apply,
    ) -> Result<T, ApiError>
    where
        Read: FnOnce() -> ReadFut,
        ReadFut: Future<Output = Result<Version, ApiError>>,
        Apply: FnOnce(Version) -> ApplyFut,
        ApplyFut: Future<Output = Result<T, TransportError>>,
    {
        let version = match constraint {
            VersionConstraint::Conditional(version) => version,
            VersionConstraint::Unconditional => {
                let current = read().await?;
                debug!(version = %current, "resolved current version");
                current
            }
        };

        debug!(version = %version, "applying versioned mutation");
        apply(version).await.map_err(map_transport_error)
    }

    /// Runs one operation under the configured deadline and the client's
    /// cancellation token.
    async fn run<T, F>(&self, operation: &'static str, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let guarded = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(ApiError::Cancelled { operation }),
                result = fut => result,
            }
        };

        match self.config.command_timeout {
            Some(timeout) => tokio::time::timeout(timeout, guarded)
                .await
                .unwrap_or_else(|_| Err(ApiError::DeadlineExceeded { operation, timeout })),
            None => guarded.await,
        }
    }
}

/// Extracts the version from a fresh read for an unconditional mutation.
fn version_of<R: HasVersion>(read: Result<R, TransportError>) -> Result<Version, ApiError> {
    read.map(|r| r.version().clone())
        .map_err(map_transport_error)
}

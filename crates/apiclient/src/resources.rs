//! Decoded StorageOS API resources and creation specs.
//!
//! Resources are plain data: they are fetched fresh for every client call and
//! never cached. Each carries the [`Version`] it was read at, which is the
//! token to present when mutating it.

use serde::{Deserialize, Serialize};

use crate::{
    ClusterId, DeploymentId, FsType, Health, Labels, LogFormat, LogLevel, NamespaceId, NodeId,
    PolicyGroupId, Timestamp, UserId, Version, VolumeId,
};

/// Resources that are addressable by a human-readable name within their scope.
///
/// Names are unique per scope on the server, but the client does not rely on
/// that when resolving names (see [`crate::ApiError::AmbiguousName`]).
pub trait Named {
    /// Identifier type of the resource.
    type Id: Clone + Eq + std::hash::Hash + std::fmt::Display + Send + Sync + 'static;

    /// Resource kind used in error messages.
    const KIND: ResourceKind;

    fn id(&self) -> &Self::Id;
    fn name(&self) -> &str;
}

/// Resources carrying a [`Version`] that guards mutation.
pub trait HasVersion {
    fn version(&self) -> &Version;
}

macro_rules! has_version {
    ($($ty:ty),* $(,)?) => {
        $(
            impl HasVersion for $ty {
                fn version(&self) -> &Version {
                    &self.version
                }
            }
        )*
    };
}

has_version!(Cluster, Node, Namespace, User, Volume);

/// The kinds of resource the client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Cluster,
    Node,
    Namespace,
    User,
    Volume,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Cluster => "cluster",
            Self::Node => "node",
            Self::Namespace => "namespace",
            Self::User => "user",
            Self::Volume => "volume",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Cluster
// ---------------------------------------------------------------------------

/// Licence attached to the cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Licence {
    pub cluster_id: Option<ClusterId>,
    pub expires_at: Option<Timestamp>,
    pub cluster_capacity_bytes: u64,
    pub kind: String,
    pub customer_name: String,
}

/// Cluster-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub licence: Licence,

    pub disable_telemetry: bool,
    pub disable_crash_reporting: bool,
    pub disable_version_check: bool,

    pub log_level: LogLevel,
    pub log_format: LogFormat,

    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub version: Version,
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Network endpoints a node advertises to its peers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfiguration {
    pub io_addr: String,
    pub supervisor_addr: String,
    pub gossip_addr: String,
    pub clustering_addr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub health: Health,
    pub labels: Labels,

    /// Present when the API returned endpoint details.
    pub configuration: Option<NodeConfiguration>,

    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub version: Version,
}

impl Named for Node {
    type Id = NodeId;
    const KIND: ResourceKind = ResourceKind::Node;

    fn id(&self) -> &NodeId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Namespace
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: NamespaceId,
    pub name: String,
    pub labels: Labels,

    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub version: Version,
}

impl Named for Namespace {
    type Id = NamespaceId;
    const KIND: ResourceKind = ResourceKind::Namespace;

    fn id(&self) -> &NamespaceId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
    pub groups: Vec<PolicyGroupId>,

    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub version: Version,
}

impl Named for User {
    type Id = UserId;
    const KIND: ResourceKind = ResourceKind::User;

    fn id(&self) -> &UserId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.username
    }
}

// ---------------------------------------------------------------------------
// Volume
// ---------------------------------------------------------------------------

/// One copy of a volume's data, placed on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: DeploymentId,
    pub node: NodeId,
    pub inode: u32,
    pub health: Health,
    pub syncing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub id: VolumeId,
    pub name: String,
    pub description: String,
    pub size_bytes: u64,

    /// The owning namespace. Fixed at creation.
    pub namespace: NamespaceId,
    /// Node the volume is currently attached on, if any.
    pub attached_on: Option<NodeId>,
    pub labels: Labels,
    pub filesystem: FsType,
    pub inode: u32,

    pub master: Option<Deployment>,
    pub replicas: Vec<Deployment>,

    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub version: Version,
}

impl Named for Volume {
    type Id = VolumeId;
    const KIND: ResourceKind = ResourceKind::Volume;

    fn id(&self) -> &VolumeId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Creation specs
// ---------------------------------------------------------------------------

/// Desired state for a new volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSpec {
    pub name: String,
    pub description: String,
    pub size_bytes: u64,
    pub filesystem: FsType,
    pub labels: Labels,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceSpec {
    pub name: String,
    pub labels: Labels,
}

/// Desired state for a new user account.
///
/// `Debug` omits the password.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSpec {
    pub username: String,
    pub password: String,
    pub with_admin: bool,
    pub groups: Vec<PolicyGroupId>,
}

impl std::fmt::Debug for UserSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSpec")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("with_admin", &self.with_admin)
            .field("groups", &self.groups)
            .finish()
    }
}

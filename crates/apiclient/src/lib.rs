//! Typed client for the StorageOS control-plane API.
//!
//! This crate turns single-operation transport calls into resource-oriented
//! operations with consistent optimistic-concurrency, error-taxonomy and
//! partial-failure semantics. Transport implementations (HTTP in the
//! `openapi` crate, in-memory fakes in tests) plug in through the
//! [`Transport`] trait.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** No HTTP dependencies live here. This crate
//! defines *what* a transport must do; infrastructure crates define *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype resource identifiers (`VolumeId`, `NamespaceId`, etc.) |
//! | [`types`] | Shared value types (`Version`, `Labels`, `Health`, `Timestamp`, etc.) |
//! | [`resources`] | Decoded resources (`Volume`, `Node`, ...) and creation specs |
//! | [`errors`] | Transport errors, the domain taxonomy and the mapping between them |
//! | [`auth`] | The shared, lock-guarded credential every transport call reads |
//! | [`transport`] | The [`Transport`] port trait |
//! | [`aggregate`] | Parallel fan-out across namespaces |
//! | [`filter`] | Strict id/name selection over fetched lists |
//! | [`client`] | The [`Client`] facade and the version CAS protocol |

pub mod aggregate;
pub mod auth;
pub mod client;
pub mod errors;
pub mod filter;
pub mod identifiers;
pub mod resources;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use aggregate::{Aggregation, ScopedAggregator, UnauthorisedScopePolicy};
pub use auth::{BearerToken, SharedCredentials};
pub use client::{Client, ClientConfig, DeleteVolumeParams, VersionConstraint};
pub use errors::{map_transport_error, ApiError, ErrorKind, ErrorPayload, TransportError};
pub use identifiers::{
    ClusterId, DeploymentId, EmptyValue, NamespaceId, NodeId, PolicyGroupId, UserId, VolumeId,
};
pub use resources::{
    Cluster, Deployment, HasVersion, Licence, Named, Namespace, NamespaceSpec, Node,
    NodeConfiguration, ResourceKind, User, UserSpec, Volume, VolumeSpec,
};
pub use transport::Transport;
pub use types::{FsType, Health, LabelError, Labels, LogFormat, LogLevel, Timestamp, Version};

//! Newtype resource identifiers.
//!
//! Every StorageOS resource kind with an identity is represented as a distinct
//! newtype wrapping the opaque string the API assigns. This prevents passing a
//! [`NodeId`] where a [`VolumeId`] is expected even though both are strings on
//! the wire.
//!
//! Volume identifiers are only unique within their [`NamespaceId`]; every other
//! identifier is unique across the cluster.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string-backed value that must not be empty was given an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} must not be empty")]
pub struct EmptyValue {
    pub kind: &'static str,
}

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// Deserialization goes through new() so an empty string is rejected.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = EmptyValue;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or(EmptyValue { kind: stringify!($name) })
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

string_id! {
    /// Identifies the StorageOS cluster. There is exactly one per API endpoint.
    ClusterId
}

string_id! {
    /// Identifies a storage node participating in the cluster.
    NodeId
}

string_id! {
    /// Identifies a namespace: the scope that partitions volumes.
    NamespaceId
}

string_id! {
    /// Identifies a volume within its namespace.
    VolumeId
}

string_id! {
    /// Identifies a user account.
    UserId
}

string_id! {
    /// Identifies one deployment (master or replica) of a volume on a node.
    DeploymentId
}

string_id! {
    /// Identifies a policy group a user belongs to.
    PolicyGroupId
}

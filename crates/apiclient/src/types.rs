//! Shared value types for StorageOS API resources.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! values with invariants (version tokens are non-empty, label keys are unique)
//! and are shared by several resource kinds.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifiers::EmptyValue;

// ---------------------------------------------------------------------------
// Version token
// ---------------------------------------------------------------------------

/// Opaque optimistic-concurrency token captured from a read of a resource.
///
/// A [`Version`] is only meaningful against the exact resource it was read
/// from. The client never compares versions itself; presenting a stale
/// version to a mutating endpoint makes the server reject the request, which
/// surfaces as [`crate::ApiError::StaleWrite`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(String);

impl Version {
    /// Creates a version token, returning `None` if `value` is empty.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Returns the token as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Version {
    type Error = EmptyValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(EmptyValue { kind: "version" })
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Errors produced while parsing a [`Labels`] set from `key=value` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    /// A pair was not of the form `key=value` or had an empty side.
    #[error("invalid label (must match key=value format): {pair}")]
    InvalidLabelFormat {
        /// The offending pair as provided.
        pair: String,
    },

    /// The same key appeared more than once.
    #[error("conflict for provided label key: {key}")]
    LabelKeyConflict {
        /// The duplicated key.
        key: String,
    },
}

/// A set of labels attached to a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    /// Creates an empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a label set from `key=value` pairs.
    ///
    /// Fails if any pair is malformed or if a key repeats.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, LabelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeMap::new();

        for pair in pairs {
            let pair = pair.as_ref();
            let mut parts = pair.split('=');
            let (key, value) = match (parts.next(), parts.next(), parts.next()) {
                (Some(k), Some(v), None) => (k, v),
                _ => {
                    return Err(LabelError::InvalidLabelFormat {
                        pair: pair.to_string(),
                    })
                }
            };

            if set.contains_key(key) {
                return Err(LabelError::LabelKeyConflict {
                    key: key.to_string(),
                });
            }
            if key.is_empty() || value.is_empty() {
                return Err(LabelError::InvalidLabelFormat {
                    pair: pair.to_string(),
                });
            }

            set.insert(key.to_string(), value.to_string());
        }

        Ok(Self(set))
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Labels {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Enumerated attributes
// ---------------------------------------------------------------------------

/// Health reported for nodes and volume deployments.
///
/// Unrecognised values decode to [`Health::Unknown`] rather than failing, so a
/// newer server does not break an older client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Online,
    Offline,
    Syncing,
    Ready,
    #[default]
    Unknown,
}

impl Health {
    /// Decodes a wire health string.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "online" => Self::Online,
            "offline" => Self::Offline,
            "syncing" => Self::Syncing,
            "ready" => Self::Ready,
            _ => Self::Unknown,
        }
    }
}

/// Filesystem a volume is formatted with; `Block` means a raw block device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsType {
    Ext4,
    Xfs,
    Btrfs,
    Block,
    #[default]
    Unknown,
}

impl FsType {
    /// Decodes a wire filesystem string.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "ext4" => Self::Ext4,
            "xfs" => Self::Xfs,
            "btrfs" => Self::Btrfs,
            "block" => Self::Block,
            _ => Self::Unknown,
        }
    }

    /// Returns the wire representation, or `None` for [`FsType::Unknown`].
    pub fn as_wire(self) -> Option<&'static str> {
        match self {
            Self::Ext4 => Some("ext4"),
            Self::Xfs => Some("xfs"),
            Self::Btrfs => Some("btrfs"),
            Self::Block => Some("block"),
            Self::Unknown => None,
        }
    }
}

/// Cluster-wide log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    #[default]
    Unknown,
}

impl LogLevel {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }
}

/// Cluster-wide log encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Default,
    Json,
    #[default]
    Unknown,
}

impl LogFormat {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "default" => Self::Default,
            "json" => Self::Json,
            _ => Self::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

//! Wire models of the StorageOS v2 REST API.
//!
//! Every field defaults when absent so a sparse or newer response still
//! decodes; [`crate::codec`] decides what is actually required.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Licence {
    #[serde(rename = "clusterID")]
    pub cluster_id: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub cluster_capacity_bytes: u64,
    pub kind: String,
    pub customer_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cluster {
    pub id: String,
    pub licence: Licence,
    pub disable_telemetry: bool,
    pub disable_crash_reporting: bool,
    pub disable_version_check: bool,
    pub log_level: String,
    pub log_format: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub health: String,
    pub io_endpoint: String,
    pub supervisor_endpoint: String,
    pub gossip_endpoint: String,
    pub clustering_endpoint: String,
    pub labels: BTreeMap<String, String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Namespace {
    pub id: String,
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: String,
    pub username: String,
    pub is_admin: bool,
    pub groups: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Deployment {
    pub id: String,
    #[serde(rename = "nodeID")]
    pub node_id: String,
    pub inode: u32,
    pub health: String,
    pub syncing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub description: String,
    pub attached_on: String,
    #[serde(rename = "namespaceID")]
    pub namespace_id: String,
    pub labels: BTreeMap<String, String>,
    pub fs_type: String,
    pub inode: u32,
    pub master: Option<Deployment>,
    pub replicas: Option<Vec<Deployment>>,
    pub size_bytes: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: String,
}

/// `{"error": "..."}` body sent with failed responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AuthUserData<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVolumeData<'a> {
    #[serde(rename = "namespaceID")]
    pub namespace_id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs_type: Option<&'static str>,
    pub size_bytes: u64,
    pub labels: BTreeMap<&'a str, &'a str>,
}

#[derive(Debug, Serialize)]
pub struct CreateNamespaceData<'a> {
    pub name: &'a str,
    pub labels: BTreeMap<&'a str, &'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserData<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub is_admin: bool,
    pub groups: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct SetReplicasData<'a> {
    pub replicas: u64,
    pub version: &'a str,
}

//! Decoding of wire models into `apiclient` resources.
//!
//! Unknown enum strings decode to their `Unknown` variants and absent optional
//! fields decode to empty values. A resource missing its identifier or version
//! cannot be addressed or mutated, so that alone is a decode failure.

use apiclient::{
    Cluster, ClusterId, Deployment, DeploymentId, FsType, Health, Labels, Licence, LogFormat,
    LogLevel, Namespace, NamespaceId, Node, NodeConfiguration, NodeId, PolicyGroupId, Timestamp,
    TransportError, User, UserId, Version, Volume, VolumeId,
};
use chrono::{DateTime, Utc};

use crate::model;

pub fn decode_cluster(model: model::Cluster) -> Result<Cluster, TransportError> {
    let licence = model.licence;

    Ok(Cluster {
        id: required(ClusterId::new(model.id), "cluster", "id")?,
        licence: Licence {
            cluster_id: ClusterId::new(licence.cluster_id),
            expires_at: timestamp(licence.expires_at),
            cluster_capacity_bytes: licence.cluster_capacity_bytes,
            kind: licence.kind,
            customer_name: licence.customer_name,
        },
        disable_telemetry: model.disable_telemetry,
        disable_crash_reporting: model.disable_crash_reporting,
        disable_version_check: model.disable_version_check,
        log_level: LogLevel::from_wire(&model.log_level),
        log_format: LogFormat::from_wire(&model.log_format),
        created_at: timestamp(model.created_at),
        updated_at: timestamp(model.updated_at),
        version: required(Version::new(model.version), "cluster", "version")?,
    })
}

pub fn decode_node(model: model::Node) -> Result<Node, TransportError> {
    let configuration = NodeConfiguration {
        io_addr: model.io_endpoint,
        supervisor_addr: model.supervisor_endpoint,
        gossip_addr: model.gossip_endpoint,
        clustering_addr: model.clustering_endpoint,
    };

    Ok(Node {
        id: required(NodeId::new(model.id), "node", "id")?,
        name: model.name,
        health: Health::from_wire(&model.health),
        labels: labels(model.labels),
        configuration: (configuration != NodeConfiguration::default()).then_some(configuration),
        created_at: timestamp(model.created_at),
        updated_at: timestamp(model.updated_at),
        version: required(Version::new(model.version), "node", "version")?,
    })
}

pub fn decode_namespace(model: model::Namespace) -> Result<Namespace, TransportError> {
    Ok(Namespace {
        id: required(NamespaceId::new(model.id), "namespace", "id")?,
        name: model.name,
        labels: labels(model.labels),
        created_at: timestamp(model.created_at),
        updated_at: timestamp(model.updated_at),
        version: required(Version::new(model.version), "namespace", "version")?,
    })
}

pub fn decode_user(model: model::User) -> Result<User, TransportError> {
    Ok(User {
        id: required(UserId::new(model.id), "user", "id")?,
        username: model.username,
        is_admin: model.is_admin,
        groups: model
            .groups
            .into_iter()
            .filter_map(PolicyGroupId::new)
            .collect(),
        created_at: timestamp(model.created_at),
        updated_at: timestamp(model.updated_at),
        version: required(Version::new(model.version), "user", "version")?,
    })
}

pub fn decode_volume(model: model::Volume) -> Result<Volume, TransportError> {
    let master = model.master.map(decode_deployment).transpose()?;
    let replicas = model
        .replicas
        .unwrap_or_default()
        .into_iter()
        .map(decode_deployment)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Volume {
        id: required(VolumeId::new(model.id), "volume", "id")?,
        name: model.name,
        description: model.description,
        size_bytes: model.size_bytes,
        namespace: required(NamespaceId::new(model.namespace_id), "volume", "namespace")?,
        attached_on: NodeId::new(model.attached_on),
        labels: labels(model.labels),
        filesystem: FsType::from_wire(&model.fs_type),
        inode: model.inode,
        master,
        replicas,
        created_at: timestamp(model.created_at),
        updated_at: timestamp(model.updated_at),
        version: required(Version::new(model.version), "volume", "version")?,
    })
}

fn decode_deployment(model: model::Deployment) -> Result<Deployment, TransportError> {
    Ok(Deployment {
        id: required(DeploymentId::new(model.id), "deployment", "id")?,
        node: required(NodeId::new(model.node_id), "deployment", "node")?,
        inode: model.inode,
        health: Health::from_wire(&model.health),
        syncing: model.syncing,
    })
}

/// Decodes a list response, failing on the first undecodable element.
pub fn decode_all<M, R>(
    models: Vec<M>,
    decode: impl Fn(M) -> Result<R, TransportError>,
) -> Result<Vec<R>, TransportError> {
    models.into_iter().map(decode).collect()
}

fn required<T>(value: Option<T>, resource: &str, field: &str) -> Result<T, TransportError> {
    value.ok_or_else(|| TransportError::Decode {
        message: format!("{resource} has no {field}"),
    })
}

fn labels(wire: std::collections::BTreeMap<String, String>) -> Labels {
    wire.into_iter().collect()
}

// Seconds from the Unix epoch to 0001-01-01T00:00:00Z.
const GO_ZERO_TIME_SECS: i64 = -62_135_596_800;

// Go servers encode an unset time as the zero instant rather than omitting it.
fn timestamp(value: Option<DateTime<Utc>>) -> Option<Timestamp> {
    value
        .filter(|dt| dt.timestamp() != GO_ZERO_TIME_SECS || dt.timestamp_subsec_nanos() != 0)
        .map(Timestamp::from_utc)
}

use apiclient::{NamespaceId, NodeId, UserId, VolumeId};
use clap::Subcommand;

use super::{parse_id, parse_ids, print_json, Context};

#[derive(Debug, Subcommand)]
pub enum GetCommand {
    /// Cluster-wide configuration and licence
    Cluster,
    /// A single node
    Node { name: String },
    /// Nodes, optionally restricted to the given ones
    Nodes { names: Vec<String> },
    /// A single namespace
    Namespace { name: String },
    /// Namespaces, optionally restricted to the given ones
    Namespaces { names: Vec<String> },
    /// A single user
    User { name: String },
    /// Users, optionally restricted to the given ones
    Users { names: Vec<String> },
    /// A single volume in --namespace
    Volume { name: String },
    /// Volumes in --namespace, or in every visible namespace when none is given;
    /// optionally restricted to the given ones
    Volumes { names: Vec<String> },
}

pub async fn run(cmd: GetCommand, ctx: &Context) -> anyhow::Result<()> {
    let client = &ctx.client;
    let use_ids = ctx.global.use_ids;

    match cmd {
        GetCommand::Cluster => print_json(&client.get_cluster().await?),

        GetCommand::Node { name } => {
            let node = if use_ids {
                client.get_node(&parse_id(NodeId::new(name), "node")?).await?
            } else {
                client.get_node_by_name(&name).await?
            };
            print_json(&node)
        }
        GetCommand::Nodes { names } => {
            let nodes = if use_ids {
                client.get_nodes(&parse_ids(names, NodeId::new, "node")?).await?
            } else {
                client.get_nodes_by_name(&names).await?
            };
            print_json(&nodes)
        }

        GetCommand::Namespace { name } => {
            let namespace = if use_ids {
                client
                    .get_namespace(&parse_id(NamespaceId::new(name), "namespace")?)
                    .await?
            } else {
                client.get_namespace_by_name(&name).await?
            };
            print_json(&namespace)
        }
        GetCommand::Namespaces { names } => {
            let namespaces = if use_ids {
                client
                    .get_namespaces(&parse_ids(names, NamespaceId::new, "namespace")?)
                    .await?
            } else {
                client.get_namespaces_by_name(&names).await?
            };
            print_json(&namespaces)
        }

        GetCommand::User { name } => {
            let user = if use_ids {
                client.get_user(&parse_id(UserId::new(name), "user")?).await?
            } else {
                client.get_user_by_name(&name).await?
            };
            print_json(&user)
        }
        GetCommand::Users { names } => {
            let users = if use_ids {
                client.get_users(&parse_ids(names, UserId::new, "user")?).await?
            } else {
                client.get_users_by_name(&names).await?
            };
            print_json(&users)
        }

        GetCommand::Volume { name } => {
            let namespace = ctx.volume_scope().await?;
            let volume = if use_ids {
                client
                    .get_volume(&namespace, &parse_id(VolumeId::new(name), "volume")?)
                    .await?
            } else {
                client.get_volume_by_name(&namespace, &name).await?
            };
            print_json(&volume)
        }
        GetCommand::Volumes { names } => {
            let volumes = match ctx.global.namespace.as_deref() {
                None if use_ids => {
                    client
                        .get_all_volumes(&parse_ids(names, VolumeId::new, "volume")?)
                        .await?
                }
                None => client.get_all_volumes_by_name(&names).await?,
                Some(namespace) => {
                    let namespace = ctx.namespace_id(namespace).await?;
                    if use_ids {
                        client
                            .get_namespace_volumes(
                                &namespace,
                                &parse_ids(names, VolumeId::new, "volume")?,
                            )
                            .await?
                    } else {
                        client
                            .get_namespace_volumes_by_name(&namespace, &names)
                            .await?
                    }
                }
            };
            print_json(&volumes)
        }
    }
}

//! Version-guarded mutations: delete, update and detach.
//!
//! Without `--cas` the client reads the resource once and presents the
//! version it finds. With `--cas` the given version is presented as is and a
//! stale one fails with exit code 8.

use std::time::Duration;

use apiclient::DeleteVolumeParams;
use clap::Subcommand;
use tracing::info;

use super::{print_json, version_constraint, Context};

#[derive(Debug, Subcommand)]
pub enum DeleteCommand {
    /// Delete a volume in --namespace
    Volume {
        name: String,
        /// Only delete if the volume is still at this version
        #[arg(long)]
        cas: Option<String>,
        /// Let the server finish the deletion in the background within this bound
        #[arg(long, value_parser = humantime::parse_duration)]
        async_max: Option<Duration>,
    },
    Namespace {
        name: String,
        #[arg(long)]
        cas: Option<String>,
    },
    User {
        name: String,
        #[arg(long)]
        cas: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum UpdateCommand {
    #[command(subcommand)]
    Volume(UpdateVolumeCommand),
}

#[derive(Debug, Subcommand)]
pub enum UpdateVolumeCommand {
    /// Set the number of replicas kept for a volume in --namespace
    Replicas {
        name: String,
        replicas: u64,
        #[arg(long)]
        cas: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum DetachCommand {
    /// Detach a volume in --namespace from its node
    Volume {
        name: String,
        #[arg(long)]
        cas: Option<String>,
    },
}

pub async fn delete(cmd: DeleteCommand, ctx: &Context) -> anyhow::Result<()> {
    match cmd {
        DeleteCommand::Volume {
            name,
            cas,
            async_max,
        } => {
            let version = version_constraint(cas)?;
            let namespace = ctx.volume_scope().await?;
            let id = ctx.volume_id(&namespace, &name).await?;

            ctx.client
                .delete_volume(&namespace, &id, DeleteVolumeParams { version, async_max })
                .await?;
            info!(volume = %id, namespace = %namespace, "volume deleted");
        }
        DeleteCommand::Namespace { name, cas } => {
            let version = version_constraint(cas)?;
            let id = ctx.namespace_id(&name).await?;
            ctx.client.delete_namespace(&id, version).await?;
            info!(namespace = %id, "namespace deleted");
        }
        DeleteCommand::User { name, cas } => {
            let version = version_constraint(cas)?;
            let id = ctx.user_id(&name).await?;
            ctx.client.delete_user(&id, version).await?;
            info!(user = %id, "user deleted");
        }
    }
    Ok(())
}

pub async fn update(cmd: UpdateCommand, ctx: &Context) -> anyhow::Result<()> {
    let UpdateCommand::Volume(UpdateVolumeCommand::Replicas {
        name,
        replicas,
        cas,
    }) = cmd;

    let version = version_constraint(cas)?;
    let namespace = ctx.volume_scope().await?;
    let id = ctx.volume_id(&namespace, &name).await?;

    let updated = ctx
        .client
        .set_replicas(&namespace, &id, replicas, version)
        .await?;
    print_json(&updated)
}

pub async fn detach(cmd: DetachCommand, ctx: &Context) -> anyhow::Result<()> {
    let DetachCommand::Volume { name, cas } = cmd;

    let version = version_constraint(cas)?;
    let namespace = ctx.volume_scope().await?;
    let id = ctx.volume_id(&namespace, &name).await?;

    ctx.client.detach_volume(&namespace, &id, version).await?;
    info!(volume = %id, namespace = %namespace, "volume detached");
    Ok(())
}

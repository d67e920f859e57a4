//! Command tree and the helpers commands share.
//!
//! Resource arguments are names unless `--use-ids` is set, in which case they
//! are taken as identifiers verbatim. Results print to stdout as JSON.

use std::io::Write;

use anyhow::Context as _;
use apiclient::{Client, NamespaceId, UserId, Version, VersionConstraint, VolumeId};
use clap::Subcommand;
use serde::Serialize;

use crate::config::{ConfigError, GlobalArgs};

pub mod create;
pub mod get;
pub mod modify;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch resources
    #[command(subcommand)]
    Get(get::GetCommand),

    /// Create resources
    #[command(subcommand)]
    Create(create::CreateCommand),

    /// Delete resources
    #[command(subcommand)]
    Delete(modify::DeleteCommand),

    /// Change settings of existing resources
    #[command(subcommand)]
    Update(modify::UpdateCommand),

    /// Detach resources from the node they are attached on
    #[command(subcommand)]
    Detach(modify::DetachCommand),
}

impl Command {
    pub async fn run(self, ctx: &Context) -> anyhow::Result<()> {
        match self {
            Self::Get(cmd) => get::run(cmd, ctx).await,
            Self::Create(cmd) => create::run(cmd, ctx).await,
            Self::Delete(cmd) => modify::delete(cmd, ctx).await,
            Self::Update(cmd) => modify::update(cmd, ctx).await,
            Self::Detach(cmd) => modify::detach(cmd, ctx).await,
        }
    }
}

/// What every command runs against.
pub struct Context {
    pub client: Client,
    pub global: GlobalArgs,
}

impl Context {
    /// Resolves a namespace argument to its identifier.
    pub async fn namespace_id(&self, arg: &str) -> anyhow::Result<NamespaceId> {
        if self.global.use_ids {
            return Ok(parse_id(NamespaceId::new(arg), "namespace")?);
        }
        Ok(self.client.get_namespace_by_name(arg).await?.id)
    }

    /// The namespace volume commands operate in.
    pub async fn volume_scope(&self) -> anyhow::Result<NamespaceId> {
        let namespace = self.global.require_namespace()?;
        self.namespace_id(namespace).await
    }

    pub async fn volume_id(&self, namespace: &NamespaceId, arg: &str) -> anyhow::Result<VolumeId> {
        if self.global.use_ids {
            return Ok(parse_id(VolumeId::new(arg), "volume")?);
        }
        let volume = self
            .client
            .get_volume_by_name(namespace, arg)
            .await
            .with_context(|| format!("resolving volume {arg}"))?;
        Ok(volume.id)
    }

    pub async fn user_id(&self, arg: &str) -> anyhow::Result<UserId> {
        if self.global.use_ids {
            return Ok(parse_id(UserId::new(arg), "user")?);
        }
        Ok(self.client.get_user_by_name(arg).await?.id)
    }
}

pub fn parse_id<T>(id: Option<T>, kind: &'static str) -> Result<T, ConfigError> {
    id.ok_or(ConfigError::EmptyId { kind })
}

pub fn parse_ids<T>(
    args: Vec<String>,
    new: impl Fn(String) -> Option<T>,
    kind: &'static str,
) -> Result<Vec<T>, ConfigError> {
    args.into_iter().map(|arg| parse_id(new(arg), kind)).collect()
}

/// Turns an optional `--cas` argument into a version constraint.
pub fn version_constraint(cas: Option<String>) -> Result<VersionConstraint, ConfigError> {
    match cas {
        None => Ok(VersionConstraint::Unconditional),
        Some(v) => Version::new(v)
            .map(VersionConstraint::Conditional)
            .ok_or(ConfigError::EmptyVersion),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

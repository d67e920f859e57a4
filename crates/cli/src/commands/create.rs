use std::time::Duration;

use apiclient::{FsType, NamespaceSpec, PolicyGroupId, UserSpec, VolumeSpec};
use clap::{Subcommand, ValueEnum};
use tracing::info;

use super::{parse_ids, print_json, Context};
use crate::config::parse_labels;

const DEFAULT_VOLUME_SIZE: &str = "5368709120";

#[derive(Debug, Subcommand)]
pub enum CreateCommand {
    /// Provision a new volume in --namespace
    Volume {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Capacity in bytes
        #[arg(long, default_value = DEFAULT_VOLUME_SIZE)]
        size: u64,
        #[arg(long, value_enum, default_value_t = Filesystem::Ext4)]
        fs_type: Filesystem,
        /// Labels as key=value; repeat or comma separate
        #[arg(long = "labels", value_delimiter = ',')]
        labels: Vec<String>,
        /// Let the server finish provisioning in the background within this bound
        #[arg(long, value_parser = humantime::parse_duration)]
        async_max: Option<Duration>,
    },

    Namespace {
        name: String,
        #[arg(long = "labels", value_delimiter = ',')]
        labels: Vec<String>,
    },

    User {
        #[arg(value_name = "USERNAME")]
        name: String,
        /// Password for the new account (not the one used to log in)
        #[arg(long, env = "STORAGEOS_NEW_USER_PASSWORD", hide_env_values = true)]
        new_password: String,
        #[arg(long)]
        with_admin: bool,
        /// Policy group identifiers to add the user to
        #[arg(long = "with-groups", value_delimiter = ',')]
        groups: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Filesystem {
    Ext4,
    Xfs,
    Btrfs,
    Block,
}

impl From<Filesystem> for FsType {
    fn from(value: Filesystem) -> Self {
        match value {
            Filesystem::Ext4 => Self::Ext4,
            Filesystem::Xfs => Self::Xfs,
            Filesystem::Btrfs => Self::Btrfs,
            Filesystem::Block => Self::Block,
        }
    }
}

pub async fn run(cmd: CreateCommand, ctx: &Context) -> anyhow::Result<()> {
    match cmd {
        CreateCommand::Volume {
            name,
            description,
            size,
            fs_type,
            labels,
            async_max,
        } => {
            let spec = VolumeSpec {
                name,
                description,
                size_bytes: size,
                filesystem: fs_type.into(),
                labels: parse_labels(&labels)?,
            };
            let namespace = ctx.volume_scope().await?;
            let volume = ctx.client.create_volume(&namespace, &spec, async_max).await?;
            info!(volume = %volume.id, namespace = %namespace, "volume created");
            print_json(&volume)
        }

        CreateCommand::Namespace { name, labels } => {
            let spec = NamespaceSpec {
                name,
                labels: parse_labels(&labels)?,
            };
            print_json(&ctx.client.create_namespace(&spec).await?)
        }

        CreateCommand::User {
            name,
            new_password,
            with_admin,
            groups,
        } => {
            let spec = UserSpec {
                username: name,
                password: new_password,
                with_admin,
                groups: parse_ids(groups, PolicyGroupId::new, "policy group")?,
            };
            print_json(&ctx.client.create_user(&spec).await?)
        }
    }
}

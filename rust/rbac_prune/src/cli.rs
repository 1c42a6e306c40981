use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DryRunStrategy, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "rbac-prune")]
#[command(about = "Remove users and groups from every role binding of a namespace")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection and behaviour options shared by the remove commands.
#[derive(Args, Debug, Clone)]
pub struct ClusterArgs {
    /// Cluster API server URL
    #[arg(long, env = "RBAC_PRUNE_SERVER", global = true)]
    pub server: Option<String>,

    /// Bearer token for the API server
    #[arg(long, env = "RBAC_PRUNE_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Namespace (project) whose role bindings are pruned
    #[arg(
        long,
        short = 'n',
        env = "RBAC_PRUNE_NAMESPACE",
        default_value = "default",
        global = true
    )]
    pub namespace: String,

    /// PEM file with the certificate authority of the API server
    #[arg(long, value_name = "PATH", global = true)]
    pub certificate_authority: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(long, default_value = "false", global = true)]
    pub insecure_skip_tls_verify: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30, global = true)]
    pub request_timeout: u64,

    /// Only print what would change: "client" skips the API calls,
    /// "server" sends them with dryRun=All
    #[arg(
        long,
        value_enum,
        default_value_t = DryRunStrategy::None,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "client",
        global = true
    )]
    pub dry_run: DryRunStrategy,

    /// Print the changed bindings instead of applying them
    #[arg(long, short = 'o', value_enum, global = true)]
    pub output: Option<OutputFormat>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove users from every role binding of the namespace
    RemoveUser {
        #[arg(value_name = "USER")]
        users: Vec<String>,
    },
    /// Remove groups from every role binding of the namespace
    RemoveGroup {
        #[arg(value_name = "GROUP")]
        groups: Vec<String>,
    },
    /// Print version
    Version,
}

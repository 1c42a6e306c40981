//! `rbac-prune`: remove users or groups from every role binding of a
//! namespace on a cluster API server.
//!
//! The reconciliation itself lives in `rbac_core`; this crate parses the
//! command line, talks HTTP and prints.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod output;

use std::io::Write;

use anyhow::{bail, Context};
use rbac_core::{Outcome, Reconciler, RemovalRequest};
use tracing::{info, warn};

use crate::cli::{ClusterArgs, Cli, Commands};
use crate::client::KubeClient;
use crate::config::{ClusterConfig, OutputFormat};
use crate::error::failure_hint;
use crate::output::{write_list, TextReport};

/// Execute a parsed command line, writing user-facing output to `out`.
pub fn run<W: Write>(cli: Cli, out: &mut W) -> anyhow::Result<()> {
    match cli.command {
        Commands::RemoveUser { users } => {
            require_targets(&users, "user")?;
            remove(&cli.cluster, RemovalRequest::users(users), out)
        }
        Commands::RemoveGroup { groups } => {
            require_targets(&groups, "group")?;
            remove(&cli.cluster, RemovalRequest::groups(groups), out)
        }
        Commands::Version => {
            writeln!(out, "rbac-prune {}", env!("CARGO_PKG_VERSION"))?;
            Ok(())
        }
    }
}

fn require_targets(targets: &[String], kind: &str) -> anyhow::Result<()> {
    if targets.is_empty() {
        bail!("you must specify at least one argument: <{kind}> [{kind}]...");
    }
    Ok(())
}

fn remove<W: Write>(args: &ClusterArgs, request: RemovalRequest, out: &mut W) -> anyhow::Result<()> {
    let config = ClusterConfig::from_args(args)?;
    let client = KubeClient::new(&config).context("building API client")?;
    let mode = config.dispatch_mode();

    info!(
        server = %config.server,
        namespace = %config.namespace,
        ?mode,
        users = request.users.len(),
        groups = request.groups.len(),
        "pruning role bindings"
    );

    let reconciler = Reconciler::new(config.namespace.clone(), request, mode);
    let mut text = TextReport::new(&mut *out, config.dry_run.suffix());
    let outcome = reconciler.run(&client, &client, &mut text);
    // lines written before a failure stay on the terminal
    text.finish().context("writing report")?;

    let outcome = outcome.map_err(|err| {
        if let Some(hint) = failure_hint(&err) {
            warn!(binding = ?err.binding_name(), "{}", hint);
        }
        err
    })?;

    match outcome {
        Outcome::Report(_) => Ok(()),
        Outcome::Accumulated(list) => {
            let format = config.output.unwrap_or(OutputFormat::Json);
            write_list(out, &list, format).context("writing output")
        }
    }
}

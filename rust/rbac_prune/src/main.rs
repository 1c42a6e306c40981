//! rbac-prune - strip users or groups from the role bindings of a namespace.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rbac_prune::cli::Cli;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    rbac_prune::run(cli, &mut out)
}

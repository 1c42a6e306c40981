//! Validated cluster configuration built from the command line.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use rbac_core::DispatchMode;
use thiserror::Error;

use crate::cli::ClusterArgs;

/// Connect timeout for the API server; not configurable.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no API server given; pass --server or set RBAC_PRUNE_SERVER")]
    MissingServer,

    #[error("invalid server URL {url:?}: must start with http:// or https://")]
    InvalidServer { url: String },

    #[error("namespace must not be empty")]
    EmptyNamespace,

    #[error("request timeout must be at least one second")]
    ZeroTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DryRunStrategy {
    /// Apply changes
    #[default]
    None,
    /// Compute and print changes without calling the API
    Client,
    /// Send changes with dryRun=All; the server validates but does not persist
    Server,
}

impl DryRunStrategy {
    /// Marker inserted before the period of every report line. Server
    /// dry-run lines read like live ones.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::None | Self::Server => "",
            Self::Client => " (dry client run)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `v1` List of the changed bindings as JSON
    Json,
    /// One `rolebinding.rbac.authorization.k8s.io/<name>` per line
    Name,
}

#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Without trailing slash.
    pub server: String,
    pub token: Option<String>,
    pub namespace: String,
    pub certificate_authority: Option<PathBuf>,
    pub insecure_skip_tls_verify: bool,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub dry_run: DryRunStrategy,
    pub output: Option<OutputFormat>,
}

impl ClusterConfig {
    pub fn from_args(args: &ClusterArgs) -> Result<Self, ConfigError> {
        let server = args
            .server
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingServer)?;
        if !(server.starts_with("http://") || server.starts_with("https://")) {
            return Err(ConfigError::InvalidServer {
                url: server.to_string(),
            });
        }

        let namespace = args.namespace.trim();
        if namespace.is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if args.request_timeout == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(Self {
            server: server.trim_end_matches('/').to_string(),
            token: args.token.clone().filter(|t| !t.is_empty()),
            namespace: namespace.to_string(),
            certificate_authority: args.certificate_authority.clone(),
            insecure_skip_tls_verify: args.insecure_skip_tls_verify,
            request_timeout: Duration::from_secs(args.request_timeout),
            connect_timeout: CONNECT_TIMEOUT,
            dry_run: args.dry_run,
            output: args.output,
        })
    }

    /// Structured output wins over dry-run; server dry-run is a live dispatch
    /// whose requests carry `dryRun=All`.
    pub fn dispatch_mode(&self) -> DispatchMode {
        if self.output.is_some() {
            return DispatchMode::AccumulateOnly;
        }
        match self.dry_run {
            DryRunStrategy::None | DryRunStrategy::Server => DispatchMode::Live,
            DryRunStrategy::Client => DispatchMode::DryRun,
        }
    }

    pub fn server_dry_run(&self) -> bool {
        self.dry_run == DryRunStrategy::Server
    }
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Manage Argo CD applications and projects across many instances
#[derive(Debug, Parser)]
#[clap(name = "argo-bridge", version)]
pub(crate) struct App {
    #[clap(flatten)]
    pub global_opts: GlobalOpts,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub(crate) struct GlobalOpts {
    /// Config file listing the Argo CD instances and project policy
    #[arg(short, long, env = "ARGO_BRIDGE_CONFIG", default_value = "app-config.yaml")]
    pub config: PathBuf,

    /// Default username for instances without their own credentials
    #[arg(long, env = "ARGOCD_USERNAME")]
    pub username: Option<String>,

    /// Default password for instances without their own credentials
    #[arg(long, env = "ARGOCD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// List the configured Argo CD instances
    Instances {},
    /// Find applications by name or label selector on every instance
    Find(FindArgs),
    /// Create a project and an application on one instance
    Create(CreateArgs),
    /// Update a project and its application, migrating the source repo if it changed
    Update(UpdateArgs),
    /// Delete an application and, once it is gone, its project
    Delete(DeleteArgs),
    /// Sync one application
    Sync(AppArgs),
    /// Sync every application matching a selector on every instance
    Resync {
        /// Label selector, e.g. backstage-name=payments
        #[arg(short, long)]
        selector: String,
    },
    /// Terminate the running operation of an application
    Terminate(AppArgs),
    /// Show the raw status of an application
    Status(AppArgs),
    /// Show a project
    Project {
        #[arg(short, long)]
        instance: String,
        #[arg(short, long)]
        project: String,
    },
    /// Show commit metadata for an application revision
    Revision(RevisionArgs),
}

#[derive(Debug, Args)]
pub(crate) struct FindArgs {
    /// Exact application name
    #[arg(long, required_unless_present = "selector")]
    pub name: Option<String>,

    /// Label selector; takes precedence over --name
    #[arg(long)]
    pub selector: Option<String>,

    #[arg(long)]
    pub namespace: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct AppArgs {
    /// Name of the Argo CD instance
    #[arg(short, long)]
    pub instance: String,

    #[arg(short, long)]
    pub app: String,

    /// Namespace of a namespace-scoped application
    #[arg(long)]
    pub namespace: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct RevisionArgs {
    #[clap(flatten)]
    pub app: AppArgs,

    #[arg(short, long)]
    pub revision: String,
}

#[derive(Debug, Args)]
pub(crate) struct CreateArgs {
    #[arg(short, long)]
    pub instance: String,

    #[arg(short, long)]
    pub app: String,

    /// Defaults to the application name
    #[arg(short, long)]
    pub project: Option<String>,

    /// Destination namespace
    #[arg(short, long)]
    pub namespace: String,

    #[arg(long)]
    pub repo: String,

    #[arg(long)]
    pub path: String,

    /// Value of the backstage-name label, defaults to the application name
    #[arg(long)]
    pub label: Option<String>,

    #[arg(long)]
    pub destination_server: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct UpdateArgs {
    #[arg(short, long)]
    pub instance: String,

    #[arg(short, long)]
    pub app: String,

    #[arg(short, long)]
    pub project: String,

    /// Destination namespace
    #[arg(short, long)]
    pub namespace: String,

    #[arg(long)]
    pub repo: String,

    #[arg(long)]
    pub path: String,

    /// Value of the backstage-name label, defaults to the application name
    #[arg(long)]
    pub label: Option<String>,

    #[arg(long)]
    pub destination_server: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct DeleteTarget {
    #[arg(short, long)]
    pub instance: String,

    #[arg(short, long)]
    pub app: String,

    /// Project to delete afterwards, defaults to the application name
    #[arg(short, long)]
    pub project: Option<String>,

    #[arg(long)]
    pub namespace: Option<String>,

    /// Terminate any running operation before deleting
    #[arg(short, long, default_value_t = false)]
    pub terminate: bool,
}

#[derive(Debug, Args)]
pub(crate) struct DeleteArgs {
    #[clap(flatten)]
    pub delete: DeleteTarget,

    /// Skip the confirmation prompt
    #[arg(short, long, default_value_t = false)]
    pub yes: bool,
}

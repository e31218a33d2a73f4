use crate::model::Workflow;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "kubeaccess",
    version,
    about = "Compose Kubernetes RBAC roles and scoped kubeconfigs from the terminal."
)]
pub struct CliArgs {
    /// Base URL of the access-management API
    #[arg(long, env = "KUBEACCESS_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Namespace preselected in both workflows
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Open a workflow directly instead of the selector (role, kubeconfig)
    #[arg(short, long, value_parser = parse_workflow)]
    pub workflow: Option<Workflow>,

    /// Directory generated files are saved into
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long)]
    pub log_filter: Option<String>,

    /// Append logs to this file instead of discarding them
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

fn parse_workflow(token: &str) -> Result<Workflow, String> {
    Workflow::from_token(token)
        .ok_or_else(|| format!("unknown workflow '{token}', expected 'role' or 'kubeconfig'"))
}

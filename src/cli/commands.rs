// CLI command definitions

use super::node::{
    InstallCommand, JoinCommand, PlanCommand, RenderCommand, ResetCommand, UpgradeCommand,
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "kube-bootstrap",
    version,
    about = "Bootstrap and upgrade Kubernetes nodes with kubeadm",
    long_about = "A standalone CLI tool that renders kubeadm configuration for the target \
                  Kubernetes release and drives init, join, reset and skew-checked upgrades \
                  on the local host"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Render the kubeadm configuration for a version without touching the host
    Render(RenderCommand),

    /// Initialise the first control-plane node (resets the node on failure)
    Install(InstallCommand),

    /// Join this host to an existing cluster (resets the node on failure)
    Join(JoinCommand),

    /// Tear down kubeadm state on this host
    Reset(ResetCommand),

    /// Upgrade this node, one minor release at a time
    Upgrade(UpgradeCommand),

    /// Show how an upgrade would proceed without changing anything
    Plan(PlanCommand),
}

// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::config::params::non_empty;
use crate::domain::config::{
    render, render_join, select, write_private_file, ConfigParameters, RenderedDocument,
};
use crate::domain::upgrade::{
    ObservedVersions, UpgradeGovernor, UpgradePlan, UpgradeReport, UpgradeRoutines,
};
use crate::domain::version::Version;
use crate::infrastructure::addons::{addon_context, AddonManifest};
use crate::infrastructure::constants::{
    ADDON_DIR, DEFAULT_CRI_SOCKET, KUBEADM_CONF_FILE, KUBELET_SERVICE, KUBE_PACKAGES,
};
use crate::infrastructure::executor::{CommandOutput, CommandSpec, Executor};
use crate::infrastructure::tools::{
    parse_recorded_version, parse_version_report, Kubeadm, Kubectl, NodeRole, PackageManager,
    Systemctl,
};
use crate::shared::error::{BootstrapError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Drives kubeadm, kubectl, systemctl and the package manager on this host.
pub struct NodeOrchestrator {
    executor: Arc<dyn Executor>,
    kubeadm: Kubeadm,
    kubectl: Kubectl,
    systemctl: Systemctl,
    packages: Option<PackageManager>,
    config_path: PathBuf,
    addon_dir: PathBuf,
}

impl NodeOrchestrator {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            kubeadm: Kubeadm::default(),
            kubectl: Kubectl::default(),
            systemctl: Systemctl::default(),
            packages: None,
            config_path: PathBuf::from(KUBEADM_CONF_FILE),
            addon_dir: PathBuf::from(ADDON_DIR),
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    pub fn with_addon_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.addon_dir = dir.into();
        self
    }

    pub fn with_kubectl(mut self, kubectl: Kubectl) -> Self {
        self.kubectl = kubectl;
        self
    }

    pub fn with_package_manager(mut self, packages: PackageManager) -> Self {
        self.packages = Some(packages);
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput> {
        self.executor.run(&spec).await
    }

    /// Initialise the first control-plane node. Any failure up to and
    /// including `kubeadm init` resets the node before the error is returned.
    pub async fn install(
        &self,
        version: &Version,
        params: &ConfigParameters,
        addons: &[AddonManifest],
    ) -> Result<()> {
        info!("Installing Kubernetes {} control plane", version);

        if let Err(err) = self.init(version, params).await {
            self.compensate(params, &err).await;
            return Err(err);
        }

        self.start_kubelet().await?;
        self.apply_addons(version, params, addons).await?;

        info!("Control plane {} installed", version);
        Ok(())
    }

    async fn init(&self, version: &Version, params: &ConfigParameters) -> Result<()> {
        let selection = select(version)?;
        render(&selection, params)?.write_to(&self.config_path)?;
        self.run(self.kubeadm.init(&self.config_path)).await?;
        Ok(())
    }

    /// Join this host to an existing cluster, with the same reset-on-failure
    /// behaviour as [`install`](Self::install).
    pub async fn join(&self, version: &Version, params: &ConfigParameters) -> Result<()> {
        info!("Joining node to Kubernetes {} cluster", version);

        if let Err(err) = self.join_node(version, params).await {
            self.compensate(params, &err).await;
            return Err(err);
        }

        self.start_kubelet().await?;
        info!("Node joined");
        Ok(())
    }

    async fn join_node(&self, version: &Version, params: &ConfigParameters) -> Result<()> {
        let selection = select(version)?;
        render_join(&selection, params)?.write_to(&self.config_path)?;
        self.run(self.kubeadm.join(&self.config_path)).await?;
        Ok(())
    }

    /// Tear the node down. Safe to call on a host that was never initialised.
    pub async fn reset(&self, cri_socket: &str) -> Result<()> {
        info!("Resetting node");
        self.run(self.kubeadm.reset(cri_socket)).await?;
        Ok(())
    }

    async fn compensate(&self, params: &ConfigParameters, cause: &BootstrapError) {
        warn!("Node setup failed, resetting: {}", cause);
        let cri_socket = non_empty(&params.cri_socket).unwrap_or(DEFAULT_CRI_SOCKET);
        if let Err(err) = self.reset(cri_socket).await {
            warn!("Compensating reset failed: {}", err);
        }
    }

    async fn start_kubelet(&self) -> Result<()> {
        self.run(self.systemctl.enable(KUBELET_SERVICE)).await?;
        self.run(self.systemctl.start(KUBELET_SERVICE)).await?;
        Ok(())
    }

    async fn apply_addons(
        &self,
        version: &Version,
        params: &ConfigParameters,
        addons: &[AddonManifest],
    ) -> Result<()> {
        if addons.is_empty() {
            return Ok(());
        }

        let context = addon_context(version, params);
        for addon in addons {
            let manifest = addon.render(&context)?;
            let path = addon.target_path(&self.addon_dir);
            write_private_file(&path, &manifest)?;
            info!("Applying add-on {}", addon.name);
            self.run(self.kubectl.apply(&path)).await?;
        }
        Ok(())
    }

    /// Observe the cluster and classify an upgrade to `target` without
    /// changing anything.
    pub async fn plan_upgrade(&self, target: &Version, role: NodeRole) -> Result<UpgradePlan> {
        let routines = HostUpgrade {
            orchestrator: self,
            role,
            document: None,
        };
        UpgradeGovernor::new(&routines).plan(target).await
    }

    /// Upgrade this node to `target`. When `params` are given the stored
    /// kubeadm configuration is replaced with one rendered for `target` and
    /// `role`; it is rendered before anything on the host changes.
    pub async fn upgrade(
        &self,
        target: &Version,
        role: NodeRole,
        params: Option<&ConfigParameters>,
    ) -> Result<UpgradeReport> {
        let document = params
            .map(|params| render_for_role(target, role, params))
            .transpose()?;
        let routines = HostUpgrade {
            orchestrator: self,
            role,
            document: document.as_ref(),
        };
        UpgradeGovernor::new(&routines).upgrade(target).await
    }
}

/// The primary node keeps init documents, every other node join documents.
fn render_for_role(
    version: &Version,
    role: NodeRole,
    params: &ConfigParameters,
) -> Result<RenderedDocument> {
    let selection = select(version)?;
    match role {
        NodeRole::Primary => render(&selection, params),
        NodeRole::ControlPlane | NodeRole::Worker => render_join(&selection, params),
    }
}

/// Upgrade routines for one node role, run against the orchestrator's host
pub struct HostUpgrade<'a> {
    orchestrator: &'a NodeOrchestrator,
    role: NodeRole,
    /// Configuration for the final target, written by the patch routine
    document: Option<&'a RenderedDocument>,
}

impl HostUpgrade<'_> {
    async fn converge(&self, version: &Version, document: Option<&RenderedDocument>) -> Result<()> {
        let node = self.orchestrator;
        let packages = node.packages.ok_or_else(|| {
            BootstrapError::config_error("no package manager configured for upgrade")
        })?;

        node.run(packages.install(&KUBE_PACKAGES, version)).await?;

        if let Some(document) = document {
            document.write_to(&node.config_path)?;
        }

        node.run(node.kubeadm.upgrade(self.role, version)).await?;
        node.run(node.systemctl.daemon_reload()).await?;
        node.run(node.systemctl.restart(KUBELET_SERVICE)).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl UpgradeRoutines for HostUpgrade<'_> {
    async fn observe(&self) -> Result<ObservedVersions> {
        let node = self.orchestrator;
        let output = node.run(node.kubectl.version()).await?;
        let reported = parse_version_report(&output.stdout)?;
        let output = node.run(node.kubectl.kubeadm_config()).await?;
        let recorded = parse_recorded_version(&output.stdout)?;

        Ok(ObservedVersions {
            client: reported.client,
            server: reported.server,
            recorded,
        })
    }

    async fn minor(&self, staging: &Version) -> Result<()> {
        info!("Upgrading {} node to {}", self.role, staging);
        self.converge(staging, None).await
    }

    async fn patch(&self, target: &Version) -> Result<()> {
        info!("Converging {} node to {}", self.role, target);
        self.converge(target, self.document).await
    }
}

//! Node lifecycle commands

use crate::cli::display::TableRenderer;
use crate::domain::cluster::NodeOrchestrator;
use crate::domain::config::{
    apply_to_params, parse_taints, render, render_join, select, ConfigParameters,
};
use crate::domain::version::Version;
use crate::infrastructure::addons::{load_dir, AddonManifest};
use crate::infrastructure::constants::{ADMIN_KUBECONFIG, DEFAULT_CRI_SOCKET, KUBEADM_CONF_FILE, KUBECTL_BIN};
use crate::infrastructure::host::host_reserved_memory;
use crate::infrastructure::tools::{Kubectl, NodeRole, PackageManager};
use crate::infrastructure::SystemExecutor;
use crate::shared::BootstrapError;
use anyhow::Context;
use clap::{Args, Parser};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Parameter sources shared by every command that renders configuration
#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// Path to a TOML parameter file
    #[arg(long, value_name = "PATH")]
    pub config_file: Option<String>,

    /// Address the API server advertises, host[:port]
    #[arg(long)]
    pub advertise_address: Option<String>,

    /// Shared endpoint for all control-plane nodes, host[:port]
    #[arg(long)]
    pub control_plane_endpoint: Option<String>,

    #[arg(long)]
    pub node_name: Option<String>,

    /// Container runtime socket
    #[arg(long)]
    pub cri_socket: Option<String>,

    #[arg(long)]
    pub pod_subnet: Option<String>,

    #[arg(long)]
    pub service_subnet: Option<String>,

    /// aws, azure, gce, openstack or vsphere
    #[arg(long)]
    pub cloud_provider: Option<String>,

    /// Node pool label value (node-pool=<name>)
    #[arg(long)]
    pub node_pool: Option<String>,

    /// Comma-separated taints, e.g. dedicated=infra:NoSchedule,gpu:NoExecute
    #[arg(long)]
    pub taints: Option<String>,

    /// Dynamic configuration properties to override any parameter (-D key=value)
    ///
    /// API: api.advertise-address, api.control-plane-endpoint
    /// Node: node.name, node.cri-socket, node.pool, node.taints
    /// Networking: networking.service-subnet, networking.pod-subnet, networking.dns-domain
    /// Cluster: cluster.name, cloud.provider, images.repository
    /// API server: apiserver.cert-sans, apiserver.oidc-issuer-url, apiserver.oidc-client-id,
    ///   apiserver.kubelet-certificate-authority, apiserver.enable-admission-plugins,
    ///   apiserver.disable-admission-plugins, apiserver.audit-log-dir,
    ///   apiserver.encryption-provider-config
    /// Controller manager: controller-manager.signing-cert-file, controller-manager.signing-key-file
    /// Kubelet: kubelet.reserved-cpu, kubelet.reserved-memory, kubelet.cgroup-driver
    /// Etcd: etcd.endpoints, etcd.ca-file, etcd.cert-file, etcd.key-file, etcd.data-dir
    /// Tokens: bootstrap.token, bootstrap.certificate-key
    /// Join: join.api-server-endpoint, join.token, join.ca-cert-hashes,
    ///   join.unsafe-skip-ca-verification, join.control-plane
    ///
    /// Example: -Dnetworking.pod-subnet=10.244.0.0/16 -Dapiserver.cert-sans=a.example.com,b.example.com
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

impl ParamArgs {
    /// File, then -D properties, then explicit flags
    pub fn load(&self) -> anyhow::Result<ConfigParameters> {
        let mut params = match &self.config_file {
            Some(path) => {
                if !std::path::Path::new(path).exists() {
                    anyhow::bail!("❌ Parameter file not found: {}", path);
                }
                ConfigParameters::from(path)
                    .with_context(|| format!("Failed to load parameters from {}", path))?
            }
            None => ConfigParameters::default(),
        };

        if !self.properties.is_empty() {
            let configs = parse_dynamic_configs(&self.properties)
                .map_err(|e| anyhow::anyhow!("Failed to parse dynamic configs: {}", e))?;
            apply_to_params(&configs, &mut params)?;
        }

        if let Some(ref address) = self.advertise_address {
            params.advertise_address = address.clone();
        }
        let overrides = [
            (&self.control_plane_endpoint, &mut params.control_plane_endpoint),
            (&self.node_name, &mut params.node_name),
            (&self.cri_socket, &mut params.cri_socket),
            (&self.pod_subnet, &mut params.networking.pod_subnet),
            (&self.service_subnet, &mut params.networking.service_subnet),
            (&self.cloud_provider, &mut params.cloud_provider),
            (&self.node_pool, &mut params.node_pool),
        ];
        for (flag, field) in overrides {
            if flag.is_some() {
                *field = flag.clone();
            }
        }
        if let Some(ref taints) = self.taints {
            params.taints = parse_taints(taints)?;
        }

        Ok(params)
    }

    fn has_sources(&self) -> bool {
        self.config_file.is_some()
            || !self.properties.is_empty()
            || self.advertise_address.is_some()
            || self.control_plane_endpoint.is_some()
            || self.node_name.is_some()
            || self.cri_socket.is_some()
            || self.pod_subnet.is_some()
            || self.service_subnet.is_some()
            || self.cloud_provider.is_some()
            || self.node_pool.is_some()
            || self.taints.is_some()
    }
}

fn parse_version(input: &str) -> anyhow::Result<Version> {
    Version::parse(input).with_context(|| format!("Invalid --kubernetes-version '{}'", input))
}

fn reserve_host_memory(params: &mut ConfigParameters) {
    if params.kubelet.reserved_memory.is_none() {
        params.kubelet.reserved_memory = Some(host_reserved_memory());
    }
}

fn executor(timeout_secs: Option<u64>) -> Arc<SystemExecutor> {
    let executor = SystemExecutor::new();
    Arc::new(match timeout_secs {
        Some(secs) => executor.with_timeout(Duration::from_secs(secs)),
        None => executor,
    })
}

#[derive(Parser, Debug, Clone)]
pub struct RenderCommand {
    /// Target Kubernetes version, e.g. v1.16.3
    #[arg(long, short = 'k')]
    pub kubernetes_version: String,

    /// Render a JoinConfiguration instead of init documents
    #[arg(long)]
    pub join: bool,

    /// Write to this path (mode 0600) instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<String>,

    #[command(flatten)]
    pub params: ParamArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct InstallCommand {
    /// Target Kubernetes version, e.g. v1.16.3
    #[arg(long, short = 'k')]
    pub kubernetes_version: String,

    /// Where the rendered kubeadm configuration is written
    #[arg(long, default_value = KUBEADM_CONF_FILE)]
    pub kubeadm_config: String,

    /// Directory of add-on manifest templates applied after init
    #[arg(long, value_name = "DIR")]
    pub addons: Option<String>,

    /// Kill any external command running longer than this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[command(flatten)]
    pub params: ParamArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct JoinCommand {
    /// Cluster Kubernetes version, e.g. v1.16.3
    #[arg(long, short = 'k')]
    pub kubernetes_version: String,

    #[arg(long, default_value = KUBEADM_CONF_FILE)]
    pub kubeadm_config: String,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[command(flatten)]
    pub params: ParamArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct ResetCommand {
    /// Container runtime socket passed to kubeadm reset
    #[arg(long, default_value = DEFAULT_CRI_SOCKET)]
    pub cri_socket: String,

    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Parser, Debug, Clone)]
pub struct UpgradeCommand {
    /// Target Kubernetes version, at most one minor release ahead
    #[arg(long, short = 'k')]
    pub kubernetes_version: String,

    /// primary, control-plane or worker
    #[arg(long, default_value = "primary")]
    pub role: NodeRole,

    /// Kubeconfig used to query the running cluster
    #[arg(long, default_value = ADMIN_KUBECONFIG)]
    pub kubeconfig: String,

    /// Stored kubeadm configuration, rewritten for the target version when
    /// parameters are supplied (init documents on the primary, join elsewhere)
    #[arg(long, default_value = KUBEADM_CONF_FILE)]
    pub kubeadm_config: String,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[command(flatten)]
    pub params: ParamArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct PlanCommand {
    /// Target Kubernetes version
    #[arg(long, short = 'k')]
    pub kubernetes_version: String,

    #[arg(long, default_value = "primary")]
    pub role: NodeRole,

    #[arg(long, default_value = ADMIN_KUBECONFIG)]
    pub kubeconfig: String,
}

impl RenderCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let version = parse_version(&self.kubernetes_version)?;
        let params = self.params.load()?;
        let selection = select(&version)?;

        let document = if self.join {
            render_join(&selection, &params)?
        } else {
            render(&selection, &params)?
        };

        match &self.output {
            Some(path) => {
                document.write_to(path)?;
                let renderer = TableRenderer::new();
                println!("{}", renderer.render_document_summary(&selection, path));
            }
            None => print!("{}", document.text),
        }
        Ok(())
    }
}

impl InstallCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let version = parse_version(&self.kubernetes_version)?;
        let mut params = self.params.load()?;
        reserve_host_memory(&mut params);

        let addons: Vec<AddonManifest> = match &self.addons {
            Some(dir) => load_dir(dir).with_context(|| format!("Failed to load add-ons from {}", dir))?,
            None => Vec::new(),
        };

        let orchestrator = NodeOrchestrator::new(executor(self.timeout_secs))
            .with_config_path(&self.kubeadm_config);

        orchestrator
            .install(&version, &params, &addons)
            .await
            .map_err(|e| anyhow::anyhow!("Install failed: {}", e))?;

        println!("✓ Kubernetes {} control plane installed", version);
        Ok(())
    }
}

impl JoinCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let version = parse_version(&self.kubernetes_version)?;
        let mut params = self.params.load()?;
        reserve_host_memory(&mut params);

        let orchestrator = NodeOrchestrator::new(executor(self.timeout_secs))
            .with_config_path(&self.kubeadm_config);

        orchestrator
            .join(&version, &params)
            .await
            .map_err(|e| anyhow::anyhow!("Join failed: {}", e))?;

        println!("✓ Node joined Kubernetes {} cluster", version);
        Ok(())
    }
}

impl ResetCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let orchestrator = NodeOrchestrator::new(executor(self.timeout_secs));
        orchestrator
            .reset(&self.cri_socket)
            .await
            .map_err(|e| anyhow::anyhow!("Reset failed: {}", e))?;

        println!("✓ Node reset");
        Ok(())
    }
}

impl UpgradeCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let version = parse_version(&self.kubernetes_version)?;
        let params = if self.params.has_sources() {
            Some(self.params.load()?)
        } else {
            None
        };
        let packages = PackageManager::detect()?;

        let orchestrator = NodeOrchestrator::new(executor(self.timeout_secs))
            .with_config_path(&self.kubeadm_config)
            .with_kubectl(Kubectl::new(KUBECTL_BIN, &self.kubeconfig))
            .with_package_manager(packages);

        let report = orchestrator
            .upgrade(&version, self.role, params.as_ref())
            .await
            .map_err(|e| anyhow::anyhow!("Upgrade failed: {}", e))?;

        println!(
            "✓ {} node upgraded from {} to {} ({} upgrade)",
            self.role, report.from, report.to, report.classification
        );
        Ok(())
    }
}

impl PlanCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let version = parse_version(&self.kubernetes_version)?;
        let orchestrator = NodeOrchestrator::new(executor(None))
            .with_kubectl(Kubectl::new(KUBECTL_BIN, &self.kubeconfig));
        let renderer = TableRenderer::new();

        match orchestrator.plan_upgrade(&version, self.role).await {
            Ok(plan) => {
                println!("{}", renderer.render_upgrade_plan(&plan, self.role));
                Ok(())
            }
            Err(err) if is_policy_rejection(&err) => {
                println!("{}", renderer.render_rejection(&version, &err));
                anyhow::bail!("Upgrade to {} is not allowed", version)
            }
            Err(err) => Err(anyhow::anyhow!("Failed to plan upgrade: {}", err)),
        }
    }
}

fn is_policy_rejection(err: &BootstrapError) -> bool {
    matches!(
        err,
        BootstrapError::MajorUpgradeUnsupported { .. }
            | BootstrapError::DowngradeUnsupported { .. }
            | BootstrapError::SkewTooLarge { .. }
            | BootstrapError::UnsupportedVersion { .. }
    )
}

/// Parse dynamic configuration properties from -D key=value format
pub fn parse_dynamic_configs(configs: &[String]) -> Result<HashMap<String, String>, String> {
    let mut map = HashMap::new();

    for config in configs {
        let (key, value) = config.split_once('=').ok_or_else(|| {
            format!("Invalid config format: '{}'. Expected 'key=value'", config)
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(format!("Empty key in config: '{}'", config));
        }

        map.insert(key.to_string(), value.trim().to_string());
    }

    Ok(map)
}

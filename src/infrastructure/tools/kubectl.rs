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

//! kubectl invocations and parsing of their JSON output.
//!
//! All commands carry the admin kubeconfig as a child-only `KUBECONFIG`
//! environment variable.

use crate::domain::version::Version;
use crate::infrastructure::constants::{
    ADMIN_KUBECONFIG, KUBEADM_CLUSTER_CONFIG_KEY, KUBEADM_CONFIG_MAP, KUBEADM_CONFIG_NAMESPACE,
    KUBECTL_BIN,
};
use crate::infrastructure::executor::CommandSpec;
use crate::shared::error::{BootstrapError, Result};
use k8s_openapi::api::core::v1::ConfigMap;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Kubectl {
    bin: String,
    kubeconfig: String,
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new(KUBECTL_BIN, ADMIN_KUBECONFIG)
    }
}

impl Kubectl {
    pub fn new(bin: impl Into<String>, kubeconfig: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            kubeconfig: kubeconfig.into(),
        }
    }

    fn command(&self) -> CommandSpec {
        CommandSpec::new(&self.bin).env("KUBECONFIG", &self.kubeconfig)
    }

    pub fn version(&self) -> CommandSpec {
        self.command().args(["version", "-o", "json"]).quiet()
    }

    pub fn kubeadm_config(&self) -> CommandSpec {
        self.command()
            .args(["get", "configmap", KUBEADM_CONFIG_MAP, "-n", KUBEADM_CONFIG_NAMESPACE])
            .args(["-o", "json"])
            .quiet()
    }

    pub fn apply(&self, manifest: &Path) -> CommandSpec {
        self.command()
            .arg("apply")
            .arg("-f")
            .arg(manifest.display().to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionReport {
    client_version: Option<VersionInfo>,
    server_version: Option<VersionInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionInfo {
    git_version: String,
}

/// Client and server versions reported by `kubectl version -o json`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportedVersions {
    pub client: Version,
    pub server: Version,
}

pub fn parse_version_report(json: &str) -> Result<ReportedVersions> {
    let report: VersionReport = serde_json::from_str(json)?;

    let client = report
        .client_version
        .ok_or_else(|| BootstrapError::ValidationError("kubectl did not report a client version".to_string()))?;
    let server = report
        .server_version
        .ok_or_else(|| BootstrapError::ValidationError("kubectl did not report a server version".to_string()))?;

    Ok(ReportedVersions {
        client: Version::parse(&client.git_version)?,
        server: Version::parse(&server.git_version)?,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordedClusterConfiguration {
    kubernetes_version: String,
}

/// The `kubernetesVersion` recorded in the kubeadm-config ConfigMap
pub fn parse_recorded_version(json: &str) -> Result<Version> {
    let config_map: ConfigMap = serde_json::from_str(json)?;

    let document = config_map
        .data
        .as_ref()
        .and_then(|data| data.get(KUBEADM_CLUSTER_CONFIG_KEY))
        .ok_or_else(|| {
            BootstrapError::ValidationError(format!(
                "ConfigMap {}/{} has no {} entry",
                KUBEADM_CONFIG_NAMESPACE, KUBEADM_CONFIG_MAP, KUBEADM_CLUSTER_CONFIG_KEY
            ))
        })?;

    let recorded: RecordedClusterConfiguration = serde_yaml::from_str(document)?;
    Version::parse(&recorded.kubernetes_version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_scope_kubeconfig() {
        let kubectl = Kubectl::default();
        let spec = kubectl.version();
        assert_eq!(spec.to_string(), "kubectl version -o json");
        assert_eq!(
            spec.envs,
            vec![("KUBECONFIG".to_string(), ADMIN_KUBECONFIG.to_string())]
        );
        assert!(spec.quiet);

        assert_eq!(
            kubectl.kubeadm_config().to_string(),
            "kubectl get configmap kubeadm-config -n kube-system -o json"
        );
        assert_eq!(
            kubectl.apply(Path::new("/etc/kubernetes/addons/calico.yaml")).to_string(),
            "kubectl apply -f /etc/kubernetes/addons/calico.yaml"
        );
    }

    #[test]
    fn test_parse_version_report() {
        let json = r#"{
            "clientVersion": {"major": "1", "minor": "16", "gitVersion": "v1.16.3", "platform": "linux/amd64"},
            "serverVersion": {"major": "1", "minor": "16", "gitVersion": "v1.16.2", "platform": "linux/amd64"}
        }"#;
        let versions = parse_version_report(json).unwrap();
        assert_eq!(versions.client, Version::new(1, 16, 3));
        assert_eq!(versions.server, Version::new(1, 16, 2));
    }

    #[test]
    fn test_missing_server_version() {
        let json = r#"{"clientVersion": {"gitVersion": "v1.16.3"}}"#;
        assert!(matches!(
            parse_version_report(json),
            Err(BootstrapError::ValidationError(_))
        ));
    }

    #[test]
    fn test_parse_recorded_version() {
        let json = r#"{
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "kubeadm-config", "namespace": "kube-system"},
            "data": {
                "ClusterConfiguration": "apiVersion: kubeadm.k8s.io/v1beta2\nkind: ClusterConfiguration\nkubernetesVersion: v1.16.1\nclusterName: kubernetes\n"
            }
        }"#;
        assert_eq!(parse_recorded_version(json).unwrap(), Version::new(1, 16, 1));
    }

    #[test]
    fn test_recorded_version_missing_entry() {
        let json = r#"{"apiVersion": "v1", "kind": "ConfigMap", "metadata": {"name": "kubeadm-config"}, "data": {}}"#;
        assert!(parse_recorded_version(json).is_err());
    }
}

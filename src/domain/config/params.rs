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

//! Parameters a kubeadm configuration document is rendered from.
//!
//! Built once per invocation (TOML file, then flags and `-D` overrides) and
//! handed to the renderer by reference. Never persisted.

use crate::shared::error::{BootstrapError, Result};
use serde::Deserialize;
use std::fs::read_to_string;

// ============================================================================
// Main parameter bag
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfigParameters {
    /// Address the local API server advertises, `host` or `host:port`
    pub advertise_address: String,
    /// Shared endpoint for all control-plane nodes, `host` or `host:port`
    pub control_plane_endpoint: Option<String>,
    pub cluster_name: Option<String>,
    pub node_name: Option<String>,
    pub cri_socket: Option<String>,
    pub networking: NetworkingParams,
    pub cloud_provider: Option<String>,
    pub node_pool: Option<String>,
    pub image_repository: Option<String>,
    pub cert_sans: Vec<String>,
    pub taints: Vec<Taint>,
    pub api_server: ApiServerParams,
    pub controller_manager: ControllerManagerParams,
    pub kubelet: KubeletParams,
    pub etcd: EtcdParams,
    pub bootstrap_token: Option<String>,
    /// Key for uploaded control-plane certificates (v1beta2 only)
    pub certificate_key: Option<String>,
    pub join: JoinParams,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkingParams {
    pub service_subnet: Option<String>,
    pub pod_subnet: Option<String>,
    pub dns_domain: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiServerParams {
    pub oidc_issuer_url: Option<String>,
    pub oidc_client_id: Option<String>,
    pub kubelet_certificate_authority: Option<String>,
    pub enable_admission_plugins: Vec<String>,
    pub disable_admission_plugins: Vec<String>,
    pub audit_log_dir: Option<String>,
    pub encryption_provider_config: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControllerManagerParams {
    pub signing_cert_file: Option<String>,
    pub signing_key_file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct KubeletParams {
    pub reserved_cpu: Option<String>,
    pub reserved_memory: Option<String>,
    pub cgroup_driver: Option<String>,
}

/// External etcd when `endpoints` is non-empty, stacked local etcd otherwise.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct EtcdParams {
    pub endpoints: Vec<String>,
    pub ca_file: Option<String>,
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
    pub data_dir: Option<String>,
}

impl EtcdParams {
    pub fn is_external(&self) -> bool {
        !self.endpoints.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct JoinParams {
    pub api_server_endpoint: Option<String>,
    pub token: Option<String>,
    pub ca_cert_hashes: Vec<String>,
    pub unsafe_skip_ca_verification: bool,
    /// Join as an additional control-plane node
    pub control_plane: bool,
}

impl ConfigParameters {
    /// Load parameters from a TOML file
    pub fn from<T: AsRef<str>>(path: T) -> Result<Self> {
        let content = read_to_string(path.as_ref()).map_err(|e| {
            BootstrapError::config_error(format!(
                "Failed to read parameter file {}: {}",
                path.as_ref(),
                e
            ))
        })?;

        let params: Self = toml::from_str(&content)?;
        Ok(params)
    }

    /// Cloud provider, if set and non-blank.
    pub fn cloud_provider(&self) -> Option<&str> {
        non_empty(&self.cloud_provider)
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// Taints
// ============================================================================

/// A node taint. `key-` and `key:effect-` forms are removal markers and keep
/// the trailing `-` in the effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Taint {
    pub key: String,
    pub value: String,
    pub effect: String,
}

impl Taint {
    pub fn new(key: impl Into<String>, value: impl Into<String>, effect: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            effect: effect.into(),
        }
    }

    /// Parse a single `key=value:effect`, `key:effect` or `key-` spec.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || BootstrapError::InvalidTaintSpec(spec.to_string());

        if let Some((key, rest)) = spec.split_once('=') {
            let (value, effect) = rest.split_once(':').ok_or_else(invalid)?;
            if key.is_empty() || effect.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::new(key, value, effect));
        }

        if let Some((key, effect)) = spec.split_once(':') {
            if key.is_empty() || effect.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::new(key, "", effect));
        }

        if spec.len() > 1 && spec.ends_with('-') {
            return Ok(Self::new("", "", spec));
        }

        Err(invalid())
    }
}

impl TryFrom<String> for Taint {
    type Error = BootstrapError;

    fn try_from(value: String) -> Result<Self> {
        Taint::parse(value.trim())
    }
}

/// Parse a comma-separated list of taint specs. An empty string is an empty list.
pub fn parse_taints(input: &str) -> Result<Vec<Taint>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Taint::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taint_with_value() {
        assert_eq!(
            parse_taints("foo=bar:NoSchedule").unwrap(),
            vec![Taint::new("foo", "bar", "NoSchedule")]
        );
    }

    #[test]
    fn test_taint_without_value() {
        assert_eq!(
            parse_taints("foo:PreferNoSchedule").unwrap(),
            vec![Taint::new("foo", "", "PreferNoSchedule")]
        );
    }

    #[test]
    fn test_taint_removal_markers() {
        assert_eq!(
            parse_taints("dedicated:NoSchedule-").unwrap(),
            vec![Taint::new("dedicated", "", "NoSchedule-")]
        );
        assert_eq!(
            parse_taints("dedicated-").unwrap(),
            vec![Taint::new("", "", "dedicated-")]
        );
    }

    #[test]
    fn test_empty_taints() {
        assert!(parse_taints("").unwrap().is_empty());
        assert!(parse_taints(" , ").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_taints() {
        for spec in ["xxx", "foo=bar", "=bar:NoSchedule", ":NoSchedule", "-"] {
            assert!(
                matches!(parse_taints(spec), Err(BootstrapError::InvalidTaintSpec(_))),
                "expected error for {:?}",
                spec
            );
        }
    }

    #[test]
    fn test_taint_list_preserves_order() {
        let taints = parse_taints("b=1:NoSchedule, a:NoExecute").unwrap();
        assert_eq!(taints[0].key, "b");
        assert_eq!(taints[1].key, "a");
    }

    #[test]
    fn test_load_from_toml() {
        let content = r#"
advertise_address = "10.0.0.10"
control_plane_endpoint = "lb.example.com:8443"
cert_sans = ["10.0.0.10", "api.example.com"]
taints = ["dedicated=infra:NoSchedule"]

[networking]
pod_subnet = "10.244.0.0/16"

[etcd]
endpoints = ["https://10.0.0.2:2379"]
"#;
        let params: ConfigParameters = toml::from_str(content).unwrap();
        assert_eq!(params.advertise_address, "10.0.0.10");
        assert_eq!(params.cert_sans.len(), 2);
        assert_eq!(params.taints, vec![Taint::new("dedicated", "infra", "NoSchedule")]);
        assert_eq!(params.networking.pod_subnet.as_deref(), Some("10.244.0.0/16"));
        assert!(params.etcd.is_external());
        assert!(params.cloud_provider().is_none());
    }

    #[test]
    fn test_invalid_taint_in_toml_is_rejected() {
        let result: std::result::Result<ConfigParameters, _> = toml::from_str("taints = [\"xxx\"]");
        assert!(result.is_err());
    }
}

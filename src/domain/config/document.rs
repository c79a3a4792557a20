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

//! Serializable kubeadm configuration documents.
//!
//! Field names follow the kubeadm API. Where generations differ in layout the
//! difference is carried by a flattened enum, so a single struct serves all
//! supported variants.

use serde::Serialize;
use std::collections::BTreeMap;

pub type ExtraArgs = BTreeMap<String, String>;

// ============================================================================
// InitConfiguration
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitConfiguration {
    pub api_version: &'static str,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bootstrap_tokens: Vec<BootstrapToken>,
    #[serde(flatten)]
    pub endpoint: AdvertiseEndpoint,
    pub node_registration: NodeRegistration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BootstrapToken {
    pub token: String,
}

/// The local API endpoint is `apiEndpoint` in v1alpha3 and `localAPIEndpoint` later.
#[derive(Debug, Clone, Serialize)]
pub enum AdvertiseEndpoint {
    #[serde(rename = "apiEndpoint")]
    Legacy(ApiEndpoint),
    #[serde(rename = "localAPIEndpoint")]
    Local(ApiEndpoint),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    pub advertise_address: String,
    pub bind_port: u16,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRegistration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub cri_socket: String,
    /// Always present: an empty list means "no taints", an absent one means
    /// kubeadm's default control-plane taint.
    pub taints: Vec<TaintEntry>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub kubelet_extra_args: ExtraArgs,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaintEntry {
    pub key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    pub effect: String,
}

// ============================================================================
// ClusterConfiguration
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfiguration {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub kubernetes_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_plane_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_repository: Option<String>,
    #[serde(skip_serializing_if = "Networking::is_empty")]
    pub networking: Networking,
    pub etcd: Etcd,
    #[serde(flatten)]
    pub components: ControlPlaneComponents,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Networking {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_subnet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_subnet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_domain: Option<String>,
}

impl Networking {
    pub fn is_empty(&self) -> bool {
        self.service_subnet.is_none() && self.pod_subnet.is_none() && self.dns_domain.is_none()
    }
}

/// Exactly one of `local` or `external` is set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Etcd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalEtcd>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalEtcd>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalEtcd {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalEtcd {
    pub endpoints: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
}

/// API server and controller-manager settings, in either layout.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ControlPlaneComponents {
    Flat(FlatComponents),
    Nested(NestedComponents),
}

/// v1alpha3 layout
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlatComponents {
    #[serde(rename = "apiServerCertSANs", skip_serializing_if = "Vec::is_empty")]
    pub api_server_cert_sans: Vec<String>,
    #[serde(rename = "apiServerExtraArgs", skip_serializing_if = "BTreeMap::is_empty")]
    pub api_server_extra_args: ExtraArgs,
    #[serde(rename = "apiServerExtraVolumes", skip_serializing_if = "Vec::is_empty")]
    pub api_server_extra_volumes: Vec<HostPathMount>,
    #[serde(
        rename = "controllerManagerExtraArgs",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub controller_manager_extra_args: ExtraArgs,
    #[serde(
        rename = "controllerManagerExtraVolumes",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub controller_manager_extra_volumes: Vec<HostPathMount>,
}

/// v1beta1 and later layout
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedComponents {
    #[serde(skip_serializing_if = "ApiServerComponent::is_empty")]
    pub api_server: ApiServerComponent,
    #[serde(skip_serializing_if = "ControlPlaneComponent::is_empty")]
    pub controller_manager: ControlPlaneComponent,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiServerComponent {
    #[serde(rename = "certSANs", skip_serializing_if = "Vec::is_empty")]
    pub cert_sans: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_args: ExtraArgs,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_volumes: Vec<HostPathMount>,
}

impl ApiServerComponent {
    pub fn is_empty(&self) -> bool {
        self.cert_sans.is_empty() && self.extra_args.is_empty() && self.extra_volumes.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneComponent {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_args: ExtraArgs,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_volumes: Vec<HostPathMount>,
}

impl ControlPlaneComponent {
    pub fn is_empty(&self) -> bool {
        self.extra_args.is_empty() && self.extra_volumes.is_empty()
    }
}

/// A hostPath mount into a static control-plane pod. v1alpha3 spells the
/// access mode `writable`, later generations `readOnly`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPathMount {
    pub name: String,
    pub host_path: String,
    pub mount_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_type: Option<String>,
}

// ============================================================================
// JoinConfiguration
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinConfiguration {
    pub api_version: &'static str,
    pub kind: &'static str,
    #[serde(flatten)]
    pub layout: JoinLayout,
    pub node_registration: NodeRegistration,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum JoinLayout {
    Flat(FlatJoin),
    Nested(NestedJoin),
}

/// v1alpha3 layout
#[derive(Debug, Clone, Serialize)]
pub struct FlatJoin {
    pub token: String,
    #[serde(rename = "discoveryTokenAPIServers")]
    pub discovery_token_api_servers: Vec<String>,
    #[serde(
        rename = "discoveryTokenCACertHashes",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub discovery_token_ca_cert_hashes: Vec<String>,
    #[serde(rename = "discoveryTokenUnsafeSkipCAVerification")]
    pub discovery_token_unsafe_skip_ca_verification: bool,
    #[serde(rename = "controlPlane", skip_serializing_if = "Option::is_none")]
    pub control_plane: Option<bool>,
    #[serde(rename = "apiEndpoint", skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<ApiEndpoint>,
}

/// v1beta1 and later layout
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedJoin {
    pub discovery: Discovery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_plane: Option<JoinControlPlane>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discovery {
    pub bootstrap_token: BootstrapTokenDiscovery,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapTokenDiscovery {
    pub api_server_endpoint: String,
    pub token: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ca_cert_hashes: Vec<String>,
    #[serde(rename = "unsafeSkipCAVerification")]
    pub unsafe_skip_ca_verification: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinControlPlane {
    #[serde(rename = "localAPIEndpoint")]
    pub local_api_endpoint: ApiEndpoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_key: Option<String>,
}

// ============================================================================
// KubeletConfiguration
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeletConfiguration {
    pub api_version: &'static str,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cgroup_driver: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub system_reserved: BTreeMap<String, String>,
}

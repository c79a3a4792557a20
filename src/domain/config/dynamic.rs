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

use crate::domain::config::params::{parse_taints, ConfigParameters};
use crate::shared::error::{BootstrapError, Result};
use std::collections::HashMap;

/// Apply `-D key=value` overrides to `params`. Unknown keys are rejected.
pub fn apply_to_params(configs: &HashMap<String, String>, params: &mut ConfigParameters) -> Result<()> {
    let mut keys: Vec<&String> = configs.keys().collect();
    keys.sort();

    for key in keys {
        let value = configs[key].trim();
        let text = || Some(value.to_string());

        match key.as_str() {
            "api.advertise-address" => params.advertise_address = value.to_string(),
            "api.control-plane-endpoint" => params.control_plane_endpoint = text(),
            "cluster.name" => params.cluster_name = text(),
            "node.name" => params.node_name = text(),
            "node.cri-socket" => params.cri_socket = text(),
            "node.pool" => params.node_pool = text(),
            "node.taints" => params.taints = parse_taints(value)?,
            "networking.service-subnet" => params.networking.service_subnet = text(),
            "networking.pod-subnet" => params.networking.pod_subnet = text(),
            "networking.dns-domain" => params.networking.dns_domain = text(),
            "cloud.provider" => params.cloud_provider = text(),
            "images.repository" => params.image_repository = text(),
            "apiserver.cert-sans" => params.cert_sans = parse_list(value),
            "apiserver.oidc-issuer-url" => params.api_server.oidc_issuer_url = text(),
            "apiserver.oidc-client-id" => params.api_server.oidc_client_id = text(),
            "apiserver.kubelet-certificate-authority" => {
                params.api_server.kubelet_certificate_authority = text()
            }
            "apiserver.enable-admission-plugins" => {
                params.api_server.enable_admission_plugins = parse_list(value)
            }
            "apiserver.disable-admission-plugins" => {
                params.api_server.disable_admission_plugins = parse_list(value)
            }
            "apiserver.audit-log-dir" => params.api_server.audit_log_dir = text(),
            "apiserver.encryption-provider-config" => {
                params.api_server.encryption_provider_config = text()
            }
            "controller-manager.signing-cert-file" => {
                params.controller_manager.signing_cert_file = text()
            }
            "controller-manager.signing-key-file" => {
                params.controller_manager.signing_key_file = text()
            }
            "kubelet.reserved-cpu" => params.kubelet.reserved_cpu = text(),
            "kubelet.reserved-memory" => params.kubelet.reserved_memory = text(),
            "kubelet.cgroup-driver" => params.kubelet.cgroup_driver = text(),
            "etcd.endpoints" => params.etcd.endpoints = parse_list(value),
            "etcd.ca-file" => params.etcd.ca_file = text(),
            "etcd.cert-file" => params.etcd.cert_file = text(),
            "etcd.key-file" => params.etcd.key_file = text(),
            "etcd.data-dir" => params.etcd.data_dir = text(),
            "bootstrap.token" => params.bootstrap_token = text(),
            "bootstrap.certificate-key" => params.certificate_key = text(),
            "join.api-server-endpoint" => params.join.api_server_endpoint = text(),
            "join.token" => params.join.token = text(),
            "join.ca-cert-hashes" => params.join.ca_cert_hashes = parse_list(value),
            "join.unsafe-skip-ca-verification" => {
                params.join.unsafe_skip_ca_verification = parse_bool(key, value)?
            }
            "join.control-plane" => params.join.control_plane = parse_bool(key, value)?,
            other => {
                return Err(BootstrapError::config_error(format!(
                    "Unknown dynamic property: {}",
                    other
                )))
            }
        }
    }

    Ok(())
}

fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value.parse::<bool>().map_err(|_| {
        BootstrapError::config_error(format!("{} expects true or false, got '{}'", key, value))
    })
}

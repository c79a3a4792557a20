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

use crate::domain::config::document::*;
use crate::domain::config::params::{non_empty, ConfigParameters};
use crate::domain::config::schema::{SchemaSelection, SchemaVariant};
use crate::infrastructure::constants::*;
use crate::shared::error::{BootstrapError, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{DirBuilder, OpenOptions, Permissions};
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

const INIT_CONFIGURATION_KIND: &str = "InitConfiguration";
const CLUSTER_CONFIGURATION_KIND: &str = "ClusterConfiguration";
const JOIN_CONFIGURATION_KIND: &str = "JoinConfiguration";

/// kubeadm bootstrap token: `[a-z0-9]{6}.[a-z0-9]{16}`
static BOOTSTRAP_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]{6}\.[a-z0-9]{16}$").expect("static pattern"));

fn bootstrap_token(field: &str, value: Option<&str>) -> Result<Option<String>> {
    match value {
        Some(token) if !BOOTSTRAP_TOKEN.is_match(token) => Err(BootstrapError::ValidationError(
            format!("{} '{}' is not of the form [a-z0-9]{{6}}.[a-z0-9]{{16}}", field, token),
        )),
        other => Ok(other.map(str::to_string)),
    }
}

/// Rendered multi-document kubeadm configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub variant: SchemaVariant,
    pub text: String,
}

impl RenderedDocument {
    /// Write the document to `path`, creating parent directories (0700) and
    /// truncating any existing file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        write_private_file(path, &self.text)?;
        debug!("Wrote {} configuration to {}", self.variant, path.display());
        Ok(())
    }
}

/// Write `contents` to `path` readable by the owner only (0600), creating
/// missing parent directories with mode 0700.
pub fn write_private_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        DirBuilder::new()
            .recursive(true)
            .mode(CONFIG_DIR_MODE)
            .create(parent)
            .map_err(|e| BootstrapError::filesystem(parent, e))?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(CONFIG_FILE_MODE)
        .open(path)
        .map_err(|e| BootstrapError::filesystem(path, e))?;

    // mode() only applies when the file is created
    file.set_permissions(Permissions::from_mode(CONFIG_FILE_MODE))
        .map_err(|e| BootstrapError::filesystem(path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| BootstrapError::filesystem(path, e))?;

    Ok(())
}

/// Render the init documents for `selection` from `params`.
pub fn render(selection: &SchemaSelection, params: &ConfigParameters) -> Result<RenderedDocument> {
    KubeadmConfigBuilder::new(*selection, params).build_init()
}

/// Render the join documents for `selection` from `params`.
pub fn render_join(
    selection: &SchemaSelection,
    params: &ConfigParameters,
) -> Result<RenderedDocument> {
    KubeadmConfigBuilder::new(*selection, params).build_join()
}

/// Split `host[:port]` into host and port, using `default_port` when the
/// address has none. Bracketed and bare IPv6 literals are accepted.
pub fn split_host_port(address: &str, default_port: u16) -> Result<(String, u16)> {
    let address = address.trim();
    let invalid = |reason: &str| {
        BootstrapError::config_error(format!("Invalid address '{}': {}", address, reason))
    };

    if address.is_empty() {
        return Err(invalid("empty address"));
    }

    let with_port = if let Some(rest) = address.strip_prefix('[') {
        let (_, tail) = rest
            .split_once(']')
            .ok_or_else(|| invalid("unterminated '['"))?;
        if tail.is_empty() {
            format!("{}:{}", address, default_port)
        } else {
            address.to_string()
        }
    } else {
        match address.matches(':').count() {
            0 => format!("{}:{}", address, default_port),
            1 => address.to_string(),
            // bare IPv6 literal without a port
            _ => format!("[{}]:{}", address, default_port),
        }
    };

    let (host, port) = with_port
        .rsplit_once(':')
        .ok_or_else(|| invalid("missing port"))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(invalid("empty host"));
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| invalid("port is not a number in 0-65535"))?;

    Ok((host.to_string(), port))
}

fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

fn to_yaml<T: Serialize>(doc: &T) -> Result<String> {
    serde_yaml::to_string(doc).map_err(|e| BootstrapError::TemplateRender(e.to_string()))
}

fn is_recognized_cloud_provider(provider: &str) -> bool {
    RECOGNIZED_CLOUD_PROVIDERS.contains(&provider)
}

/// Extra args and volumes for one control-plane component
#[derive(Debug, Default)]
struct ComponentSettings {
    extra_args: ExtraArgs,
    extra_volumes: Vec<HostPathMount>,
}

pub struct KubeadmConfigBuilder<'a> {
    selection: SchemaSelection,
    params: &'a ConfigParameters,
}

impl<'a> KubeadmConfigBuilder<'a> {
    pub fn new(selection: SchemaSelection, params: &'a ConfigParameters) -> Self {
        Self { selection, params }
    }

    fn variant(&self) -> SchemaVariant {
        self.selection.variant
    }

    pub fn build_init(&self) -> Result<RenderedDocument> {
        let mut docs = vec![
            to_yaml(&self.init_configuration()?)?,
            to_yaml(&self.cluster_configuration()?)?,
        ];
        if let Some(kubelet) = self.kubelet_configuration() {
            docs.push(to_yaml(&kubelet)?);
        }
        Ok(self.assemble(docs))
    }

    pub fn build_join(&self) -> Result<RenderedDocument> {
        let mut docs = vec![to_yaml(&self.join_configuration()?)?];
        if let Some(kubelet) = self.kubelet_configuration() {
            docs.push(to_yaml(&kubelet)?);
        }
        Ok(self.assemble(docs))
    }

    fn assemble(&self, docs: Vec<String>) -> RenderedDocument {
        RenderedDocument {
            variant: self.variant(),
            text: docs.join("---\n"),
        }
    }

    fn advertise_endpoint(&self) -> Result<ApiEndpoint> {
        if self.params.advertise_address.trim().is_empty() {
            return Err(BootstrapError::ValidationError(
                "advertise_address is required".to_string(),
            ));
        }
        let (host, port) =
            split_host_port(&self.params.advertise_address, DEFAULT_API_SERVER_PORT)?;
        Ok(ApiEndpoint {
            advertise_address: host,
            bind_port: port,
        })
    }

    fn control_plane_endpoint(&self) -> Result<Option<String>> {
        non_empty(&self.params.control_plane_endpoint)
            .map(|endpoint| {
                let (host, port) = split_host_port(endpoint, DEFAULT_API_SERVER_PORT)?;
                Ok(join_host_port(&host, port))
            })
            .transpose()
    }

    fn mount(&self, name: &str, path: &str, writable: bool, path_type: &str) -> HostPathMount {
        let (writable, read_only) = if self.variant().has_flat_components() {
            (Some(writable), None)
        } else {
            (None, Some(!writable))
        };
        HostPathMount {
            name: name.to_string(),
            host_path: path.to_string(),
            mount_path: path.to_string(),
            writable,
            read_only,
            path_type: Some(path_type.to_string()),
        }
    }

    fn node_registration(&self) -> NodeRegistration {
        let params = self.params;
        let mut kubelet_extra_args = BTreeMap::new();

        if let Some(provider) = params.cloud_provider() {
            kubelet_extra_args.insert("cloud-provider".to_string(), provider.to_string());
        }
        if let Some(pool) = non_empty(&params.node_pool) {
            kubelet_extra_args.insert(
                "node-labels".to_string(),
                format!("{}={}", NODE_POOL_LABEL, pool),
            );
        }

        NodeRegistration {
            name: non_empty(&params.node_name).map(str::to_string),
            cri_socket: non_empty(&params.cri_socket)
                .unwrap_or(DEFAULT_CRI_SOCKET)
                .to_string(),
            taints: params
                .taints
                .iter()
                .map(|t| TaintEntry {
                    key: t.key.clone(),
                    value: t.value.clone(),
                    effect: t.effect.clone(),
                })
                .collect(),
            kubelet_extra_args,
        }
    }

    fn init_configuration(&self) -> Result<InitConfiguration> {
        let endpoint = self.advertise_endpoint()?;
        let endpoint = if self.variant().has_flat_components() {
            AdvertiseEndpoint::Legacy(endpoint)
        } else {
            AdvertiseEndpoint::Local(endpoint)
        };

        let certificate_key = if self.variant().supports_certificate_key() {
            non_empty(&self.params.certificate_key).map(str::to_string)
        } else {
            None
        };

        Ok(InitConfiguration {
            api_version: self.variant().api_version(),
            kind: INIT_CONFIGURATION_KIND,
            bootstrap_tokens: bootstrap_token(
                "bootstrap_token",
                non_empty(&self.params.bootstrap_token),
            )?
            .map(|token| vec![BootstrapToken { token }])
            .unwrap_or_default(),
            endpoint,
            node_registration: self.node_registration(),
            certificate_key,
        })
    }

    fn api_server_settings(&self) -> ComponentSettings {
        let params = self.params;
        let api = &params.api_server;
        let mut settings = ComponentSettings::default();
        let args = &mut settings.extra_args;

        if let Some(provider) = params.cloud_provider() {
            args.insert("cloud-provider".to_string(), provider.to_string());
            if is_recognized_cloud_provider(provider) {
                args.insert("cloud-config".to_string(), CLOUD_CONFIG_FILE.to_string());
                settings.extra_volumes.push(self.mount(
                    VOLUME_NAME_CLOUD_CONFIG,
                    CLOUD_CONFIG_FILE,
                    false,
                    PATH_TYPE_FILE,
                ));
            }
        }

        let args = &mut settings.extra_args;
        if let Some(url) = non_empty(&api.oidc_issuer_url) {
            args.insert("oidc-issuer-url".to_string(), url.to_string());
        }
        if let Some(client_id) = non_empty(&api.oidc_client_id) {
            args.insert("oidc-client-id".to_string(), client_id.to_string());
        }
        if let Some(ca) = non_empty(&api.kubelet_certificate_authority) {
            args.insert("kubelet-certificate-authority".to_string(), ca.to_string());
        }
        if !api.enable_admission_plugins.is_empty() {
            args.insert(
                "enable-admission-plugins".to_string(),
                api.enable_admission_plugins.join(","),
            );
        }
        if !api.disable_admission_plugins.is_empty() {
            args.insert(
                "disable-admission-plugins".to_string(),
                api.disable_admission_plugins.join(","),
            );
        }

        if let Some(dir) = non_empty(&api.audit_log_dir) {
            let dir = dir.trim_end_matches('/');
            args.insert(
                "audit-log-path".to_string(),
                format!("{}/{}", dir, AUDIT_LOG_FILE_NAME),
            );
            args.insert("audit-policy-file".to_string(), AUDIT_POLICY_FILE.to_string());
            args.insert("audit-log-maxage".to_string(), AUDIT_LOG_MAX_AGE.to_string());
            args.insert("audit-log-maxbackup".to_string(), AUDIT_LOG_MAX_BACKUP.to_string());
            args.insert("audit-log-maxsize".to_string(), AUDIT_LOG_MAX_SIZE.to_string());
            settings.extra_volumes.push(self.mount(
                VOLUME_NAME_AUDIT_LOG,
                dir,
                true,
                PATH_TYPE_DIRECTORY_OR_CREATE,
            ));
            settings.extra_volumes.push(self.mount(
                VOLUME_NAME_AUDIT_POLICY,
                AUDIT_POLICY_FILE,
                false,
                PATH_TYPE_FILE,
            ));
        }

        if let Some(path) = non_empty(&api.encryption_provider_config) {
            settings.extra_args.insert(
                self.selection.encryption_flag().to_string(),
                path.to_string(),
            );
            settings.extra_volumes.push(self.mount(
                VOLUME_NAME_ENCRYPTION,
                path,
                false,
                PATH_TYPE_FILE,
            ));
        }

        settings
    }

    fn controller_manager_settings(&self) -> ComponentSettings {
        let params = self.params;
        let cm = &params.controller_manager;
        let mut settings = ComponentSettings::default();

        if let Some(provider) = params.cloud_provider() {
            settings
                .extra_args
                .insert("cloud-provider".to_string(), provider.to_string());
            if is_recognized_cloud_provider(provider) {
                settings
                    .extra_args
                    .insert("cloud-config".to_string(), CLOUD_CONFIG_FILE.to_string());
                settings.extra_volumes.push(self.mount(
                    VOLUME_NAME_CLOUD_CONFIG,
                    CLOUD_CONFIG_FILE,
                    false,
                    PATH_TYPE_FILE,
                ));
            }
        }
        if let Some(cert) = non_empty(&cm.signing_cert_file) {
            settings
                .extra_args
                .insert("cluster-signing-cert-file".to_string(), cert.to_string());
        }
        if let Some(key) = non_empty(&cm.signing_key_file) {
            settings
                .extra_args
                .insert("cluster-signing-key-file".to_string(), key.to_string());
        }

        settings
    }

    fn etcd(&self) -> Etcd {
        let etcd = &self.params.etcd;
        if etcd.is_external() {
            Etcd {
                local: None,
                external: Some(ExternalEtcd {
                    endpoints: etcd.endpoints.clone(),
                    ca_file: non_empty(&etcd.ca_file).map(str::to_string),
                    cert_file: non_empty(&etcd.cert_file).map(str::to_string),
                    key_file: non_empty(&etcd.key_file).map(str::to_string),
                }),
            }
        } else {
            Etcd {
                local: Some(LocalEtcd {
                    data_dir: non_empty(&etcd.data_dir)
                        .unwrap_or(ETCD_DATA_DIR)
                        .to_string(),
                }),
                external: None,
            }
        }
    }

    fn cluster_configuration(&self) -> Result<ClusterConfiguration> {
        let params = self.params;
        let api_server = self.api_server_settings();
        let controller_manager = self.controller_manager_settings();

        let components = if self.variant().has_flat_components() {
            ControlPlaneComponents::Flat(FlatComponents {
                api_server_cert_sans: params.cert_sans.clone(),
                api_server_extra_args: api_server.extra_args,
                api_server_extra_volumes: api_server.extra_volumes,
                controller_manager_extra_args: controller_manager.extra_args,
                controller_manager_extra_volumes: controller_manager.extra_volumes,
            })
        } else {
            ControlPlaneComponents::Nested(NestedComponents {
                api_server: ApiServerComponent {
                    cert_sans: params.cert_sans.clone(),
                    extra_args: api_server.extra_args,
                    extra_volumes: api_server.extra_volumes,
                },
                controller_manager: ControlPlaneComponent {
                    extra_args: controller_manager.extra_args,
                    extra_volumes: controller_manager.extra_volumes,
                },
            })
        };

        Ok(ClusterConfiguration {
            api_version: self.variant().api_version(),
            kind: CLUSTER_CONFIGURATION_KIND,
            kubernetes_version: self.selection.version.tag(),
            cluster_name: non_empty(&params.cluster_name).map(str::to_string),
            control_plane_endpoint: self.control_plane_endpoint()?,
            image_repository: non_empty(&params.image_repository).map(str::to_string),
            networking: Networking {
                service_subnet: non_empty(&params.networking.service_subnet).map(str::to_string),
                pod_subnet: non_empty(&params.networking.pod_subnet).map(str::to_string),
                dns_domain: non_empty(&params.networking.dns_domain).map(str::to_string),
            },
            etcd: self.etcd(),
            components,
        })
    }

    fn join_configuration(&self) -> Result<JoinConfiguration> {
        let params = self.params;
        let join = &params.join;

        let endpoint = non_empty(&join.api_server_endpoint)
            .or_else(|| non_empty(&params.control_plane_endpoint))
            .ok_or_else(|| {
                BootstrapError::ValidationError(
                    "join requires join.api_server_endpoint or control_plane_endpoint"
                        .to_string(),
                )
            })?;
        let (host, port) = split_host_port(endpoint, DEFAULT_API_SERVER_PORT)?;
        let endpoint = join_host_port(&host, port);

        let token = bootstrap_token("join.token", non_empty(&join.token))?
            .ok_or_else(|| BootstrapError::ValidationError("join requires join.token".to_string()))?;

        let layout = if self.variant().has_flat_components() {
            let (control_plane, api_endpoint) = if join.control_plane {
                (Some(true), Some(self.advertise_endpoint()?))
            } else {
                (None, None)
            };
            JoinLayout::Flat(FlatJoin {
                token,
                discovery_token_api_servers: vec![endpoint],
                discovery_token_ca_cert_hashes: join.ca_cert_hashes.clone(),
                discovery_token_unsafe_skip_ca_verification: join.unsafe_skip_ca_verification,
                control_plane,
                api_endpoint,
            })
        } else {
            let control_plane = if join.control_plane {
                Some(JoinControlPlane {
                    local_api_endpoint: self.advertise_endpoint()?,
                    certificate_key: if self.variant().supports_certificate_key() {
                        non_empty(&params.certificate_key).map(str::to_string)
                    } else {
                        None
                    },
                })
            } else {
                None
            };
            JoinLayout::Nested(NestedJoin {
                discovery: Discovery {
                    bootstrap_token: BootstrapTokenDiscovery {
                        api_server_endpoint: endpoint,
                        token,
                        ca_cert_hashes: join.ca_cert_hashes.clone(),
                        unsafe_skip_ca_verification: join.unsafe_skip_ca_verification,
                    },
                },
                control_plane,
            })
        };

        Ok(JoinConfiguration {
            api_version: self.variant().api_version(),
            kind: JOIN_CONFIGURATION_KIND,
            layout,
            node_registration: self.node_registration(),
        })
    }

    fn kubelet_configuration(&self) -> Option<KubeletConfiguration> {
        let kubelet = &self.params.kubelet;
        let mut system_reserved = BTreeMap::new();
        if let Some(cpu) = non_empty(&kubelet.reserved_cpu) {
            system_reserved.insert("cpu".to_string(), cpu.to_string());
        }
        if let Some(memory) = non_empty(&kubelet.reserved_memory) {
            system_reserved.insert("memory".to_string(), memory.to_string());
        }
        let cgroup_driver = non_empty(&kubelet.cgroup_driver).map(str::to_string);

        if system_reserved.is_empty() && cgroup_driver.is_none() {
            return None;
        }

        Some(KubeletConfiguration {
            api_version: KUBELET_CONFIG_API_VERSION,
            kind: KUBELET_CONFIG_KIND,
            cgroup_driver,
            system_reserved,
        })
    }
}

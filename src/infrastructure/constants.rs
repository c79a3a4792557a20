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

/// Filesystem paths
pub const KUBEADM_CONF_FILE: &str = "/etc/kubernetes/kubeadm.conf";
pub const ADMIN_KUBECONFIG: &str = "/etc/kubernetes/admin.conf";
pub const ADDON_DIR: &str = "/etc/kubernetes/addons";
pub const CLOUD_CONFIG_FILE: &str = "/etc/kubernetes/cloud.conf";
pub const AUDIT_POLICY_FILE: &str = "/etc/kubernetes/audit-policy.yaml";
pub const AUDIT_LOG_FILE_NAME: &str = "audit.log";
pub const ETCD_DATA_DIR: &str = "/var/lib/etcd";

/// Directory and file modes for rendered documents
pub const CONFIG_DIR_MODE: u32 = 0o700;
pub const CONFIG_FILE_MODE: u32 = 0o600;

/// Network configuration
pub const DEFAULT_API_SERVER_PORT: u16 = 6443;
pub const DEFAULT_SERVICE_SUBNET: &str = "10.96.0.0/12";
pub const DEFAULT_DNS_DOMAIN: &str = "cluster.local";
pub const DEFAULT_CLUSTER_NAME: &str = "kubernetes";
pub const DEFAULT_CRI_SOCKET: &str = "/var/run/dockershim.sock";

/// Upgrade policy
pub const MAX_MINOR_SKEW: u64 = 1;

/// Audit log rotation
pub const AUDIT_LOG_MAX_AGE: &str = "30";
pub const AUDIT_LOG_MAX_BACKUP: &str = "10";
pub const AUDIT_LOG_MAX_SIZE: &str = "100";

/// External tools
pub const KUBEADM_BIN: &str = "kubeadm";
pub const KUBECTL_BIN: &str = "kubectl";
pub const SYSTEMCTL_BIN: &str = "systemctl";

/// Node agent service
pub const KUBELET_SERVICE: &str = "kubelet";

/// Packages installed for every node
pub const KUBE_PACKAGES: [&str; 3] = ["kubeadm", "kubelet", "kubectl"];

/// Live configuration object recorded by kubeadm
pub const KUBEADM_CONFIG_MAP: &str = "kubeadm-config";
pub const KUBEADM_CONFIG_NAMESPACE: &str = "kube-system";
pub const KUBEADM_CLUSTER_CONFIG_KEY: &str = "ClusterConfiguration";

/// Kubelet node label carrying the node pool
pub const NODE_POOL_LABEL: &str = "node-pool";

/// Recognized cloud providers (get provider-specific volumes and cloud-config)
pub const RECOGNIZED_CLOUD_PROVIDERS: [&str; 5] = ["aws", "azure", "gce", "openstack", "vsphere"];

/// Volume names
pub const VOLUME_NAME_CLOUD_CONFIG: &str = "cloud-config";
pub const VOLUME_NAME_AUDIT_LOG: &str = "audit-log";
pub const VOLUME_NAME_AUDIT_POLICY: &str = "audit-policy";
pub const VOLUME_NAME_ENCRYPTION: &str = "encryption-config";

/// Host path types
pub const PATH_TYPE_FILE: &str = "File";
pub const PATH_TYPE_DIRECTORY_OR_CREATE: &str = "DirectoryOrCreate";

/// Kubelet configuration document
pub const KUBELET_CONFIG_API_VERSION: &str = "kubelet.config.k8s.io/v1beta1";
pub const KUBELET_CONFIG_KIND: &str = "KubeletConfiguration";

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

use crate::domain::version::Version;
use crate::infrastructure::constants::KUBEADM_BIN;
use crate::infrastructure::executor::CommandSpec;
use std::path::Path;

/// The role a node plays during `kubeadm upgrade`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// First control-plane node, runs `upgrade apply`
    Primary,
    /// Additional control-plane node
    ControlPlane,
    Worker,
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeRole::Primary => "primary",
            NodeRole::ControlPlane => "control-plane",
            NodeRole::Worker => "worker",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for NodeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "primary" => Ok(NodeRole::Primary),
            "control-plane" | "controlplane" => Ok(NodeRole::ControlPlane),
            "worker" => Ok(NodeRole::Worker),
            other => Err(format!(
                "unknown node role '{}', expected primary, control-plane or worker",
                other
            )),
        }
    }
}

/// Builds kubeadm invocations
#[derive(Debug, Clone)]
pub struct Kubeadm {
    bin: String,
}

impl Default for Kubeadm {
    fn default() -> Self {
        Self::new(KUBEADM_BIN)
    }
}

impl Kubeadm {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    fn command(&self) -> CommandSpec {
        CommandSpec::new(&self.bin)
    }

    pub fn init(&self, config: &Path) -> CommandSpec {
        self.command()
            .arg("init")
            .arg(format!("--config={}", config.display()))
    }

    pub fn join(&self, config: &Path) -> CommandSpec {
        self.command()
            .arg("join")
            .arg(format!("--config={}", config.display()))
    }

    pub fn reset(&self, cri_socket: &str) -> CommandSpec {
        self.command()
            .args(["reset", "--force"])
            .arg(format!("--cri-socket={}", cri_socket))
    }

    /// The upgrade step for `role`
    pub fn upgrade(&self, role: NodeRole, version: &Version) -> CommandSpec {
        match role {
            NodeRole::Primary => self
                .command()
                .args(["upgrade", "apply", "-f"])
                .arg(version.tag()),
            NodeRole::ControlPlane => self
                .command()
                .args(["upgrade", "node", "experimental-control-plane"])
                .arg(version.tag()),
            NodeRole::Worker => self
                .command()
                .args(["upgrade", "node", "config", "--kubelet-version"])
                .arg(version.tag()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_and_join() {
        let kubeadm = Kubeadm::default();
        let path = Path::new("/etc/kubernetes/kubeadm.conf");
        assert_eq!(
            kubeadm.init(path).to_string(),
            "kubeadm init --config=/etc/kubernetes/kubeadm.conf"
        );
        assert_eq!(
            kubeadm.join(path).to_string(),
            "kubeadm join --config=/etc/kubernetes/kubeadm.conf"
        );
    }

    #[test]
    fn test_reset() {
        let spec = Kubeadm::default().reset("/run/containerd/containerd.sock");
        assert_eq!(
            spec.args,
            vec!["reset", "--force", "--cri-socket=/run/containerd/containerd.sock"]
        );
    }

    #[test]
    fn test_upgrade_per_role() {
        let kubeadm = Kubeadm::default();
        let version = Version::new(1, 17, 0);
        assert_eq!(
            kubeadm.upgrade(NodeRole::Primary, &version).to_string(),
            "kubeadm upgrade apply -f v1.17.0"
        );
        assert_eq!(
            kubeadm.upgrade(NodeRole::ControlPlane, &version).to_string(),
            "kubeadm upgrade node experimental-control-plane v1.17.0"
        );
        assert_eq!(
            kubeadm.upgrade(NodeRole::Worker, &version).to_string(),
            "kubeadm upgrade node config --kubelet-version v1.17.0"
        );
    }

    #[test]
    fn test_node_role_parse() {
        assert_eq!("Primary".parse::<NodeRole>().unwrap(), NodeRole::Primary);
        assert_eq!(
            "control-plane".parse::<NodeRole>().unwrap(),
            NodeRole::ControlPlane
        );
        assert!("master".parse::<NodeRole>().is_err());
    }
}

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

mod common;

#[cfg(test)]
mod tests {
    use super::common::{kubeadm_config_json, version_json, RecordingExecutor};
    use kube_bootstrap::infrastructure::tools::PackageManager;
    use kube_bootstrap::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    const VERSION_QUERY: &str = "kubectl version -o json";
    const CONFIG_QUERY: &str = "kubectl get configmap kubeadm-config -n kube-system -o json";

    fn cluster(server: &str, recorded: &str) -> Arc<RecordingExecutor> {
        Arc::new(
            RecordingExecutor::new()
                .respond("kubectl version", version_json(server, server))
                .respond("kubectl get configmap", kubeadm_config_json(recorded)),
        )
    }

    fn orchestrator(exec: &Arc<RecordingExecutor>, dir: &TempDir) -> NodeOrchestrator {
        NodeOrchestrator::new(exec.clone())
            .with_config_path(dir.path().join("kubeadm.conf"))
            .with_package_manager(PackageManager::Yum)
    }

    fn routine(version: &str, upgrade: &str) -> Vec<String> {
        vec![
            format!(
                "yum install -y kubeadm-{v} kubelet-{v} kubectl-{v}",
                v = version
            ),
            upgrade.to_string(),
            "systemctl daemon-reload".to_string(),
            "systemctl restart kubelet".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_skew_rejection_end_to_end() {
        let dir = TempDir::new().unwrap();
        let exec = cluster("v1.16.0", "v1.16.0");

        let err = orchestrator(&exec, &dir)
            .upgrade(&Version::new(1, 18, 0), NodeRole::Primary, None)
            .await
            .unwrap_err();

        match err {
            BootstrapError::SkewTooLarge {
                current,
                target,
                max_skew,
                gap,
            } => {
                assert_eq!(current, "1.16.0");
                assert_eq!(target, "1.18.0");
                assert_eq!(max_skew, 1);
                assert_eq!(gap, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // only the two read-only queries ran
        assert_eq!(exec.command_lines(), vec![VERSION_QUERY, CONFIG_QUERY]);
    }

    #[tokio::test]
    async fn test_minor_upgrade_stages_then_converges() {
        let dir = TempDir::new().unwrap();
        let exec = cluster("v1.16.3", "v1.16.3");

        let report = orchestrator(&exec, &dir)
            .upgrade(&Version::new(1, 17, 2), NodeRole::Primary, None)
            .await
            .unwrap();

        let mut expected = vec![VERSION_QUERY.to_string(), CONFIG_QUERY.to_string()];
        expected.extend(routine("1.17.0", "kubeadm upgrade apply -f v1.17.0"));
        expected.extend(routine("1.17.2", "kubeadm upgrade apply -f v1.17.2"));
        assert_eq!(exec.command_lines(), expected);

        assert_eq!(report.from, Version::new(1, 16, 3));
        assert_eq!(report.to, Version::new(1, 17, 2));
        assert_eq!(report.classification, Classification::Minor);
        assert_eq!(report.staging, Some(Version::new(1, 17, 0)));
    }

    #[tokio::test]
    async fn test_patch_upgrade_runs_once() {
        let dir = TempDir::new().unwrap();
        let exec = cluster("v1.16.0", "v1.16.0");

        orchestrator(&exec, &dir)
            .upgrade(&Version::new(1, 16, 3), NodeRole::ControlPlane, None)
            .await
            .unwrap();

        let mut expected = vec![VERSION_QUERY.to_string(), CONFIG_QUERY.to_string()];
        expected.extend(routine(
            "1.16.3",
            "kubeadm upgrade node experimental-control-plane v1.16.3",
        ));
        assert_eq!(exec.command_lines(), expected);
    }

    #[tokio::test]
    async fn test_lower_source_is_current() {
        let dir = TempDir::new().unwrap();
        // the server already runs 1.17 but kubeadm-config still records 1.16
        let exec = cluster("v1.17.0", "v1.16.3");

        let plan = orchestrator(&exec, &dir)
            .plan_upgrade(&Version::new(1, 17, 1), NodeRole::Primary)
            .await
            .unwrap();

        assert_eq!(plan.current(), Version::new(1, 16, 3));
        assert_eq!(plan.classification, Classification::Minor);
        assert_eq!(exec.command_lines(), vec![VERSION_QUERY, CONFIG_QUERY]);
    }

    #[tokio::test]
    async fn test_downgrade_and_major_rejected_without_mutation() {
        let dir = TempDir::new().unwrap();
        let exec = cluster("v1.16.3", "v1.16.3");
        let node = orchestrator(&exec, &dir);

        let err = node
            .upgrade(&Version::new(1, 16, 2), NodeRole::Worker, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::DowngradeUnsupported { .. }));

        let err = node
            .upgrade(&Version::new(2, 0, 0), NodeRole::Worker, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::MajorUpgradeUnsupported { .. }));

        assert!(exec
            .command_lines()
            .iter()
            .all(|l| l.starts_with("kubectl")));
    }

    #[tokio::test]
    async fn test_unobservable_cluster_fails_before_mutation() {
        let dir = TempDir::new().unwrap();
        let exec = Arc::new(
            RecordingExecutor::new()
                .respond("kubectl version", version_json("v1.16.3", "v1.16.3"))
                .fail("kubectl get configmap", 1, "connection refused"),
        );

        let err = orchestrator(&exec, &dir)
            .upgrade(&Version::new(1, 16, 4), NodeRole::Primary, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::SubprocessFailure { .. }));
        assert_eq!(exec.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_mid_upgrade_is_not_unwound() {
        let dir = TempDir::new().unwrap();
        let exec = Arc::new(
            RecordingExecutor::new()
                .respond("kubectl version", version_json("v1.16.3", "v1.16.3"))
                .respond("kubectl get configmap", kubeadm_config_json("v1.16.3"))
                .fail("kubeadm upgrade", 1, "static pod hash mismatch"),
        );

        let err = orchestrator(&exec, &dir)
            .upgrade(&Version::new(1, 17, 0), NodeRole::Primary, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::SubprocessFailure { .. }));

        let lines = exec.command_lines();
        assert_eq!(
            lines.last().map(String::as_str),
            Some("kubeadm upgrade apply -f v1.17.0")
        );
        assert!(!lines.iter().any(|l| l.contains("reset") || l.contains("restart")));
    }

    fn join_params() -> ConfigParameters {
        let mut params = ConfigParameters::default();
        params.node_pool = Some("batch".to_string());
        params.join.api_server_endpoint = Some("10.0.0.1:6443".to_string());
        params.join.token = Some("abcdef.0123456789abcdef".to_string());
        params.join.unsafe_skip_ca_verification = true;
        params
    }

    #[tokio::test]
    async fn test_worker_upgrade_keeps_join_configuration() {
        let dir = TempDir::new().unwrap();
        let exec = cluster("v1.16.3", "v1.16.3");

        orchestrator(&exec, &dir)
            .upgrade(&Version::new(1, 17, 2), NodeRole::Worker, Some(&join_params()))
            .await
            .unwrap();

        let mut expected = vec![VERSION_QUERY.to_string(), CONFIG_QUERY.to_string()];
        expected.extend(routine(
            "1.17.0",
            "kubeadm upgrade node config --kubelet-version v1.17.0",
        ));
        expected.extend(routine(
            "1.17.2",
            "kubeadm upgrade node config --kubelet-version v1.17.2",
        ));
        assert_eq!(exec.command_lines(), expected);

        let rendered = std::fs::read_to_string(dir.path().join("kubeadm.conf")).unwrap();
        assert!(rendered.contains("kind: JoinConfiguration"));
        assert!(!rendered.contains("InitConfiguration"));
        assert!(!rendered.contains("ClusterConfiguration"));
        assert!(rendered.contains("node-pool=batch"));
    }

    #[tokio::test]
    async fn test_primary_config_tracks_final_target() {
        let dir = TempDir::new().unwrap();
        let exec = cluster("v1.14.2", "v1.14.2");

        let mut params = ConfigParameters::default();
        params.advertise_address = "10.0.0.7".to_string();

        orchestrator(&exec, &dir)
            .upgrade(&Version::new(1, 15, 1), NodeRole::Primary, Some(&params))
            .await
            .unwrap();

        let rendered = std::fs::read_to_string(dir.path().join("kubeadm.conf")).unwrap();
        assert!(rendered.contains("apiVersion: kubeadm.k8s.io/v1beta2"));
        assert!(rendered.contains("kind: InitConfiguration"));
        assert!(rendered.contains("kubernetesVersion: v1.15.1"));
        assert!(!rendered.contains("v1.15.0"));
    }

    #[tokio::test]
    async fn test_unrenderable_params_fail_before_mutation() {
        let dir = TempDir::new().unwrap();
        let exec = cluster("v1.16.3", "v1.16.3");

        // a worker without join settings cannot produce a JoinConfiguration
        let mut params = ConfigParameters::default();
        params.node_pool = Some("batch".to_string());

        let err = orchestrator(&exec, &dir)
            .upgrade(&Version::new(1, 17, 2), NodeRole::Worker, Some(&params))
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::ValidationError(_)));
        assert!(exec.calls().is_empty());
        assert!(!dir.path().join("kubeadm.conf").exists());
    }

    #[tokio::test]
    async fn test_rejected_upgrade_leaves_config_untouched() {
        let dir = TempDir::new().unwrap();
        let exec = cluster("v1.16.0", "v1.16.0");

        let err = orchestrator(&exec, &dir)
            .upgrade(&Version::new(1, 18, 0), NodeRole::Worker, Some(&join_params()))
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::SkewTooLarge { .. }));
        assert!(!dir.path().join("kubeadm.conf").exists());
    }

    #[tokio::test]
    async fn test_upgrade_without_package_manager() {
        let dir = TempDir::new().unwrap();
        let exec = cluster("v1.16.0", "v1.16.0");
        let node = NodeOrchestrator::new(exec.clone())
            .with_config_path(dir.path().join("kubeadm.conf"));

        let err = node
            .upgrade(&Version::new(1, 16, 1), NodeRole::Primary, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::ConfigError(_)));
    }
}

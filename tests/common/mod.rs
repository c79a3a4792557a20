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

//! Shared fixtures: an executor that records every command instead of
//! running it, answering from canned responses.

#![allow(dead_code)]

use kube_bootstrap::{BootstrapError, CommandOutput, CommandSpec, Executor, Result};
use std::sync::Mutex;

enum Response {
    Output(String),
    Fail(i32, String),
}

/// Matches commands by substring of their rendered command line; the first
/// matching rule wins and unmatched commands succeed with empty output.
#[derive(Default)]
pub struct RecordingExecutor {
    rules: Mutex<Vec<(String, Response)>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, pattern: &str, stdout: impl Into<String>) -> Self {
        self.rules
            .lock()
            .unwrap()
            .push((pattern.to_string(), Response::Output(stdout.into())));
        self
    }

    pub fn fail(self, pattern: &str, status: i32, output: &str) -> Self {
        self.rules
            .lock()
            .unwrap()
            .push((pattern.to_string(), Response::Fail(status, output.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Rendered command lines, in invocation order
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.to_string()).collect()
    }
}

#[async_trait::async_trait]
impl Executor for RecordingExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());
        let line = spec.to_string();

        let rules = self.rules.lock().unwrap();
        match rules.iter().find(|(pattern, _)| line.contains(pattern.as_str())) {
            Some((_, Response::Output(stdout))) => Ok(CommandOutput {
                status: Some(0),
                stdout: stdout.clone(),
                stderr: String::new(),
                combined: stdout.clone(),
            }),
            Some((_, Response::Fail(status, output))) => Err(BootstrapError::subprocess_failure(
                &spec.program,
                &spec.args,
                Some(*status),
                output.clone(),
            )),
            None => Ok(CommandOutput {
                status: Some(0),
                ..Default::default()
            }),
        }
    }
}

/// `kubectl version -o json` output
pub fn version_json(client: &str, server: &str) -> String {
    format!(
        r#"{{"clientVersion": {{"major": "1", "gitVersion": "{}"}}, "serverVersion": {{"major": "1", "gitVersion": "{}"}}}}"#,
        client, server
    )
}

/// `kubectl get configmap kubeadm-config -o json` output
pub fn kubeadm_config_json(kubernetes_version: &str) -> String {
    let cluster_configuration = format!(
        "apiVersion: kubeadm.k8s.io/v1beta2\nkind: ClusterConfiguration\nkubernetesVersion: {}\n",
        kubernetes_version
    );
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {"name": "kubeadm-config", "namespace": "kube-system"},
        "data": {"ClusterConfiguration": cluster_configuration}
    })
    .to_string()
}

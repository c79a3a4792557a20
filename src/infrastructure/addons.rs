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

//! Post-install add-on manifests.
//!
//! Add-ons are external template files (network plugin, DNS tweaks, ...)
//! rendered with the cluster's parameters and applied with kubectl once the
//! control plane is up. Templates use jinja syntax, e.g. `{{ pod_subnet }}`.
//! Referencing a name outside the context is a render error.

use crate::domain::config::ConfigParameters;
use crate::domain::version::Version;
use crate::infrastructure::constants::{DEFAULT_CLUSTER_NAME, DEFAULT_DNS_DOMAIN, DEFAULT_SERVICE_SUBNET};
use crate::shared::error::{BootstrapError, Result};
use minijinja::{context, Environment, UndefinedBehavior, Value};
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST_EXTENSIONS: [&str; 3] = ["yaml", "yml", "j2"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonManifest {
    /// File name the rendered manifest is written under
    pub name: String,
    pub template: String,
}

impl AddonManifest {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let template =
            fs::read_to_string(path).map_err(|e| BootstrapError::filesystem(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().trim_end_matches(".j2").to_string())
            .ok_or_else(|| {
                BootstrapError::config_error(format!("Invalid add-on path: {}", path.display()))
            })?;
        Ok(Self::new(name, template))
    }

    pub fn render(&self, context: &Value) -> Result<String> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.add_template(&self.name, &self.template)?;
        let rendered = env.get_template(&self.name)?.render(context)?;
        Ok(rendered)
    }

    /// Where the rendered manifest lands under `dir`
    pub fn target_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.name)
    }
}

/// Load every manifest template in `dir`, ordered by file name so a
/// `00-network.yaml` style prefix controls apply order.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<Vec<AddonManifest>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| BootstrapError::filesystem(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BootstrapError::filesystem(dir, e))?.path();
        let is_manifest = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| MANIFEST_EXTENSIONS.contains(&ext))
            .unwrap_or(false);
        if path.is_file() && is_manifest {
            paths.push(path);
        }
    }
    paths.sort();

    paths.iter().map(AddonManifest::from_file).collect()
}

/// Values visible to add-on templates
pub fn addon_context(version: &Version, params: &ConfigParameters) -> Value {
    let text = |value: &Option<String>, default: &str| {
        value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(default)
            .to_string()
    };

    context! {
        kubernetes_version => version.tag(),
        cluster_name => text(&params.cluster_name, DEFAULT_CLUSTER_NAME),
        advertise_address => params.advertise_address.clone(),
        pod_subnet => text(&params.networking.pod_subnet, ""),
        service_subnet => text(&params.networking.service_subnet, DEFAULT_SERVICE_SUBNET),
        dns_domain => text(&params.networking.dns_domain, DEFAULT_DNS_DOMAIN),
        image_repository => text(&params.image_repository, ""),
        cloud_provider => params.cloud_provider().unwrap_or("").to_string(),
    }
}

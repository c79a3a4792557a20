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

use std::path::PathBuf;
use thiserror::Error;
pub type Result<T> = std::result::Result<T, BootstrapError>;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Malformed version '{input}': {reason}")]
    MalformedVersion { input: String, reason: String },

    #[error("Unsupported version {version}: supported minor versions are {supported}")]
    UnsupportedVersion { version: String, supported: String },

    #[error("Major version upgrade from {current} to {target} is not supported")]
    MajorUpgradeUnsupported { current: String, target: String },

    #[error("Downgrade from {current} to {target} is not supported")]
    DowngradeUnsupported { current: String, target: String },

    #[error(
        "Upgrade from {current} to {target} spans {gap} minor versions, \
         the maximum allowed skew is {max_skew}"
    )]
    SkewTooLarge {
        current: String,
        target: String,
        max_skew: u64,
        gap: u64,
    },

    #[error("Invalid taint spec '{0}': expected key=value:effect, key:effect or key-")]
    InvalidTaintSpec(String),

    #[error("Template render error: {0}")]
    TemplateRender(String),

    #[error("Command '{command} {}' failed with {}:\n{output}", .args.join(" "), status_text(.status))]
    SubprocessFailure {
        command: String,
        args: Vec<String>,
        status: Option<i32>,
        output: String,
    },

    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

fn status_text(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

impl From<minijinja::Error> for BootstrapError {
    fn from(err: minijinja::Error) -> Self {
        BootstrapError::TemplateRender(err.to_string())
    }
}

impl BootstrapError {
    pub fn config_error(context: impl Into<String>) -> Self {
        Self::ConfigError(context.into())
    }

    pub fn malformed_version(input: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedVersion {
            input: input.into(),
            reason: reason.to_string(),
        }
    }

    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn subprocess_failure(
        command: impl Into<String>,
        args: &[String],
        status: Option<i32>,
        output: impl Into<String>,
    ) -> Self {
        Self::SubprocessFailure {
            command: command.into(),
            args: args.to_vec(),
            status,
            output: output.into(),
        }
    }
}

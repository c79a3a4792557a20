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

//! kubeadm configuration API generations and the version table selecting them

use crate::domain::version::Version;
use crate::shared::error::{BootstrapError, Result};
use std::fmt;

/// One generation of the kubeadm configuration API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVariant {
    V1Alpha3,
    V1Beta1,
    V1Beta2,
}

impl SchemaVariant {
    pub fn api_version(&self) -> &'static str {
        match self {
            SchemaVariant::V1Alpha3 => "kubeadm.k8s.io/v1alpha3",
            SchemaVariant::V1Beta1 => "kubeadm.k8s.io/v1beta1",
            SchemaVariant::V1Beta2 => "kubeadm.k8s.io/v1beta2",
        }
    }

    /// v1alpha3 keeps control-plane component settings as flat, prefixed
    /// fields on ClusterConfiguration.
    pub fn has_flat_components(&self) -> bool {
        matches!(self, SchemaVariant::V1Alpha3)
    }

    pub fn supports_certificate_key(&self) -> bool {
        matches!(self, SchemaVariant::V1Beta2)
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_version())
    }
}

/// Supported Kubernetes 1.x minor versions. Adding a release is a new row.
pub const SCHEMA_TABLE: [(u64, SchemaVariant); 7] = [
    (12, SchemaVariant::V1Alpha3),
    (13, SchemaVariant::V1Beta1),
    (14, SchemaVariant::V1Beta1),
    (15, SchemaVariant::V1Beta2),
    (16, SchemaVariant::V1Beta2),
    (17, SchemaVariant::V1Beta2),
    (18, SchemaVariant::V1Beta2),
];

pub const SUPPORTED_MAJOR: u64 = 1;

/// Releases before this one only accept the `experimental-` encryption flag.
pub const ENCRYPTION_FLAG_THRESHOLD: Version = Version::new(1, 13, 0);

const ENCRYPTION_FLAG: &str = "encryption-provider-config";
const LEGACY_ENCRYPTION_FLAG: &str = "experimental-encryption-provider-config";

/// Outcome of schema selection for one target version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaSelection {
    pub version: Version,
    pub variant: SchemaVariant,
    pub legacy_encryption_flag: bool,
}

impl SchemaSelection {
    pub fn encryption_flag(&self) -> &'static str {
        if self.legacy_encryption_flag {
            LEGACY_ENCRYPTION_FLAG
        } else {
            ENCRYPTION_FLAG
        }
    }
}

pub fn select(version: &Version) -> Result<SchemaSelection> {
    let variant = if version.major == SUPPORTED_MAJOR {
        SCHEMA_TABLE
            .iter()
            .find(|(minor, _)| *minor == version.minor)
            .map(|(_, variant)| *variant)
    } else {
        None
    };

    let variant = variant.ok_or_else(|| BootstrapError::UnsupportedVersion {
        version: version.to_string(),
        supported: supported_versions(),
    })?;

    Ok(SchemaSelection {
        version: *version,
        variant,
        legacy_encryption_flag: *version < ENCRYPTION_FLAG_THRESHOLD,
    })
}

/// Human-readable list of supported minors, e.g. `1.12, 1.13, ...`.
pub fn supported_versions() -> String {
    SCHEMA_TABLE
        .iter()
        .map(|(minor, _)| format!("{}.{}", SUPPORTED_MAJOR, minor))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_supported_minor_maps_once() {
        for minor in 12..=18 {
            let selection = select(&Version::new(1, minor, 0)).unwrap();
            let expected = match minor {
                12 => SchemaVariant::V1Alpha3,
                13 | 14 => SchemaVariant::V1Beta1,
                _ => SchemaVariant::V1Beta2,
            };
            assert_eq!(selection.variant, expected, "minor {}", minor);
        }
    }

    #[test]
    fn test_unsupported_minor_names_version() {
        let err = select(&Version::new(1, 19, 0)).unwrap_err();
        match err {
            BootstrapError::UnsupportedVersion { version, supported } => {
                assert_eq!(version, "1.19.0");
                assert!(supported.contains("1.18"));
                assert!(!supported.contains("1.19"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(select(&Version::new(1, 11, 9)).is_err());
        assert!(select(&Version::new(2, 16, 0)).is_err());
    }

    #[test]
    fn test_encryption_flag_prefix() {
        let old = select(&Version::new(1, 12, 7)).unwrap();
        assert!(old.legacy_encryption_flag);
        assert_eq!(old.encryption_flag(), "experimental-encryption-provider-config");

        let new = select(&Version::new(1, 13, 0)).unwrap();
        assert!(!new.legacy_encryption_flag);
        assert_eq!(new.encryption_flag(), "encryption-provider-config");
    }
}

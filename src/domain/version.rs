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

//! Kubernetes release versions
//!
//! Only the numeric `major.minor.patch` triple is kept. Pre-release and build
//! metadata are accepted on input and dropped.

use crate::shared::error::{BootstrapError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A release version. Field order gives the derived ordering (major, minor, patch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let raw = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if raw.is_empty() {
            return Err(BootstrapError::malformed_version(input, "empty version string"));
        }

        let parsed =
            semver::Version::parse(raw).map_err(|e| BootstrapError::malformed_version(input, e))?;

        Ok(Self::new(parsed.major, parsed.minor, parsed.patch))
    }

    pub fn compare(&self, other: &Version) -> Ordering {
        self.cmp(other)
    }

    /// `v`-prefixed form used by kubeadm flags and `kubernetesVersion`.
    pub fn tag(&self) -> String {
        format!("v{}", self)
    }

    /// First patch release of this version's minor line.
    pub fn minor_base(&self) -> Self {
        Self::new(self.major, self.minor, 0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = BootstrapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_prefixed() {
        assert_eq!(Version::parse("1.16.3").unwrap(), Version::new(1, 16, 3));
        assert_eq!(Version::parse("v1.16.3").unwrap(), Version::new(1, 16, 3));
        assert_eq!(Version::parse(" v1.18.0 ").unwrap(), Version::new(1, 18, 0));
    }

    #[test]
    fn test_parse_drops_metadata() {
        assert_eq!(Version::parse("v1.17.0-rc.1").unwrap(), Version::new(1, 17, 0));
        assert_eq!(Version::parse("1.15.2+build.7").unwrap(), Version::new(1, 15, 2));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "v", "1.16", "one.two.three", "1.16.x", "1.16.3.4", "-1.2.3"] {
            let err = Version::parse(input).unwrap_err();
            assert!(
                matches!(err, BootstrapError::MalformedVersion { .. }),
                "expected MalformedVersion for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_ordering_is_numeric() {
        let versions = [
            Version::new(1, 9, 10),
            Version::new(1, 10, 0),
            Version::new(1, 10, 2),
            Version::new(1, 16, 0),
            Version::new(2, 0, 0),
        ];
        for (i, a) in versions.iter().enumerate() {
            for (j, b) in versions.iter().enumerate() {
                assert_eq!(a.compare(b), i.cmp(&j), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_display_round_trip() {
        for v in [Version::new(1, 12, 0), Version::new(1, 18, 20), Version::new(0, 0, 1)] {
            assert_eq!(Version::parse(&v.to_string()).unwrap(), v);
        }
        assert_eq!(Version::new(1, 16, 3).tag(), "v1.16.3");
    }

    #[test]
    fn test_serde_as_string() {
        let v: Version = serde_json::from_str("\"v1.15.4\"").unwrap();
        assert_eq!(v, Version::new(1, 15, 4));
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"1.15.4\"");
    }
}

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
use crate::infrastructure::constants::MAX_MINOR_SKEW;
use crate::shared::error::{BootstrapError, Result};
use std::fmt;

/// How an allowed upgrade reaches its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Same minor line, patch level moves forward (or stays)
    Patch,
    /// Exactly one minor line ahead
    Minor,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Patch => write!(f, "patch"),
            Classification::Minor => write!(f, "minor"),
        }
    }
}

/// A requested move from the running version to a target. The classification
/// is recomputed on every call, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeTransition {
    pub from: Version,
    pub to: Version,
}

impl UpgradeTransition {
    pub fn new(from: Version, to: Version) -> Self {
        Self { from, to }
    }

    pub fn classify(&self) -> Result<Classification> {
        classify(&self.from, &self.to)
    }
}

pub fn classify(current: &Version, target: &Version) -> Result<Classification> {
    let names = || (current.to_string(), target.to_string());

    if current.major != target.major {
        let (current, target) = names();
        return Err(BootstrapError::MajorUpgradeUnsupported { current, target });
    }

    if target.minor < current.minor {
        let (current, target) = names();
        return Err(BootstrapError::DowngradeUnsupported { current, target });
    }

    if target.minor == current.minor {
        if target.patch < current.patch {
            let (current, target) = names();
            return Err(BootstrapError::DowngradeUnsupported { current, target });
        }
        return Ok(Classification::Patch);
    }

    let gap = target.minor - current.minor;
    if gap > MAX_MINOR_SKEW {
        let (current, target) = names();
        return Err(BootstrapError::SkewTooLarge {
            current,
            target,
            max_skew: MAX_MINOR_SKEW,
            gap,
        });
    }

    Ok(Classification::Minor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(major: u64, minor: u64, patch: u64) -> Version {
        Version::new(major, minor, patch)
    }

    #[test]
    fn test_patch_transitions() {
        assert_eq!(classify(&v(1, 16, 0), &v(1, 16, 3)).unwrap(), Classification::Patch);
        assert_eq!(classify(&v(1, 16, 3), &v(1, 16, 3)).unwrap(), Classification::Patch);
    }

    #[test]
    fn test_minor_transition() {
        assert_eq!(classify(&v(1, 16, 3), &v(1, 17, 0)).unwrap(), Classification::Minor);
        // patch level of the source is irrelevant across minors
        assert_eq!(classify(&v(1, 16, 9), &v(1, 17, 2)).unwrap(), Classification::Minor);
    }

    #[test]
    fn test_skew_too_large() {
        match classify(&v(1, 16, 0), &v(1, 18, 0)).unwrap_err() {
            BootstrapError::SkewTooLarge { max_skew, gap, .. } => {
                assert_eq!(max_skew, 1);
                assert_eq!(gap, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_downgrades_rejected() {
        assert!(matches!(
            classify(&v(1, 17, 0), &v(1, 16, 5)),
            Err(BootstrapError::DowngradeUnsupported { .. })
        ));
        assert!(matches!(
            classify(&v(1, 16, 3), &v(1, 16, 2)),
            Err(BootstrapError::DowngradeUnsupported { .. })
        ));
    }

    #[test]
    fn test_major_rejected() {
        assert!(matches!(
            classify(&v(1, 18, 0), &v(2, 0, 0)),
            Err(BootstrapError::MajorUpgradeUnsupported { .. })
        ));
        assert!(matches!(
            classify(&v(2, 0, 0), &v(1, 18, 0)),
            Err(BootstrapError::MajorUpgradeUnsupported { .. })
        ));
    }

    #[test]
    fn test_policy_holds_for_all_pairs() {
        let versions: Vec<Version> = (0..=2)
            .flat_map(|major| {
                (10..=19).flat_map(move |minor| (0..=3).map(move |patch| v(major, minor, patch)))
            })
            .collect();

        for current in &versions {
            for target in &versions {
                let result = UpgradeTransition::new(*current, *target).classify();
                let allowed = current.major == target.major
                    && target.minor >= current.minor
                    && target.minor - current.minor <= 1
                    && (target.minor != current.minor || target.patch >= current.patch);
                assert_eq!(result.is_ok(), allowed, "{} -> {}", current, target);

                if let Ok(class) = result {
                    let expected = if target.minor == current.minor {
                        Classification::Patch
                    } else {
                        Classification::Minor
                    };
                    assert_eq!(class, expected, "{} -> {}", current, target);
                }
            }
        }
    }
}

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

pub mod kubeadm;
pub mod kubectl;
pub mod packages;
pub mod systemctl;

pub use kubeadm::{Kubeadm, NodeRole};
pub use kubectl::{parse_recorded_version, parse_version_report, Kubectl, ReportedVersions};
pub use packages::PackageManager;
pub use systemctl::Systemctl;

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

use crate::domain::sizing::reserved_memory;
use sysinfo::System;
use tracing::debug;

/// Total physical memory of this host in bytes
pub fn total_memory_bytes() -> u64 {
    let mut system = System::new();
    system.refresh_memory();
    system.total_memory()
}

/// Kubelet memory reservation sized for this host
pub fn host_reserved_memory() -> String {
    let total = total_memory_bytes();
    let reserved = reserved_memory(total);
    debug!("Host has {} bytes of memory, reserving {}", total, reserved);
    reserved
}

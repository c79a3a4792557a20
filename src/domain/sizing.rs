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

//! Reserved memory sizing for system and kubelet overhead

const MIB: u64 = 1 << 20;

/// (exclusive lower bound in MiB, multiplier), highest memory class first.
const RESERVATION_BREAKPOINTS: [(u64, f64); 10] = [
    (200_000, 0.06),
    (100_000, 0.076),
    (50_000, 0.092),
    (25_000, 0.123),
    (15_000, 0.166),
    (7_500, 0.225),
    (3_750, 0.243),
    (1_700, 0.256),
    (700, 0.3),
    (100, 0.4),
];

/// Memory to reserve on a host with `total_bytes` of physical memory, as a
/// kubelet quantity string such as `"2720Mi"`.
pub fn reserved_memory(total_bytes: u64) -> String {
    let mib = total_bytes / MIB;
    let multiplier = RESERVATION_BREAKPOINTS
        .iter()
        .find(|(floor, _)| mib > *floor)
        .map(|(_, m)| *m)
        .unwrap_or(0.0);

    // f64::round rounds half away from zero
    let reserved = (mib as f64 * multiplier).round() as u64;
    format!("{}Mi", reserved)
}

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

use crate::infrastructure::constants::SYSTEMCTL_BIN;
use crate::infrastructure::executor::CommandSpec;

#[derive(Debug, Clone)]
pub struct Systemctl {
    bin: String,
}

impl Default for Systemctl {
    fn default() -> Self {
        Self::new(SYSTEMCTL_BIN)
    }
}

impl Systemctl {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    fn unit_command(&self, verb: &str, unit: &str) -> CommandSpec {
        CommandSpec::new(&self.bin).args([verb, unit])
    }

    pub fn enable(&self, unit: &str) -> CommandSpec {
        self.unit_command("enable", unit)
    }

    pub fn start(&self, unit: &str) -> CommandSpec {
        self.unit_command("start", unit)
    }

    pub fn restart(&self, unit: &str) -> CommandSpec {
        self.unit_command("restart", unit)
    }

    pub fn daemon_reload(&self) -> CommandSpec {
        CommandSpec::new(&self.bin).arg("daemon-reload")
    }
}

// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::word::MAX_WIDTH;

/// Construction-time parameters of a testbench run.
///
/// All of these are fixed once the testbench is built; nothing is
/// renegotiated at runtime. Note that `output_width` is an independent
/// choice: narrower than `ceil(log2((2^input_width - 1) * burst_len + 1))`
/// makes the sum wrap, which is legitimate, tested behavior, not a
/// configuration error.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct TestbenchConfig {
    /// Number of input elements summed into one output (N).
    pub burst_len: usize,
    /// Bit width of the input payloads.
    pub input_width: u32,
    /// Bit width of the output payload and of the sum register.
    pub output_width: u32,
    /// Seed for the stimulus value stream.
    pub stimulus_seed: u64,
    /// Seed for the flow-disruption gates. The input-valid and
    /// output-ready gates derive distinct generators from it.
    pub chaos_seed: u64,
    /// Randomly stall valid/ready every cycle. When false both gates
    /// are held asserted and the run is back-to-back.
    pub disrupt_flow: bool,
}

impl Default for TestbenchConfig {
    fn default() -> Self {
        Self {
            burst_len: 5,
            input_width: 8,
            output_width: 16,
            stimulus_seed: 1337,
            chaos_seed: 0x87654321FEDCBA09,
            disrupt_flow: true,
        }
    }
}

impl TestbenchConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.burst_len == 0 {
            return Err(Error::ZeroBurstLength);
        }
        for width in [self.input_width, self.output_width] {
            if width == 0 || width > MAX_WIDTH {
                return Err(Error::InvalidWidth(width));
            }
        }
        Ok(())
    }

    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let reader = std::fs::File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn from_str(config: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(config)?)
    }
}

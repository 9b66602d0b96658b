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

//! Flow-control disruption: the chaos monkey on `valid` and `ready`.
//!
//! Each handshake signal the harness drives gets its own independent
//! gate. The gates are content-blind; they never look at the
//! accumulator or at the payloads, only at their own RNG or script.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

/// Per-cycle gate for one handshake signal.
pub enum FlowControl {
    /// Gate asserted every cycle (no stalls).
    AlwaysOn,
    /// Independent random boolean per cycle; deterministic for a seed
    /// so adversarial runs replay exactly.
    Chaos(Xoshiro256StarStar),
    /// Explicit cycle-by-cycle pattern for directed stall tests. Once
    /// the pattern is exhausted the gate stays asserted.
    Script(std::vec::IntoIter<bool>),
}

impl FlowControl {
    pub fn chaos(seed: u64) -> Self {
        Self::Chaos(Xoshiro256StarStar::seed_from_u64(seed))
    }

    pub fn script(pattern: Vec<bool>) -> Self {
        Self::Script(pattern.into_iter())
    }

    /// The gate value for the next cycle.
    pub fn advance(&mut self) -> bool {
        match self {
            Self::AlwaysOn => true,
            Self::Chaos(rng) => rng.gen::<bool>(),
            Self::Script(pattern) => pattern.next().unwrap_or(true),
        }
    }
}

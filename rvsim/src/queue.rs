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

use std::collections::VecDeque;

/// The raw values sampled for one completed input burst, in transfer
/// order.
pub type Burst = Vec<u64>;

/// FIFO of completed input bursts awaiting their output sum.
///
/// The stimulus generator enqueues one entry per completed burst; the
/// verifier dequeues one entry per observed output transfer. The
/// per-cycle evaluation order of the testbench serializes the two
/// sides, so no locking is involved. Its lifetime is scoped to a
/// single simulation run.
#[derive(Default)]
pub struct ReferenceQueue {
    bursts: VecDeque<Burst>,
}

impl ReferenceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_burst(&mut self, burst: Burst) {
        self.bursts.push_back(burst);
    }

    /// Oldest pending burst, or `None` when the output got ahead of
    /// the stimulus (a protocol violation the caller reports).
    pub fn pop_burst(&mut self) -> Option<Burst> {
        self.bursts.pop_front()
    }

    pub fn len(&self) -> usize {
        self.bursts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bursts.is_empty()
    }
}

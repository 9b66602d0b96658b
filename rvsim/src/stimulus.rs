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

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::queue::ReferenceQueue;
use crate::word::Word;
use crate::Cycle;

/// Drives randomized payload bursts onto the input stream.
///
/// One value is offered at a time; the generator holds it on the
/// payload lines, across however many stalled cycles it takes, and
/// only moves to the next draw after a cycle on which the transfer
/// predicate actually held. It never re-draws or skips a value under
/// backpressure. After the Nth acceptance of a burst the raw values
/// are pushed onto the reference queue for the verifier.
pub struct StimulusGenerator {
    rng: Xoshiro256StarStar,
    burst_len: usize,
    input_width: u32,
    offered: Word,
    accepted: Vec<u64>,
    bursts_completed: usize,
}

impl StimulusGenerator {
    pub fn new(burst_len: usize, input_width: u32, seed: u64) -> Self {
        assert!(burst_len >= 1);
        let mut generator = Self {
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            burst_len,
            input_width,
            offered: Word::zero(input_width),
            accepted: Vec::with_capacity(burst_len),
            bursts_completed: 0,
        };
        generator.offered = generator.draw();
        generator
    }

    fn draw(&mut self) -> Word {
        Word::from_value(self.rng.gen::<u64>(), self.input_width)
    }

    /// The value currently held on the input payload lines. Stable
    /// until [Self::element_accepted] is called.
    pub fn offered(&self) -> Word {
        self.offered
    }

    /// Record that the offered value transferred on this cycle, and
    /// draw the next one. On the Nth acceptance the completed burst is
    /// handed to the reference queue.
    pub fn element_accepted(&mut self, cycle: Cycle, queue: &mut ReferenceQueue) {
        self.accepted.push(self.offered.value());
        if self.accepted.len() == self.burst_len {
            log::debug!(
                "stimulus: cycle {} burst {} complete: {:?}",
                cycle,
                self.bursts_completed,
                self.accepted
            );
            queue.push_burst(std::mem::replace(
                &mut self.accepted,
                Vec::with_capacity(self.burst_len),
            ));
            self.bursts_completed += 1;
        }
        self.offered = self.draw();
    }

    /// Elements accepted into the currently open (incomplete) burst.
    pub fn in_flight(&self) -> usize {
        self.accepted.len()
    }

    pub fn bursts_completed(&self) -> usize {
        self.bursts_completed
    }
}

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

//! The design under test: sums bursts of N input transfers into one
//! output transfer.
//!
//! The accumulator is a plain synchronous state machine. Each cycle it
//! samples the committed state of both streams and returns the signal
//! values it drives for the *next* cycle (register semantics: nothing
//! it computes is visible on the cycle it sampled). It trusts its
//! inputs completely; correctness is judged from the outside by the
//! verifier, never in here.

use crate::channel::Stream;
use crate::word::Word;
use crate::Cycle;

/// Accumulator phase.
///
/// `Accumulating` while fewer than N elements of the open burst have
/// transferred; `Publishing` from the cycle after the Nth transfer
/// until the sum itself transfers on the output stream.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Accumulating,
    Publishing,
}

/// The signals the accumulator drives, committed for the next cycle.
#[derive(Clone, Copy, Debug)]
pub struct AccumulatorDrive {
    pub input_ready: bool,
    pub output_valid: bool,
    pub output_payload: Word,
}

pub struct BurstAccumulator {
    burst_len: usize,
    received: usize,
    sum: Word,
    phase: Phase,
}

impl BurstAccumulator {
    /// `burst_len` is N, fixed for the lifetime of the instance. The
    /// running sum lives in a register of `output_width` bits, so
    /// additions wrap at that width.
    pub fn new(burst_len: usize, output_width: u32) -> Self {
        assert!(burst_len >= 1);
        Self {
            burst_len,
            received: 0,
            sum: Word::zero(output_width),
            phase: Phase::Accumulating,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Elements accepted into the currently open burst (0..=N).
    pub fn received(&self) -> usize {
        self.received
    }

    pub fn sum(&self) -> Word {
        self.sum
    }

    /// Advance one cycle: sample the same-cycle stream state, commit
    /// the next state, and report the signals to drive.
    ///
    /// No pipelining: `input_ready` stays low for the entire
    /// `Publishing` phase, so a new burst cannot start until the
    /// previous sum has been taken.
    pub fn step(&mut self, cycle: Cycle, input: &Stream, output: &Stream) -> AccumulatorDrive {
        match self.phase {
            Phase::Accumulating => {
                if input.transfer() {
                    self.sum = self.sum.wrapping_add(input.payload.value());
                    self.received += 1;
                    log::trace!(
                        "accumulator: cycle {} accepted {} ({}/{}) sum={}",
                        cycle,
                        input.payload,
                        self.received,
                        self.burst_len,
                        self.sum
                    );
                    if self.received == self.burst_len {
                        self.phase = Phase::Publishing;
                        log::debug!("accumulator: cycle {} burst complete, sum={}", cycle, self.sum);
                    }
                }
            }
            Phase::Publishing => {
                if output.transfer() {
                    log::debug!("accumulator: cycle {} sum {} transferred", cycle, self.sum);
                    self.received = 0;
                    self.sum = Word::zero(self.sum.width());
                    self.phase = Phase::Accumulating;
                }
            }
        }
        AccumulatorDrive {
            input_ready: self.phase == Phase::Accumulating,
            output_valid: self.phase == Phase::Publishing,
            // held stable across the whole Publishing phase
            output_payload: self.sum,
        }
    }
}

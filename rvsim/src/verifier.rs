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

//! The independent judge. Watches the output stream, replays each
//! pending burst through the same fixed-width arithmetic, and records
//! every disagreement. Findings are diagnostics, not errors: the run
//! always continues to its cycle budget.

use itertools::Itertools;

use crate::channel::Stream;
use crate::queue::ReferenceQueue;
use crate::word::Word;
use crate::Cycle;

/// An output transfer whose payload disagreed with the reference sum.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Mismatch {
    pub cycle: Cycle,
    pub expected: u64,
    pub observed: u64,
}

/// What the verifier saw over one full run.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct VerificationReport {
    /// Cycles the simulation executed.
    pub cycles: Cycle,
    /// Complete input bursts recorded by the stimulus.
    pub bursts_completed: usize,
    /// Output transfers observed.
    pub outputs_observed: usize,
    /// Output transfers whose sum disagreed with the reference.
    pub mismatches: Vec<Mismatch>,
    /// Cycles on which an output transfer had no pending burst.
    pub unexpected_outputs: Vec<Cycle>,
    /// Complete bursts still awaiting their output at end of run.
    pub unmatched_bursts: usize,
    /// Elements accepted into a burst the cycle budget cut short.
    pub partial_elements: usize,
}

impl VerificationReport {
    /// The overall verdict. One undelivered burst at shutdown is
    /// tolerated (the pipeline had no chance to drain); anything else
    /// outstanding, and any mismatch or unexpected output, fails.
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
            && self.unexpected_outputs.is_empty()
            && self.unmatched_bursts + (self.partial_elements > 0) as usize <= 1
    }
}

impl std::fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        writeln!(
            f,
            "{} cycles: {} bursts in, {} sums out",
            self.cycles, self.bursts_completed, self.outputs_observed
        )?;
        if !self.mismatches.is_empty() {
            writeln!(
                f,
                "{} mismatched sums (cycles {})",
                self.mismatches.len(),
                self.mismatches.iter().map(|m| m.cycle).join(", ")
            )?;
        }
        if !self.unexpected_outputs.is_empty() {
            writeln!(
                f,
                "{} unexpected outputs (cycles {})",
                self.unexpected_outputs.len(),
                self.unexpected_outputs.iter().join(", ")
            )?;
        }
        if self.unmatched_bursts > 0 {
            writeln!(f, "{} bursts without an output sum", self.unmatched_bursts)?;
        }
        if self.partial_elements > 0 {
            writeln!(
                f,
                "1 partial burst ({} elements) cut off by the cycle budget",
                self.partial_elements
            )?;
        }
        write!(
            f,
            "verdict: {}",
            if self.is_clean() { "clean" } else { "FAILED" }
        )
    }
}

/// Observes output transfers and checks them against the reference
/// queue. Purely an observer: it drives no signals and the design
/// under test cannot see it.
pub struct ResultVerifier {
    output_width: u32,
    outputs_observed: usize,
    mismatches: Vec<Mismatch>,
    unexpected_outputs: Vec<Cycle>,
}

impl ResultVerifier {
    pub fn new(output_width: u32) -> Self {
        Self {
            output_width,
            outputs_observed: 0,
            mismatches: Vec::new(),
            unexpected_outputs: Vec::new(),
        }
    }

    /// The sum the design must produce for `burst`: fold at the output
    /// width, wrapping exactly as the accumulator register does.
    pub fn expected_sum(&self, burst: &[u64]) -> u64 {
        burst
            .iter()
            .fold(Word::zero(self.output_width), |sum, &value| {
                sum.wrapping_add(value)
            })
            .value()
    }

    /// Sample the output stream for this cycle. Pops the oldest
    /// reference entry on a transfer; logs and records any
    /// disagreement.
    pub fn observe(&mut self, cycle: Cycle, output: &Stream, queue: &mut ReferenceQueue) {
        if !output.transfer() {
            return;
        }
        self.outputs_observed += 1;
        match queue.pop_burst() {
            None => {
                log::error!(
                    "verifier: cycle {} output sum {} but no completed burst is pending",
                    cycle,
                    output.payload
                );
                self.unexpected_outputs.push(cycle);
            }
            Some(burst) => {
                let expected = self.expected_sum(&burst);
                let observed = output.payload.value();
                if expected != observed {
                    log::error!(
                        "verifier: cycle {} wrong sum: expected {} observed {} for burst {:?}",
                        cycle,
                        expected,
                        observed,
                        burst
                    );
                    self.mismatches.push(Mismatch {
                        cycle,
                        expected,
                        observed,
                    });
                } else {
                    log::trace!("verifier: cycle {} sum {} matches", cycle, observed);
                }
            }
        }
    }

    /// Fold the run's observations into the final report.
    pub fn finish(
        self,
        cycles: Cycle,
        bursts_completed: usize,
        queue: &ReferenceQueue,
        partial_elements: usize,
    ) -> VerificationReport {
        if !queue.is_empty() || partial_elements > 0 {
            log::warn!(
                "verifier: end of run with {} complete and {} partial element(s) undelivered",
                queue.len(),
                partial_elements
            );
        }
        VerificationReport {
            cycles,
            bursts_completed,
            outputs_observed: self.outputs_observed,
            mismatches: self.mismatches,
            unexpected_outputs: self.unexpected_outputs,
            unmatched_bursts: queue.len(),
            partial_elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::Word;

    fn transferring_output(value: u64, width: u32) -> Stream {
        let mut output = Stream::new(width);
        output.payload = Word::from_value(value, width);
        output.valid = true;
        output.ready = true;
        output
    }

    #[test]
    fn test_matching_sum() {
        let mut verifier = ResultVerifier::new(16);
        let mut queue = ReferenceQueue::new();
        queue.push_burst(vec![10, 20, 30, 40, 50]);
        verifier.observe(3, &transferring_output(150, 16), &mut queue);
        let report = verifier.finish(10, 1, &queue, 0);
        assert!(report.is_clean());
        assert_eq!(report.outputs_observed, 1);
    }

    #[test]
    fn test_mismatch_recorded_with_cycle() {
        let mut verifier = ResultVerifier::new(16);
        let mut queue = ReferenceQueue::new();
        queue.push_burst(vec![1, 2, 3]);
        verifier.observe(42, &transferring_output(7, 16), &mut queue);
        let report = verifier.finish(50, 1, &queue, 0);
        assert_eq!(
            report.mismatches,
            vec![Mismatch {
                cycle: 42,
                expected: 6,
                observed: 7
            }]
        );
        assert!(!report.is_clean());
    }

    #[test]
    fn test_unexpected_output() {
        let mut verifier = ResultVerifier::new(8);
        let mut queue = ReferenceQueue::new();
        verifier.observe(5, &transferring_output(1, 8), &mut queue);
        let report = verifier.finish(6, 0, &queue, 0);
        assert_eq!(report.unexpected_outputs, vec![5]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_expected_sum_wraps_at_output_width() {
        let verifier = ResultVerifier::new(8);
        // 300 mod 256
        assert_eq!(verifier.expected_sum(&[100, 100, 100]), 44);
    }

    #[test]
    fn test_non_transfer_cycles_ignored() {
        let mut verifier = ResultVerifier::new(8);
        let mut queue = ReferenceQueue::new();
        let mut output = transferring_output(9, 8);
        output.ready = false;
        verifier.observe(0, &output, &mut queue);
        output.ready = true;
        output.valid = false;
        verifier.observe(1, &output, &mut queue);
        let report = verifier.finish(2, 0, &queue, 0);
        assert_eq!(report.outputs_observed, 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_one_undrained_burst_tolerated() {
        let verifier = ResultVerifier::new(8);
        let mut queue = ReferenceQueue::new();
        queue.push_burst(vec![1, 2]);
        let report = verifier.finish(10, 1, &queue, 0);
        assert!(report.is_clean());

        let verifier = ResultVerifier::new(8);
        queue.push_burst(vec![3, 4]);
        let report = verifier.finish(10, 2, &queue, 0);
        assert_eq!(report.unmatched_bursts, 2);
        assert!(!report.is_clean());
    }
}

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

//! Cycle-accurate testbench for a ready/valid burst-summing stream
//! transformer, with a randomized flow-disruption harness that proves
//! the design correct under adversarial stalls.

mod accumulator;
mod channel;
mod config;
mod error;
mod flow;
mod queue;
mod sim;
mod stimulus;
mod vcd;
mod verifier;
mod word;

// Public types
// type to use for cycles
pub type Cycle = usize;

pub use crate::accumulator::{AccumulatorDrive, BurstAccumulator, Phase};
pub use crate::channel::Stream;
pub use crate::config::TestbenchConfig;
pub use crate::error::Error;
pub use crate::flow::FlowControl;
pub use crate::queue::{Burst, ReferenceQueue};
pub use crate::sim::{OptionSimCallbacks, SimulationCallbacks, Testbench};
pub use crate::stimulus::StimulusGenerator;
pub use crate::vcd::{VcdComponent, VcdWriter};
pub use crate::verifier::{Mismatch, ResultVerifier, VerificationReport};
pub use crate::word::{Word, MAX_WIDTH};

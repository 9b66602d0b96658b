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

//! The testbench orchestrator: one accumulator under test, wired
//! between a stimulus generator and a verifier over two handshake
//! streams, stepped on a single shared cycle counter.
//!
//! Each cycle is a transaction with synchronous-register semantics:
//! every component samples the signal state committed at the end of
//! the previous cycle, computes from that same snapshot, and the
//! values they drive are committed together for the next cycle. No
//! component can observe another's same-cycle change, so the
//! evaluation order inside a cycle carries no information.

use std::cell::RefCell;
use std::rc::Rc;

use crate::accumulator::{BurstAccumulator, Phase};
use crate::channel::Stream;
use crate::config::TestbenchConfig;
use crate::error::Error;
use crate::flow::FlowControl;
use crate::queue::ReferenceQueue;
use crate::stimulus::StimulusGenerator;
use crate::vcd::{VcdComponent, VcdWriter, DEFAULT_TOP_MODULE};
use crate::verifier::{ResultVerifier, VerificationReport};
use crate::word::Word;
use crate::Cycle;

/// Offset applied to `chaos_seed` for the output-ready gate, so the
/// two gates never share a generator stream.
const READY_GATE_SEED_STRIDE: u64 = 0x9E3779B97F4A7C15;

#[derive(Default)]
pub struct SimulationCallbacks {
    vcd_writer: Option<Rc<RefCell<VcdWriter>>>,
}

impl SimulationCallbacks {
    pub fn get_vcd_writer(&mut self) -> Option<Rc<RefCell<VcdWriter>>> {
        match &self.vcd_writer {
            Some(writer) => Some(Rc::clone(writer)),
            None => None,
        }
    }

    pub fn create_vcd_callbacks() -> Self {
        Self {
            vcd_writer: Some(Rc::new(RefCell::new(VcdWriter::default()))),
        }
    }

    pub fn with_vcd_writer(writer: VcdWriter) -> Self {
        Self {
            vcd_writer: Some(Rc::new(RefCell::new(writer))),
        }
    }

    pub fn vcd<F>(&mut self, f: F)
    where
        F: FnOnce(Rc<RefCell<VcdWriter>>),
    {
        self.get_vcd_writer().map(|writer| f(writer));
    }
}

pub type OptionSimCallbacks<'a> = &'a mut SimulationCallbacks;

pub struct Testbench {
    config: TestbenchConfig,
    cycle: Cycle,
    input: Stream,
    output: Stream,
    dut: BurstAccumulator,
    stimulus: StimulusGenerator,
    valid_gate: FlowControl,
    ready_gate: FlowControl,
    queue: ReferenceQueue,
    verifier: ResultVerifier,
}

impl Testbench {
    /// Build a testbench with the flow gates the config implies:
    /// chaotic (seeded) when `disrupt_flow` is set, otherwise always
    /// asserted.
    pub fn new(config: TestbenchConfig) -> Result<Self, Error> {
        let (valid_gate, ready_gate) = if config.disrupt_flow {
            (
                FlowControl::chaos(config.chaos_seed),
                FlowControl::chaos(config.chaos_seed.wrapping_add(READY_GATE_SEED_STRIDE)),
            )
        } else {
            (FlowControl::AlwaysOn, FlowControl::AlwaysOn)
        };
        Self::with_gates(config, valid_gate, ready_gate)
    }

    /// Build a testbench with explicit flow gates, for directed stall
    /// scenarios.
    pub fn with_gates(
        config: TestbenchConfig,
        valid_gate: FlowControl,
        ready_gate: FlowControl,
    ) -> Result<Self, Error> {
        config.validate()?;
        let stimulus =
            StimulusGenerator::new(config.burst_len, config.input_width, config.stimulus_seed);
        let mut input = Stream::new(config.input_width);
        // the first offer sits on the payload lines before cycle 0;
        // valid and ready come up once the gates and the DUT drive them
        input.payload = stimulus.offered();
        Ok(Self {
            cycle: 0,
            input,
            output: Stream::new(config.output_width),
            dut: BurstAccumulator::new(config.burst_len, config.output_width),
            stimulus,
            valid_gate,
            ready_gate,
            queue: ReferenceQueue::new(),
            verifier: ResultVerifier::new(config.output_width),
            config,
        })
    }

    pub fn config(&self) -> &TestbenchConfig {
        &self.config
    }

    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    /// Committed state of the input stream for the upcoming cycle.
    pub fn input(&self) -> &Stream {
        &self.input
    }

    /// Committed state of the output stream for the upcoming cycle.
    pub fn output(&self) -> &Stream {
        &self.output
    }

    pub fn dut(&self) -> &BurstAccumulator {
        &self.dut
    }

    /// Advance the whole system by one cycle.
    pub fn simulate_system_one_cycle(&mut self, callbacks: OptionSimCallbacks) {
        // sample phase: every component reads this snapshot and
        // nothing else
        let input = self.input;
        let output = self.output;

        self.verifier.observe(self.cycle, &output, &mut self.queue);
        if input.transfer() {
            self.stimulus.element_accepted(self.cycle, &mut self.queue);
        }
        let drive = self.dut.step(self.cycle, &input, &output);

        // commit phase: the signal state all components will sample
        // next cycle
        self.input.payload = self.stimulus.offered();
        self.input.valid = self.valid_gate.advance();
        self.input.ready = drive.input_ready;
        self.output.payload = drive.output_payload;
        self.output.valid = drive.output_valid;
        self.output.ready = self.ready_gate.advance();
        self.cycle += 1;

        log::trace!(
            "cycle {}: input[{}] output[{}]",
            self.cycle,
            self.input,
            self.output
        );
        let testbench: &Self = self;
        callbacks.vcd(|writer| {
            writer.borrow_mut().enter_cycle();
            testbench.vcd_trace(Rc::clone(&writer));
            writer.borrow_mut().end_cycle();
        });
    }

    /// Run for `cycles` and return the verifier's findings.
    pub fn run(self, cycles: Cycle, callbacks: OptionSimCallbacks) -> VerificationReport {
        self.run_with_inspect(cycles, callbacks, |_, _| {})
    }

    /// Like [Self::run], with an observer invoked once per cycle on
    /// the committed state that cycle is about to sample. Tests use it
    /// to check per-cycle invariants (output stability, no pipelining)
    /// without giving the design under test any way to notice it is
    /// being watched.
    pub fn run_with_inspect<F>(
        mut self,
        cycles: Cycle,
        callbacks: OptionSimCallbacks,
        mut inspect: F,
    ) -> VerificationReport
    where
        F: FnMut(Cycle, &Testbench),
    {
        {
            let testbench: &Self = &self;
            callbacks.vcd(|writer| VcdWriter::write_header(Rc::clone(&writer), testbench));
        }
        for _ in 0..cycles {
            inspect(self.cycle, &self);
            self.simulate_system_one_cycle(callbacks);
        }
        callbacks.vcd(|writer| writer.borrow_mut().flush_after_simulation());

        let report = self.verifier.finish(
            self.cycle,
            self.stimulus.bursts_completed(),
            &self.queue,
            self.stimulus.in_flight(),
        );
        log::info!("testbench finished: {}", report);
        report
    }

    fn vcd_trace(&self, writer: Rc<RefCell<VcdWriter>>) {
        let _top = VcdWriter::managed_trace_scope(Rc::clone(&writer), DEFAULT_TOP_MODULE);
        {
            let _scope = VcdWriter::managed_trace_scope(Rc::clone(&writer), "input");
            let mut writer = writer.borrow_mut();
            writer.change_scalar("valid", self.input.valid);
            writer.change_scalar("ready", self.input.ready);
            writer.change_word("payload", &self.input.payload);
        }
        {
            let _scope = VcdWriter::managed_trace_scope(Rc::clone(&writer), "output");
            let mut writer = writer.borrow_mut();
            writer.change_scalar("valid", self.output.valid);
            writer.change_scalar("ready", self.output.ready);
            writer.change_word("payload", &self.output.payload);
        }
        {
            let _scope = VcdWriter::managed_trace_scope(Rc::clone(&writer), "dut");
            let mut writer = writer.borrow_mut();
            writer.change_word("sum", &self.dut.sum());
            writer.change_word("received", &Word::from_value(self.dut.received() as u64, 32));
            writer.change_scalar("publishing", self.dut.phase() == Phase::Publishing);
        }
    }
}

impl VcdComponent for Testbench {
    fn vcd_write_scope(&self, writer: Rc<RefCell<VcdWriter>>) {
        let _top = VcdWriter::managed_decl_scope(Rc::clone(&writer), DEFAULT_TOP_MODULE);
        {
            let _scope = VcdWriter::managed_decl_scope(Rc::clone(&writer), "input");
            let mut writer = writer.borrow_mut();
            writer.add_wire(1, "valid");
            writer.add_wire(1, "ready");
            writer.add_wire(self.config.input_width as usize, "payload");
        }
        {
            let _scope = VcdWriter::managed_decl_scope(Rc::clone(&writer), "output");
            let mut writer = writer.borrow_mut();
            writer.add_wire(1, "valid");
            writer.add_wire(1, "ready");
            writer.add_wire(self.config.output_width as usize, "payload");
        }
        {
            let _scope = VcdWriter::managed_decl_scope(Rc::clone(&writer), "dut");
            let mut writer = writer.borrow_mut();
            writer.add_wire(self.config.output_width as usize, "sum");
            writer.add_wire(32, "received");
            writer.add_wire(1, "publishing");
        }
    }

    fn vcd_init(&self, writer: Rc<RefCell<VcdWriter>>) {
        self.vcd_trace(writer);
    }
}

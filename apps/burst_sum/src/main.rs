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

//! Runs the burst-sum testbench from the command line: randomized
//! stimulus and flow disruption against the accumulator, an optional
//! VCD dump of all handshake signals, and a verification summary as
//! the exit status.

use std::path::PathBuf;

use env_logger::Target;
use structopt::StructOpt;

use rvsim::{SimulationCallbacks, Testbench, TestbenchConfig, VcdWriter};

#[derive(StructOpt)]
#[structopt(
    name = "burst_sum",
    about = "Chaos-tested ready/valid burst-summing stream simulator"
)]
struct Arguments {
    /// cycle budget for the run
    #[structopt(short, long, default_value = "10000")]
    cycles: usize,
    /// number of input elements summed per output (N)
    #[structopt(short = "n", long, default_value = "5")]
    burst_len: usize,
    /// input payload bit width
    #[structopt(long, default_value = "8")]
    input_width: u32,
    /// output payload bit width; narrower than the worst-case sum
    /// makes the result wrap
    #[structopt(long, default_value = "16")]
    output_width: u32,
    /// seed for the stimulus value stream
    #[structopt(long, default_value = "1337")]
    stimulus_seed: u64,
    /// seed for the random valid/ready stalls
    #[structopt(long, default_value = "9756277981056907785")]
    chaos_seed: u64,
    /// disable flow disruption and run back-to-back
    #[structopt(long)]
    no_chaos: bool,
    /// record all handshake signals and DUT registers to this VCD file
    #[structopt(long, parse(from_os_str))]
    vcd: Option<PathBuf>,
    /// YAML testbench configuration; command-line flags are ignored
    /// when set
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Arguments::from_args();

    env_logger::builder()
        .filter(Some("rvsim"), log::LevelFilter::Debug)
        .target(Target::Stderr)
        .init();

    let config = match &args.config {
        Some(path) => TestbenchConfig::from_file(path)?,
        None => TestbenchConfig {
            burst_len: args.burst_len,
            input_width: args.input_width,
            output_width: args.output_width,
            stimulus_seed: args.stimulus_seed,
            chaos_seed: args.chaos_seed,
            disrupt_flow: !args.no_chaos,
        },
    };

    let mut callbacks = match &args.vcd {
        Some(path) => SimulationCallbacks::with_vcd_writer(VcdWriter::new(path.clone())?),
        None => SimulationCallbacks::default(),
    };

    let testbench = Testbench::new(config)?;
    let report = testbench.run(args.cycles, &mut callbacks);
    println!("{}", report);

    if !report.is_clean() {
        anyhow::bail!("verification failed");
    }
    Ok(())
}

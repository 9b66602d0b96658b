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

use crate::word::Word;

/// A ready/valid handshake stream.
///
/// Three signals and nothing else: the producer drives `payload` and
/// `valid`, the consumer drives `ready`. Information moves on exactly
/// the cycles where both are asserted (a *transfer*); the payload
/// sampled on any other cycle carries no meaning. Signals keep their
/// value until the owning side drives them again.
#[derive(Clone, Copy, Debug)]
pub struct Stream {
    pub payload: Word,
    pub valid: bool,
    pub ready: bool,
}

impl Stream {
    /// A stream carrying payloads of the given bit width, with both
    /// handshake signals deasserted.
    pub fn new(width: u32) -> Self {
        Self {
            payload: Word::zero(width),
            valid: false,
            ready: false,
        }
    }

    /// The transfer predicate: does a payload move on this cycle?
    pub fn transfer(&self) -> bool {
        self.valid && self.ready
    }

    pub fn width(&self) -> u32 {
        self.payload.width()
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "v={} r={} payload={}",
            self.valid as u8, self.ready as u8, self.payload
        )
    }
}

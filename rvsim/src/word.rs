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

use bitvec::prelude::*;

/// Maximum number of bits a [Word] can carry; values live in a u64.
pub const MAX_WIDTH: u32 = 64;

/// A fixed-width unsigned register value.
///
/// The width is set when the word is created and never changes; all
/// arithmetic is performed modulo 2^width, i.e., additions wrap the way
/// a hardware register of that width would. Widths range 1..=64.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Word {
    value: u64,
    width: u32,
}

impl Word {
    /// A zeroed register of the given width.
    pub fn zero(width: u32) -> Self {
        assert!((1..=MAX_WIDTH).contains(&width), "invalid width {}", width);
        Self { value: 0, width }
    }

    /// Wrap a raw value into a register of the given width; upper bits
    /// are discarded.
    pub fn from_value(value: u64, width: u32) -> Self {
        let mut word = Self::zero(width);
        word.value = value & word.mask();
        word
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    fn mask(&self) -> u64 {
        if self.width == MAX_WIDTH {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }

    /// Addition modulo 2^width.
    pub fn wrapping_add(self, rhs: u64) -> Self {
        Self {
            value: self.value.wrapping_add(rhs) & self.mask(),
            width: self.width,
        }
    }

    /// Pack the value into a bit vector (LSB first) for VCD tracing.
    pub fn to_bits(&self) -> BitBox<usize, Lsb0> {
        let mut bits = BitVec::<usize, Lsb0>::repeat(false, self.width as usize);
        for idx in 0..self.width as usize {
            bits.set(idx, (self.value >> idx) & 1 == 1);
        }
        bits.into_boxed_bitslice()
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masking() {
        assert_eq!(Word::from_value(300, 8).value(), 44);
        assert_eq!(Word::from_value(255, 8).value(), 255);
        assert_eq!(Word::from_value(u64::MAX, 64).value(), u64::MAX);
        assert_eq!(Word::from_value(2, 1).value(), 0);
    }

    #[test]
    fn test_wrapping_add() {
        let w = Word::from_value(250, 8).wrapping_add(10);
        assert_eq!(w.value(), 4);
        assert_eq!(w.width(), 8);
        let w = Word::from_value(u64::MAX, 64).wrapping_add(1);
        assert_eq!(w.value(), 0);
    }

    #[test]
    fn test_to_bits() {
        let bits = Word::from_value(0b101, 4).to_bits();
        assert_eq!(bits.len(), 4);
        assert!(bits[0]);
        assert!(!bits[1]);
        assert!(bits[2]);
        assert!(!bits[3]);
    }

    #[test]
    #[should_panic]
    fn test_zero_width_rejected() {
        Word::zero(0);
    }
}

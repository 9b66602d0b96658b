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

use std::fmt;

/// Construction-time configuration errors.
///
/// Verification findings (wrong sums, unexpected outputs, undrained
/// bursts) are deliberately *not* errors; they live in the
/// [crate::VerificationReport].
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    ZeroBurstLength,
    InvalidWidth(u32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ZeroBurstLength => {
                write!(f, "ERROR: burst length must be at least 1")
            }
            Self::InvalidWidth(width) => {
                write!(f, "ERROR: invalid bit width {} (expected 1..=64)", width)
            }
        }
    }
}

// needed to allow `anyhow::Result` to accept our definition of errors;
// the application and the integration tests use `anyhow` throughout.
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types

use std::fmt;

/// ECS error type
#[derive(Debug)]
pub enum EcsError {
    /// A `Vec`/map growth could not acquire the memory it needed.
    AllocationFailed,

    /// A scheduled system returned an error; carries its position in the
    /// schedule so the caller can identify which one failed.
    System(usize, Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::AllocationFailed => write!(f, "allocation failed"),
            EcsError::System(index, err) => write!(f, "system {index} failed: {err}"),
        }
    }
}

impl std::error::Error for EcsError {}

impl From<std::collections::TryReserveError> for EcsError {
    fn from(_: std::collections::TryReserveError) -> Self {
        EcsError::AllocationFailed
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EcsError>;

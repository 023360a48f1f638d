// Copyright 2025 eraflo
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

//! Backend-agnostic rendering contracts.
//!
//! Nothing in here talks to a GPU. The types describe what shader parameters
//! look like and how they are laid out in memory, so that a device backend or
//! a code generator can consume them without re-deriving the packing rules.

pub mod effect;
pub mod error;

pub use self::effect::*;
pub use self::error::{LayoutError, ShaderTypeError};

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

//! Recoverable error types for the effect subsystem.
//!
//! Malformed construction through the infallible constructors is a contract
//! violation and panics; these errors cover input that comes from outside the
//! program (shader source spellings, configuration files, user-driven layout
//! building).

use thiserror::Error;

/// An error produced while parsing or validating a shader value type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderTypeError {
    /// The input contained no type spelling at all.
    #[error("empty shader type spelling")]
    Empty,
    /// The scalar keyword is not one of `bool`, `int`, `uint`, `float`, `double`.
    #[error("unknown scalar type '{0}'")]
    UnknownScalar(String),
    /// A vector dimension or matrix extent lies outside `1..=4`.
    #[error("{what} must be between 1 and 4, got {value}")]
    DimensionOutOfRange {
        /// Which extent was rejected (`dimensions`, `rows` or `columns`).
        what: &'static str,
        /// The rejected value.
        value: u32,
    },
    /// A `row_major` / `column_major` qualifier was applied to a non-matrix type.
    #[error("orientation qualifier is only valid on matrix types, got '{0}'")]
    OrientationOnNonMatrix(String),
    /// The spelling could not be understood.
    #[error("malformed shader type '{0}'")]
    Malformed(String),
}

/// An error produced while building or filling a constant buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A field with an empty name was pushed.
    #[error("constant buffer fields must have a name")]
    EmptyFieldName,
    /// Two fields share the same name.
    #[error("duplicate constant buffer field '{0}'")]
    DuplicateField(String),
    /// The requested field does not exist in the layout.
    #[error("unknown constant buffer field '{0}'")]
    UnknownField(String),
    /// The element type written does not match the field's scalar width.
    #[error("element size mismatch for '{field}': expected {expected} bytes, got {actual}")]
    ElementSizeMismatch {
        /// The field being written.
        field: String,
        /// The scalar width of the field.
        expected: usize,
        /// The width of the supplied element type.
        actual: usize,
    },
    /// The number of elements written does not match the field's shape.
    #[error("element count mismatch for '{field}': expected {expected}, got {actual}")]
    ElementCountMismatch {
        /// The field being written.
        field: String,
        /// The number of scalars the field holds.
        expected: usize,
        /// The number of scalars supplied.
        actual: usize,
    },
}

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

//! Scalar, vector and matrix shader types and their constant-buffer packing.
//!
//! Packing follows the HLSL constant-buffer convention
//! (<https://github.com/microsoft/DirectXShaderCompiler/wiki/Buffer-Packing>):
//! every stored matrix row occupies its own 16-byte register, while scalars
//! and vectors are only aligned to their element.

use super::packing::{align_up, CONSTANT_REGISTER_SIZE};
use crate::renderer::error::ShaderTypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The element type of a shader value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    /// A 32-bit boolean.
    Bool,
    /// A 32-bit signed integer.
    Int,
    /// A 32-bit unsigned integer.
    UInt,
    /// A 32-bit float.
    Float,
    /// A 64-bit float.
    Double,
}

impl ScalarKind {
    /// Returns the size in bytes of one element.
    ///
    /// Booleans are stored as full 32-bit words; there is no sub-word packing.
    pub const fn size(self) -> u32 {
        match self {
            ScalarKind::Bool | ScalarKind::Int | ScalarKind::UInt | ScalarKind::Float => 4,
            ScalarKind::Double => 8,
        }
    }

    /// Returns the alignment in bytes of one element, which equals its size.
    pub const fn alignment(self) -> u32 {
        self.size()
    }

    /// Returns the shading-language keyword for this element type.
    pub const fn keyword(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::UInt => "uint",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The shape of a [`ShaderValueType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// A single element.
    Scalar,
    /// One to four elements.
    Vector,
    /// A grid of one to four rows by one to four columns.
    Matrix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repr {
    Scalar {
        kind: ScalarKind,
    },
    Vector {
        kind: ScalarKind,
        dimensions: u8,
    },
    Matrix {
        kind: ScalarKind,
        rows: u8,
        columns: u8,
        row_major: bool,
    },
}

/// How the stored rows of a value sit in a constant buffer.
///
/// Matrices are described in storage orientation: for a column-major matrix
/// a "row" here is one of its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StorageRows {
    /// Number of stored rows.
    pub count: u32,
    /// Elements per stored row.
    pub width: u32,
    /// Distance in bytes between the starts of consecutive stored rows.
    pub stride: u32,
}

/// The type of a shader parameter: a scalar, a vector or a matrix.
///
/// Values are immutable once built. Extents are validated at construction, so
/// every instance satisfies `1 <= dimensions, rows, columns <= 4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShaderValueType {
    repr: Repr,
}

const MAX_EXTENT: u32 = 4;

const fn extent_in_range(value: u32) -> bool {
    1 <= value && value <= MAX_EXTENT
}

impl ShaderValueType {
    /// `float`
    pub const FLOAT: Self = Self::scalar(ScalarKind::Float);
    /// `float2`
    pub const FLOAT2: Self = Self::vector(ScalarKind::Float, 2);
    /// `float3`
    pub const FLOAT3: Self = Self::vector(ScalarKind::Float, 3);
    /// `float4`
    pub const FLOAT4: Self = Self::vector(ScalarKind::Float, 4);
    /// `float4x4`, column-major.
    pub const FLOAT4X4: Self = Self::matrix(ScalarKind::Float, 4, 4, false);
    /// `int`
    pub const INT: Self = Self::scalar(ScalarKind::Int);
    /// `uint`
    pub const UINT: Self = Self::scalar(ScalarKind::UInt);
    /// `bool`
    pub const BOOL: Self = Self::scalar(ScalarKind::Bool);

    /// Creates a scalar type.
    pub const fn scalar(kind: ScalarKind) -> Self {
        Self {
            repr: Repr::Scalar { kind },
        }
    }

    /// Creates a vector type.
    ///
    /// # Panics
    ///
    /// Panics if `dimensions` is not in `1..=4`.
    pub const fn vector(kind: ScalarKind, dimensions: u32) -> Self {
        assert!(
            extent_in_range(dimensions),
            "vector dimensions must be between 1 and 4"
        );
        Self {
            repr: Repr::Vector {
                kind,
                dimensions: dimensions as u8,
            },
        }
    }

    /// Creates a matrix type.
    ///
    /// # Panics
    ///
    /// Panics if `rows` or `columns` is not in `1..=4`.
    pub const fn matrix(kind: ScalarKind, rows: u32, columns: u32, row_major: bool) -> Self {
        assert!(
            extent_in_range(rows) && extent_in_range(columns),
            "matrix rows and columns must be between 1 and 4"
        );
        Self {
            repr: Repr::Matrix {
                kind,
                rows: rows as u8,
                columns: columns as u8,
                row_major,
            },
        }
    }

    /// Creates a vector type, reporting an out-of-range extent as an error.
    pub fn try_vector(kind: ScalarKind, dimensions: u32) -> Result<Self, ShaderTypeError> {
        check_extent("dimensions", dimensions)?;
        Ok(Self::vector(kind, dimensions))
    }

    /// Creates a matrix type, reporting an out-of-range extent as an error.
    pub fn try_matrix(
        kind: ScalarKind,
        rows: u32,
        columns: u32,
        row_major: bool,
    ) -> Result<Self, ShaderTypeError> {
        check_extent("rows", rows)?;
        check_extent("columns", columns)?;
        Ok(Self::matrix(kind, rows, columns, row_major))
    }

    /// Returns the shape of this type.
    pub const fn category(&self) -> TypeCategory {
        match self.repr {
            Repr::Scalar { .. } => TypeCategory::Scalar,
            Repr::Vector { .. } => TypeCategory::Vector,
            Repr::Matrix { .. } => TypeCategory::Matrix,
        }
    }

    /// Returns `true` for scalar types.
    pub const fn is_scalar(&self) -> bool {
        matches!(self.repr, Repr::Scalar { .. })
    }

    /// Returns `true` for vector types.
    pub const fn is_vector(&self) -> bool {
        matches!(self.repr, Repr::Vector { .. })
    }

    /// Returns `true` for matrix types.
    pub const fn is_matrix(&self) -> bool {
        matches!(self.repr, Repr::Matrix { .. })
    }

    /// Returns the element type, whatever the shape.
    pub const fn scalar_kind(&self) -> ScalarKind {
        match self.repr {
            Repr::Scalar { kind } | Repr::Vector { kind, .. } | Repr::Matrix { kind, .. } => kind,
        }
    }

    /// Returns the number of components of a vector.
    ///
    /// # Panics
    ///
    /// Panics if this is not a vector type.
    pub fn vector_dimensions(&self) -> u32 {
        match self.repr {
            Repr::Vector { dimensions, .. } => u32::from(dimensions),
            _ => panic!("vector_dimensions() called on a {:?} type", self.category()),
        }
    }

    /// Returns the number of rows of a matrix.
    ///
    /// # Panics
    ///
    /// Panics if this is not a matrix type.
    pub fn matrix_rows(&self) -> u32 {
        match self.repr {
            Repr::Matrix { rows, .. } => u32::from(rows),
            _ => panic!("matrix_rows() called on a {:?} type", self.category()),
        }
    }

    /// Returns the number of columns of a matrix.
    ///
    /// # Panics
    ///
    /// Panics if this is not a matrix type.
    pub fn matrix_columns(&self) -> u32 {
        match self.repr {
            Repr::Matrix { columns, .. } => u32::from(columns),
            _ => panic!("matrix_columns() called on a {:?} type", self.category()),
        }
    }

    /// Returns `true` if a matrix is stored row by row.
    ///
    /// # Panics
    ///
    /// Panics if this is not a matrix type.
    pub fn is_matrix_row_major(&self) -> bool {
        match self.repr {
            Repr::Matrix { row_major, .. } => row_major,
            _ => panic!("is_matrix_row_major() called on a {:?} type", self.category()),
        }
    }

    /// Returns the total number of scalars held by a value of this type.
    pub fn element_count(&self) -> u32 {
        match self.repr {
            Repr::Scalar { .. } => 1,
            Repr::Vector { dimensions, .. } => u32::from(dimensions),
            Repr::Matrix { rows, columns, .. } => u32::from(rows) * u32::from(columns),
        }
    }

    /// Returns the number of bytes a value of this type occupies in a
    /// constant buffer.
    ///
    /// A matrix with a single stored row packs like a vector. Any other
    /// matrix stores each row (each column when column-major) in its own
    /// 16-byte-aligned slot.
    pub fn buffer_packing_size(&self) -> u32 {
        let kind = self.scalar_kind();
        let rows = self.storage_rows();
        if self.is_matrix() && rows.count > 1 {
            rows.stride * rows.count
        } else {
            kind.size() * rows.width
        }
    }

    /// Returns the alignment in bytes of a value of this type in a constant
    /// buffer.
    ///
    /// Vectors align to their element, not to a full register. Matrices with
    /// more than one stored row align to 16 bytes.
    pub fn buffer_packing_alignment(&self) -> u32 {
        let kind = self.scalar_kind();
        if self.is_matrix() && self.storage_rows().count > 1 {
            CONSTANT_REGISTER_SIZE
        } else {
            kind.alignment()
        }
    }

    /// Appends the shading-language spelling of this type to `out`, e.g.
    /// `float3` or `row_major float4x4`.
    pub fn append_to_code(&self, out: &mut String) {
        out.push_str(&self.to_string());
    }

    /// Describes the stored rows in canonical (row-major) orientation.
    pub(crate) fn storage_rows(&self) -> StorageRows {
        let (kind, count, width) = match self.repr {
            Repr::Scalar { kind } => (kind, 1, 1),
            Repr::Vector { kind, dimensions } => (kind, 1, u32::from(dimensions)),
            Repr::Matrix {
                kind,
                rows,
                columns,
                row_major,
            } => {
                let (rows, columns) = (u32::from(rows), u32::from(columns));
                if row_major && rows == 1 {
                    (kind, 1, columns)
                } else if !row_major && columns == 1 {
                    (kind, 1, rows)
                } else if row_major {
                    (kind, rows, columns)
                } else {
                    (kind, columns, rows)
                }
            }
        };

        let row_size = kind.size() * width;
        let stride = if count > 1 {
            let aligned = align_up(row_size, CONSTANT_REGISTER_SIZE);
            debug_assert!(aligned % CONSTANT_REGISTER_SIZE == 0 && aligned - row_size < 16);
            aligned
        } else {
            row_size
        };

        StorageRows {
            count,
            width,
            stride,
        }
    }

    /// Packs kind, extents and a variant marker into one word. Each variant
    /// uses a distinct marker in the low bits.
    fn type_code(&self) -> u32 {
        match self.repr {
            Repr::Scalar { kind } => ((kind as u32) << 24) | 0x1,
            Repr::Vector { kind, dimensions } => {
                ((kind as u32) << 24) | (u32::from(dimensions) << 16) | 0x2
            }
            Repr::Matrix {
                kind,
                rows,
                columns,
                row_major,
            } => {
                ((kind as u32) << 24)
                    | (u32::from(rows) << 16)
                    | (u32::from(columns) << 8)
                    | (u32::from(row_major) << 2)
                    | 0x3
            }
        }
    }
}

fn check_extent(what: &'static str, value: u32) -> Result<(), ShaderTypeError> {
    if extent_in_range(value) {
        Ok(())
    } else {
        Err(ShaderTypeError::DimensionOutOfRange { what, value })
    }
}

impl Hash for ShaderValueType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        "ShaderType".hash(state);
        self.type_code().hash(state);
    }
}

impl From<ScalarKind> for ShaderValueType {
    fn from(kind: ScalarKind) -> Self {
        Self::scalar(kind)
    }
}

impl fmt::Display for ShaderValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            Repr::Scalar { kind } => f.write_str(kind.keyword()),
            Repr::Vector { kind, dimensions } => write!(f, "{kind}{dimensions}"),
            Repr::Matrix {
                kind,
                rows,
                columns,
                row_major,
            } => {
                if row_major {
                    f.write_str("row_major ")?;
                }
                write!(f, "{kind}{rows}x{columns}")
            }
        }
    }
}

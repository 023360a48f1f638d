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

//! Parsing of shader type spellings such as `float3` or `row_major float4x4`.
//!
//! The accepted grammar is the one [`ShaderValueType::append_to_code`] emits,
//! plus an explicit `column_major` qualifier. Matrices without a qualifier are
//! column-major.

use super::shader_value_type::{ScalarKind, ShaderValueType};
use crate::renderer::error::ShaderTypeError;
use std::str::FromStr;

impl FromStr for ScalarKind {
    type Err = ShaderTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" => Ok(ScalarKind::Bool),
            "int" => Ok(ScalarKind::Int),
            "uint" => Ok(ScalarKind::UInt),
            "float" => Ok(ScalarKind::Float),
            "double" => Ok(ScalarKind::Double),
            "" => Err(ShaderTypeError::Empty),
            other => Err(ShaderTypeError::UnknownScalar(other.to_owned())),
        }
    }
}

impl FromStr for ShaderValueType {
    type Err = ShaderTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShaderTypeError::Empty);
        }

        let mut words = s.split_whitespace();
        let (row_major, body) = match (words.next(), words.next(), words.next()) {
            (Some("row_major"), Some(body), None) => (Some(true), body),
            (Some("column_major"), Some(body), None) => (Some(false), body),
            (Some(body), None, None) => (None, body),
            _ => return Err(ShaderTypeError::Malformed(s.to_owned())),
        };

        let split = body
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(body.len());
        let (keyword, shape) = body.split_at(split);
        let kind: ScalarKind = keyword.parse()?;

        let ty = if shape.is_empty() {
            ShaderValueType::scalar(kind)
        } else if let Some((rows, columns)) = shape.split_once('x') {
            let rows = parse_extent(rows, s)?;
            let columns = parse_extent(columns, s)?;
            return ShaderValueType::try_matrix(kind, rows, columns, row_major.unwrap_or(false));
        } else {
            ShaderValueType::try_vector(kind, parse_extent(shape, s)?)?
        };

        match row_major {
            Some(_) => Err(ShaderTypeError::OrientationOnNonMatrix(s.to_owned())),
            None => Ok(ty),
        }
    }
}

fn parse_extent(digits: &str, whole: &str) -> Result<u32, ShaderTypeError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ShaderTypeError::Malformed(whole.to_owned()));
    }
    digits
        .parse()
        .map_err(|_| ShaderTypeError::Malformed(whole.to_owned()))
}

impl TryFrom<String> for ShaderValueType {
    type Error = ShaderTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ShaderValueType> for String {
    fn from(value: ShaderValueType) -> Self {
        value.to_string()
    }
}

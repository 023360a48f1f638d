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

//! Constant-buffer layouts built from [`ShaderValueType`] packing rules, and
//! a CPU-side byte image that can be filled before upload.

use super::packing::{align_up, PackingRules, CONSTANT_REGISTER_SIZE};
use super::shader_value_type::ShaderValueType;
use crate::renderer::error::LayoutError;

/// A named parameter placed inside a constant buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantBufferField {
    /// The parameter name as it appears in shader source.
    pub name: String,
    /// The parameter type.
    pub ty: ShaderValueType,
    /// Byte offset from the start of the buffer.
    pub offset: u32,
    /// Packed size in bytes.
    pub size: u32,
}

/// The resolved memory layout of a constant buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantBufferLayout {
    name: String,
    fields: Vec<ConstantBufferField>,
    size: u32,
}

impl ConstantBufferLayout {
    /// Returns the buffer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the total size in bytes, always a whole number of registers.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns the fields in declaration order.
    pub fn fields(&self) -> &[ConstantBufferField] {
        &self.fields
    }

    /// Looks a field up by name.
    pub fn field(&self, name: &str) -> Option<&ConstantBufferField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the buffer has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Appends an HLSL `cbuffer` declaration with explicit `packoffset`
    /// annotations for every field.
    pub fn append_to_code(&self, out: &mut String) {
        out.push_str("cbuffer ");
        out.push_str(&self.name);
        out.push_str("\n{\n");
        for field in &self.fields {
            out.push_str("    ");
            field.ty.append_to_code(out);
            let register = field.offset / CONSTANT_REGISTER_SIZE;
            let component = match (field.offset % CONSTANT_REGISTER_SIZE) / 4 {
                1 => ".y",
                2 => ".z",
                3 => ".w",
                _ => "",
            };
            out.push_str(&format!(
                " {} : packoffset(c{register}{component});\n",
                field.name
            ));
        }
        out.push_str("};\n");
    }
}

/// Incrementally places fields into a [`ConstantBufferLayout`].
#[derive(Debug, Clone)]
pub struct ConstantBufferLayoutBuilder {
    name: String,
    rules: PackingRules,
    fields: Vec<ConstantBufferField>,
    cursor: u32,
}

impl ConstantBufferLayoutBuilder {
    /// Starts a layout using the default HLSL packing rules.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_rules(name, PackingRules::default())
    }

    /// Starts a layout using custom packing rules.
    pub fn with_rules(name: impl Into<String>, rules: PackingRules) -> Self {
        Self {
            name: name.into(),
            rules,
            fields: Vec::new(),
            cursor: 0,
        }
    }

    /// Appends a field after the previously pushed ones.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        ty: ShaderValueType,
    ) -> Result<&mut Self, LayoutError> {
        let name = name.into();
        if name.is_empty() {
            return Err(LayoutError::EmptyFieldName);
        }
        if self.fields.iter().any(|f| f.name == name) {
            return Err(LayoutError::DuplicateField(name));
        }

        let size = ty.buffer_packing_size();
        let offset = self
            .rules
            .place(self.cursor, size, ty.buffer_packing_alignment());
        log::trace!(
            "cbuffer '{}': placed '{}' ({}) at offset {} size {}",
            self.name,
            name,
            ty,
            offset,
            size
        );

        self.cursor = offset + size;
        self.fields.push(ConstantBufferField {
            name,
            ty,
            offset,
            size,
        });
        Ok(self)
    }

    /// Finishes the layout, padding it to a whole number of registers.
    pub fn build(self) -> ConstantBufferLayout {
        let size = align_up(self.cursor, CONSTANT_REGISTER_SIZE);
        log::debug!(
            "cbuffer '{}': {} field(s), {} bytes",
            self.name,
            self.fields.len(),
            size
        );
        ConstantBufferLayout {
            name: self.name,
            fields: self.fields,
            size,
        }
    }
}

/// A zero-initialised byte image of a constant buffer.
#[derive(Debug, Clone)]
pub struct ConstantBufferData<'a> {
    layout: &'a ConstantBufferLayout,
    bytes: Vec<u8>,
}

impl<'a> ConstantBufferData<'a> {
    /// Allocates an image sized for `layout`.
    pub fn new(layout: &'a ConstantBufferLayout) -> Self {
        Self {
            layout,
            bytes: vec![0; layout.size() as usize],
        }
    }

    /// Returns the layout this image follows.
    pub fn layout(&self) -> &'a ConstantBufferLayout {
        self.layout
    }

    /// Writes the scalars of field `name`.
    ///
    /// `values` lists every scalar of the field in storage order: vectors
    /// contiguously, row-major matrices row by row and column-major matrices
    /// column by column. Each stored matrix row is written to its own
    /// 16-byte-aligned slot; padding bytes are left untouched.
    pub fn set<T: bytemuck::Pod>(&mut self, name: &str, values: &[T]) -> Result<(), LayoutError> {
        let field = self
            .layout
            .field(name)
            .ok_or_else(|| LayoutError::UnknownField(name.to_owned()))?;

        let element_size = field.ty.scalar_kind().size() as usize;
        if std::mem::size_of::<T>() != element_size {
            return Err(LayoutError::ElementSizeMismatch {
                field: field.name.clone(),
                expected: element_size,
                actual: std::mem::size_of::<T>(),
            });
        }
        let expected = field.ty.element_count() as usize;
        if values.len() != expected {
            return Err(LayoutError::ElementCountMismatch {
                field: field.name.clone(),
                expected,
                actual: values.len(),
            });
        }

        let rows = field.ty.storage_rows();
        let width = rows.width as usize;
        for (i, row) in values.chunks_exact(width).enumerate() {
            let start = field.offset as usize + i * rows.stride as usize;
            let src: &[u8] = bytemuck::cast_slice(row);
            self.bytes[start..start + src.len()].copy_from_slice(src);
        }
        Ok(())
    }

    /// Returns the image bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the image and returns its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::effect::ScalarKind;

    // Byte images are not guaranteed to be 4-byte aligned, so decode by copy.
    fn words<T: bytemuck::Pod>(bytes: &[u8]) -> Vec<T> {
        bytes
            .chunks_exact(std::mem::size_of::<T>())
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    fn scene_layout() -> ConstantBufferLayout {
        let mut builder = ConstantBufferLayoutBuilder::new("SceneConstants");
        builder
            .push("World", ShaderValueType::matrix(ScalarKind::Float, 4, 4, true))
            .unwrap()
            .push("LightDir", ShaderValueType::FLOAT3)
            .unwrap()
            .push("Intensity", ShaderValueType::FLOAT)
            .unwrap()
            .push("UvScale", ShaderValueType::FLOAT2)
            .unwrap()
            .push("Mode", ShaderValueType::INT)
            .unwrap();
        builder.build()
    }

    #[test]
    fn fields_follow_hlsl_packing() {
        let layout = scene_layout();
        let offsets: Vec<(&str, u32)> = layout
            .fields()
            .iter()
            .map(|f| (f.name.as_str(), f.offset))
            .collect();
        assert_eq!(
            offsets,
            vec![
                ("World", 0),
                ("LightDir", 64),
                ("Intensity", 76),
                ("UvScale", 80),
                ("Mode", 88),
            ]
        );
        assert_eq!(layout.size(), 96);
        assert_eq!(layout.len(), 5);
    }

    #[test]
    fn straddling_vectors_move_to_the_next_register() {
        let mut builder = ConstantBufferLayoutBuilder::new("Cb");
        builder
            .push("a", ShaderValueType::FLOAT3)
            .unwrap()
            .push("b", ShaderValueType::FLOAT2)
            .unwrap();
        let layout = builder.build();
        assert_eq!(layout.field("b").unwrap().offset, 16);
        assert_eq!(layout.size(), 32);
    }

    #[test]
    fn straddling_is_allowed_when_disabled() {
        let rules = PackingRules {
            prevent_register_straddle: false,
        };
        let mut builder = ConstantBufferLayoutBuilder::with_rules("Cb", rules);
        builder
            .push("a", ShaderValueType::FLOAT3)
            .unwrap()
            .push("b", ShaderValueType::FLOAT2)
            .unwrap();
        let layout = builder.build();
        assert_eq!(layout.field("b").unwrap().offset, 12);
        assert_eq!(layout.size(), 32);
    }

    #[test]
    fn matrices_start_on_a_register() {
        let mut builder = ConstantBufferLayoutBuilder::new("Cb");
        builder
            .push("t", ShaderValueType::FLOAT)
            .unwrap()
            .push("m", ShaderValueType::matrix(ScalarKind::Float, 3, 3, false))
            .unwrap();
        let layout = builder.build();
        assert_eq!(layout.field("m").unwrap().offset, 16);
        assert_eq!(layout.field("m").unwrap().size, 48);
        assert_eq!(layout.size(), 64);
    }

    #[test]
    fn empty_layout_has_zero_size() {
        let layout = ConstantBufferLayoutBuilder::new("Empty").build();
        assert!(layout.is_empty());
        assert_eq!(layout.size(), 0);
    }

    #[test]
    fn rejects_bad_field_names() {
        let mut builder = ConstantBufferLayoutBuilder::new("Cb");
        builder.push("x", ShaderValueType::FLOAT).unwrap();
        assert_eq!(
            builder.push("x", ShaderValueType::FLOAT4).err(),
            Some(LayoutError::DuplicateField("x".into()))
        );
        assert_eq!(
            builder.push("", ShaderValueType::FLOAT4).err(),
            Some(LayoutError::EmptyFieldName)
        );
        assert_eq!(builder.build().len(), 1);
    }

    #[test]
    fn emits_cbuffer_declaration() {
        let mut code = String::new();
        scene_layout().append_to_code(&mut code);
        assert_eq!(
            code,
            "cbuffer SceneConstants\n\
             {\n\
             \x20   row_major float4x4 World : packoffset(c0);\n\
             \x20   float3 LightDir : packoffset(c4);\n\
             \x20   float Intensity : packoffset(c4.w);\n\
             \x20   float2 UvScale : packoffset(c5);\n\
             \x20   int Mode : packoffset(c5.z);\n\
             };\n"
        );
    }

    #[test]
    fn writes_matrix_rows_into_padded_slots() {
        let mut builder = ConstantBufferLayoutBuilder::new("Cb");
        builder
            .push("m", ShaderValueType::matrix(ScalarKind::Float, 2, 3, true))
            .unwrap();
        let layout = builder.build();
        assert_eq!(layout.size(), 32);

        let mut data = ConstantBufferData::new(&layout);
        data.set("m", &[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();

        let floats: Vec<f32> = words(data.as_bytes());
        assert_eq!(floats, vec![1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0]);
    }

    #[test]
    fn writes_vectors_contiguously() {
        let layout = scene_layout();
        let mut data = ConstantBufferData::new(&layout);
        data.set("LightDir", &[0.0f32, -1.0, 0.5]).unwrap();
        data.set("Intensity", &[2.0f32]).unwrap();
        data.set("Mode", &[7i32]).unwrap();

        let bytes = data.into_bytes();
        assert_eq!(words::<f32>(&bytes[64..80]), vec![0.0, -1.0, 0.5, 2.0]);
        assert_eq!(words::<i32>(&bytes[88..92]), vec![7]);
    }

    #[test]
    fn rejects_mismatched_writes() {
        let layout = scene_layout();
        let mut data = ConstantBufferData::new(&layout);

        assert_eq!(
            data.set("Missing", &[0.0f32]),
            Err(LayoutError::UnknownField("Missing".into()))
        );
        assert_eq!(
            data.set("UvScale", &[0.0f64, 1.0]),
            Err(LayoutError::ElementSizeMismatch {
                field: "UvScale".into(),
                expected: 4,
                actual: 8,
            })
        );
        assert_eq!(
            data.set("UvScale", &[0.0f32, 1.0, 2.0]),
            Err(LayoutError::ElementCountMismatch {
                field: "UvScale".into(),
                expected: 2,
                actual: 3,
            })
        );
        assert!(data.as_bytes().iter().all(|&b| b == 0));
    }
}

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

//! Constant-buffer packing rules and alignment helpers.

use serde::{Deserialize, Serialize};

/// Size in bytes of one constant-buffer register (`c0`, `c1`, ...).
pub const CONSTANT_REGISTER_SIZE: u32 = 16;

/// Rounds `value` up to the next multiple of `alignment`.
///
/// # Panics
///
/// Panics if `alignment` is not a non-zero power of two.
#[inline]
pub const fn align_up(value: u32, alignment: u32) -> u32 {
    assert!(
        alignment.is_power_of_two(),
        "alignment must be a non-zero power of two"
    );
    (value + alignment - 1) & !(alignment - 1)
}

/// Rules used when placing fields inside a constant buffer.
///
/// Registers are always [`CONSTANT_REGISTER_SIZE`] bytes wide. The defaults
/// describe HLSL constant buffers, where no field may straddle a register
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackingRules {
    /// If `true`, a field that would cross a register boundary is moved to
    /// the start of the next register.
    pub prevent_register_straddle: bool,
}

impl Default for PackingRules {
    fn default() -> Self {
        Self {
            prevent_register_straddle: true,
        }
    }
}

impl PackingRules {
    /// Returns the offset at which a field of `size` bytes and `alignment`
    /// lands when the previous field ended at `cursor`.
    pub(crate) fn place(&self, cursor: u32, size: u32, alignment: u32) -> u32 {
        let offset = align_up(cursor, alignment);
        if !self.prevent_register_straddle || size == 0 {
            return offset;
        }

        let first = offset / CONSTANT_REGISTER_SIZE;
        let last = (offset + size - 1) / CONSTANT_REGISTER_SIZE;
        if first != last {
            align_up(offset, CONSTANT_REGISTER_SIZE)
        } else {
            offset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_next_multiple() {
        assert_eq!(align_up(0, 16), 0);
        assert_eq!(align_up(1, 16), 16);
        assert_eq!(align_up(12, 16), 16);
        assert_eq!(align_up(16, 16), 16);
        assert_eq!(align_up(17, 16), 32);
        assert_eq!(align_up(6, 4), 8);
        assert_eq!(align_up(7, 1), 7);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn align_up_rejects_non_power_of_two() {
        align_up(5, 12);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn align_up_rejects_zero() {
        align_up(5, 0);
    }

    #[test]
    fn default_rules_are_hlsl() {
        assert!(PackingRules::default().prevent_register_straddle);
    }

    #[test]
    fn place_moves_straddling_fields() {
        let rules = PackingRules::default();
        // float2 after float3 would occupy bytes 12..20.
        assert_eq!(rules.place(12, 8, 4), 16);
        // float after float3 fits in the same register.
        assert_eq!(rules.place(12, 4, 4), 12);
        // A float4 at the start of a register stays there.
        assert_eq!(rules.place(32, 16, 4), 32);

        let loose = PackingRules {
            prevent_register_straddle: false,
        };
        assert_eq!(loose.place(12, 8, 4), 12);
    }

    #[test]
    fn rules_deserialize_with_defaults() {
        let rules: PackingRules = serde_json::from_str("{}").unwrap();
        assert_eq!(rules, PackingRules::default());

        let rules: PackingRules =
            serde_json::from_str(r#"{ "prevent_register_straddle": false }"#).unwrap();
        assert!(!rules.prevent_register_straddle);
    }

    #[test]
    fn unknown_config_keys_are_errors() {
        for json in [
            r#"{ "register_size": 32 }"#,
            r#"{ "register_size": 12 }"#,
            r#"{ "register_size": 0 }"#,
        ] {
            assert!(serde_json::from_str::<PackingRules>(json).is_err(), "{json}");
        }
    }
}

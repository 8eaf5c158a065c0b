// Copyright 2026 the Keyscope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deserialization of keymaps from host configuration.
//!
//! The accepted shape is the natural nested map:
//!
//! ```json
//! {
//!   "TESTING": { "OPEN": "enter", "CLOSE": "esc" },
//!   "EDITOR":  { "SAVE": ["ctrl+s", "cmd+s"] }
//! }
//! ```
//!
//! A combo spec is a single string or a sequence of strings. Declaration
//! order within a scope is preserved, so first-registered-wins resolution
//! matches the configuration text. The self-describing combo spec requires a
//! self-describing format (JSON, TOML, YAML, ...).
//!
//! A [`Keymap`] is validated as part of deserialization; malformed maps
//! (duplicate labels, empty names or combos) fail with a descriptive error.
//! Deserializing a bare [`ScopeSlice`] performs no validation.

use alloc::string::String;
use core::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use smallvec::SmallVec;

use crate::keymap::{Binding, Keymap, ScopeSlice};

/// A combo spec: one string or a sequence of strings.
struct Combos(SmallVec<[String; 2]>);

impl<'de> Deserialize<'de> for Combos {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ComboVisitor;

        impl<'de> Visitor<'de> for ComboVisitor {
            type Value = Combos;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a combo string or a sequence of combo strings")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Combos(smallvec::smallvec![v.into()]))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut combos = SmallVec::new();
                while let Some(combo) = seq.next_element::<String>()? {
                    combos.push(combo);
                }
                Ok(Combos(combos))
            }
        }

        deserializer.deserialize_any(ComboVisitor)
    }
}

impl<'de> Deserialize<'de> for ScopeSlice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SliceVisitor;

        impl<'de> Visitor<'de> for SliceVisitor {
            type Value = ScopeSlice;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from shortcut label to combo spec")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut slice = ScopeSlice::new();
                while let Some((label, Combos(combos))) = map.next_entry::<String, Combos>()? {
                    slice.push(Binding { label, combos });
                }
                Ok(slice)
            }
        }

        deserializer.deserialize_map(SliceVisitor)
    }
}

impl<'de> Deserialize<'de> for Keymap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeymapVisitor;

        impl<'de> Visitor<'de> for KeymapVisitor {
            type Value = Keymap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from scope name to shortcut slice")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut keymap = Keymap::new();
                while let Some((name, slice)) = map.next_entry::<String, ScopeSlice>()? {
                    keymap.insert_slice(name, slice);
                }
                keymap.validate().map_err(de::Error::custom)?;
                Ok(keymap)
            }
        }

        deserializer.deserialize_map(KeymapVisitor)
    }
}

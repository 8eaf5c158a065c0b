// Copyright 2026 the Keyscope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keymap types: bindings, per-scope slices, and the full map.

use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Errors produced while building or validating a keymap.
///
/// Validation failures reject the offending map as a whole; callers such as
/// [`KeymapStore::replace`](crate::KeymapStore::replace) retain the prior map.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KeymapError {
    /// A scope was declared with an empty name.
    #[error("keymap contains a scope with an empty name")]
    EmptyScopeName,
    /// A binding inside `scope` has an empty label.
    #[error("scope '{scope}' contains a binding with an empty label")]
    EmptyLabel {
        /// Name of the scope containing the offending binding.
        scope: String,
    },
    /// `label` in `scope` declared no combos at all.
    #[error("label '{label}' in scope '{scope}' declares no combos")]
    NoCombos {
        /// Name of the scope containing the offending binding.
        scope: String,
        /// The label without combos.
        label: String,
    },
    /// `label` in `scope` declared an empty combo string.
    #[error("label '{label}' in scope '{scope}' declares an empty combo")]
    EmptyCombo {
        /// Name of the scope containing the offending binding.
        scope: String,
        /// The label with the empty combo.
        label: String,
    },
    /// `label` was declared more than once within `scope`.
    #[error("duplicate label '{label}' in scope '{scope}'")]
    DuplicateLabel {
        /// Name of the scope containing the duplicate.
        scope: String,
        /// The duplicated label.
        label: String,
    },
}

/// One shortcut: an application-level label and its combo spec.
///
/// The combo spec is a single combo string or an ordered set of alternatives
/// (for example `["enter", "space"]`). Combo strings are opaque to this crate
/// and interpreted by the host's key-combo matcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    /// Application-defined action name, e.g. `"OPEN"`.
    pub label: String,
    /// Key combos that resolve to this label, in declaration order.
    pub combos: SmallVec<[String; 2]>,
}

/// The shortcuts of a single scope, in declaration order.
///
/// Labels are unique within a slice. Combos may repeat across labels; lookups
/// via [`ScopeSlice::label_for`] resolve to the first declared match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeSlice {
    bindings: Vec<Binding>,
}

impl ScopeSlice {
    /// Create an empty slice.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    /// Resolve a combo to its label.
    ///
    /// When the combo is mapped by more than one binding, the first declared
    /// binding wins.
    pub fn label_for(&self, combo: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.combos.iter().any(|c| c == combo))
            .map(|b| b.label.as_str())
    }

    /// Return the combos declared for `label`, if present.
    pub fn combos_for(&self, label: &str) -> Option<&[String]> {
        self.bindings
            .iter()
            .find(|b| b.label == label)
            .map(|b| b.combos.as_slice())
    }

    /// Iterate over the bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    /// Iterate over every combo in the slice, in declaration order.
    ///
    /// A combo shared by several labels appears once per declaration; callers
    /// registering listeners should deduplicate.
    pub fn combos(&self) -> impl Iterator<Item = &str> {
        self.bindings
            .iter()
            .flat_map(|b| b.combos.iter().map(String::as_str))
    }

    /// Number of bindings in the slice.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the slice has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn validate(&self, scope: &str) -> Result<(), KeymapError> {
        for (i, binding) in self.bindings.iter().enumerate() {
            if binding.label.is_empty() {
                return Err(KeymapError::EmptyLabel {
                    scope: scope.into(),
                });
            }
            if binding.combos.is_empty() {
                return Err(KeymapError::NoCombos {
                    scope: scope.into(),
                    label: binding.label.clone(),
                });
            }
            if binding.combos.iter().any(String::is_empty) {
                return Err(KeymapError::EmptyCombo {
                    scope: scope.into(),
                    label: binding.label.clone(),
                });
            }
            if self.bindings[..i].iter().any(|b| b.label == binding.label) {
                return Err(KeymapError::DuplicateLabel {
                    scope: scope.into(),
                    label: binding.label.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Mapping from scope name to that scope's shortcut slice.
///
/// Scope names are unique. The map is replaced wholesale (no merge updates);
/// see [`KeymapStore`](crate::KeymapStore) for the owning, validated handle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Keymap {
    scopes: HashMap<String, ScopeSlice>,
}

impl Keymap {
    /// Create an empty keymap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a shortcut: `label` resolves from any of `combos` within `scope`.
    ///
    /// Creates the scope on first use. Validates eagerly so the error names
    /// the offending scope and label.
    pub fn bind<I, S>(&mut self, scope: &str, label: &str, combos: I) -> Result<(), KeymapError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if scope.is_empty() {
            return Err(KeymapError::EmptyScopeName);
        }
        if label.is_empty() {
            return Err(KeymapError::EmptyLabel {
                scope: scope.into(),
            });
        }
        let combos: SmallVec<[String; 2]> = combos.into_iter().map(Into::into).collect();
        if combos.is_empty() {
            return Err(KeymapError::NoCombos {
                scope: scope.into(),
                label: label.into(),
            });
        }
        if combos.iter().any(String::is_empty) {
            return Err(KeymapError::EmptyCombo {
                scope: scope.into(),
                label: label.into(),
            });
        }
        let slice = self.scopes.entry_ref(scope).or_default();
        if slice.combos_for(label).is_some() {
            return Err(KeymapError::DuplicateLabel {
                scope: scope.into(),
                label: label.into(),
            });
        }
        slice.push(Binding {
            label: label.into(),
            combos,
        });
        Ok(())
    }

    /// Look up the slice for a scope name.
    pub fn scope(&self, name: &str) -> Option<&ScopeSlice> {
        self.scopes.get(name)
    }

    /// Iterate over `(scope name, slice)` pairs in unspecified order.
    pub fn scopes(&self) -> impl Iterator<Item = (&str, &ScopeSlice)> {
        self.scopes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of scopes in the map.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Whether the map has no scopes.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Push a binding without validation; lets tests and sibling-module tests
    /// construct malformed maps the way a buggy deserializer could.
    #[cfg(test)]
    pub(crate) fn force_push(&mut self, scope: &str, binding: Binding) {
        self.scopes.entry_ref(scope).or_default().push(binding);
    }

    /// Insert a fully built slice under `name`, replacing any previous slice.
    /// Used by deserialization; callers validate afterwards.
    #[cfg(feature = "serde")]
    pub(crate) fn insert_slice(&mut self, name: String, slice: ScopeSlice) {
        self.scopes.insert(name, slice);
    }

    /// Check the whole map for malformed entries.
    ///
    /// Maps built through [`Keymap::bind`] are always valid; this exists for
    /// maps assembled elsewhere (for example deserialized from configuration).
    pub fn validate(&self) -> Result<(), KeymapError> {
        for (name, slice) in &self.scopes {
            if name.is_empty() {
                return Err(KeymapError::EmptyScopeName);
            }
            slice.validate(name)?;
        }
        Ok(())
    }
}

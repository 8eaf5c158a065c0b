// Copyright 2026 the Keyscope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The owning handle for an application's active keymap.

use crate::keymap::{Keymap, KeymapError, ScopeSlice};

/// Owns the active [`Keymap`] for the lifetime of an application.
///
/// The store is created once at startup and replaced wholesale via
/// [`KeymapStore::replace`]; there is no merge or partial update. Every
/// replacement is validated first: a malformed map is rejected and the prior
/// map is retained untouched.
///
/// Reads always see the current map, so label resolution is dynamic rather
/// than snapshot-at-bind-time. The `revision` counter increments on every
/// successful replacement; callers that cache derived state can compare
/// revisions to detect staleness.
///
/// The store assumes a single-threaded host (the UI thread). A multi-threaded
/// host must guard the store and the active-scope registry with one mutex so
/// a mount or unmount cannot interleave with a keymap swap.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeymapStore {
    keymap: Keymap,
    revision: u64,
}

impl KeymapStore {
    /// Create a store from an initial keymap, validating it.
    pub fn new(keymap: Keymap) -> Result<Self, KeymapError> {
        keymap.validate()?;
        Ok(Self {
            keymap,
            revision: 1,
        })
    }

    /// Replace the whole keymap atomically.
    ///
    /// On validation failure the prior keymap stays in place and the revision
    /// does not change.
    pub fn replace(&mut self, next: Keymap) -> Result<(), KeymapError> {
        next.validate()?;
        self.keymap = next;
        self.revision += 1;
        Ok(())
    }

    /// Look up the slice for a scope name in the current keymap.
    pub fn scope(&self, name: &str) -> Option<&ScopeSlice> {
        self.keymap.scope(name)
    }

    /// The current keymap.
    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Revision counter; increments on every successful [`KeymapStore::replace`].
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::Binding;

    fn sample() -> Keymap {
        let mut km = Keymap::new();
        km.bind("TESTING", "OPEN", ["enter"]).unwrap();
        km
    }

    #[test]
    fn replace_swaps_the_whole_map() {
        let mut store = KeymapStore::new(sample()).unwrap();
        assert_eq!(store.revision(), 1);

        let mut next = Keymap::new();
        next.bind("TESTING", "SPACE", ["space"]).unwrap();
        store.replace(next).unwrap();

        let slice = store.scope("TESTING").unwrap();
        assert_eq!(slice.label_for("space"), Some("SPACE"));
        // No merge: the old binding is gone.
        assert_eq!(slice.label_for("enter"), None);
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn invalid_replacement_retains_prior_map() {
        let mut store = KeymapStore::new(sample()).unwrap();

        let mut malformed = Keymap::new();
        malformed.bind("S", "OPEN", ["enter"]).unwrap();
        // Duplicate label inserted through the crate-internal slice access.
        malformed.force_push(
            "S",
            Binding {
                label: "OPEN".into(),
                combos: smallvec::smallvec!["space".into()],
            },
        );

        let err = store.replace(malformed).unwrap_err();
        assert!(matches!(err, KeymapError::DuplicateLabel { .. }));
        // Prior map and revision untouched.
        assert_eq!(store.scope("TESTING").unwrap().label_for("enter"), Some("OPEN"));
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn new_rejects_malformed_maps() {
        let mut malformed = Keymap::new();
        malformed.bind("S", "OPEN", ["enter"]).unwrap();
        malformed.force_push(
            "S",
            Binding {
                label: "OPEN".into(),
                combos: smallvec::smallvec!["space".into()],
            },
        );
        assert!(KeymapStore::new(malformed).is_err());
    }

    #[test]
    fn default_store_is_empty() {
        let store = KeymapStore::default();
        assert!(store.scope("TESTING").is_none());
        assert_eq!(store.revision(), 0);
    }
}

// Copyright 2026 the Keyscope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyscope Keymap: the data model for scoped keyboard shortcuts.
//!
//! ## Overview
//!
//! A [`Keymap`] maps *scope names* to [`ScopeSlice`]s, and a slice maps
//! application-level *shortcut labels* (for example `"OPEN"`) to one or more
//! *key combos* (for example `"enter"` or `"ctrl+s"`). The crate does not
//! interpret combo strings; matching a pressed key against a combo is the
//! host's key-combo matcher's job. This crate only answers "which label does
//! this combo resolve to within this scope?" and keeps that answer
//! deterministic.
//!
//! A [`KeymapStore`] owns the active keymap for the lifetime of an
//! application. Replacing it is a wholesale, validated swap: a malformed
//! keymap is rejected and the prior keymap is retained untouched.
//!
//! ## Ordering
//!
//! Bindings within a scope keep their declaration order. When two labels in
//! the same scope share a combo, [`ScopeSlice::label_for`] resolves to the
//! **first declared** label, matching listener-based matchers where the
//! earliest registration wins.
//!
//! ## Example
//!
//! ```
//! use keyscope_keymap::{Keymap, KeymapStore};
//!
//! let mut keymap = Keymap::new();
//! keymap.bind("TESTING", "OPEN", ["enter"]).unwrap();
//! keymap.bind("TESTING", "CLOSE", ["esc"]).unwrap();
//!
//! let store = KeymapStore::new(keymap).unwrap();
//! let slice = store.scope("TESTING").unwrap();
//! assert_eq!(slice.label_for("enter"), Some("OPEN"));
//! assert_eq!(slice.label_for("space"), None);
//! ```
//!
//! ## Features
//!
//! - `serde`: deserialize keymaps from host configuration in the natural
//!   nested-map shape (`{"SCOPE": {"LABEL": "combo" | ["combo", ...]}}`),
//!   preserving declaration order within each scope.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod keymap;
mod store;

#[cfg(feature = "serde")]
mod de;

pub use keymap::{Binding, Keymap, KeymapError, ScopeSlice};
pub use store::KeymapStore;

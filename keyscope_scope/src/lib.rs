// Copyright 2026 the Keyscope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyscope Scope: a deterministic, `no_std` scope tree for keyboard shortcuts.
//!
//! ## Overview
//!
//! This crate turns physical key events into ordered handler invocations. It
//! does not match key chords itself. Instead, a host-side matcher (a
//! Mousetrap-equivalent, via the [`ComboRegistrar`] trait) reports each
//! physical event exactly once, and the [`ScopeTree`] resolves which scopes
//! fire, with which labels, in which order.
//!
//! ## Scopes
//!
//! A scope names one slice of the active keymap and attaches it to a node in
//! the host's UI tree. Scopes nest: [`ScopeTree::mount`] takes an optional
//! parent, mirroring the host's component hierarchy. Per-scope behavior is
//! configured at mount time through [`ScopeConfig`]: the event phase, whether
//! a match stops bubbling (on by default), whether it asks the host to
//! suppress the default action, whether the scope is global, an optional
//! target selector, and a tab-index pass-through.
//!
//! ## Routing
//!
//! [`ScopeTree::route`] resolves one event in two passes. The bubbling pass
//! walks from the target scope toward the root; scopes that do not match (no
//! keymap slice, unmapped combo, wrong phase) are skipped without
//! interrupting the walk, and a match with stop-propagation ends it. The
//! global pass then fires every matching global scope in mount order,
//! independent of how bubbling ended. A scope fires at most once per event.
//! The result is a fully ordered, duplicate-free sequence of
//! [`RouteEntry`](types::RouteEntry) values.
//!
//! ## Dispatch
//!
//! [`ScopeTree::dispatch`] routes and then invokes the handlers stored at
//! mount time, returning a [`DispatchReport`](types::DispatchReport) that
//! tells the host whether to suppress the platform default action. Hosts
//! that keep handlers outside the tree can route first and execute the
//! sequence through [`dispatcher::run`], which isolates handler failures.
//!
//! ## Keymap changes
//!
//! [`ScopeTree::set_keymap`] validates the new map, swaps it wholesale, and
//! synchronously rebuilds every live scope's registrations, so the next event
//! is matched against the new map with no remount and no stale listener. An
//! invalid map is rejected and the prior one stays active.
//!
//! ```
//! use keyscope_binder::{ComboRegistrar, EventPhase, TargetResolver};
//! use keyscope_keymap::{Keymap, KeymapStore};
//! use keyscope_scope::{ScopeConfig, ScopeTree};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! // A minimal host: nodes are integers and registrations are ignored.
//! struct Host;
//!
//! impl ComboRegistrar for Host {
//!     type Node = u32;
//!     fn bind(&mut self, _: &u32, _: EventPhase, _: &str) {}
//!     fn unbind(&mut self, _: &u32, _: EventPhase, _: &str) {}
//!     fn bind_app(&mut self, _: EventPhase, _: &str) {}
//!     fn unbind_app(&mut self, _: EventPhase, _: &str) {}
//! }
//!
//! impl TargetResolver for Host {
//!     type Node = u32;
//!     fn resolve(&self, _: &str) -> Option<u32> { None }
//! }
//!
//! let mut keymap = Keymap::new();
//! keymap.bind("TESTING", "OPEN", ["enter"])?;
//! let mut tree = ScopeTree::new(KeymapStore::new(keymap)?);
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! let mut host = Host;
//! let scope = tree.mount(
//!     None,
//!     1_u32,
//!     ScopeConfig::new("TESTING"),
//!     move |label| sink.borrow_mut().push(label.to_string()),
//!     &Host,
//!     &mut host,
//! )?;
//!
//! let report = tree.dispatch(Some(scope), "enter", EventPhase::KeyDown);
//! assert_eq!(report.invoked.len(), 1);
//! assert_eq!(seen.borrow().as_slice(), ["OPEN"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod dispatcher;
pub mod types;

mod route;
mod tree;

pub use keyscope_binder::{ComboBinder, ComboRegistrar, EventPhase, TargetResolver};
pub use keyscope_keymap::{Keymap, KeymapError, KeymapStore};

pub use tree::ScopeTree;
pub use types::{
    DispatchReport, MountError, Origin, RouteEntry, ScopeConfig, ScopeFlags, ScopeId,
};

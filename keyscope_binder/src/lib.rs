// Copyright 2026 the Keyscope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyscope Binder: combo binding lifecycle against a host key-combo matcher.
//!
//! ## Overview
//!
//! This crate sits between a scope's keymap slice and the host's low-level
//! key-combo matcher (a Mousetrap-equivalent). It does not match keys itself.
//! Instead, the host implements [`ComboRegistrar`], and a per-scope
//! [`ComboBinder`] keeps the matcher's registrations in sync with the scope's
//! current slice: bind on mount, unbind on unmount, unbind-then-bind whenever
//! the keymap changes so a stale registration can never double-fire.
//!
//! ## Collaborators
//!
//! - [`ComboRegistrar`]: attach/detach a combo listener on a node (or
//!   application-wide for global scopes) at a given [`EventPhase`].
//!   Registrations are keyed by combo string, Mousetrap-style.
//! - [`TargetResolver`]: resolve a selector string to a host node, used by
//!   scopes that listen on an alternate node instead of their own root.
//!
//! ## Event reporting contract
//!
//! The host reports each physical key event to the routing layer **exactly
//! once**: against the deepest scope whose bound node lies on the event path,
//! or against no scope when only an application-wide registration matched.
//! Propagation to ancestors and to global scopes is computed by the routing
//! layer, never by firing multiple registrations for one physical event.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::string::String;

use keyscope_keymap::ScopeSlice;
use smallvec::SmallVec;

/// The key-event phase a scope listens on.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EventPhase {
    /// Key pressed down (the default).
    #[default]
    KeyDown,
    /// Key released.
    KeyUp,
    /// Character produced (legacy hosts).
    KeyPress,
}

/// Host-side combo matcher: attaches and detaches combo listeners.
///
/// Registrations are identified by `(node, phase, combo)`: unbinding takes
/// the same combo string that was bound, as Mousetrap-style matchers do.
/// Application-wide registrations (`bind_app`) listen independently of focus
/// and carry no node.
///
/// Implementations must tolerate `unbind` for a registration that no longer
/// exists (idempotent detach) and must deliver a matched combo **at most once
/// per physical key event per registration**.
pub trait ComboRegistrar {
    /// Host node handle listeners are attached to (for example a DOM node).
    type Node;

    /// Attach a listener for `combo` on `node` at `phase`.
    fn bind(&mut self, node: &Self::Node, phase: EventPhase, combo: &str);

    /// Detach the listener for `combo` on `node` at `phase`.
    fn unbind(&mut self, node: &Self::Node, phase: EventPhase, combo: &str);

    /// Attach an application-wide listener for `combo` at `phase`,
    /// independent of focus. Used by global scopes.
    fn bind_app(&mut self, phase: EventPhase, combo: &str);

    /// Detach the application-wide listener for `combo` at `phase`.
    fn unbind_app(&mut self, phase: EventPhase, combo: &str);
}

/// Host-side selector lookup (a CSS-selector equivalent).
pub trait TargetResolver {
    /// Host node handle produced by a successful lookup.
    type Node;

    /// Resolve `selector` to a node, or `None` when nothing matches.
    fn resolve(&self, selector: &str) -> Option<Self::Node>;
}

/// Per-scope binding lifecycle adapter.
///
/// Tracks which combos are currently registered for one scope so they can be
/// detached exactly once, and rebuilt without leaking the previous
/// registrations when the keymap changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComboBinder {
    phase: EventPhase,
    node_combos: SmallVec<[String; 4]>,
    app_combos: SmallVec<[String; 4]>,
}

impl ComboBinder {
    /// Create a binder listening at `phase`.
    pub fn new(phase: EventPhase) -> Self {
        Self {
            phase,
            node_combos: SmallVec::new(),
            app_combos: SmallVec::new(),
        }
    }

    /// The phase this binder registers at.
    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    /// Whether any registration is currently held.
    pub fn is_bound(&self) -> bool {
        !self.node_combos.is_empty() || !self.app_combos.is_empty()
    }

    /// Replace all registrations with those derived from `slice`.
    ///
    /// Detaches everything first, so a keymap change can never leave a stale
    /// listener behind. `slice` is `None` when the scope's name is absent
    /// from the active keymap; the scope then holds no registrations until a
    /// later keymap introduces it. With `app_wide` set (global scopes), each
    /// combo is additionally registered application-wide.
    pub fn rebind<R>(
        &mut self,
        registrar: &mut R,
        node: &R::Node,
        slice: Option<&ScopeSlice>,
        app_wide: bool,
    ) where
        R: ComboRegistrar,
    {
        self.unbind_all(registrar, node);
        let Some(slice) = slice else {
            return;
        };
        for combo in slice.combos() {
            // A combo shared by several labels registers once; resolution
            // picks the first declared label.
            if self.node_combos.iter().any(|c| c == combo) {
                continue;
            }
            registrar.bind(node, self.phase, combo);
            self.node_combos.push(combo.into());
            if app_wide {
                registrar.bind_app(self.phase, combo);
                self.app_combos.push(combo.into());
            }
        }
    }

    /// Detach every registration held by this binder, exactly once.
    ///
    /// Idempotent: a second call is a no-op because the recorded combo lists
    /// are drained on the first.
    pub fn unbind_all<R>(&mut self, registrar: &mut R, node: &R::Node)
    where
        R: ComboRegistrar,
    {
        for combo in self.node_combos.drain(..) {
            registrar.unbind(node, self.phase, &combo);
        }
        for combo in self.app_combos.drain(..) {
            registrar.unbind_app(self.phase, &combo);
        }
    }
}

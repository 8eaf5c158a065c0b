// Copyright 2026 the Keyscope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scope tree: identifiers, flags, configuration, and
//! dispatch entries.

use alloc::string::String;
use alloc::vec::Vec;

use keyscope_binder::EventPhase;

/// Identifier for a mounted scope (generational).
///
/// Stale identifiers, ones whose scope has been unmounted, are inert:
/// routing yields nothing for them and accessors return `None`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ScopeId(pub(crate) u32, pub(crate) u32);

impl ScopeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// Per-scope behavior flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ScopeFlags: u8 {
        /// A matched combo does not continue bubbling to ancestor scopes.
        const STOP_PROPAGATION = 0b0000_0001;
        /// The host should suppress the browser/platform default action for
        /// a matched combo.
        const PREVENT_DEFAULT  = 0b0000_0010;
        /// The scope also fires for matching events anywhere in the
        /// application, independent of focus.
        const GLOBAL           = 0b0000_0100;
    }
}

impl Default for ScopeFlags {
    fn default() -> Self {
        Self::STOP_PROPAGATION
    }
}

/// Configuration for mounting one scope.
///
/// Defaults mirror the host-facing option surface: `stop_propagation` on,
/// `prevent_default` off, not global, listening on key-down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeConfig {
    /// Scope name; selects this scope's slice of the keymap. A name absent
    /// from the active keymap mounts fine and simply never matches.
    pub name: String,
    /// Key-event phase the scope listens on.
    pub phase: EventPhase,
    /// Stop bubbling to ancestor scopes after a match (default `true`).
    pub stop_propagation: bool,
    /// Ask the host to suppress the default action on a match (default `false`).
    pub prevent_default: bool,
    /// Also fire for matching events anywhere in the application (default `false`).
    pub global: bool,
    /// Listen on the node this selector resolves to instead of the scope's
    /// own root. Resolution failure is a mount-time error.
    pub target_selector: Option<String>,
    /// Tab-index pass-through for hosts that manage focusability.
    pub tab_index: Option<i32>,
}

impl ScopeConfig {
    /// Configuration with the given scope name and default behavior.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phase: EventPhase::default(),
            stop_propagation: true,
            prevent_default: false,
            global: false,
            target_selector: None,
            tab_index: None,
        }
    }

    pub(crate) fn flags(&self) -> ScopeFlags {
        let mut flags = ScopeFlags::empty();
        if self.stop_propagation {
            flags |= ScopeFlags::STOP_PROPAGATION;
        }
        if self.prevent_default {
            flags |= ScopeFlags::PREVENT_DEFAULT;
        }
        if self.global {
            flags |= ScopeFlags::GLOBAL;
        }
        flags
    }
}

/// Errors raised while mounting a scope.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MountError {
    /// The configured target selector resolved to no node. The scope is not
    /// created and no listener is bound; sibling scopes are unaffected.
    #[error("node selector '{selector}' was not found")]
    TargetNotFound {
        /// The selector that failed to resolve.
        selector: String,
    },
}

/// How an entry joined a routed sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    /// The scope owning the node the event was reported against.
    Target,
    /// An ancestor reached by bubbling from the target.
    Bubble,
    /// A global scope reached through the application-wide registry.
    Global,
}

/// One step of a routed sequence: which scope fires, with which label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteEntry {
    /// The scope to invoke.
    pub scope: ScopeId,
    /// The label the combo resolved to within that scope's slice.
    pub label: String,
    /// How this scope joined the sequence.
    pub origin: Origin,
    /// Whether this scope asks the host to suppress the default action.
    pub prevent_default: bool,
}

/// Result of dispatching one physical key event through stored handlers.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// The entries that fired, in invocation order.
    pub invoked: Vec<RouteEntry>,
    /// True when any invoked scope carries
    /// [`PREVENT_DEFAULT`](ScopeFlags::PREVENT_DEFAULT); the host should
    /// suppress the platform default action for the event.
    pub default_prevented: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_the_documented_surface() {
        let config = ScopeConfig::new("TESTING");
        assert_eq!(config.phase, EventPhase::KeyDown);
        assert!(config.stop_propagation);
        assert!(!config.prevent_default);
        assert!(!config.global);
        assert!(config.target_selector.is_none());
        assert!(config.tab_index.is_none());
        assert_eq!(config.flags(), ScopeFlags::STOP_PROPAGATION);
    }

    #[test]
    fn flags_reflect_every_toggle() {
        let mut config = ScopeConfig::new("TESTING");
        config.stop_propagation = false;
        config.prevent_default = true;
        config.global = true;
        assert_eq!(
            config.flags(),
            ScopeFlags::PREVENT_DEFAULT | ScopeFlags::GLOBAL
        );
    }

    #[test]
    fn mount_error_names_the_selector() {
        let err = MountError::TargetNotFound {
            selector: "non-existing".into(),
        };
        assert!(alloc::string::ToString::to_string(&err).contains("non-existing"));
    }
}

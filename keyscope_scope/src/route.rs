// Copyright 2026 the Keyscope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic resolution of one physical key event into an ordered
//! sequence of scope invocations.

use alloc::string::String;
use alloc::vec::Vec;

use keyscope_binder::EventPhase;
use smallvec::SmallVec;

use crate::tree::ScopeTree;
use crate::types::{DispatchReport, Origin, RouteEntry, ScopeFlags, ScopeId};

/// Scopes already committed to fire for the current event.
///
/// Events touch a handful of scopes, so a linear scan over a small inline
/// buffer beats hashing here.
#[derive(Default)]
struct InvokedSet(SmallVec<[ScopeId; 8]>);

impl InvokedSet {
    fn insert(&mut self, id: ScopeId) {
        self.0.push(id);
    }

    fn contains(&self, id: ScopeId) -> bool {
        self.0.iter().any(|i| *i == id)
    }
}

impl<N> ScopeTree<N> {
    /// Resolve one physical key event into the ordered invocation sequence.
    ///
    /// `target` is the deepest scope whose node lies on the event path, or
    /// `None` when only an application-wide registration matched. Two passes
    /// run in order:
    ///
    /// 1. **Bubbling**: from the target toward the root. A scope matches when
    ///    its phase equals `phase` and its keymap slice maps `combo` to a
    ///    label; non-matching scopes are skipped without interrupting the
    ///    walk. A match with [`STOP_PROPAGATION`](ScopeFlags::STOP_PROPAGATION)
    ///    (the default) ends the walk after that scope.
    /// 2. **Global**: every matching global scope fires, in mount order,
    ///    regardless of how the bubbling pass ended. A scope fires at most
    ///    once per event, so globals already reached by bubbling are skipped.
    ///
    /// The result is fully ordered and duplicate-free. Routing mutates
    /// nothing; [`ScopeTree::dispatch`] layers handler invocation on top.
    pub fn route(&self, target: Option<ScopeId>, combo: &str, phase: EventPhase) -> Vec<RouteEntry> {
        let mut entries = Vec::new();
        let mut invoked = InvokedSet::default();

        let mut cursor = target;
        let mut origin = Origin::Target;
        while let Some(id) = cursor {
            let Some(scope) = self.get(id) else {
                break;
            };
            let next = scope.parent;
            if scope.binder.phase() == phase
                && let Some(label) = self.label_for(&scope.name, combo)
            {
                entries.push(RouteEntry {
                    scope: id,
                    label,
                    origin,
                    prevent_default: scope.flags.contains(ScopeFlags::PREVENT_DEFAULT),
                });
                invoked.insert(id);
                if scope.flags.contains(ScopeFlags::STOP_PROPAGATION) {
                    break;
                }
            }
            origin = Origin::Bubble;
            cursor = next;
        }

        for &id in self.globals() {
            if invoked.contains(id) {
                continue;
            }
            let Some(scope) = self.get(id) else {
                continue;
            };
            if scope.binder.phase() != phase {
                continue;
            }
            let Some(label) = self.label_for(&scope.name, combo) else {
                continue;
            };
            entries.push(RouteEntry {
                scope: id,
                label,
                origin: Origin::Global,
                prevent_default: scope.flags.contains(ScopeFlags::PREVENT_DEFAULT),
            });
        }

        entries
    }

    /// Route one physical key event and invoke the stored handlers in order.
    ///
    /// Each fired scope's handler receives the resolved label. The report
    /// carries the full sequence plus whether any fired scope requested
    /// default-action suppression, which the host applies to the platform
    /// event.
    pub fn dispatch(
        &mut self,
        target: Option<ScopeId>,
        combo: &str,
        phase: EventPhase,
    ) -> DispatchReport {
        let invoked = self.route(target, combo, phase);
        let mut default_prevented = false;
        for entry in &invoked {
            default_prevented |= entry.prevent_default;
            if let Some(scope) = self.get_mut(entry.scope) {
                (scope.handler)(&entry.label);
            }
        }
        DispatchReport {
            invoked,
            default_prevented,
        }
    }

    fn label_for(&self, scope_name: &str, combo: &str) -> Option<String> {
        self.store()
            .scope(scope_name)
            .and_then(|slice| slice.label_for(combo))
            .map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::RefCell;
    use keyscope_binder::{ComboRegistrar, TargetResolver};
    use keyscope_keymap::Keymap;

    use crate::types::ScopeConfig;

    /// Registrar/resolver that ignores everything; routing is computed from
    /// tree state, not from host registrations.
    struct Noop;

    impl ComboRegistrar for Noop {
        type Node = u32;

        fn bind(&mut self, _: &u32, _: EventPhase, _: &str) {}
        fn unbind(&mut self, _: &u32, _: EventPhase, _: &str) {}
        fn bind_app(&mut self, _: EventPhase, _: &str) {}
        fn unbind_app(&mut self, _: EventPhase, _: &str) {}
    }

    impl TargetResolver for Noop {
        type Node = u32;

        fn resolve(&self, _: &str) -> Option<u32> {
            None
        }
    }

    type Log = Rc<RefCell<Vec<String>>>;

    fn keymap() -> Keymap {
        let mut km = Keymap::new();
        km.bind("TESTING", "OPEN", ["enter"]).unwrap();
        km.bind("TESTING", "CLOSE", ["esc"]).unwrap();
        km.bind("OTHER", "SUBMIT", ["enter"]).unwrap();
        km
    }

    fn tree() -> ScopeTree<u32> {
        ScopeTree::with_keymap(keymap()).unwrap()
    }

    fn mount(
        tree: &mut ScopeTree<u32>,
        parent: Option<ScopeId>,
        node: u32,
        config: ScopeConfig,
        log: &Log,
    ) -> ScopeId {
        let name = config.name.clone();
        let sink = Rc::clone(log);
        tree.mount(
            parent,
            node,
            config,
            move |label| sink.borrow_mut().push(alloc::format!("{name}:{label}")),
            &Noop,
            &mut Noop,
        )
        .unwrap()
    }

    fn labels(entries: &[RouteEntry]) -> Vec<String> {
        entries.iter().map(|e| e.label.clone()).collect()
    }

    #[test]
    fn target_scope_resolves_its_label() {
        let mut tree = tree();
        let log = Log::default();
        let id = mount(&mut tree, None, 1, ScopeConfig::new("TESTING"), &log);

        let entries = tree.route(Some(id), "enter", EventPhase::KeyDown);
        assert_eq!(labels(&entries), ["OPEN"]);
        assert_eq!(entries[0].origin, Origin::Target);

        // An unmapped combo routes nowhere.
        assert!(tree.route(Some(id), "x", EventPhase::KeyDown).is_empty());
    }

    #[test]
    fn default_stop_propagation_fires_only_the_deepest_match() {
        let mut tree = tree();
        let log = Log::default();
        let parent = mount(&mut tree, None, 1, ScopeConfig::new("TESTING"), &log);
        let child = mount(&mut tree, Some(parent), 2, ScopeConfig::new("TESTING"), &log);

        tree.dispatch(Some(child), "enter", EventPhase::KeyDown);
        assert_eq!(log.borrow().as_slice(), ["TESTING:OPEN"]);
    }

    #[test]
    fn bubbling_continues_when_stop_propagation_is_off() {
        let mut tree = tree();
        let log = Log::default();
        let parent = mount(&mut tree, None, 1, ScopeConfig::new("TESTING"), &log);
        let mut config = ScopeConfig::new("TESTING");
        config.stop_propagation = false;
        let child = mount(&mut tree, Some(parent), 2, config, &log);

        let entries = tree.dispatch(Some(child), "enter", EventPhase::KeyDown).invoked;
        assert_eq!(
            entries.iter().map(|e| e.origin).collect::<Vec<_>>(),
            [Origin::Target, Origin::Bubble],
        );
        assert_eq!(
            log.borrow().as_slice(),
            ["TESTING:OPEN", "TESTING:OPEN"],
        );
    }

    #[test]
    fn non_matching_scopes_do_not_break_bubbling() {
        let mut tree = tree();
        let log = Log::default();
        let parent = mount(&mut tree, None, 1, ScopeConfig::new("TESTING"), &log);
        let child = mount(&mut tree, Some(parent), 2, ScopeConfig::new("NON-EXISTING"), &log);

        let entries = tree.route(Some(child), "enter", EventPhase::KeyDown);
        assert_eq!(labels(&entries), ["OPEN"]);
        assert_eq!(entries[0].scope, parent);
        assert_eq!(entries[0].origin, Origin::Bubble);
    }

    #[test]
    fn global_ancestor_fires_despite_a_stopping_descendant() {
        let mut tree = tree();
        let log = Log::default();
        let mut parent_config = ScopeConfig::new("TESTING");
        parent_config.global = true;
        let parent = mount(&mut tree, None, 1, parent_config, &log);
        // Default stop_propagation on the child.
        let child = mount(&mut tree, Some(parent), 2, ScopeConfig::new("TESTING"), &log);

        let entries = tree.dispatch(Some(child), "enter", EventPhase::KeyDown).invoked;
        assert_eq!(
            entries
                .iter()
                .map(|e| (e.scope, e.origin))
                .collect::<Vec<_>>(),
            [(child, Origin::Target), (parent, Origin::Global)],
        );
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn a_scope_fires_at_most_once_per_event() {
        let mut tree = tree();
        let log = Log::default();

        // As the target itself.
        let mut config = ScopeConfig::new("TESTING");
        config.global = true;
        let global = mount(&mut tree, None, 1, config.clone(), &log);
        let entries = tree.route(Some(global), "enter", EventPhase::KeyDown);
        assert_eq!(
            entries.iter().map(|e| e.origin).collect::<Vec<_>>(),
            [Origin::Target],
        );

        // As an ancestor reached by bubbling.
        let mut child_config = ScopeConfig::new("TESTING");
        child_config.stop_propagation = false;
        let child = mount(&mut tree, Some(global), 2, child_config, &log);
        let entries = tree.route(Some(child), "enter", EventPhase::KeyDown);
        assert_eq!(
            entries.iter().map(|e| e.origin).collect::<Vec<_>>(),
            [Origin::Target, Origin::Bubble],
        );
    }

    #[test]
    fn nested_globals_each_fire_once() {
        let mut tree = tree();
        let log = Log::default();
        let mut config = ScopeConfig::new("TESTING");
        config.global = true;
        let outer = mount(&mut tree, None, 1, config.clone(), &log);
        let inner = mount(&mut tree, Some(outer), 2, config, &log);

        tree.dispatch(Some(inner), "enter", EventPhase::KeyDown);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn event_with_no_target_reaches_only_globals() {
        let mut tree = tree();
        let log = Log::default();
        mount(&mut tree, None, 1, ScopeConfig::new("TESTING"), &log);
        let mut config = ScopeConfig::new("OTHER");
        config.global = true;
        let global = mount(&mut tree, None, 2, config, &log);

        let entries = tree.route(None, "enter", EventPhase::KeyDown);
        assert_eq!(
            entries
                .iter()
                .map(|e| (e.scope, e.origin))
                .collect::<Vec<_>>(),
            [(global, Origin::Global)],
        );
    }

    #[test]
    fn phase_mismatch_skips_the_scope() {
        let mut tree = tree();
        let log = Log::default();
        let mut config = ScopeConfig::new("TESTING");
        config.phase = EventPhase::KeyUp;
        let id = mount(&mut tree, None, 1, config, &log);

        assert!(tree.route(Some(id), "enter", EventPhase::KeyDown).is_empty());
        assert_eq!(
            labels(&tree.route(Some(id), "enter", EventPhase::KeyUp)),
            ["OPEN"],
        );
    }

    #[test]
    fn first_declared_label_wins_for_a_shared_combo() {
        let mut km = Keymap::new();
        km.bind("TESTING", "FIRST", ["enter"]).unwrap();
        km.bind("TESTING", "SECOND", ["enter"]).unwrap();
        let mut tree = ScopeTree::with_keymap(km).unwrap();

        let log = Log::default();
        let id = mount(&mut tree, None, 1, ScopeConfig::new("TESTING"), &log);
        assert_eq!(
            labels(&tree.route(Some(id), "enter", EventPhase::KeyDown)),
            ["FIRST"],
        );
    }

    #[test]
    fn each_scope_resolves_against_its_own_slice() {
        let mut tree = tree();
        let log = Log::default();
        let parent = mount(&mut tree, None, 1, ScopeConfig::new("OTHER"), &log);
        let mut config = ScopeConfig::new("TESTING");
        config.stop_propagation = false;
        let child = mount(&mut tree, Some(parent), 2, config, &log);

        tree.dispatch(Some(child), "enter", EventPhase::KeyDown);
        assert_eq!(
            log.borrow().as_slice(),
            ["TESTING:OPEN", "OTHER:SUBMIT"],
        );
    }

    #[test]
    fn stale_target_routes_nothing() {
        let mut tree = tree();
        let log = Log::default();
        let id = mount(&mut tree, None, 1, ScopeConfig::new("TESTING"), &log);
        tree.unmount(id, &mut Noop);

        tree.dispatch(Some(id), "enter", EventPhase::KeyDown);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn unmounting_a_global_removes_it_from_routing() {
        let mut tree = tree();
        let log = Log::default();
        let mut config = ScopeConfig::new("TESTING");
        config.global = true;
        let global = mount(&mut tree, None, 1, config, &log);
        let other = mount(&mut tree, None, 2, ScopeConfig::new("OTHER"), &log);

        tree.unmount(global, &mut Noop);
        let entries = tree.route(Some(other), "enter", EventPhase::KeyDown);
        assert_eq!(labels(&entries), ["SUBMIT"]);
    }

    #[test]
    fn dispatch_reports_default_prevented() {
        let mut tree = tree();
        let log = Log::default();
        let mut config = ScopeConfig::new("TESTING");
        config.prevent_default = true;
        let id = mount(&mut tree, None, 1, config, &log);

        let report = tree.dispatch(Some(id), "enter", EventPhase::KeyDown);
        assert!(report.default_prevented);
        assert!(report.invoked[0].prevent_default);

        let report = tree.dispatch(Some(id), "x", EventPhase::KeyDown);
        assert!(!report.default_prevented);
        assert!(report.invoked.is_empty());
    }

    #[test]
    fn set_keymap_changes_matching_immediately() {
        let mut tree = tree();
        let log = Log::default();
        let id = mount(&mut tree, None, 1, ScopeConfig::new("TESTING"), &log);

        tree.dispatch(Some(id), "enter", EventPhase::KeyDown);
        assert_eq!(log.borrow().as_slice(), ["TESTING:OPEN"]);

        let mut next = Keymap::new();
        next.bind("TESTING", "OPEN", ["space"]).unwrap();
        tree.set_keymap(next, &mut Noop).unwrap();

        log.borrow_mut().clear();
        tree.dispatch(Some(id), "enter", EventPhase::KeyDown);
        assert!(log.borrow().is_empty(), "old combo must stop matching");
        tree.dispatch(Some(id), "space", EventPhase::KeyDown);
        assert_eq!(log.borrow().as_slice(), ["TESTING:OPEN"]);
    }

    #[test]
    fn handlers_run_in_routed_order() {
        let mut tree = tree();
        let log = Log::default();
        let mut root_config = ScopeConfig::new("OTHER");
        root_config.global = true;
        let root = mount(&mut tree, None, 1, root_config, &log);
        let mid = mount(&mut tree, Some(root), 2, ScopeConfig::new("NON-EXISTING"), &log);
        let _ = (root, mid);
        let mut leaf_config = ScopeConfig::new("TESTING");
        leaf_config.stop_propagation = false;
        let leaf = mount(&mut tree, Some(mid), 3, leaf_config, &log);

        let report = tree.dispatch(Some(leaf), "enter", EventPhase::KeyDown);
        assert_eq!(
            report
                .invoked
                .iter()
                .map(|e| e.origin)
                .collect::<Vec<_>>(),
            [Origin::Target, Origin::Bubble],
        );
        assert_eq!(
            log.borrow().as_slice(),
            ["TESTING:OPEN", "OTHER:SUBMIT"],
        );
    }
}

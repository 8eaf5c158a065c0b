// Copyright 2026 the Keyscope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scope tree: mount/unmount lifecycle, keymap swaps, and the
//! global-scope registry.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use keyscope_binder::{ComboBinder, ComboRegistrar, TargetResolver};
use keyscope_keymap::{Keymap, KeymapError, KeymapStore};

use crate::types::{MountError, ScopeConfig, ScopeFlags, ScopeId};

/// Handler invoked with the resolved label when a scope fires.
type Handler = Box<dyn FnMut(&str)>;

pub(crate) struct Scope<N> {
    generation: u32,
    pub(crate) name: String,
    pub(crate) node: N,
    pub(crate) flags: ScopeFlags,
    pub(crate) tab_index: Option<i32>,
    pub(crate) parent: Option<ScopeId>,
    pub(crate) children: Vec<ScopeId>,
    pub(crate) binder: ComboBinder,
    pub(crate) handler: Handler,
}

/// Owner of every mounted shortcut scope and of the active keymap.
///
/// The tree is the single piece of shared state: it holds the
/// [`KeymapStore`], the slot/generation arena of mounted scopes, the
/// parent/child links (owned child lists plus non-owning parent ids, so the
/// naturally cyclic scope hierarchy needs no reference cycles), and the
/// ordered registry of global scopes. Hosts inject it where events are
/// reported, which keeps it testable and resettable.
///
/// All operations are synchronous: when [`ScopeTree::mount`],
/// [`ScopeTree::unmount`], or [`ScopeTree::set_keymap`] returns, every
/// listener registration reflects the new state and no event can be matched
/// against stale combos. Single-threaded by design; a multi-threaded host
/// must wrap the whole tree in one mutex.
///
/// `N` is the host's node handle (for example a DOM node).
pub struct ScopeTree<N> {
    /// slots
    slots: Vec<Option<Scope<N>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    store: KeymapStore,
    /// Global scopes in mount order; mutated only by mount/unmount.
    globals: Vec<ScopeId>,
}

impl<N> core::fmt::Debug for ScopeTree<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.slots.len();
        let alive = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("ScopeTree")
            .field("scopes_total", &total)
            .field("scopes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("globals", &self.globals.len())
            .field("keymap_revision", &self.store.revision())
            .finish_non_exhaustive()
    }
}

impl<N> ScopeTree<N> {
    /// Create a tree reading from `store`.
    pub fn new(store: KeymapStore) -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            store,
            globals: Vec::new(),
        }
    }

    /// Create a tree from a keymap, validating it.
    pub fn with_keymap(keymap: Keymap) -> Result<Self, KeymapError> {
        Ok(Self::new(KeymapStore::new(keymap)?))
    }

    /// The active keymap store.
    pub fn store(&self) -> &KeymapStore {
        &self.store
    }

    /// Mount a scope and bind its combos.
    ///
    /// `root` is the node rendered for this scope; when
    /// [`ScopeConfig::target_selector`] is set, the scope listens on the node
    /// it resolves to instead. Resolution failure fails the mount with
    /// [`MountError::TargetNotFound`] before any listener is bound, without
    /// affecting sibling scopes.
    ///
    /// `parent` mirrors the host's component hierarchy and drives bubbling;
    /// a stale parent id mounts the scope as a root. Global scopes are
    /// additionally registered application-wide, in mount order.
    pub fn mount<R, T>(
        &mut self,
        parent: Option<ScopeId>,
        root: N,
        config: ScopeConfig,
        handler: impl FnMut(&str) + 'static,
        resolver: &T,
        registrar: &mut R,
    ) -> Result<ScopeId, MountError>
    where
        R: ComboRegistrar<Node = N>,
        T: TargetResolver<Node = N>,
    {
        let node = match &config.target_selector {
            Some(selector) => {
                resolver
                    .resolve(selector)
                    .ok_or_else(|| MountError::TargetNotFound {
                        selector: selector.clone(),
                    })?
            }
            None => root,
        };

        let flags = config.flags();
        let mut binder = ComboBinder::new(config.phase);
        binder.rebind(
            registrar,
            &node,
            self.store.scope(&config.name),
            flags.contains(ScopeFlags::GLOBAL),
        );

        let parent = parent.filter(|p| self.is_mounted(*p));
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.slots.push(None);
            self.generations.push(1);
            (self.slots.len() - 1, 1)
        };
        self.slots[idx] = Some(Scope {
            generation,
            name: config.name,
            node,
            flags,
            tab_index: config.tab_index,
            parent,
            children: Vec::new(),
            binder,
            handler: Box::new(handler),
        });
        #[allow(
            clippy::cast_possible_truncation,
            reason = "ScopeId uses 32-bit indices by design."
        )]
        let id = ScopeId::new(idx as u32, generation);

        if let Some(p) = parent
            && let Some(parent_scope) = self.get_mut(p)
        {
            parent_scope.children.push(id);
        }
        if flags.contains(ScopeFlags::GLOBAL) {
            self.globals.push(id);
        }
        Ok(id)
    }

    /// Unmount a scope and its subtree.
    ///
    /// Every affected scope's registrations are detached before this returns,
    /// so an unmounted scope can never fire. Stale ids are a no-op.
    pub fn unmount<R>(&mut self, id: ScopeId, registrar: &mut R)
    where
        R: ComboRegistrar<Node = N>,
    {
        if !self.is_mounted(id) {
            return;
        }
        if let Some(parent) = self.get(id).and_then(|s| s.parent)
            && let Some(parent_scope) = self.get_mut(parent)
        {
            parent_scope.children.retain(|c| *c != id);
        }
        self.tear_down(id, registrar);
    }

    fn tear_down<R>(&mut self, id: ScopeId, registrar: &mut R)
    where
        R: ComboRegistrar<Node = N>,
    {
        let Some(scope) = self.slots[id.idx()].take() else {
            return;
        };
        let Scope {
            mut binder,
            node,
            children,
            ..
        } = scope;
        binder.unbind_all(registrar, &node);
        self.free_list.push(id.idx());
        self.globals.retain(|g| *g != id);
        for child in children {
            self.tear_down(child, registrar);
        }
    }

    /// Replace the keymap and rebuild every live scope's bindings.
    ///
    /// On validation failure the prior keymap and all existing bindings stay
    /// in place. On success, every live scope's registrations are rebuilt
    /// (detach old, attach new) before this returns, so the next event is
    /// matched against the new map: no remount required, no stale listener
    /// left behind.
    pub fn set_keymap<R>(&mut self, keymap: Keymap, registrar: &mut R) -> Result<(), KeymapError>
    where
        R: ComboRegistrar<Node = N>,
    {
        self.store.replace(keymap)?;
        self.rebuild_bindings(registrar);
        Ok(())
    }

    fn rebuild_bindings<R>(&mut self, registrar: &mut R)
    where
        R: ComboRegistrar<Node = N>,
    {
        for slot in self.slots.iter_mut() {
            let Some(scope) = slot.as_mut() else {
                continue;
            };
            let slice = self.store.scope(&scope.name);
            scope.binder.rebind(
                registrar,
                &scope.node,
                slice,
                scope.flags.contains(ScopeFlags::GLOBAL),
            );
        }
    }

    /// Whether `id` refers to a currently mounted scope.
    pub fn is_mounted(&self, id: ScopeId) -> bool {
        self.get(id).is_some()
    }

    /// The scope's name, or `None` for stale ids.
    pub fn scope_name(&self, id: ScopeId) -> Option<&str> {
        self.get(id).map(|s| s.name.as_str())
    }

    /// The scope's parent, or `None` for roots and stale ids.
    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.get(id).and_then(|s| s.parent)
    }

    /// The scope's children in mount order; empty for stale ids.
    pub fn children(&self, id: ScopeId) -> &[ScopeId] {
        self.get(id).map_or(&[], |s| s.children.as_slice())
    }

    /// The scope's behavior flags, or `None` for stale ids.
    pub fn flags(&self, id: ScopeId) -> Option<ScopeFlags> {
        self.get(id).map(|s| s.flags)
    }

    /// The scope's tab-index pass-through, if configured.
    pub fn tab_index(&self, id: ScopeId) -> Option<i32> {
        self.get(id).and_then(|s| s.tab_index)
    }

    /// Global scopes in mount order.
    pub fn globals(&self) -> &[ScopeId] {
        &self.globals
    }

    pub(crate) fn get(&self, id: ScopeId) -> Option<&Scope<N>> {
        self.slots
            .get(id.idx())
            .and_then(|slot| slot.as_ref())
            .filter(|scope| scope.generation == id.generation())
    }

    pub(crate) fn get_mut(&mut self, id: ScopeId) -> Option<&mut Scope<N>> {
        self.slots
            .get_mut(id.idx())
            .and_then(|slot| slot.as_mut())
            .filter(|scope| scope.generation == id.generation())
    }
}

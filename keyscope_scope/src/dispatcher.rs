// Copyright 2026 the Keyscope Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invocation of a routed sequence against fallible host handlers.

use alloc::vec::Vec;

use crate::types::{RouteEntry, ScopeId};

/// Invoke `handler` for each entry of a routed sequence, isolating failures.
///
/// One misbehaving handler must not silence the rest of the sequence: a
/// returned error is recorded against the failing scope and invocation
/// continues with the next entry. The collected errors are returned in
/// invocation order so the host can surface them.
///
/// This is the fallible counterpart to [`ScopeTree::dispatch`]; hosts that
/// keep their handlers outside the tree route first and run the sequence
/// through here.
///
/// [`ScopeTree::dispatch`]: crate::ScopeTree::dispatch
pub fn run<E, Err>(
    seq: &[RouteEntry],
    event: &mut E,
    mut handler: impl FnMut(&RouteEntry, &mut E) -> Result<(), Err>,
) -> Vec<(ScopeId, Err)> {
    let mut failures = Vec::new();
    for entry in seq {
        if let Err(err) = handler(entry, event) {
            failures.push((entry.scope, err));
        }
    }
    failures
}

//! Processing order of bindings.
//!
//! Bindings are handled in strictly descending name order. This is an
//! inherited output contract: it fixes the sequence of mutations and report
//! lines so repeated runs over the same input print the same thing. It does
//! not change which mutations happen.

use crate::types::RoleBinding;

/// Sort once, before the per-binding loop.
pub fn order_bindings(bindings: &mut [RoleBinding]) {
    bindings.sort_by(|a, b| b.name().cmp(a.name()));
}

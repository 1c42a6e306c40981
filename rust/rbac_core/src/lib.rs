//! `rbac_core`: role-binding subject pruning engine.
//!
//! Removes a caller-supplied set of users and groups from every role binding
//! of one namespace, deciding per binding whether to update it, delete it or
//! leave it alone, and reports what changed. The crate performs no I/O of its
//! own: listing, mutating and printing go through the traits in `dispatch`.
//!
//! Modules:
//! - `types`   : subjects, role bindings, list wrapper (Kubernetes JSON shape)
//! - `subject` : four-way subject classification for reporting
//! - `remover` : removal request and multiset-aware subject filtering
//! - `order`   : deterministic binding order
//! - `plan`    : per-binding diff, action decision, aggregate report
//! - `dispatch`: collaborator traits and the mode-aware dispatcher
//! - `engine`  : the list → plan → dispatch → report loop
//! - `memory`  : in-memory store implementing the collaborator traits

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod memory;
pub mod order;
pub mod plan;
pub mod remover;
pub mod subject;
pub mod types;

pub use dispatch::{DispatchMode, Dispatched, Dispatcher, Lister, MutationSink, NullReport, ReportSink};
pub use engine::{reconcile, Outcome, Reconciler};
pub use error::{CollaboratorError, ReconcileError, Result};
pub use plan::{plan_binding, Action, NotFound, ReconciliationResult, Report, ReportLine};
pub use remover::{remove_subjects, RemovalRequest};
pub use subject::{Category, SubjectBuckets};
pub use types::{ObjectMeta, RoleBinding, RoleBindingList, RoleRef, Subject, SubjectKind};

#[cfg(test)]
mod tests;

//! Collaborator seams and the mutation dispatcher.
//!
//! The engine only ever talks to these three traits, so a cluster client, an
//! in-memory store or a test double can stand behind them.

use crate::error::{CollaboratorError, ReconcileError, Result};
use crate::plan::{Action, ReconciliationResult, ReportLine};
use crate::types::{RoleBinding, RoleBindingList};

/// Source of the current bindings of a namespace.
pub trait Lister {
    fn list(&self, namespace: &str) -> std::result::Result<Vec<RoleBinding>, CollaboratorError>;
}

/// Commits binding changes. Each call stands alone; there is no transaction
/// spanning several bindings.
pub trait MutationSink {
    /// Replace the binding with the given (filtered) one.
    fn update(&self, binding: &RoleBinding) -> std::result::Result<(), CollaboratorError>;

    fn delete(&self, namespace: &str, name: &str) -> std::result::Result<(), CollaboratorError>;
}

/// Receives textual report lines as they are produced.
pub trait ReportSink {
    fn emit(&mut self, line: &ReportLine);
}

impl ReportSink for Vec<ReportLine> {
    fn emit(&mut self, line: &ReportLine) {
        self.push(line.clone());
    }
}

impl<T: ReportSink + ?Sized> ReportSink for &mut T {
    fn emit(&mut self, line: &ReportLine) {
        (**self).emit(line);
    }
}

/// Discards every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReport;

impl ReportSink for NullReport {
    fn emit(&mut self, _line: &ReportLine) {}
}

/// How planned mutations are handled. Exactly one mode per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Call the sink.
    #[default]
    Live,
    /// Plan and report as in `Live`, never call the sink.
    DryRun,
    /// Never call the sink and never report; collect the mutated bindings.
    AccumulateOnly,
}

impl DispatchMode {
    pub fn reports_text(&self) -> bool {
        !matches!(self, Self::AccumulateOnly)
    }
}

/// What happened to one planned binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// `NoOp`: nothing to do.
    Skipped,
    /// Sink called and succeeded.
    Committed(Action),
    /// Dry run: the sink would have been called.
    Suppressed(Action),
    /// Stored for structured output.
    Accumulated(Action),
}

/// Sequences sink calls for planned bindings according to a [`DispatchMode`].
pub struct Dispatcher<'a, S: MutationSink + ?Sized> {
    sink: &'a S,
    mode: DispatchMode,
    accumulated: Vec<RoleBinding>,
}

impl<'a, S: MutationSink + ?Sized> Dispatcher<'a, S> {
    pub fn new(sink: &'a S, mode: DispatchMode) -> Self {
        Self {
            sink,
            mode,
            accumulated: Vec::new(),
        }
    }

    pub fn dispatch(&mut self, result: &ReconciliationResult) -> Result<Dispatched> {
        let action = result.action;
        if action == Action::NoOp {
            return Ok(Dispatched::Skipped);
        }

        match self.mode {
            DispatchMode::AccumulateOnly => {
                self.accumulated.push(result.mutated());
                Ok(Dispatched::Accumulated(action))
            }
            DispatchMode::DryRun => Ok(Dispatched::Suppressed(action)),
            DispatchMode::Live => {
                let binding = &result.binding;
                let outcome = match action {
                    Action::Update => self.sink.update(&result.mutated()),
                    Action::Delete => self.sink.delete(binding.namespace(), binding.name()),
                    Action::NoOp => Ok(()),
                };
                outcome.map_err(|source| ReconcileError::Mutation {
                    namespace: binding.namespace().to_string(),
                    name: binding.name().to_string(),
                    action,
                    source,
                })?;
                Ok(Dispatched::Committed(action))
            }
        }
    }

    /// Bindings collected in `AccumulateOnly` mode, in dispatch order.
    pub fn into_accumulated(self) -> RoleBindingList {
        RoleBindingList::new(self.accumulated)
    }
}

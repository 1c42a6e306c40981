use tracing::{debug, info};

use crate::dispatch::{Dispatched, Dispatcher, DispatchMode, Lister, MutationSink, ReportSink};
use crate::error::{ReconcileError, Result};
use crate::order::order_bindings;
use crate::plan::{plan_binding, Report};
use crate::remover::RemovalRequest;
use crate::types::RoleBindingList;

/// Result of a run: a report in the text modes, raw bindings otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Report(Report),
    Accumulated(RoleBindingList),
}

impl Outcome {
    pub fn report(&self) -> Option<&Report> {
        match self {
            Self::Report(report) => Some(report),
            Self::Accumulated(_) => None,
        }
    }

    pub fn accumulated(&self) -> Option<&RoleBindingList> {
        match self {
            Self::Accumulated(list) => Some(list),
            Self::Report(_) => None,
        }
    }
}

/// Removes the requested identities from every binding of one namespace.
///
/// Stateless between runs. Bindings are processed one at a time in
/// descending name order; the first failed mutation aborts the run and
/// leaves earlier mutations and report lines in place.
#[derive(Debug, Clone)]
pub struct Reconciler {
    namespace: String,
    request: RemovalRequest,
    mode: DispatchMode,
}

impl Reconciler {
    pub fn new(namespace: impl Into<String>, request: RemovalRequest, mode: DispatchMode) -> Self {
        Self {
            namespace: namespace.into(),
            request,
            mode,
        }
    }

    pub fn run<L, S, R>(&self, lister: &L, sink: &S, report_sink: &mut R) -> Result<Outcome>
    where
        L: Lister + ?Sized,
        S: MutationSink + ?Sized,
        R: ReportSink + ?Sized,
    {
        let mut bindings =
            lister
                .list(&self.namespace)
                .map_err(|source| ReconcileError::Backend {
                    namespace: self.namespace.clone(),
                    source,
                })?;
        debug!(
            namespace = %self.namespace,
            count = bindings.len(),
            "listed role bindings"
        );

        for binding in &mut bindings {
            if binding.metadata.namespace.is_none() {
                binding.metadata.namespace = Some(self.namespace.clone());
            }
        }
        order_bindings(&mut bindings);

        let mut dispatcher = Dispatcher::new(sink, self.mode);
        let mut report = Report::default();

        for binding in &bindings {
            let result = plan_binding(binding, &self.request);
            let dispatched = dispatcher.dispatch(&result)?;
            match dispatched {
                Dispatched::Skipped => continue,
                Dispatched::Accumulated(action) => {
                    debug!(binding = %binding.name(), %action, "accumulated");
                    continue;
                }
                Dispatched::Committed(action) => {
                    info!(namespace = %self.namespace, binding = %binding.name(), %action, "role binding changed");
                }
                Dispatched::Suppressed(action) => {
                    debug!(binding = %binding.name(), %action, "dry run, mutation suppressed");
                }
            }

            report.absorb(&result);
            for line in result.report_lines(&self.namespace) {
                report_sink.emit(&line);
            }
        }

        if !self.mode.reports_text() {
            let list = dispatcher.into_accumulated();
            debug!(count = list.items.len(), "returning accumulated bindings");
            return Ok(Outcome::Accumulated(list));
        }

        report.finish(&self.request);
        for line in report.not_found_lines(&self.namespace) {
            report_sink.emit(&line);
        }
        info!(
            namespace = %self.namespace,
            updated = report.bindings_updated,
            deleted = report.bindings_deleted,
            "reconciliation finished"
        );
        Ok(Outcome::Report(report))
    }
}

/// Convenience wrapper around [`Reconciler::run`].
pub fn reconcile<L, S, R>(
    namespace: &str,
    request: &RemovalRequest,
    mode: DispatchMode,
    lister: &L,
    sink: &S,
    report_sink: &mut R,
) -> Result<Outcome>
where
    L: Lister + ?Sized,
    S: MutationSink + ?Sized,
    R: ReportSink + ?Sized,
{
    Reconciler::new(namespace, request.clone(), mode).run(lister, sink, report_sink)
}

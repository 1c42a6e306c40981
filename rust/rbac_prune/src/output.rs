//! Text and structured output.

use std::io::{self, Write};

use rbac_core::{ReportLine, ReportSink, RoleBindingList};

use crate::config::OutputFormat;

/// Writes report lines as they arrive. The first write failure is kept and
/// returned by [`TextReport::finish`]; later lines are dropped.
pub struct TextReport<W: Write> {
    out: W,
    suffix: &'static str,
    error: Option<io::Error>,
}

impl<W: Write> TextReport<W> {
    /// `suffix` is inserted before each line's final period, e.g. ` (dry client run)`.
    pub fn new(out: W, suffix: &'static str) -> Self {
        Self {
            out,
            suffix,
            error: None,
        }
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> ReportSink for TextReport<W> {
    fn emit(&mut self, line: &ReportLine) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.out, "{}{}.", line.body(), self.suffix) {
            self.error = Some(e);
        }
    }
}

pub fn write_list<W: Write>(out: &mut W, list: &RoleBindingList, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, list).map_err(io::Error::from)?;
            writeln!(out)?;
        }
        OutputFormat::Name => {
            for binding in &list.items {
                writeln!(out, "rolebinding.rbac.authorization.k8s.io/{}", binding.name())?;
            }
        }
    }
    out.flush()
}

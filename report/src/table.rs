//! Plain-text table output

use std::io::Write;

use anyhow::Result;
use candia_core::{AggregateReport, ReportEntry};

/// Marker appended to metrics no host reported
const NO_DATA: &str = "(no data)";

/// Minimum width of the value column
const VALUE_WIDTH: usize = 11;

/// Renders an [`AggregateReport`] as aligned text
///
/// The metric block reads like the load generator's own summary:
///
/// ```text
/// Transactions:            300 hits
/// Availability:          98.75 %
/// Concurrency:            0.00 (no data)
/// ```
#[derive(Debug, Clone)]
pub struct TableRenderer {
    show_hosts: bool,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self { show_hosts: true }
    }
}

impl TableRenderer {
    /// Renderer with the host summary enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the host summary and failure list
    pub fn with_hosts(mut self, show: bool) -> Self {
        self.show_hosts = show;
        self
    }

    /// Write the report to `out`
    pub fn render(&self, report: &AggregateReport, out: &mut impl Write) -> Result<()> {
        let label_width = report
            .entries
            .iter()
            .map(|e| e.label.len() + 1)
            .max()
            .unwrap_or(0)
            + 1;
        let values: Vec<String> = report.entries.iter().map(format_value).collect();
        let value_width = values.iter().map(String::len).max().unwrap_or(0);

        for (entry, value) in report.entries.iter().zip(&values) {
            let label = format!("{}:", entry.label);
            let mut line = format!("{label:<label_width$}{value:>value_width$}");
            if let Some(unit) = entry.unit {
                line.push(' ');
                line.push_str(unit);
            }
            if !entry.has_data() {
                line.push(' ');
                line.push_str(NO_DATA);
            }
            writeln!(out, "{line}")?;
        }

        if self.show_hosts {
            self.render_hosts(report, out)?;
        }

        Ok(())
    }

    /// Render into a string
    pub fn render_to_string(&self, report: &AggregateReport) -> Result<String> {
        let mut buf = Vec::new();
        self.render(report, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    fn render_hosts(&self, report: &AggregateReport, out: &mut impl Write) -> Result<()> {
        writeln!(out)?;
        writeln!(
            out,
            "Hosts: {} total, {} succeeded, {} failed ({:.2} secs)",
            report.hosts_total,
            report.hosts_succeeded,
            report.hosts_failed(),
            report.duration_secs()
        )?;

        if !report.failures.is_empty() {
            writeln!(out, "Failed hosts:")?;
            for failure in &report.failures {
                writeln!(out, "  {failure}")?;
            }
        }

        if !report.parse_issues.is_empty() {
            writeln!(out, "Unparsable values:")?;
            for issue in &report.parse_issues {
                writeln!(
                    out,
                    "  {}: {} {:?}",
                    issue.address,
                    issue.metric.label(),
                    issue.raw
                )?;
            }
        }

        Ok(())
    }
}

fn format_value(entry: &ReportEntry) -> String {
    format!(
        "{:>width$.prec$}",
        entry.value,
        width = VALUE_WIDTH,
        prec = entry.precision
    )
}

use clap::Parser;
use grievance::{GroupBy, ReportAggregator, domain::Report as GroupedReport};
use tracing::instrument;

use super::{
    FilterArgs, Workspace,
    terminal::{Colorize, is_narrow},
};

const BAR_WIDTH: usize = 20;

#[derive(Debug, Parser)]
#[command(about = "Grouped statistics over a filtered set of complaints")]
pub struct Report {
    /// Field to group by (category, ward, status, priority). Defaults to the
    /// configured grouping.
    #[arg(long, value_name = "FIELD")]
    group_by: Option<GroupBy>,

    #[command(flatten)]
    filters: FilterArgs,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Report {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let store = workspace.load_store()?;
        let group_by = self
            .group_by
            .unwrap_or_else(|| workspace.config().group_by());

        let report = ReportAggregator::report(&store, &self.filters.criteria(), group_by);

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Table => Self::output_table(&report),
        }
        Ok(())
    }

    fn output_table(report: &GroupedReport) {
        let overall = &report.overall;

        println!("Complaints by {}", report.group_by.label().to_lowercase());
        println!("{}", "─".repeat(40).dim());

        if report.groups.is_empty() {
            println!("No complaints matched.");
        } else {
            let name_width = report
                .groups
                .iter()
                .map(|group| group.name.len())
                .max()
                .unwrap_or(0)
                .max(report.group_by.label().len());
            let narrow = is_narrow();

            if narrow {
                for group in &report.groups {
                    println!(
                        "{}: {} ({}%), {} resolved",
                        group.name, group.count, group.percentage, group.resolved
                    );
                }
            } else {
                println!(
                    "{:<name_width$}  {:>5}  {:>7}  {:>11}  {:>8}  {:>6}  {:>9}",
                    report.group_by.label(),
                    "Count",
                    "Pending",
                    "In Progress",
                    "Resolved",
                    "Share",
                    "Resolved%"
                );
                for group in &report.groups {
                    println!(
                        "{:<name_width$}  {:>5}  {:>7}  {:>11}  {:>8}  {:>6}  {:>9}  {}",
                        group.name,
                        group.count,
                        group.pending,
                        group.in_progress,
                        group.resolved,
                        group.percentage,
                        group.resolved_percentage,
                        bar(group.percentage.value()).info()
                    );
                }
            }
        }

        println!();
        println!("Total:           {}", overall.total);
        println!("Resolved:        {}", overall.resolved.to_string().success());
        println!("Pending:         {}", overall.pending.to_string().warning());
        println!("Urgent:          {}", overall.urgent.to_string().danger());
        println!("Resolution rate: {}%", overall.resolution_rate_label());
    }
}

/// A horizontal bar for a percentage.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn bar(percentage: f64) -> String {
    let filled = ((percentage / 100.0) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(filled.min(BAR_WIDTH))
}

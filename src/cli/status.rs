use clap::Parser;
use grievance::{ReportAggregator, domain::StatusSummary};
use tracing::instrument;

use super::{
    Workspace,
    terminal::{Colorize, is_narrow},
};

#[derive(Debug, Parser, Default)]
#[command(about = "Show complaint counts by status")]
pub struct Summary {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress headers and format for scripting
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Summary {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let store = workspace.load_store()?;
        let summary = ReportAggregator::status_summary(&store.list());

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            OutputFormat::Table if self.quiet => Self::output_quiet(&summary),
            OutputFormat::Table => {
                if summary.total == 0 {
                    println!("No complaints found yet. Register one with 'griev submit'.");
                    return Ok(());
                }
                Self::output_table(&summary);
            }
        }

        Ok(())
    }

    fn output_quiet(summary: &StatusSummary) {
        println!(
            "total={} pending={} in_progress={} resolved={}",
            summary.total, summary.pending, summary.in_progress, summary.resolved
        );
    }

    fn output_table(summary: &StatusSummary) {
        let rows = [
            ("Pending", summary.pending.to_string().warning()),
            ("In Progress", summary.in_progress.to_string().info()),
            ("Resolved", summary.resolved.to_string().success()),
        ];

        println!("Complaint counts");
        println!("{}", "────────────────".dim());

        if is_narrow() {
            for (label, count) in &rows {
                println!("{label}: {count}");
            }
            println!("Total: {}", summary.total);
        } else {
            println!("{:<12} Count", "Status");
            for (label, count) in &rows {
                println!("{label:<12} {count}");
            }
            println!("{:<12} {}", "Total", summary.total);
        }

        let rejected = summary.total - summary.pending - summary.in_progress - summary.resolved;
        if rejected > 0 {
            println!();
            println!("{}", format!("{rejected} rejected").dim());
        }
    }
}

use clap::Parser;
use grievance::{LoadError, Snapshot, storage::Violation};
use tracing::instrument;

use super::{Workspace, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Check every stored complaint against the lifecycle invariants")]
pub struct Validate {
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Validate {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let snapshot = match Snapshot::load(workspace.data()) {
            Ok(snapshot) => snapshot,
            Err(LoadError::NotFound(path)) => {
                if !self.quiet {
                    println!("No data file at {}. Nothing to validate.", path.display());
                }
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };

        let violations = snapshot.violations();

        if !self.quiet {
            match self.output {
                OutputFormat::Table => Self::output_table(&snapshot, &violations),
                OutputFormat::Json => Self::output_json(&snapshot, &violations)?,
            }
        }

        if !violations.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }

    fn output_table(snapshot: &Snapshot, violations: &[Violation]) {
        if violations.is_empty() {
            println!(
                "{}",
                format!("✅ All {} complaints are valid.", snapshot.len()).success()
            );
            return;
        }

        println!(
            "{}",
            format!(
                "⚠️  {} of {} complaints break lifecycle invariants:",
                violations.len(),
                snapshot.len()
            )
            .warning()
        );
        println!();
        for violation in violations {
            println!("  • {}  {}", violation.id, violation.error);
        }
        println!(
            "\n{}",
            "Set allow_invalid = true in the configuration to load the remaining complaints."
                .dim()
        );
    }

    fn output_json(snapshot: &Snapshot, violations: &[Violation]) -> anyhow::Result<()> {
        use serde_json::json;

        let issues: Vec<_> = violations
            .iter()
            .map(|violation| {
                json!({
                    "id": violation.id.to_string(),
                    "message": violation.error.to_string(),
                })
            })
            .collect();

        let output = json!({
            "complaints": snapshot.len(),
            "valid": violations.is_empty(),
            "violations": issues,
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

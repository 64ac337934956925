use std::fmt;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use grievance::{Complaint, ReportAggregator, storage::ComplaintRecord};
use regex::Regex;
use tracing::instrument;

use super::{
    FilterArgs, Workspace,
    terminal::{is_narrow, priority_cell, status_cell},
};

/// Command arguments for `griev list`.
#[derive(Debug, Parser)]
#[command(about = "List complaints, most recent first")]
pub struct List {
    #[command(flatten)]
    filters: FilterArgs,

    /// Regular expression match against the description.
    #[arg(long, conflicts_with = "search")]
    regex: Option<String>,

    /// Limit number of rows returned.
    #[arg(long)]
    limit: Option<usize>,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Suppress headers and format rows for scripting.
    #[arg(long)]
    quiet: bool,
}

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Column {
    Id,
    Date,
    Status,
    Priority,
    Category,
    Ward,
    Citizen,
    Description,
}

impl List {
    #[cfg(test)]
    pub(super) const fn filters(&self) -> &FilterArgs {
        &self.filters
    }

    #[instrument(level = "debug", skip_all)]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let store = workspace.load_store()?;

        let regex = self
            .regex
            .as_deref()
            .map(|pattern| Regex::new(pattern).with_context(|| format!("invalid regex: {pattern}")))
            .transpose()?;

        let mut complaints = ReportAggregator::filter(&store.list(), &self.filters.criteria());
        if let Some(regex) = &regex {
            complaints.retain(|complaint| regex.is_match(complaint.description()));
        }
        if let Some(limit) = self.limit {
            complaints.truncate(limit);
        }

        tracing::debug!("{} of {} complaints selected", complaints.len(), store.len());

        match self.output {
            OutputFormat::Table => {
                render_table(&complaints, self.quiet);
                Ok(())
            }
            OutputFormat::Json => render_json(&complaints),
            OutputFormat::Csv => {
                render_csv(&complaints, self.quiet);
                Ok(())
            }
        }
    }
}

fn render_table(complaints: &[Complaint], quiet: bool) {
    if quiet {
        for complaint in complaints {
            println!("{}", complaint.id());
        }
        return;
    }

    if complaints.is_empty() {
        println!("No complaints matched.");
        return;
    }

    let columns: &[Column] = if is_narrow() {
        &[Column::Id, Column::Status, Column::Category]
    } else {
        &[
            Column::Id,
            Column::Date,
            Column::Status,
            Column::Priority,
            Column::Category,
            Column::Ward,
            Column::Citizen,
        ]
    };

    // Determine column widths for alignment.
    let widths = columns
        .iter()
        .map(|column| {
            complaints
                .iter()
                .map(|complaint| column.value(complaint).len())
                .max()
                .unwrap_or(0)
                .max(column.header().len())
        })
        .collect::<Vec<_>>();

    for (column, width) in columns.iter().zip(&widths) {
        print!("{:<width$}  ", column.header());
    }
    println!();
    for width in &widths {
        print!("{:-<width$}  ", "");
    }
    println!();

    for complaint in complaints {
        for (column, &width) in columns.iter().zip(&widths) {
            let cell = match column {
                Column::Status => status_cell(complaint.status(), width),
                Column::Priority => priority_cell(complaint.priority(), width),
                _ => format!("{:<width$}", column.value(complaint)),
            };
            print!("{cell}  ");
        }
        println!();
    }
}

fn render_json(complaints: &[Complaint]) -> anyhow::Result<()> {
    let records: Vec<_> = complaints.iter().map(ComplaintRecord::from).collect();
    serde_json::to_writer_pretty(std::io::stdout(), &records)
        .context("failed to render json output")?;
    println!();
    Ok(())
}

fn render_csv(complaints: &[Complaint], quiet: bool) {
    const COLUMNS: [Column; 8] = [
        Column::Id,
        Column::Date,
        Column::Status,
        Column::Priority,
        Column::Category,
        Column::Ward,
        Column::Citizen,
        Column::Description,
    ];

    if !quiet {
        let header_line = COLUMNS
            .iter()
            .map(|column| csv_escape(column.header()))
            .collect::<Vec<_>>()
            .join(",");
        println!("{header_line}");
    }

    for complaint in complaints {
        let values = COLUMNS
            .iter()
            .map(|column| csv_escape(&column.value(complaint)))
            .collect::<Vec<_>>();
        println!("{}", values.join(","));
    }
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

impl Column {
    const fn header(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Date => "Date",
            Self::Status => "Status",
            Self::Priority => "Priority",
            Self::Category => "Category",
            Self::Ward => "Ward",
            Self::Citizen => "Citizen",
            Self::Description => "Description",
        }
    }

    fn value(self, complaint: &Complaint) -> String {
        match self {
            Self::Id => complaint.id().to_string(),
            Self::Date => complaint.date().to_string(),
            Self::Status => complaint.status().to_string(),
            Self::Priority => complaint.priority().to_string(),
            Self::Category => complaint.category().to_string(),
            Self::Ward => complaint.ward().unwrap_or_default().to_string(),
            Self::Citizen => complaint.citizen_name().to_string(),
            Self::Description => complaint.description().to_string(),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
        })
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("plain", "plain")]
    #[test_case("MG Road, Sector 5", "\"MG Road, Sector 5\"")]
    #[test_case("say \"hi\"", "\"say \"\"hi\"\"\"")]
    fn csv_escaping(input: &str, expected: &str) {
        assert_eq!(csv_escape(input), expected);
    }

    #[test]
    fn missing_ward_renders_empty() {
        let store = grievance::ComplaintStore::new();
        let complaint = store
            .create(grievance::ComplaintInput::new("a", "b", "Roads", "d"))
            .unwrap();
        assert_eq!(Column::Ward.value(&complaint), "");
        assert_eq!(Column::Status.value(&complaint), "Pending");
    }
}

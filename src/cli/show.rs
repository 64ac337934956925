use clap::Parser;
use grievance::{Complaint, ComplaintId, storage::ComplaintRecord};
use tracing::instrument;

use super::{
    Workspace,
    terminal::{Colorize, priority_cell, status_cell},
};

#[derive(Debug, Parser)]
#[command(about = "Display a complaint and its history")]
pub struct Show {
    /// The ID of the complaint to display
    #[clap(value_parser = super::parse_id)]
    id: ComplaintId,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Show {
    #[instrument(level = "debug", skip(self, workspace), fields(id = %self.id))]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let store = workspace.load_store()?;

        let Ok(complaint) = store.get(self.id) else {
            eprintln!("Complaint {} not found", self.id);
            std::process::exit(1);
        };

        match self.output {
            OutputFormat::Pretty => Self::output_pretty(&complaint),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ComplaintRecord::from(&complaint))?
                );
            }
        }

        Ok(())
    }

    fn output_pretty(complaint: &Complaint) {
        // Header
        println!("# {}", complaint.id());
        println!("{}\n", complaint.description());

        println!("{}", "Details".dim());
        println!("  Status:    {}", status_cell(complaint.status(), 0));
        println!("  Priority:  {}", priority_cell(complaint.priority(), 0));
        println!("  Sentiment: {}", complaint.sentiment());
        println!("  Category:  {}", complaint.category());
        println!("  Filed:     {}", complaint.date());
        println!("  Language:  {}", complaint.language());

        println!("\n{}", "Location".dim());
        println!("  {}", complaint.location());
        if let Some(ward) = complaint.ward() {
            println!("  {ward}");
        }

        println!("\n{}", "Citizen".dim());
        println!("  {}", complaint.citizen_name());
        if let Some(phone) = complaint.phone() {
            println!("  {phone}");
        }

        if let Some(image_url) = complaint.image_url() {
            println!("\n{}", "Image".dim());
            println!("  {image_url}");
        }

        println!("\n{}", "History".dim());
        for entry in complaint.history().iter() {
            println!(
                "  • {}  {}  {}",
                entry.timestamp().format("%Y-%m-%d %H:%M"),
                status_cell(entry.status(), 11),
                entry.note()
            );
        }
    }
}

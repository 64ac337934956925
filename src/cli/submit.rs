use clap::Parser;
use grievance::{ComplaintInput, Priority, Sentiment};
use tracing::instrument;

use super::{Workspace, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct Submit {
    /// The citizen's name
    #[arg(long)]
    name: String,

    /// What the problem is
    #[arg(long)]
    description: String,

    /// The service area, e.g. Roads or Sanitation
    #[arg(long)]
    category: String,

    /// Where the problem is
    #[arg(long)]
    location: String,

    /// The administrative ward
    #[arg(long)]
    ward: Option<String>,

    /// A contact number
    #[arg(long)]
    phone: Option<String>,

    /// The language the complaint was submitted in
    #[arg(long)]
    language: Option<String>,

    /// Link to a photo of the problem
    #[arg(long)]
    image_url: Option<String>,

    /// Priority, if already classified (Low, Medium, High, Urgent)
    #[arg(long)]
    priority: Option<Priority>,

    /// Sentiment, if already classified (Neutral, Concerned, Frustrated, Angry)
    #[arg(long)]
    sentiment: Option<Sentiment>,
}

impl Submit {
    fn input(self) -> ComplaintInput {
        ComplaintInput {
            citizen_name: self.name,
            phone: self.phone,
            description: self.description,
            category: self.category,
            location: self.location,
            ward: self.ward,
            language: self.language,
            image_url: self.image_url,
            priority: self.priority,
            sentiment: self.sentiment,
        }
    }

    #[instrument(level = "debug", skip_all)]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let restored = workspace.load()?;
        let complaint = restored.store.create(self.input())?;
        workspace.save(&restored)?;

        println!(
            "{}",
            format!("✅ Registered complaint {}", complaint.id()).success()
        );
        Ok(())
    }
}
